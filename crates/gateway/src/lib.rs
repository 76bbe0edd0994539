//! `frostdesk-gateway` -- remote resource gateway for the booking
//! backend.
//!
//! [`api::BookingApi`] is the port the console subsystem programs
//! against; [`http::HttpBookingApi`] is the concrete REST binding.

pub mod api;
pub mod http;

pub use api::{BookingApi, GatewayError};
pub use http::HttpBookingApi;
