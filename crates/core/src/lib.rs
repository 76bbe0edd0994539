//! `frostdesk-core` -- domain types for the Frostdesk admin console.
//!
//! Zero internal deps so it can be used by the gateway binding, the
//! console subsystem, and any future CLI tooling alike. Holds the
//! appointment model and status machine, per-operation in-flight flag
//! bookkeeping, and the notification entry type.

pub mod appointment;
pub mod flags;
pub mod notification;
pub mod technician;
pub mod types;
