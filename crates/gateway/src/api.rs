//! The booking gateway port.
//!
//! The console subsystem talks to the backend exclusively through
//! [`BookingApi`], so tests can substitute an in-process fake and the
//! HTTP binding stays swappable.

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio_util::sync::CancellationToken;

use frostdesk_core::appointment::Appointment;
use frostdesk_core::technician::Technician;
use frostdesk_core::types::AppointmentId;

/// Errors from the gateway layer.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend returned a non-2xx status code. `message` carries
    /// the server's error message when the body had one, else the raw
    /// body text.
    #[error("Backend error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Server-provided error message, or raw body.
        message: String,
    },

    /// The cooperative cancellation token fired before the call
    /// completed. Expected during supersession and shutdown; callers
    /// treat it as silent, not as a user-visible failure.
    #[error("Request cancelled")]
    Cancelled,
}

impl GatewayError {
    /// Whether this error is a cooperative cancellation (or timeout,
    /// which flows through the same path).
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// The user-facing message for a failed call. Cancellations have
    /// none by design.
    pub fn user_message(&self) -> String {
        match self {
            Self::Api { message, .. } if !message.trim().is_empty() => message.clone(),
            Self::Api { status, .. } => format!("The server rejected the request ({status})"),
            Self::Request(_) => "Could not reach the booking service".to_string(),
            Self::Cancelled => String::new(),
        }
    }
}

/// Operations the booking backend exposes to the console.
///
/// Every transition is server-enforced; the client requests and then
/// refetches, it never computes a status locally.
#[async_trait]
pub trait BookingApi: Send + Sync {
    /// Fetch the full appointment list.
    ///
    /// The `cancel` token is the cooperative cancellation handle owned
    /// by the poller; a superseded fetch resolves to
    /// [`GatewayError::Cancelled`].
    async fn list_appointments(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<Appointment>, GatewayError>;

    /// Accept a pending appointment, optionally assigning technicians.
    /// An empty technician list is valid (unassigned acceptance).
    async fn accept(
        &self,
        id: &AppointmentId,
        technicians: &[String],
    ) -> Result<(), GatewayError>;

    /// Reject a pending appointment with an optional reason.
    async fn reject(&self, id: &AppointmentId, reason: Option<&str>)
        -> Result<(), GatewayError>;

    /// Mark an accepted appointment completed.
    async fn complete(&self, id: &AppointmentId) -> Result<(), GatewayError>;

    /// Move one service line of an accepted appointment to a new
    /// date-only value.
    async fn reschedule(
        &self,
        id: &AppointmentId,
        service_name: &str,
        new_date: NaiveDate,
    ) -> Result<(), GatewayError>;

    /// Return an accepted appointment to the pending pool.
    async fn return_to_pending(&self, id: &AppointmentId) -> Result<(), GatewayError>;

    /// Fetch the technician roster (acceptance UI only).
    async fn list_technicians(&self) -> Result<Vec<Technician>, GatewayError>;
}
