//! Lifecycle transition engine.
//!
//! Executes the five appointment transitions against the gateway,
//! guarded by the per-`(kind, id)` in-flight flag. The engine is
//! pessimistic: the visible list only changes after a confirmed
//! resync, so a failed transition needs no rollback -- just a flag
//! reset and a user-facing signal.
//!
//! Every transition follows the same shape:
//! 1. claim the flag (refuse when already in flight);
//! 2. call the gateway;
//! 3. reset the flag -- on success, failure, and cancellation alike;
//! 4. on success trigger a full resync and publish
//!    [`ConsoleEvent::TransitionSucceeded`]; on failure publish
//!    [`ConsoleEvent::TransitionFailed`] with the server's message.

use std::sync::Arc;

use chrono::NaiveDate;

use frostdesk_core::flags::OperationKind;
use frostdesk_core::types::AppointmentId;
use frostdesk_gateway::{BookingApi, GatewayError};

use crate::events::{ConsoleEvent, ConsoleEvents};
use crate::poller::Poller;
use crate::store::AppointmentStore;

/// Errors surfaced by the transition engine.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    /// An operation of this kind is already in flight for this
    /// appointment; no gateway call was made.
    #[error("{kind} already in flight for appointment {id}")]
    AlreadyInFlight {
        kind: OperationKind,
        id: AppointmentId,
    },

    /// Local pre-network validation failed; no gateway call was made.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The gateway call failed (or was cancelled).
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Executes appointment transitions and drives the resync that
/// follows a confirmed one.
pub struct LifecycleEngine<G> {
    gateway: Arc<G>,
    store: Arc<AppointmentStore>,
    poller: Arc<Poller<G>>,
    events: Arc<ConsoleEvents>,
}

impl<G: BookingApi> LifecycleEngine<G> {
    pub fn new(
        gateway: Arc<G>,
        store: Arc<AppointmentStore>,
        poller: Arc<Poller<G>>,
        events: Arc<ConsoleEvents>,
    ) -> Self {
        Self {
            gateway,
            store,
            poller,
            events,
        }
    }

    /// Accept a pending appointment. An empty technician list is valid
    /// (unassigned acceptance).
    pub async fn accept(
        &self,
        id: &AppointmentId,
        technicians: &[String],
    ) -> Result<(), LifecycleError> {
        self.claim(OperationKind::Accepting, id).await?;
        let result = self.gateway.accept(id, technicians).await;
        self.settle(OperationKind::Accepting, id, result).await
    }

    /// Reject a pending appointment; it leaves the live store on the
    /// next resync.
    pub async fn reject(
        &self,
        id: &AppointmentId,
        reason: Option<&str>,
    ) -> Result<(), LifecycleError> {
        self.claim(OperationKind::Rejecting, id).await?;
        let result = self.gateway.reject(id, reason).await;
        self.settle(OperationKind::Rejecting, id, result).await
    }

    /// Complete an accepted appointment; it leaves the live store on
    /// the next resync (revenue capture happens elsewhere).
    pub async fn complete(&self, id: &AppointmentId) -> Result<(), LifecycleError> {
        self.claim(OperationKind::Completing, id).await?;
        let result = self.gateway.complete(id).await;
        self.settle(OperationKind::Completing, id, result).await
    }

    /// Return an accepted appointment to the pending pool.
    pub async fn return_to_pending(&self, id: &AppointmentId) -> Result<(), LifecycleError> {
        self.claim(OperationKind::ReturningToPending, id).await?;
        let result = self.gateway.return_to_pending(id).await;
        self.settle(OperationKind::ReturningToPending, id, result)
            .await
    }

    /// Move one service line to a new date.
    ///
    /// Validates locally first: a blank service name or an
    /// unresolvable date surfaces as [`LifecycleError::Validation`]
    /// and the gateway is never called. The date is normalized to a
    /// date-only value before transmission.
    pub async fn reschedule(
        &self,
        id: &AppointmentId,
        service_name: &str,
        new_date: &str,
    ) -> Result<(), LifecycleError> {
        let service_name = service_name.trim();
        if service_name.is_empty() {
            return Err(LifecycleError::Validation(
                "A service name is required to reschedule".to_string(),
            ));
        }
        let date = parse_reschedule_date(new_date).ok_or_else(|| {
            LifecycleError::Validation(format!("Unresolvable reschedule date '{new_date}'"))
        })?;

        self.claim(OperationKind::Rescheduling, id).await?;
        let result = self.gateway.reschedule(id, service_name, date).await;
        self.settle(OperationKind::Rescheduling, id, result).await
    }

    // ---- private helpers ----

    /// Claim the `(kind, id)` flag or refuse.
    async fn claim(&self, kind: OperationKind, id: &AppointmentId) -> Result<(), LifecycleError> {
        if self.store.begin_operation(kind, id).await {
            Ok(())
        } else {
            tracing::debug!(%kind, %id, "Transition refused, already in flight");
            Err(LifecycleError::AlreadyInFlight {
                kind,
                id: id.clone(),
            })
        }
    }

    /// Flag reset plus outcome handling.
    ///
    /// The reset happens first, unconditionally, so no outcome path
    /// can leave a control stuck.
    async fn settle(
        &self,
        kind: OperationKind,
        id: &AppointmentId,
        result: Result<(), GatewayError>,
    ) -> Result<(), LifecycleError> {
        self.store.set_flag(kind, id, false).await;

        match result {
            Ok(()) => {
                tracing::info!(%kind, %id, "Transition confirmed, resyncing");
                self.events.publish(ConsoleEvent::TransitionSucceeded {
                    kind,
                    id: id.clone(),
                });
                self.poller.trigger_fetch(false).await;
                Ok(())
            }
            Err(e) if e.is_cancelled() => {
                // Expected, silent: no user-facing signal.
                tracing::debug!(%kind, %id, "Transition cancelled");
                Err(e.into())
            }
            Err(e) => {
                tracing::warn!(%kind, %id, error = %e, "Transition failed");
                self.events.publish(ConsoleEvent::TransitionFailed {
                    kind,
                    id: id.clone(),
                    message: e.user_message(),
                });
                Err(e.into())
            }
        }
    }
}

/// Resolve a raw date input to a date-only value.
///
/// Accepts `YYYY-MM-DD` directly, or an RFC 3339 timestamp whose date
/// part is taken (time-of-day is dropped).
fn parse_reschedule_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    chrono::DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_plain_date() {
        assert_eq!(
            parse_reschedule_date("2026-09-15"),
            NaiveDate::from_ymd_opt(2026, 9, 15)
        );
    }

    #[test]
    fn normalizes_a_timestamp_to_date_only() {
        assert_eq!(
            parse_reschedule_date("2026-09-15T14:30:00Z"),
            NaiveDate::from_ymd_opt(2026, 9, 15)
        );
    }

    #[test]
    fn rejects_blank_and_garbage_dates() {
        assert!(parse_reschedule_date("").is_none());
        assert!(parse_reschedule_date("   ").is_none());
        assert!(parse_reschedule_date("next tuesday").is_none());
    }
}
