//! In-memory appointment store.
//!
//! Holds the current known appointment set partitioned by status, plus
//! the per-appointment in-flight operation flags. All state lives
//! behind one `RwLock` so that [`AppointmentStore::replace_all`] is
//! atomic from any reader's point of view -- no observer can see one
//! partition updated and the other not.
//!
//! The store never talks to the gateway; it is written by the poller
//! and read by everything else.

use tokio::sync::RwLock;

use frostdesk_core::appointment::{Appointment, AppointmentStatus};
use frostdesk_core::flags::{OperationFlags, OperationKind};
use frostdesk_core::types::AppointmentId;

#[derive(Default)]
struct StoreState {
    pending: Vec<Appointment>,
    accepted: Vec<Appointment>,
    flags: OperationFlags,
}

/// Shared appointment state. Cheap to share via `Arc`.
#[derive(Default)]
pub struct AppointmentStore {
    state: RwLock<StoreState>,
}

impl AppointmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace both partitions with a freshly fetched list.
    ///
    /// Partitioning goes through [`AppointmentStatus::normalize`]'s
    /// output carried on each appointment: pending and accepted are
    /// retained, completed items leave the live store. Server order is
    /// preserved within each partition; a given id lands in at most one
    /// of them.
    pub async fn replace_all(&self, list: Vec<Appointment>) {
        let mut pending = Vec::new();
        let mut accepted = Vec::new();

        for appointment in list {
            match appointment.status {
                AppointmentStatus::Pending => pending.push(appointment),
                AppointmentStatus::Accepted => accepted.push(appointment),
                // Captured by the revenue intake elsewhere; not live.
                AppointmentStatus::Completed => {}
            }
        }

        let mut state = self.state.write().await;
        state.pending = pending;
        state.accepted = accepted;
    }

    /// Snapshot of the pending partition.
    pub async fn pending(&self) -> Vec<Appointment> {
        self.state.read().await.pending.clone()
    }

    /// Snapshot of the accepted partition.
    pub async fn accepted(&self) -> Vec<Appointment> {
        self.state.read().await.accepted.clone()
    }

    /// `(pending, accepted)` partition sizes.
    pub async fn counts(&self) -> (usize, usize) {
        let state = self.state.read().await;
        (state.pending.len(), state.accepted.len())
    }

    /// Read the in-flight flag for `(kind, id)`.
    pub async fn flag(&self, kind: OperationKind, id: &AppointmentId) -> bool {
        self.state.read().await.flags.is_set(kind, id)
    }

    /// Set the in-flight flag for `(kind, id)`.
    pub async fn set_flag(&self, kind: OperationKind, id: &AppointmentId, value: bool) {
        self.state.write().await.flags.set(kind, id, value);
    }

    /// Atomically claim the `(kind, id)` flag for a new operation.
    ///
    /// Returns `false` when an operation for this pair is already in
    /// flight; the caller must then refuse to issue the request.
    pub async fn begin_operation(&self, kind: OperationKind, id: &AppointmentId) -> bool {
        self.state.write().await.flags.begin(kind, id)
    }
}
