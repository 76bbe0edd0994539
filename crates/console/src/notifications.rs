//! Notification center: diff fetched appointments against the dedup
//! ledger and maintain the visible notification list.
//!
//! One `Mutex` guards the list and the ledger together, so each diff
//! pass is a single logical step relative to its fetch result -- two
//! rapid resyncs with overlapping pending sets cannot interleave in a
//! way that skips (or doubles) an id.

use tokio::sync::Mutex;

use frostdesk_core::appointment::{Appointment, AppointmentStatus};
use frostdesk_core::notification::Notification;
use frostdesk_core::types::AppointmentId;

use crate::ledger::{DedupLedger, LedgerStore};

struct CenterState {
    /// Most-recent-first, at most one entry per appointment id.
    list: Vec<Notification>,
    ledger: DedupLedger,
}

/// Owns the in-memory notification list and the durable dedup ledger.
pub struct NotificationCenter {
    state: Mutex<CenterState>,
}

impl NotificationCenter {
    /// Open the center over a ledger store. The persisted id set is
    /// loaded once, here; the visible list always starts empty (it is
    /// not durable -- only the "ever notified" set is).
    pub fn open(store: Box<dyn LedgerStore>) -> Self {
        Self {
            state: Mutex::new(CenterState {
                list: Vec::new(),
                ledger: DedupLedger::open(store),
            }),
        }
    }

    /// Diff a freshly fetched appointment list against the ledger.
    ///
    /// Every pending appointment whose id is not yet in the ledger
    /// produces exactly one notification, merged to the front of the
    /// list (replacing any older entry for the same appointment). The
    /// matched ids are recorded and persisted before this call
    /// returns.
    ///
    /// Returns the number of newly-created notifications. Also serves
    /// as the startup reconciliation pass: the first sync after a
    /// reload re-raises only unledgered pending appointments.
    pub async fn sync(&self, appointments: &[Appointment]) -> usize {
        let mut state = self.state.lock().await;

        let fresh: Vec<Notification> = appointments
            .iter()
            .filter(|a| a.status == AppointmentStatus::Pending && !state.ledger.contains(&a.id))
            .map(Notification::pending_approval)
            .collect();

        if fresh.is_empty() {
            return 0;
        }

        let created = fresh.len();
        let ids: Vec<AppointmentId> = fresh.iter().map(|n| n.appointment_id.clone()).collect();

        for notification in fresh.into_iter().rev() {
            // Replace-then-push-front keeps the list duplicate-free and
            // most-recent-first.
            state
                .list
                .retain(|existing| existing.appointment_id != notification.appointment_id);
            state.list.insert(0, notification);
        }

        // Persist immediately; a crash between the merge above and this
        // record is the only window in which a duplicate could appear
        // on restart. Accepted residual risk.
        state.ledger.record(ids);

        tracing::info!(created, "New appointment notifications raised");
        created
    }

    /// Mark one notification read. Returns `false` for an unknown id.
    ///
    /// The ledger is untouched -- it tracks *ever notified*, not
    /// *currently unread*.
    pub async fn mark_read(&self, notification_id: &str) -> bool {
        let mut state = self.state.lock().await;
        match state.list.iter_mut().find(|n| n.id == notification_id) {
            Some(notification) => {
                notification.read = true;
                true
            }
            None => false,
        }
    }

    /// Empty the visible list.
    ///
    /// Deliberately leaves the ledger alone: previously-seen pending
    /// appointments must not re-notify on the next poll.
    pub async fn clear_all(&self) {
        self.state.lock().await.list.clear();
    }

    /// Count of unread notifications, derived from the list.
    pub async fn unread_count(&self) -> usize {
        self.state
            .lock()
            .await
            .list
            .iter()
            .filter(|n| !n.read)
            .count()
    }

    /// Snapshot of the visible list, most-recent-first.
    pub async fn notifications(&self) -> Vec<Notification> {
        self.state.lock().await.list.clone()
    }
}
