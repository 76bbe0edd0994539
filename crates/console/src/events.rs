//! Console event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`ConsoleEvents`] carries the user-visible signals out of the
//! lifecycle engine and the poller: transition outcomes, sync
//! progress, and sync failures. The UI layer (or the daemon's log
//! loop) subscribes; the engines publish and never block on delivery.

use tokio::sync::broadcast;

use frostdesk_core::flags::OperationKind;
use frostdesk_core::types::AppointmentId;

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

/// A user-visible signal from the synchronization subsystem.
///
/// Cancellations are deliberately absent: a superseded fetch is an
/// expected, silent outcome, not an event.
#[derive(Debug, Clone)]
pub enum ConsoleEvent {
    /// A resync started. `manual` distinguishes the operator's
    /// "refresh now" from the scheduled poll, for UI affordance only.
    SyncStarted { manual: bool },
    /// A resync finished and the store was updated.
    SyncCompleted {
        pending: usize,
        accepted: usize,
        new_notifications: usize,
    },
    /// A resync failed; the previously-known list is kept.
    SyncFailed { message: String },
    /// A lifecycle transition was confirmed by the backend.
    TransitionSucceeded {
        kind: OperationKind,
        id: AppointmentId,
    },
    /// A lifecycle transition failed; `message` is the server's error
    /// message when present, else a generic one.
    TransitionFailed {
        kind: OperationKind,
        id: AppointmentId,
        message: String,
    },
}

/// In-process fan-out bus for [`ConsoleEvent`]s.
pub struct ConsoleEvents {
    sender: broadcast::Sender<ConsoleEvent>,
}

impl Default for ConsoleEvents {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl ConsoleEvents {
    /// Create a bus with a specific channel capacity. Slow receivers
    /// observe `RecvError::Lagged` when the buffer wraps.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// Silently dropped when nobody is listening.
    pub fn publish(&self, event: ConsoleEvent) {
        let _ = self.sender.send(event);
    }

    /// Subscribe to console events.
    pub fn subscribe(&self) -> broadcast::Receiver<ConsoleEvent> {
        self.sender.subscribe()
    }
}
