//! Periodic resynchronization with cancel-then-fetch supersession.
//!
//! The poller owns exactly one live fetch at a time: before issuing a
//! new list request it cancels the previous one's token, so a slow
//! earlier response can never overwrite the result of a newer request.
//! Each fetch also carries a generation number, checked again at
//! resolution time -- even a superseded request whose cancellation
//! signal lost the race gets its result discarded rather than applied.
//!
//! A failed poll keeps the previously-known appointment list (stale
//! data beats an empty screen); the next scheduled tick retries.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use frostdesk_gateway::BookingApi;

use crate::events::{ConsoleEvent, ConsoleEvents};
use crate::notifications::NotificationCenter;
use crate::store::AppointmentStore;

/// Bookkeeping for the single in-flight fetch.
#[derive(Default)]
struct FetchSlot {
    /// Cancellation token of the current fetch, if one is live.
    token: Option<CancellationToken>,
    /// Monotonically increasing fetch number; a resolved fetch whose
    /// number no longer matches has been superseded.
    generation: u64,
}

/// Drives resynchronization: scheduled ticks plus manual triggers,
/// both coalesced through the same cancel-then-fetch path.
pub struct Poller<G> {
    gateway: Arc<G>,
    store: Arc<AppointmentStore>,
    notifications: Arc<NotificationCenter>,
    events: Arc<ConsoleEvents>,
    /// Master token -- cancelled at teardown; every fetch token is a
    /// child of it.
    cancel: CancellationToken,
    slot: Mutex<FetchSlot>,
}

impl<G: BookingApi> Poller<G> {
    pub fn new(
        gateway: Arc<G>,
        store: Arc<AppointmentStore>,
        notifications: Arc<NotificationCenter>,
        events: Arc<ConsoleEvents>,
    ) -> Self {
        Self {
            gateway,
            store,
            notifications,
            events,
            cancel: CancellationToken::new(),
            slot: Mutex::new(FetchSlot::default()),
        }
    }

    /// Issue a resync now, superseding any still-pending fetch.
    ///
    /// `manual` marks an operator-initiated refresh; it only affects
    /// the [`ConsoleEvent::SyncStarted`] affordance, the fetch path is
    /// identical.
    pub async fn trigger_fetch(&self, manual: bool) {
        let (token, generation) = {
            let mut slot = self.slot.lock().await;
            if let Some(previous) = slot.token.take() {
                previous.cancel();
            }
            let token = self.cancel.child_token();
            slot.generation += 1;
            slot.token = Some(token.clone());
            (token, slot.generation)
        };

        self.events.publish(ConsoleEvent::SyncStarted { manual });

        let result = self.gateway.list_appointments(&token).await;

        // Holding the slot through result application serializes the
        // store update + notification diff per fetch.
        let mut slot = self.slot.lock().await;
        if slot.generation != generation {
            tracing::debug!(generation, "Discarding superseded fetch result");
            return;
        }
        slot.token = None;

        match result {
            Ok(list) => {
                self.store.replace_all(list.clone()).await;
                let new_notifications = self.notifications.sync(&list).await;
                let (pending, accepted) = self.store.counts().await;
                tracing::debug!(pending, accepted, new_notifications, "Resync applied");
                self.events.publish(ConsoleEvent::SyncCompleted {
                    pending,
                    accepted,
                    new_notifications,
                });
            }
            Err(e) if e.is_cancelled() => {
                // Expected during supersession and shutdown.
                tracing::debug!("Fetch cancelled");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Resync failed, keeping stale data");
                self.events.publish(ConsoleEvent::SyncFailed {
                    message: e.user_message(),
                });
            }
        }
    }

    /// Run the scheduled polling loop until [`shutdown`] is called.
    ///
    /// The first tick fires immediately (mount-time fetch); subsequent
    /// ticks follow `interval`.
    ///
    /// [`shutdown`]: Poller::shutdown
    pub async fn run(&self, interval: Duration) {
        tracing::info!(interval_secs = interval.as_secs(), "Appointment poller started");
        let mut ticker = tokio::time::interval(interval);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::info!("Appointment poller stopping");
                    break;
                }
                _ = ticker.tick() => {
                    self.trigger_fetch(false).await;
                }
            }
        }
    }

    /// Tear down: stops the polling loop and cancels any outstanding
    /// fetch. Triggers after shutdown resolve as cancelled without
    /// touching the store.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}
