//! Shared test fixtures: a scriptable in-process booking gateway and
//! appointment builders.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::{Mutex, Notify};
use tokio_util::sync::CancellationToken;

use frostdesk_core::appointment::{Appointment, AppointmentStatus};
use frostdesk_core::technician::Technician;
use frostdesk_core::types::AppointmentId;
use frostdesk_gateway::{BookingApi, GatewayError};

/// Build a pending appointment with no services.
pub fn pending(id: i64) -> Appointment {
    Appointment {
        id: AppointmentId::from(id),
        status: AppointmentStatus::Pending,
        services: Vec::new(),
        technicians: Vec::new(),
    }
}

/// Build an accepted appointment with no services.
pub fn accepted(id: i64) -> Appointment {
    Appointment {
        status: AppointmentStatus::Accepted,
        ..pending(id)
    }
}

/// One scripted response for `list_appointments`.
pub struct ListScript {
    /// `Ok` payload or an API error message.
    pub result: Result<Vec<Appointment>, String>,
    /// When set, the call blocks until the `Notify` fires.
    pub hold: Option<Arc<Notify>>,
    /// Whether the call races the hold/response against the caller's
    /// cancellation token (the real HTTP binding does).
    pub respect_cancel: bool,
}

impl ListScript {
    pub fn ok(list: Vec<Appointment>) -> Self {
        Self {
            result: Ok(list),
            hold: None,
            respect_cancel: true,
        }
    }

    pub fn err(message: &str) -> Self {
        Self {
            result: Err(message.to_string()),
            hold: None,
            respect_cancel: true,
        }
    }

    pub fn held(mut self, hold: Arc<Notify>) -> Self {
        self.hold = Some(hold);
        self
    }

    /// Simulate a response that arrives even though its cancellation
    /// signal fired (out-of-order completion).
    pub fn ignoring_cancel(mut self) -> Self {
        self.respect_cancel = false;
        self
    }
}

/// Scriptable [`BookingApi`] fake.
///
/// `list_appointments` pops scripts front-to-back; an exhausted queue
/// answers with an empty list. Transition calls count invocations and
/// can be held open or forced to fail.
#[derive(Default)]
pub struct MockApi {
    lists: Mutex<VecDeque<ListScript>>,
    /// Completed (non-cancelled) list fetches.
    pub lists_completed: AtomicUsize,
    pub accept_calls: AtomicUsize,
    pub reject_calls: AtomicUsize,
    pub complete_calls: AtomicUsize,
    pub reschedule_calls: AtomicUsize,
    pub return_calls: AtomicUsize,
    /// When set, every transition call fails with this API message.
    transition_error: Mutex<Option<String>>,
    /// When set, every transition call resolves as cancelled.
    transition_cancelled: Mutex<bool>,
    /// When set, every transition call blocks until the `Notify` fires.
    transition_hold: Mutex<Option<Arc<Notify>>>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn script_list(&self, script: ListScript) {
        self.lists.lock().await.push_back(script);
    }

    pub async fn fail_transitions_with(&self, message: &str) {
        *self.transition_error.lock().await = Some(message.to_string());
    }

    pub async fn hold_transitions(&self, hold: Arc<Notify>) {
        *self.transition_hold.lock().await = Some(hold);
    }

    pub async fn cancel_transitions(&self) {
        *self.transition_cancelled.lock().await = true;
    }

    async fn transition(&self, counter: &AtomicUsize) -> Result<(), GatewayError> {
        counter.fetch_add(1, Ordering::SeqCst);

        let hold = self.transition_hold.lock().await.clone();
        if let Some(hold) = hold {
            hold.notified().await;
        }

        if *self.transition_cancelled.lock().await {
            return Err(GatewayError::Cancelled);
        }

        match self.transition_error.lock().await.clone() {
            Some(message) => Err(GatewayError::Api {
                status: 422,
                message,
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl BookingApi for MockApi {
    async fn list_appointments(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<Appointment>, GatewayError> {
        let script = self.lists.lock().await.pop_front();
        let script = match script {
            Some(script) => script,
            None => ListScript::ok(Vec::new()),
        };

        let hold = script.hold.clone();
        let resolve = async move {
            if let Some(hold) = hold {
                hold.notified().await;
            }
        };

        if script.respect_cancel {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(GatewayError::Cancelled),
                _ = resolve => {}
            }
        } else {
            resolve.await;
        }

        self.lists_completed.fetch_add(1, Ordering::SeqCst);
        match script.result {
            Ok(list) => Ok(list),
            Err(message) => Err(GatewayError::Api {
                status: 500,
                message,
            }),
        }
    }

    async fn accept(
        &self,
        _id: &AppointmentId,
        _technicians: &[String],
    ) -> Result<(), GatewayError> {
        self.transition(&self.accept_calls).await
    }

    async fn reject(
        &self,
        _id: &AppointmentId,
        _reason: Option<&str>,
    ) -> Result<(), GatewayError> {
        self.transition(&self.reject_calls).await
    }

    async fn complete(&self, _id: &AppointmentId) -> Result<(), GatewayError> {
        self.transition(&self.complete_calls).await
    }

    async fn reschedule(
        &self,
        _id: &AppointmentId,
        _service_name: &str,
        _new_date: NaiveDate,
    ) -> Result<(), GatewayError> {
        self.transition(&self.reschedule_calls).await
    }

    async fn return_to_pending(&self, _id: &AppointmentId) -> Result<(), GatewayError> {
        self.transition(&self.return_calls).await
    }

    async fn list_technicians(&self) -> Result<Vec<Technician>, GatewayError> {
        Ok(vec![Technician {
            id: Some(1),
            name: "Sam".to_string(),
        }])
    }
}

/// Wire a full console assembly (store, notifications over an
/// in-memory ledger, events, poller, engine) around a gateway.
pub struct Harness {
    pub gateway: Arc<MockApi>,
    pub store: Arc<frostdesk_console::AppointmentStore>,
    pub notifications: Arc<frostdesk_console::NotificationCenter>,
    pub events: Arc<frostdesk_console::ConsoleEvents>,
    pub poller: Arc<frostdesk_console::Poller<MockApi>>,
    pub engine: Arc<frostdesk_console::LifecycleEngine<MockApi>>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_ledger(Box::new(frostdesk_console::MemoryLedger::new()))
    }

    pub fn with_ledger(ledger: Box<dyn frostdesk_console::LedgerStore>) -> Self {
        let gateway = Arc::new(MockApi::new());
        let store = Arc::new(frostdesk_console::AppointmentStore::new());
        let notifications = Arc::new(frostdesk_console::NotificationCenter::open(ledger));
        let events = Arc::new(frostdesk_console::ConsoleEvents::default());
        let poller = Arc::new(frostdesk_console::Poller::new(
            Arc::clone(&gateway),
            Arc::clone(&store),
            Arc::clone(&notifications),
            Arc::clone(&events),
        ));
        let engine = Arc::new(frostdesk_console::LifecycleEngine::new(
            Arc::clone(&gateway),
            Arc::clone(&store),
            Arc::clone(&poller),
            Arc::clone(&events),
        ));

        Self {
            gateway,
            store,
            notifications,
            events,
            poller,
            engine,
        }
    }
}
