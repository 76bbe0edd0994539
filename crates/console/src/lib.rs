//! `frostdesk-console` -- appointment lifecycle & notification
//! synchronization.
//!
//! The client-side core of the Frostdesk admin console: the
//! appointment store, the lifecycle transition engine, the
//! notification center with its durable dedup ledger, and the poller
//! that ties them together. The binary entrypoint lives in `main.rs`.

pub mod events;
pub mod ledger;
pub mod lifecycle;
pub mod notifications;
pub mod poller;
pub mod store;

pub use events::{ConsoleEvent, ConsoleEvents};
pub use ledger::{DedupLedger, FileLedger, LedgerError, LedgerStore, MemoryLedger};
pub use lifecycle::{LifecycleEngine, LifecycleError};
pub use notifications::NotificationCenter;
pub use poller::Poller;
pub use store::AppointmentStore;
