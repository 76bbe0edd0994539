//! Durable "already notified" ledger.
//!
//! The ledger remembers which appointment ids have ever produced a
//! notification, so that clearing the visible list (or reloading the
//! console) never re-raises an alert for an appointment the operator
//! has already seen. Ids are added and never removed -- the set grows
//! monotonically by design.
//!
//! Persistence goes through the [`LedgerStore`] port so the real
//! file-backed store and the in-memory test fake are interchangeable.

use std::collections::HashSet;
use std::path::PathBuf;

use frostdesk_core::types::AppointmentId;

/// Errors from ledger persistence.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Reading or writing the backing store failed.
    #[error("Ledger I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The stored value could not be serialized.
    #[error("Ledger serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Persistence port for the dedup ledger.
///
/// `load` must treat a missing or corrupt stored value as the empty
/// set -- persistence problems are never fatal to the console.
pub trait LedgerStore: Send + Sync {
    /// Read the persisted id set.
    fn load(&self) -> Result<HashSet<AppointmentId>, LedgerError>;

    /// Persist the full id set.
    fn save(&self, ids: &HashSet<AppointmentId>) -> Result<(), LedgerError>;
}

// ---------------------------------------------------------------------------
// File-backed store
// ---------------------------------------------------------------------------

/// Ledger persisted as a JSON array of ids at a fixed path.
pub struct FileLedger {
    path: PathBuf,
}

impl FileLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl LedgerStore for FileLedger {
    fn load(&self) -> Result<HashSet<AppointmentId>, LedgerError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(HashSet::new());
            }
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str::<HashSet<AppointmentId>>(&raw) {
            Ok(ids) => Ok(ids),
            Err(e) => {
                // Corrupt stored value: start over rather than fail.
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Corrupt notification ledger, treating as empty",
                );
                Ok(HashSet::new())
            }
        }
    }

    fn save(&self, ids: &HashSet<AppointmentId>) -> Result<(), LedgerError> {
        let json = serde_json::to_string(ids)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Volatile ledger store for tests and ephemeral runs.
#[derive(Default)]
pub struct MemoryLedger {
    ids: std::sync::Mutex<HashSet<AppointmentId>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed the store, simulating state left by a previous run.
    pub fn seeded(ids: impl IntoIterator<Item = AppointmentId>) -> Self {
        Self {
            ids: std::sync::Mutex::new(ids.into_iter().collect()),
        }
    }
}

impl LedgerStore for MemoryLedger {
    fn load(&self) -> Result<HashSet<AppointmentId>, LedgerError> {
        Ok(self.ids.lock().expect("ledger mutex poisoned").clone())
    }

    fn save(&self, ids: &HashSet<AppointmentId>) -> Result<(), LedgerError> {
        *self.ids.lock().expect("ledger mutex poisoned") = ids.clone();
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// DedupLedger
// ---------------------------------------------------------------------------

/// The in-memory working set plus its persistence port.
///
/// Writes are best-effort-synchronous: each mutation persists
/// immediately, and a persistence failure is logged but never blocks
/// notification display.
pub struct DedupLedger {
    seen: HashSet<AppointmentId>,
    store: Box<dyn LedgerStore>,
}

impl DedupLedger {
    /// Load the persisted set through the store. A load failure starts
    /// from the empty set with an error logged.
    pub fn open(store: Box<dyn LedgerStore>) -> Self {
        let seen = match store.load() {
            Ok(ids) => ids,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load notification ledger, starting empty");
                HashSet::new()
            }
        };
        Self { seen, store }
    }

    /// Whether `id` has ever produced a notification.
    pub fn contains(&self, id: &AppointmentId) -> bool {
        self.seen.contains(id)
    }

    /// Number of ids ever recorded.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Record `ids` as notified and persist immediately.
    ///
    /// Ids are only ever added. A persist failure is logged and
    /// swallowed.
    pub fn record(&mut self, ids: impl IntoIterator<Item = AppointmentId>) {
        let before = self.seen.len();
        self.seen.extend(ids);
        if self.seen.len() == before {
            return;
        }

        if let Err(e) = self.store.save(&self.seen) {
            tracing::error!(error = %e, "Failed to persist notification ledger");
        }
    }
}
