//! Per-appointment in-flight operation bookkeeping.
//!
//! Every lifecycle transition is guarded by a `(kind, id)` flag: the
//! flag is `true` for the entire duration of exactly one in-flight
//! request, and a second request for the same pair must be refused
//! while it holds. The map is an explicit keyed type with a narrow
//! update API so the "flag always reset" invariant stays mechanically
//! checkable.

use std::collections::HashMap;
use std::fmt;

use crate::types::AppointmentId;

/// The five lifecycle transition kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Accepting,
    Rejecting,
    Completing,
    Rescheduling,
    ReturningToPending,
}

impl OperationKind {
    /// Snake-case name used in logs and events.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accepting => "accepting",
            Self::Rejecting => "rejecting",
            Self::Completing => "completing",
            Self::Rescheduling => "rescheduling",
            Self::ReturningToPending => "returning_to_pending",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keyed map of `(kind, id)` in-flight flags.
///
/// Entries are created lazily on first use and reset to `false` (not
/// removed) when an operation settles; an absent entry reads as
/// `false`.
#[derive(Debug, Default)]
pub struct OperationFlags {
    flags: HashMap<(OperationKind, AppointmentId), bool>,
}

impl OperationFlags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the flag for `(kind, id)`. Absent entries are `false`.
    pub fn is_set(&self, kind: OperationKind, id: &AppointmentId) -> bool {
        self.flags.get(&(kind, id.clone())).copied().unwrap_or(false)
    }

    /// Set the flag for `(kind, id)`. Pure map update, never fails.
    pub fn set(&mut self, kind: OperationKind, id: &AppointmentId, value: bool) {
        self.flags.insert((kind, id.clone()), value);
    }

    /// Set the flag to `true` unless it already is.
    ///
    /// Returns `false` when an operation for this pair is already in
    /// flight -- the caller must then refuse to issue a second request.
    pub fn begin(&mut self, kind: OperationKind, id: &AppointmentId) -> bool {
        let entry = self.flags.entry((kind, id.clone())).or_insert(false);
        if *entry {
            return false;
        }
        *entry = true;
        true
    }
}
