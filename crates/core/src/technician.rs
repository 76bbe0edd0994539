//! Technician roster entries.
//!
//! Feeds the acceptance UI only; technicians are never mutated from
//! this subsystem.

use serde::{Deserialize, Serialize};

/// A technician available for assignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Technician {
    /// Backend identifier, when the roster endpoint provides one.
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
}
