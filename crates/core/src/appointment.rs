//! Appointment model and status machine.
//!
//! The status values are server-authoritative; the client only mirrors
//! them. [`AppointmentStatus::normalize`] is the single source of truth
//! for the "missing status means pending" rule -- nothing else in the
//! workspace is allowed to interpret a raw status string.

use serde::{Deserialize, Deserializer, Serialize};

use crate::types::AppointmentId;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Client-visible lifecycle state of an appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    /// Awaiting triage. Also the default for missing/unknown statuses.
    Pending,
    /// Accepted and (possibly) assigned to technicians.
    Accepted,
    /// Finished. Completed appointments leave the live store.
    Completed,
}

impl AppointmentStatus {
    /// Normalize a raw status value from the backend.
    ///
    /// Matching is case-insensitive and whitespace-tolerant. A missing,
    /// empty, or unrecognized status is treated as [`Pending`].
    ///
    /// [`Pending`]: AppointmentStatus::Pending
    pub fn normalize(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("accepted") => Self::Accepted,
            Some("completed") => Self::Completed,
            _ => Self::Pending,
        }
    }
}

impl<'de> Deserialize<'de> for AppointmentStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(Self::normalize(raw.as_deref()))
    }
}

// ---------------------------------------------------------------------------
// Services
// ---------------------------------------------------------------------------

/// One requested service line on an appointment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceItem {
    /// Service kind, e.g. `"installation"` or `"maintenance"`.
    #[serde(rename = "type")]
    pub service_type: String,
    /// Requested service date as sent by the backend (date-only string).
    #[serde(default)]
    pub date: Option<String>,
    /// Air-conditioner types the service applies to.
    #[serde(default)]
    pub ac_types: Vec<String>,
}

/// Parse the backend's serialized `services` text.
///
/// The backend stores services as a JSON text blob. A single object is
/// coerced to a one-element list. Unparseable text yields an **empty
/// list**, never an error -- a corrupt row must not take down the
/// console.
pub fn parse_services(raw: &str) -> Vec<ServiceItem> {
    if raw.trim().is_empty() {
        return Vec::new();
    }
    match serde_json::from_str::<OneOrMany<ServiceItem>>(raw) {
        Ok(parsed) => parsed.into_vec(),
        Err(e) => {
            tracing::warn!(error = %e, "Unparseable services payload, treating as empty");
            Vec::new()
        }
    }
}

/// Accepts either a single JSON value or an array of them.
///
/// The backend's list endpoints occasionally return a bare object when
/// exactly one row matches; callers must coerce to an array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    /// A proper JSON array.
    Many(Vec<T>),
    /// A bare object, coerced to a one-element list.
    One(T),
}

impl<T> OneOrMany<T> {
    /// Flatten into a plain `Vec`.
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::Many(items) => items,
            Self::One(item) => vec![item],
        }
    }
}

// ---------------------------------------------------------------------------
// Appointment
// ---------------------------------------------------------------------------

/// One customer service request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    /// Opaque stable identifier, primary key.
    pub id: AppointmentId,
    /// Server-authoritative lifecycle state. Absent on the wire means
    /// pending (see [`AppointmentStatus::normalize`]).
    #[serde(default = "default_status")]
    pub status: AppointmentStatus,
    /// Ordered service lines, parsed defensively from the backend's
    /// text serialization.
    #[serde(default, deserialize_with = "deserialize_services")]
    pub services: Vec<ServiceItem>,
    /// Assigned technician names; empty until acceptance assigns some.
    #[serde(default)]
    pub technicians: Vec<String>,
}

fn default_status() -> AppointmentStatus {
    AppointmentStatus::Pending
}

/// Deserialize `services` from either a JSON text blob or an inline
/// array/object. Unparseable blobs become the empty list.
fn deserialize_services<'de, D>(deserializer: D) -> Result<Vec<ServiceItem>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawServices {
        Text(String),
        Inline(OneOrMany<ServiceItem>),
    }

    match Option::<RawServices>::deserialize(deserializer)? {
        Some(RawServices::Text(blob)) => Ok(parse_services(&blob)),
        Some(RawServices::Inline(items)) => Ok(items.into_vec()),
        None => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -----------------------------------------------------------------------
    // Status normalization
    // -----------------------------------------------------------------------

    #[test]
    fn normalize_is_case_insensitive() {
        assert_eq!(
            AppointmentStatus::normalize(Some("ACCEPTED")),
            AppointmentStatus::Accepted
        );
        assert_eq!(
            AppointmentStatus::normalize(Some("Completed")),
            AppointmentStatus::Completed
        );
        assert_eq!(
            AppointmentStatus::normalize(Some("pending")),
            AppointmentStatus::Pending
        );
    }

    #[test]
    fn normalize_trims_whitespace() {
        assert_eq!(
            AppointmentStatus::normalize(Some("  accepted ")),
            AppointmentStatus::Accepted
        );
    }

    #[test]
    fn missing_status_defaults_to_pending() {
        assert_eq!(AppointmentStatus::normalize(None), AppointmentStatus::Pending);
        assert_eq!(
            AppointmentStatus::normalize(Some("")),
            AppointmentStatus::Pending
        );
    }

    #[test]
    fn unrecognized_status_defaults_to_pending() {
        assert_eq!(
            AppointmentStatus::normalize(Some("archived")),
            AppointmentStatus::Pending
        );
    }

    // -----------------------------------------------------------------------
    // Services parsing
    // -----------------------------------------------------------------------

    #[test]
    fn parse_services_reads_an_array() {
        let raw = r#"[{"type":"installation","date":"2026-09-01","ac_types":["split"]}]"#;
        let services = parse_services(raw);
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].service_type, "installation");
        assert_eq!(services[0].ac_types, vec!["split"]);
    }

    #[test]
    fn parse_services_coerces_single_object() {
        let raw = r#"{"type":"maintenance"}"#;
        let services = parse_services(raw);
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].service_type, "maintenance");
        assert!(services[0].date.is_none());
    }

    #[test]
    fn malformed_services_text_parses_to_empty_list() {
        assert!(parse_services("not json").is_empty());
        assert!(parse_services("{broken").is_empty());
        assert!(parse_services("").is_empty());
    }

    // -----------------------------------------------------------------------
    // Appointment deserialization
    // -----------------------------------------------------------------------

    #[test]
    fn appointment_without_status_is_pending() {
        let appt: Appointment = serde_json::from_str(r#"{"id": 1}"#).unwrap();
        assert_eq!(appt.status, AppointmentStatus::Pending);
        assert!(appt.services.is_empty());
        assert!(appt.technicians.is_empty());
    }

    #[test]
    fn appointment_with_text_blob_services() {
        let appt: Appointment = serde_json::from_str(
            r#"{"id":"a-1","status":"accepted","services":"[{\"type\":\"repair\"}]"}"#,
        )
        .unwrap();
        assert_eq!(appt.status, AppointmentStatus::Accepted);
        assert_eq!(appt.services.len(), 1);
        assert_eq!(appt.services[0].service_type, "repair");
    }

    #[test]
    fn appointment_with_corrupt_services_blob_does_not_fail() {
        let appt: Appointment =
            serde_json::from_str(r#"{"id":2,"services":"not json"}"#).unwrap();
        assert!(appt.services.is_empty());
    }

    #[test]
    fn appointment_with_inline_services_array() {
        let appt: Appointment = serde_json::from_str(
            r#"{"id":3,"services":[{"type":"installation","ac_types":["window","split"]}]}"#,
        )
        .unwrap();
        assert_eq!(appt.services.len(), 1);
        assert_eq!(appt.services[0].ac_types.len(), 2);
    }
}
