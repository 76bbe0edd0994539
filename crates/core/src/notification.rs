//! In-app notification entries for newly-arrived appointments.

use serde::{Deserialize, Serialize};

use crate::appointment::Appointment;
use crate::types::{AppointmentId, Timestamp};

/// Prefix for derived notification ids.
///
/// The id is derived from the appointment id so that accidental
/// double-processing within one sync pass dedupes by plain id equality.
const NOTIFICATION_ID_PREFIX: &str = "appt-";

/// One entry in the console's notification list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// Stable derived id: `"appt-" + appointment id`.
    pub id: String,
    pub title: String,
    pub message: String,
    /// When the notification was raised (UTC).
    pub time: Timestamp,
    /// Read/unread state. The unread count is always derived from this
    /// field, never stored separately.
    pub read: bool,
    /// The appointment this notification refers to. At most one entry
    /// per appointment id may exist in the visible list.
    pub appointment_id: AppointmentId,
}

impl Notification {
    /// Build the "new appointment awaiting approval" notification.
    pub fn pending_approval(appointment: &Appointment) -> Self {
        let summary = match appointment.services.first() {
            Some(service) => format!("requested {}", service.service_type),
            None => "awaiting review".to_string(),
        };

        Self {
            id: format!("{NOTIFICATION_ID_PREFIX}{}", appointment.id),
            title: "New appointment request".to_string(),
            message: format!("Appointment {} {summary}", appointment.id),
            time: chrono::Utc::now(),
            read: false,
            appointment_id: appointment.id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appointment::{AppointmentStatus, ServiceItem};

    fn appointment(id: i64) -> Appointment {
        Appointment {
            id: AppointmentId::from(id),
            status: AppointmentStatus::Pending,
            services: vec![ServiceItem {
                service_type: "installation".to_string(),
                date: Some("2026-09-01".to_string()),
                ac_types: vec!["split".to_string()],
            }],
            technicians: Vec::new(),
        }
    }

    #[test]
    fn derived_id_is_stable() {
        let a = Notification::pending_approval(&appointment(7));
        let b = Notification::pending_approval(&appointment(7));
        assert_eq!(a.id, "appt-7");
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn starts_unread_and_references_the_appointment() {
        let n = Notification::pending_approval(&appointment(3));
        assert!(!n.read);
        assert_eq!(n.appointment_id, AppointmentId::from(3));
        assert!(n.message.contains("installation"));
    }
}
