use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Audit event types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEvent {
    // System events
    ServiceStarted {
        version: String,
        config_hash: String,
    },
    ServiceStopped {
        reason: String,
    },

    // Reservation lifecycle
    ReservationCreated {
        reservation_id: String,
        flight_id: String,
        user_id: String,
        passengers: u32,
        amount_cents: u64,
    },
    /// A create request that did not produce a reservation.
    BookingRejected {
        flight_id: String,
        user_id: String,
        passengers: u32,
        /// Error kind, e.g. "unavailable"
        error_kind: String,
        reason: String,
    },
    ReservationConfirmed {
        reservation_id: String,
        flight_id: String,
        user_id: String,
    },
    PaymentMarked {
        reservation_id: String,
        flight_id: String,
        user_id: String,
        previous_payment_status: String,
        /// False when the reservation was already paid
        changed: bool,
    },
    ReservationCancelled {
        reservation_id: String,
        flight_id: String,
        user_id: String,
        previous_status: String,
        seats_released: u32,
        refunded: bool,
    },
}

impl AuditEvent {
    /// Returns the event type as a string for storage
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::ServiceStarted { .. } => "service_started",
            Self::ServiceStopped { .. } => "service_stopped",
            Self::ReservationCreated { .. } => "reservation_created",
            Self::BookingRejected { .. } => "booking_rejected",
            Self::ReservationConfirmed { .. } => "reservation_confirmed",
            Self::PaymentMarked { .. } => "payment_marked",
            Self::ReservationCancelled { .. } => "reservation_cancelled",
        }
    }

    /// Extract reservation_id if this event concerns an existing reservation
    pub fn reservation_id(&self) -> Option<&str> {
        match self {
            Self::ReservationCreated { reservation_id, .. }
            | Self::ReservationConfirmed { reservation_id, .. }
            | Self::PaymentMarked { reservation_id, .. }
            | Self::ReservationCancelled { reservation_id, .. } => Some(reservation_id),
            _ => None,
        }
    }

    /// Extract the flight whose seats the event touches
    pub fn flight_id(&self) -> Option<&str> {
        match self {
            Self::ReservationCreated { flight_id, .. }
            | Self::BookingRejected { flight_id, .. }
            | Self::ReservationConfirmed { flight_id, .. }
            | Self::PaymentMarked { flight_id, .. }
            | Self::ReservationCancelled { flight_id, .. } => Some(flight_id),
            Self::ServiceStarted { .. } | Self::ServiceStopped { .. } => None,
        }
    }

    /// Extract the user the event concerns
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Self::ReservationCreated { user_id, .. }
            | Self::BookingRejected { user_id, .. }
            | Self::ReservationConfirmed { user_id, .. }
            | Self::PaymentMarked { user_id, .. }
            | Self::ReservationCancelled { user_id, .. } => Some(user_id),
            _ => None,
        }
    }
}

/// A stored audit record with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub reservation_id: Option<String>,
    pub flight_id: Option<String>,
    pub user_id: Option<String>,
    pub data: AuditEvent,
}

impl AuditRecord {
    /// Build an unsaved record; the store assigns `id` on insert.
    pub fn from_event(event: AuditEvent, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            timestamp,
            event_type: event.event_type().to_string(),
            reservation_id: event.reservation_id().map(String::from),
            flight_id: event.flight_id().map(String::from),
            user_id: event.user_id().map(String::from),
            data: event,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_service_started() {
        let event = AuditEvent::ServiceStarted {
            version: "0.1.0".to_string(),
            config_hash: "abc123".to_string(),
        };
        assert_eq!(event.event_type(), "service_started");
        assert_eq!(event.reservation_id(), None);
        assert_eq!(event.flight_id(), None);
        assert_eq!(event.user_id(), None);
    }

    #[test]
    fn test_event_type_reservation_created() {
        let event = AuditEvent::ReservationCreated {
            reservation_id: "r-1".to_string(),
            flight_id: "F1".to_string(),
            user_id: "alice".to_string(),
            passengers: 2,
            amount_cents: 24_000,
        };
        assert_eq!(event.event_type(), "reservation_created");
        assert_eq!(event.reservation_id(), Some("r-1"));
        assert_eq!(event.flight_id(), Some("F1"));
        assert_eq!(event.user_id(), Some("alice"));
    }

    #[test]
    fn test_booking_rejected_has_no_reservation() {
        let event = AuditEvent::BookingRejected {
            flight_id: "F1".to_string(),
            user_id: "bob".to_string(),
            passengers: 2,
            error_kind: "unavailable".to_string(),
            reason: "requested 2 seats but only 1 left".to_string(),
        };
        assert_eq!(event.event_type(), "booking_rejected");
        assert_eq!(event.reservation_id(), None);
        assert_eq!(event.flight_id(), Some("F1"));
        assert_eq!(event.user_id(), Some("bob"));
    }

    #[test]
    fn test_serialize_deserialize_cancelled() {
        let event = AuditEvent::ReservationCancelled {
            reservation_id: "r-1".to_string(),
            flight_id: "F1".to_string(),
            user_id: "alice".to_string(),
            previous_status: "CONFIRMED".to_string(),
            seats_released: 2,
            refunded: true,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"reservation_cancelled\""));
        assert!(json.contains("\"refunded\":true"));

        let deserialized: AuditEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, event);
    }

    #[test]
    fn test_record_from_payment_event() {
        let event = AuditEvent::PaymentMarked {
            reservation_id: "r-2".to_string(),
            flight_id: "F7".to_string(),
            user_id: "carol".to_string(),
            previous_payment_status: "PENDING".to_string(),
            changed: true,
        };
        let record = AuditRecord::from_event(event.clone(), Utc::now());

        assert_eq!(record.id, 0);
        assert_eq!(record.event_type, "payment_marked");
        assert_eq!(record.reservation_id.as_deref(), Some("r-2"));
        assert_eq!(record.flight_id.as_deref(), Some("F7"));
        assert_eq!(record.user_id.as_deref(), Some("carol"));
        assert_eq!(record.data, event);
    }

    #[test]
    fn test_audit_record_serialize() {
        let mut record = AuditRecord::from_event(
            AuditEvent::ServiceStopped {
                reason: "shutdown".to_string(),
            },
            Utc::now(),
        );
        record.id = 1;
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"id\":1"));
        assert!(json.contains("\"event_type\":\"service_stopped\""));
    }
}
