//! Reservation storage trait and filter.

use chrono::{DateTime, Utc};

use super::{NewReservation, Reservation, ReservationStatus};
use crate::error::ReservationError;
use crate::lifecycle::{Transition, TransitionOutcome};

/// Filter for querying reservations.
#[derive(Debug, Clone)]
pub struct ReservationFilter {
    pub flight_id: Option<String>,
    pub user_id: Option<String>,
    pub status: Option<ReservationStatus>,
    /// Maximum number of results.
    pub limit: i64,
    /// Offset for pagination.
    pub offset: i64,
}

impl Default for ReservationFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReservationFilter {
    /// Create a new filter with defaults.
    pub fn new() -> Self {
        Self {
            flight_id: None,
            user_id: None,
            status: None,
            limit: 100,
            offset: 0,
        }
    }

    pub fn with_flight(mut self, flight_id: impl Into<String>) -> Self {
        self.flight_id = Some(flight_id.into());
        self
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_status(mut self, status: ReservationStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }
}

/// Storage for reservation records.
///
/// Records are never deleted; cancellation is a status transition.
pub trait ReservationStore: Send + Sync {
    /// Insert a new reservation in PENDING/PENDING.
    fn insert(&self, reservation: NewReservation) -> Result<Reservation, ReservationError>;

    /// Get a reservation by ID.
    fn get(&self, id: &str) -> Result<Option<Reservation>, ReservationError>;

    /// List reservations matching the filter, oldest first.
    fn list(&self, filter: &ReservationFilter) -> Result<Vec<Reservation>, ReservationError>;

    /// Count reservations matching the filter (ignores limit/offset).
    fn count(&self, filter: &ReservationFilter) -> Result<i64, ReservationError>;

    /// Passengers held by PENDING and CONFIRMED reservations on a flight.
    fn committed_passengers(&self, flight_id: &str) -> Result<u32, ReservationError>;

    /// Read, evaluate and write a transition as one atomic step.
    ///
    /// Fails with `NotFound` if the reservation does not exist and with
    /// `InvalidTransition` if the current status does not permit it; in both
    /// cases the record is left unchanged.
    fn apply_transition(
        &self,
        id: &str,
        transition: Transition,
        at: DateTime<Utc>,
    ) -> Result<TransitionOutcome, ReservationError>;
}
