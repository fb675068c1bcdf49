//! Seat availability.
//!
//! Availability is derived on every call from the catalog capacity and the
//! passengers held by non-cancelled reservations. Nothing is cached, so a
//! cancellation frees its seats immediately.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::clock::Clock;
use crate::error::ReservationError;
use crate::flight::{CatalogError, Flight, FlightCatalog, FlightStatus};
use crate::metrics;
use crate::reservation::ReservationStore;

/// Seat counts for one flight.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct SeatSummary {
    pub capacity: u32,
    pub committed: u32,
    pub available: u32,
}

/// Why a booking cannot be made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingBlocker {
    NoPassengers,
    NotScheduled(FlightStatus),
    Departed,
    InsufficientSeats { requested: u32, available: u32 },
}

impl fmt::Display for BookingBlocker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookingBlocker::NoPassengers => write!(f, "at least one passenger is required"),
            BookingBlocker::NotScheduled(status) => {
                write!(f, "flight is {}", status.as_str().to_lowercase())
            }
            BookingBlocker::Departed => write!(f, "flight has already departed"),
            BookingBlocker::InsufficientSeats {
                requested,
                available,
            } => write!(
                f,
                "requested {} seats but only {} left",
                requested, available
            ),
        }
    }
}

/// Full result of a booking check.
#[derive(Debug, Clone)]
pub struct BookingAssessment {
    pub flight: Flight,
    pub seats: SeatSummary,
    /// `None` when the booking can proceed.
    pub blocker: Option<BookingBlocker>,
}

impl BookingAssessment {
    pub fn is_bookable(&self) -> bool {
        self.blocker.is_none()
    }
}

/// Computes bookable seats. Holds no state of its own.
#[derive(Clone)]
pub struct AvailabilityEngine {
    catalog: Arc<dyn FlightCatalog>,
    store: Arc<dyn ReservationStore>,
    clock: Arc<dyn Clock>,
}

impl AvailabilityEngine {
    pub fn new(
        catalog: Arc<dyn FlightCatalog>,
        store: Arc<dyn ReservationStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            catalog,
            store,
            clock,
        }
    }

    /// Seats still bookable on the flight, clamped at zero.
    pub fn available_seats(&self, flight_id: &str) -> Result<u32, ReservationError> {
        Ok(self.seat_summary(flight_id)?.available)
    }

    /// True iff the flight is scheduled, has not departed, and has room for
    /// `passengers` (which must be at least one).
    pub fn can_book(&self, flight_id: &str, passengers: u32) -> Result<bool, ReservationError> {
        Ok(self.assess(flight_id, passengers)?.is_bookable())
    }

    pub fn seat_summary(&self, flight_id: &str) -> Result<SeatSummary, ReservationError> {
        let flight = self.fetch_flight(flight_id)?;
        self.summarize(&flight)
    }

    /// Seat counts for an already fetched flight.
    pub fn summarize(&self, flight: &Flight) -> Result<SeatSummary, ReservationError> {
        let committed = self.store.committed_passengers(&flight.id)?;
        Ok(SeatSummary {
            capacity: flight.capacity,
            committed,
            available: flight.capacity.saturating_sub(committed),
        })
    }

    /// Evaluate every booking rule and report the first one that fails.
    pub fn assess(
        &self,
        flight_id: &str,
        passengers: u32,
    ) -> Result<BookingAssessment, ReservationError> {
        let flight = self.fetch_flight(flight_id)?;
        self.assess_flight(flight, passengers)
    }

    /// Like [`assess`](Self::assess) for an already fetched flight.
    pub fn assess_flight(
        &self,
        flight: Flight,
        passengers: u32,
    ) -> Result<BookingAssessment, ReservationError> {
        let seats = self.summarize(&flight)?;

        let blocker = if passengers == 0 {
            Some(BookingBlocker::NoPassengers)
        } else if flight.status != FlightStatus::Scheduled {
            Some(BookingBlocker::NotScheduled(flight.status))
        } else if flight.departure_at <= self.clock.now() {
            Some(BookingBlocker::Departed)
        } else if passengers > seats.available {
            Some(BookingBlocker::InsufficientSeats {
                requested: passengers,
                available: seats.available,
            })
        } else {
            None
        };

        Ok(BookingAssessment {
            flight,
            seats,
            blocker,
        })
    }

    fn fetch_flight(&self, flight_id: &str) -> Result<Flight, ReservationError> {
        self.catalog.get_flight(flight_id).map_err(|err| {
            if !matches!(err, CatalogError::NotFound(_)) {
                metrics::CATALOG_FAILURES
                    .with_label_values(&["get_flight"])
                    .inc();
            }
            ReservationError::from(err)
        })
    }
}
