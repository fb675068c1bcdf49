//! Read-side views over reservations and flights.
//!
//! Nothing here writes. Views are computed on each call from the catalog,
//! the reservation store and the clock.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::availability::{AvailabilityEngine, SeatSummary};
use crate::clock::Clock;
use crate::error::ReservationError;
use crate::flight::{CatalogError, Flight, FlightCatalog, FlightFilter, FlightStatus, FlightType};
use crate::metrics;
use crate::reservation::{
    PaymentStatus, Reservation, ReservationFilter, ReservationStatus, ReservationStore,
};

/// Which of a user's reservations to list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationScope {
    /// Not cancelled, departing after now. Soonest first.
    #[default]
    Upcoming,
    /// Departed or cancelled. Most recent first.
    Past,
    /// Everything, soonest departure first.
    All,
}

impl ReservationScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationScope::Upcoming => "upcoming",
            ReservationScope::Past => "past",
            ReservationScope::All => "all",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "upcoming" => Some(ReservationScope::Upcoming),
            "past" => Some(ReservationScope::Past),
            "all" => Some(ReservationScope::All),
            _ => None,
        }
    }

    fn includes(
        &self,
        departure_at: DateTime<Utc>,
        status: ReservationStatus,
        now: DateTime<Utc>,
    ) -> bool {
        let upcoming = departure_at > now && status != ReservationStatus::Cancelled;
        match self {
            ReservationScope::Upcoming => upcoming,
            ReservationScope::Past => !upcoming,
            ReservationScope::All => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeTone {
    Success,
    Warning,
    Danger,
    Info,
}

/// A status label with a display tone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Badge {
    pub label: &'static str,
    pub tone: BadgeTone,
}

impl Badge {
    pub fn for_status(status: ReservationStatus) -> Self {
        match status {
            ReservationStatus::Confirmed => Badge {
                label: "Confirmed",
                tone: BadgeTone::Success,
            },
            ReservationStatus::Pending => Badge {
                label: "Pending",
                tone: BadgeTone::Warning,
            },
            ReservationStatus::Cancelled => Badge {
                label: "Cancelled",
                tone: BadgeTone::Danger,
            },
        }
    }

    pub fn for_payment(status: PaymentStatus) -> Self {
        match status {
            PaymentStatus::Paid => Badge {
                label: "Paid",
                tone: BadgeTone::Success,
            },
            PaymentStatus::Pending => Badge {
                label: "Pending",
                tone: BadgeTone::Warning,
            },
            PaymentStatus::Refunded => Badge {
                label: "Refunded",
                tone: BadgeTone::Info,
            },
        }
    }
}

/// Format a flight duration as `"2h 30m"`, `"2h"` or `"45m"`.
///
/// Negative durations render as `"0m"`.
pub fn format_duration(duration: Duration) -> String {
    let minutes = duration.num_minutes().max(0);
    let (hours, minutes) = (minutes / 60, minutes % 60);
    match (hours, minutes) {
        (0, m) => format!("{}m", m),
        (h, 0) => format!("{}h", h),
        (h, m) => format!("{}h {}m", h, m),
    }
}

/// The parts of a flight shown next to a reservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlightSummary {
    pub id: String,
    /// E.g. `"Cessna 172 (SX-ABC)"`.
    pub aircraft: String,
    pub flight_type: FlightType,
    pub departure_at: DateTime<Utc>,
    pub estimated_return_at: DateTime<Utc>,
    pub status: FlightStatus,
}

impl From<&Flight> for FlightSummary {
    fn from(flight: &Flight) -> Self {
        Self {
            id: flight.id.clone(),
            aircraft: format!("{} ({})", flight.aircraft.model, flight.aircraft.registration),
            flight_type: flight.flight_type,
            departure_at: flight.departure_at,
            estimated_return_at: flight.estimated_return_at,
            status: flight.status,
        }
    }
}

/// A reservation with display fields derived from its flight.
#[derive(Debug, Clone, Serialize)]
pub struct ReservationView {
    pub reservation: Reservation,
    pub flight: FlightSummary,
    pub duration: String,
    pub status_badge: Badge,
    pub payment_badge: Badge,
}

impl ReservationView {
    pub fn new(reservation: Reservation, flight: &Flight) -> Self {
        Self {
            status_badge: Badge::for_status(reservation.status),
            payment_badge: Badge::for_payment(reservation.payment_status),
            duration: format_duration(flight.duration()),
            flight: FlightSummary::from(flight),
            reservation,
        }
    }
}

/// A catalog flight with live seat counts.
#[derive(Debug, Clone, Serialize)]
pub struct FlightView {
    pub flight: Flight,
    pub seats: SeatSummary,
    pub duration: String,
    /// Whether a single seat could be booked right now.
    pub bookable: bool,
}

/// Stateless read-side composition over the catalog and the store.
#[derive(Clone)]
pub struct ReservationQuery {
    catalog: Arc<dyn FlightCatalog>,
    store: Arc<dyn ReservationStore>,
    engine: AvailabilityEngine,
    clock: Arc<dyn Clock>,
}

impl ReservationQuery {
    pub fn new(
        catalog: Arc<dyn FlightCatalog>,
        store: Arc<dyn ReservationStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            engine: AvailabilityEngine::new(
                Arc::clone(&catalog),
                Arc::clone(&store),
                Arc::clone(&clock),
            ),
            catalog,
            store,
            clock,
        }
    }

    /// A user's reservations in the given scope.
    ///
    /// Reservations whose flight is no longer in the catalog are skipped.
    /// Any other catalog failure is returned as `DependencyFailure`.
    pub fn list_reservations_for_user(
        &self,
        user_id: &str,
        scope: ReservationScope,
    ) -> Result<Vec<ReservationView>, ReservationError> {
        let filter = ReservationFilter::new().with_user(user_id);
        let total = self.store.count(&filter)?;
        let reservations = self.store.list(&filter.with_limit(total.max(1)))?;

        let now = self.clock.now();
        let mut flights: HashMap<String, Flight> = HashMap::new();
        let mut views = Vec::with_capacity(reservations.len());

        for reservation in reservations {
            if !flights.contains_key(&reservation.flight_id) {
                match self.catalog.get_flight(&reservation.flight_id) {
                    Ok(flight) => {
                        flights.insert(flight.id.clone(), flight);
                    }
                    Err(CatalogError::NotFound(_)) => {
                        warn!(
                            reservation_id = %reservation.id,
                            flight_id = %reservation.flight_id,
                            "Reservation refers to a flight missing from the catalog"
                        );
                        continue;
                    }
                    Err(err) => {
                        metrics::CATALOG_FAILURES
                            .with_label_values(&["get_flight"])
                            .inc();
                        return Err(err.into());
                    }
                }
            }
            let Some(flight) = flights.get(&reservation.flight_id) else {
                continue;
            };
            if scope.includes(flight.departure_at, reservation.status, now) {
                views.push(ReservationView::new(reservation, flight));
            }
        }

        views.sort_by(|a, b| {
            a.flight
                .departure_at
                .cmp(&b.flight.departure_at)
                .then(a.reservation.created_at.cmp(&b.reservation.created_at))
        });
        if scope == ReservationScope::Past {
            views.reverse();
        }

        Ok(views)
    }

    /// Flights matching the filter, in catalog order, with seat counts.
    pub fn search_flights(&self, filter: &FlightFilter) -> Result<Vec<FlightView>, ReservationError> {
        let listing = self.catalog.list_flights(filter).map_err(|err| {
            metrics::CATALOG_FAILURES
                .with_label_values(&["list_flights"])
                .inc();
            ReservationError::from(err)
        })?;

        listing
            .into_vec()
            .into_iter()
            .map(|flight| {
                let assessment = self.engine.assess_flight(flight, 1)?;
                Ok(FlightView {
                    duration: format_duration(assessment.flight.duration()),
                    bookable: assessment.is_bookable(),
                    seats: assessment.seats,
                    flight: assessment.flight,
                })
            })
            .collect()
    }

    /// One flight with seat counts. `NotFound` if it is not in the catalog.
    pub fn flight(&self, flight_id: &str) -> Result<FlightView, ReservationError> {
        let assessment = self.engine.assess(flight_id, 1)?;
        Ok(FlightView {
            duration: format_duration(assessment.flight.duration()),
            bookable: assessment.is_bookable(),
            seats: assessment.seats,
            flight: assessment.flight,
        })
    }

    pub fn engine(&self) -> &AvailabilityEngine {
        &self.engine
    }
}
