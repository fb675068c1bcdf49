//! Flight catalog data types.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kind of flight offered by the club.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlightType {
    Scenic,
    Training,
    Charter,
}

impl FlightType {
    /// Returns the type as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            FlightType::Scenic => "SCENIC",
            FlightType::Training => "TRAINING",
            FlightType::Charter => "CHARTER",
        }
    }

    /// Parse a stored or user-supplied type name (case-insensitive).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "SCENIC" => Some(FlightType::Scenic),
            "TRAINING" => Some(FlightType::Training),
            "CHARTER" => Some(FlightType::Charter),
            _ => None,
        }
    }
}

/// Operational status of a flight, owned by flight management.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlightStatus {
    Scheduled,
    Cancelled,
    Completed,
}

impl FlightStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlightStatus::Scheduled => "SCHEDULED",
            FlightStatus::Cancelled => "CANCELLED",
            FlightStatus::Completed => "COMPLETED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "SCHEDULED" => Some(FlightStatus::Scheduled),
            "CANCELLED" => Some(FlightStatus::Cancelled),
            "COMPLETED" => Some(FlightStatus::Completed),
            _ => None,
        }
    }
}

/// Aircraft flying a given flight.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Aircraft {
    /// Registration mark (e.g. "SX-ABC").
    pub registration: String,
    /// Model name (e.g. "Cessna 172").
    pub model: String,
}

impl Aircraft {
    pub fn new(registration: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            registration: registration.into(),
            model: model.into(),
        }
    }
}

/// A scheduled aircraft trip available for booking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Flight {
    pub id: String,
    pub aircraft: Aircraft,
    pub departure_at: DateTime<Utc>,
    pub estimated_return_at: DateTime<Utc>,
    pub flight_type: FlightType,
    /// Total passenger seats.
    pub capacity: u32,
    /// Price per passenger in cents.
    pub price_cents: u64,
    #[serde(default)]
    pub description: String,
    pub status: FlightStatus,
}

impl Flight {
    /// Planned time in the air.
    pub fn duration(&self) -> Duration {
        self.estimated_return_at - self.departure_at
    }

    /// UTC calendar date of departure.
    pub fn departure_date(&self) -> NaiveDate {
        self.departure_at.date_naive()
    }

    /// Check the invariants flight management must uphold.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.id.trim().is_empty() {
            return Err(CatalogError::InvalidFlight("flight id is empty".to_string()));
        }
        if self.departure_at >= self.estimated_return_at {
            return Err(CatalogError::InvalidFlight(format!(
                "flight {}: departure must precede estimated return",
                self.id
            )));
        }
        if self.capacity == 0 {
            return Err(CatalogError::InvalidFlight(format!(
                "flight {}: capacity must be at least 1",
                self.id
            )));
        }
        Ok(())
    }

    fn matches_text(&self, needle: &str) -> bool {
        self.aircraft.model.to_lowercase().contains(needle)
            || self.aircraft.registration.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
    }
}

/// Filter for catalog listings. Unset fields impose no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlightFilter {
    /// Case-insensitive substring over model, registration and description.
    pub text: Option<String>,
    /// Exact departure date (UTC).
    pub date: Option<NaiveDate>,
    pub flight_type: Option<FlightType>,
}

impl FlightFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn with_type(mut self, flight_type: FlightType) -> Self {
        self.flight_type = Some(flight_type);
        self
    }

    /// Returns true if the flight satisfies every set constraint.
    pub fn matches(&self, flight: &Flight) -> bool {
        if let Some(ref text) = self.text {
            let needle = text.trim().to_lowercase();
            if !needle.is_empty() && !flight.matches_text(&needle) {
                return false;
            }
        }

        if let Some(date) = self.date {
            if flight.departure_date() != date {
                return false;
            }
        }

        if let Some(flight_type) = self.flight_type {
            if flight.flight_type != flight_type {
                return false;
            }
        }

        true
    }
}

/// Snapshot of the catalog paired with a filter.
///
/// Iteration applies the filter lazily and may be repeated; the snapshot
/// is finite and keeps catalog order.
#[derive(Debug, Clone)]
pub struct FlightListing {
    flights: Vec<Flight>,
    filter: FlightFilter,
}

impl FlightListing {
    pub fn new(flights: Vec<Flight>, filter: FlightFilter) -> Self {
        Self { flights, filter }
    }

    pub fn filter(&self) -> &FlightFilter {
        &self.filter
    }

    /// Iterate the matching flights in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &Flight> + Clone + '_ {
        self.flights.iter().filter(move |f| self.filter.matches(f))
    }

    /// Collect the matching flights.
    pub fn into_vec(self) -> Vec<Flight> {
        let filter = self.filter;
        self.flights
            .into_iter()
            .filter(|f| filter.matches(f))
            .collect()
    }
}

impl<'a> IntoIterator for &'a FlightListing {
    type Item = &'a Flight;
    type IntoIter = Box<dyn Iterator<Item = &'a Flight> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

/// Errors surfaced by a flight catalog.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Flight not found: {0}")]
    NotFound(String),

    #[error("Invalid flight: {0}")]
    InvalidFlight(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Catalog unavailable: {0}")]
    Unavailable(String),
}
