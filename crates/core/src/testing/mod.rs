//! Test doubles and fixtures.
//!
//! Used by the unit tests in this crate and by the server's integration
//! tests, which swap the SQLite catalog for [`MockFlightCatalog`].
//!
//! # Example
//!
//! ```rust,ignore
//! use hangar_core::testing::{fixtures, FixedClock, MockFlightCatalog};
//!
//! let catalog = MockFlightCatalog::new();
//! catalog.add_flight(fixtures::flight("F1", 3, fixtures::now() + Duration::days(1)));
//!
//! // Simulate the flight service going away
//! catalog.fail_with("connection refused");
//! ```

mod mock_flight_catalog;

pub use crate::clock::FixedClock;
pub use mock_flight_catalog::MockFlightCatalog;

/// Test fixtures and helper functions.
pub mod fixtures {
    use chrono::{DateTime, Duration, TimeZone, Utc};

    use crate::flight::{Aircraft, Flight, FlightStatus, FlightType};

    /// Price per seat of [`flight`].
    pub const PRICE_CENTS: u64 = 15_000;

    /// The fixed "now" used across tests.
    pub fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 6, 1, 9, 0, 0)
            .single()
            .unwrap_or_else(Utc::now)
    }

    /// A scheduled 90 minute scenic flight.
    pub fn flight(id: &str, capacity: u32, departure_at: DateTime<Utc>) -> Flight {
        Flight {
            id: id.to_string(),
            aircraft: Aircraft::new("SX-ABC", "Cessna 172"),
            departure_at,
            estimated_return_at: departure_at + Duration::minutes(90),
            flight_type: FlightType::Scenic,
            capacity,
            price_cents: PRICE_CENTS,
            description: format!("Scenic flight {}", id),
            status: FlightStatus::Scheduled,
        }
    }

    /// Like [`flight`] with a different type and aircraft.
    pub fn training_flight(id: &str, departure_at: DateTime<Utc>) -> Flight {
        Flight {
            aircraft: Aircraft::new("SX-PPL", "Piper PA-28"),
            flight_type: FlightType::Training,
            capacity: 1,
            description: "Circuit training".to_string(),
            ..flight(id, 1, departure_at)
        }
    }
}
