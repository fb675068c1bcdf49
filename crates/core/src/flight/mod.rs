//! Flight catalog.
//!
//! Flights are owned by the external flight-management system. The
//! reservation core only reads them through [`FlightCatalog`].

mod seed;
mod sqlite;
mod types;

pub use seed::{load_flight_seed, parse_flight_seed, FlightSeed};
pub use sqlite::SqliteFlightCatalog;
pub use types::*;

/// Read access to the set of schedulable flights.
pub trait FlightCatalog: Send + Sync {
    /// List flights matching the filter, in catalog order.
    fn list_flights(&self, filter: &FlightFilter) -> Result<FlightListing, CatalogError>;

    /// Get a flight by ID. Fails with `CatalogError::NotFound` when absent.
    fn get_flight(&self, id: &str) -> Result<Flight, CatalogError>;
}
