//! In-memory flight catalog.

use std::sync::RwLock;

use crate::flight::{CatalogError, Flight, FlightCatalog, FlightFilter, FlightListing, FlightStatus};

/// Mock implementation of the FlightCatalog trait.
///
/// Provides controllable behavior for testing:
/// - Flights kept in insertion order
/// - Status changes after the fact
/// - Simulated outages
#[derive(Debug, Default)]
pub struct MockFlightCatalog {
    flights: RwLock<Vec<Flight>>,
    /// While set, every call fails with `CatalogError::Unavailable`.
    failure: RwLock<Option<String>>,
}

impl MockFlightCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a catalog holding the given flights.
    pub fn with_flights(flights: Vec<Flight>) -> Self {
        Self {
            flights: RwLock::new(flights),
            failure: RwLock::new(None),
        }
    }

    /// Add a flight, replacing one with the same id in place.
    pub fn add_flight(&self, flight: Flight) {
        let mut flights = self.flights.write().unwrap();
        match flights.iter_mut().find(|f| f.id == flight.id) {
            Some(existing) => *existing = flight,
            None => flights.push(flight),
        }
    }

    pub fn set_status(&self, id: &str, status: FlightStatus) {
        let mut flights = self.flights.write().unwrap();
        if let Some(flight) = flights.iter_mut().find(|f| f.id == id) {
            flight.status = status;
        }
    }

    pub fn remove_flight(&self, id: &str) {
        self.flights.write().unwrap().retain(|f| f.id != id);
    }

    pub fn fail_with(&self, message: &str) {
        *self.failure.write().unwrap() = Some(message.to_string());
    }

    pub fn clear_failure(&self) {
        *self.failure.write().unwrap() = None;
    }

    fn check_failure(&self) -> Result<(), CatalogError> {
        match self.failure.read().unwrap().as_ref() {
            Some(message) => Err(CatalogError::Unavailable(message.clone())),
            None => Ok(()),
        }
    }
}

impl FlightCatalog for MockFlightCatalog {
    fn list_flights(&self, filter: &FlightFilter) -> Result<FlightListing, CatalogError> {
        self.check_failure()?;
        let flights = self.flights.read().unwrap().clone();
        Ok(FlightListing::new(flights, filter.clone()))
    }

    fn get_flight(&self, id: &str) -> Result<Flight, CatalogError> {
        self.check_failure()?;
        self.flights
            .read()
            .unwrap()
            .iter()
            .find(|f| f.id == id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[test]
    fn test_add_replaces_in_place() {
        let catalog = MockFlightCatalog::new();
        catalog.add_flight(fixtures::flight("a", 2, fixtures::now()));
        catalog.add_flight(fixtures::flight("b", 2, fixtures::now()));
        catalog.add_flight(fixtures::flight("a", 5, fixtures::now()));

        let ids: Vec<String> = catalog
            .list_flights(&FlightFilter::new())
            .unwrap()
            .into_vec()
            .into_iter()
            .map(|f| f.id)
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(catalog.get_flight("a").unwrap().capacity, 5);
    }

    #[test]
    fn test_failure_toggle() {
        let catalog = MockFlightCatalog::new();
        catalog.add_flight(fixtures::flight("a", 2, fixtures::now()));

        catalog.fail_with("down");
        assert_eq!(
            catalog.get_flight("a"),
            Err(CatalogError::Unavailable("down".to_string()))
        );

        catalog.clear_failure();
        assert!(catalog.get_flight("a").is_ok());
        catalog.remove_flight("a");
        assert!(matches!(catalog.get_flight("a"), Err(CatalogError::NotFound(_))));
    }
}
