//! Flight seed files.
//!
//! A seed file is TOML with one `[[flights]]` table per flight. Timestamps are
//! quoted RFC 3339 strings:
//!
//! ```toml
//! [[flights]]
//! id = "F1"
//! departure_at = "2030-07-15T10:00:00Z"
//! estimated_return_at = "2030-07-15T12:30:00Z"
//! flight_type = "SCENIC"
//! capacity = 3
//! price_cents = 12000
//! description = "Sunset over the bay"
//! status = "SCHEDULED"
//! aircraft = { registration = "SX-ABC", model = "Cessna 172" }
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use super::{CatalogError, Flight};

/// Parsed contents of a seed file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FlightSeed {
    #[serde(default)]
    pub flights: Vec<Flight>,
}

/// Parse seed TOML, validating every flight and rejecting duplicate ids.
pub fn parse_flight_seed(content: &str) -> Result<FlightSeed, CatalogError> {
    let seed: FlightSeed =
        toml::from_str(content).map_err(|e| CatalogError::InvalidFlight(e.to_string()))?;

    let mut seen = HashSet::new();
    for flight in &seed.flights {
        flight.validate()?;
        if !seen.insert(flight.id.as_str()) {
            return Err(CatalogError::InvalidFlight(format!(
                "duplicate flight id in seed: {}",
                flight.id
            )));
        }
    }

    Ok(seed)
}

/// Read and parse a seed file.
pub fn load_flight_seed(path: &Path) -> Result<FlightSeed, CatalogError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        CatalogError::Unavailable(format!("failed to read {}: {}", path.display(), e))
    })?;
    parse_flight_seed(&content)
}
