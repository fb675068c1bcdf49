//! Errors returned by reservation operations.

use thiserror::Error;

use crate::flight::CatalogError;

/// Failure of a lifecycle, availability or query operation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReservationError {
    /// A referenced flight or reservation does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed input.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Not enough seats, or the flight is not bookable.
    #[error("Unavailable: {0}")]
    Unavailable(String),

    /// The operation is not permitted from the reservation's current state.
    #[error("Cannot {operation} reservation {reservation_id}: current status is {current_status}")]
    InvalidTransition {
        reservation_id: String,
        current_status: String,
        operation: String,
    },

    /// An external collaborator failed or timed out.
    #[error("Dependency failure: {0}")]
    DependencyFailure(String),

    /// The reservation store itself failed.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl ReservationError {
    /// Short machine-readable kind, used for metric labels and audit records.
    pub fn kind(&self) -> &'static str {
        match self {
            ReservationError::NotFound(_) => "not_found",
            ReservationError::InvalidRequest(_) => "invalid_request",
            ReservationError::Unavailable(_) => "unavailable",
            ReservationError::InvalidTransition { .. } => "invalid_transition",
            ReservationError::DependencyFailure(_) => "dependency_failure",
            ReservationError::Storage(_) => "storage",
        }
    }
}

impl From<CatalogError> for ReservationError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound(id) => ReservationError::NotFound(format!("flight {}", id)),
            other => ReservationError::DependencyFailure(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_not_found_maps_to_not_found() {
        let err: ReservationError = CatalogError::NotFound("F9".to_string()).into();
        assert_eq!(err, ReservationError::NotFound("flight F9".to_string()));
    }

    #[test]
    fn test_other_catalog_errors_are_dependency_failures() {
        for err in [
            CatalogError::Database("disk I/O error".to_string()),
            CatalogError::Unavailable("timeout".to_string()),
            CatalogError::InvalidFlight("bad".to_string()),
        ] {
            let mapped: ReservationError = err.into();
            assert_eq!(mapped.kind(), "dependency_failure");
        }
    }

    #[test]
    fn test_invalid_transition_message() {
        let err = ReservationError::InvalidTransition {
            reservation_id: "r1".to_string(),
            current_status: "CANCELLED".to_string(),
            operation: "confirm".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Cannot confirm reservation r1: current status is CANCELLED"
        );
    }
}
