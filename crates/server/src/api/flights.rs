//! Flight catalog API handlers.

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use hangar_core::flight::{FlightFilter, FlightType};
use hangar_core::query::FlightView;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::ApiError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for listing flights
#[derive(Debug, Deserialize)]
pub struct ListFlightsParams {
    /// Free text over aircraft model, registration and description
    pub q: Option<String>,
    /// Departure date (UTC), `YYYY-MM-DD`
    pub date: Option<String>,
    /// SCENIC, TRAINING or CHARTER
    #[serde(rename = "type")]
    pub flight_type: Option<String>,
}

impl ListFlightsParams {
    fn to_filter(&self) -> Result<FlightFilter, ApiError> {
        let mut filter = FlightFilter::new();

        if let Some(ref q) = self.q {
            filter = filter.with_text(q.clone());
        }

        if let Some(ref date) = self.date {
            let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| {
                ApiError::BadRequest(format!("Invalid date '{}', expected YYYY-MM-DD", date))
            })?;
            filter = filter.with_date(date);
        }

        if let Some(ref flight_type) = self.flight_type {
            let parsed = FlightType::parse(flight_type).ok_or_else(|| {
                ApiError::BadRequest(format!(
                    "Invalid flight type '{}', expected SCENIC, TRAINING or CHARTER",
                    flight_type
                ))
            })?;
            filter = filter.with_type(parsed);
        }

        Ok(filter)
    }
}

/// Response for listing flights
#[derive(Debug, Serialize)]
pub struct ListFlightsResponse {
    pub flights: Vec<FlightView>,
    pub total: usize,
}

/// Query parameters for the availability check
#[derive(Debug, Deserialize)]
pub struct AvailabilityParams {
    /// Seats wanted (default 1)
    pub passengers: Option<u32>,
}

/// Response for the availability check
#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub flight_id: String,
    pub passengers: u32,
    pub capacity: u32,
    pub committed: u32,
    pub available: u32,
    pub can_book: bool,
    /// Why the booking would be refused
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// List flights matching the filter
pub async fn list_flights(
    State(state): State<Arc<AppState>>,
    params: Result<Query<ListFlightsParams>, QueryRejection>,
) -> Result<Json<ListFlightsResponse>, ApiError> {
    let Query(params) = params?;
    let filter = params.to_filter()?;
    let flights = state.query().search_flights(&filter)?;

    Ok(Json(ListFlightsResponse {
        total: flights.len(),
        flights,
    }))
}

/// Get a single flight
pub async fn get_flight(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<FlightView>, ApiError> {
    Ok(Json(state.query().flight(&id)?))
}

/// Check whether a number of seats could be booked right now
pub async fn get_availability(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    params: Result<Query<AvailabilityParams>, QueryRejection>,
) -> Result<Json<AvailabilityResponse>, ApiError> {
    let Query(params) = params?;
    let passengers = params.passengers.unwrap_or(1);
    let assessment = state.query().engine().assess(&id, passengers)?;

    Ok(Json(AvailabilityResponse {
        flight_id: assessment.flight.id.clone(),
        passengers,
        capacity: assessment.seats.capacity,
        committed: assessment.seats.committed,
        available: assessment.seats.available,
        can_book: assessment.is_bookable(),
        reason: assessment.blocker.map(|b| b.to_string()),
    }))
}
