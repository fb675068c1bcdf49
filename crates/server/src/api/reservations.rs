//! Reservation API handlers.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use hangar_core::audit::AuditRecord;
use hangar_core::query::{ReservationScope, ReservationView};
use hangar_core::{CreateReservation, Reservation, ReservationError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::middleware::AuthUser;
use super::ApiError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for booking seats
#[derive(Debug, Deserialize)]
pub struct CreateReservationBody {
    pub flight_id: String,
    pub passengers: u32,
    /// Free text for the club, e.g. passenger weights
    pub notes: Option<String>,
}

/// Query parameters for listing the caller's reservations
#[derive(Debug, Deserialize)]
pub struct ListReservationsParams {
    /// upcoming (default), past or all
    pub scope: Option<String>,
}

/// Response for listing reservations
#[derive(Debug, Serialize)]
pub struct ListReservationsResponse {
    pub reservations: Vec<ReservationView>,
    pub scope: ReservationScope,
    pub total: usize,
}

/// Audit trail of a single reservation
#[derive(Debug, Serialize)]
pub struct ReservationHistoryResponse {
    pub reservation_id: String,
    /// Oldest first
    pub events: Vec<AuditRecord>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Book seats on a flight for the authenticated user
pub async fn create_reservation(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    body: Result<Json<CreateReservationBody>, JsonRejection>,
) -> Result<(StatusCode, Json<Reservation>), ApiError> {
    let Json(body) = body?;
    let request = CreateReservation {
        flight_id: body.flight_id,
        user_id,
        passengers: body.passengers,
        notes: body.notes,
    };

    // Booking may wait on the flight's lock; keep it off the async workers.
    let manager = Arc::clone(state.manager());
    let reservation = tokio::task::spawn_blocking(move || manager.create(request))
        .await
        .map_err(|e| ApiError::Internal(format!("Booking task failed: {}", e)))??;

    Ok((StatusCode::CREATED, Json(reservation)))
}

/// List the authenticated user's reservations
pub async fn list_reservations(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    params: Result<Query<ListReservationsParams>, QueryRejection>,
) -> Result<Json<ListReservationsResponse>, ApiError> {
    let Query(params) = params?;
    let scope = match params.scope.as_deref() {
        None => ReservationScope::default(),
        Some(raw) => ReservationScope::parse(raw).ok_or_else(|| {
            ApiError::BadRequest(format!(
                "Invalid scope '{}', expected upcoming, past or all",
                raw
            ))
        })?,
    };

    let reservations = state
        .query()
        .list_reservations_for_user(&user_id, scope)?;

    Ok(Json(ListReservationsResponse {
        total: reservations.len(),
        reservations,
        scope,
    }))
}

/// Get one of the authenticated user's reservations
pub async fn get_reservation(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ReservationView>, ApiError> {
    let reservation = state.manager().get(&id)?;
    ensure_owner(&reservation, &user_id)?;

    let flight = state
        .catalog()
        .get_flight(&reservation.flight_id)
        .map_err(ReservationError::from)?;

    Ok(Json(ReservationView::new(reservation, &flight)))
}

/// Confirm a pending reservation. Club staff only (`auth.staff_users`).
pub async fn confirm_reservation(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Reservation>, ApiError> {
    ensure_staff(&state, &user_id, "confirm reservations")?;
    Ok(Json(state.manager().confirm(&id)?))
}

/// Record that a reservation has been paid at the club. Staff only, since
/// payment is collected out of band.
pub async fn mark_paid(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Reservation>, ApiError> {
    ensure_staff(&state, &user_id, "record payments")?;
    Ok(Json(state.manager().mark_paid(&id)?))
}

/// Cancel one of the authenticated user's reservations
pub async fn cancel_reservation(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Reservation>, ApiError> {
    let reservation = state.manager().get(&id)?;
    ensure_owner(&reservation, &user_id)?;

    Ok(Json(state.manager().cancel(&id)?))
}

/// Lifecycle events recorded for one of the authenticated user's reservations
pub async fn reservation_history(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ReservationHistoryResponse>, ApiError> {
    let reservation = state.manager().get(&id)?;
    ensure_owner(&reservation, &user_id)?;

    let events = state
        .audit_store()
        .reservation_history(&reservation.id)
        .map_err(|e| ApiError::Internal(format!("Failed to load reservation history: {}", e)))?;

    Ok(Json(ReservationHistoryResponse {
        reservation_id: reservation.id,
        events,
    }))
}

fn ensure_staff(state: &AppState, user_id: &str, action: &str) -> Result<(), ApiError> {
    if state.is_staff(user_id) {
        Ok(())
    } else {
        Err(ApiError::Forbidden(format!("Only club staff may {}", action)))
    }
}

fn ensure_owner(reservation: &Reservation, user_id: &str) -> Result<(), ApiError> {
    if reservation.is_owned_by(user_id) {
        Ok(())
    } else {
        Err(ApiError::Forbidden(format!(
            "Reservation {} belongs to another user",
            reservation.id
        )))
    }
}
