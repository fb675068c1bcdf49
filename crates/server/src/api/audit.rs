//! Audit trail query endpoint.
//!
//! Callers only ever see events of their own reservations and bookings.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use hangar_core::audit::{AuditFilter, AuditRecord};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::middleware::AuthUser;
use super::ApiError;
use crate::state::AppState;

const MAX_LIMIT: i64 = 1000;
const DEFAULT_LIMIT: i64 = 100;

/// Query parameters for `GET /audit`
#[derive(Debug, Default, Deserialize)]
pub struct AuditQueryParams {
    pub reservation_id: Option<String>,
    /// Everything that happened on one flight, rejected bookings included
    pub flight_id: Option<String>,
    /// E.g. `reservation_created`, `booking_rejected`
    pub event_type: Option<String>,
    /// Must be the caller when given
    pub user_id: Option<String>,
    /// Events at or after this timestamp (ISO 8601)
    pub from: Option<DateTime<Utc>>,
    /// Events at or before this timestamp (ISO 8601)
    pub to: Option<DateTime<Utc>>,
    /// Default 100, max 1000
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl AuditQueryParams {
    /// Filter without paging, shared by the query and the total count.
    ///
    /// Always restricted to `caller`; asking for another user is refused.
    fn to_filter(&self, caller: &str) -> Result<AuditFilter, ApiError> {
        if let Some(ref requested) = self.user_id {
            if requested != caller {
                return Err(ApiError::Forbidden(
                    "Audit events of other users are not visible".to_string(),
                ));
            }
        }

        Ok(AuditFilter {
            reservation_id: self.reservation_id.clone(),
            flight_id: self.flight_id.clone(),
            event_type: self.event_type.clone(),
            user_id: Some(caller.to_string()),
            from: self.from,
            to: self.to,
            ..AuditFilter::new()
        })
    }

    fn page(&self) -> (i64, i64) {
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let offset = self.offset.unwrap_or(0).max(0);
        (limit, offset)
    }
}

#[derive(Debug, Serialize)]
pub struct AuditQueryResponse {
    /// Newest first
    pub events: Vec<AuditRecord>,
    /// Matching events ignoring limit and offset
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

pub async fn query_audit(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    params: Result<Query<AuditQueryParams>, QueryRejection>,
) -> Result<Json<AuditQueryResponse>, ApiError> {
    let Query(params) = params?;
    let filter = params.to_filter(&user_id)?;

    if let Some(ref reservation_id) = params.reservation_id {
        let reservation = state.manager().get(reservation_id)?;
        if !reservation.is_owned_by(&user_id) {
            return Err(ApiError::Forbidden(format!(
                "Reservation {} belongs to another user",
                reservation_id
            )));
        }
    }

    let (limit, offset) = params.page();

    let events = state
        .audit_store()
        .query(&filter.clone().with_limit(limit).with_offset(offset))
        .map_err(|e| ApiError::Internal(format!("Failed to query audit events: {}", e)))?;

    let total = state
        .audit_store()
        .count(&filter)
        .map_err(|e| ApiError::Internal(format!("Failed to count audit events: {}", e)))?;

    Ok(Json(AuditQueryResponse {
        events,
        total,
        limit,
        offset,
    }))
}
