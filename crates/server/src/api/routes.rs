use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::middleware::{auth_middleware, metrics_middleware};
use super::{audit, flights, handlers, reservations};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Open routes
    let public_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config));

    // Routes that need an identity
    let user_routes = Router::new()
        // Audit
        .route("/audit", get(audit::query_audit))
        // Flights (read-only catalog with live seat counts)
        .route("/flights", get(flights::list_flights))
        .route("/flights/{id}", get(flights::get_flight))
        .route("/flights/{id}/availability", get(flights::get_availability))
        // Reservations
        .route("/reservations", post(reservations::create_reservation))
        .route("/reservations", get(reservations::list_reservations))
        .route("/reservations/{id}", get(reservations::get_reservation))
        .route(
            "/reservations/{id}/history",
            get(reservations::reservation_history),
        )
        .route(
            "/reservations/{id}/confirm",
            post(reservations::confirm_reservation),
        )
        .route("/reservations/{id}/pay", post(reservations::mark_paid))
        .route(
            "/reservations/{id}/cancel",
            post(reservations::cancel_reservation),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .nest("/api/v1", public_routes.merge(user_routes))
        .route("/metrics", get(handlers::metrics))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
