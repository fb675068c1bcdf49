//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the hangar server:
//! - HTTP request metrics (latency, counts, errors)
//! - Authentication failures
//! - Reservations and flights (collected on scrape)
//!
//! Booking and lifecycle metrics live in `hangar_core::metrics` and are
//! registered here as well.

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, IntGaugeVec, Opts,
    Registry, TextEncoder,
};
use tracing::warn;

use hangar_core::flight::{FlightFilter, FlightStatus};
use hangar_core::reservation::ReservationFilter;
use hangar_core::ReservationStatus;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "hangar_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("hangar_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "hangar_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

/// Authentication failures.
pub static AUTH_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("hangar_auth_failures_total", "Total authentication failures"),
        &["reason"],
    )
    .unwrap()
});

// =============================================================================
// Reservation Metrics (collected dynamically)
// =============================================================================

/// Reservations by current status.
pub static RESERVATIONS_BY_STATUS: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new(
            "hangar_reservations_by_status",
            "Current reservation count by status",
        ),
        &["status"],
    )
    .unwrap()
});

/// Flights in the catalog by status.
pub static FLIGHTS_BY_STATUS: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new("hangar_flights_by_status", "Catalog flights by status"),
        &["status"],
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();
    registry
        .register(Box::new(AUTH_FAILURES_TOTAL.clone()))
        .unwrap();

    // Reservations and flights
    registry
        .register(Box::new(RESERVATIONS_BY_STATUS.clone()))
        .unwrap();
    registry
        .register(Box::new(FLIGHTS_BY_STATUS.clone()))
        .unwrap();

    // Core metrics (bookings, transitions, lock contention)
    for metric in hangar_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        warn!("Failed to encode metrics: {}", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Collect dynamic metrics from current application state.
///
/// Called before encoding so the gauges reflect the stores at scrape time.
pub fn collect_dynamic_metrics(state: &crate::state::AppState) {
    for status in ReservationStatus::ALL {
        let filter = ReservationFilter::new().with_status(status);
        if let Ok(count) = state.reservations().count(&filter) {
            RESERVATIONS_BY_STATUS
                .with_label_values(&[status.as_str()])
                .set(count);
        }
    }

    if let Ok(listing) = state.catalog().list_flights(&FlightFilter::new()) {
        for status in [
            FlightStatus::Scheduled,
            FlightStatus::Cancelled,
            FlightStatus::Completed,
        ] {
            let count = listing.iter().filter(|f| f.status == status).count();
            FLIGHTS_BY_STATUS
                .with_label_values(&[status.as_str()])
                .set(count as i64);
        }
    }
}

/// Normalize a path for metric labels.
///
/// The segment after `flights` or `reservations` is an identifier and is
/// replaced with `{id}`.
pub fn normalize_path(path: &str) -> String {
    let mut previous = "";
    path.split('/')
        .map(|segment| {
            let normalized = match previous {
                "flights" | "reservations" if !segment.is_empty() => "{id}",
                _ => segment,
            };
            previous = segment;
            normalized
        })
        .collect::<Vec<_>>()
        .join("/")
}
