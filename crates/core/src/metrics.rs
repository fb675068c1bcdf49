//! Prometheus metrics for the reservation core.
//!
//! This module provides metrics for:
//! - Booking attempts and why they were rejected
//! - Lifecycle transitions
//! - Contention on per-flight booking locks
//! - Flight catalog lookups

use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Bookings
// =============================================================================

/// Booking attempts by result.
pub static BOOKINGS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("hangar_bookings_total", "Total booking attempts"),
        &["result"], // "created", "unavailable", "invalid_request", "not_found", ...
    )
    .unwrap()
});

/// Seats taken by successful bookings.
pub static SEATS_BOOKED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("hangar_seats_booked_total", "Total seats booked").unwrap()
});

/// Passengers per successful booking.
pub static PASSENGERS_PER_BOOKING: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "hangar_passengers_per_booking",
            "Number of passengers per reservation",
        )
        .buckets(vec![1.0, 2.0, 3.0, 4.0, 6.0, 8.0, 12.0]),
    )
    .unwrap()
});

// =============================================================================
// Lifecycle
// =============================================================================

/// Lifecycle transitions by operation and result.
pub static TRANSITIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "hangar_reservation_transitions_total",
            "Total reservation lifecycle transitions",
        ),
        &["operation", "result"], // result: "applied", "noop", "rejected", "error"
    )
    .unwrap()
});

/// Seats released by cancellations.
pub static SEATS_RELEASED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "hangar_seats_released_total",
        "Total seats released by cancellations",
    )
    .unwrap()
});

// =============================================================================
// Concurrency
// =============================================================================

/// Time spent waiting for a flight's booking lock.
pub static LOCK_WAIT: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "hangar_booking_lock_wait_seconds",
            "Time spent waiting for a per-flight booking lock",
        )
        .buckets(vec![0.0001, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
        &["result"], // "acquired", "timeout"
    )
    .unwrap()
});

// =============================================================================
// Catalog
// =============================================================================

/// Catalog lookups that failed for reasons other than a missing flight.
pub static CATALOG_FAILURES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "hangar_catalog_failures_total",
            "Flight catalog calls that failed",
        ),
        &["operation"],
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(BOOKINGS_TOTAL.clone()),
        Box::new(SEATS_BOOKED.clone()),
        Box::new(PASSENGERS_PER_BOOKING.clone()),
        Box::new(TRANSITIONS_TOTAL.clone()),
        Box::new(SEATS_RELEASED.clone()),
        Box::new(LOCK_WAIT.clone()),
        Box::new(CATALOG_FAILURES.clone()),
    ]
}
