//! Reservation lifecycle manager.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::{FlightLocks, Transition, TransitionOutcome};
use crate::audit::{AuditEvent, AuditHandle};
use crate::availability::AvailabilityEngine;
use crate::clock::Clock;
use crate::config::BookingConfig;
use crate::error::ReservationError;
use crate::flight::FlightCatalog;
use crate::metrics;
use crate::reservation::{NewReservation, PaymentStatus, Reservation, ReservationStore};

/// A booking request from the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateReservation {
    pub flight_id: String,
    /// Authenticated user who will own the reservation.
    pub user_id: String,
    pub passengers: u32,
    pub notes: Option<String>,
}

/// Creates reservations and drives them through their lifecycle.
///
/// `create` holds the flight's booking lock across the availability check
/// and the insert, so concurrent bookings on one flight are serialized and
/// can never exceed its capacity.
pub struct ReservationManager {
    engine: AvailabilityEngine,
    store: Arc<dyn ReservationStore>,
    clock: Arc<dyn Clock>,
    locks: FlightLocks,
    max_notes_len: usize,
    audit: Option<AuditHandle>,
}

impl ReservationManager {
    pub fn new(
        catalog: Arc<dyn FlightCatalog>,
        store: Arc<dyn ReservationStore>,
        clock: Arc<dyn Clock>,
        booking: &BookingConfig,
    ) -> Self {
        Self {
            engine: AvailabilityEngine::new(catalog, Arc::clone(&store), Arc::clone(&clock)),
            store,
            clock,
            locks: FlightLocks::new(Duration::from_millis(booking.lock_timeout_ms)),
            max_notes_len: booking.max_notes_len,
            audit: None,
        }
    }

    /// Emit audit events for every operation.
    pub fn with_audit(mut self, audit: AuditHandle) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn engine(&self) -> &AvailabilityEngine {
        &self.engine
    }

    /// Book seats on a flight. The new reservation is PENDING/PENDING.
    pub fn create(&self, request: CreateReservation) -> Result<Reservation, ReservationError> {
        let result = self
            .validate(&request)
            .and_then(|notes| self.create_locked(&request, notes));

        match result {
            Ok(reservation) => {
                metrics::BOOKINGS_TOTAL.with_label_values(&["created"]).inc();
                metrics::SEATS_BOOKED.inc_by(u64::from(reservation.passengers));
                metrics::PASSENGERS_PER_BOOKING.observe(f64::from(reservation.passengers));

                info!(
                    reservation_id = %reservation.id,
                    flight_id = %reservation.flight_id,
                    user_id = %reservation.user_id,
                    passengers = reservation.passengers,
                    "Reservation created"
                );

                self.emit(AuditEvent::ReservationCreated {
                    reservation_id: reservation.id.clone(),
                    flight_id: reservation.flight_id.clone(),
                    user_id: reservation.user_id.clone(),
                    passengers: reservation.passengers,
                    amount_cents: reservation.amount_cents,
                });

                Ok(reservation)
            }
            Err(err) => {
                metrics::BOOKINGS_TOTAL
                    .with_label_values(&[err.kind()])
                    .inc();

                warn!(
                    flight_id = %request.flight_id,
                    user_id = %request.user_id,
                    passengers = request.passengers,
                    error = %err,
                    "Booking rejected"
                );

                self.emit(AuditEvent::BookingRejected {
                    flight_id: request.flight_id.clone(),
                    user_id: request.user_id.clone(),
                    passengers: request.passengers,
                    error_kind: err.kind().to_string(),
                    reason: err.to_string(),
                });

                Err(err)
            }
        }
    }

    /// PENDING -> CONFIRMED. Payment status is untouched.
    pub fn confirm(&self, reservation_id: &str) -> Result<Reservation, ReservationError> {
        self.transition(reservation_id, Transition::Confirm)
    }

    /// Set payment to PAID. Repeating it on a paid reservation is a no-op.
    pub fn mark_paid(&self, reservation_id: &str) -> Result<Reservation, ReservationError> {
        self.transition(reservation_id, Transition::MarkPaid)
    }

    /// Cancel and release the seats. A PAID reservation becomes REFUNDED.
    pub fn cancel(&self, reservation_id: &str) -> Result<Reservation, ReservationError> {
        self.transition(reservation_id, Transition::Cancel)
    }

    pub fn get(&self, reservation_id: &str) -> Result<Reservation, ReservationError> {
        self.store
            .get(reservation_id)?
            .ok_or_else(|| ReservationError::NotFound(format!("reservation {}", reservation_id)))
    }

    /// Returns the normalized notes.
    fn validate(&self, request: &CreateReservation) -> Result<Option<String>, ReservationError> {
        if request.passengers < 1 {
            return Err(ReservationError::InvalidRequest(
                "passengers must be at least 1".to_string(),
            ));
        }
        if request.flight_id.trim().is_empty() {
            return Err(ReservationError::InvalidRequest(
                "flight id is required".to_string(),
            ));
        }
        if request.user_id.trim().is_empty() {
            return Err(ReservationError::InvalidRequest(
                "user id is required".to_string(),
            ));
        }

        let notes = request
            .notes
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty());

        if let Some(notes) = notes {
            let len = notes.chars().count();
            if len > self.max_notes_len {
                return Err(ReservationError::InvalidRequest(format!(
                    "notes are {} characters long, the limit is {}",
                    len, self.max_notes_len
                )));
            }
        }

        Ok(notes.map(String::from))
    }

    fn create_locked(
        &self,
        request: &CreateReservation,
        notes: Option<String>,
    ) -> Result<Reservation, ReservationError> {
        let guard = match self.locks.acquire(&request.flight_id) {
            Ok(guard) => guard,
            Err(err) => {
                metrics::LOCK_WAIT
                    .with_label_values(&["timeout"])
                    .observe(self.locks.timeout().as_secs_f64());
                return Err(err);
            }
        };
        metrics::LOCK_WAIT
            .with_label_values(&["acquired"])
            .observe(guard.waited().as_secs_f64());
        debug!(
            flight_id = %guard.flight_id(),
            waited_us = guard.waited().as_micros() as u64,
            "Acquired booking lock"
        );

        let assessment = self.engine.assess(&request.flight_id, request.passengers)?;
        if let Some(blocker) = assessment.blocker {
            return Err(ReservationError::Unavailable(format!(
                "flight {}: {}",
                request.flight_id, blocker
            )));
        }

        let amount_cents = assessment
            .flight
            .price_cents
            .saturating_mul(u64::from(request.passengers));

        let reservation = self.store.insert(NewReservation {
            flight_id: request.flight_id.clone(),
            user_id: request.user_id.clone(),
            passengers: request.passengers,
            amount_cents,
            notes,
            created_at: self.clock.now(),
        })?;

        drop(guard);
        Ok(reservation)
    }

    fn transition(
        &self,
        reservation_id: &str,
        transition: Transition,
    ) -> Result<Reservation, ReservationError> {
        let operation = transition.as_str();

        match self
            .store
            .apply_transition(reservation_id, transition, self.clock.now())
        {
            Ok(outcome) => {
                let result = if outcome.changed { "applied" } else { "noop" };
                metrics::TRANSITIONS_TOTAL
                    .with_label_values(&[operation, result])
                    .inc();

                if outcome.changed {
                    info!(
                        reservation_id = %reservation_id,
                        operation,
                        status = outcome.reservation.status.as_str(),
                        payment_status = outcome.reservation.payment_status.as_str(),
                        "Reservation updated"
                    );
                } else {
                    debug!(reservation_id = %reservation_id, operation, "Transition was a no-op");
                }

                self.audit_transition(transition, &outcome);
                Ok(outcome.reservation)
            }
            Err(err) => {
                let result = match err {
                    ReservationError::InvalidTransition { .. } | ReservationError::NotFound(_) => {
                        "rejected"
                    }
                    _ => "error",
                };
                metrics::TRANSITIONS_TOTAL
                    .with_label_values(&[operation, result])
                    .inc();
                warn!(reservation_id = %reservation_id, operation, error = %err, "Transition failed");
                Err(err)
            }
        }
    }

    fn audit_transition(&self, transition: Transition, outcome: &TransitionOutcome) {
        let r = &outcome.reservation;
        let event = match transition {
            Transition::Confirm => AuditEvent::ReservationConfirmed {
                reservation_id: r.id.clone(),
                flight_id: r.flight_id.clone(),
                user_id: r.user_id.clone(),
            },
            Transition::MarkPaid => AuditEvent::PaymentMarked {
                reservation_id: r.id.clone(),
                flight_id: r.flight_id.clone(),
                user_id: r.user_id.clone(),
                previous_payment_status: outcome.previous_payment_status.as_str().to_string(),
                changed: outcome.changed,
            },
            Transition::Cancel => {
                metrics::SEATS_RELEASED.inc_by(u64::from(r.passengers));
                AuditEvent::ReservationCancelled {
                    reservation_id: r.id.clone(),
                    flight_id: r.flight_id.clone(),
                    user_id: r.user_id.clone(),
                    previous_status: outcome.previous_status.as_str().to_string(),
                    seats_released: r.passengers,
                    refunded: outcome.previous_payment_status == PaymentStatus::Paid,
                }
            }
        };
        self.emit(event);
    }

    fn emit(&self, event: AuditEvent) {
        if let Some(ref audit) = self.audit {
            audit.try_emit(event);
        }
    }
}
