//! Reservation state machine.
//!
//! | from \ op            | confirm    | mark_paid        | cancel                  |
//! |----------------------|------------|------------------|-------------------------|
//! | PENDING              | CONFIRMED  | payment PAID     | CANCELLED               |
//! | CONFIRMED            | rejected   | payment PAID     | CANCELLED               |
//! | CANCELLED            | rejected   | rejected         | rejected                |
//!
//! Cancelling a PAID reservation moves payment to REFUNDED. Marking an
//! already PAID reservation is a no-op.

use serde::{Deserialize, Serialize};

use crate::error::ReservationError;
use crate::reservation::{PaymentStatus, Reservation, ReservationStatus};

/// A lifecycle operation on an existing reservation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    Confirm,
    MarkPaid,
    Cancel,
}

impl Transition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Transition::Confirm => "confirm",
            Transition::MarkPaid => "mark_paid",
            Transition::Cancel => "cancel",
        }
    }

    /// Compute the statuses after this transition, or reject it.
    pub fn evaluate(
        &self,
        reservation: &Reservation,
    ) -> Result<TransitionEffect, ReservationError> {
        let status = reservation.status;
        let payment = reservation.payment_status;

        let (next_status, next_payment) = match (self, status) {
            (_, ReservationStatus::Cancelled) => return Err(self.rejected(reservation)),
            (Transition::Confirm, ReservationStatus::Pending) => {
                (ReservationStatus::Confirmed, payment)
            }
            (Transition::Confirm, ReservationStatus::Confirmed) => {
                return Err(self.rejected(reservation))
            }
            (Transition::MarkPaid, _) => (status, PaymentStatus::Paid),
            (Transition::Cancel, _) => {
                let payment = match payment {
                    PaymentStatus::Paid => PaymentStatus::Refunded,
                    other => other,
                };
                (ReservationStatus::Cancelled, payment)
            }
        };

        Ok(TransitionEffect {
            status: next_status,
            payment_status: next_payment,
            changed: next_status != status || next_payment != payment,
        })
    }

    fn rejected(&self, reservation: &Reservation) -> ReservationError {
        ReservationError::InvalidTransition {
            reservation_id: reservation.id.clone(),
            current_status: reservation.status.as_str().to_string(),
            operation: self.as_str().to_string(),
        }
    }
}

/// Statuses produced by an accepted transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionEffect {
    pub status: ReservationStatus,
    pub payment_status: PaymentStatus,
    /// False when the transition was an idempotent no-op.
    pub changed: bool,
}

/// Result of applying a transition to a stored reservation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionOutcome {
    /// The reservation after the transition.
    pub reservation: Reservation,
    pub previous_status: ReservationStatus,
    pub previous_payment_status: PaymentStatus,
    pub changed: bool,
}
