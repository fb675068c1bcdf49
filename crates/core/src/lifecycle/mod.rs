//! Reservation lifecycle: the state machine, per-flight booking locks and
//! the manager that ties them to the store.

mod locks;
mod manager;
mod transition;

pub use locks::{FlightGuard, FlightLocks};
pub use manager::{CreateReservation, ReservationManager};
pub use transition::{Transition, TransitionEffect, TransitionOutcome};
