//! Reservation records and their storage.

mod sqlite_store;
mod store;
mod types;

pub use sqlite_store::SqliteReservationStore;
pub use store::{ReservationFilter, ReservationStore};
pub use types::{NewReservation, PaymentStatus, Reservation, ReservationStatus};
