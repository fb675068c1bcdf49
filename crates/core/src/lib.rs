pub mod audit;
pub mod auth;
pub mod availability;
pub mod clock;
pub mod config;
pub mod error;
pub mod flight;
pub mod lifecycle;
pub mod metrics;
pub mod query;
pub mod reservation;
pub mod testing;

pub use auth::{
    create_authenticator, AuthError, AuthRequest, Authenticator, HeaderAuthenticator, Identity,
    NoneAuthenticator,
};
pub use availability::{AvailabilityEngine, BookingAssessment, BookingBlocker, SeatSummary};
pub use clock::{Clock, SystemClock};
pub use config::{
    load_config, load_config_from_str, validate_config, AuthMethod, Config, ConfigError,
    SanitizedConfig,
};
pub use error::ReservationError;
pub use flight::{Flight, FlightCatalog, FlightFilter, SqliteFlightCatalog};
pub use lifecycle::{CreateReservation, ReservationManager, Transition};
pub use query::{ReservationQuery, ReservationScope, ReservationView};
pub use reservation::{
    PaymentStatus, Reservation, ReservationStatus, ReservationStore, SqliteReservationStore,
};
