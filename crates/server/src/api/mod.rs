pub mod audit;
pub mod error;
pub mod flights;
pub mod handlers;
pub mod middleware;
pub mod reservations;
pub mod routes;

pub use error::ApiError;
pub use routes::create_router;
