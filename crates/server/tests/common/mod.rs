//! Common test utilities for in-process API testing.
//!
//! This module provides a test fixture that builds the full router with a
//! mock flight catalog and a fixed clock, backed by a temporary SQLite file.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::Duration;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use hangar_core::audit::{create_audit_system, AuditStore, SqliteAuditStore};
use hangar_core::config::{
    AuthConfig, BookingConfig, CatalogConfig, DatabaseConfig, ServerConfig,
};
use hangar_core::testing::{FixedClock, MockFlightCatalog};
use hangar_core::{
    create_authenticator, AuthMethod, Authenticator, Config, SqliteReservationStore,
};

/// Re-export fixtures for test convenience
pub use hangar_core::testing::fixtures;

/// Header carrying the caller's user id in header-auth fixtures.
pub const USER_HEADER: &str = "x-user-id";

/// The one identity configured as club staff.
pub const STAFF_USER: &str = "staff";

/// Test fixture for API testing.
///
/// The catalog starts with three flights:
/// - `F1`: capacity 3, departs in 7 days
/// - `F2`: capacity 1, training, departs in 2 days
/// - `OLD`: capacity 4, departed yesterday
pub struct TestFixture {
    pub router: Router,
    pub catalog: Arc<MockFlightCatalog>,
    pub clock: Arc<FixedClock>,
    pub audit_store: Arc<SqliteAuditStore>,
    /// Temporary directory for the test database
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Fixture with header auth, so tests can act as different users.
    pub async fn new() -> Self {
        Self::with_auth(AuthMethod::Header).await
    }

    pub async fn with_auth(method: AuthMethod) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");

        let config = Config {
            auth: AuthConfig {
                method,
                user_header: USER_HEADER.to_string(),
                staff_users: vec![STAFF_USER.to_string()],
            },
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 0, // Not used for in-process testing
            },
            database: DatabaseConfig {
                path: db_path.clone(),
            },
            booking: BookingConfig::default(),
            catalog: CatalogConfig::default(),
        };

        let now = fixtures::now();
        let catalog = Arc::new(MockFlightCatalog::new());
        catalog.add_flight(fixtures::flight("F1", 3, now + Duration::days(7)));
        catalog.add_flight(fixtures::training_flight("F2", now + Duration::days(2)));
        catalog.add_flight(fixtures::flight("OLD", 4, now - Duration::days(1)));
        let clock = Arc::new(FixedClock::new(now));

        let authenticator: Arc<dyn Authenticator> = Arc::from(
            create_authenticator(&config.auth).expect("Failed to create authenticator"),
        );

        let audit_store = Arc::new(
            SqliteAuditStore::new(&db_path).expect("Failed to create audit store"),
        );
        let reservations = Arc::new(
            SqliteReservationStore::new(&db_path).expect("Failed to create reservation store"),
        );

        let (audit_handle, audit_writer) =
            create_audit_system(Arc::clone(&audit_store) as Arc<dyn AuditStore>, 100);
        tokio::spawn(audit_writer.run());

        let state = Arc::new(hangar_server::state::AppState::new(
            config,
            authenticator,
            audit_handle,
            Arc::clone(&audit_store) as Arc<dyn AuditStore>,
            Arc::clone(&catalog) as Arc<dyn hangar_core::FlightCatalog>,
            reservations,
            Arc::clone(&clock) as Arc<dyn hangar_core::Clock>,
        ));

        let router = hangar_server::api::create_router(state);

        Self {
            router,
            catalog,
            clock,
            audit_store,
            temp_dir,
        }
    }

    /// Send a GET request as `user`.
    pub async fn get(&self, path: &str, user: &str) -> TestResponse {
        self.request("GET", path, Some(user), None).await
    }

    /// Send a POST request with JSON body as `user`.
    pub async fn post(&self, path: &str, user: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(user), Some(body)).await
    }

    /// Send a request without any identity header.
    pub async fn get_anonymous(&self, path: &str) -> TestResponse {
        self.request("GET", path, None, None).await
    }

    /// Book seats on a flight and return the reservation id.
    pub async fn book(&self, user: &str, flight_id: &str, passengers: u32) -> String {
        let response = self
            .post(
                "/api/v1/reservations",
                user,
                serde_json::json!({ "flight_id": flight_id, "passengers": passengers }),
            )
            .await;
        assert_eq!(
            response.status,
            StatusCode::CREATED,
            "booking failed: {}",
            response.body
        );
        response.body["id"]
            .as_str()
            .expect("reservation id")
            .to_string()
    }

    /// Raw response text, for non-JSON endpoints.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    async fn request(
        &self,
        method: &str,
        path: &str,
        user: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        if let Some(user) = user {
            request_builder = request_builder.header(USER_HEADER, user);
        }

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
