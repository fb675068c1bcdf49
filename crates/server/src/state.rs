use std::sync::Arc;

use hangar_core::audit::{AuditHandle, AuditStore};
use hangar_core::{
    Authenticator, Clock, Config, FlightCatalog, ReservationManager, ReservationQuery,
    ReservationStore, SanitizedConfig,
};

/// Shared application state
pub struct AppState {
    config: Config,
    authenticator: Arc<dyn Authenticator>,
    audit: AuditHandle,
    audit_store: Arc<dyn AuditStore>,
    catalog: Arc<dyn FlightCatalog>,
    reservations: Arc<dyn ReservationStore>,
    manager: Arc<ReservationManager>,
    query: ReservationQuery,
}

impl AppState {
    pub fn new(
        config: Config,
        authenticator: Arc<dyn Authenticator>,
        audit: AuditHandle,
        audit_store: Arc<dyn AuditStore>,
        catalog: Arc<dyn FlightCatalog>,
        reservations: Arc<dyn ReservationStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let manager = ReservationManager::new(
            Arc::clone(&catalog),
            Arc::clone(&reservations),
            Arc::clone(&clock),
            &config.booking,
        )
        .with_audit(audit.clone());
        let query = ReservationQuery::new(Arc::clone(&catalog), Arc::clone(&reservations), clock);

        Self {
            config,
            authenticator,
            audit,
            audit_store,
            catalog,
            reservations,
            manager: Arc::new(manager),
            query,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    /// Whether `user_id` may confirm reservations and record payments.
    pub fn is_staff(&self, user_id: &str) -> bool {
        self.config.auth.is_staff(user_id)
    }

    pub fn authenticator(&self) -> &dyn Authenticator {
        self.authenticator.as_ref()
    }

    pub fn audit(&self) -> &AuditHandle {
        &self.audit
    }

    pub fn audit_store(&self) -> &dyn AuditStore {
        self.audit_store.as_ref()
    }

    pub fn catalog(&self) -> &dyn FlightCatalog {
        self.catalog.as_ref()
    }

    pub fn reservations(&self) -> &dyn ReservationStore {
        self.reservations.as_ref()
    }

    /// Shared so blocking booking work can move onto another thread.
    pub fn manager(&self) -> &Arc<ReservationManager> {
        &self.manager
    }

    pub fn query(&self) -> &ReservationQuery {
        &self.query
    }
}
