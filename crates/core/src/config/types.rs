use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub auth: AuthConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub booking: BookingConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Authentication configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    pub method: AuthMethod,
    /// Header carrying the user id (used when method = "header")
    #[serde(default = "default_user_header")]
    pub user_header: String,
    /// Club staff allowed to confirm reservations and record payments
    #[serde(default)]
    pub staff_users: Vec<String>,
}

impl AuthConfig {
    pub fn is_staff(&self, user_id: &str) -> bool {
        self.staff_users.iter().any(|staff| staff == user_id)
    }
}

fn default_user_header() -> String {
    "x-user-id".to_string()
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    /// Every caller is anonymous
    None,
    /// Trust a user id header set by the upstream identity service
    Header,
}

impl AuthMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMethod::None => "none",
            AuthMethod::Header => "header",
        }
    }
}

/// Database configuration. Flights, reservations and audit events share one file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("hangar.db")
}

/// Booking rules
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BookingConfig {
    /// Longest wait for a flight's booking lock, in milliseconds
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
    /// Maximum length of reservation notes, in characters
    #[serde(default = "default_max_notes_len")]
    pub max_notes_len: usize,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            lock_timeout_ms: default_lock_timeout_ms(),
            max_notes_len: default_max_notes_len(),
        }
    }
}

fn default_lock_timeout_ms() -> u64 {
    5000
}

fn default_max_notes_len() -> usize {
    500
}

/// Flight catalog configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CatalogConfig {
    /// TOML file of flights imported at startup
    #[serde(default)]
    pub seed_path: Option<PathBuf>,
}

/// Config as served by the API
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub auth: SanitizedAuthConfig,
    pub server: ServerConfig,
    pub booking: BookingConfig,
    pub catalog: SanitizedCatalogConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedAuthConfig {
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_header: Option<String>,
    pub staff_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedCatalogConfig {
    pub seeded: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            auth: SanitizedAuthConfig {
                method: config.auth.method.as_str().to_string(),
                user_header: match config.auth.method {
                    AuthMethod::Header => Some(config.auth.user_header.clone()),
                    AuthMethod::None => None,
                },
                staff_count: config.auth.staff_users.len(),
            },
            server: config.server.clone(),
            booking: config.booking.clone(),
            catalog: SanitizedCatalogConfig {
                seeded: config.catalog.seed_path.is_some(),
            },
        }
    }
}
