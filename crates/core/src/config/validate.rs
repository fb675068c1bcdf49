use super::{types::Config, AuthMethod, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Auth section exists (enforced by serde)
/// - Server port is not 0
/// - Booking lock timeout and notes limit are positive
/// - Header auth names a header
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.booking.lock_timeout_ms == 0 {
        return Err(ConfigError::ValidationError(
            "booking.lock_timeout_ms must be greater than 0".to_string(),
        ));
    }

    if config.booking.max_notes_len == 0 {
        return Err(ConfigError::ValidationError(
            "booking.max_notes_len must be greater than 0".to_string(),
        ));
    }

    if config.auth.method == AuthMethod::Header && config.auth.user_header.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "auth.user_header cannot be empty when auth.method = \"header\"".to_string(),
        ));
    }

    Ok(())
}
