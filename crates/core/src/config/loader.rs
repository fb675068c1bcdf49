use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Prefix of environment variables that override the config file.
pub const ENV_PREFIX: &str = "HANGAR_";

/// Load configuration from file with `HANGAR_`-prefixed environment overrides.
///
/// Sections are separated by a double underscore so that field names keep
/// their own underscores: `HANGAR_BOOKING__LOCK_TIMEOUT_MS=250` sets
/// `booking.lock_timeout_ms`.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    load_config_with_env(path, ENV_PREFIX)
}

fn load_config_with_env(path: &Path, prefix: &str) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed(prefix).split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthMethod;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_from_str_valid() {
        let toml = r#"
[auth]
method = "none"

[server]
port = 9000
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn test_load_config_from_str_missing_auth() {
        let toml = r#"
[booking]
lock_timeout_ms = 100
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let err = load_config(Path::new("/nonexistent/config.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[auth]
method = "header"

[server]
host = "127.0.0.1"
port = 3000

[booking]
max_notes_len = 64
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.host.to_string(), "127.0.0.1");
        assert_eq!(config.booking.max_notes_len, 64);
        assert_eq!(config.booking.lock_timeout_ms, 5000);
    }

    #[test]
    fn test_env_overrides_nested_fields() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[auth]
method = "header"

[booking]
lock_timeout_ms = 1000
"#
        )
        .unwrap();

        // Unique prefix so parallel tests never see these variables.
        std::env::set_var("HANGAR_LOADERTEST_BOOKING__LOCK_TIMEOUT_MS", "250");
        std::env::set_var("HANGAR_LOADERTEST_SERVER__PORT", "9100");

        let config = load_config_with_env(temp_file.path(), "HANGAR_LOADERTEST_").unwrap();
        assert_eq!(config.booking.lock_timeout_ms, 250);
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.auth.method, AuthMethod::Header);
    }
}
