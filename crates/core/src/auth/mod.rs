//! Identity collaborator.
//!
//! The reservation core never authenticates anyone; it takes the user id it
//! is given. These authenticators turn an incoming request into that id.

mod header;
mod none;
mod traits;
mod types;

pub use header::*;
pub use none::*;
pub use traits::*;
pub use types::*;

use crate::config::{AuthConfig, AuthMethod};

/// Factory function to create authenticator from config
pub fn create_authenticator(config: &AuthConfig) -> Result<Box<dyn Authenticator>, AuthError> {
    match config.method {
        AuthMethod::None => Ok(Box::new(NoneAuthenticator::new())),
        AuthMethod::Header => {
            if config.user_header.trim().is_empty() {
                return Err(AuthError::ConfigurationError(
                    "user_header must be set when using header auth".to_string(),
                ));
            }
            Ok(Box::new(HeaderAuthenticator::new(config.user_header.trim())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_authenticator_none() {
        let config = AuthConfig {
            method: AuthMethod::None,
            user_header: "x-user-id".to_string(),
            staff_users: Vec::new(),
        };
        let auth = create_authenticator(&config).unwrap();
        assert_eq!(auth.method_name(), "none");
    }

    #[test]
    fn test_create_authenticator_header() {
        let config = AuthConfig {
            method: AuthMethod::Header,
            user_header: "X-Forwarded-User".to_string(),
            staff_users: Vec::new(),
        };
        let auth = create_authenticator(&config).unwrap();
        assert_eq!(auth.method_name(), "header");
    }

    #[test]
    fn test_create_authenticator_header_missing_name() {
        let config = AuthConfig {
            method: AuthMethod::Header,
            user_header: String::new(),
            staff_users: Vec::new(),
        };
        let result = create_authenticator(&config);
        assert!(matches!(result, Err(AuthError::ConfigurationError(_))));
    }
}
