//! Trusted-header identity.

use async_trait::async_trait;
use std::collections::HashMap;

use super::{AuthError, AuthRequest, Authenticator, Identity};

/// Header carrying an optional display name alongside the user id.
pub const USER_NAME_HEADER: &str = "x-user-name";

/// Authenticator that trusts a user id header set by an upstream identity
/// service (reverse proxy, gateway). It performs no verification of its own,
/// so it must only be exposed behind that service.
pub struct HeaderAuthenticator {
    header: String,
}

impl HeaderAuthenticator {
    /// `header` is matched case-insensitively.
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into().to_ascii_lowercase(),
        }
    }

    pub fn header(&self) -> &str {
        &self.header
    }
}

#[async_trait]
impl Authenticator for HeaderAuthenticator {
    async fn authenticate(&self, request: &AuthRequest) -> Result<Identity, AuthError> {
        let user_id = request
            .headers
            .get(&self.header)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .ok_or(AuthError::NotAuthenticated)?;

        let mut claims = HashMap::new();
        if let Some(name) = request.headers.get(USER_NAME_HEADER) {
            claims.insert("name".to_string(), serde_json::json!(name));
        }

        Ok(Identity {
            user_id: user_id.to_string(),
            method: "header".to_string(),
            claims,
        })
    }

    fn method_name(&self) -> &'static str {
        "header"
    }
}
