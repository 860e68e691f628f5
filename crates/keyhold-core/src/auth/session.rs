use serde::{Deserialize, Serialize};

use crate::api::ApiError;

use super::ServerInfo;

/// Written into both token fields once a stale session has been revoked.
/// Never a value the auth server issues.
pub const REVOKED_TOKEN: &str = "revoked";

/// OAuth token pair returned by a successful password grant.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthToken {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
}

/// Everything that survives between invocations.
///
/// Read from the config store at the start of a command and written back
/// once at the end.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Session {
    pub api_url: String,
    pub auth_url: String,
    pub access_token: String,
    pub refresh_token: String,
    pub insecure_skip_verify: bool,
}

impl Session {
    /// The API base URL, or `NotConfigured` if no target has been set.
    pub fn api_url(&self) -> Result<&str, ApiError> {
        if self.api_url.is_empty() {
            Err(ApiError::NotConfigured)
        } else {
            Ok(self.api_url.trim_end_matches('/'))
        }
    }

    /// The auth server base URL, or `NotConfigured` if unknown.
    pub fn auth_url(&self) -> Result<&str, ApiError> {
        if self.auth_url.is_empty() {
            Err(ApiError::NotConfigured)
        } else {
            Ok(self.auth_url.trim_end_matches('/'))
        }
    }

    pub fn has_refresh_token(&self) -> bool {
        !self.refresh_token.is_empty()
    }

    pub fn is_revoked(&self) -> bool {
        self.access_token == REVOKED_TOKEN && self.refresh_token == REVOKED_TOKEN
    }

    /// Point the session at a probed target.
    pub fn set_target(&mut self, api_url: &str, info: &ServerInfo) {
        self.api_url = api_url.to_string();
        self.auth_url = info.auth_url.clone();
    }

    pub fn set_tokens(&mut self, token: AuthToken) {
        self.access_token = token.access_token;
        self.refresh_token = token.refresh_token;
    }

    pub fn mark_revoked(&mut self) {
        self.access_token = REVOKED_TOKEN.to_string();
        self.refresh_token = REVOKED_TOKEN.to_string();
    }
}
