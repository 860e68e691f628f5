//! Target discovery, password-grant login and token revocation.
//!
//! Login runs as a small state machine:
//!
//! ```text
//! Idle -> ProbingTarget (only with an explicit server) -> AttemptingGrant
//!      -> Authenticated
//!      -> RevokingStale -> Failed   (grant failed, session held a refresh token)
//!      -> Failed
//! ```
//!
//! The session is only touched when a terminal state is reached, except for
//! `RevokingStale`, which always leaves both tokens set to [`REVOKED_TOKEN`].

use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::api::{ApiError, HttpRequest, Transport};

use super::session::{AuthToken, Session, REVOKED_TOKEN};

/// What the target's `/info` endpoint reports about itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfo {
    pub app_name: String,
    pub version: String,
    pub auth_url: String,
}

#[derive(Debug, Deserialize)]
struct InfoResponse {
    #[serde(default)]
    app: AppInfo,
    #[serde(rename = "auth-server")]
    auth_server: AuthServerInfo,
}

#[derive(Debug, Default, Deserialize)]
struct AppInfo {
    #[serde(default)]
    name: String,
    #[serde(default)]
    version: String,
}

#[derive(Debug, Deserialize)]
struct AuthServerInfo {
    url: String,
}

/// A probed API target that has not been written to the session yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub api_url: String,
    pub info: ServerInfo,
}

/// Username, password and optional explicit server for one login attempt.
#[derive(Clone, Copy)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub server: Option<&'a str>,
}

#[derive(Debug)]
pub enum LoginState {
    Idle,
    ProbingTarget(String),
    AttemptingGrant(Option<Target>),
    Authenticated {
        token: AuthToken,
        target: Option<Target>,
    },
    /// The grant failed while the session still held a refresh token. Carries
    /// the grant's error, which is what the login ultimately reports.
    RevokingStale(ApiError),
    Failed(ApiError),
}

impl LoginState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoginState::Authenticated { .. } | LoginState::Failed(_))
    }
}

pub struct AuthManager<'a, T: Transport> {
    transport: &'a T,
}

impl<'a, T: Transport> AuthManager<'a, T> {
    pub fn new(transport: &'a T) -> Self {
        Self { transport }
    }

    /// Probe `{api_url}/info` for the auth server URL and server version.
    ///
    /// Any failure, whether the target is unreachable, answers with an error
    /// status or returns something other than the info document, is reported
    /// as `TargetInvalid`.
    pub async fn discover_target(&self, api_url: &str) -> Result<ServerInfo, ApiError> {
        let url = format!("{}/info", api_url.trim_end_matches('/'));

        let response = match self.transport.send(HttpRequest::get(url)).await {
            Ok(response) if response.is_success() => response,
            Ok(response) => {
                debug!(status = %response.status, "Target info probe rejected");
                return Err(ApiError::TargetInvalid);
            }
            Err(e) => {
                warn!(error = %e, "Target info probe failed");
                return Err(ApiError::TargetInvalid);
            }
        };

        let info: InfoResponse = response.json().map_err(|e| {
            debug!(error = %e, "Target info response unparsable");
            ApiError::TargetInvalid
        })?;

        if info.auth_server.url.is_empty() {
            return Err(ApiError::TargetInvalid);
        }

        Ok(ServerInfo {
            app_name: info.app.name,
            version: info.app.version,
            auth_url: info.auth_server.url.trim_end_matches('/').to_string(),
        })
    }

    /// Probe `server` and, only if that succeeds, point the session at it.
    pub async fn set_target(&self, session: &mut Session, server: &str) -> Result<ServerInfo, ApiError> {
        let target = self.probe(server).await?;
        session.set_target(&target.api_url, &target.info);
        Ok(target.info)
    }

    async fn probe(&self, server: &str) -> Result<Target, ApiError> {
        let api_url = normalize_server(server).ok_or(ApiError::NotConfigured)?;
        let info = self.discover_target(&api_url).await?;
        debug!(api_url = %api_url, version = %info.version, "Target discovered");
        Ok(Target { api_url, info })
    }

    /// Log in with the password grant.
    ///
    /// On success the session holds the new tokens (and the new target, if a
    /// server was given). On failure the session is left alone unless it held
    /// a refresh token, which is revoked best-effort and replaced, along with
    /// the access token, by [`REVOKED_TOKEN`].
    pub async fn login(
        &self,
        session: &mut Session,
        request: &LoginRequest<'_>,
    ) -> Result<Option<ServerInfo>, ApiError> {
        let mut state = LoginState::Idle;
        loop {
            state = match state {
                LoginState::Authenticated { token, target } => {
                    session.set_tokens(token);
                    if let Some(ref target) = target {
                        session.set_target(&target.api_url, &target.info);
                    }
                    info!(username = %request.username, "Login successful");
                    return Ok(target.map(|t| t.info));
                }
                LoginState::Failed(err) => return Err(err),
                state => self.step(state, session, request).await,
            };
        }
    }

    /// Advance the login state machine by one transition. Terminal states are
    /// returned unchanged.
    pub async fn step(
        &self,
        state: LoginState,
        session: &mut Session,
        request: &LoginRequest<'_>,
    ) -> LoginState {
        match state {
            LoginState::Idle => match request.server {
                Some(server) => LoginState::ProbingTarget(server.to_string()),
                None => LoginState::AttemptingGrant(None),
            },
            LoginState::ProbingTarget(server) => match self.probe(&server).await {
                Ok(target) => LoginState::AttemptingGrant(Some(target)),
                Err(e) => LoginState::Failed(e),
            },
            LoginState::AttemptingGrant(target) => {
                let auth_url = match target {
                    Some(ref t) => Ok(t.info.auth_url.as_str()),
                    None => session.auth_url(),
                };
                let result = match auth_url {
                    Ok(auth_url) => self.request_grant(auth_url, request).await,
                    Err(e) => Err(e),
                };
                match result {
                    Ok(token) => LoginState::Authenticated { token, target },
                    Err(e) if has_live_refresh_token(session) => LoginState::RevokingStale(e),
                    Err(e) => LoginState::Failed(e),
                }
            }
            LoginState::RevokingStale(err) => {
                self.revoke_stale(session).await;
                LoginState::Failed(err)
            }
            terminal => terminal,
        }
    }

    async fn request_grant(&self, auth_url: &str, request: &LoginRequest<'_>) -> Result<AuthToken, ApiError> {
        let url = format!("{}/oauth/token/", auth_url);
        let grant = HttpRequest::post_form(
            url,
            &[
                ("grant_type", "password"),
                ("password", request.password),
                ("response_type", "token"),
                ("username", request.username),
            ],
        );

        let response = self.transport.send(grant).await?;
        if response.status == StatusCode::UNAUTHORIZED {
            debug!(username = %request.username, "Password grant rejected");
            return Err(ApiError::InvalidCredentials);
        }

        response.error_for_status()?.json()
    }

    /// Revoke the session's refresh token on its auth server.
    pub async fn revoke(&self, session: &Session) -> Result<(), ApiError> {
        let url = format!(
            "{}/oauth/token/revoke/{}",
            session.auth_url()?,
            session.refresh_token
        );
        self.transport
            .send(HttpRequest::delete(url).bearer(&session.access_token))
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Best-effort revoke, then mark both tokens revoked whatever happened.
    pub async fn revoke_stale(&self, session: &mut Session) {
        if let Err(e) = self.revoke(session).await {
            warn!(error = %e, "Failed to revoke stale refresh token");
        }
        session.mark_revoked();
    }

    /// Forget the session's tokens, revoking the refresh token if there is a
    /// live one.
    pub async fn logout(&self, session: &mut Session) {
        if has_live_refresh_token(session) {
            self.revoke_stale(session).await;
        } else {
            session.mark_revoked();
        }
    }
}

/// A refresh token worth revoking: present and not already the sentinel.
fn has_live_refresh_token(session: &Session) -> bool {
    session.has_refresh_token() && session.refresh_token != REVOKED_TOKEN
}

/// Turn a `--server` value into an API base URL. Bare hosts get `https://`.
fn normalize_server(server: &str) -> Option<String> {
    let server = server.trim().trim_end_matches('/');
    if server.is_empty() {
        None
    } else if server.contains("://") {
        Some(server.to_string())
    } else {
        Some(format!("https://{}", server))
    }
}
