//! Authentication module for managing the persisted session.
//!
//! This module provides:
//! - `Session`: target URLs and OAuth tokens carried across invocations
//! - `AuthManager`: target discovery, password-grant login and revocation
//!
//! Tokens are not refreshed; a failed login revokes whatever refresh token
//! the session still holds.

pub mod manager;
pub mod session;

pub use manager::{AuthManager, LoginRequest, LoginState, ServerInfo, Target};
pub use session::{AuthToken, Session, REVOKED_TOKEN};
