//! Core library for keyhold.
//!
//! Talks to a remote credential-management service: discovers the target's
//! auth server, logs in with the OAuth password grant, and fetches or deletes
//! named credentials. All network traffic goes through [`api::Transport`];
//! all state that outlives a process lives in [`auth::Session`].

pub mod api;
pub mod auth;
pub mod config;
pub mod models;

pub use api::{ApiError, CredentialClient, ReqwestTransport, Transport};
pub use auth::{AuthManager, Session};
pub use config::ConfigStore;
pub use models::{Credential, CredentialValue};
