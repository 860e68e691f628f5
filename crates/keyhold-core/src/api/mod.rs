//! REST API client module for the credential service.
//!
//! This module provides the `CredentialClient` for fetching and deleting
//! named credentials, the `Transport` seam every HTTP call goes through, and
//! the `ApiError` type shared by the whole crate.
//!
//! Requests are authenticated with the OAuth bearer token held in the
//! current `Session`.

pub mod client;
pub mod error;
pub mod transport;

pub use client::CredentialClient;
pub use error::ApiError;
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
