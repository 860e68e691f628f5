//! Data models for credentials held by the remote service.
//!
//! - `Credential`: a named, versioned credential
//! - `CredentialValue`: one variant per credential type
//! - `KeyPair`, `Certificate`: structured values for ssh/rsa and certificate
//! - `TypedCredential`: a credential narrowed to a single value type

pub mod credential;

pub use credential::{Certificate, Credential, CredentialValue, KeyPair, TypedCredential};
