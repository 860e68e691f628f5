//! API client for the credential service.
//!
//! `CredentialClient` borrows the session for its target URL and bearer token
//! and a transport to send requests through. Each call is a single request;
//! nothing is retried.

use tracing::debug;

use crate::auth::Session;
use crate::models::{Certificate, Credential, CredentialValue, KeyPair, TypedCredential};

use super::{ApiError, HttpRequest, Transport};

pub struct CredentialClient<'a, T: Transport> {
    transport: &'a T,
    session: &'a Session,
}

impl<'a, T: Transport> CredentialClient<'a, T> {
    pub fn new(transport: &'a T, session: &'a Session) -> Self {
        Self { transport, session }
    }

    /// Fetch the current version of a credential by name.
    pub async fn get(&self, name: &str) -> Result<Credential, ApiError> {
        let url = format!("{}/api/v1/data?name={}", self.session.api_url()?, name);
        debug!(name = name, "Fetching credential");

        let response = self
            .transport
            .send(HttpRequest::get(url).bearer(&self.session.access_token))
            .await?
            .error_for_status()?;

        response.json()
    }

    /// Delete a credential by name. A single leading `/` is dropped since the
    /// name becomes a path segment.
    pub async fn delete(&self, name: &str) -> Result<(), ApiError> {
        let segment = name.strip_prefix('/').unwrap_or(name);
        let url = format!("{}/api/v1/secret/{}", self.session.api_url()?, segment);
        debug!(name = name, "Deleting credential");

        self.transport
            .send(HttpRequest::delete(url).bearer(&self.session.access_token))
            .await?
            .error_for_status()?;
        Ok(())
    }

    // ===== Typed accessors =====

    pub async fn get_value(&self, name: &str) -> Result<TypedCredential<String>, ApiError> {
        narrow(self.get(name).await?, "value", |v| match v {
            CredentialValue::Value(s) => Ok(s),
            other => Err(other),
        })
    }

    pub async fn get_password(&self, name: &str) -> Result<TypedCredential<String>, ApiError> {
        narrow(self.get(name).await?, "password", |v| match v {
            CredentialValue::Password(s) => Ok(s),
            other => Err(other),
        })
    }

    pub async fn get_ssh(&self, name: &str) -> Result<TypedCredential<KeyPair>, ApiError> {
        narrow(self.get(name).await?, "ssh", |v| match v {
            CredentialValue::Ssh(pair) => Ok(pair),
            other => Err(other),
        })
    }

    pub async fn get_rsa(&self, name: &str) -> Result<TypedCredential<KeyPair>, ApiError> {
        narrow(self.get(name).await?, "rsa", |v| match v {
            CredentialValue::Rsa(pair) => Ok(pair),
            other => Err(other),
        })
    }

    pub async fn get_certificate(&self, name: &str) -> Result<TypedCredential<Certificate>, ApiError> {
        narrow(self.get(name).await?, "certificate", |v| match v {
            CredentialValue::Certificate(cert) => Ok(cert),
            other => Err(other),
        })
    }
}

fn narrow<V>(
    credential: Credential,
    expected: &str,
    extract: impl FnOnce(CredentialValue) -> Result<V, CredentialValue>,
) -> Result<TypedCredential<V>, ApiError> {
    credential.narrow(extract).map_err(|other| {
        ApiError::InvalidResponse(format!(
            "credential {} has type {}, expected {}",
            other.name,
            other.credential_type(),
            expected
        ))
    })
}
