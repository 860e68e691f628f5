//! HTTP transport seam.
//!
//! Everything that talks to the network goes through the [`Transport`] trait
//! so the session and credential logic can run against a scripted transport
//! in tests. [`ReqwestTransport`] is the real implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::ApiError;

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// A single outgoing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub bearer: Option<String>,
    pub form: Vec<(String, String)>,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            bearer: None,
            form: Vec::new(),
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::DELETE, url)
    }

    /// POST with an `application/x-www-form-urlencoded` body, fields sent in
    /// the given order.
    pub fn post_form(url: impl Into<String>, form: &[(&str, &str)]) -> Self {
        let mut request = Self::new(Method::POST, url);
        request.form = form
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        request
    }

    /// Attach a bearer token. Empty tokens are not sent.
    pub fn bearer(mut self, token: &str) -> Self {
        if !token.is_empty() {
            self.bearer = Some(token.to_string());
        }
        self
    }
}

/// Status and body of a completed request.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        Ok(serde_json::from_str(&self.body)?)
    }

    /// Pass 2xx responses through, map everything else to an error carrying
    /// the server's message.
    pub fn error_for_status(self) -> Result<Self, ApiError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ApiError::from_status(self.status, &self.body))
        }
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one request. Transport-level failures come back as
    /// [`ApiError::NetworkError`]; any HTTP status is a successful send.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

/// Transport backed by a shared `reqwest::Client`.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Build a transport. With `insecure_skip_verify` the server certificate
    /// is not validated, for the probe, the grant and every API call alike.
    pub fn new(insecure_skip_verify: bool) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .danger_accept_invalid_certs(insecure_skip_verify)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        debug!(method = %request.method, url = %request.url, "Sending request");

        let mut builder = self.client.request(request.method, &request.url);
        if let Some(ref token) = request.bearer {
            builder = builder.bearer_auth(token);
        }
        if !request.form.is_empty() {
            builder = builder.form(&request.form);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(status = %status, bytes = body.len(), "Received response");

        Ok(HttpResponse { status, body })
    }
}

/// Scripted transport for tests: replays queued outcomes in order and records
/// every request it was handed. Other crates get it with the `testing`
/// feature.
#[cfg(any(test, feature = "testing"))]
pub mod testing {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    pub struct ScriptedTransport {
        outcomes: Mutex<VecDeque<Result<HttpResponse, ApiError>>>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl ScriptedTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn respond(self, status: u16, body: &str) -> Self {
            let status = StatusCode::from_u16(status).expect("valid status code");
            self.push(Ok(HttpResponse::new(status, body)))
        }

        pub fn fail(self, message: &str) -> Self {
            self.push(Err(network_error(message)))
        }

        fn push(self, outcome: Result<HttpResponse, ApiError>) -> Self {
            self.outcomes.lock().unwrap().push_back(outcome);
            self
        }

        pub fn requests(&self) -> Vec<HttpRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    pub fn network_error(message: &str) -> ApiError {
        ApiError::NetworkError(Box::new(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            message.to_string(),
        )))
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
            self.requests.lock().unwrap().push(request.clone());
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(network_error(&format!("no response scripted for {}", request.url))))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_skips_empty_token() {
        let request = HttpRequest::get("http://example.com").bearer("");
        assert_eq!(request.bearer, None);

        let request = HttpRequest::get("http://example.com").bearer("abc");
        assert_eq!(request.bearer.as_deref(), Some("abc"));
    }

    #[test]
    fn test_post_form_keeps_field_order() {
        let request = HttpRequest::post_form(
            "http://example.com/oauth/token/",
            &[("grant_type", "password"), ("password", "pass")],
        );
        assert_eq!(request.method, Method::POST);
        assert_eq!(
            request.form,
            vec![
                ("grant_type".to_string(), "password".to_string()),
                ("password".to_string(), "pass".to_string()),
            ]
        );
    }

    #[test]
    fn test_error_for_status() {
        assert!(HttpResponse::new(StatusCode::NO_CONTENT, "")
            .error_for_status()
            .is_ok());

        let err = HttpResponse::new(StatusCode::NOT_FOUND, r#"{"error":"not here"}"#)
            .error_for_status()
            .unwrap_err();
        assert_eq!(err.to_string(), "not here");
    }

    #[test]
    fn test_reqwest_transport_builds() {
        assert!(ReqwestTransport::new(false).is_ok());
        assert!(ReqwestTransport::new(true).is_ok());
    }
}
