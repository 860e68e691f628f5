use thiserror::Error;

/// Boxed transport failure, kept as-is so callers see the original error.
pub type TransportFailure = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("API location is not set. Please target the location of your server with `keyhold api --server api.example.com` to continue.")]
    NotConfigured,

    #[error("The targeted API does not appear to be valid. Please validate the API address and retry your request.")]
    TargetInvalid,

    #[error("The provided username and password combination are incorrect. Please validate your input and retry your request.")]
    InvalidCredentials,

    #[error("The combination of parameters in the request is not allowed. Please validate your input and retry your request.")]
    InvalidParameters,

    #[error("Network error: {0}")]
    NetworkError(TransportFailure),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("{0}")]
    ServerError(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::NetworkError(Box::new(err))
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::InvalidResponse(err.to_string())
    }
}

impl ApiError {
    /// Pull the server's own message out of an error body.
    ///
    /// JSON bodies yield their `error` field, falling back to
    /// `error_description`; anything else is returned untouched.
    fn server_message(body: &str) -> String {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
            for key in ["error", "error_description"] {
                if let Some(message) = value.get(key).and_then(|m| m.as_str()) {
                    return message.to_string();
                }
            }
        }
        body.trim().to_string()
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let message = Self::server_message(body);
        if message.is_empty() {
            ApiError::ServerError(format!("Request failed with status {}", status))
        } else {
            ApiError::ServerError(message)
        }
    }

    /// True for failures that happened before any HTTP response arrived.
    pub fn is_network(&self) -> bool {
        matches!(self, ApiError::NetworkError(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_status_uses_error_field() {
        let err = ApiError::from_status(
            StatusCode::NOT_FOUND,
            r#"{"error": "The request could not be completed because the credential does not exist or you do not have sufficient authorization."}"#,
        );
        assert_eq!(
            err.to_string(),
            "The request could not be completed because the credential does not exist or you do not have sufficient authorization."
        );
    }

    #[test]
    fn test_from_status_prefers_error_field() {
        let err = ApiError::from_status(
            StatusCode::FORBIDDEN,
            r#"{"error": "access_denied", "error_description": "Insufficient scope"}"#,
        );
        assert_eq!(err.to_string(), "access_denied");
    }

    #[test]
    fn test_from_status_falls_back_to_error_description() {
        let err = ApiError::from_status(
            StatusCode::BAD_REQUEST,
            r#"{"error_description": "Missing grant type"}"#,
        );
        assert_eq!(err.to_string(), "Missing grant type");
    }

    #[test]
    fn test_from_status_raw_body() {
        let err = ApiError::from_status(StatusCode::BAD_GATEWAY, "upstream unavailable\n");
        assert_eq!(err.to_string(), "upstream unavailable");
    }

    #[test]
    fn test_from_status_empty_body() {
        let err = ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, "");
        assert_eq!(
            err.to_string(),
            "Request failed with status 500 Internal Server Error"
        );
    }

    #[test]
    fn test_network_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused");
        let err = ApiError::NetworkError(Box::new(io));
        assert!(err.is_network());

        let ApiError::NetworkError(source) = err else {
            panic!("expected network error");
        };
        let io = source
            .downcast_ref::<std::io::Error>()
            .expect("source should still be the io error");
        assert_eq!(io.kind(), std::io::ErrorKind::ConnectionRefused);
    }
}
