use thiserror::Error;

/// Application error types
#[derive(Debug, Error)]
pub enum ApiError {
    /// Configuration error (missing or invalid credentials)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Non-success response from a token or revoke endpoint
    #[error("Token exchange failed ({status}): {body}")]
    Exchange { status: u16, body: String },

    /// Transport-level HTTP failure
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Token persistence failure
    #[error("Token store error: {0}")]
    Store(String),

    /// Malformed JSON from a provider
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = ApiError::Exchange {
            status: 400,
            body: "invalid_grant".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Token exchange failed (400): invalid_grant"
        );
    }

    #[test]
    fn test_config_error_display() {
        let error = ApiError::Config("missing client_id".to_string());
        assert_eq!(error.to_string(), "Configuration error: missing client_id");
    }
}
