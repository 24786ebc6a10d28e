use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    #[error("LLM API error: {0}")]
    LlmError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("External service error: {0}")]
    ExternalServiceError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Timeout error: {0}")]
    TimeoutError(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Internal server error: {0}")]
    InternalServerError(String),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl AppError {
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::ConfigurationError(_) => "CONFIGURATION_ERROR",
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            AppError::RateLimitExceeded(_) => "RATE_LIMIT_EXCEEDED",
            AppError::LlmError(_) => "LLM_ERROR",
            AppError::StorageError(_) => "STORAGE_ERROR",
            AppError::ExternalServiceError(_) => "EXTERNAL_SERVICE_ERROR",
            AppError::ParseError(_) => "PARSE_ERROR",
            AppError::TimeoutError(_) => "TIMEOUT_ERROR",
            AppError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            AppError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::ParseError(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::RateLimitExceeded(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::TimeoutError(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::LlmError(_) => StatusCode::BAD_GATEWAY,
            AppError::StorageError(_) => StatusCode::BAD_GATEWAY,
            AppError::ExternalServiceError(_) => StatusCode::BAD_GATEWAY,
            AppError::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The bare message, without the variant prefix
    pub fn message(&self) -> &str {
        match self {
            AppError::ConfigurationError(m)
            | AppError::ValidationError(m)
            | AppError::BadRequest(m)
            | AppError::Unauthorized(m)
            | AppError::NotFound(m)
            | AppError::PayloadTooLarge(m)
            | AppError::RateLimitExceeded(m)
            | AppError::LlmError(m)
            | AppError::StorageError(m)
            | AppError::ExternalServiceError(m)
            | AppError::ParseError(m)
            | AppError::TimeoutError(m)
            | AppError::ServiceUnavailable(m)
            | AppError::InternalServerError(m) => m,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::TimeoutError(_)
                | AppError::ServiceUnavailable(_)
                | AppError::LlmError(_)
                | AppError::StorageError(_)
                | AppError::ExternalServiceError(_)
        )
    }

    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    fn log(&self) {
        match self {
            AppError::InternalServerError(_) | AppError::ConfigurationError(_) => {
                tracing::error!("Server error: {:?}", self);
            }
            AppError::ExternalServiceError(_)
            | AppError::LlmError(_)
            | AppError::StorageError(_)
            | AppError::ServiceUnavailable(_)
            | AppError::TimeoutError(_) => {
                tracing::warn!("External service error: {:?}", self);
            }
            AppError::BadRequest(_) | AppError::ValidationError(_) | AppError::ParseError(_) => {
                tracing::info!("Client error: {:?}", self);
            }
            _ => {
                tracing::debug!("Error: {:?}", self);
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();
        self.log();

        let error_response = ErrorResponse {
            success: false,
            error: self.message().to_string(),
            code: self.error_code().to_string(),
            timestamp: chrono::Utc::now(),
        };

        (status_code, Json(error_response)).into_response()
    }
}

/// Failure body of the edge-function contracts
#[derive(Debug, Serialize, Deserialize)]
pub struct EdgeErrorBody {
    pub success: bool,
    pub error: String,
}

/// Edge functions answer 401 for authentication failures and 500 for
/// everything else, with a `{success: false, error}` body.
#[derive(Debug)]
pub struct EdgeError(pub AppError);

impl From<AppError> for EdgeError {
    fn from(err: AppError) -> Self {
        EdgeError(err)
    }
}

impl IntoResponse for EdgeError {
    fn into_response(self) -> Response {
        self.0.log();

        let status_code = match self.0 {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = EdgeErrorBody {
            success: false,
            error: self.0.message().to_string(),
        };

        (status_code, Json(body)).into_response()
    }
}

// From implementations for common error types

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::TimeoutError(format!("HTTP request timeout: {}", err))
        } else if err.is_connect() {
            AppError::ServiceUnavailable(format!("Connection failed: {}", err))
        } else if err.is_decode() {
            AppError::ParseError(format!("Failed to decode response: {}", err))
        } else {
            AppError::ExternalServiceError(format!("HTTP request failed: {}", err))
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::ParseError(format!("JSON error: {}", err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => AppError::NotFound(format!("Resource not found: {}", err)),
            std::io::ErrorKind::TimedOut => AppError::TimeoutError(format!("IO timeout: {}", err)),
            _ => AppError::InternalServerError(format!("IO error: {}", err)),
        }
    }
}

impl From<url::ParseError> for AppError {
    fn from(err: url::ParseError) -> Self {
        AppError::ValidationError(format!("Invalid URL: {}", err))
    }
}

impl From<mindloom_shared::UnknownTransformationType> for AppError {
    fn from(err: mindloom_shared::UnknownTransformationType) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

impl From<axum::extract::multipart::MultipartError> for AppError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        AppError::BadRequest(format!("Invalid multipart body: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_and_status() {
        let err = AppError::ValidationError("missing".to_string());
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.is_client_error());
        assert!(!err.is_retryable());

        let err = AppError::LlmError("Gemini API error: Bad Gateway".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert!(err.is_server_error());
        assert!(err.is_retryable());
    }

    #[test]
    fn test_message_strips_prefix() {
        let err = AppError::Unauthorized("Authentication required".to_string());
        assert_eq!(err.to_string(), "Unauthorized: Authentication required");
        assert_eq!(err.message(), "Authentication required");
    }

    #[test]
    fn test_edge_error_status_mapping() {
        let response = EdgeError(AppError::Unauthorized("Invalid authentication".into())).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = EdgeError(AppError::ValidationError("Question is required".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = AppError::NotFound("gone".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_from_serde_error() {
        let err: AppError = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert_eq!(err.error_code(), "PARSE_ERROR");
    }
}
