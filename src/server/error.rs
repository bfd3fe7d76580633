use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::types::Error;

/// Standardised HTTP error response.
///
/// Every error returned by the gateway boundary serialises as:
/// ```json
/// { "success": false, "error": { "code": "<code>", "message": "<message>" } }
/// ```
/// with an optional `details` list for schema violations.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ApiErrorResponse,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiErrorResponse {
    pub success: bool,
    pub error: ApiErrorBody,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ApiErrorResponse {
                success: false,
                error: ApiErrorBody {
                    code: code.into(),
                    message: message.into(),
                    details: Vec::new(),
                },
            },
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "bad_request", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal", message)
    }

    fn with_details(mut self, details: Vec<String>) -> Self {
        self.body.error.details = details;
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &str {
        &self.body.error.code
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::Validation(msg) => Self::bad_request(msg),
            Error::UnknownTool(name) => Self::new(
                StatusCode::BAD_REQUEST,
                "unknown_tool",
                format!("Unknown tool: {name}"),
            ),
            Error::InvalidParameters { tool, violations } => Self::new(
                StatusCode::BAD_REQUEST,
                "invalid_parameters",
                format!("Invalid parameters for tool: {tool}"),
            )
            .with_details(violations),
            other => {
                tracing::error!(error = %other, "request failed");
                Self::internal("internal gateway error")
            }
        }
    }
}
