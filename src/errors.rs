use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Unified error type for the checkout core.
///
/// `status_code` / `response_message` are the single source of truth for how
/// each failure surfaces over HTTP; internal detail stays in the server logs.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Payment rejected: {0}")]
    PaymentRejected(String),

    #[error("Payment provider unavailable: {0}")]
    PaymentUnavailable(String),

    #[error("Event error: {0}")]
    Event(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::Validation(err.to_string())
    }
}

impl ServiceError {
    /// HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            // Gateway failures surface as a plain 500 to the storefront; the
            // provider payload never reaches the client.
            Self::PaymentRejected(_)
            | Self::PaymentUnavailable(_)
            | Self::Database(_)
            | Self::Event(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message suitable for the HTTP response. Internal failures are redacted
    /// to a generic message; user-correctable ones keep their detail.
    pub fn response_message(&self) -> String {
        match self {
            Self::PaymentRejected(_) | Self::PaymentUnavailable(_) => {
                "Payment could not be processed. No charge was made; please try again.".to_string()
            }
            Self::Database(_) | Self::Event(_) | Self::Internal(_) => {
                "An internal error occurred".to_string()
            }
            Self::NotFound(_) | Self::Validation(_) => self.to_string(),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = json!({
            "success": false,
            "error": status.canonical_reason().unwrap_or("Error"),
            "message": self.response_message(),
        });
        (status, Json(body)).into_response()
    }
}
