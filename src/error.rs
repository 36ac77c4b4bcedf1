use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// One list of messages per offending field, so clients can render inline
/// form errors.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Validation failed")]
    Validation(FieldErrors),
    #[error("Email already exists")]
    DuplicateEmail,
    #[error("Invalid email/password")]
    InvalidCredentials,
    #[error("Invalid or expired OTP")]
    InvalidOtp,
    #[error("{0}")]
    Unauthorized(String),
    #[error("Forbidden")]
    Forbidden,
    #[error("User not found")]
    UserNotFound,
    #[error("Failed to update user")]
    UpdateFailed,
    #[error("Failed to send OTP. Please try again later.")]
    Delivery,
    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::DuplicateEmail | ApiError::UpdateFailed => {
                StatusCode::BAD_REQUEST
            }
            ApiError::InvalidCredentials | ApiError::InvalidOtp | ApiError::Unauthorized(_) => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::UserNotFound => StatusCode::NOT_FOUND,
            ApiError::Delivery | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn field_errors(&self) -> Option<FieldErrors> {
        match self {
            ApiError::Validation(errors) => Some(errors.clone()),
            ApiError::DuplicateEmail => {
                let mut errors = FieldErrors::new();
                errors.insert("email".into(), vec!["Email already exists".into()]);
                Some(errors)
            }
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Internal details are logged server-side, never sent to the client.
        if let ApiError::Internal(e) = &self {
            error!(error = %e, "internal error");
        }
        let status = self.status();
        let body = match self.field_errors() {
            Some(fields) => json!({
                "status": "error",
                "message": self.to_string(),
                "data": fields,
            }),
            None => json!({
                "status": "error",
                "message": self.to_string(),
            }),
        };
        (status, Json(body)).into_response()
    }
}
