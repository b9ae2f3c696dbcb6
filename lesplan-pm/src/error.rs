//! Error types for lesplan-pm

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// API error type: every variant maps to one fixed wire error code
#[derive(Debug, Error)]
pub enum ApiError {
    /// No Authorization header / not a bearer token (401)
    #[error("No access token provided")]
    MissingAccessToken,

    /// Token rejected by the identity service (401)
    #[error("Access token invalid or expired")]
    InvalidToken,

    /// No authorization signal holds for the principal (403)
    #[error("Principal may not manage programs for this organization")]
    Unauthorized,

    /// Malformed or incomplete request payload (400)
    #[error("Missing or malformed fields: {0}")]
    MissingRequiredFields(String),

    /// More than one location id supplied (400)
    #[error("A program can link at most one location")]
    OnlyOneLocationAllowed,

    /// Program row insert rejected by the store (500)
    #[error("Program insert failed")]
    ProgramInsertFailed,

    /// Schedule detail insert rejected by the store (500)
    #[error("Schedule details insert failed")]
    DetailsInsertFailed,

    /// Program row update rejected by the store (500)
    #[error("Program update failed")]
    ProgramUpdateFailed,

    /// Schedule detail / lesson regeneration rejected by the store (500)
    #[error("Schedule details update failed")]
    DetailsUpdateFailed,

    /// Unexpected failure (500)
    #[error("Internal server error: {0}")]
    ServerError(String),
}

impl ApiError {
    /// Fixed wire error code
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::MissingAccessToken => "missing_access_token",
            ApiError::InvalidToken => "invalid_token",
            ApiError::Unauthorized => "unauthorized",
            ApiError::MissingRequiredFields(_) => "missing_required_fields",
            ApiError::OnlyOneLocationAllowed => "only_one_location_allowed",
            ApiError::ProgramInsertFailed => "program_insert_failed",
            ApiError::DetailsInsertFailed => "details_insert_failed",
            ApiError::ProgramUpdateFailed => "program_update_failed",
            ApiError::DetailsUpdateFailed => "details_update_failed",
            ApiError::ServerError(_) => "server_error",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingAccessToken | ApiError::InvalidToken => StatusCode::UNAUTHORIZED,
            ApiError::Unauthorized => StatusCode::FORBIDDEN,
            ApiError::MissingRequiredFields(_) | ApiError::OnlyOneLocationAllowed => {
                StatusCode::BAD_REQUEST
            }
            ApiError::ProgramInsertFailed
            | ApiError::DetailsInsertFailed
            | ApiError::ProgramUpdateFailed
            | ApiError::DetailsUpdateFailed
            | ApiError::ServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.code(),
            "message": self.to_string(),
        }));

        (self.status(), body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
