use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::usecases::{
    admin_auth::AdminAuthError, plans::PlanError, posts::PostError, site_configs::SiteConfigError,
};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: u16,
    pub message: String,
}

/// JSON error surface of the API routes.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found")]
    NotFound,

    #[error("Forbidden")]
    Forbidden,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match self {
            AppError::BadRequest(msg) => msg,
            AppError::Internal(err) => {
                error!(error = ?err, "http: internal error");
                // Don't leak internal error detail to client
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(ErrorResponse {
            code: status.as_u16(),
            message,
        });

        (status, body).into_response()
    }
}

impl From<PlanError> for AppError {
    fn from(err: PlanError) -> Self {
        match err {
            PlanError::Validation(msg) => AppError::BadRequest(msg),
            PlanError::NotFound => AppError::NotFound,
            PlanError::Internal(err) => AppError::Internal(err),
        }
    }
}

impl From<PostError> for AppError {
    fn from(err: PostError) -> Self {
        match err {
            PostError::Validation(msg) => AppError::BadRequest(msg),
            PostError::NotFound => AppError::NotFound,
            PostError::Internal(err) => AppError::Internal(err),
        }
    }
}

impl From<SiteConfigError> for AppError {
    fn from(err: SiteConfigError) -> Self {
        match err {
            SiteConfigError::Internal(err) => AppError::Internal(err),
        }
    }
}

impl From<AdminAuthError> for AppError {
    fn from(err: AdminAuthError) -> Self {
        match err {
            AdminAuthError::InvalidCredentials => AppError::Unauthorized,
            AdminAuthError::AccountLocked { .. } => AppError::Forbidden,
            AdminAuthError::Validation(msg) => AppError::BadRequest(msg),
            AdminAuthError::Internal(err) => AppError::Internal(err),
        }
    }
}
