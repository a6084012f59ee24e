use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::response::Meta;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("Email already registered")]
    DuplicateEmail,

    #[error("Category already exists")]
    DuplicateName,

    #[error("Product already exists in this category")]
    DuplicateProduct,

    #[error("Not Found")]
    NotFound,

    #[error("Email not found")]
    UnknownEmail,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid old password")]
    InvalidOldPassword,

    #[error("Invalid or expired OTP")]
    InvalidOtp,

    #[error("New password cannot be same as old password")]
    SamePassword,

    #[error("{0}")]
    Unauthorized(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Database error")]
    DbError(#[from] sqlx::Error),

    #[error("Serialization error")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::InvalidOtp | AppError::SamePassword => {
                StatusCode::BAD_REQUEST
            }
            AppError::DuplicateEmail | AppError::DuplicateName | AppError::DuplicateProduct => {
                StatusCode::CONFLICT
            }
            AppError::NotFound | AppError::UnknownEmail => StatusCode::NOT_FOUND,
            AppError::InvalidCredentials
            | AppError::InvalidOldPassword
            | AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::DbError(_) | AppError::Serialization(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
    detail: String,
    data: Option<()>,
    meta: Option<Meta>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
        }

        let message = self.to_string();
        let body = ErrorBody {
            detail: message.clone(),
            message,
            data: None,
            meta: Some(Meta::empty()),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
