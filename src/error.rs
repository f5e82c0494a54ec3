use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;

use crate::calc::CalcError;

/// MySQL SQLSTATE for integrity constraint violations (duplicate key, FK).
const INTEGRITY_VIOLATION: &str = "23000";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Calc(#[from] CalcError),

    #[error("Internal Server Error")]
    Database(#[from] sqlx::Error),

    #[error("Internal Server Error")]
    Internal(String),
}

impl ApiError {
    /// Turns an integrity violation into a 409 with `message`, anything else
    /// into a 500.
    pub fn from_write(err: sqlx::Error, message: &str) -> Self {
        if is_integrity_violation(&err) {
            ApiError::Conflict(message.to_string())
        } else {
            ApiError::Database(err)
        }
    }
}

pub fn is_integrity_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some(INTEGRITY_VIOLATION),
        _ => false,
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Calc(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "message": self.to_string()
        }))
    }
}
