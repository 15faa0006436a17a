//! Error types for the search engine core.
//!
//! - `AppError`: the domain error kinds, translated to HTTP status +
//!   `{result:false, error}` body at the route boundary.
//! - `Result<T>`: alias for `Result<T, AppError>`.

use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

/// Domain-specific errors for indexing and search operations.
#[derive(Debug, Error)]
pub enum AppError {
    /// User input error: empty query, already-running start, not-running
    /// stop, page outside configured sites. Does not alter state.
    #[error("{0}")]
    BadRequest(String),

    /// Query succeeded but matched zero pages.
    #[error("not found")]
    NotFound,

    /// An unchecked failure escaped a PageTask's recursive section.
    #[error("task failed abnormally: {0}")]
    TaskAbnormal(String),

    /// Anything else escaping the indexing/search pipeline.
    #[error("{0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Serialize)]
struct ErrorBody {
    result: bool,
    error: String,
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let body = ErrorBody {
            result: false,
            error: self.to_string(),
        };
        match self {
            AppError::BadRequest(_) => HttpResponse::BadRequest().json(body),
            AppError::NotFound => HttpResponse::NotFound().json(body),
            AppError::TaskAbnormal(_) | AppError::Internal(_) => {
                HttpResponse::InternalServerError().json(body)
            }
        }
    }
}
