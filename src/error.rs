//!
//! # Custom Error Handling
//!
//! This module defines the custom error type `AppError` used throughout the application.
//! It centralizes error management, providing a consistent way to handle and represent
//! the error conditions that can occur, from database and image-store failures to
//! validation problems.
//!
//! `AppError` implements `actix_web::error::ResponseError`, rendering every error as the
//! standard response envelope (`{status, message, body: null}`) with a matching HTTP status.
//! It also provides `From` implementations for `sqlx::Error`, `validator::ValidationErrors`,
//! `jsonwebtoken::errors::Error`, `bcrypt::BcryptError` and `ImageStoreError`, allowing for
//! easy conversion using the `?` operator.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use std::fmt;
use validator::ValidationErrors;

use crate::images::ImageStoreError;
use crate::response::ApiResponse;

/// Represents all possible errors that can occur within the application.
///
/// Each variant corresponds to a specific type of error, carrying a message
/// detailing the issue. These errors are then converted into envelope responses.
#[derive(Debug)]
pub enum AppError {
    /// Authentication failed or is missing (HTTP 401).
    Unauthorized(String),
    /// Malformed or inconsistent request (HTTP 400).
    BadRequest(String),
    /// The requested resource does not exist (HTTP 404).
    NotFound(String),
    /// Unexpected server-side error (HTTP 500).
    InternalServerError(String),
    /// Error originating from the persistence layer (HTTP 500).
    DatabaseError(String),
    /// Error originating from the hosted image service (HTTP 500).
    ImageStoreError(String),
    /// Input failed validation (HTTP 422 Unprocessable Entity).
    ValidationError(String),
}

impl AppError {
    /// The message carried by the error, without the variant prefix.
    pub fn message(&self) -> &str {
        match self {
            AppError::Unauthorized(msg)
            | AppError::BadRequest(msg)
            | AppError::NotFound(msg)
            | AppError::InternalServerError(msg)
            | AppError::DatabaseError(msg)
            | AppError::ImageStoreError(msg)
            | AppError::ValidationError(msg) => msg,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database Error: {}", msg),
            AppError::ImageStoreError(msg) => write!(f, "Image Store Error: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation Error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

/// Converts `AppError` variants into envelope responses.
///
/// Server-side failures keep their original message in the envelope and are logged.
impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::InternalServerError(_)
            | AppError::DatabaseError(_)
            | AppError::ImageStoreError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut envelope = ApiResponse::<()>::empty();
        match self {
            AppError::Unauthorized(msg) => envelope.to_unauthorized(msg),
            AppError::NotFound(msg) => envelope.to_not_found(msg),
            AppError::InternalServerError(msg)
            | AppError::DatabaseError(msg)
            | AppError::ImageStoreError(msg) => {
                log::error!("{}", self);
                envelope.to_server_error(msg)
            }
            AppError::BadRequest(msg) | AppError::ValidationError(msg) => {
                envelope.set_status(self.status_code(), msg)
            }
        }
        envelope.into_http_response()
    }
}

/// Converts `sqlx::Error` into `AppError`.
///
/// `RowNotFound` maps to `NotFound` and unique-constraint violations to `BadRequest`;
/// every other database error becomes `DatabaseError`.
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        match error {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".into()),
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                AppError::BadRequest(format!("Duplicate value: {}", db.message()))
            }
            _ => AppError::DatabaseError(error.to_string()),
        }
    }
}

/// Converts `validator::ValidationErrors` into `AppError::ValidationError`.
impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        AppError::ValidationError(error.to_string())
    }
}

/// Converts `jsonwebtoken::errors::Error` into `AppError::Unauthorized`.
impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(error: jsonwebtoken::errors::Error) -> AppError {
        AppError::Unauthorized(error.to_string())
    }
}

/// Converts `bcrypt::BcryptError` into `AppError::InternalServerError`.
impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> AppError {
        AppError::InternalServerError(error.to_string())
    }
}

impl From<ImageStoreError> for AppError {
    fn from(error: ImageStoreError) -> AppError {
        AppError::ImageStoreError(error.to_string())
    }
}
