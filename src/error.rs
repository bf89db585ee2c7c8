//! Typed errors and HTTP mapping into the response envelope.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::collections::BTreeMap;
use thiserror::Error;

/// Per-field validation messages, keyed by field name.
pub type ValidationErrors = BTreeMap<String, Vec<String>>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("method not allowed: {0}")]
    MethodNotAllowed(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("validation failed")]
    Validation(ValidationErrors),
    #[error("too many requests: {0}")]
    TooManyRequests(String),
    #[error("internal error: {0}")]
    Internal(String),
    #[error("service unavailable: {0}")]
    Unavailable(String),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("password hash: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}

impl AppError {
    /// Stable error code plus HTTP status for the envelope.
    pub fn code_and_status(&self) -> (&'static str, StatusCode) {
        match self {
            AppError::BadRequest(_) => ("BAD_REQUEST", StatusCode::BAD_REQUEST),
            AppError::Unauthenticated(_) => ("UNAUTHENTICATED", StatusCode::UNAUTHORIZED),
            AppError::Forbidden(_) => ("FORBIDDEN", StatusCode::FORBIDDEN),
            AppError::NotFound(_) => ("NOT_FOUND", StatusCode::NOT_FOUND),
            AppError::MethodNotAllowed(_) => ("METHOD_NOT_ALLOWED", StatusCode::METHOD_NOT_ALLOWED),
            AppError::Conflict(_) => ("CONFLICT", StatusCode::CONFLICT),
            AppError::Validation(_) => ("UNPROCESSABLE_ENTITY", StatusCode::UNPROCESSABLE_ENTITY),
            AppError::TooManyRequests(_) => ("TOO_MANY_REQUESTS", StatusCode::TOO_MANY_REQUESTS),
            AppError::Internal(_) | AppError::Hash(_) => {
                ("INTERNAL_SERVER_ERROR", StatusCode::INTERNAL_SERVER_ERROR)
            }
            AppError::Unavailable(_) => ("SERVICE_UNAVAILABLE", StatusCode::SERVICE_UNAVAILABLE),
            AppError::Db(e) => match e {
                sqlx::Error::RowNotFound => ("NOT_FOUND", StatusCode::NOT_FOUND),
                sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
                    ("CONFLICT", StatusCode::CONFLICT)
                }
                _ => ("INTERNAL_SERVER_ERROR", StatusCode::INTERNAL_SERVER_ERROR),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (code, status) = self.code_and_status();

        // Internal details stay in the server log; the client gets a generic message.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
            "Internal server error".to_string()
        } else {
            match &self {
                AppError::Validation(_) => "The given data was invalid".to_string(),
                AppError::Db(sqlx::Error::Database(_)) => {
                    "A record with these values already exists".to_string()
                }
                other => other.to_string(),
            }
        };

        let validation_errors = match self {
            AppError::Validation(errors) => Some(errors),
            _ => None,
        };

        let body = crate::response::error_body(code, &message, Vec::new(), validation_errors);
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_expected_statuses() {
        let cases = [
            (AppError::BadRequest("x".into()), "BAD_REQUEST", 400),
            (AppError::Unauthenticated("x".into()), "UNAUTHENTICATED", 401),
            (AppError::Forbidden("x".into()), "FORBIDDEN", 403),
            (AppError::NotFound("x".into()), "NOT_FOUND", 404),
            (AppError::MethodNotAllowed("x".into()), "METHOD_NOT_ALLOWED", 405),
            (AppError::Conflict("x".into()), "CONFLICT", 409),
            (AppError::Validation(ValidationErrors::new()), "UNPROCESSABLE_ENTITY", 422),
            (AppError::TooManyRequests("x".into()), "TOO_MANY_REQUESTS", 429),
            (AppError::Internal("x".into()), "INTERNAL_SERVER_ERROR", 500),
            (AppError::Unavailable("x".into()), "SERVICE_UNAVAILABLE", 503),
        ];
        for (err, code, status) in cases {
            let (c, s) = err.code_and_status();
            assert_eq!(c, code);
            assert_eq!(s.as_u16(), status);
        }
    }

    #[test]
    fn row_not_found_maps_to_not_found() {
        let (code, status) = AppError::Db(sqlx::Error::RowNotFound).code_and_status();
        assert_eq!(code, "NOT_FOUND");
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
