use thiserror::Error;
use actix_web::{ResponseError, HttpResponse, http::StatusCode};
use serde::Serialize;
use serde_json::json;

/// One field-level validation failure, as returned in 400 bodies.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Security middleware error: {0}")]
    Security(String),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Email already in use")]
    EmailExists,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("Password hashing error")]
    Hashing,
}

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Token expired")]
    Expired,

    #[error("Invalid token")]
    Invalid,

    #[error("No signing secret configured")]
    MissingSecret,
}

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error("Record not found")]
    NotFound,

    #[error("Duplicate record")]
    Duplicate,
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::Database(DatabaseError::NotFound),
            sqlx::Error::Database(e) if e.is_unique_violation() => {
                AppError::Database(DatabaseError::Duplicate)
            }
            _ => AppError::Database(DatabaseError::QueryError(err.to_string())),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid,
        }
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(_: bcrypt::BcryptError) -> Self {
        // Drops the cause: a malformed hash and a primitive failure must be
        // indistinguishable to callers.
        AppError::Auth(AuthError::Hashing)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let body = match self {
            AppError::Validation(details) => json!({
                "error": "Validation failed",
                "details": details,
            }),
            AppError::Auth(AuthError::EmailExists) => json!({
                "error": "Email already in use."
            }),
            // Not-found and wrong-password share one body so responses cannot
            // be used to enumerate registered emails.
            AppError::Auth(AuthError::UserNotFound)
            | AppError::Auth(AuthError::InvalidCredentials) => json!({
                "error": "Invalid email or password."
            }),
            AppError::Token(TokenError::Expired) | AppError::Token(TokenError::Invalid) => {
                json!({ "error": "Invalid or expired token." })
            }
            AppError::Security(_) => json!({
                "error": "Internal server error",
                "message": "Something went wrong with the security middleware.",
            }),
            // Storage, config and unexpected failures stay opaque.
            _ => json!({ "error": "Internal server error" }),
        };
        HttpResponse::build(status).json(body)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Auth(AuthError::EmailExists) => StatusCode::CONFLICT,
            AppError::Auth(AuthError::UserNotFound)
            | AppError::Auth(AuthError::InvalidCredentials) => StatusCode::UNAUTHORIZED,
            AppError::Auth(AuthError::Hashing) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Token(TokenError::Expired) | AppError::Token(TokenError::Invalid) => {
                StatusCode::UNAUTHORIZED
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
