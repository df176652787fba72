use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::{error, info};

use crate::auth::cookie;
use crate::auth::validation::{
    validate_sign_in, validate_sign_up, SignInRequest, SignUpRequest,
};
use crate::error::AppError;
use crate::AppState;

pub async fn sign_up(
    req: web::Json<SignUpRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let data = validate_sign_up(&req).map_err(AppError::Validation)?;

    let user = match state.auth.register(data).await {
        Ok(user) => user,
        Err(e) => {
            error!("Sign-up failed: {}", e);
            return Err(e);
        }
    };

    let token = state.tokens.issue(&user)?;
    let session = cookie::session_cookie(
        token,
        state.tokens.expiry(),
        state.config.auth.cookie_secure,
    );

    info!("User signed up: {} ({}) with role {}", user.name, user.email, user.role);
    Ok(HttpResponse::Created().cookie(session).json(json!({
        "message": "User registered successfully",
        "user": user,
    })))
}

pub async fn sign_in(
    req: web::Json<SignInRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let data = validate_sign_in(&req).map_err(AppError::Validation)?;

    let user = match state.auth.authenticate(data).await {
        Ok(user) => user,
        Err(e) => {
            error!("Sign-in failed: {}", e);
            return Err(e);
        }
    };

    let token = state.tokens.issue(&user)?;
    let session = cookie::session_cookie(
        token,
        state.tokens.expiry(),
        state.config.auth.cookie_secure,
    );

    info!("User signed in: {} ({})", user.name, user.email);
    Ok(HttpResponse::Ok().cookie(session).json(json!({
        "message": "User signed in successfully",
        "user": user,
    })))
}

/// Idempotent: clearing the cookie succeeds whether or not a session exists.
pub async fn sign_out() -> Result<HttpResponse, AppError> {
    info!("User signed out");
    Ok(HttpResponse::Ok().cookie(cookie::removal_cookie()).json(json!({
        "message": "User signed out successfully",
    })))
}
