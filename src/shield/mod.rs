//! Security layer evaluated before any business logic: sliding-window rate
//! limiting plus the hosted bot/shield service.
//!
//! Denial precedence is fixed and short-circuiting: the local rate limit is
//! checked first (cheapest), then the remote bot verdict, then the shield
//! verdict. A deny writes the one and only response for the request.

pub mod client;
pub mod rate_limit;

pub use client::{RequestContext, ShieldClient, Verdict};
pub use rate_limit::{RateLimitConfig, RateLimiter};

use actix_web::body::{BoxBody, MessageBody};
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::http::header::USER_AGENT;
use actix_web::middleware::Next;
use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::{error, warn};

use crate::auth::cookie::COOKIE_NAME;
use crate::AppState;

pub async fn security_middleware(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<BoxBody>, actix_web::Error> {
    let Some(state) = req.app_data::<web::Data<AppState>>().cloned() else {
        error!("Security middleware running without application state");
        return Ok(deny(req, middleware_failure()));
    };

    let ip = req
        .connection_info()
        .realip_remote_addr()
        .unwrap_or("unknown")
        .to_string();
    let user_agent = req
        .headers()
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    let path = req.path().to_string();
    let method = req.method().to_string();

    // Caller identity: a valid session cookie keys the window by user id and
    // role; everything else counts as a guest keyed by IP.
    let (role, key) = match req
        .request()
        .cookie(COOKIE_NAME)
        .and_then(|c| state.tokens.verify(c.value()).ok())
    {
        Some(claims) => (claims.role, claims.sub),
        None => ("guest".to_string(), ip.clone()),
    };

    if !state.limiter.check(&key, &role).await {
        warn!("Rate limit exceeded for {} ({}) on {}", key, role, path);
        let limit = state.limiter.limit_for(&role);
        let resp = HttpResponse::Forbidden().json(json!({
            "error": rate_limit_message(&role, limit),
        }));
        return Ok(deny(req, resp));
    }

    let context = RequestContext {
        ip,
        user_agent,
        path,
        method,
    };
    match state.shield.evaluate(&context).await {
        Ok(Verdict::Allow) => {}
        Ok(Verdict::DenyBot) => {
            warn!(
                "Blocked bot request from {} on {} (user-agent: {})",
                context.ip, context.path, context.user_agent
            );
            let resp = HttpResponse::Forbidden().json(json!({
                "error": "Access denied: Bot traffic is not allowed.",
            }));
            return Ok(deny(req, resp));
        }
        Ok(Verdict::DenyShield) => {
            warn!(
                "Shield blocked request from {} to {} {}",
                context.ip, context.method, context.path
            );
            let resp = HttpResponse::Forbidden().json(json!({
                "error": "Access denied: Request blocked by shield policy.",
            }));
            return Ok(deny(req, resp));
        }
        Err(e) => {
            error!("Protection service error: {}", e);
            return Ok(deny(req, middleware_failure()));
        }
    }

    next.call(req)
        .await
        .map(ServiceResponse::map_into_boxed_body)
}

/// Brute-force guard scoped to the sign-in route: a fixed per-IP attempt
/// budget on top of the global per-role window. Every attempt counts,
/// including ones that fail validation.
pub async fn sign_in_throttle(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<BoxBody>, actix_web::Error> {
    let Some(state) = req.app_data::<web::Data<AppState>>().cloned() else {
        error!("Sign-in throttle running without application state");
        return Ok(deny(req, middleware_failure()));
    };

    let ip = req
        .connection_info()
        .realip_remote_addr()
        .unwrap_or("unknown")
        .to_string();

    if !state.signin_limiter.check(&ip, "sign-in").await {
        warn!("Sign-in attempt limit exceeded for {}", ip);
        let resp = HttpResponse::TooManyRequests().json(json!({
            "error": "Too many sign-in attempts, please try again later.",
        }));
        return Ok(deny(req, resp));
    }

    next.call(req)
        .await
        .map(ServiceResponse::map_into_boxed_body)
}

fn deny(req: ServiceRequest, resp: HttpResponse) -> ServiceResponse<BoxBody> {
    req.into_response(resp).map_into_boxed_body()
}

fn middleware_failure() -> HttpResponse {
    HttpResponse::InternalServerError().json(json!({
        "error": "Internal server error",
        "message": "Something went wrong with the security middleware.",
    }))
}

fn rate_limit_message(role: &str, limit: u32) -> String {
    let label = match role {
        "admin" => "Admin",
        "user" => "User",
        _ => "Guest",
    };
    format!(
        "{} rate limit exceeded ({} per minute). Please slow down.",
        label, limit
    )
}
