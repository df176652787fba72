pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod shield;

use std::sync::Arc;
use std::time::Instant;

use actix_web::{web, HttpResponse};

pub use config::Settings;
pub use error::AppError;
pub type Result<T> = std::result::Result<T, AppError>;

pub use auth::{AuthService, TokenIssuer};
pub use db::UserRepository;
pub use shield::{RateLimitConfig, RateLimiter, ShieldClient};

/// Application state shared across all request handlers and middleware.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub auth: AuthService,
    pub tokens: TokenIssuer,
    pub limiter: RateLimiter,
    pub signin_limiter: RateLimiter,
    pub shield: ShieldClient,
    started_at: Instant,
}

impl AppState {
    pub async fn new(config: Settings) -> Result<Self> {
        let repo = UserRepository::connect(&config.database).await?;
        Self::with_repository(config, repo)
    }

    /// Wires the state around an existing repository. Lets tests use a lazy
    /// pool instead of connecting at construction.
    pub fn with_repository(config: Settings, repo: UserRepository) -> Result<Self> {
        let tokens = TokenIssuer::new(&config.auth.jwt_secret, config.auth.token_expiry_days)?;
        let limiter = RateLimiter::new(RateLimitConfig::default());
        let signin_limiter = RateLimiter::new(RateLimitConfig::sign_in());
        let shield = ShieldClient::new(config.shield.clone());

        Ok(Self {
            config: Arc::new(config),
            auth: AuthService::new(repo),
            tokens,
            limiter,
            signin_limiter,
            shield,
            started_at: Instant::now(),
        })
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

pub async fn greeting() -> HttpResponse {
    HttpResponse::Ok().body("Hello from Stones API")
}

pub async fn api_status() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "message": "Stones API is running successfully"
    }))
}

/// Health check endpoint handler
/// Returns a JSON response with server status, timestamp and uptime
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "OK",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_seconds": state.uptime_seconds(),
    }))
}
