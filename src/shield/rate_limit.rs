use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub window_size: Duration,
    /// Requests allowed per window, by caller role.
    pub limits: HashMap<String, u32>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        let mut limits = HashMap::new();
        limits.insert("admin".to_string(), 20);
        limits.insert("user".to_string(), 10);
        limits.insert("guest".to_string(), 5);

        Self {
            window_size: Duration::seconds(60),
            limits,
        }
    }
}

impl RateLimitConfig {
    /// Brute-force budget for the sign-in route: 5 attempts per 15 minutes,
    /// keyed by IP regardless of role. Applied on top of the global window.
    pub fn sign_in() -> Self {
        let mut limits = HashMap::new();
        limits.insert("sign-in".to_string(), 5);

        Self {
            window_size: Duration::minutes(15),
            limits,
        }
    }
}

#[derive(Debug)]
struct RequestWindow {
    timestamps: Vec<DateTime<Utc>>,
}

impl RequestWindow {
    fn new() -> Self {
        Self {
            timestamps: Vec::new(),
        }
    }

    fn cleanup_old_requests(&mut self, window_size: Duration) {
        let cutoff = Utc::now() - window_size;
        self.timestamps.retain(|ts| *ts > cutoff);
    }

    fn add_request(&mut self) {
        self.timestamps.push(Utc::now());
    }

    fn request_count(&self) -> usize {
        self.timestamps.len()
    }
}

/// Sliding-window throttle keyed by caller identity (user id for
/// authenticated callers, IP for guests).
#[derive(Clone)]
pub struct RateLimiter {
    windows: Arc<RwLock<HashMap<String, RequestWindow>>>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            windows: Arc::new(RwLock::new(HashMap::new())),
            config,
        }
    }

    pub fn limit_for(&self, role: &str) -> u32 {
        self.config
            .limits
            .get(role)
            .or_else(|| self.config.limits.get("guest"))
            .copied()
            .unwrap_or(0)
    }

    /// Records the request and reports whether it is within the role's limit.
    pub async fn check(&self, key: &str, role: &str) -> bool {
        let limit = self.limit_for(role);

        let mut windows = self.windows.write().await;
        let window = windows
            .entry(key.to_string())
            .or_insert_with(RequestWindow::new);

        window.cleanup_old_requests(self.config.window_size);

        if window.request_count() < limit as usize {
            window.add_request();
            true
        } else {
            false
        }
    }

    /// Drops windows with no recent requests; run periodically.
    pub async fn cleanup(&self) {
        let mut windows = self.windows.write().await;
        windows.retain(|_, window| {
            window.cleanup_old_requests(self.config.window_size);
            !window.timestamps.is_empty()
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{sleep, Duration as TokioDuration};

    #[tokio::test]
    async fn test_guest_sixth_request_denied() {
        let limiter = RateLimiter::new(RateLimitConfig::default());

        for _ in 0..5 {
            assert!(limiter.check("203.0.113.9", "guest").await);
        }
        assert!(!limiter.check("203.0.113.9", "guest").await);
    }

    #[tokio::test]
    async fn test_admin_allows_twenty_then_denies() {
        let limiter = RateLimiter::new(RateLimitConfig::default());

        for _ in 0..20 {
            assert!(limiter.check("admin-1", "admin").await);
        }
        assert!(!limiter.check("admin-1", "admin").await);
    }

    #[tokio::test]
    async fn test_user_limit_is_ten() {
        let limiter = RateLimiter::new(RateLimitConfig::default());

        for _ in 0..10 {
            assert!(limiter.check("user-1", "user").await);
        }
        assert!(!limiter.check("user-1", "user").await);
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let limiter = RateLimiter::new(RateLimitConfig::default());

        for _ in 0..5 {
            assert!(limiter.check("203.0.113.1", "guest").await);
        }
        assert!(!limiter.check("203.0.113.1", "guest").await);
        assert!(limiter.check("203.0.113.2", "guest").await);
    }

    #[tokio::test]
    async fn test_sign_in_budget_is_five_per_window() {
        let limiter = RateLimiter::new(RateLimitConfig::sign_in());

        for _ in 0..5 {
            assert!(limiter.check("203.0.113.9", "sign-in").await);
        }
        assert!(!limiter.check("203.0.113.9", "sign-in").await);
        // Other callers keep their own budget
        assert!(limiter.check("203.0.113.10", "sign-in").await);
    }

    #[tokio::test]
    async fn test_unknown_role_falls_back_to_guest_limit() {
        let limiter = RateLimiter::new(RateLimitConfig::default());
        assert_eq!(limiter.limit_for("superuser"), 5);
    }

    #[tokio::test]
    async fn test_window_slides() {
        let mut config = RateLimitConfig::default();
        // Shorter window so the test does not wait a minute
        config.window_size = Duration::seconds(1);
        let limiter = RateLimiter::new(config);

        for _ in 0..5 {
            assert!(limiter.check("203.0.113.9", "guest").await);
        }
        assert!(!limiter.check("203.0.113.9", "guest").await);

        sleep(TokioDuration::from_millis(1100)).await;

        assert!(limiter.check("203.0.113.9", "guest").await);
    }

    #[tokio::test]
    async fn test_cleanup_drops_idle_windows() {
        let mut config = RateLimitConfig::default();
        config.window_size = Duration::seconds(1);
        let limiter = RateLimiter::new(config);

        limiter.check("203.0.113.9", "guest").await;
        sleep(TokioDuration::from_millis(1100)).await;
        limiter.cleanup().await;

        assert!(limiter.windows.read().await.is_empty());
    }
}
