use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use sqlx::postgres::{PgConnectOptions, PgSslMode};
use std::env;

use crate::error::AppError;

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub ssl: bool,
    pub max_connections: u32,
}

impl DatabaseConfig {
    pub fn connect_options(&self) -> PgConnectOptions {
        let ssl_mode = if self.ssl {
            PgSslMode::Require
        } else {
            PgSslMode::Prefer
        };
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.database)
            .ssl_mode(ssl_mode)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_expiry_days: i64,
    pub cookie_secure: bool,
}

/// Enforcement mode for the hosted protection service.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ShieldMode {
    /// Evaluate and enforce denials.
    Live,
    /// Evaluate and log, but never deny.
    DryRun,
    /// Skip the remote call entirely.
    Off,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ShieldConfig {
    pub api_key: String,
    pub base_url: String,
    pub mode: ShieldMode,
    /// User-agent fragments whose bot denials are suppressed (search-engine
    /// and link-preview crawlers).
    #[serde(default = "default_allowed_bots")]
    pub allowed_bots: Vec<String>,
}

fn default_allowed_bots() -> Vec<String> {
    [
        "Googlebot",
        "Bingbot",
        "DuckDuckBot",
        "Slackbot",
        "Discordbot",
        "Twitterbot",
        "facebookexternalhit",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub environment: String,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub shield: ShieldConfig,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            .set_default("environment", "development")?
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.workers", num_cpus::get() as i64)?
            .set_default("database.host", "localhost")?
            .set_default("database.port", 5432)?
            .set_default("database.user", "postgres")?
            .set_default("database.password", "postgres")?
            .set_default("database.database", "stones")?
            .set_default("database.ssl", false)?
            .set_default("database.max_connections", 5)?
            // Secrets have no usable default; validate() rejects empty values
            // before the server starts.
            .set_default("auth.jwt_secret", "")?
            .set_default("auth.token_expiry_days", 7)?
            .set_default("auth.cookie_secure", false)?
            .set_default("shield.api_key", "")?
            .set_default("shield.base_url", "https://decide.arcjet.com")?
            .set_default("shield.mode", "live")?
            // Add in settings from the config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Environment variables with prefix "APP_", e.g.
            // `APP_AUTH__JWT_SECRET=...` sets `Settings.auth.jwt_secret`.
            .add_source(
                Environment::with_prefix("app")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        s.try_deserialize()
    }

    /// Startup-time invariants. Missing required configuration fails here,
    /// never per-request.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.auth.jwt_secret.trim().is_empty() {
            return Err(AppError::Config(
                "auth.jwt_secret is required (APP_AUTH__JWT_SECRET)".into(),
            ));
        }
        if self.shield.mode == ShieldMode::Live && self.shield.api_key.trim().is_empty() {
            return Err(AppError::Config(
                "shield.api_key is required in live mode (APP_SHIELD__API_KEY)".into(),
            ));
        }
        if self.database.host.trim().is_empty() || self.database.database.trim().is_empty() {
            return Err(AppError::Config("database host and name are required".into()));
        }
        Ok(())
    }

    /// Fixed settings for tests: local database, test signing secret, shield
    /// off. Not `#[cfg(test)]` because integration tests in `tests/` build
    /// against the public crate; production code has no call site.
    pub fn new_for_test() -> Self {
        Self {
            environment: "test".into(),
            server: ServerConfig {
                host: "127.0.0.1".into(),
                port: 8080,
                workers: 1,
            },
            database: DatabaseConfig {
                host: "localhost".into(),
                port: 5432,
                user: "postgres".into(),
                password: "postgres".into(),
                database: "stones_test".into(),
                ssl: false,
                max_connections: 2,
            },
            auth: AuthConfig {
                jwt_secret: "test_secret".into(),
                token_expiry_days: 7,
                cookie_secure: false,
            },
            shield: ShieldConfig {
                api_key: String::new(),
                base_url: "http://127.0.0.1:0".into(),
                mode: ShieldMode::Off,
                allowed_bots: default_allowed_bots(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_missing_jwt_secret() {
        let mut settings = Settings::new_for_test();
        settings.auth.jwt_secret = String::new();
        let err = settings.validate().unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_validate_requires_shield_key_in_live_mode() {
        let mut settings = Settings::new_for_test();
        settings.shield.mode = ShieldMode::Live;
        settings.shield.api_key = String::new();
        assert!(settings.validate().is_err());

        settings.shield.api_key = "ajkey_test".into();
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_validate_accepts_test_settings() {
        let settings = Settings::new_for_test();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.auth.token_expiry_days, 7);
    }

    #[test]
    fn test_default_allowed_bots_cover_crawlers_and_previews() {
        let allowed = default_allowed_bots();
        assert!(allowed.iter().any(|a| a == "Googlebot"));
        assert!(allowed.iter().any(|a| a == "Slackbot"));
    }
}
