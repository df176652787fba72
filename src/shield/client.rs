use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::{ShieldConfig, ShieldMode};
use crate::error::AppError;

const DECIDE_TIMEOUT: Duration = Duration::from_secs(2);

/// Per-request facts sent to the protection service.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub ip: String,
    pub user_agent: String,
    pub path: String,
    pub method: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    DenyBot,
    DenyShield,
}

#[derive(Serialize)]
struct DecideRequest<'a> {
    ip: &'a str,
    user_agent: &'a str,
    path: &'a str,
    method: &'a str,
}

#[derive(Deserialize)]
struct Decision {
    conclusion: String,
    #[serde(default)]
    reason: Option<String>,
}

/// Client for the hosted bot-detection and shield (generic abuse) service.
/// Rate limiting is handled locally; this client only covers the two remote
/// heuristics.
#[derive(Clone)]
pub struct ShieldClient {
    http: reqwest::Client,
    config: ShieldConfig,
}

impl ShieldClient {
    pub fn new(config: ShieldConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Evaluates the request. Bot denials for allow-listed crawlers are
    /// suppressed; in dry-run mode denials are logged but never returned.
    pub async fn evaluate(&self, request: &RequestContext) -> Result<Verdict, AppError> {
        if self.config.mode == ShieldMode::Off {
            return Ok(Verdict::Allow);
        }

        let mut verdict = self.decide(request).await?;

        if verdict == Verdict::DenyBot && self.is_allowed_bot(&request.user_agent) {
            verdict = Verdict::Allow;
        }

        if self.config.mode == ShieldMode::DryRun && verdict != Verdict::Allow {
            warn!(
                "Shield dry-run would deny {} {} from {} ({:?})",
                request.method, request.path, request.ip, verdict
            );
            return Ok(Verdict::Allow);
        }

        Ok(verdict)
    }

    async fn decide(&self, request: &RequestContext) -> Result<Verdict, AppError> {
        let response = self
            .http
            .post(format!("{}/v1/decide", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .timeout(DECIDE_TIMEOUT)
            .json(&DecideRequest {
                ip: &request.ip,
                user_agent: &request.user_agent,
                path: &request.path,
                method: &request.method,
            })
            .send()
            .await
            .map_err(|e| AppError::Security(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::Security(format!(
                "protection service returned {}",
                response.status()
            )));
        }

        let decision: Decision = response
            .json()
            .await
            .map_err(|e| AppError::Security(e.to_string()))?;

        if decision.conclusion != "DENY" {
            return Ok(Verdict::Allow);
        }
        match decision.reason.as_deref() {
            Some("BOT") => Ok(Verdict::DenyBot),
            // Any other deny (shield policy, unrecognized reasons) is treated
            // as a shield block.
            _ => Ok(Verdict::DenyShield),
        }
    }

    fn is_allowed_bot(&self, user_agent: &str) -> bool {
        self.config
            .allowed_bots
            .iter()
            .any(|allowed| user_agent.contains(allowed.as_str()))
    }
}
