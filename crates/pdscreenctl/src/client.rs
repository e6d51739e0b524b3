//! HTTP client for communicating with pdscreend.

use anyhow::{anyhow, Context, Result};
use pdscreen_common::{Decision, ErrorBody, HealthResponse};
use serde_json::Value;
use std::time::Duration;

/// Default daemon address
pub const DEFAULT_URL: &str = "http://127.0.0.1:5000";

/// Environment variable overriding the daemon address
pub const URL_ENV: &str = "PDSCREEN_URL";

/// Result of a `/predict` call that reached the daemon
#[derive(Debug, Clone, PartialEq)]
pub enum PredictOutcome {
    Decision(Decision),
    Rejected { status: u16, body: ErrorBody },
}

/// Client for communicating with pdscreend
pub struct DaemonClient {
    client: reqwest::Client,
    base_url: String,
}

impl DaemonClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a payload to `/predict`
    pub async fn predict(&self, payload: &Value) -> Result<PredictOutcome> {
        let url = format!("{}/predict", self.base_url);
        let resp = self
            .client
            .post(&url)
            .json(payload)
            .send()
            .await
            .with_context(|| format!("Cannot reach pdscreend at {}", self.base_url))?;

        let status = resp.status();
        let text = resp.text().await.context("Failed to read response body")?;

        if status.is_success() {
            let decision: Decision = serde_json::from_str(&text)
                .with_context(|| format!("Unexpected response from pdscreend: {}", text))?;
            return Ok(PredictOutcome::Decision(decision));
        }

        let body = serde_json::from_str::<ErrorBody>(&text).unwrap_or_else(|_| ErrorBody {
            error: status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string(),
            detail: text,
        });
        Ok(PredictOutcome::Rejected {
            status: status.as_u16(),
            body,
        })
    }

    /// Fetch `/health`
    pub async fn health(&self) -> Result<HealthResponse> {
        let url = format!("{}/health", self.base_url);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Cannot reach pdscreend at {}", self.base_url))?;

        if !resp.status().is_success() {
            return Err(anyhow!("Health check failed: HTTP {}", resp.status()));
        }

        resp.json::<HealthResponse>()
            .await
            .context("Invalid health response")
    }
}
