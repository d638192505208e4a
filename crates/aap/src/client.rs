//! HTTP client for a single orchestrator instance.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Timeout for status reads (`GET /jobs/{id}/`, connectivity probe).
const READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for job launches; the orchestrator does template expansion
/// before answering, so launches get a little longer.
const LAUNCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Error bodies are truncated to this length before being carried in an
/// [`AapError`]; full bodies go to the log only.
const MAX_ERROR_BODY: usize = 500;

/// Client for the orchestrator REST API, authenticated with a bearer
/// token.
pub struct AapClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

/// Response from `POST /job_templates/{id}/launch/`.
#[derive(Debug, Deserialize)]
pub struct LaunchResponse {
    /// Orchestrator-assigned job identifier.
    pub id: i64,
    /// Relative URL of the created job resource.
    pub url: Option<String>,
}

/// Response from `GET /jobs/{id}/`.
#[derive(Debug, Deserialize)]
pub struct JobDetail {
    /// Orchestrator-native status string (mapped to the canonical enum by
    /// the caller).
    pub status: String,
    #[serde(default)]
    pub started: Option<DateTime<Utc>>,
    #[serde(default)]
    pub finished: Option<DateTime<Utc>>,
    /// Number of hosts the run failed on.
    #[serde(default)]
    pub failed: u32,
    /// Numeric id of the job template this run was launched from.
    #[serde(default)]
    pub job_template: Option<i64>,
    #[serde(default)]
    pub extra_vars: Option<serde_json::Value>,
    #[serde(default)]
    pub result_stdout: Option<String>,
    #[serde(default)]
    pub job_explanation: Option<String>,
}

/// Errors from the orchestrator REST layer.
#[derive(Debug, thiserror::Error)]
pub enum AapError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The orchestrator returned a non-2xx status code.
    #[error("Orchestrator API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Truncated response body.
        body: String,
    },
}

impl AapError {
    /// HTTP status for API errors, if the orchestrator answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Request(e) => e.status().map(|s| s.as_u16()),
        }
    }

    /// True when the underlying request timed out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Request(e) if e.is_timeout())
    }
}

impl AapClient {
    /// Create a client for one orchestrator instance.
    ///
    /// * `base_url` - e.g. `https://orchestrator.internal` (no trailing
    ///   slash needed; one is stripped if present).
    /// * `token`    - bearer token used on every request.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, token)
    }

    /// Create a client reusing an existing [`reqwest::Client`] for
    /// connection pooling.
    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            client,
            base_url,
            token: token.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Probe API connectivity without launching anything.
    ///
    /// Sends `GET /api/v2/` and returns the advertised `Api-Version`
    /// header when present.
    pub async fn ping(&self) -> Result<Option<String>, AapError> {
        let response = self
            .client
            .get(format!("{}/api/v2/", self.base_url))
            .bearer_auth(&self.token)
            .timeout(READ_TIMEOUT)
            .send()
            .await?;

        let response = Self::ensure_success(response).await?;
        Ok(response
            .headers()
            .get("Api-Version")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string))
    }

    /// Launch a job template with the given parameter payload.
    ///
    /// Sends `POST /api/v2/job_templates/{template_id}/launch/` with body
    /// `{"extra_vars": ...}`.
    pub async fn launch_job(
        &self,
        template_id: &str,
        extra_vars: &serde_json::Value,
    ) -> Result<LaunchResponse, AapError> {
        let body = serde_json::json!({ "extra_vars": extra_vars });

        let response = self
            .client
            .post(format!(
                "{}/api/v2/job_templates/{}/launch/",
                self.base_url, template_id
            ))
            .bearer_auth(&self.token)
            .timeout(LAUNCH_TIMEOUT)
            .json(&body)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Fetch the live state of a job.
    ///
    /// Sends `GET /api/v2/jobs/{job_id}/`.
    pub async fn get_job(&self, job_id: &str) -> Result<JobDetail, AapError> {
        let response = self
            .client
            .get(format!("{}/api/v2/jobs/{}/", self.base_url, job_id))
            .bearer_auth(&self.token)
            .timeout(READ_TIMEOUT)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. On failure, logs the
    /// full body and returns an [`AapError::Api`] carrying a truncated
    /// copy.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, AapError> {
        let status = response.status();
        if !status.is_success() {
            let mut body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            tracing::error!(status = status.as_u16(), body = %body, "Orchestrator error response");
            body.truncate(MAX_ERROR_BODY);
            return Err(AapError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, AapError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}
