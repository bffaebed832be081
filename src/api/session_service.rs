//! HTTP client for the coaching backend.
//!
//! Two endpoints are used:
//! - `POST {base}/api/interview/initialize` provisions an ephemeral token,
//!   tool declarations and audio configuration for one session
//! - `POST {base}/api/interview/report` turns a finished transcript into an
//!   [`InterviewReport`]

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use url::Url;
use zeroize::Zeroize;

use super::types::{
    BackendResponse, EphemeralSessionData, GenerateReportRequest, InterviewReport,
    InterviewSetup, ReportResponse, ReportTurn,
};
use crate::config::ClientConfig;
use crate::core::realtime::{RealtimeError, RealtimeResult, SessionProvisioner};

const INITIALIZE_PATH: &str = "api/interview/initialize";
const REPORT_PATH: &str = "api/interview/report";

/// Default request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors from the report endpoint.
///
/// Report failures never affect the transcript they were generated from.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Nothing to report: transcript has no visible turns")]
    EmptyTranscript,

    #[error("Report request failed: {0}")]
    Request(String),

    #[error("Report endpoint returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("{0}")]
    Rejected(String),
}

/// Client for the provisioning and report endpoints.
pub struct SessionService {
    base_url: Url,
    client: reqwest::Client,
    timeout: Duration,
    api_token: Option<String>,
}

impl SessionService {
    /// Create a client for `base_url`. Only http and https URLs are accepted.
    pub fn new(base_url: &str) -> RealtimeResult<Self> {
        let base_url = Url::parse(base_url).map_err(|e| {
            RealtimeError::InvalidConfiguration(format!("Invalid API base URL '{base_url}': {e}"))
        })?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(RealtimeError::InvalidConfiguration(format!(
                "Unsupported API base URL scheme: {}",
                base_url.scheme()
            )));
        }

        Ok(Self {
            base_url,
            client: reqwest::Client::new(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
            api_token: None,
        })
    }

    pub fn from_config(config: &ClientConfig) -> RealtimeResult<Self> {
        let mut service = Self::new(&config.api_base_url)?.with_timeout(config.request_timeout());
        if let Some(token) = &config.api_token {
            service = service.with_api_token(token.clone());
        }
        Ok(service)
    }

    /// Set the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Bearer token sent with every request
    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into()).filter(|t: &String| !t.is_empty());
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    fn post(&self, url: &str) -> reqwest::RequestBuilder {
        let request = self
            .client
            .post(url)
            .timeout(self.timeout)
            .header("Content-Type", "application/json");
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Provision everything needed to open one session.
    pub async fn fetch_ephemeral_session(
        &self,
        setup: &InterviewSetup,
    ) -> RealtimeResult<EphemeralSessionData> {
        let url = self.endpoint(INITIALIZE_PATH);
        tracing::debug!(url = %url, talent_id = %setup.talent_id, "Provisioning realtime session");

        let response = self.post(&url).json(setup).send().await.map_err(|e| {
            RealtimeError::ProvisioningFailed(format!("Failed to fetch ephemeral session: {e}"))
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RealtimeError::ProvisioningFailed(format!(
                "Failed to fetch ephemeral session: HTTP {status}"
            )));
        }

        let body: BackendResponse<EphemeralSessionData> = response.json().await.map_err(|e| {
            RealtimeError::SerializationError(format!("Invalid provisioning response: {e}"))
        })?;

        if !body.successful {
            return Err(RealtimeError::ProvisioningFailed(
                body.error
                    .unwrap_or_else(|| "Failed to fetch ephemeral session".to_string()),
            ));
        }

        match body.data {
            Some(data) if !data.ephemeral_token.is_empty() => {
                tracing::info!("Provisioned session with {} tools", data.tools.len());
                Ok(data)
            }
            _ => Err(RealtimeError::ProvisioningFailed(
                "No ephemeral token provided by the server".to_string(),
            )),
        }
    }

    /// Generate an interview report from visible transcript turns.
    pub async fn generate_report(
        &self,
        setup: &InterviewSetup,
        transcription: Vec<ReportTurn>,
    ) -> Result<InterviewReport, ReportError> {
        if transcription.is_empty() {
            return Err(ReportError::EmptyTranscript);
        }

        let url = self.endpoint(REPORT_PATH);
        let request = GenerateReportRequest {
            talent_id: setup.talent_id.clone(),
            job_id: setup.job_id.clone(),
            transcription,
        };
        tracing::debug!(url = %url, turns = request.transcription.len(), "Requesting interview report");

        let response = self
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ReportError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ReportError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body: ReportResponse = response
            .json()
            .await
            .map_err(|e| ReportError::Request(format!("Failed to parse response: {e}")))?;

        match (body.successful, body.data) {
            (true, Some(report)) => Ok(report),
            (_, _) => Err(ReportError::Rejected(
                body.error
                    .map(|e| e.message)
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| "Failed to generate report".to_string()),
            )),
        }
    }
}

impl std::fmt::Debug for SessionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionService")
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .field("api_token", &self.api_token.as_ref().map(|_| "***"))
            .finish()
    }
}

impl Drop for SessionService {
    fn drop(&mut self) {
        if let Some(token) = self.api_token.as_mut() {
            token.zeroize();
        }
    }
}

#[async_trait]
impl SessionProvisioner for SessionService {
    async fn provision(&self, setup: &InterviewSetup) -> RealtimeResult<EphemeralSessionData> {
        self.fetch_ephemeral_session(setup).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_invalid_base_url() {
        assert!(matches!(
            SessionService::new("not a url"),
            Err(RealtimeError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            SessionService::new("ftp://example.com"),
            Err(RealtimeError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_endpoint_joins_paths() {
        let service = SessionService::new("http://localhost:8000/").unwrap();
        assert_eq!(
            service.endpoint(INITIALIZE_PATH),
            "http://localhost:8000/api/interview/initialize"
        );

        let service = SessionService::new("https://coach.example.com/v2").unwrap();
        assert_eq!(
            service.endpoint(REPORT_PATH),
            "https://coach.example.com/v2/api/interview/report"
        );
    }

    #[test]
    fn test_builder_and_debug_redaction() {
        let service = SessionService::new("http://localhost:8000")
            .unwrap()
            .with_timeout(Duration::from_secs(5))
            .with_api_token("secret");
        assert_eq!(service.timeout(), Duration::from_secs(5));
        let debug = format!("{service:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("***"));
    }
}
