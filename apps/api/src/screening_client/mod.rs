//! Screening backend client — the single point of entry for all calls to the
//! screening backend (analysis, decision registration, audit log).
//!
//! RULE: the audit log is append-only and does not deduplicate. Decision
//! registration is therefore sent exactly once per call and never retried
//! here; only idempotent reads retry.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::analysis::{AnalysisResult, CandidateDocument};
use crate::models::assistant::{AiModel, ChatReply, ChatRequest, ModelList};
use crate::models::decision::{
    AuditLogFilter, AuditLogPage, RegisterDecisionRequest, RegisteredDecision,
};
use crate::review::submission::DecisionRecorder;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const MAX_READ_ATTEMPTS: u32 = 3;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Backend unavailable after {attempts} attempts")]
    Exhausted { attempts: u32 },

    #[error("Invalid backend URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

/// Operator identity and credentials, passed explicitly to the client
/// instead of being looked up from ambient state.
#[derive(Clone)]
pub struct Session {
    pub username: String,
    token: String,
}

impl Session {
    pub fn new(username: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            token: token.into(),
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("username", &self.username)
            .field("token", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct AnalyzeRequest<'a> {
    #[serde(rename = "jobDescription")]
    job_description: &'a str,
    candidates: &'a [CandidateDocument],
    #[serde(rename = "modelId", skip_serializing_if = "Option::is_none")]
    model_id: Option<&'a str>,
}

/// FastAPI-style error body: `{"detail": "..."}`.
#[derive(Debug, Deserialize)]
struct BackendErrorBody {
    detail: serde_json::Value,
}

#[derive(Clone)]
pub struct ScreeningClient {
    client: Client,
    base_url: Url,
    session: Session,
}

impl ScreeningClient {
    pub fn new(base_url: impl Into<String>, session: Session) -> Result<Self, ClientError> {
        let raw = base_url.into();
        let invalid = |reason: String| ClientError::InvalidBaseUrl {
            url: raw.clone(),
            reason,
        };
        let base_url = Url::parse(&raw).map_err(|e| invalid(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(invalid("not a hierarchical URL".to_string()));
        }

        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url,
            session,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Appends `segments` to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // cannot_be_a_base was rejected in `new`
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.bearer_auth(&self.session.token)
    }

    /// POST /api/candidates/action. Single attempt.
    ///
    /// CRITICAL: success is decided by the status code alone. Once the backend
    /// answers 2xx the entry is in the log, so an unreadable body yields
    /// `Ok(None)` rather than an error that would invite a duplicate retry.
    pub async fn register_decision(
        &self,
        request: &RegisterDecisionRequest,
    ) -> Result<Option<RegisteredDecision>, ClientError> {
        let response = self
            .authorized(self.client.post(self.endpoint(&["api", "candidates", "action"])))
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!(
                    "Decision for {} recorded ({status}) but the body could not be read: {e}",
                    request.candidate_id
                );
                return Ok(None);
            }
        };

        match serde_json::from_str::<RegisteredDecision>(&body) {
            Ok(registered) => {
                debug!(
                    "Registered {} for {} as {}",
                    registered.action, registered.candidate_id, registered.username
                );
                Ok(Some(registered))
            }
            Err(e) => {
                warn!(
                    "Decision for {} recorded ({status}) but the response did not parse: {e}",
                    request.candidate_id
                );
                Ok(None)
            }
        }
    }

    /// GET /api/audit/log with the optional filters as query parameters.
    pub async fn list_audit_log(&self, filter: &AuditLogFilter) -> Result<AuditLogPage, ClientError> {
        let params = audit_query_params(filter);
        self.get_with_retry(self.endpoint(&["api", "audit", "log"]), &params)
            .await
    }

    /// GET /api/candidates/{id}/history
    pub async fn candidate_history(&self, candidate_id: &str) -> Result<AuditLogPage, ClientError> {
        let url = self.endpoint(&["api", "candidates", candidate_id, "history"]);
        self.get_with_retry(url, &[]).await
    }

    /// GET /api/models. Models selectable for analysis and chat.
    pub async fn list_models(&self) -> Result<Vec<AiModel>, ClientError> {
        let list: ModelList = self
            .get_with_retry(self.endpoint(&["api", "models"]), &[])
            .await?;
        Ok(list.models)
    }

    /// POST /api/chat. Single attempt: every call is a fresh generation.
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatReply, ClientError> {
        let response = self
            .authorized(self.client.post(self.endpoint(&["api", "chat"])))
            .json(request)
            .send()
            .await?;
        parse_response(response).await
    }

    /// POST /api/analyze. Opaque upstream producer of analysis results.
    pub async fn analyze_candidates(
        &self,
        job_description: &str,
        candidates: &[CandidateDocument],
        model_id: Option<&str>,
    ) -> Result<Vec<AnalysisResult>, ClientError> {
        let body = AnalyzeRequest {
            job_description,
            candidates,
            model_id,
        };
        let response = self
            .authorized(self.client.post(self.endpoint(&["api", "analyze"])))
            .json(&body)
            .send()
            .await?;
        parse_response(response).await
    }

    /// Retries on transport errors, 429 and 5xx with exponential backoff.
    async fn get_with_retry<T: DeserializeOwned>(
        &self,
        url: Url,
        params: &[(&'static str, String)],
    ) -> Result<T, ClientError> {
        let mut last_error: Option<ClientError> = None;

        for attempt in 0..MAX_READ_ATTEMPTS {
            if attempt > 0 {
                // 500ms, 1s
                let delay = Duration::from_millis(500 * (1 << (attempt - 1)));
                warn!(
                    "Backend read attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = match self
                .authorized(self.client.get(url.clone()))
                .query(params)
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(ClientError::Http(e));
                    continue;
                }
            };

            let status = response.status();
            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("Backend returned {}: {}", status, body);
                last_error = Some(ClientError::Api {
                    status: status.as_u16(),
                    message: error_message(&body),
                });
                continue;
            }

            return parse_response(response).await;
        }

        Err(last_error.unwrap_or(ClientError::Exhausted {
            attempts: MAX_READ_ATTEMPTS,
        }))
    }
}

#[async_trait]
impl DecisionRecorder for ScreeningClient {
    async fn record(
        &self,
        request: &RegisterDecisionRequest,
    ) -> Result<(), ClientError> {
        self.register_decision(request).await.map(|_| ())
    }
}

async fn parse_response<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(ClientError::Api {
            status: status.as_u16(),
            message: error_message(&body),
        });
    }
    serde_json::from_str(&body).map_err(ClientError::Parse)
}

/// Extracts the backend's `detail` message, falling back to the raw body.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<BackendErrorBody>(body) {
        Ok(BackendErrorBody {
            detail: serde_json::Value::String(message),
        }) => message,
        Ok(BackendErrorBody { detail }) => detail.to_string(),
        Err(_) => body.to_string(),
    }
}

fn audit_query_params(filter: &AuditLogFilter) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();
    if let Some(username) = filter.username.as_deref().filter(|s| !s.is_empty()) {
        params.push(("username", username.to_string()));
    }
    if let Some(candidate_id) = filter.candidate_id.as_deref().filter(|s| !s.is_empty()) {
        params.push(("candidate_id", candidate_id.to_string()));
    }
    if let Some(action) = filter.action {
        params.push(("action", action.as_str().to_string()));
    }
    if let Some(limit) = filter.limit {
        params.push(("limit", limit.to_string()));
    }
    params
}
