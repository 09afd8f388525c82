//! REST client for the practice backend.
//!
//! Everything the terminal client needs from the server goes through [`SessionApi`] and
//! [`CodeApi`]; [`HttpClient`] is the production implementation on top of `ureq`.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::editor::EditorBuffer;
use crate::language::Language;
use crate::session::{Command, CommandOutcome, TimedSession};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(String),
    #[error("server responded with status {0}")]
    Status(u16),
    #[error("not found")]
    NotFound,
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl From<ureq::Error> for ApiError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(404) => ApiError::NotFound,
            ureq::Error::StatusCode(code) => ApiError::Status(code),
            other => ApiError::Http(other.to_string()),
        }
    }
}

pub trait SessionApi: Send + Sync {
    fn fetch_session(&self, session_id: &str) -> Result<TimedSession, ApiError>;
    fn start_session(&self, session_id: &str) -> Result<TimedSession, ApiError>;
    fn switch_problem(&self, session_id: &str, from_order: u32, to_order: u32)
        -> Result<(), ApiError>;
    fn complete_session(&self, session_id: &str) -> Result<TimedSession, ApiError>;
    fn abandon_session(&self, session_id: &str) -> Result<TimedSession, ApiError>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeRequest {
    pub code: String,
    pub language: Language,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mock_interview_id: Option<String>,
}

impl CodeRequest {
    pub fn new(buffer: &EditorBuffer, session_id: Option<&str>) -> Self {
        Self {
            code: buffer.text.clone(),
            language: buffer.language,
            mock_interview_id: session_id.map(str::to_owned),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TestCaseResult {
    pub passed: bool,
    pub input: String,
    pub expected: String,
    pub actual: String,
}

/// Outcome of a run or a submission as judged by the backend
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RunReport {
    pub status: String,
    pub passed: u32,
    pub total: u32,
    pub runtime_ms: Option<f64>,
    pub memory_kb: Option<f64>,
    pub results: Vec<TestCaseResult>,
    pub error: Option<String>,
}

impl RunReport {
    pub fn is_accepted(&self) -> bool {
        self.status.eq_ignore_ascii_case("accepted")
            || (self.error.is_none() && self.total > 0 && self.passed == self.total)
    }
}

pub trait CodeApi: Send + Sync {
    fn run_code(&self, problem_id: &str, request: &CodeRequest) -> Result<RunReport, ApiError>;
    fn submit_code(&self, problem_id: &str, request: &CodeRequest)
        -> Result<RunReport, ApiError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SwitchBody {
    from_order: u32,
    to_order: u32,
}

/// Some endpoints wrap their payload in `{ "data": … }`, others return it bare
#[derive(Deserialize)]
#[serde(untagged)]
enum Envelope<T> {
    Wrapped { data: T },
    Bare(T),
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    match serde_json::from_str::<Envelope<T>>(body) {
        Ok(Envelope::Wrapped { data }) | Ok(Envelope::Bare(data)) => Ok(data),
        Err(err) => Err(ApiError::Decode(err.to_string())),
    }
}

fn decode_session(body: &str) -> Result<TimedSession, ApiError> {
    let session: TimedSession = decode(body)?;
    session
        .validate()
        .map_err(|err| ApiError::Decode(err.to_string()))?;
    Ok(session)
}

#[derive(Clone)]
pub struct HttpClient {
    agent: ureq::Agent,
    base_url: String,
    token: Option<String>,
}

impl HttpClient {
    pub fn new(base_url: impl Into<String>, token: Option<String>, timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn auth_header(&self) -> Option<String> {
        self.token.as_ref().map(|token| format!("Bearer {token}"))
    }

    fn get(&self, path: &str) -> Result<String, ApiError> {
        let url = self.url(path);
        debug!(%url, "GET");
        let mut request = self.agent.get(&url).header("Accept", "application/json");
        if let Some(auth) = self.auth_header() {
            request = request.header("Authorization", auth);
        }
        Ok(request.call()?.into_body().read_to_string()?)
    }

    fn post(&self, path: &str, body: Option<String>) -> Result<String, ApiError> {
        let url = self.url(path);
        debug!(%url, "POST");
        let mut request = self.agent.post(&url).header("Accept", "application/json");
        if let Some(auth) = self.auth_header() {
            request = request.header("Authorization", auth);
        }
        let response = match body {
            Some(json) => request
                .header("Content-Type", "application/json")
                .send(json.as_str())?,
            None => request.send_empty()?,
        };
        Ok(response.into_body().read_to_string()?)
    }

    fn session_path(session_id: &str, action: &str) -> String {
        if action.is_empty() {
            format!("mock-interviews/{session_id}")
        } else {
            format!("mock-interviews/{session_id}/{action}")
        }
    }
}

impl SessionApi for HttpClient {
    fn fetch_session(&self, session_id: &str) -> Result<TimedSession, ApiError> {
        decode_session(&self.get(&Self::session_path(session_id, ""))?)
    }

    fn start_session(&self, session_id: &str) -> Result<TimedSession, ApiError> {
        decode_session(&self.post(&Self::session_path(session_id, "start"), None)?)
    }

    fn switch_problem(
        &self,
        session_id: &str,
        from_order: u32,
        to_order: u32,
    ) -> Result<(), ApiError> {
        let body = serde_json::to_string(&SwitchBody {
            from_order,
            to_order,
        })
        .map_err(|err| ApiError::Decode(err.to_string()))?;
        self.post(&Self::session_path(session_id, "switch-problem"), Some(body))?;
        Ok(())
    }

    fn complete_session(&self, session_id: &str) -> Result<TimedSession, ApiError> {
        decode_session(&self.post(&Self::session_path(session_id, "complete"), None)?)
    }

    fn abandon_session(&self, session_id: &str) -> Result<TimedSession, ApiError> {
        decode_session(&self.post(&Self::session_path(session_id, "abandon"), None)?)
    }
}

impl CodeApi for HttpClient {
    fn run_code(&self, problem_id: &str, request: &CodeRequest) -> Result<RunReport, ApiError> {
        let body =
            serde_json::to_string(request).map_err(|err| ApiError::Decode(err.to_string()))?;
        decode(&self.post(&format!("problems/{problem_id}/run"), Some(body))?)
    }

    fn submit_code(
        &self,
        problem_id: &str,
        request: &CodeRequest,
    ) -> Result<RunReport, ApiError> {
        let body =
            serde_json::to_string(request).map_err(|err| ApiError::Decode(err.to_string()))?;
        decode(&self.post(&format!("problems/{problem_id}/submit"), Some(body))?)
    }
}

/// Run a controller command against the backend, turning any error into
/// [`CommandOutcome::Failed`] so nothing propagates past this point.
pub fn execute(api: &dyn SessionApi, session_id: &str, command: &Command) -> CommandOutcome {
    let result = match command {
        Command::Start => api.start_session(session_id).map(CommandOutcome::Started),
        Command::Switch {
            from_order,
            to_order,
            to_index,
        } => api
            .switch_problem(session_id, *from_order, *to_order)
            .map(|()| CommandOutcome::Switched {
                to_index: *to_index,
            }),
        Command::Complete => api.complete_session(session_id).map(CommandOutcome::Completed),
        Command::Abandon => api.abandon_session(session_id).map(CommandOutcome::Abandoned),
    };

    result.unwrap_or_else(|err| {
        warn!(%session_id, kind = %command.kind(), %err, "command failed");
        CommandOutcome::Failed {
            kind: command.kind(),
            message: err.to_string(),
        }
    })
}
