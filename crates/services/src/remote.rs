use std::time::Duration;

use async_trait::async_trait;
use quiz_core::model::{AnsweredQuestion, QuizId, QuizResult, QuizStatus, SessionSnapshot};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::error::RemoteError;

/// Authenticated, per-user progress store on the server side.
#[async_trait]
pub trait RemoteProgressStore: Send + Sync {
    /// Fetch the stored snapshot, `Ok(None)` when the user has none.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError::Auth` for rejected credentials and other
    /// `RemoteError`s for transport or status failures.
    async fn fetch(&self, quiz_id: &QuizId) -> Result<Option<SessionSnapshot>, RemoteError>;

    /// # Errors
    ///
    /// Returns `RemoteError` when the snapshot is not accepted.
    async fn store(&self, quiz_id: &QuizId, snapshot: &SessionSnapshot) -> Result<(), RemoteError>;

    /// # Errors
    ///
    /// Returns `RemoteError` when the result is not accepted.
    async fn submit_result(&self, result: &QuizResult) -> Result<(), RemoteError>;
}

#[derive(Clone, Debug)]
pub struct RemoteConfig {
    pub base_url: String,
    pub token: String,
    pub timeout: Duration,
}

impl RemoteConfig {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    #[must_use]
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }
}

/// REST client for `GET/POST /progress/{quiz}` and `POST /quiz-results`.
#[derive(Clone)]
pub struct HttpProgressStore {
    client: Client,
    config: RemoteConfig,
}

impl HttpProgressStore {
    /// # Errors
    ///
    /// Returns `reqwest::Error` if the HTTP client cannot be built.
    pub fn new(config: RemoteConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.config.base_url.trim_end_matches('/'))
    }
}

fn check_status(status: StatusCode) -> Result<(), RemoteError> {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(RemoteError::Auth(status));
    }
    if !status.is_success() {
        return Err(RemoteError::HttpStatus(status));
    }
    Ok(())
}

#[async_trait]
impl RemoteProgressStore for HttpProgressStore {
    async fn fetch(&self, quiz_id: &QuizId) -> Result<Option<SessionSnapshot>, RemoteError> {
        let response = self
            .client
            .get(self.url(&format!("progress/{quiz_id}")))
            .bearer_auth(&self.config.token)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        check_status(status)?;

        let body: ProgressEnvelope = response.json().await?;
        Ok(body.into_snapshot())
    }

    async fn store(&self, quiz_id: &QuizId, snapshot: &SessionSnapshot) -> Result<(), RemoteError> {
        let payload = StoreProgressRequest::from(snapshot);
        let response = self
            .client
            .post(self.url(&format!("progress/{quiz_id}")))
            .bearer_auth(&self.config.token)
            .json(&payload)
            .send()
            .await?;
        check_status(response.status())
    }

    async fn submit_result(&self, result: &QuizResult) -> Result<(), RemoteError> {
        let response = self
            .client
            .post(self.url("quiz-results"))
            .bearer_auth(&self.config.token)
            .json(result)
            .send()
            .await?;
        check_status(response.status())
    }
}

/// Body of `POST /progress/{quiz}`; the server stamps `lastUpdated` itself.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StoreProgressRequest<'a> {
    experience: u32,
    tools: &'a [String],
    question_history: &'a [AnsweredQuestion],
    current_scenario: usize,
    status: QuizStatus,
}

impl<'a> From<&'a SessionSnapshot> for StoreProgressRequest<'a> {
    fn from(snapshot: &'a SessionSnapshot) -> Self {
        Self {
            experience: snapshot.experience,
            tools: &snapshot.tools,
            question_history: &snapshot.question_history,
            current_scenario: snapshot.current_scenario,
            status: snapshot.status,
        }
    }
}

/// The server answers either with the bare snapshot or wrapped in `data`.
///
/// `Bare` is tried first: a missing `data` key would otherwise match
/// `Wrapped { data: None }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ProgressEnvelope {
    Bare(SessionSnapshot),
    Wrapped { data: Option<SessionSnapshot> },
}

impl ProgressEnvelope {
    fn into_snapshot(self) -> Option<SessionSnapshot> {
        match self {
            ProgressEnvelope::Wrapped { data } => data,
            ProgressEnvelope::Bare(snapshot) => Some(snapshot),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::Session;
    use quiz_core::time::fixed_now;

    #[test]
    fn auth_statuses_map_to_auth_error() {
        assert!(check_status(StatusCode::UNAUTHORIZED).unwrap_err().is_auth());
        assert!(check_status(StatusCode::FORBIDDEN).unwrap_err().is_auth());
        assert!(matches!(
            check_status(StatusCode::BAD_GATEWAY),
            Err(RemoteError::HttpStatus(StatusCode::BAD_GATEWAY))
        ));
        assert!(check_status(StatusCode::CREATED).is_ok());
    }

    #[test]
    fn store_body_omits_last_updated() {
        let snapshot = Session::new().snapshot(fixed_now());
        let value = serde_json::to_value(StoreProgressRequest::from(&snapshot)).unwrap();
        let mut keys: Vec<&str> = value
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec!["currentScenario", "experience", "questionHistory", "status", "tools"]
        );
    }

    #[test]
    fn envelope_accepts_wrapped_and_bare_bodies() {
        let bare = r#"{ "experience": 5, "status": "in-progress" }"#;
        let wrapped = r#"{ "data": { "experience": 7 } }"#;
        let empty = r#"{ "data": null }"#;

        let bare: ProgressEnvelope = serde_json::from_str(bare).unwrap();
        assert_eq!(bare.into_snapshot().unwrap().experience, 5);
        let wrapped: ProgressEnvelope = serde_json::from_str(wrapped).unwrap();
        assert_eq!(wrapped.into_snapshot().unwrap().experience, 7);
        let empty: ProgressEnvelope = serde_json::from_str(empty).unwrap();
        assert!(empty.into_snapshot().is_none());
    }

    #[test]
    fn url_joins_without_double_slash() {
        let store = HttpProgressStore::new(RemoteConfig::new("http://localhost:3000/api/", "t"))
            .unwrap();
        assert_eq!(
            store.url("progress/risk-analysis"),
            "http://localhost:3000/api/progress/risk-analysis"
        );
    }
}
