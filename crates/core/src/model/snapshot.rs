use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::QuizId;
use crate::model::session::{AnsweredQuestion, QuizStatus, Session, StateInconsistency};
use crate::quiz::level::TOTAL_QUESTIONS;
use crate::quiz::policy::QuizConfig;

/// Serialized form of a [`Session`], exchanged with the progress stores.
///
/// Field names match the JSON body of `POST /progress/{quiz}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub experience: u32,
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default)]
    pub question_history: Vec<AnsweredQuestion>,
    #[serde(default)]
    pub current_scenario: usize,
    #[serde(default)]
    pub status: QuizStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

/// A session rebuilt from a snapshot, plus whatever had to be repaired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoredSession {
    pub session: Session,
    pub repaired: Option<StateInconsistency>,
    /// Answers beyond a full run that were dropped.
    pub truncated: usize,
    /// Terminal status the history already implied while the snapshot was
    /// still marked in progress.
    pub rejudged: Option<QuizStatus>,
}

impl Session {
    #[must_use]
    pub fn snapshot(&self, now: DateTime<Utc>) -> SessionSnapshot {
        SessionSnapshot {
            experience: self.experience(),
            tools: self.tools().iter().cloned().collect(),
            question_history: self.history().to_vec(),
            current_scenario: self.current_index(),
            status: self.status(),
            last_updated: Some(now),
        }
    }

    /// Rebuild a session from a stored snapshot.
    ///
    /// Experience is clamped into `[0, config.max_xp]`, history beyond a full
    /// run is dropped, and the scenario index is resynced with the history.
    /// An in-progress snapshot is judged again against `config.completion`, so
    /// a full or already failing history never comes back as playable.
    #[must_use]
    pub fn restore(snapshot: &SessionSnapshot, config: &QuizConfig) -> RestoredSession {
        let mut history = snapshot.question_history.clone();
        let truncated = history.len().saturating_sub(TOTAL_QUESTIONS);
        history.truncate(TOTAL_QUESTIONS);

        let mut session = Session::from_parts(
            snapshot.experience.min(config.max_xp),
            snapshot.tools.iter().cloned().collect(),
            history,
            snapshot.current_scenario,
            snapshot.status,
        );
        let repaired = session.resync();

        let mut rejudged = None;
        if snapshot.status == QuizStatus::InProgress {
            let status = config.completion.judge(&session);
            if status.is_terminal() {
                session.set_status(status);
                rejudged = Some(status);
            }
        }

        RestoredSession {
            session,
            repaired,
            truncated,
            rejudged,
        }
    }
}

//
// ─── QUIZ RESULT ──────────────────────────────────────────────────────────────
//

/// Final record of a finished run, kept for leaderboards and review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    pub quiz_name: QuizId,
    /// Share of the full run answered correctly (0–100).
    pub score: u32,
    pub experience: u32,
    pub question_history: Vec<AnsweredQuestion>,
    pub questions_answered: usize,
    pub status: QuizStatus,
    pub completed_at: DateTime<Utc>,
}

impl QuizResult {
    #[must_use]
    pub fn from_session(quiz_id: &QuizId, session: &Session, completed_at: DateTime<Utc>) -> Self {
        Self {
            quiz_name: quiz_id.clone(),
            score: session.score(),
            experience: session.experience(),
            question_history: session.history().to_vec(),
            questions_answered: session.answered_count(),
            status: session.status(),
            completed_at,
        }
    }
}
