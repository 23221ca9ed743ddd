use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::model::ids::ScenarioId;
use crate::model::scenario::{Level, Scenario, ScenarioOption};
use crate::quiz::level::TOTAL_QUESTIONS;

//
// ─── STATUS ───────────────────────────────────────────────────────────────────
//

/// Lifecycle of a quiz run. `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuizStatus {
    #[default]
    InProgress,
    Completed,
    Failed,
}

impl QuizStatus {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, QuizStatus::InProgress)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            QuizStatus::InProgress => "in-progress",
            QuizStatus::Completed => "completed",
            QuizStatus::Failed => "failed",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "in-progress" => Some(QuizStatus::InProgress),
            "completed" => Some(QuizStatus::Completed),
            "failed" => Some(QuizStatus::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for QuizStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── ANSWERED QUESTION ────────────────────────────────────────────────────────
//

/// The part of a scenario recorded alongside an answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioRef {
    pub id: ScenarioId,
    pub level: Level,
    pub title: String,
}

impl From<&Scenario> for ScenarioRef {
    fn from(scenario: &Scenario) -> Self {
        Self {
            id: scenario.id(),
            level: scenario.level(),
            title: scenario.title().to_owned(),
        }
    }
}

/// The option a user picked (or that was picked for them on timeout).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedOption {
    pub index: usize,
    pub text: String,
    pub outcome: String,
    pub experience: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
}

impl SelectedOption {
    #[must_use]
    pub fn from_option(index: usize, option: &ScenarioOption) -> Self {
        Self {
            index,
            text: option.text.clone(),
            outcome: option.outcome.clone(),
            experience: option.experience,
            tool: option.tool.clone(),
        }
    }
}

/// One entry of the append-only answer history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnsweredQuestion {
    pub scenario: ScenarioRef,
    #[serde(rename = "selectedAnswer")]
    pub selected: SelectedOption,
    pub is_correct: bool,
    #[serde(rename = "timeSpent")]
    pub time_spent_ms: u64,
    #[serde(default)]
    pub timed_out: bool,
}

//
// ─── SESSION ──────────────────────────────────────────────────────────────────
//

/// `current_index` and the history length disagreed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateInconsistency {
    pub current_index: usize,
    pub history_len: usize,
}

impl fmt::Display for StateInconsistency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "current index {} does not match {} answered questions",
            self.current_index, self.history_len
        )
    }
}

/// Mutable state of one quiz attempt for one user.
///
/// Invariants kept by the evaluator:
/// - `experience` stays within the quiz's `[0, max_xp]`.
/// - `current_index == history.len()` (restored via [`Session::resync`]).
/// - history never grows past a full run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    experience: u32,
    tools: BTreeSet<String>,
    history: Vec<AnsweredQuestion>,
    current_index: usize,
    status: QuizStatus,
}

impl Session {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_parts(
        experience: u32,
        tools: BTreeSet<String>,
        history: Vec<AnsweredQuestion>,
        current_index: usize,
        status: QuizStatus,
    ) -> Self {
        Self {
            experience,
            tools,
            history,
            current_index,
            status,
        }
    }

    #[must_use]
    pub fn experience(&self) -> u32 {
        self.experience
    }

    #[must_use]
    pub fn tools(&self) -> &BTreeSet<String> {
        &self.tools
    }

    #[must_use]
    pub fn has_tool(&self, tool: &str) -> bool {
        self.tools.contains(tool)
    }

    #[must_use]
    pub fn history(&self) -> &[AnsweredQuestion] {
        &self.history
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    #[must_use]
    pub fn status(&self) -> QuizStatus {
        self.status
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.history.len()
    }

    #[must_use]
    pub fn correct_count(&self) -> usize {
        self.history.iter().filter(|a| a.is_correct).count()
    }

    #[must_use]
    pub fn is_full_run(&self) -> bool {
        self.history.len() >= TOTAL_QUESTIONS
    }

    /// Percentage of the full run answered correctly, rounded half up (0–100).
    #[must_use]
    pub fn score(&self) -> u32 {
        let correct = self.correct_count().min(TOTAL_QUESTIONS);
        let score = (correct * 100 + TOTAL_QUESTIONS / 2) / TOTAL_QUESTIONS;
        u32::try_from(score).unwrap_or(100)
    }

    /// Re-align `current_index` with the history length.
    ///
    /// Returns the mismatch that was repaired, if any.
    pub fn resync(&mut self) -> Option<StateInconsistency> {
        if self.current_index == self.history.len() {
            return None;
        }
        let found = StateInconsistency {
            current_index: self.current_index,
            history_len: self.history.len(),
        };
        self.current_index = self.history.len();
        Some(found)
    }

    pub(crate) fn record(&mut self, answer: AnsweredQuestion, experience: u32) {
        self.history.push(answer);
        self.current_index = self.history.len();
        self.experience = experience;
    }

    /// Adds `tool` if not yet owned; returns whether it was new.
    pub(crate) fn acquire_tool(&mut self, tool: &str) -> bool {
        if self.tools.contains(tool) {
            return false;
        }
        self.tools.insert(tool.to_owned())
    }

    pub(crate) fn set_status(&mut self, status: QuizStatus) {
        self.status = status;
    }
}
