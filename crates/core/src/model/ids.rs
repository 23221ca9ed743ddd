use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizIdError {
    #[error("quiz id is empty after normalization: {raw:?}")]
    Empty { raw: String },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum UsernameError {
    #[error("username cannot be empty")]
    Empty,
    #[error("username cannot contain whitespace: {0:?}")]
    Whitespace(String),
}

/// Identifier of a scenario inside a question bank.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScenarioId(u32);

impl ScenarioId {
    #[must_use]
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Debug for ScenarioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScenarioId({})", self.0)
    }
}

impl fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

//
// ─── QUIZ ID ───────────────────────────────────────────────────────────────────
//

/// Canonical quiz identifier: a lowercase, hyphen-separated slug.
///
/// Every spelling of a quiz name that reaches the system (`TesterMindset`,
/// `tester_mindset`, `Tester Mindset Quiz`, `tester-mindset`) is resolved to the
/// same id by [`QuizId::parse`]. Storage keys, remote paths and catalog lookups
/// only ever see the canonical form.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct QuizId(String);

impl QuizId {
    /// Normalize `raw` into a canonical quiz id.
    ///
    /// Word boundaries are lowercase→uppercase transitions and any
    /// non-alphanumeric character; they become a single `-`. A trailing
    /// `-quiz` is dropped.
    ///
    /// # Errors
    ///
    /// Returns `QuizIdError::Empty` when nothing alphanumeric remains.
    pub fn parse(raw: &str) -> Result<Self, QuizIdError> {
        let slug = slugify(raw);
        if slug.is_empty() {
            return Err(QuizIdError::Empty {
                raw: raw.to_owned(),
            });
        }
        Ok(Self(slug))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn slugify(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut prev: Option<char> = None;

    for ch in raw.trim().chars() {
        if ch.is_alphanumeric() {
            let camel_boundary = ch.is_uppercase()
                && prev.is_some_and(|p| p.is_lowercase() || p.is_ascii_digit());
            if camel_boundary {
                push_separator(&mut out);
            }
            out.extend(ch.to_lowercase());
        } else {
            push_separator(&mut out);
        }
        prev = Some(ch);
    }

    while out.ends_with('-') {
        out.pop();
    }

    match out.strip_suffix("-quiz") {
        Some(stem) => stem.to_owned(),
        None => out,
    }
}

fn push_separator(out: &mut String) {
    if !out.is_empty() && !out.ends_with('-') {
        out.push('-');
    }
}

impl FromStr for QuizId {
    type Err = QuizIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<'de> Deserialize<'de> for QuizId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

impl fmt::Debug for QuizId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QuizId({})", self.0)
    }
}

impl fmt::Display for QuizId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

//
// ─── USERNAME / PROGRESS KEY ───────────────────────────────────────────────────
//

/// Owner of quiz progress.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    /// # Errors
    ///
    /// Returns `UsernameError` for blank names or names containing whitespace.
    pub fn new(raw: impl Into<String>) -> Result<Self, UsernameError> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(UsernameError::Empty);
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(UsernameError::Whitespace(raw));
        }
        Ok(Self(trimmed.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Username {
    type Error = UsernameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}

impl fmt::Debug for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Username({})", self.0)
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifies one user's progress on one quiz.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProgressKey {
    pub username: Username,
    pub quiz_id: QuizId,
}

impl ProgressKey {
    #[must_use]
    pub fn new(username: Username, quiz_id: QuizId) -> Self {
        Self { username, quiz_id }
    }

    /// Key used by the local progress mirror: `quiz_progress_{username}_{quizId}`.
    #[must_use]
    pub fn mirror_key(&self) -> String {
        format!("quiz_progress_{}_{}", self.username, self.quiz_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spelling_variants_share_one_id() {
        let canonical = QuizId::parse("tester-mindset").unwrap();
        for raw in [
            "Tester-Mindset",
            "tester_mindset",
            "TesterMindset",
            "testerMindset",
            "  Tester Mindset ",
            "TESTER_MINDSET",
            "tester-mindset-quiz",
            "TesterMindsetQuiz",
            "tester--mindset",
        ] {
            assert_eq!(QuizId::parse(raw).unwrap(), canonical, "variant {raw:?}");
        }
    }

    #[test]
    fn bare_quiz_word_is_kept() {
        assert_eq!(QuizId::parse("Quiz").unwrap().as_str(), "quiz");
    }

    #[test]
    fn digits_stay_attached() {
        assert_eq!(QuizId::parse("Sprint2Review").unwrap().as_str(), "sprint2-review");
    }

    #[test]
    fn punctuation_only_is_rejected() {
        assert!(matches!(QuizId::parse(" _-_ "), Err(QuizIdError::Empty { .. })));
    }

    #[test]
    fn deserialize_normalizes() {
        let id: QuizId = serde_json::from_str("\"Time_Management\"").unwrap();
        assert_eq!(id.as_str(), "time-management");
    }

    #[test]
    fn mirror_key_uses_canonical_id() {
        let key = ProgressKey::new(
            Username::new("alice").unwrap(),
            QuizId::parse("RiskAnalysis").unwrap(),
        );
        assert_eq!(key.mirror_key(), "quiz_progress_alice_risk-analysis");
    }

    #[test]
    fn username_rejects_blank_and_inner_whitespace() {
        assert_eq!(Username::new("   "), Err(UsernameError::Empty));
        assert!(matches!(
            Username::new("a b"),
            Err(UsernameError::Whitespace(_))
        ));
        assert_eq!(Username::new(" bob ").unwrap().as_str(), "bob");
    }
}
