use serde::Deserialize;
use std::collections::HashSet;
use thiserror::Error;

use crate::model::ids::{QuizId, QuizIdError, ScenarioId};
use crate::model::scenario::{Level, Scenario, ScenarioError, ScenarioOption};
use crate::quiz::level::{QUESTIONS_PER_LEVEL, select_level};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BankError {
    #[error(transparent)]
    Scenario(#[from] ScenarioError),

    #[error(transparent)]
    QuizId(#[from] QuizIdError),

    #[error("{level} tier must hold {expected} scenarios, found {found}")]
    TierSize {
        level: Level,
        expected: usize,
        found: usize,
    },

    #[error("scenario id {0} appears more than once")]
    DuplicateScenario(ScenarioId),

    #[error("invalid question bank data: {0}")]
    Json(#[from] serde_json::Error),
}

/// Reference data for one quiz topic: five scenarios for each tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionBank {
    quiz_id: QuizId,
    title: String,
    tiers: [Vec<Scenario>; 3],
}

impl QuestionBank {
    /// Build a bank from scenarios in any order; each lands in its own tier,
    /// keeping relative order within the tier.
    ///
    /// # Errors
    ///
    /// Returns `BankError::TierSize` when a tier does not hold exactly five
    /// scenarios and `BankError::DuplicateScenario` on repeated ids.
    pub fn new(
        quiz_id: QuizId,
        title: impl Into<String>,
        scenarios: Vec<Scenario>,
    ) -> Result<Self, BankError> {
        let mut seen = HashSet::with_capacity(scenarios.len());
        let mut tiers: [Vec<Scenario>; 3] = Default::default();

        for scenario in scenarios {
            if !seen.insert(scenario.id()) {
                return Err(BankError::DuplicateScenario(scenario.id()));
            }
            tiers[scenario.level().ordinal()].push(scenario);
        }

        for level in Level::ALL {
            let found = tiers[level.ordinal()].len();
            if found != QUESTIONS_PER_LEVEL {
                return Err(BankError::TierSize {
                    level,
                    expected: QUESTIONS_PER_LEVEL,
                    found,
                });
            }
        }

        Ok(Self {
            quiz_id,
            title: title.into(),
            tiers,
        })
    }

    /// Parse the JSON bank format:
    ///
    /// ```json
    /// { "quizId": "tester-mindset", "title": "...", "scenarios": [
    ///   { "id": 1, "level": "Basic", "title": "...", "description": "...",
    ///     "options": [ { "text": "...", "outcome": "...", "experience": 15, "tool": "..." } ] }
    /// ] }
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `BankError` for malformed JSON or data that fails validation.
    pub fn from_json(raw: &str) -> Result<Self, BankError> {
        let record: BankRecord = serde_json::from_str(raw)?;
        let quiz_id = QuizId::parse(&record.quiz_id)?;
        let scenarios = record
            .scenarios
            .into_iter()
            .map(|s| {
                Scenario::new(
                    ScenarioId::new(s.id),
                    s.level,
                    s.title,
                    s.description,
                    s.options,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(quiz_id, record.title, scenarios)
    }

    #[must_use]
    pub fn quiz_id(&self) -> &QuizId {
        &self.quiz_id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn tier(&self, level: Level) -> &[Scenario] {
        &self.tiers[level.ordinal()]
    }

    /// Scenario to present after `questions_answered` answers, `None` when the
    /// run is over.
    #[must_use]
    pub fn scenario_for(&self, questions_answered: usize) -> Option<&Scenario> {
        let slot = select_level(questions_answered)?;
        self.tier(slot.level).get(slot.index)
    }

    /// All scenarios in run order.
    pub fn scenarios(&self) -> impl Iterator<Item = &Scenario> {
        self.tiers.iter().flatten()
    }

    #[must_use]
    pub fn find(&self, id: ScenarioId) -> Option<&Scenario> {
        self.scenarios().find(|s| s.id() == id)
    }

    /// Experience earned by always choosing the best option, up to and
    /// including `level`.
    #[must_use]
    pub fn attainable_experience_through(&self, level: Level) -> u32 {
        Level::ALL
            .iter()
            .filter(|l| **l <= level)
            .flat_map(|l| self.tier(*l))
            .map(Scenario::max_experience)
            .sum()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BankRecord {
    quiz_id: String,
    title: String,
    scenarios: Vec<ScenarioRecord>,
}

#[derive(Debug, Deserialize)]
struct ScenarioRecord {
    id: u32,
    level: Level,
    title: String,
    #[serde(default)]
    description: String,
    options: Vec<ScenarioOption>,
}
