use std::collections::BTreeMap;
use std::sync::Arc;

use quiz_core::model::{QuestionBank, QuizId};
use quiz_core::quiz::{ExperienceFloor, QuizConfig, ThresholdPolicy};
use tracing::debug;

use crate::error::{CatalogError, SessionError};

const TESTER_MINDSET: &str = include_str!("../data/tester-mindset.json");
const TIME_MANAGEMENT: &str = include_str!("../data/time-management.json");

/// A quiz topic: its question bank and the rules it is played under.
#[derive(Debug, Clone)]
pub struct QuizEntry {
    pub bank: Arc<QuestionBank>,
    pub config: QuizConfig,
}

impl QuizEntry {
    #[must_use]
    pub fn quiz_id(&self) -> &QuizId {
        self.bank.quiz_id()
    }

    #[must_use]
    pub fn title(&self) -> &str {
        self.bank.title()
    }
}

/// Registry of playable quizzes, keyed by normalized [`QuizId`].
#[derive(Debug, Clone, Default)]
pub struct QuizCatalog {
    entries: BTreeMap<QuizId, QuizEntry>,
}

impl QuizCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with the quizzes bundled into the binary.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Bank` if a bundled bank fails validation.
    pub fn builtin() -> Result<Self, CatalogError> {
        let mut catalog = Self::new();
        catalog.register(
            load_bundled("tester-mindset", TESTER_MINDSET)?,
            QuizConfig::percentage(70),
        )?;
        catalog.register(
            load_bundled("time-management", TIME_MANAGEMENT)?,
            QuizConfig::threshold(ThresholdPolicy::default()).with_floor(
                ExperienceFloor::Ratchet {
                    basic: ThresholdPolicy::default().basic_min,
                    intermediate: ThresholdPolicy::default().intermediate_min,
                },
            ),
        )?;
        Ok(catalog)
    }

    /// # Errors
    ///
    /// Returns `CatalogError::Duplicate` if the quiz id is already taken.
    pub fn register(&mut self, bank: QuestionBank, config: QuizConfig) -> Result<(), CatalogError> {
        let quiz_id = bank.quiz_id().clone();
        if self.entries.contains_key(&quiz_id) {
            return Err(CatalogError::Duplicate(quiz_id));
        }
        debug!(quiz = %quiz_id, "registered quiz");
        self.entries.insert(
            quiz_id,
            QuizEntry {
                bank: Arc::new(bank),
                config,
            },
        );
        Ok(())
    }

    /// Look up a quiz by any spelling of its name ("TesterMindset",
    /// "tester_mindset_quiz", ...).
    ///
    /// # Errors
    ///
    /// Returns `SessionError::QuizId` for names that normalize to nothing and
    /// `SessionError::UnknownQuiz` for names not in the catalog.
    pub fn get(&self, raw: &str) -> Result<&QuizEntry, SessionError> {
        let quiz_id = QuizId::parse(raw)?;
        self.entry(&quiz_id)
            .ok_or(SessionError::UnknownQuiz(quiz_id))
    }

    #[must_use]
    pub fn entry(&self, quiz_id: &QuizId) -> Option<&QuizEntry> {
        self.entries.get(quiz_id)
    }

    pub fn entries(&self) -> impl Iterator<Item = &QuizEntry> {
        self.entries.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn load_bundled(name: &'static str, raw: &str) -> Result<QuestionBank, CatalogError> {
    QuestionBank::from_json(raw).map_err(|source| CatalogError::Bank { name, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{Level, ScenarioId};
    use quiz_core::quiz::CompletionPolicy;

    #[test]
    fn builtin_banks_load_and_validate() {
        let catalog = QuizCatalog::builtin().unwrap();
        assert_eq!(catalog.len(), 2);
        for entry in catalog.entries() {
            let bank = &entry.bank;
            assert_eq!(bank.scenarios().count(), 15);
            assert!(bank.attainable_experience_through(Level::Advanced) <= entry.config.max_xp);
        }
    }

    #[test]
    fn lookup_accepts_spelling_variants() {
        let catalog = QuizCatalog::builtin().unwrap();
        for raw in ["tester-mindset", "TesterMindset", "tester_mindset_quiz", "Tester Mindset"] {
            assert_eq!(catalog.get(raw).unwrap().quiz_id().as_str(), "tester-mindset");
        }
        assert!(matches!(
            catalog.get("unknown-topic"),
            Err(SessionError::UnknownQuiz(_))
        ));
        assert!(matches!(catalog.get("  "), Err(SessionError::QuizId(_))));
    }

    #[test]
    fn first_basic_scenario_has_a_single_best_option() {
        let catalog = QuizCatalog::builtin().unwrap();
        let bank = &catalog.get("tester-mindset").unwrap().bank;
        let scenario = bank.find(ScenarioId::new(1)).unwrap();
        let best = scenario.correct_option_index();
        assert_eq!(scenario.options()[best].experience, 15);
        for (i, option) in scenario.options().iter().enumerate() {
            if i != best {
                assert!(option.experience <= 0);
            }
        }
    }

    #[test]
    fn threshold_minimums_are_reachable() {
        let catalog = QuizCatalog::builtin().unwrap();
        let entry = catalog.get("time-management").unwrap();
        let CompletionPolicy::Threshold(policy) = entry.config.completion else {
            panic!("time management uses threshold completion");
        };
        for level in Level::ALL {
            assert!(entry.bank.attainable_experience_through(level) >= policy.minimum_for(level));
        }
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut catalog = QuizCatalog::builtin().unwrap();
        let bank = QuestionBank::from_json(TESTER_MINDSET).unwrap();
        assert!(matches!(
            catalog.register(bank, QuizConfig::default()),
            Err(CatalogError::Duplicate(_))
        ));
    }
}
