use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::model::ids::ScenarioId;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ScenarioError {
    #[error("scenario {id} has an empty title")]
    EmptyTitle { id: ScenarioId },

    #[error("scenario {id} needs at least two options, found {len}")]
    TooFewOptions { id: ScenarioId, len: usize },

    #[error("scenario {id} option {index} has empty text")]
    EmptyOptionText { id: ScenarioId, index: usize },
}

//
// ─── LEVEL ────────────────────────────────────────────────────────────────────
//

/// Difficulty tier. A run walks the tiers in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Level {
    Basic,
    Intermediate,
    Advanced,
}

impl Level {
    pub const ALL: [Level; 3] = [Level::Basic, Level::Intermediate, Level::Advanced];

    /// Zero-based position of the tier within a run.
    #[must_use]
    pub fn ordinal(self) -> usize {
        match self {
            Level::Basic => 0,
            Level::Intermediate => 1,
            Level::Advanced => 2,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Level::Basic => "Basic",
            Level::Intermediate => "Intermediate",
            Level::Advanced => "Advanced",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

//
// ─── OPTION ───────────────────────────────────────────────────────────────────
//

/// One selectable answer of a scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioOption {
    pub text: String,
    /// Feedback shown after the option is chosen.
    pub outcome: String,
    /// Experience delta, negative for poor choices.
    pub experience: i32,
    /// Tool granted when this option is chosen.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
}

impl ScenarioOption {
    #[must_use]
    pub fn new(text: impl Into<String>, outcome: impl Into<String>, experience: i32) -> Self {
        Self {
            text: text.into(),
            outcome: outcome.into(),
            experience,
            tool: None,
        }
    }

    #[must_use]
    pub fn with_tool(mut self, tool: impl Into<String>) -> Self {
        self.tool = Some(tool.into());
        self
    }
}

//
// ─── SCENARIO ─────────────────────────────────────────────────────────────────
//

/// A single quiz question: a situation and the ways to respond to it.
///
/// Immutable once built. The canonical correct option is the one with the
/// highest experience delta (first one wins on ties).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    id: ScenarioId,
    level: Level,
    title: String,
    description: String,
    options: Vec<ScenarioOption>,
}

impl Scenario {
    /// # Errors
    ///
    /// Returns `ScenarioError` when the title is blank, fewer than two options
    /// are supplied, or an option has no text.
    pub fn new(
        id: ScenarioId,
        level: Level,
        title: impl Into<String>,
        description: impl Into<String>,
        options: Vec<ScenarioOption>,
    ) -> Result<Self, ScenarioError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(ScenarioError::EmptyTitle { id });
        }
        if options.len() < 2 {
            return Err(ScenarioError::TooFewOptions {
                id,
                len: options.len(),
            });
        }
        if let Some(index) = options.iter().position(|o| o.text.trim().is_empty()) {
            return Err(ScenarioError::EmptyOptionText { id, index });
        }

        Ok(Self {
            id,
            level,
            title,
            description: description.into(),
            options,
        })
    }

    #[must_use]
    pub fn id(&self) -> ScenarioId {
        self.id
    }

    #[must_use]
    pub fn level(&self) -> Level {
        self.level
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn options(&self) -> &[ScenarioOption] {
        &self.options
    }

    #[must_use]
    pub fn option(&self, index: usize) -> Option<&ScenarioOption> {
        self.options.get(index)
    }

    /// Index of the option with the maximum experience, first occurrence on ties.
    #[must_use]
    pub fn correct_option_index(&self) -> usize {
        let mut best = 0;
        for (index, option) in self.options.iter().enumerate().skip(1) {
            if option.experience > self.options[best].experience {
                best = index;
            }
        }
        best
    }

    #[must_use]
    pub fn is_correct(&self, index: usize) -> bool {
        index == self.correct_option_index()
    }

    /// Highest experience this scenario can award (never negative).
    #[must_use]
    pub fn max_experience(&self) -> u32 {
        let best = self.options[self.correct_option_index()].experience;
        u32::try_from(best).unwrap_or(0)
    }

    /// Index of the option with the lowest experience, first occurrence on ties.
    #[must_use]
    pub fn worst_option_index(&self) -> usize {
        let mut worst = 0;
        for (index, option) in self.options.iter().enumerate().skip(1) {
            if option.experience < self.options[worst].experience {
                worst = index;
            }
        }
        worst
    }
}
