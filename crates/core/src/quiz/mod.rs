//! The quiz state machine: level selection, answer evaluation and completion.

pub mod evaluator;
pub mod level;
pub mod policy;

pub use evaluator::{AnswerOutcome, EvaluateError, Selection, evaluate};
pub use level::{LevelSlot, QUESTIONS_PER_LEVEL, TOTAL_QUESTIONS, completed_tier, select_level};
pub use policy::{
    CompletionPolicy, ExperienceFloor, PercentagePolicy, QuizConfig, ThresholdPolicy,
};
