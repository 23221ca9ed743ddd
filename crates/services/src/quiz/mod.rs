//! Quiz runs: starting, answering and persisting.

mod progress;
mod run;
mod service;

pub use progress::RunProgress;
pub use run::QuizRun;
pub use service::{AnswerReport, QuizService, StartedRun};
