pub(crate) mod bank;
mod ids;
mod scenario;
mod session;
mod snapshot;

pub use bank::{BankError, QuestionBank};
pub use ids::{ProgressKey, QuizId, QuizIdError, ScenarioId, Username, UsernameError};
pub use scenario::{Level, Scenario, ScenarioError, ScenarioOption};
pub use session::{
    AnsweredQuestion, QuizStatus, ScenarioRef, SelectedOption, Session, StateInconsistency,
};
pub use snapshot::{QuizResult, RestoredSession, SessionSnapshot};
