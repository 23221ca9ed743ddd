mod catalog_vm;
mod history_vm;
mod quiz_vm;
mod time_fmt;

pub use catalog_vm::{QuizCardVm, map_quiz_cards};
pub use history_vm::{ResultRowVm, map_result_rows};
pub use quiz_vm::{
    AnswerRequest, AnswerResponse, FeedbackVm, OptionVm, PendingAnswer, QuizIntent, QuizPhase,
    QuizVm, ResultsVm, start_quiz,
};
pub use time_fmt::format_countdown;
