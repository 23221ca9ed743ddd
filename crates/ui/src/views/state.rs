use dioxus::prelude::*;
use services::SessionError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewError {
    Unknown,
    UnknownQuiz,
    NoSelection,
    SessionExpired,
}

impl ViewError {
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            ViewError::Unknown => "Something went wrong. Please try again.",
            ViewError::UnknownQuiz => "This quiz does not exist.",
            ViewError::NoSelection => "Please select an answer first.",
            ViewError::SessionExpired => "Your sign-in has expired. Please log in again.",
        }
    }

    /// Whether retrying the same action can help.
    #[must_use]
    pub fn is_retryable(self) -> bool {
        matches!(self, ViewError::Unknown)
    }
}

impl From<&SessionError> for ViewError {
    fn from(err: &SessionError) -> Self {
        match err {
            SessionError::NoSelection => ViewError::NoSelection,
            SessionError::UnknownQuiz(_) | SessionError::QuizId(_) => ViewError::UnknownQuiz,
            err if err.is_auth() => ViewError::SessionExpired,
            _ => ViewError::Unknown,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ViewState<T> {
    Idle,
    Loading,
    Ready(T),
    Error(ViewError),
}

#[must_use]
pub fn view_state_from_resource<T: Clone>(
    resource: &Resource<Result<T, ViewError>>,
) -> ViewState<T> {
    match resource.state().cloned() {
        UseResourceState::Pending => ViewState::Loading,
        UseResourceState::Ready => match resource.value().read().as_ref() {
            Some(Ok(data)) => ViewState::Ready(data.clone()),
            Some(Err(err)) => ViewState::Error(*err),
            None => ViewState::Error(ViewError::Unknown),
        },
        UseResourceState::Paused | UseResourceState::Stopped => ViewState::Idle,
    }
}
