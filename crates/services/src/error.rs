//! Shared error types for the services crate.

use std::fmt;

use thiserror::Error;

use quiz_core::model::{BankError, QuizId, QuizIdError, UsernameError};
use quiz_core::quiz::EvaluateError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors returned by the remote progress store.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RemoteError {
    #[error("remote progress store rejected the credentials ({0})")]
    Auth(reqwest::StatusCode),
    #[error("remote progress store returned status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl RemoteError {
    #[must_use]
    pub fn is_auth(&self) -> bool {
        matches!(self, RemoteError::Auth(_))
    }
}

/// Errors from the progress gateway that must end the session.
///
/// Everything else the gateway runs into is reported as a
/// [`PersistenceWarning`] and the quiz carries on.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GatewayError {
    #[error("your sign-in has expired; please log in again")]
    Auth,
}

/// Step of the persistence pipeline that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistenceStage {
    RemoteLoad,
    MirrorLoad,
    RemoteSave,
    MirrorSave,
    RemoteResult,
    LocalResult,
    MirrorPurge,
}

/// Non-blocking persistence failure, surfaced to the user as a warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistenceWarning {
    pub quiz_id: QuizId,
    pub stage: PersistenceStage,
    pub detail: String,
}

impl PersistenceWarning {
    pub(crate) fn new(quiz_id: &QuizId, stage: PersistenceStage, detail: impl ToString) -> Self {
        Self {
            quiz_id: quiz_id.clone(),
            stage,
            detail: detail.to_string(),
        }
    }

    /// Short text for a warning banner.
    #[must_use]
    pub fn message(&self) -> &'static str {
        match self.stage {
            PersistenceStage::RemoteLoad => {
                "Could not reach the server; resumed from the copy saved on this device."
            }
            PersistenceStage::MirrorLoad => "The copy saved on this device could not be read.",
            PersistenceStage::RemoteSave => {
                "Progress was not saved to the server; a copy was kept on this device."
            }
            PersistenceStage::MirrorSave => "Progress could not be saved on this device.",
            PersistenceStage::RemoteResult => "Your result could not be sent to the server.",
            PersistenceStage::LocalResult => "Your result could not be saved on this device.",
            PersistenceStage::MirrorPurge => "Old progress on this device could not be cleared.",
        }
    }
}

impl fmt::Display for PersistenceWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}: {})", self.message(), self.quiz_id, self.detail)
    }
}

/// Errors emitted while building the quiz catalog.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("quiz {0} is registered twice")]
    Duplicate(QuizId),
    #[error("question bank {name}: {source}")]
    Bank {
        name: &'static str,
        #[source]
        source: BankError,
    },
}

/// Errors emitted by quiz sessions.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("select an option before submitting")]
    NoSelection,
    #[error("unknown quiz: {0}")]
    UnknownQuiz(QuizId),
    #[error(transparent)]
    QuizId(#[from] QuizIdError),
    #[error(transparent)]
    Evaluate(#[from] EvaluateError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl SessionError {
    #[must_use]
    pub fn is_auth(&self) -> bool {
        matches!(self, SessionError::Gateway(GatewayError::Auth))
    }
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Username(#[from] UsernameError),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}
