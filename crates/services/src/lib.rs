#![forbid(unsafe_code)]

pub mod app_services;
pub mod catalog;
pub mod error;
pub mod gateway;
pub mod quiz;
pub mod remote;
pub mod timer;

pub use quiz_core::Clock;

pub use app_services::AppServices;
pub use catalog::{QuizCatalog, QuizEntry};
pub use error::{
    AppServicesError, CatalogError, GatewayError, PersistenceStage, PersistenceWarning,
    RemoteError, SessionError,
};
pub use gateway::{FinishAck, LoadedProgress, ProgressGateway, ProgressSource, SaveAck};
pub use quiz::{AnswerReport, QuizRun, QuizService, RunProgress, StartedRun};
pub use remote::{HttpProgressStore, RemoteConfig, RemoteProgressStore};
pub use timer::{AnswerTimer, TimerHandle, arm};

pub use storage::repository::QuizResultRow;
