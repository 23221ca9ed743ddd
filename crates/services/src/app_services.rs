use std::sync::Arc;

use quiz_core::model::Username;
use storage::repository::Storage;
use tracing::info;

use crate::Clock;
use crate::catalog::QuizCatalog;
use crate::error::AppServicesError;
use crate::gateway::ProgressGateway;
use crate::quiz::QuizService;
use crate::remote::{HttpProgressStore, RemoteConfig, RemoteProgressStore};

/// Assembles app-facing services for one signed-in user.
#[derive(Clone)]
pub struct AppServices {
    username: Username,
    catalog: Arc<QuizCatalog>,
    quiz_service: Arc<QuizService>,
    offline: bool,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// Without a `remote` config the app runs offline on the local mirror.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage, the catalog, the username or the
    /// HTTP client cannot be initialized.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        username: &str,
        remote: Option<RemoteConfig>,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        let remote = match remote {
            Some(config) => {
                info!(base_url = %config.base_url, "remote progress store enabled");
                Some(Arc::new(HttpProgressStore::new(config)?) as Arc<dyn RemoteProgressStore>)
            }
            None => {
                info!("no remote progress store configured; running offline");
                None
            }
        };
        Self::from_storage(storage, clock, username, remote)
    }

    /// Build services from already-open storage, e.g. `Storage::in_memory()`.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` for an invalid username or catalog.
    pub fn from_storage(
        storage: Storage,
        clock: Clock,
        username: &str,
        remote: Option<Arc<dyn RemoteProgressStore>>,
    ) -> Result<Self, AppServicesError> {
        let username = Username::new(username)?;
        let catalog = Arc::new(QuizCatalog::builtin()?);
        let offline = remote.is_none();
        let gateway = Arc::new(ProgressGateway::new(
            username.clone(),
            remote,
            Arc::clone(&storage.mirror),
            Arc::clone(&storage.results),
        ));
        let quiz_service = Arc::new(QuizService::new(clock, Arc::clone(&catalog), gateway));

        Ok(Self {
            username,
            catalog,
            quiz_service,
            offline,
        })
    }

    #[must_use]
    pub fn username(&self) -> &Username {
        &self.username
    }

    #[must_use]
    pub fn is_offline(&self) -> bool {
        self.offline
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<QuizCatalog> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn quiz_service(&self) -> Arc<QuizService> {
        Arc::clone(&self.quiz_service)
    }
}
