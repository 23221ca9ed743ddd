use std::sync::Arc;

use services::{QuizCatalog, QuizService};

pub trait UiApp: Send + Sync {
    fn username(&self) -> String;
    fn is_offline(&self) -> bool;

    fn catalog(&self) -> Arc<QuizCatalog>;
    fn quiz_service(&self) -> Arc<QuizService>;
}

#[derive(Clone)]
pub struct AppContext {
    username: String,
    offline: bool,

    catalog: Arc<QuizCatalog>,
    quiz_service: Arc<QuizService>,
}

impl AppContext {
    #[must_use]
    pub fn new(app: &Arc<dyn UiApp>) -> Self {
        Self {
            username: app.username(),
            offline: app.is_offline(),
            catalog: app.catalog(),
            quiz_service: app.quiz_service(),
        }
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// `true` when progress only lives on this device.
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

// This context is provided by the application composition root (e.g. `crates/app`).

/// Build an `AppContext` from a UI-facing app implementation.
#[must_use]
pub fn build_app_context(app: &Arc<dyn UiApp>) -> AppContext {
    AppContext::new(app)
}
