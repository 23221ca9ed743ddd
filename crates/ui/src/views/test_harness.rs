use std::sync::Arc;

use dioxus::core::NoOpMutations;
use dioxus::prelude::*;
use dioxus_router::{Routable, Router};
use quiz_core::time::fixed_clock;
use services::{AppServices, QuizCatalog, QuizService};
use storage::repository::{QuizResultRepository, Storage};

use crate::context::{UiApp, build_app_context};
use crate::views::{HistoryView, HomeView, QuizView};

#[derive(Clone)]
struct TestApp {
    services: AppServices,
}

impl UiApp for TestApp {
    fn username(&self) -> String {
        self.services.username().to_string()
    }

    fn is_offline(&self) -> bool {
        self.services.is_offline()
    }

    fn catalog(&self) -> Arc<QuizCatalog> {
        self.services.catalog()
    }

    fn quiz_service(&self) -> Arc<QuizService> {
        self.services.quiz_service()
    }
}

#[derive(Clone, PartialEq, Eq)]
pub enum ViewKind {
    Home,
    History,
    Quiz(String),
}

#[derive(Props, Clone)]
struct ViewHarnessProps {
    app: Arc<TestApp>,
    view: ViewKind,
}

impl PartialEq for ViewHarnessProps {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl Eq for ViewHarnessProps {}

#[component]
fn ViewRouterHarness(props: ViewHarnessProps) -> Element {
    let app: Arc<dyn UiApp> = props.app.clone();
    use_context_provider(|| build_app_context(&app));
    use_context_provider(|| props.view.clone());
    rsx! { Router::<TestRoute> {} }
}

#[derive(Clone, Routable, PartialEq)]
#[rustfmt::skip]
enum TestRoute {
    #[route("/")]
    Root {},
}

#[component]
fn Root() -> Element {
    let view = use_context::<ViewKind>();
    match view {
        ViewKind::Home => rsx! { HomeView {} },
        ViewKind::History => rsx! { HistoryView {} },
        ViewKind::Quiz(quiz_id) => rsx! { QuizView { quiz_id } },
    }
}

pub struct ViewHarness {
    pub dom: VirtualDom,
    pub quiz_service: Arc<QuizService>,
}

impl ViewHarness {
    pub fn rebuild(&mut self) {
        self.dom.rebuild_in_place();
        drive_dom(&mut self.dom);
    }

    pub async fn drive_async(&mut self) {
        let _ = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            self.dom.wait_for_work(),
        )
        .await;
        self.dom.render_immediate(&mut NoOpMutations);
        self.dom.process_events();
    }

    pub fn render(&self) -> String {
        dioxus_ssr::render(&self.dom)
    }
}

pub fn drive_dom(dom: &mut VirtualDom) {
    dom.process_events();
    dom.render_immediate(&mut NoOpMutations);
    dom.process_events();
}

pub fn setup_view_harness(view: ViewKind) -> ViewHarness {
    setup_view_harness_with_storage(view, Storage::in_memory())
}

pub fn setup_view_harness_with_results_repo(
    view: ViewKind,
    results: Arc<dyn QuizResultRepository>,
) -> ViewHarness {
    let mut storage = Storage::in_memory();
    storage.results = results;
    setup_view_harness_with_storage(view, storage)
}

pub fn setup_view_harness_with_storage(view: ViewKind, storage: Storage) -> ViewHarness {
    let services = AppServices::from_storage(storage, fixed_clock(), "alice", None)
        .expect("build services");
    let quiz_service = services.quiz_service();
    let app = Arc::new(TestApp { services });

    let dom = VirtualDom::new_with_props(ViewRouterHarness, ViewHarnessProps { app, view });

    ViewHarness { dom, quiz_service }
}
