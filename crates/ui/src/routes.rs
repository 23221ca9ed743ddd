use dioxus::prelude::*;
use dioxus_router::{Link, Outlet, Routable};

use crate::context::AppContext;
use crate::views::{HistoryView, HomeView, QuizView};

#[derive(Clone, Routable, PartialEq)]
#[rustfmt::skip]
pub enum Route {
    #[layout(Layout)]
        #[route("/", HomeView)] Home {},
        #[route("/quiz/:quiz_id", QuizView)] Quiz { quiz_id: String },
        #[route("/history", HistoryView)] History {},
}

#[component]
fn Layout() -> Element {
    rsx! {
        div { class: "app",
            Sidebar {}
            main { class: "content",
                Outlet::<Route> {}
            }
        }
    }
}

#[component]
fn Sidebar() -> Element {
    let ctx = use_context::<AppContext>();
    let mode = if ctx.is_offline() { "Offline" } else { "Synced" };

    rsx! {
        nav { class: "sidebar",
            h1 { "Scenario Quiz" }
            p { class: "sidebar__user", "{ctx.username()}" }
            p { class: "sidebar__mode", "{mode}" }
            ul {
                li { Link { to: Route::Home {}, "Quizzes" } }
                li { Link { to: Route::History {}, "History" } }
            }
        }
    }
}
