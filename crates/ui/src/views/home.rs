use dioxus::prelude::*;
use dioxus_router::Link;

use crate::context::AppContext;
use crate::routes::Route;
use crate::vm::{QuizCardVm, map_quiz_cards};

#[component]
pub fn HomeView() -> Element {
    let ctx = use_context::<AppContext>();
    let cards = map_quiz_cards(&ctx.catalog());

    rsx! {
        div { class: "page",
            h2 { "Choose a quiz" }
            p { "Signed in as {ctx.username()}" }
            if ctx.is_offline() {
                p { class: "banner banner--info",
                    "Offline mode: progress is saved on this device only."
                }
            }
            if cards.is_empty() {
                p { "No quizzes available." }
            } else {
                ul { class: "quiz-list",
                    for card in cards {
                        QuizCard { key: "{card.quiz_id}", card }
                    }
                }
            }
        }
    }
}

#[component]
fn QuizCard(card: QuizCardVm) -> Element {
    rsx! {
        li { class: "quiz-card",
            h3 { class: "quiz-card__title", "{card.title}" }
            p { class: "quiz-card__rules", "{card.rules}" }
            p { class: "quiz-card__timer", "{card.time_limit_secs} seconds per question" }
            Link { class: "btn btn-primary", to: Route::Quiz { quiz_id: card.quiz_id.clone() }, "Start" }
        }
    }
}
