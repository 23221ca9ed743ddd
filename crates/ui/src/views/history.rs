use dioxus::prelude::*;

use crate::context::AppContext;
use crate::views::{ViewError, ViewState, view_state_from_resource};
use crate::vm::{ResultRowVm, map_result_rows};

const HISTORY_LIMIT: u32 = 20;

#[derive(Clone, Debug, PartialEq)]
struct HistoryData {
    rows: Vec<ResultRowVm>,
}

#[component]
pub fn HistoryView() -> Element {
    let ctx = use_context::<AppContext>();
    let quiz_service = ctx.quiz_service();

    let resource = use_resource(move || {
        let quiz_service = quiz_service.clone();
        async move {
            let rows = quiz_service
                .history(None, HISTORY_LIMIT)
                .await
                .map_err(|err| ViewError::from(&err))?;
            Ok(HistoryData {
                rows: map_result_rows(&rows),
            })
        }
    });

    let state = view_state_from_resource(&resource);

    rsx! {
        div { class: "page",
            h2 { "History" }

            match state {
                ViewState::Idle => rsx! {
                    p { "Idle" }
                },
                ViewState::Loading => rsx! {
                    p { "Loading..." }
                },
                ViewState::Ready(data) => rsx! {
                    if data.rows.is_empty() {
                        p { "No finished quizzes yet." }
                    } else {
                        ul { class: "history-list",
                            for row in data.rows {
                                ResultRow { key: "{row.id}", row }
                            }
                        }
                    }
                },
                ViewState::Error(err) => rsx! {
                    p { "{err.message()}" }
                    button {
                        class: "btn btn-secondary",
                        r#type: "button",
                        onclick: move |_| {
                            let mut resource = resource;
                            resource.restart();
                        },
                        "Retry"
                    }
                },
            }
        }
    }
}

#[component]
fn ResultRow(row: ResultRowVm) -> Element {
    rsx! {
        li { class: "history-row",
            span { class: "history-row__quiz", "{row.quiz_id}" }
            span { class: "history-row__date", "{row.completed_at_str}" }
            p {
                "{row.status_label} | Score: {row.score}% | XP: {row.experience} | Answered: {row.answered}"
            }
        }
    }
}
