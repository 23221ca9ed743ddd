use std::sync::Arc;
use std::time::Duration;

use dioxus::prelude::*;
use dioxus_router::Link;
use services::QuizService;
use tracing::warn;

use crate::context::AppContext;
use crate::routes::Route;
use crate::views::{ViewError, ViewState, view_state_from_resource};
use crate::vm::{
    FeedbackVm, OptionVm, PendingAnswer, QuizIntent, QuizPhase, QuizVm, ResultsVm,
    format_countdown, start_quiz,
};

/// Owned copy of everything the quiz screen renders.
#[derive(Clone, Debug, PartialEq)]
struct QuizScreen {
    title: String,
    phase: QuizPhase,
    resumed: bool,
    progress_label: String,
    level_label: Option<&'static str>,
    experience_label: String,
    experience_percent: u32,
    tools: Vec<String>,
    scenario_title: Option<String>,
    scenario_description: Option<String>,
    options: Vec<OptionVm>,
    can_submit: bool,
    saving: bool,
    countdown: Option<String>,
    warning: Option<String>,
    feedback: Option<FeedbackVm>,
    results: Option<ResultsVm>,
}

impl QuizScreen {
    fn from_vm(vm: &QuizVm) -> Self {
        Self {
            title: vm.title().to_owned(),
            phase: vm.phase(),
            resumed: vm.resumed(),
            progress_label: vm.progress_label(),
            level_label: vm.level_label(),
            experience_label: vm.experience_label(),
            experience_percent: vm.experience_percent(),
            tools: vm.tools(),
            scenario_title: vm.scenario_title().map(str::to_owned),
            scenario_description: vm.scenario_description().map(str::to_owned),
            options: vm.options(),
            can_submit: vm.can_submit(),
            saving: vm.is_saving(),
            countdown: vm.remaining_secs().map(format_countdown),
            warning: vm.warning().map(str::to_owned),
            feedback: vm.feedback(),
            results: vm.results(),
        }
    }
}

async fn send_answer(
    mut vm: Signal<Option<QuizVm>>,
    mut error: Signal<Option<ViewError>>,
    quiz_service: Arc<QuizService>,
    answer: PendingAnswer,
) {
    let begun = vm.write().as_mut().map(|vm| vm.begin_answer(answer));
    let request = match begun {
        Some(Ok(Some(request))) => request,
        Some(Ok(None)) => return,
        Some(Err(err)) => {
            error.set(Some(err));
            return;
        }
        None => {
            error.set(Some(ViewError::Unknown));
            return;
        }
    };

    let response = request.send(&quiz_service).await;
    let outcome = vm.write().as_mut().map(|vm| vm.complete_answer(response));
    match outcome {
        Some(Ok(())) => error.set(None),
        Some(Err(err)) => {
            warn!(?err, "answer was not recorded");
            error.set(Some(err));
            // The question is still on screen; give it a countdown again.
            arm_countdown(vm, error, quiz_service);
        }
        None => error.set(Some(ViewError::Unknown)),
    }
}

/// Arm the countdown for the question on screen; on expiry an automatic
/// answer is submitted.
fn arm_countdown(
    mut vm: Signal<Option<QuizVm>>,
    error: Signal<Option<ViewError>>,
    quiz_service: Arc<QuizService>,
) {
    let timer = vm.write().as_mut().and_then(QuizVm::arm_timer);
    if let Some(timer) = timer {
        spawn(async move {
            if timer.expired().await {
                send_answer(vm, error, quiz_service, PendingAnswer::TimedOut).await;
            }
        });
    }
}

#[component]
pub fn QuizView(quiz_id: String) -> Element {
    let ctx = use_context::<AppContext>();
    let quiz_service = ctx.quiz_service();

    let vm = use_signal(|| None::<QuizVm>);
    let error = use_signal(|| None::<ViewError>);
    let mut tick = use_signal(|| 0_u64);

    let quiz_service_for_resource = Arc::clone(&quiz_service);
    let resource = use_resource(move || {
        let quiz_service = Arc::clone(&quiz_service_for_resource);
        let quiz_id = quiz_id.clone();
        let mut vm = vm;
        let mut error = error;

        async move {
            let started = start_quiz(&quiz_service, &quiz_id).await?;
            vm.set(Some(started));
            error.set(None);
            arm_countdown(vm, error, quiz_service);
            Ok::<_, ViewError>(())
        }
    });
    let state = view_state_from_resource(&resource);

    // Re-render once per second while a countdown is visible.
    use_future(move || async move {
        loop {
            tokio::time::sleep(Duration::from_secs(1)).await;
            tick += 1;
        }
    });
    let _ = tick();

    let dispatch = {
        let quiz_service = Arc::clone(&quiz_service);
        use_callback(move |intent: QuizIntent| {
            let mut vm = vm;
            let mut error = error;
            let quiz_service = Arc::clone(&quiz_service);

            match intent {
                QuizIntent::Select(index) => {
                    if let Some(vm) = vm.write().as_mut() {
                        vm.select(index);
                    }
                }
                QuizIntent::Submit => {
                    let selected = vm.read().as_ref().and_then(QuizVm::selected);
                    spawn(send_answer(
                        vm,
                        error,
                        quiz_service,
                        PendingAnswer::Chosen(selected),
                    ));
                }
                QuizIntent::TimeOut => {
                    spawn(send_answer(vm, error, quiz_service, PendingAnswer::TimedOut));
                }
                QuizIntent::Next => {
                    if let Some(vm) = vm.write().as_mut() {
                        vm.next();
                    }
                    arm_countdown(vm, error, quiz_service);
                }
                QuizIntent::Restart => {
                    spawn(async move {
                        let taken = vm.write().take();
                        let Some(mut vm_value) = taken else {
                            error.set(Some(ViewError::Unknown));
                            return;
                        };
                        let result = vm_value.restart(&quiz_service).await;

                        // Always put the run back so the UI remains usable even after errors.
                        vm.set(Some(vm_value));
                        match result {
                            Ok(()) => {
                                error.set(None);
                                arm_countdown(vm, error, quiz_service);
                            }
                            Err(err) => error.set(Some(err)),
                        }
                    });
                }
                QuizIntent::DismissWarning => {
                    if let Some(vm) = vm.write().as_mut() {
                        vm.dismiss_warning();
                    }
                }
            }
        })
    };

    let on_key = use_callback(move |evt: KeyboardEvent| {
        let phase = vm.read().as_ref().map(QuizVm::phase);
        match (evt.key(), phase) {
            (Key::Character(value), Some(QuizPhase::Question)) => {
                if let Ok(n) = value.parse::<usize>()
                    && n > 0
                {
                    evt.prevent_default();
                    dispatch.call(QuizIntent::Select(n - 1));
                }
            }
            (Key::Enter, Some(QuizPhase::Question)) => {
                evt.prevent_default();
                dispatch.call(QuizIntent::Submit);
            }
            (Key::Enter, Some(QuizPhase::Feedback)) => {
                evt.prevent_default();
                dispatch.call(QuizIntent::Next);
            }
            _ => {}
        }
    });

    let screen = vm.read().as_ref().map(QuizScreen::from_vm);
    let current_error = *error.read();

    rsx! {
        div { class: "page quiz-page", id: "quiz-root", tabindex: "0", onkeydown: on_key,
            match state {
                ViewState::Idle => rsx! {
                    p { "Idle" }
                },
                ViewState::Loading => rsx! {
                    p { "Loading..." }
                },
                ViewState::Error(err) => rsx! {
                    div { class: "banner banner--error",
                        p { "{err.message()}" }
                        if err.is_retryable() {
                            button {
                                class: "btn btn-secondary",
                                r#type: "button",
                                onclick: move |_| {
                                    let mut resource = resource;
                                    resource.restart();
                                },
                                "Retry"
                            }
                        }
                        Link { class: "btn btn-secondary", to: Route::Home {}, "Back to quizzes" }
                    }
                },
                ViewState::Ready(()) => rsx! {
                    if let Some(screen) = screen {
                        QuizScreenView { screen, error: current_error, on_intent: dispatch }
                    }
                },
            }
        }
    }
}

#[component]
fn QuizScreenView(
    screen: QuizScreen,
    error: Option<ViewError>,
    on_intent: Callback<QuizIntent>,
) -> Element {
    let mut dismissed_error = use_signal(|| None::<ViewError>);
    let visible_error = error.filter(|err| dismissed_error() != Some(*err));

    rsx! {
        header { class: "quiz-header",
            h2 { class: "quiz-header__title", "{screen.title}" }
            if screen.resumed {
                p { class: "quiz-header__resumed", "Welcome back! Picking up where you left off." }
            }
            div { class: "quiz-header__stats",
                span { class: "quiz-stat", "{screen.progress_label}" }
                if let Some(level) = screen.level_label {
                    span { class: "quiz-stat", "Level: {level}" }
                }
                if let Some(countdown) = screen.countdown.as_ref() {
                    span { class: "quiz-stat quiz-stat--timer", id: "quiz-timer", "{countdown}" }
                }
            }
            div { class: "xp-bar",
                div { class: "xp-bar__fill", style: "width: {screen.experience_percent}%" }
                span { class: "xp-bar__label", "{screen.experience_label}" }
            }
            if !screen.tools.is_empty() {
                ul { class: "tools",
                    for tool in screen.tools.iter() {
                        li { key: "{tool}", class: "tools__item", "{tool}" }
                    }
                }
            }
        }

        if let Some(warning) = screen.warning.as_ref() {
            div { class: "banner banner--warning", role: "status",
                p { "{warning}" }
                button {
                    class: "btn btn-link",
                    r#type: "button",
                    onclick: move |_| on_intent.call(QuizIntent::DismissWarning),
                    "Dismiss"
                }
            }
        }
        if let Some(err) = visible_error {
            div { class: "banner banner--error", role: "alert",
                p { "{err.message()}" }
                if err == ViewError::SessionExpired {
                    Link { class: "btn btn-secondary", to: Route::Home {}, "Back to quizzes" }
                } else {
                    button {
                        class: "btn btn-link",
                        r#type: "button",
                        onclick: move |_| dismissed_error.set(Some(err)),
                        "Dismiss"
                    }
                }
            }
        }

        match screen.phase {
            QuizPhase::Question => rsx! {
                section { class: "scenario",
                    if let Some(title) = screen.scenario_title.as_ref() {
                        h3 { class: "scenario__title", "{title}" }
                    }
                    if let Some(description) = screen.scenario_description.as_ref() {
                        p { class: "scenario__description", "{description}" }
                    }
                    ul { class: "scenario__options",
                        for option in screen.options.iter().cloned() {
                            OptionButton { key: "{option.index}", option, disabled: screen.saving, on_intent }
                        }
                    }
                    button {
                        class: "btn btn-primary",
                        id: "quiz-submit",
                        r#type: "button",
                        disabled: !screen.can_submit,
                        onclick: move |_| on_intent.call(QuizIntent::Submit),
                        if screen.saving { "Saving..." } else { "Submit" }
                    }
                }
            },
            QuizPhase::Feedback => rsx! {
                if let Some(feedback) = screen.feedback.clone() {
                    FeedbackPanel { feedback }
                }
                button {
                    class: "btn btn-primary",
                    id: "quiz-next",
                    r#type: "button",
                    onclick: move |_| on_intent.call(QuizIntent::Next),
                    "Next question"
                }
            },
            QuizPhase::Finished => rsx! {
                if let Some(feedback) = screen.feedback.clone() {
                    FeedbackPanel { feedback }
                }
                if let Some(results) = screen.results.clone() {
                    ResultsPanel { results, on_intent }
                }
            },
        }
    }
}

#[component]
fn OptionButton(option: OptionVm, disabled: bool, on_intent: Callback<QuizIntent>) -> Element {
    let class = if option.selected {
        "option option--selected"
    } else {
        "option"
    };
    let index = option.index;
    let number = index + 1;

    rsx! {
        li {
            button {
                class: "{class}",
                r#type: "button",
                aria_pressed: "{option.selected}",
                disabled: disabled,
                onclick: move |_| on_intent.call(QuizIntent::Select(index)),
                span { class: "option__number", "{number}" }
                span { class: "option__text", "{option.text}" }
            }
        }
    }
}

#[component]
fn FeedbackPanel(feedback: FeedbackVm) -> Element {
    let class = if feedback.correct {
        "feedback feedback--correct"
    } else {
        "feedback feedback--incorrect"
    };

    rsx! {
        section { class: "{class}",
            h3 { "{feedback.headline()}" }
            p { class: "feedback__choice", "You chose: {feedback.chosen_text}" }
            p { class: "feedback__outcome", "{feedback.outcome}" }
            p { class: "feedback__delta", "{feedback.delta_label()}" }
            if let Some(tool) = feedback.tool_acquired.as_ref() {
                p { class: "feedback__tool", "New tool: {tool}" }
            }
        }
    }
}

#[component]
fn ResultsPanel(results: ResultsVm, on_intent: Callback<QuizIntent>) -> Element {
    rsx! {
        section { class: "results",
            h3 { class: "results__title", "{results.title()}" }
            p { "Score: {results.score}%" }
            p { "Experience: {results.experience} / {results.max_xp} XP" }
            p { "Correct answers: {results.correct} of {results.answered}" }
            div { class: "results__actions",
                button {
                    class: "btn btn-primary",
                    id: "quiz-restart",
                    r#type: "button",
                    onclick: move |_| on_intent.call(QuizIntent::Restart),
                    "Try again"
                }
                Link { class: "btn btn-secondary", to: Route::Home {}, "Back to quizzes" }
            }
        }
    }
}
