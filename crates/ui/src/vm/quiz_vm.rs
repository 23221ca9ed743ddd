use quiz_core::model::{QuizResult, QuizStatus};
use services::{
    AnswerReport, AnswerTimer, QuizRun, QuizService, SessionError, StartedRun, TimerHandle, arm,
};

use crate::views::ViewError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuizPhase {
    Question,
    Feedback,
    Finished,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuizIntent {
    Select(usize),
    Submit,
    TimeOut,
    Next,
    Restart,
    DismissWarning,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OptionVm {
    pub index: usize,
    pub text: String,
    pub selected: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeedbackVm {
    pub correct: bool,
    pub timed_out: bool,
    pub chosen_text: String,
    pub outcome: String,
    pub experience_delta: i64,
    pub tool_acquired: Option<String>,
}

impl FeedbackVm {
    #[must_use]
    pub fn headline(&self) -> &'static str {
        match (self.timed_out, self.correct) {
            (true, _) => "Time's up!",
            (false, true) => "Good call!",
            (false, false) => "Not the best choice.",
        }
    }

    #[must_use]
    pub fn delta_label(&self) -> String {
        format!("{:+} XP", self.experience_delta)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResultsVm {
    pub passed: bool,
    pub score: u32,
    pub experience: u32,
    pub max_xp: u32,
    pub correct: usize,
    pub answered: usize,
}

impl ResultsVm {
    #[must_use]
    pub fn from_result(result: &QuizResult, max_xp: u32) -> Self {
        Self {
            passed: result.status == QuizStatus::Completed,
            score: result.score,
            experience: result.experience,
            max_xp,
            correct: result.question_history.iter().filter(|a| a.is_correct).count(),
            answered: result.questions_answered,
        }
    }

    #[must_use]
    pub fn title(&self) -> &'static str {
        if self.passed {
            "Quiz completed"
        } else {
            "Quiz failed"
        }
    }
}

/// How the pending answer was produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PendingAnswer {
    Chosen(Option<usize>),
    TimedOut,
}

/// An answer taken out of the view model while it is being saved.
///
/// The view model keeps rendering the current question (with submit
/// disabled) until [`QuizVm::complete_answer`] receives the response.
pub struct AnswerRequest {
    run: QuizRun,
    answer: PendingAnswer,
}

impl AnswerRequest {
    pub async fn send(mut self, service: &QuizService) -> AnswerResponse {
        let result = match self.answer {
            PendingAnswer::Chosen(selected) => service.submit(&mut self.run, selected).await,
            PendingAnswer::TimedOut => service.time_out(&mut self.run).await,
        };
        AnswerResponse {
            run: self.run,
            result,
        }
    }
}

pub struct AnswerResponse {
    run: QuizRun,
    result: Result<AnswerReport, SessionError>,
}

pub struct QuizVm {
    run: QuizRun,
    phase: QuizPhase,
    selected: Option<usize>,
    saving: bool,
    resumed: bool,
    last_report: Option<AnswerReport>,
    warning: Option<String>,
    timer: Option<TimerHandle>,
}

impl QuizVm {
    #[must_use]
    pub fn new(started: StartedRun) -> Self {
        let phase = if started.run.is_finished() {
            QuizPhase::Finished
        } else {
            QuizPhase::Question
        };
        Self {
            run: started.run,
            phase,
            selected: None,
            saving: false,
            resumed: started.resumed,
            last_report: None,
            warning: started.warnings.first().map(|w| w.message().to_owned()),
            timer: None,
        }
    }

    #[must_use]
    pub fn phase(&self) -> QuizPhase {
        self.phase
    }

    #[must_use]
    pub fn title(&self) -> &str {
        self.run.title()
    }

    #[must_use]
    pub fn resumed(&self) -> bool {
        self.resumed
    }

    #[must_use]
    pub fn is_saving(&self) -> bool {
        self.saving
    }

    #[must_use]
    pub fn scenario_title(&self) -> Option<&str> {
        self.run.current_scenario().map(|s| s.title())
    }

    #[must_use]
    pub fn scenario_description(&self) -> Option<&str> {
        self.run.current_scenario().map(|s| s.description())
    }

    #[must_use]
    pub fn options(&self) -> Vec<OptionVm> {
        self.run
            .current_scenario()
            .map(|scenario| {
                scenario
                    .options()
                    .iter()
                    .enumerate()
                    .map(|(index, option)| OptionVm {
                        index,
                        text: option.text.clone(),
                        selected: self.selected == Some(index),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    #[must_use]
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn select(&mut self, index: usize) {
        if self.phase == QuizPhase::Question && !self.saving {
            self.selected = Some(index);
        }
    }

    #[must_use]
    pub fn can_submit(&self) -> bool {
        self.phase == QuizPhase::Question && self.selected.is_some() && !self.saving
    }

    #[must_use]
    pub fn progress_label(&self) -> String {
        self.run.progress().label()
    }

    #[must_use]
    pub fn level_label(&self) -> Option<&'static str> {
        self.run.progress().level.map(|level| level.label())
    }

    #[must_use]
    pub fn experience_label(&self) -> String {
        let progress = self.run.progress();
        format!("{} / {} XP", progress.experience, progress.max_xp)
    }

    #[must_use]
    pub fn experience_percent(&self) -> u32 {
        self.run.progress().experience_percent()
    }

    #[must_use]
    pub fn tools(&self) -> Vec<String> {
        self.run.session().tools().iter().cloned().collect()
    }

    #[must_use]
    pub fn warning(&self) -> Option<&str> {
        self.warning.as_deref()
    }

    pub fn dismiss_warning(&mut self) {
        self.warning = None;
    }

    #[must_use]
    pub fn feedback(&self) -> Option<FeedbackVm> {
        let report = self.last_report.as_ref()?;
        Some(FeedbackVm {
            correct: report.answered.is_correct,
            timed_out: report.answered.timed_out,
            chosen_text: report.answered.selected.text.clone(),
            outcome: report.answered.selected.outcome.clone(),
            experience_delta: report.experience_delta,
            tool_acquired: report.tool_acquired.clone(),
        })
    }

    #[must_use]
    pub fn results(&self) -> Option<ResultsVm> {
        self.run
            .result()
            .map(|result| ResultsVm::from_result(result, self.run.config().max_xp))
    }

    /// Start the countdown for the question on screen.
    ///
    /// Returns `None` outside the question phase, while a save is in flight,
    /// or when a countdown is already running.
    pub fn arm_timer(&mut self) -> Option<AnswerTimer> {
        if self.phase != QuizPhase::Question || self.saving || self.timer.is_some() {
            return None;
        }
        let (timer, handle) = arm(self.run.config().time_limit);
        self.timer = Some(handle);
        Some(timer)
    }

    #[must_use]
    pub fn remaining_secs(&self) -> Option<u64> {
        self.timer.as_ref().map(TimerHandle::remaining_secs)
    }

    fn cancel_timer(&mut self) {
        if let Some(handle) = self.timer.take() {
            handle.cancel();
        }
    }

    /// Take the pending answer out for saving. `Ok(None)` while a save is
    /// already in flight or outside the question phase.
    ///
    /// # Errors
    ///
    /// Returns `ViewError::NoSelection` for a manual submit with nothing
    /// selected; the countdown keeps running.
    pub fn begin_answer(
        &mut self,
        answer: PendingAnswer,
    ) -> Result<Option<AnswerRequest>, ViewError> {
        if self.saving || self.phase != QuizPhase::Question {
            return Ok(None);
        }
        if answer == PendingAnswer::Chosen(None) {
            return Err(ViewError::NoSelection);
        }
        self.cancel_timer();
        self.saving = true;
        Ok(Some(AnswerRequest {
            run: self.run.clone(),
            answer,
        }))
    }

    /// Apply a finished save.
    ///
    /// # Errors
    ///
    /// Returns the `ViewError` for the failed answer; the question stays on
    /// screen so the user can try again, and [`QuizVm::arm_timer`] starts a
    /// new countdown for it.
    pub fn complete_answer(&mut self, response: AnswerResponse) -> Result<(), ViewError> {
        self.saving = false;
        let report = match response.result {
            Ok(report) => report,
            Err(err) => return Err(ViewError::from(&err)),
        };

        self.run = response.run;
        self.selected = None;
        if let Some(warning) = report.warnings.first() {
            self.warning = Some(warning.message().to_owned());
        }
        self.phase = if report.is_final() {
            QuizPhase::Finished
        } else {
            QuizPhase::Feedback
        };
        self.last_report = Some(report);
        Ok(())
    }

    /// Move from feedback to the next question.
    pub fn next(&mut self) {
        if self.phase == QuizPhase::Feedback {
            self.phase = if self.run.is_finished() {
                QuizPhase::Finished
            } else {
                QuizPhase::Question
            };
        }
    }

    /// # Errors
    ///
    /// Returns `ViewError` when the fresh run cannot be saved.
    pub async fn restart(&mut self, service: &QuizService) -> Result<(), ViewError> {
        self.cancel_timer();
        let warnings = service
            .restart(&mut self.run)
            .await
            .map_err(|err| ViewError::from(&err))?;
        self.phase = QuizPhase::Question;
        self.selected = None;
        self.last_report = None;
        self.resumed = false;
        self.warning = warnings.first().map(|w| w.message().to_owned());
        Ok(())
    }
}

/// # Errors
///
/// Returns `ViewError::UnknownQuiz` for names not in the catalog and
/// `ViewError::SessionExpired` when credentials are rejected.
pub async fn start_quiz(service: &QuizService, quiz_id: &str) -> Result<QuizVm, ViewError> {
    let started = service
        .start(quiz_id)
        .await
        .map_err(|err| ViewError::from(&err))?;
    Ok(QuizVm::new(started))
}
