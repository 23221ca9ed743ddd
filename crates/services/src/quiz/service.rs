use std::sync::Arc;

use quiz_core::Clock;
use quiz_core::model::{AnsweredQuestion, QuizId, QuizResult, QuizStatus, Session};
use quiz_core::quiz::{EvaluateError, Selection, evaluate};
use rand::{Rng, rng};
use storage::repository::QuizResultRow;
use tracing::{debug, info, warn};

use super::run::QuizRun;
use crate::catalog::QuizCatalog;
use crate::error::{PersistenceWarning, SessionError};
use crate::gateway::{ProgressGateway, ProgressSource};

/// A run ready to play, with how it was obtained.
#[derive(Debug, Clone)]
pub struct StartedRun {
    pub run: QuizRun,
    pub source: ProgressSource,
    /// `true` when an in-progress snapshot was restored.
    pub resumed: bool,
    pub warnings: Vec<PersistenceWarning>,
}

/// What the UI needs to render after one answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerReport {
    pub answered: AnsweredQuestion,
    pub experience: u32,
    pub experience_delta: i64,
    pub status: QuizStatus,
    pub tool_acquired: Option<String>,
    pub warnings: Vec<PersistenceWarning>,
    /// Present once the run reached a terminal status.
    pub result: Option<QuizResult>,
}

impl AnswerReport {
    #[must_use]
    pub fn is_final(&self) -> bool {
        self.result.is_some()
    }
}

/// Starts, advances and persists quiz runs for one user.
#[derive(Clone)]
pub struct QuizService {
    clock: Clock,
    catalog: Arc<QuizCatalog>,
    gateway: Arc<ProgressGateway>,
}

impl QuizService {
    #[must_use]
    pub fn new(clock: Clock, catalog: Arc<QuizCatalog>, gateway: Arc<ProgressGateway>) -> Self {
        Self {
            clock,
            catalog,
            gateway,
        }
    }

    #[must_use]
    pub fn catalog(&self) -> &QuizCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn gateway(&self) -> &ProgressGateway {
        &self.gateway
    }

    /// Start or resume `quiz`.
    ///
    /// A stored in-progress snapshot is restored; a finished one, or one whose
    /// history already decides the run, starts a fresh run.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::UnknownQuiz`/`SessionError::QuizId` for bad quiz
    /// names and `SessionError::Gateway` when credentials are rejected.
    pub async fn start(&self, quiz: &str) -> Result<StartedRun, SessionError> {
        let entry = self.catalog.get(quiz)?.clone();
        let quiz_id = entry.quiz_id().clone();
        let loaded = self.gateway.load(&quiz_id).await?;

        let (session, resumed) = match loaded.snapshot {
            Some(snapshot) if !snapshot.status.is_terminal() => {
                let restored = Session::restore(&snapshot, &entry.config);
                if let Some(repaired) = restored.repaired {
                    warn!(quiz = %quiz_id, %repaired, "resynced restored session");
                }
                if restored.truncated > 0 {
                    warn!(quiz = %quiz_id, dropped = restored.truncated, "dropped answers past a full run");
                }
                match restored.rejudged {
                    Some(status) => {
                        warn!(quiz = %quiz_id, %status, "stored run was already over; starting over");
                        (Session::new(), false)
                    }
                    None => (restored.session, true),
                }
            }
            Some(snapshot) => {
                debug!(quiz = %quiz_id, status = %snapshot.status, "stored run already finished; starting over");
                (Session::new(), false)
            }
            None => (Session::new(), false),
        };

        info!(
            quiz = %quiz_id,
            source = ?loaded.source,
            resumed,
            answered = session.answered_count(),
            "quiz started"
        );
        Ok(StartedRun {
            run: QuizRun::new(entry, session, self.clock.now()),
            source: loaded.source,
            resumed,
            warnings: loaded.warnings,
        })
    }

    /// Submit the selected option for the scenario on screen.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoSelection` when nothing is selected,
    /// `SessionError::Evaluate` for finished runs or unknown options, and
    /// `SessionError::Gateway` when credentials are rejected.
    pub async fn submit(
        &self,
        run: &mut QuizRun,
        selected: Option<usize>,
    ) -> Result<AnswerReport, SessionError> {
        let index = selected.ok_or(SessionError::NoSelection)?;
        self.answer(run, Selection::Chosen(index)).await
    }

    /// Record an automatic, incorrect answer after the countdown expired.
    ///
    /// # Errors
    ///
    /// Same as [`QuizService::submit`], minus `NoSelection`.
    pub async fn time_out(&self, run: &mut QuizRun) -> Result<AnswerReport, SessionError> {
        let selection = timeout_selection(run, &mut rng())?;
        self.answer(run, selection).await
    }

    /// [`QuizService::time_out`] with a caller-provided random source.
    ///
    /// # Errors
    ///
    /// Same as [`QuizService::time_out`].
    pub async fn time_out_with<R: Rng>(
        &self,
        run: &mut QuizRun,
        rng: &mut R,
    ) -> Result<AnswerReport, SessionError> {
        let selection = timeout_selection(run, rng)?;
        self.answer(run, selection).await
    }

    /// Throw away the current run and start again from the first scenario.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Gateway` when credentials are rejected.
    pub async fn restart(&self, run: &mut QuizRun) -> Result<Vec<PersistenceWarning>, SessionError> {
        let now = self.clock.now();
        let entry = self
            .catalog
            .entry(run.quiz_id())
            .cloned()
            .ok_or_else(|| SessionError::UnknownQuiz(run.quiz_id().clone()))?;
        *run = QuizRun::new(entry, Session::new(), now);
        let ack = self
            .gateway
            .save(run.quiz_id(), &run.session.snapshot(now))
            .await?;
        info!(quiz = %run.quiz_id(), "quiz restarted");
        Ok(ack.warnings)
    }

    /// Finished runs recorded on this device, newest first.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if results cannot be read.
    pub async fn history(
        &self,
        quiz_id: Option<&QuizId>,
        limit: u32,
    ) -> Result<Vec<QuizResultRow>, SessionError> {
        Ok(self.gateway.recent_results(quiz_id, limit).await?)
    }

    async fn answer(
        &self,
        run: &mut QuizRun,
        selection: Selection,
    ) -> Result<AnswerReport, SessionError> {
        let now = self.clock.now();
        let time_spent_ms = if selection.is_timeout() {
            u64::try_from(run.config().time_limit.as_millis()).unwrap_or(u64::MAX)
        } else {
            self.clock.millis_since(run.question_shown_at)
        };

        let config = *run.config();
        let bank = Arc::clone(run.bank());
        let outcome = evaluate(&mut run.session, &bank, selection, time_spent_ms, &config)?;
        if let Some(repaired) = outcome.resynced {
            warn!(quiz = %run.quiz_id(), %repaired, "resynced session before answering");
        }
        debug!(
            quiz = %run.quiz_id(),
            scenario = %outcome.answer.scenario.id,
            correct = outcome.answer.is_correct,
            timed_out = outcome.answer.timed_out,
            experience = outcome.experience_after,
            "answer recorded"
        );

        run.question_shown_at = now;
        let snapshot = run.session.snapshot(now);
        let quiz_id = run.quiz_id().clone();

        let (warnings, result) = if outcome.status.is_terminal() {
            let result = QuizResult::from_session(&quiz_id, &run.session, now);
            let ack = self.gateway.finish(&quiz_id, &snapshot, &result).await?;
            run.result = Some(result.clone());
            (ack.all_warnings().cloned().collect(), Some(result))
        } else {
            let ack = self.gateway.save(&quiz_id, &snapshot).await?;
            (ack.warnings, None)
        };

        let report = AnswerReport {
            answered: outcome.answer.clone(),
            experience: outcome.experience_after,
            experience_delta: i64::from(outcome.experience_after)
                - i64::from(outcome.experience_before),
            status: outcome.status,
            tool_acquired: outcome.tool_acquired.clone(),
            warnings,
            result,
        };
        run.last_outcome = Some(outcome);
        Ok(report)
    }
}

fn timeout_selection<R: Rng + ?Sized>(run: &QuizRun, rng: &mut R) -> Result<Selection, SessionError> {
    if run.is_finished() {
        return Err(EvaluateError::Finished(run.status()).into());
    }
    let scenario = run
        .current_scenario()
        .ok_or(EvaluateError::NoActiveScenario {
            answered: run.session().answered_count(),
        })?;
    let auto_selected = rng.random_range(0..scenario.options().len());
    Ok(Selection::TimedOut { auto_selected })
}
