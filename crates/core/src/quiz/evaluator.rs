use thiserror::Error;

use crate::model::{
    AnsweredQuestion, QuestionBank, QuizStatus, ScenarioId, ScenarioRef, SelectedOption, Session,
    StateInconsistency,
};
use crate::quiz::policy::QuizConfig;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EvaluateError {
    #[error("quiz already finished ({0})")]
    Finished(QuizStatus),

    #[error("no scenario left after {answered} answers")]
    NoActiveScenario { answered: usize },

    #[error("option {index} does not exist on scenario {scenario} ({len} options)")]
    OptionOutOfRange {
        scenario: ScenarioId,
        index: usize,
        len: usize,
    },
}

/// How the answer for the active scenario was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Chosen(usize),
    /// The countdown ran out and an option was picked automatically.
    TimedOut { auto_selected: usize },
}

impl Selection {
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Selection::Chosen(index) | Selection::TimedOut { auto_selected: index } => index,
        }
    }

    #[must_use]
    pub fn is_timeout(self) -> bool {
        matches!(self, Selection::TimedOut { .. })
    }
}

/// Everything that changed while applying one answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub answer: AnsweredQuestion,
    pub experience_before: u32,
    pub experience_after: u32,
    pub tool_acquired: Option<String>,
    pub status: QuizStatus,
    pub resynced: Option<StateInconsistency>,
}

/// Apply `selection` to the active scenario of `bank` and advance `session`.
///
/// Correctness is the max-experience option; a timeout is always incorrect.
/// Experience moves by the option's delta, capped at `config.max_xp`. A loss
/// never takes experience below the quiz's floor for this point of the run;
/// the floor only limits losses and never lifts experience on its own. The
/// completion policy decides the resulting status.
///
/// # Errors
///
/// Returns `EvaluateError::Finished` for terminal sessions,
/// `EvaluateError::NoActiveScenario` past the end of the bank and
/// `EvaluateError::OptionOutOfRange` for unknown option indexes. The session is
/// left untouched on error apart from an index resync.
pub fn evaluate(
    session: &mut Session,
    bank: &QuestionBank,
    selection: Selection,
    time_spent_ms: u64,
    config: &QuizConfig,
) -> Result<AnswerOutcome, EvaluateError> {
    if session.status().is_terminal() {
        return Err(EvaluateError::Finished(session.status()));
    }

    let resynced = session.resync();
    let answered_before = session.answered_count();
    let scenario = bank
        .scenario_for(answered_before)
        .ok_or(EvaluateError::NoActiveScenario {
            answered: answered_before,
        })?;

    let index = selection.index();
    let option = scenario
        .option(index)
        .ok_or(EvaluateError::OptionOutOfRange {
            scenario: scenario.id(),
            index,
            len: scenario.options().len(),
        })?;

    let timed_out = selection.is_timeout();
    let is_correct = !timed_out && scenario.is_correct(index);

    let experience_before = session.experience();
    let experience_after = clamp_experience(
        experience_before,
        option.experience,
        config.floor.floor_for(answered_before),
        config.max_xp,
    );

    let answer = AnsweredQuestion {
        scenario: ScenarioRef::from(scenario),
        selected: SelectedOption::from_option(index, option),
        is_correct,
        time_spent_ms,
        timed_out,
    };
    session.record(answer.clone(), experience_after);

    let tool_acquired = option
        .tool
        .as_deref()
        .filter(|tool| session.acquire_tool(tool))
        .map(str::to_owned);

    let status = config.completion.judge(session);
    session.set_status(status);

    Ok(AnswerOutcome {
        answer,
        experience_before,
        experience_after,
        tool_acquired,
        status,
        resynced,
    })
}

fn clamp_experience(current: u32, delta: i32, floor: u32, max_xp: u32) -> u32 {
    let floor = floor.min(max_xp).min(current);
    let next = i64::from(current) + i64::from(delta);
    let clamped = next.clamp(i64::from(floor), i64::from(max_xp));
    u32::try_from(clamped).unwrap_or(floor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::bank::test_support::uniform_bank;
    use crate::model::{Level, QuizId, Scenario, ScenarioOption};
    use crate::quiz::level::QUESTIONS_PER_LEVEL;
    use crate::quiz::policy::{ExperienceFloor, ThresholdPolicy};

    const BEST: usize = 1;
    const WORST: usize = 2;

    #[test]
    fn best_option_is_correct_and_adds_experience() {
        let bank = uniform_bank(15, 5);
        let mut session = Session::new();
        let outcome = evaluate(
            &mut session,
            &bank,
            Selection::Chosen(BEST),
            2_000,
            &QuizConfig::default(),
        )
        .unwrap();

        assert!(outcome.answer.is_correct);
        assert_eq!(outcome.experience_after, 15);
        assert_eq!(session.experience(), 15);
        assert_eq!(session.current_index(), 1);
        assert_eq!(outcome.answer.time_spent_ms, 2_000);
        assert_eq!(outcome.status, QuizStatus::InProgress);
    }

    #[test]
    fn timeout_is_incorrect_even_on_best_option() {
        let bank = uniform_bank(15, 5);
        let mut session = Session::new();
        let outcome = evaluate(
            &mut session,
            &bank,
            Selection::TimedOut {
                auto_selected: BEST,
            },
            60_000,
            &QuizConfig::default(),
        )
        .unwrap();

        assert!(!outcome.answer.is_correct);
        assert!(outcome.answer.timed_out);
        assert_eq!(outcome.answer.selected.index, BEST);
    }

    #[test]
    fn experience_is_clamped_to_bounds() {
        let bank = uniform_bank(15, 50);
        let config = QuizConfig::default().with_max_xp(20);
        let mut session = Session::new();

        evaluate(&mut session, &bank, Selection::Chosen(WORST), 0, &config).unwrap();
        assert_eq!(session.experience(), 0);

        evaluate(&mut session, &bank, Selection::Chosen(BEST), 0, &config).unwrap();
        evaluate(&mut session, &bank, Selection::Chosen(BEST), 0, &config).unwrap();
        assert_eq!(session.experience(), 20);
    }

    #[test]
    fn experience_stays_in_bounds_for_every_answer() {
        let bank = uniform_bank(15, 40);
        let config = QuizConfig::default().with_max_xp(60);
        let mut session = Session::new();
        let picks = [BEST, WORST, BEST, BEST, BEST, BEST, WORST, WORST, 0, BEST];
        for pick in picks.iter().cycle().take(15) {
            evaluate(&mut session, &bank, Selection::Chosen(*pick), 0, &config).unwrap();
            assert!(session.experience() <= config.max_xp);
            assert_eq!(session.current_index(), session.history().len());
        }
        assert_eq!(session.history().len(), 15);
    }

    #[test]
    fn ratchet_floor_protects_finished_tiers() {
        let bank = uniform_bank(15, 100);
        let config = QuizConfig::default().with_floor(ExperienceFloor::Ratchet {
            basic: 35,
            intermediate: 110,
        });
        let mut session = Session::new();
        for _ in 0..QUESTIONS_PER_LEVEL {
            evaluate(&mut session, &bank, Selection::Chosen(BEST), 0, &config).unwrap();
        }
        assert_eq!(session.experience(), 75);

        let outcome = evaluate(&mut session, &bank, Selection::Chosen(WORST), 0, &config).unwrap();
        assert_eq!(outcome.experience_after, 35);
    }

    #[test]
    fn threshold_policy_fails_after_fifth_answer() {
        let bank = uniform_bank(15, 5);
        let config = QuizConfig::threshold(ThresholdPolicy::default());
        let mut session = Session::new();
        for n in 0..QUESTIONS_PER_LEVEL {
            let outcome =
                evaluate(&mut session, &bank, Selection::Chosen(WORST), 0, &config).unwrap();
            let expected = if n + 1 == QUESTIONS_PER_LEVEL {
                QuizStatus::Failed
            } else {
                QuizStatus::InProgress
            };
            assert_eq!(outcome.status, expected);
        }

        let err = evaluate(&mut session, &bank, Selection::Chosen(BEST), 0, &config).unwrap_err();
        assert_eq!(err, EvaluateError::Finished(QuizStatus::Failed));
        assert_eq!(session.history().len(), 5);
    }

    #[test]
    fn percentage_policy_completes_full_run() {
        let bank = uniform_bank(15, 5);
        let config = QuizConfig::percentage(70);
        let mut session = Session::new();
        for _ in 0..15 {
            evaluate(&mut session, &bank, Selection::Chosen(BEST), 0, &config).unwrap();
        }
        assert_eq!(session.status(), QuizStatus::Completed);
        assert_eq!(session.score(), 100);
        assert_eq!(session.history().len(), 15);
    }

    #[test]
    fn tools_are_granted_once() {
        let mut scenarios = Vec::new();
        for id in 1..=15_u32 {
            let level = Level::ALL[(id as usize - 1) / QUESTIONS_PER_LEVEL];
            scenarios.push(
                Scenario::new(
                    ScenarioId::new(id),
                    level,
                    "Tooling",
                    "",
                    vec![
                        ScenarioOption::new("use it", "", 10).with_tool("Test Plan"),
                        ScenarioOption::new("skip", "", 0),
                    ],
                )
                .unwrap(),
            );
        }
        let bank = QuestionBank::new(QuizId::parse("tools").unwrap(), "Tools", scenarios).unwrap();
        let config = QuizConfig::default();
        let mut session = Session::new();

        let first = evaluate(&mut session, &bank, Selection::Chosen(0), 0, &config).unwrap();
        let second = evaluate(&mut session, &bank, Selection::Chosen(0), 0, &config).unwrap();
        assert_eq!(first.tool_acquired.as_deref(), Some("Test Plan"));
        assert_eq!(second.tool_acquired, None);
        assert_eq!(session.tools().len(), 1);
    }

    #[test]
    fn unknown_option_leaves_session_untouched() {
        let bank = uniform_bank(15, 5);
        let mut session = Session::new();
        let err = evaluate(
            &mut session,
            &bank,
            Selection::Chosen(9),
            0,
            &QuizConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, EvaluateError::OptionOutOfRange { index: 9, len: 3, .. }));
        assert!(session.history().is_empty());
    }

    #[test]
    fn clamp_handles_extremes() {
        assert_eq!(clamp_experience(0, i32::MIN, 0, 300), 0);
        assert_eq!(clamp_experience(300, i32::MAX, 0, 300), 300);
        assert_eq!(clamp_experience(10, -5, 50, 40), 10);
        assert_eq!(clamp_experience(60, -30, 50, 300), 50);
    }

    #[test]
    fn ratchet_floor_never_lifts_experience() {
        let bank = uniform_bank(15, 5);
        let config = QuizConfig::percentage(70).with_floor(ExperienceFloor::Ratchet {
            basic: 35,
            intermediate: 110,
        });
        let mut session = Session::new();
        for _ in 0..QUESTIONS_PER_LEVEL {
            evaluate(&mut session, &bank, Selection::Chosen(WORST), 0, &config).unwrap();
        }
        assert_eq!(session.experience(), 0);

        let outcome = evaluate(&mut session, &bank, Selection::Chosen(0), 0, &config).unwrap();
        assert_eq!(outcome.experience_before, 0);
        assert_eq!(outcome.experience_after, 0);
    }
}
