use std::time::Duration;

use crate::model::{Level, QuizStatus, Session};
use crate::quiz::level::{TOTAL_QUESTIONS, completed_tier};

//
// ─── COMPLETION POLICIES ──────────────────────────────────────────────────────
//

/// Fails the run as soon as a tier ends below its experience minimum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdPolicy {
    pub basic_min: u32,
    pub intermediate_min: u32,
    pub advanced_min: u32,
}

impl ThresholdPolicy {
    #[must_use]
    pub fn minimum_for(&self, level: Level) -> u32 {
        match level {
            Level::Basic => self.basic_min,
            Level::Intermediate => self.intermediate_min,
            Level::Advanced => self.advanced_min,
        }
    }
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        Self {
            basic_min: 35,
            intermediate_min: 110,
            advanced_min: 200,
        }
    }
}

/// Always plays the full run; passes when enough answers were correct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PercentagePolicy {
    /// Required share of correct answers, in whole percent (0–100).
    pub pass_percent: u32,
}

impl Default for PercentagePolicy {
    fn default() -> Self {
        Self { pass_percent: 70 }
    }
}

/// How a quiz decides between `Completed` and `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionPolicy {
    Threshold(ThresholdPolicy),
    Percentage(PercentagePolicy),
}

impl CompletionPolicy {
    /// Status of `session` after its latest answer.
    #[must_use]
    pub fn judge(&self, session: &Session) -> QuizStatus {
        let answered = session.answered_count();
        match self {
            CompletionPolicy::Threshold(policy) => {
                let Some(tier) = completed_tier(answered.min(TOTAL_QUESTIONS)) else {
                    return QuizStatus::InProgress;
                };
                if session.experience() < policy.minimum_for(tier) {
                    QuizStatus::Failed
                } else if answered >= TOTAL_QUESTIONS {
                    QuizStatus::Completed
                } else {
                    QuizStatus::InProgress
                }
            }
            CompletionPolicy::Percentage(policy) => {
                if answered < TOTAL_QUESTIONS {
                    return QuizStatus::InProgress;
                }
                let correct = u32::try_from(session.correct_count()).unwrap_or(u32::MAX);
                let total = u32::try_from(TOTAL_QUESTIONS).unwrap_or(u32::MAX);
                if correct.saturating_mul(100) >= policy.pass_percent.saturating_mul(total) {
                    QuizStatus::Completed
                } else {
                    QuizStatus::Failed
                }
            }
        }
    }

    #[must_use]
    pub fn is_threshold(&self) -> bool {
        matches!(self, CompletionPolicy::Threshold(_))
    }
}

impl Default for CompletionPolicy {
    fn default() -> Self {
        CompletionPolicy::Percentage(PercentagePolicy::default())
    }
}

//
// ─── EXPERIENCE FLOOR ─────────────────────────────────────────────────────────
//

/// Lower bound on experience once earlier tiers are behind the player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExperienceFloor {
    /// Experience may drop to zero at any point.
    #[default]
    Disabled,
    /// After five answers experience never drops below `basic`, after ten
    /// never below `intermediate`.
    Ratchet { basic: u32, intermediate: u32 },
}

impl ExperienceFloor {
    /// Floor that applies to the answer following `answered_before` answers.
    #[must_use]
    pub fn floor_for(&self, answered_before: usize) -> u32 {
        match *self {
            ExperienceFloor::Disabled => 0,
            ExperienceFloor::Ratchet {
                basic,
                intermediate,
            } => match completed_tiers(answered_before) {
                0 => 0,
                1 => basic,
                _ => intermediate.max(basic),
            },
        }
    }
}

fn completed_tiers(answered: usize) -> usize {
    answered / crate::quiz::level::QUESTIONS_PER_LEVEL
}

//
// ─── CONFIG ───────────────────────────────────────────────────────────────────
//

/// Per-quiz behaviour. Every topic carries one explicitly instead of forking
/// the control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizConfig {
    pub max_xp: u32,
    pub completion: CompletionPolicy,
    pub floor: ExperienceFloor,
    /// Countdown per question before an automatic, incorrect answer.
    pub time_limit: Duration,
}

impl QuizConfig {
    pub const DEFAULT_MAX_XP: u32 = 300;
    pub const DEFAULT_TIME_LIMIT: Duration = Duration::from_secs(60);

    #[must_use]
    pub fn threshold(policy: ThresholdPolicy) -> Self {
        Self {
            completion: CompletionPolicy::Threshold(policy),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn percentage(pass_percent: u32) -> Self {
        Self {
            completion: CompletionPolicy::Percentage(PercentagePolicy {
                pass_percent: pass_percent.min(100),
            }),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_max_xp(mut self, max_xp: u32) -> Self {
        self.max_xp = max_xp;
        self
    }

    #[must_use]
    pub fn with_floor(mut self, floor: ExperienceFloor) -> Self {
        self.floor = floor;
        self
    }

    #[must_use]
    pub fn with_time_limit(mut self, time_limit: Duration) -> Self {
        self.time_limit = time_limit;
        self
    }
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            max_xp: Self::DEFAULT_MAX_XP,
            completion: CompletionPolicy::default(),
            floor: ExperienceFloor::Disabled,
            time_limit: Self::DEFAULT_TIME_LIMIT,
        }
    }
}
