use crate::model::Level;

/// Scenarios answered per tier before the run moves on.
pub const QUESTIONS_PER_LEVEL: usize = 5;

/// Scenarios in a full run (three tiers of five).
pub const TOTAL_QUESTIONS: usize = QUESTIONS_PER_LEVEL * Level::ALL.len();

/// Position of the next scenario: its tier and the index inside that tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelSlot {
    pub level: Level,
    pub index: usize,
}

/// Map the number of answered questions to the tier slot of the next scenario.
///
/// Returns `None` once a full run has been answered.
#[must_use]
pub fn select_level(questions_answered: usize) -> Option<LevelSlot> {
    let tier = questions_answered / QUESTIONS_PER_LEVEL;
    let level = *Level::ALL.get(tier)?;
    Some(LevelSlot {
        level,
        index: questions_answered % QUESTIONS_PER_LEVEL,
    })
}

/// Tier whose last question has just been answered, if `questions_answered`
/// sits exactly on a tier boundary.
#[must_use]
pub fn completed_tier(questions_answered: usize) -> Option<Level> {
    if questions_answered == 0 || questions_answered % QUESTIONS_PER_LEVEL != 0 {
        return None;
    }
    Level::ALL
        .get(questions_answered / QUESTIONS_PER_LEVEL - 1)
        .copied()
}
