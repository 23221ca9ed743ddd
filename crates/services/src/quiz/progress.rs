use quiz_core::model::{Level, QuizStatus};

/// Aggregated view of run progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunProgress {
    pub answered: usize,
    pub total: usize,
    /// Tier of the scenario on screen, `None` once the run is over.
    pub level: Option<Level>,
    pub experience: u32,
    pub max_xp: u32,
    pub correct: usize,
    pub status: QuizStatus,
}

impl RunProgress {
    /// One-based number of the question on screen, capped at `total`.
    #[must_use]
    pub fn question_number(&self) -> usize {
        (self.answered + 1).min(self.total)
    }

    #[must_use]
    pub fn label(&self) -> String {
        format!("Question {} of {}", self.question_number(), self.total)
    }

    /// Share of `max_xp` earned, in whole percent.
    #[must_use]
    pub fn experience_percent(&self) -> u32 {
        if self.max_xp == 0 {
            return 0;
        }
        let percent = u64::from(self.experience) * 100 / u64::from(self.max_xp);
        u32::try_from(percent.min(100)).unwrap_or(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progress(answered: usize, experience: u32) -> RunProgress {
        RunProgress {
            answered,
            total: 15,
            level: Some(Level::Basic),
            experience,
            max_xp: 300,
            correct: 0,
            status: QuizStatus::InProgress,
        }
    }

    #[test]
    fn label_counts_from_one_and_caps_at_total() {
        assert_eq!(progress(0, 0).label(), "Question 1 of 15");
        assert_eq!(progress(14, 0).label(), "Question 15 of 15");
        assert_eq!(progress(15, 0).label(), "Question 15 of 15");
    }

    #[test]
    fn experience_percent_is_bounded() {
        assert_eq!(progress(0, 150).experience_percent(), 50);
        assert_eq!(progress(0, 900).experience_percent(), 100);
        let mut empty = progress(0, 10);
        empty.max_xp = 0;
        assert_eq!(empty.experience_percent(), 0);
    }
}
