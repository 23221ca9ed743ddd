use quiz_core::quiz::CompletionPolicy;
use services::{QuizCatalog, QuizEntry};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuizCardVm {
    pub quiz_id: String,
    pub title: String,
    pub rules: String,
    pub time_limit_secs: u64,
}

impl From<&QuizEntry> for QuizCardVm {
    fn from(entry: &QuizEntry) -> Self {
        let rules = match entry.config.completion {
            CompletionPolicy::Threshold(policy) => format!(
                "Reach {} / {} / {} XP after each tier",
                policy.basic_min, policy.intermediate_min, policy.advanced_min
            ),
            CompletionPolicy::Percentage(policy) => {
                format!("Answer {}% of the questions correctly", policy.pass_percent)
            }
        };
        Self {
            quiz_id: entry.quiz_id().to_string(),
            title: entry.title().to_owned(),
            rules,
            time_limit_secs: entry.config.time_limit.as_secs(),
        }
    }
}

#[must_use]
pub fn map_quiz_cards(catalog: &QuizCatalog) -> Vec<QuizCardVm> {
    catalog.entries().map(QuizCardVm::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cards_describe_each_quiz() {
        let catalog = QuizCatalog::builtin().unwrap();
        let cards = map_quiz_cards(&catalog);
        assert_eq!(cards.len(), 2);

        let tester = cards.iter().find(|c| c.quiz_id == "tester-mindset").unwrap();
        assert_eq!(tester.title, "Tester Mindset");
        assert_eq!(tester.rules, "Answer 70% of the questions correctly");
        assert_eq!(tester.time_limit_secs, 60);

        let time = cards.iter().find(|c| c.quiz_id == "time-management").unwrap();
        assert_eq!(time.rules, "Reach 35 / 110 / 200 XP after each tier");
    }
}
