use std::sync::Arc;

use quiz_core::model::{QuizId, QuizResult, Username};
use storage::repository::{QuizResultRepository, QuizResultRow, StorageError};

use super::test_harness::{
    ViewHarness, ViewKind, setup_view_harness, setup_view_harness_with_results_repo,
};

async fn settle(harness: &mut ViewHarness) {
    harness.rebuild();
    for _ in 0..3 {
        harness.drive_async().await;
    }
}

#[tokio::test(flavor = "current_thread")]
async fn home_view_smoke_lists_quizzes() {
    let mut harness = setup_view_harness(ViewKind::Home);
    harness.rebuild();
    let html = harness.render();
    assert!(html.contains("Tester Mindset"), "missing quiz in {html}");
    assert!(html.contains("Time Management"), "missing quiz in {html}");
    assert!(html.contains("60 seconds per question"), "missing time limit in {html}");
    assert!(html.contains("Offline mode"), "missing offline banner in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn quiz_view_smoke_renders_first_question() {
    let mut harness = setup_view_harness(ViewKind::Quiz("tester-mindset".to_owned()));
    settle(&mut harness).await;
    let html = harness.render();
    assert!(html.contains("Understanding the Project"), "missing scenario in {html}");
    assert!(html.contains("Question 1 of 15"), "missing progress in {html}");
    assert!(html.contains("0 / 300 XP"), "missing experience in {html}");
    assert!(html.contains("Submit"), "missing submit in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn quiz_view_smoke_reports_unknown_quiz() {
    let mut harness = setup_view_harness(ViewKind::Quiz("astronomy".to_owned()));
    settle(&mut harness).await;
    let html = harness.render();
    assert!(html.contains("This quiz does not exist."), "missing error in {html}");
    assert!(!html.contains("Retry"), "unexpected retry in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn history_view_smoke_renders_empty_state() {
    let mut harness = setup_view_harness(ViewKind::History);
    settle(&mut harness).await;
    let html = harness.render();
    assert!(html.contains("No finished quizzes yet."), "missing empty state in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn history_view_smoke_renders_failed_run() {
    let mut harness = setup_view_harness(ViewKind::History);
    let service = Arc::clone(&harness.quiz_service);
    let mut run = service.start("time-management").await.unwrap().run;
    while !run.is_finished() {
        let scenario = run.current_scenario().unwrap();
        let wrong = (scenario.correct_option_index() + 1) % scenario.options().len();
        service.submit(&mut run, Some(wrong)).await.unwrap();
    }

    settle(&mut harness).await;
    let html = harness.render();
    assert!(html.contains("time-management"), "missing quiz id in {html}");
    assert!(html.contains("Failed"), "missing status in {html}");
    assert!(html.contains("Answered: 5"), "missing answered count in {html}");
}

struct FailingResultsRepo;

#[async_trait::async_trait]
impl QuizResultRepository for FailingResultsRepo {
    async fn append_result(
        &self,
        _username: &Username,
        _result: &QuizResult,
    ) -> Result<i64, StorageError> {
        Err(StorageError::Connection("fail".to_string()))
    }

    async fn list_results(
        &self,
        _username: &Username,
        _quiz_id: Option<&QuizId>,
        _limit: u32,
    ) -> Result<Vec<QuizResultRow>, StorageError> {
        Err(StorageError::Connection("fail".to_string()))
    }
}

#[tokio::test(flavor = "current_thread")]
async fn history_view_smoke_renders_error_state() {
    let mut harness =
        setup_view_harness_with_results_repo(ViewKind::History, Arc::new(FailingResultsRepo));
    settle(&mut harness).await;
    let html = harness.render();
    assert!(html.contains("Something went wrong"), "missing error in {html}");
    assert!(html.contains("Retry"), "missing retry in {html}");
}
