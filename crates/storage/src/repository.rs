use async_trait::async_trait;
use quiz_core::model::{ProgressKey, QuizId, QuizResult, SessionSnapshot, Username};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// A stored quiz result with its row id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizResultRow {
    pub id: i64,
    pub username: Username,
    pub result: QuizResult,
}

/// Local mirror of in-progress quiz snapshots, keyed by user and quiz.
///
/// The mirror is a resilience copy: it is written on every save and read only
/// when the remote progress store is unreachable.
#[async_trait]
pub trait ProgressMirrorRepository: Send + Sync {
    /// Insert or replace the snapshot stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the snapshot cannot be stored.
    async fn save_mirror(
        &self,
        key: &ProgressKey,
        snapshot: &SessionSnapshot,
    ) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` for backend failures; a missing entry is `Ok(None)`.
    async fn load_mirror(&self, key: &ProgressKey) -> Result<Option<SessionSnapshot>, StorageError>;

    /// Remove the entry for `key`; returns whether one existed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for backend failures.
    async fn purge_mirror(&self, key: &ProgressKey) -> Result<bool, StorageError>;
}

/// Append-only record of finished runs.
#[async_trait]
pub trait QuizResultRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the result cannot be stored.
    async fn append_result(
        &self,
        username: &Username,
        result: &QuizResult,
    ) -> Result<i64, StorageError>;

    /// Most recent results first, optionally limited to one quiz.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for backend or decoding failures.
    async fn list_results(
        &self,
        username: &Username,
        quiz_id: Option<&QuizId>,
        limit: u32,
    ) -> Result<Vec<QuizResultRow>, StorageError>;
}

//
// ─── IN-MEMORY ────────────────────────────────────────────────────────────────
//

/// Simple in-memory repository for tests and offline prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    mirror: Arc<Mutex<HashMap<String, SessionSnapshot>>>,
    results: Arc<Mutex<Vec<QuizResultRow>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProgressMirrorRepository for InMemoryRepository {
    async fn save_mirror(
        &self,
        key: &ProgressKey,
        snapshot: &SessionSnapshot,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .mirror
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(key.mirror_key(), snapshot.clone());
        Ok(())
    }

    async fn load_mirror(&self, key: &ProgressKey) -> Result<Option<SessionSnapshot>, StorageError> {
        let guard = self
            .mirror
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&key.mirror_key()).cloned())
    }

    async fn purge_mirror(&self, key: &ProgressKey) -> Result<bool, StorageError> {
        let mut guard = self
            .mirror
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.remove(&key.mirror_key()).is_some())
    }
}

#[async_trait]
impl QuizResultRepository for InMemoryRepository {
    async fn append_result(
        &self,
        username: &Username,
        result: &QuizResult,
    ) -> Result<i64, StorageError> {
        let mut guard = self
            .results
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let id = i64::try_from(guard.len() + 1)
            .map_err(|_| StorageError::Serialization("result id overflow".into()))?;
        guard.push(QuizResultRow {
            id,
            username: username.clone(),
            result: result.clone(),
        });
        Ok(id)
    }

    async fn list_results(
        &self,
        username: &Username,
        quiz_id: Option<&QuizId>,
        limit: u32,
    ) -> Result<Vec<QuizResultRow>, StorageError> {
        let guard = self
            .results
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut rows: Vec<QuizResultRow> = guard
            .iter()
            .filter(|row| &row.username == username)
            .filter(|row| quiz_id.is_none_or(|id| &row.result.quiz_name == id))
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            b.result
                .completed_at
                .cmp(&a.result.completed_at)
                .then(b.id.cmp(&a.id))
        });
        rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(rows)
    }
}

/// Aggregates the repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub mirror: Arc<dyn ProgressMirrorRepository>,
    pub results: Arc<dyn QuizResultRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let mirror: Arc<dyn ProgressMirrorRepository> = Arc::new(repo.clone());
        let results: Arc<dyn QuizResultRepository> = Arc::new(repo);
        Self { mirror, results }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use quiz_core::model::{QuizStatus, Session};
    use quiz_core::time::fixed_now;

    fn key(user: &str, quiz: &str) -> ProgressKey {
        ProgressKey::new(Username::new(user).unwrap(), QuizId::parse(quiz).unwrap())
    }

    fn result(quiz: &str, minutes: i64) -> QuizResult {
        QuizResult::from_session(
            &QuizId::parse(quiz).unwrap(),
            &Session::new(),
            fixed_now() + Duration::minutes(minutes),
        )
    }

    #[tokio::test]
    async fn mirror_round_trips_and_purges() {
        let repo = InMemoryRepository::new();
        let key = key("alice", "tester-mindset");
        let snapshot = Session::new().snapshot(fixed_now());

        assert_eq!(repo.load_mirror(&key).await.unwrap(), None);
        repo.save_mirror(&key, &snapshot).await.unwrap();
        assert_eq!(repo.load_mirror(&key).await.unwrap(), Some(snapshot));

        assert!(repo.purge_mirror(&key).await.unwrap());
        assert!(!repo.purge_mirror(&key).await.unwrap());
        assert_eq!(repo.load_mirror(&key).await.unwrap(), None);
    }

    #[tokio::test]
    async fn mirror_entries_are_isolated_per_user() {
        let repo = InMemoryRepository::new();
        let snapshot = Session::new().snapshot(fixed_now());
        repo.save_mirror(&key("alice", "risk-analysis"), &snapshot)
            .await
            .unwrap();
        assert_eq!(
            repo.load_mirror(&key("bob", "risk-analysis")).await.unwrap(),
            None
        );
        // Spelling variants normalize to the same key.
        assert!(
            repo.load_mirror(&key("alice", "Risk_Analysis"))
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn results_list_newest_first_and_filter_by_quiz() {
        let repo = InMemoryRepository::new();
        let alice = Username::new("alice").unwrap();
        repo.append_result(&alice, &result("a", 1)).await.unwrap();
        repo.append_result(&alice, &result("b", 2)).await.unwrap();
        repo.append_result(&alice, &result("a", 3)).await.unwrap();
        repo.append_result(&Username::new("bob").unwrap(), &result("a", 4))
            .await
            .unwrap();

        let all = repo.list_results(&alice, None, 10).await.unwrap();
        assert_eq!(all.iter().map(|r| r.id).collect::<Vec<_>>(), vec![3, 2, 1]);

        let only_a = repo
            .list_results(&alice, Some(&QuizId::parse("a").unwrap()), 1)
            .await
            .unwrap();
        assert_eq!(only_a.len(), 1);
        assert_eq!(only_a[0].id, 3);
        assert_eq!(only_a[0].result.status, QuizStatus::InProgress);
    }
}
