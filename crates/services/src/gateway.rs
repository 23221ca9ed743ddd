use std::sync::Arc;

use quiz_core::model::{
    ProgressKey, QuizId, QuizResult, QuizStatus, SessionSnapshot, Username,
};
use storage::repository::{
    ProgressMirrorRepository, QuizResultRepository, QuizResultRow, StorageError,
};
use tracing::{debug, info, warn};

use crate::error::{GatewayError, PersistenceStage, PersistenceWarning, RemoteError};
use crate::remote::RemoteProgressStore;

/// Where a loaded snapshot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressSource {
    Remote,
    Mirror,
    Fresh,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedProgress {
    pub snapshot: Option<SessionSnapshot>,
    pub source: ProgressSource,
    pub warnings: Vec<PersistenceWarning>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveAck {
    pub remote_saved: bool,
    pub mirror_saved: bool,
    pub warnings: Vec<PersistenceWarning>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FinishAck {
    pub save: SaveAck,
    pub result_id: Option<i64>,
    pub result_submitted: bool,
    pub mirror_purged: bool,
    pub warnings: Vec<PersistenceWarning>,
}

impl FinishAck {
    /// Every warning raised while finishing, save warnings first.
    pub fn all_warnings(&self) -> impl Iterator<Item = &PersistenceWarning> {
        self.save.warnings.iter().chain(self.warnings.iter())
    }
}

/// Persists quiz progress for one user.
///
/// The remote store is authoritative whenever it answers. Every save also
/// lands in the local mirror so a later load can recover when the remote is
/// unreachable. Only rejected credentials stop the quiz; other failures come
/// back as [`PersistenceWarning`]s.
#[derive(Clone)]
pub struct ProgressGateway {
    username: Username,
    remote: Option<Arc<dyn RemoteProgressStore>>,
    mirror: Arc<dyn ProgressMirrorRepository>,
    results: Arc<dyn QuizResultRepository>,
}

impl ProgressGateway {
    #[must_use]
    pub fn new(
        username: Username,
        remote: Option<Arc<dyn RemoteProgressStore>>,
        mirror: Arc<dyn ProgressMirrorRepository>,
        results: Arc<dyn QuizResultRepository>,
    ) -> Self {
        Self {
            username,
            remote,
            mirror,
            results,
        }
    }

    /// Gateway that only uses the local mirror.
    #[must_use]
    pub fn offline(
        username: Username,
        mirror: Arc<dyn ProgressMirrorRepository>,
        results: Arc<dyn QuizResultRepository>,
    ) -> Self {
        Self::new(username, None, mirror, results)
    }

    #[must_use]
    pub fn username(&self) -> &Username {
        &self.username
    }

    #[must_use]
    pub fn is_offline(&self) -> bool {
        self.remote.is_none()
    }

    fn key(&self, quiz_id: &QuizId) -> ProgressKey {
        ProgressKey::new(self.username.clone(), quiz_id.clone())
    }

    /// Load the stored snapshot for `quiz_id`.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Auth` when the remote store rejects the
    /// credentials.
    pub async fn load(&self, quiz_id: &QuizId) -> Result<LoadedProgress, GatewayError> {
        let mut warnings = Vec::new();

        if let Some(remote) = &self.remote {
            match remote.fetch(quiz_id).await {
                Ok(Some(snapshot)) => {
                    debug!(quiz = %quiz_id, answered = snapshot.question_history.len(), "loaded remote progress");
                    return Ok(LoadedProgress {
                        snapshot: Some(snapshot),
                        source: ProgressSource::Remote,
                        warnings,
                    });
                }
                Ok(None) => debug!(quiz = %quiz_id, "no remote progress"),
                Err(err) => {
                    let warning = auth_or_warning(quiz_id, PersistenceStage::RemoteLoad, err)?;
                    warn!(quiz = %quiz_id, error = %warning.detail, "remote load failed; using mirror");
                    warnings.push(warning);
                }
            }
        }

        let key = self.key(quiz_id);
        match self.mirror.load_mirror(&key).await {
            Ok(Some(snapshot)) => {
                debug!(key = %key.mirror_key(), "loaded mirrored progress");
                Ok(LoadedProgress {
                    snapshot: Some(snapshot),
                    source: ProgressSource::Mirror,
                    warnings,
                })
            }
            Ok(None) => Ok(LoadedProgress {
                snapshot: None,
                source: ProgressSource::Fresh,
                warnings,
            }),
            Err(err) => {
                warn!(key = %key.mirror_key(), error = %err, "mirror load failed");
                warnings.push(PersistenceWarning::new(
                    quiz_id,
                    PersistenceStage::MirrorLoad,
                    err,
                ));
                Ok(LoadedProgress {
                    snapshot: None,
                    source: ProgressSource::Fresh,
                    warnings,
                })
            }
        }
    }

    /// Write `snapshot` to the remote store, then always to the mirror.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Auth` when the remote store rejects the
    /// credentials. The mirror has already been written by then.
    pub async fn save(
        &self,
        quiz_id: &QuizId,
        snapshot: &SessionSnapshot,
    ) -> Result<SaveAck, GatewayError> {
        let mut ack = SaveAck::default();
        let mut auth_failed = false;

        if let Some(remote) = &self.remote {
            match remote.store(quiz_id, snapshot).await {
                Ok(()) => ack.remote_saved = true,
                Err(err) if err.is_auth() => {
                    warn!(quiz = %quiz_id, "remote save rejected credentials");
                    auth_failed = true;
                }
                Err(err) => {
                    warn!(quiz = %quiz_id, error = %err, "remote save failed");
                    ack.warnings.push(PersistenceWarning::new(
                        quiz_id,
                        PersistenceStage::RemoteSave,
                        err,
                    ));
                }
            }
        }

        let key = self.key(quiz_id);
        match self.mirror.save_mirror(&key, snapshot).await {
            Ok(()) => ack.mirror_saved = true,
            Err(err) => {
                warn!(key = %key.mirror_key(), error = %err, "mirror save failed");
                ack.warnings.push(PersistenceWarning::new(
                    quiz_id,
                    PersistenceStage::MirrorSave,
                    err,
                ));
            }
        }

        if auth_failed {
            return Err(GatewayError::Auth);
        }
        debug!(
            quiz = %quiz_id,
            remote = ack.remote_saved,
            mirror = ack.mirror_saved,
            "progress saved"
        );
        Ok(ack)
    }

    /// Final save for a finished run, then record the result locally and
    /// remotely. The mirror entry is purged only for completed runs.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Auth` when the remote store rejects the
    /// credentials.
    pub async fn finish(
        &self,
        quiz_id: &QuizId,
        snapshot: &SessionSnapshot,
        result: &QuizResult,
    ) -> Result<FinishAck, GatewayError> {
        let save = self.save(quiz_id, snapshot).await?;
        let mut ack = FinishAck {
            save,
            ..FinishAck::default()
        };

        match self.results.append_result(&self.username, result).await {
            Ok(id) => ack.result_id = Some(id),
            Err(err) => {
                warn!(quiz = %quiz_id, error = %err, "storing result locally failed");
                ack.warnings.push(PersistenceWarning::new(
                    quiz_id,
                    PersistenceStage::LocalResult,
                    err,
                ));
            }
        }

        if let Some(remote) = &self.remote {
            match remote.submit_result(result).await {
                Ok(()) => ack.result_submitted = true,
                Err(err) => {
                    let warning = auth_or_warning(quiz_id, PersistenceStage::RemoteResult, err)?;
                    warn!(quiz = %quiz_id, error = %warning.detail, "submitting result failed");
                    ack.warnings.push(warning);
                }
            }
        }

        if result.status == QuizStatus::Completed {
            let key = self.key(quiz_id);
            match self.mirror.purge_mirror(&key).await {
                Ok(existed) => ack.mirror_purged = existed,
                Err(err) => {
                    warn!(key = %key.mirror_key(), error = %err, "mirror purge failed");
                    ack.warnings.push(PersistenceWarning::new(
                        quiz_id,
                        PersistenceStage::MirrorPurge,
                        err,
                    ));
                }
            }
        }

        info!(
            quiz = %quiz_id,
            status = %result.status,
            score = result.score,
            experience = result.experience,
            "quiz finished"
        );
        Ok(ack)
    }

    /// Locally recorded results for this user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the results cannot be read.
    pub async fn recent_results(
        &self,
        quiz_id: Option<&QuizId>,
        limit: u32,
    ) -> Result<Vec<QuizResultRow>, StorageError> {
        self.results.list_results(&self.username, quiz_id, limit).await
    }
}

fn auth_or_warning(
    quiz_id: &QuizId,
    stage: PersistenceStage,
    err: RemoteError,
) -> Result<PersistenceWarning, GatewayError> {
    if err.is_auth() {
        return Err(GatewayError::Auth);
    }
    Ok(PersistenceWarning::new(quiz_id, stage, err))
}
