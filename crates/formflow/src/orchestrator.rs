use std::sync::Arc;

use formflow_spec::{AnswerSnapshot, ApplicationId, ApplicationStatus, FormSchema, purge_hidden};
use tracing::{debug, info, warn};

use crate::error::{PersistenceError, SessionError};
use crate::store::{ApplicationStore, StoredApplication};

pub const DEFAULT_IDENTITY_ATTEMPTS: u32 = 5;

/// Mediates every call from an editing session to the store.
#[derive(Debug, Clone)]
pub struct SubmissionOrchestrator {
    store: Arc<dyn ApplicationStore>,
    identity_attempts: u32,
    purge_hidden: bool,
}

impl SubmissionOrchestrator {
    pub fn new(store: Arc<dyn ApplicationStore>) -> Self {
        Self {
            store,
            identity_attempts: DEFAULT_IDENTITY_ATTEMPTS,
            purge_hidden: true,
        }
    }

    /// Number of fresh ids tried before giving up on a crowded store.
    pub fn with_identity_attempts(mut self, attempts: u32) -> Self {
        self.identity_attempts = attempts.max(1);
        self
    }

    /// Whether hidden answers are dropped from the submitted snapshot.
    pub fn with_purge_hidden(mut self, purge: bool) -> Self {
        self.purge_hidden = purge;
        self
    }

    pub fn store(&self) -> &Arc<dyn ApplicationStore> {
        &self.store
    }

    pub async fn create_draft(
        &self,
        snapshot: &AnswerSnapshot,
    ) -> Result<ApplicationId, SessionError> {
        self.create_draft_with(ApplicationId::generate, snapshot)
            .await
    }

    /// Creates a draft under ids drawn from `mint`, retrying on conflicts.
    pub async fn create_draft_with<F>(
        &self,
        mut mint: F,
        snapshot: &AnswerSnapshot,
    ) -> Result<ApplicationId, SessionError>
    where
        F: FnMut() -> ApplicationId + Send,
    {
        for attempt in 1..=self.identity_attempts {
            let candidate = mint();
            match self.store.create_draft(&candidate, snapshot).await {
                Ok(id) => {
                    info!(application_id = %id, attempt, "draft created");
                    return Ok(id);
                }
                Err(PersistenceError::IdentityConflict(taken)) => {
                    warn!(application_id = %taken, attempt, "application id already taken");
                }
                Err(err) => return Err(err.into()),
            }
        }
        Err(SessionError::IdentityExhausted(self.identity_attempts))
    }

    pub async fn load(&self, id: &ApplicationId) -> Result<StoredApplication, SessionError> {
        let record = self.store.get(id).await?;
        debug!(application_id = %id, status = %record.status, "loaded application");
        Ok(record)
    }

    pub async fn checkpoint(
        &self,
        id: &ApplicationId,
        snapshot: &AnswerSnapshot,
    ) -> Result<(), SessionError> {
        self.store.save_draft(id, snapshot).await?;
        debug!(application_id = %id, "draft checkpointed");
        Ok(())
    }

    /// Submits a copy of `snapshot`, purged of hidden answers when enabled.
    /// Returns the resulting status and the answers that were stored.
    pub async fn submit(
        &self,
        schema: &FormSchema,
        id: &ApplicationId,
        snapshot: &AnswerSnapshot,
    ) -> Result<(ApplicationStatus, AnswerSnapshot), SessionError> {
        let mut submitted = snapshot.clone();
        if self.purge_hidden {
            let cleared = purge_hidden(schema, &mut submitted);
            if !cleared.is_empty() {
                debug!(application_id = %id, cleared = ?cleared, "purged hidden answers");
            }
        }
        let status = self.store.submit(id, &submitted).await?;
        info!(application_id = %id, %status, "application submitted");
        Ok((status, submitted))
    }
}
