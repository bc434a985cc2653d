//! Persistence collaborator for application records.
//!
//! Stores hold one record per [`ApplicationId`] and overwrite it whole on
//! every save. Only drafts accept saves, submission or deletion; the status
//! of a submitted record is changed by an external reviewer through
//! [`ApplicationStore::set_status`].

use std::fmt;

use async_trait::async_trait;
use formflow_spec::{AnswerSnapshot, ApplicationId, ApplicationStatus};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::PersistenceError;

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

/// One persisted application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredApplication {
    pub id: ApplicationId,
    pub snapshot: AnswerSnapshot,
    pub status: ApplicationStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Listing entry without the answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationSummary {
    pub id: ApplicationId,
    pub status: ApplicationStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl StoredApplication {
    pub fn draft(id: ApplicationId, snapshot: AnswerSnapshot) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id,
            snapshot,
            status: ApplicationStatus::Draft,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn summary(&self) -> ApplicationSummary {
        ApplicationSummary {
            id: self.id.clone(),
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    pub(crate) fn ensure_editable(&self) -> Result<(), PersistenceError> {
        if self.status.is_editable() {
            Ok(())
        } else {
            Err(PersistenceError::NotEditable {
                id: self.id.clone(),
                status: self.status,
            })
        }
    }

    pub(crate) fn save(&mut self, snapshot: &AnswerSnapshot) -> Result<(), PersistenceError> {
        self.ensure_editable()?;
        self.snapshot = snapshot.clone();
        self.updated_at = OffsetDateTime::now_utc();
        Ok(())
    }

    pub(crate) fn submit(
        &mut self,
        snapshot: &AnswerSnapshot,
    ) -> Result<ApplicationStatus, PersistenceError> {
        self.save(snapshot)?;
        self.status = ApplicationStatus::Submitted;
        Ok(self.status)
    }

    pub(crate) fn set_status(&mut self, status: ApplicationStatus) {
        self.status = status;
        self.updated_at = OffsetDateTime::now_utc();
    }
}

#[async_trait]
pub trait ApplicationStore: Send + Sync + fmt::Debug {
    /// Creates a draft under `id`. Fails with
    /// [`PersistenceError::IdentityConflict`] when the id is taken.
    async fn create_draft(
        &self,
        id: &ApplicationId,
        snapshot: &AnswerSnapshot,
    ) -> Result<ApplicationId, PersistenceError>;

    /// Overwrites the answers of a draft.
    async fn save_draft(
        &self,
        id: &ApplicationId,
        snapshot: &AnswerSnapshot,
    ) -> Result<(), PersistenceError>;

    async fn get(&self, id: &ApplicationId) -> Result<StoredApplication, PersistenceError>;

    /// Stores the final answers and moves the draft to `submitted`.
    async fn submit(
        &self,
        id: &ApplicationId,
        snapshot: &AnswerSnapshot,
    ) -> Result<ApplicationStatus, PersistenceError>;

    async fn delete(&self, id: &ApplicationId) -> Result<(), PersistenceError>;

    /// Every record, oldest first.
    async fn list(&self) -> Result<Vec<ApplicationSummary>, PersistenceError>;

    /// Reviewer hook; the editing engine never calls it.
    async fn set_status(
        &self,
        id: &ApplicationId,
        status: ApplicationStatus,
    ) -> Result<(), PersistenceError>;
}

pub(crate) fn sort_summaries(summaries: &mut [ApplicationSummary]) {
    summaries.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
}
