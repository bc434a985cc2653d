use std::collections::BTreeMap;

use async_trait::async_trait;
use formflow_spec::{AnswerSnapshot, ApplicationId, ApplicationStatus};
use tokio::sync::RwLock;
use tracing::debug;

use super::{ApplicationStore, ApplicationSummary, StoredApplication, sort_summaries};
use crate::error::PersistenceError;

/// Process-local store, used by tests and the default CLI configuration.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<BTreeMap<ApplicationId, StoredApplication>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl ApplicationStore for MemoryStore {
    async fn create_draft(
        &self,
        id: &ApplicationId,
        snapshot: &AnswerSnapshot,
    ) -> Result<ApplicationId, PersistenceError> {
        let mut records = self.records.write().await;
        if records.contains_key(id) {
            return Err(PersistenceError::IdentityConflict(id.clone()));
        }
        let record = StoredApplication::draft(id.clone(), snapshot.clone());
        records.insert(id.clone(), record);
        debug!(application_id = %id, "created draft");
        Ok(id.clone())
    }

    async fn save_draft(
        &self,
        id: &ApplicationId,
        snapshot: &AnswerSnapshot,
    ) -> Result<(), PersistenceError> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(id)
            .ok_or_else(|| PersistenceError::NotFound(id.clone()))?;
        record.save(snapshot)?;
        debug!(application_id = %id, "saved draft");
        Ok(())
    }

    async fn get(&self, id: &ApplicationId) -> Result<StoredApplication, PersistenceError> {
        self.records
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| PersistenceError::NotFound(id.clone()))
    }

    async fn submit(
        &self,
        id: &ApplicationId,
        snapshot: &AnswerSnapshot,
    ) -> Result<ApplicationStatus, PersistenceError> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(id)
            .ok_or_else(|| PersistenceError::NotFound(id.clone()))?;
        record.submit(snapshot)
    }

    async fn delete(&self, id: &ApplicationId) -> Result<(), PersistenceError> {
        let mut records = self.records.write().await;
        let record = records
            .get(id)
            .ok_or_else(|| PersistenceError::NotFound(id.clone()))?;
        record.ensure_editable()?;
        records.remove(id);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<ApplicationSummary>, PersistenceError> {
        let mut summaries: Vec<_> = self
            .records
            .read()
            .await
            .values()
            .map(StoredApplication::summary)
            .collect();
        sort_summaries(&mut summaries);
        Ok(summaries)
    }

    async fn set_status(
        &self,
        id: &ApplicationId,
        status: ApplicationStatus,
    ) -> Result<(), PersistenceError> {
        let mut records = self.records.write().await;
        records
            .get_mut(id)
            .ok_or_else(|| PersistenceError::NotFound(id.clone()))?
            .set_status(status);
        Ok(())
    }
}
