use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use formflow_spec::{AnswerSnapshot, ApplicationId, ApplicationStatus};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::{ApplicationStore, ApplicationSummary, StoredApplication, sort_summaries};
use crate::error::PersistenceError;

/// One JSON document per application under `dir`, named `<id>.json`.
///
/// Mutations are serialised through an internal lock. Every write goes to a
/// `.tmp` sibling first; new records are linked into place, updates renamed,
/// so a failed write never leaves a partial record behind.
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, id: &ApplicationId) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    async fn read(&self, id: &ApplicationId) -> Result<StoredApplication, PersistenceError> {
        let bytes = match fs::read(self.record_path(id)).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(PersistenceError::NotFound(id.clone()));
            }
            Err(err) => return Err(err.into()),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn write(&self, record: &StoredApplication) -> Result<(), PersistenceError> {
        let path = self.record_path(&record.id);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(record)?).await?;
        fs::rename(&tmp, &path).await?;
        Ok(())
    }
}

#[async_trait]
impl ApplicationStore for FileStore {
    async fn create_draft(
        &self,
        id: &ApplicationId,
        snapshot: &AnswerSnapshot,
    ) -> Result<ApplicationId, PersistenceError> {
        let _guard = self.lock.lock().await;
        fs::create_dir_all(&self.dir).await?;
        let record = StoredApplication::draft(id.clone(), snapshot.clone());
        let path = self.record_path(id);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(&record)?).await?;
        // hard_link refuses an existing target, so a taken id is never clobbered
        let linked = fs::hard_link(&tmp, &path).await;
        if let Err(err) = fs::remove_file(&tmp).await {
            warn!(path = %tmp.display(), %err, "failed to remove temporary record");
        }
        match linked {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                return Err(PersistenceError::IdentityConflict(id.clone()));
            }
            Err(err) => return Err(err.into()),
        }
        debug!(application_id = %id, dir = %self.dir.display(), "created draft file");
        Ok(id.clone())
    }

    async fn save_draft(
        &self,
        id: &ApplicationId,
        snapshot: &AnswerSnapshot,
    ) -> Result<(), PersistenceError> {
        let _guard = self.lock.lock().await;
        let mut record = self.read(id).await?;
        record.save(snapshot)?;
        self.write(&record).await?;
        debug!(application_id = %id, "saved draft file");
        Ok(())
    }

    async fn get(&self, id: &ApplicationId) -> Result<StoredApplication, PersistenceError> {
        self.read(id).await
    }

    async fn submit(
        &self,
        id: &ApplicationId,
        snapshot: &AnswerSnapshot,
    ) -> Result<ApplicationStatus, PersistenceError> {
        let _guard = self.lock.lock().await;
        let mut record = self.read(id).await?;
        let status = record.submit(snapshot)?;
        self.write(&record).await?;
        Ok(status)
    }

    async fn delete(&self, id: &ApplicationId) -> Result<(), PersistenceError> {
        let _guard = self.lock.lock().await;
        self.read(id).await?.ensure_editable()?;
        fs::remove_file(self.record_path(id)).await?;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<ApplicationSummary>, PersistenceError> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        let mut summaries = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let bytes = fs::read(&path).await?;
            match serde_json::from_slice::<StoredApplication>(&bytes) {
                Ok(record) => summaries.push(record.summary()),
                Err(err) => warn!(path = %path.display(), %err, "skipping unreadable record"),
            }
        }
        sort_summaries(&mut summaries);
        Ok(summaries)
    }

    async fn set_status(
        &self,
        id: &ApplicationId,
        status: ApplicationStatus,
    ) -> Result<(), PersistenceError> {
        let _guard = self.lock.lock().await;
        let mut record = self.read(id).await?;
        record.set_status(status);
        self.write(&record).await
    }
}
