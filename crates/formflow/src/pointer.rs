use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use formflow_spec::ApplicationId;
use tokio::fs;
use tracing::warn;

use crate::error::PersistenceError;

/// Remembers the application currently being filled in, so a later run can
/// reopen it without the user typing the token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentFormPointer {
    path: PathBuf,
}

impl CurrentFormPointer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<data dir>/current_form` for the platform, when one can be determined.
    pub fn default_location() -> Option<Self> {
        ProjectDirs::from("org", "formflow", "formflow")
            .map(|dirs| Self::new(dirs.data_dir().join("current_form")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing or malformed pointer reads as `None`.
    pub async fn load(&self) -> Result<Option<ApplicationId>, PersistenceError> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        match ApplicationId::parse(&raw) {
            Ok(id) => Ok(Some(id)),
            Err(err) => {
                warn!(path = %self.path.display(), %err, "ignoring malformed form pointer");
                Ok(None)
            }
        }
    }

    pub async fn store(&self, id: &ApplicationId) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&self.path, id.as_str()).await?;
        Ok(())
    }

    pub async fn clear(&self) -> Result<(), PersistenceError> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
