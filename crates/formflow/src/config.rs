use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::orchestrator::{DEFAULT_IDENTITY_ATTEMPTS, SubmissionOrchestrator};
use crate::pointer::CurrentFormPointer;
use crate::store::{ApplicationStore, FileStore, MemoryStore};

pub const CONFIG_ENV: &str = "FORMFLOW_CONFIG";
pub const STORE_DIR_ENV: &str = "FORMFLOW_STORE_DIR";
pub const LOG_ENV: &str = "FORMFLOW_LOG";
pub const POINTER_ENV: &str = "FORMFLOW_POINTER";

/// Engine settings, read from TOML.
///
/// ```toml
/// identity_attempts = 5
/// purge_hidden_on_submit = true
/// log_filter = "formflow=debug"
///
/// [store]
/// kind = "file"
/// dir = "/var/lib/formflow"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub store: StoreConfig,
    pub identity_attempts: u32,
    pub purge_hidden_on_submit: bool,
    pub log_filter: Option<String>,
    pub pointer_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoreConfig {
    #[default]
    Memory,
    File {
        dir: PathBuf,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("identity_attempts must be at least 1")]
    NoIdentityAttempts,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            identity_attempts: DEFAULT_IDENTITY_ATTEMPTS,
            purge_hidden_on_submit: true,
            log_filter: None,
            pointer_path: None,
        }
    }
}

impl EngineConfig {
    /// Loads `path`, or the file named by `FORMFLOW_CONFIG`, or the defaults,
    /// then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(|| env::var_os(CONFIG_ENV).map(PathBuf::from));
        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| env::var(key).ok());
        config.check()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// `FORMFLOW_STORE_DIR` switches to a file store, `FORMFLOW_LOG` and
    /// `FORMFLOW_POINTER` replace their settings. Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        if let Some(dir) = lookup(STORE_DIR_ENV) {
            self.store = StoreConfig::File {
                dir: PathBuf::from(dir),
            };
        }
        if let Some(filter) = lookup(LOG_ENV) {
            self.log_filter = Some(filter);
        }
        if let Some(pointer) = lookup(POINTER_ENV) {
            self.pointer_path = Some(PathBuf::from(pointer));
        }
    }

    pub fn check(&self) -> Result<(), ConfigError> {
        if self.identity_attempts == 0 {
            return Err(ConfigError::NoIdentityAttempts);
        }
        Ok(())
    }

    pub fn build_store(&self) -> Arc<dyn ApplicationStore> {
        match &self.store {
            StoreConfig::Memory => Arc::new(MemoryStore::new()),
            StoreConfig::File { dir } => Arc::new(FileStore::new(dir.clone())),
        }
    }

    pub fn orchestrator(&self) -> SubmissionOrchestrator {
        SubmissionOrchestrator::new(self.build_store())
            .with_identity_attempts(self.identity_attempts)
            .with_purge_hidden(self.purge_hidden_on_submit)
    }

    /// Configured pointer file, else the platform default.
    pub fn pointer(&self) -> Option<CurrentFormPointer> {
        match &self.pointer_path {
            Some(path) => Some(CurrentFormPointer::new(path.clone())),
            None => CurrentFormPointer::default_location(),
        }
    }
}
