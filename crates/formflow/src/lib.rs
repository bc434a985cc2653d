#![allow(missing_docs)]

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod orchestrator;
pub mod pointer;
pub mod session;
pub mod store;

pub use config::{ConfigError, EngineConfig, StoreConfig};
pub use error::{PersistenceError, SessionError};
pub use logging::init_tracing;
pub use orchestrator::{DEFAULT_IDENTITY_ATTEMPTS, SubmissionOrchestrator};
pub use pointer::CurrentFormPointer;
pub use session::FormSession;
pub use store::{
    ApplicationStore, ApplicationSummary, FileStore, MemoryStore, StoredApplication,
};
