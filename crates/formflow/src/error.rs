use formflow_spec::{
    ApplicationId, ApplicationStatus, IdentityError, NavigationError, SchemaError, SnapshotError,
    ValidationResult, WizardError,
};
use thiserror::Error;

/// Failures of the persistence collaborator.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("application {0} not found")]
    NotFound(ApplicationId),
    #[error("application {0} already exists")]
    IdentityConflict(ApplicationId),
    #[error("application {id} is {status} and can no longer be edited")]
    NotEditable {
        id: ApplicationId,
        status: ApplicationStatus,
    },
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored record is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("storage backend failed: {0}")]
    Backend(String),
}

impl PersistenceError {
    /// Short text suitable for the person filling in the form.
    pub fn user_message(&self) -> &'static str {
        match self {
            PersistenceError::NotFound(_) => "This application could not be found.",
            PersistenceError::IdentityConflict(_) => {
                "An application with this number already exists. Please try again."
            }
            PersistenceError::NotEditable { .. } => {
                "This application has already been submitted and can no longer be changed."
            }
            PersistenceError::Io(_) | PersistenceError::Json(_) | PersistenceError::Backend(_) => {
                "Your answers could not be saved. Please try again."
            }
        }
    }
}

/// Errors surfaced by an editing session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("the current step has missing or invalid answers")]
    Validation(ValidationResult),
    #[error(transparent)]
    Navigation(#[from] NavigationError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error(transparent)]
    Identity(#[from] IdentityError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("application {id} is {status}; edits are not accepted")]
    NotEditable {
        id: ApplicationId,
        status: ApplicationStatus,
    },
    #[error("could not allocate a free application id after {0} attempts")]
    IdentityExhausted(u32),
}

impl From<WizardError> for SessionError {
    fn from(err: WizardError) -> Self {
        match err {
            WizardError::Validation(result) => SessionError::Validation(result),
            WizardError::Navigation(err) => SessionError::Navigation(err),
        }
    }
}

impl SessionError {
    pub fn user_message(&self) -> String {
        match self {
            SessionError::Validation(result) => format!(
                "Please complete the highlighted fields ({} issue(s)).",
                result.errors.len() + result.missing_required.len()
            ),
            SessionError::Navigation(NavigationError::StepNotCompleted(_)) => {
                "Finish the current step first.".to_string()
            }
            SessionError::Persistence(err) => err.user_message().to_string(),
            SessionError::NotEditable { .. } => {
                "This application has already been submitted and can no longer be changed."
                    .to_string()
            }
            other => other.to_string(),
        }
    }
}
