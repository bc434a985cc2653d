use std::sync::Arc;

use formflow_spec::{
    AnswerSnapshot, ApplicationId, ApplicationStatus, FieldPath, FormSchema, ItemId,
    ReviewDocument, SectionOrdinals, SectionProgress, SnapshotDiff, ValidationOptions,
    ValidationResult, VisibleSection, WizardState, add_item, apply_edit, build_review,
    ensure_visible_groups, infer_resume_point, remove_item, section_progress, set_override,
    validate_section,
};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::SessionError;
use crate::orchestrator::SubmissionOrchestrator;

/// One user's editing session over one application.
///
/// Edits mutate the in-memory snapshot synchronously. `advance`, `save` and
/// `submit` each await a single store call; when that call fails the snapshot
/// and wizard state are exactly as before.
#[derive(Debug)]
pub struct FormSession {
    schema: Arc<FormSchema>,
    orchestrator: SubmissionOrchestrator,
    options: ValidationOptions,
    id: ApplicationId,
    snapshot: AnswerSnapshot,
    state: WizardState,
    status: ApplicationStatus,
}

impl FormSession {
    /// Mints an id, persists an empty draft and opens it on the first step.
    pub async fn start(
        schema: Arc<FormSchema>,
        orchestrator: SubmissionOrchestrator,
        options: ValidationOptions,
    ) -> Result<Self, SessionError> {
        let mut snapshot = AnswerSnapshot::new();
        let id = orchestrator.create_draft(&snapshot).await?;
        ensure_visible_groups(&schema, &mut snapshot);
        let state = WizardState::new(schema.step_count());
        info!(application_id = %id, "started new application");
        Ok(Self {
            schema,
            orchestrator,
            options,
            id,
            snapshot,
            state,
            status: ApplicationStatus::Draft,
        })
    }

    /// Reopens a persisted application at the furthest section holding data.
    pub async fn open(
        schema: Arc<FormSchema>,
        orchestrator: SubmissionOrchestrator,
        id: &ApplicationId,
        options: ValidationOptions,
    ) -> Result<Self, SessionError> {
        let record = orchestrator.load(id).await?;
        let mut snapshot = record.snapshot;
        let step = infer_resume_point(&snapshot, &SectionOrdinals::from_schema(&schema));
        if record.status.is_editable() {
            ensure_visible_groups(&schema, &mut snapshot);
        }
        let state = WizardState::resume(step, schema.step_count());
        info!(
            application_id = %id,
            step = state.current_step(),
            status = %record.status,
            "resumed application"
        );
        Ok(Self {
            schema,
            orchestrator,
            options,
            id: record.id,
            snapshot,
            state,
            status: record.status,
        })
    }

    pub fn id(&self) -> &ApplicationId {
        &self.id
    }

    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    pub fn snapshot(&self) -> &AnswerSnapshot {
        &self.snapshot
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn status(&self) -> ApplicationStatus {
        self.status
    }

    pub fn current_step(&self) -> usize {
        self.state.current_step()
    }

    pub fn current_view(&self) -> Option<VisibleSection<'_>> {
        formflow_spec::resolve(&self.schema, &self.snapshot, self.state.current_step())
    }

    pub fn progress(&self) -> SectionProgress {
        section_progress(&self.schema, &self.snapshot, self.state.current_step())
    }

    pub fn validate_current(&self) -> ValidationResult {
        let step = self.state.current_step();
        validate_section(&self.schema, &self.snapshot, step, &self.options)
    }

    pub fn review(&self) -> ReviewDocument {
        build_review(&self.schema, &self.snapshot)
    }

    pub fn edit(&mut self, path: &FieldPath, value: Value) -> Result<SnapshotDiff, SessionError> {
        self.ensure_editable()?;
        let diff = apply_edit(&self.schema, &mut self.snapshot, path, value)?;
        debug!(
            application_id = %self.id,
            path = %path,
            cleared = diff.cleared.len(),
            "applied edit"
        );
        Ok(diff)
    }

    pub fn set_override(
        &mut self,
        path: &FieldPath,
        flag: bool,
    ) -> Result<SnapshotDiff, SessionError> {
        self.ensure_editable()?;
        Ok(set_override(&self.schema, &mut self.snapshot, path, flag)?)
    }

    pub fn add_item(&mut self, group: &FieldPath) -> Result<ItemId, SessionError> {
        self.ensure_editable()?;
        Ok(add_item(&self.schema, &mut self.snapshot, group)?)
    }

    pub fn remove_item(&mut self, group: &FieldPath, item: &ItemId) -> Result<bool, SessionError> {
        self.ensure_editable()?;
        Ok(remove_item(&self.schema, &mut self.snapshot, group, item)?)
    }

    /// Validates the current step, checkpoints the draft and only then
    /// moves forward.
    pub async fn advance(&mut self) -> Result<(), SessionError> {
        self.ensure_editable()?;
        let step = self.state.current_step();
        let next = self
            .state
            .advance(&self.schema, &self.snapshot, step, &self.options)?;
        self.orchestrator.checkpoint(&self.id, &self.snapshot).await?;
        self.state = next;
        info!(application_id = %self.id, step = self.state.current_step(), "advanced");
        Ok(())
    }

    pub fn retreat(&mut self) -> Result<(), SessionError> {
        self.state = self.state.retreat(self.state.current_step())?;
        Ok(())
    }

    pub fn jump(&mut self, target: usize) -> Result<(), SessionError> {
        self.state = self.state.jump(target)?;
        Ok(())
    }

    pub async fn save(&self) -> Result<(), SessionError> {
        self.ensure_editable()?;
        self.orchestrator.checkpoint(&self.id, &self.snapshot).await
    }

    /// Validates the whole document from the final step and submits it.
    /// Afterwards every mutating call returns [`SessionError::NotEditable`].
    pub async fn submit(&mut self) -> Result<ApplicationStatus, SessionError> {
        self.ensure_editable()?;
        self.state
            .check_submit(&self.schema, &self.snapshot, &self.options)?;
        let (status, submitted) = self
            .orchestrator
            .submit(&self.schema, &self.id, &self.snapshot)
            .await?;
        self.snapshot = submitted;
        self.status = status;
        Ok(status)
    }

    fn ensure_editable(&self) -> Result<(), SessionError> {
        if self.status.is_editable() {
            Ok(())
        } else {
            Err(SessionError::NotEditable {
                id: self.id.clone(),
                status: self.status,
            })
        }
    }
}
