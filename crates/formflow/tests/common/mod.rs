#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use formflow::{
    ApplicationStore, ApplicationSummary, MemoryStore, PersistenceError, StoredApplication,
    SubmissionOrchestrator,
};
use formflow_spec::{
    AnswerSnapshot, ApplicationId, ApplicationStatus, FieldPath, FormSchema, ValidationOptions,
};
use serde_json::Value;
use time::macros::date;

pub const VISA_FORM_PATH: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../formflow-spec/tests/fixtures/visa_form.json"
);
pub const VISA_ANSWERS_PATH: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../formflow-spec/tests/fixtures/visa_answers.json"
);

const VISA_FORM: &str = include_str!("../../../formflow-spec/tests/fixtures/visa_form.json");
const VISA_ANSWERS: &str = include_str!("../../../formflow-spec/tests/fixtures/visa_answers.json");

pub fn visa_schema() -> Arc<FormSchema> {
    Arc::new(FormSchema::from_json(VISA_FORM).expect("fixture schema is valid"))
}

pub fn complete_answers() -> Value {
    serde_json::from_str(VISA_ANSWERS).expect("fixture answers are valid JSON")
}

pub fn complete_snapshot() -> AnswerSnapshot {
    AnswerSnapshot::from(complete_answers())
}

pub fn opts() -> ValidationOptions {
    ValidationOptions::at(date!(2026 - 01 - 15))
}

pub fn path(raw: &str) -> FieldPath {
    raw.parse().expect("valid field path")
}

pub fn id(raw: &str) -> ApplicationId {
    ApplicationId::parse(raw).expect("valid application id")
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateDraft(ApplicationId, AnswerSnapshot),
    SaveDraft(ApplicationId, AnswerSnapshot),
    Submit(ApplicationId, AnswerSnapshot),
}

/// Memory store that records mutating calls and can be told to fail saves.
#[derive(Debug, Default)]
pub struct RecordingStore {
    inner: MemoryStore,
    calls: Mutex<Vec<Call>>,
    fail_writes: AtomicBool,
}

impl RecordingStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn record(&self, call: Call) -> Result<(), PersistenceError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PersistenceError::Backend("store offline".into()));
        }
        self.calls.lock().expect("calls lock").push(call);
        Ok(())
    }
}

#[async_trait]
impl ApplicationStore for RecordingStore {
    async fn create_draft(
        &self,
        id: &ApplicationId,
        snapshot: &AnswerSnapshot,
    ) -> Result<ApplicationId, PersistenceError> {
        self.record(Call::CreateDraft(id.clone(), snapshot.clone()))?;
        self.inner.create_draft(id, snapshot).await
    }

    async fn save_draft(
        &self,
        id: &ApplicationId,
        snapshot: &AnswerSnapshot,
    ) -> Result<(), PersistenceError> {
        self.record(Call::SaveDraft(id.clone(), snapshot.clone()))?;
        self.inner.save_draft(id, snapshot).await
    }

    async fn get(&self, id: &ApplicationId) -> Result<StoredApplication, PersistenceError> {
        self.inner.get(id).await
    }

    async fn submit(
        &self,
        id: &ApplicationId,
        snapshot: &AnswerSnapshot,
    ) -> Result<ApplicationStatus, PersistenceError> {
        self.record(Call::Submit(id.clone(), snapshot.clone()))?;
        self.inner.submit(id, snapshot).await
    }

    async fn delete(&self, id: &ApplicationId) -> Result<(), PersistenceError> {
        self.inner.delete(id).await
    }

    async fn list(&self) -> Result<Vec<ApplicationSummary>, PersistenceError> {
        self.inner.list().await
    }

    async fn set_status(
        &self,
        id: &ApplicationId,
        status: ApplicationStatus,
    ) -> Result<(), PersistenceError> {
        self.inner.set_status(id, status).await
    }
}

pub fn orchestrator(store: &Arc<RecordingStore>) -> SubmissionOrchestrator {
    SubmissionOrchestrator::new(store.clone())
}
