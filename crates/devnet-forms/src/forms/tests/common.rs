use std::sync::{Arc, Mutex};

use axum::body::to_bytes;
use axum::response::Response;
use serde_json::Value;

use crate::forms::schema::{FieldKind, FieldSchema, FormSchema};
use crate::forms::submission::{SinkError, SubmissionSink};
use crate::forms::validator::FieldValues;
use crate::forms::{form_router, FormCatalog, FormSessionService, FormStore, SessionLimits};

/// The four-field interview form used throughout the scenarios.
pub(super) fn interview_schema() -> FormSchema {
    FormSchema::new(
        "interview",
        "Book Your Interview",
        vec![
            FieldSchema::new("firstName", "First Name", FieldKind::bounded_text(15)).required(),
            FieldSchema::new("lastName", "Last Name", FieldKind::bounded_text(20)).required(),
            FieldSchema::new("email", "Email", FieldKind::Email).required(),
            FieldSchema::new("github", "GitHub URL", FieldKind::url()).required(),
        ],
    )
    .expect("interview schema is valid")
}

/// Every rule kind, all optional, for exercising kind-specific checks in isolation.
pub(super) fn mixed_schema() -> FormSchema {
    FormSchema::new(
        "mixed",
        "Mixed",
        vec![
            FieldSchema::new("nickname", "Nickname", FieldKind::bounded_text(5)),
            FieldSchema::new("email", "Email", FieldKind::Email),
            FieldSchema::new("website", "Website", FieldKind::url()),
            FieldSchema::new("linkedin", "LinkedIn", FieldKind::lenient_url()),
            FieldSchema::new("level", "Level", FieldKind::select(["junior", "senior"])),
            FieldSchema::new("bio", "Bio", FieldKind::Multiline),
        ],
    )
    .expect("mixed schema is valid")
}

pub(super) fn interview_store() -> FormStore {
    FormStore::new(Arc::new(interview_schema()))
}

pub(super) fn values(pairs: &[(&str, &str)]) -> FieldValues {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}

pub(super) fn fill_valid_interview(store: &mut FormStore) {
    for (name, value) in valid_interview_values() {
        store.set_value(&name, value).expect("known field");
    }
}

pub(super) fn valid_interview_values() -> FieldValues {
    values(&[
        ("firstName", "Jane"),
        ("lastName", "Doe"),
        ("email", "jane@doe.com"),
        ("github", "https://github.com/jane"),
    ])
}

#[derive(Default)]
pub(super) struct MemorySink {
    records: Mutex<Vec<(String, FieldValues)>>,
}

impl SubmissionSink for MemorySink {
    fn record(&self, form: &str, values: &FieldValues) -> Result<(), SinkError> {
        self.records
            .lock()
            .expect("sink mutex poisoned")
            .push((form.to_string(), values.clone()));
        Ok(())
    }
}

impl MemorySink {
    pub(super) fn records(&self) -> Vec<(String, FieldValues)> {
        self.records.lock().expect("sink mutex poisoned").clone()
    }
}

/// Fails every call while counting attempts.
#[derive(Default)]
pub(super) struct UnavailableSink {
    attempts: Mutex<usize>,
}

impl SubmissionSink for UnavailableSink {
    fn record(&self, _form: &str, _values: &FieldValues) -> Result<(), SinkError> {
        *self.attempts.lock().expect("sink mutex poisoned") += 1;
        Err(SinkError::Unavailable("storage offline".to_string()))
    }
}

impl UnavailableSink {
    pub(super) fn attempts(&self) -> usize {
        *self.attempts.lock().expect("sink mutex poisoned")
    }
}

pub(super) fn build_service<S: SubmissionSink + 'static>(
    sink: Arc<S>,
) -> Arc<FormSessionService<S>> {
    let catalog = FormCatalog::from_schemas(vec![interview_schema()]).expect("catalog builds");
    Arc::new(FormSessionService::new(Arc::new(catalog), sink))
}

pub(super) fn build_limited_service<S: SubmissionSink + 'static>(
    sink: Arc<S>,
    limits: SessionLimits,
) -> Arc<FormSessionService<S>> {
    let catalog = FormCatalog::from_schemas(vec![interview_schema()]).expect("catalog builds");
    Arc::new(FormSessionService::new(Arc::new(catalog), sink).with_limits(limits))
}

pub(super) fn router_with_service<S: SubmissionSink + 'static>(
    service: Arc<FormSessionService<S>>,
) -> axum::Router {
    form_router(service)
}

pub(super) async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("json body")
}
