use serde::Serialize;

use super::state::FormStore;
use super::validator::{ErrorMap, FieldValues};

/// Outbound collaborator that durably records accepted submissions.
pub trait SubmissionSink: Send + Sync {
    fn record(&self, form: &str, values: &FieldValues) -> Result<(), SinkError>;
}

impl<S: SubmissionSink + ?Sized> SubmissionSink for std::sync::Arc<S> {
    fn record(&self, form: &str, values: &FieldValues) -> Result<(), SinkError> {
        (**self).record(form, values)
    }
}

/// Failure reported by a sink; the submitted values stay in the form for a retry.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("submission store unavailable: {0}")]
    Unavailable(String),
    #[error("failed to write submission: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode submission: {0}")]
    Encode(String),
}

/// Result of one submit attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmissionOutcome {
    Accepted { values: FieldValues },
    Rejected { errors: ErrorMap },
    Failed { values: FieldValues, reason: String },
}

impl SubmissionOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, SubmissionOutcome::Accepted { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            SubmissionOutcome::Accepted { .. } => "accepted",
            SubmissionOutcome::Rejected { .. } => "rejected",
            SubmissionOutcome::Failed { .. } => "failed",
        }
    }
}

/// Gates the final commit of a form on a fresh validation pass.
pub struct SubmissionController<S> {
    sink: S,
}

impl<S: SubmissionSink> SubmissionController<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Reveal every error, re-validate, and hand valid values to the sink exactly once.
    ///
    /// Rejected attempts leave the values alone and never reach the sink, so the call can be
    /// repeated freely. A sink failure also keeps the values; only an accepted submission
    /// resets the store.
    pub fn submit(&self, store: &mut FormStore) -> SubmissionOutcome {
        let values = match Self::prepare(store) {
            Ok(values) => values,
            Err(rejected) => return rejected,
        };
        let outcome = self.record(store.schema().id(), values);
        Self::settle(store, &outcome);
        outcome
    }

    /// Touch every field and re-validate; returns the values to record, or the rejection.
    pub fn prepare(store: &mut FormStore) -> Result<FieldValues, SubmissionOutcome> {
        store.touch_all();
        store.revalidate();

        let state = store.state();
        if state.is_valid() {
            Ok(state.values().clone())
        } else {
            Err(SubmissionOutcome::Rejected {
                errors: state.errors().clone(),
            })
        }
    }

    /// Hand prepared values to the sink. Does not touch any store.
    pub fn record(&self, form: &str, values: FieldValues) -> SubmissionOutcome {
        match self.sink.record(form, &values) {
            Ok(()) => SubmissionOutcome::Accepted { values },
            Err(err) => SubmissionOutcome::Failed {
                values,
                reason: err.to_string(),
            },
        }
    }

    /// Apply an outcome to the store: accepted submissions reset it, anything else keeps it.
    pub fn settle(store: &mut FormStore, outcome: &SubmissionOutcome) {
        if outcome.is_accepted() {
            store.reset();
        }
    }
}
