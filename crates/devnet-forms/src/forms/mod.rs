//! Schema-driven form interaction engine.
//!
//! Raw view events flow one way: a change or blur lands in a [`FormStore`], the store
//! re-runs [`validate`] over the full value map, and the resulting errors feed both the
//! [`FormSnapshot`] rendered by the view and the [`SubmissionController`] that gates the
//! commit to a [`SubmissionSink`]. The session service and router host many independent
//! stores behind HTTP.

pub mod catalog;
pub mod router;
pub mod schema;
pub mod session;
pub mod sinks;
pub mod state;
pub mod submission;
pub mod validator;

#[cfg(test)]
mod tests;

pub use catalog::{
    booking_schema, hiring_request_schema, CatalogError, FormCatalog, BOOKING_FORM,
    HIRING_REQUEST_FORM,
};
pub use router::form_router;
pub use schema::{FieldKind, FieldSchema, FormSchema, SchemaError};
pub use session::{
    FormSessionError, FormSessionService, SessionId, SessionLimits, SessionView,
    SubmissionReceipt,
};
pub use sinks::CsvSubmissionSink;
pub use state::{FormError, FormSnapshot, FormState, FormStore};
pub use submission::{SinkError, SubmissionController, SubmissionOutcome, SubmissionSink};
pub use validator::{validate, validate_field, ErrorMap, FieldValues};
