//! Form interaction engine for the developer network lead-capture forms.
//!
//! The [`forms`] module holds the engine itself (schemas, validation, per-instance state and
//! submission gating) together with the session service and HTTP router that host it. The
//! remaining modules carry the service plumbing shared with the API binary.

pub mod config;
pub mod error;
pub mod forms;
pub mod telemetry;
