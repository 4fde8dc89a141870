//! State module for tracking run progress
//!
//! The crawler never writes progress anywhere itself. It updates a
//! [`StatusReporter`] owned by the caller, which forwards every change to
//! an injected [`StatusSink`].
//!
//! # Components
//!
//! - `RunStatus`: snapshot of the current category run
//! - `StatusReporter`: owns the status and publishes it
//! - `JsonStatusFile`: sink overwriting a JSON file on every update

mod run_status;

// Re-export main types
pub use run_status::{
    CallbackSink, JsonStatusFile, NullSink, RunPhase, RunStatus, StatusReporter, StatusSink,
};
