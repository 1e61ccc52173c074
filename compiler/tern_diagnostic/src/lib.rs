//! Diagnostic system for the module loader.
//!
//! Every diagnosable loader condition becomes a [`Diagnostic`] with:
//! - an error code for searchability
//! - a message saying what went wrong
//! - a primary label at the import location, when one exists
//! - notes carrying underlying details (OS error text, version numbers)
//!
//! Diagnostics are handed to a [`DiagnosticSink`]. [`DiagnosticQueue`] is the
//! standard sink; embedders can supply their own.

mod diagnostic;
pub mod emitter;
mod error_code;
pub mod queue;

pub use diagnostic::{
    malformed_module, missing_dependencies, missing_single_dependency, module_too_new,
    opening_import, Diagnostic, Label, Severity,
};
pub use error_code::ErrorCode;
pub use queue::{DiagnosticConfig, DiagnosticQueue, DiagnosticSink};
