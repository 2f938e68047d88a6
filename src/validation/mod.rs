//! Error types and failure reporting

pub mod error;

pub use error::{Diagnostic, DiagnosticKind, ErrorReporter, GeocellError, Result};
