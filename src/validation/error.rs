use crate::core::TowerIdentity;
use crate::utils::config::ConfigError;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Fatal errors of the positioning pipeline
///
/// Per-tower lookup failures are not part of this type: they are soft,
/// recorded by the [`ErrorReporter`] and surface as missing locations.
#[derive(Debug, Error)]
pub enum GeocellError {
    /// Observation is missing a required identity code (caller defect)
    #[error("Cell tower identifier is missing field '{field}'")]
    InvalidObservation { field: String },

    /// Configuration rejected by validation or unreadable
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Lookup worker pool could not be created
    #[error("Failed to build lookup worker pool: {0}")]
    ThreadPool(String),

    /// HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

/// Result type for positioning operations
pub type Result<T> = std::result::Result<T, GeocellError>;

/// Category of a reported diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// Geolocation lookup failed or timed out for a tower
    Lookup,
    /// Visualization document could not be produced or written
    Render,
}

/// A single reported failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub id: u64,
    pub kind: DiagnosticKind,
    pub identity: Option<TowerIdentity>,
    pub reason: String,
    pub timestamp_ms: u64,
}

#[derive(Debug, Default)]
struct ReporterState {
    history: VecDeque<Diagnostic>,
    counter: u64,
    counts: HashMap<DiagnosticKind, u64>,
}

/// Serialized sink for soft failures
///
/// Lookup workers report concurrently; every report takes the lock once and
/// is logged as a single event, so messages never interleave.
pub struct ErrorReporter {
    state: Mutex<ReporterState>,
    max_history_size: usize,
}

impl ErrorReporter {
    /// Create a new error reporter
    pub fn new() -> Self {
        Self::with_config(1000)
    }

    /// Create error reporter keeping at most `max_history_size` diagnostics
    pub fn with_config(max_history_size: usize) -> Self {
        Self {
            state: Mutex::new(ReporterState::default()),
            max_history_size,
        }
    }

    /// Report a failed lookup for `identity`
    pub fn report_lookup_failure(&self, identity: TowerIdentity, reason: impl Into<String>) -> u64 {
        self.report(DiagnosticKind::Lookup, Some(identity), reason.into())
    }

    /// Report a failed render of the visualization document
    pub fn report_render_failure(&self, reason: impl Into<String>) -> u64 {
        self.report(DiagnosticKind::Render, None, reason.into())
    }

    fn report(&self, kind: DiagnosticKind, identity: Option<TowerIdentity>, reason: String) -> u64 {
        let mut state = self.state.lock();
        state.counter += 1;
        let id = state.counter;

        match (kind, identity) {
            (DiagnosticKind::Lookup, Some(identity)) => {
                tracing::warn!(
                    error_id = id,
                    tower = %identity,
                    "[geocell] lookup failed: {}",
                    reason
                )
            }
            _ => tracing::error!(error_id = id, "[geocell] {:?} failure: {}", kind, reason),
        }

        *state.counts.entry(kind).or_insert(0) += 1;
        state.history.push_back(Diagnostic {
            id,
            kind,
            identity,
            reason,
            timestamp_ms: current_time_ms(),
        });
        if state.history.len() > self.max_history_size {
            state.history.pop_front();
        }

        id
    }

    /// Most recent diagnostics, newest first
    pub fn recent(&self, count: usize) -> Vec<Diagnostic> {
        self.state.lock().history.iter().rev().take(count).cloned().collect()
    }

    /// All retained diagnostics of one kind, oldest first
    pub fn by_kind(&self, kind: DiagnosticKind) -> Vec<Diagnostic> {
        self.state
            .lock()
            .history
            .iter()
            .filter(|d| d.kind == kind)
            .cloned()
            .collect()
    }

    /// Total number of reports of `kind`, including ones dropped from history
    pub fn count(&self, kind: DiagnosticKind) -> u64 {
        self.state.lock().counts.get(&kind).copied().unwrap_or(0)
    }

    pub fn clear_history(&self) {
        let mut state = self.state.lock();
        state.history.clear();
        state.counts.clear();
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new()
    }
}

fn current_time_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
