//! Common API types and data structures

use crate::algorithms::path::{FilterMode, RefinedPath};
use crate::core::{LocationEstimate, RawObservation, TowerObservation};
use crate::utils::config::{DisplayMode, EstimatorConfig};
use serde::{Deserialize, Serialize};

/// Input to an estimate
///
/// Deserializes from a JSON array of tower locations (objects with a
/// `location` field), validated observations (objects with an `identity`)
/// or raw tower observations, tried in that order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cells {
    /// Towers whose locations are already known
    Located(Vec<LocationEstimate>),
    /// Validated observations
    Observed(Vec<TowerObservation>),
    /// Unvalidated observations, checked before any lookup
    Raw(Vec<RawObservation>),
}

impl Cells {
    pub fn len(&self) -> usize {
        match self {
            Cells::Located(cells) => cells.len(),
            Cells::Observed(cells) => cells.len(),
            Cells::Raw(cells) => cells.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Vec<LocationEstimate>> for Cells {
    fn from(cells: Vec<LocationEstimate>) -> Self {
        Cells::Located(cells)
    }
}

impl From<Vec<TowerObservation>> for Cells {
    fn from(cells: Vec<TowerObservation>) -> Self {
        Cells::Observed(cells)
    }
}

impl From<Vec<RawObservation>> for Cells {
    fn from(cells: Vec<RawObservation>) -> Self {
        Cells::Raw(cells)
    }
}

/// Per-call estimation parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EstimateOptions {
    pub filter_mode: FilterMode,
    pub display_mode: DisplayMode,
    /// Reorder towers by decreasing signal strength before refinement
    pub sort_by_signal: bool,
}

impl From<&EstimatorConfig> for EstimateOptions {
    fn from(config: &EstimatorConfig) -> Self {
        Self {
            filter_mode: config.filter_mode,
            display_mode: config.display_mode,
            sort_by_signal: config.sort_by_signal,
        }
    }
}

/// Fused estimate together with what it was computed from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EstimateOutcome {
    pub estimate: LocationEstimate,
    pub refined: RefinedPath,
    /// Tower locations in the order they were refined
    pub cells: Vec<LocationEstimate>,
}
