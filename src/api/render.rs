//! Visualization payload and renderer boundary
//!
//! Map rendering lives outside this crate. The estimator only assembles the
//! three point lists a map needs and hands them to a [`MapRenderer`].

use crate::algorithms::path::RefinedPath;
use crate::core::{GeoPoint, LocationEstimate};
use crate::utils::config::DisplayMode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Points handed to a map renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapPayload {
    /// Tower locations to draw
    pub cell_locations: Vec<GeoPoint>,
    /// Fused position
    pub marker_position: GeoPoint,
    /// Refinement waypoints from the serving cell to the marker
    pub flight_path: Vec<GeoPoint>,
}

impl MapPayload {
    /// Payload for `cells` refined into `refined`, `None` if the path is empty
    ///
    /// `DisplayMode::Estimate` reduces both lists to the marker alone.
    pub fn build(
        cells: &[LocationEstimate],
        refined: &RefinedPath,
        display_mode: DisplayMode,
    ) -> Option<Self> {
        let marker = refined.marker()?;
        let payload = match display_mode {
            DisplayMode::All => Self {
                cell_locations: cells.iter().map(|cell| cell.position).collect(),
                marker_position: marker,
                flight_path: refined.path.clone(),
            },
            DisplayMode::Estimate => Self {
                cell_locations: vec![marker],
                marker_position: marker,
                flight_path: vec![marker],
            },
        };
        Some(payload)
    }
}

/// Rendering and output errors
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to serialize map payload: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("renderer failed: {message}")]
    Renderer { message: String },
}

/// Turns a payload into a renderable document
pub trait MapRenderer: Send + Sync {
    /// Render `payload`; `api_key` is available to renderers that embed map tiles
    fn render(&self, payload: &MapPayload, api_key: &str) -> Result<String, RenderError>;
}

/// Renders the payload as a JSON document
#[derive(Debug, Clone, Default)]
pub struct JsonMapRenderer {
    /// Pretty print JSON
    pub pretty: bool,
}

impl JsonMapRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl MapRenderer for JsonMapRenderer {
    fn render(&self, payload: &MapPayload, _api_key: &str) -> Result<String, RenderError> {
        let document = if self.pretty {
            serde_json::to_string_pretty(payload)?
        } else {
            serde_json::to_string(payload)?
        };
        Ok(document)
    }
}

/// Render `payload` and write the document to `target`
pub fn render_to_file(
    renderer: &dyn MapRenderer,
    payload: &MapPayload,
    api_key: &str,
    target: &Path,
) -> Result<(), RenderError> {
    let document = renderer.render(payload, api_key)?;
    fs::write(target, document).map_err(|source| RenderError::Io {
        path: target.to_path_buf(),
        source,
    })
}
