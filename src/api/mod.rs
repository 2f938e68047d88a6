//! Estimation API
//!
//! [`CellEstimator`] is the entry point: it accepts observed or located
//! towers, fuses them into one position and can hand the result to a map
//! renderer.

pub mod estimator;
pub mod render;
pub mod types;

pub use estimator::CellEstimator;
pub use render::{render_to_file, JsonMapRenderer, MapPayload, MapRenderer, RenderError};
pub use types::{Cells, EstimateOptions, EstimateOutcome};
