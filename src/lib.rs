//! Cell Tower Positioning
//!
//! Estimates a device position from the cell towers it can hear. Tower
//! locations come from a geolocation service; the position is refined from
//! the serving cell towards each neighbour in proportion to received power.

pub mod core;
pub mod algorithms;
pub mod processing;
pub mod lookup;
pub mod validation;
pub mod utils;
pub mod api;

// Re-export commonly used types
pub use core::{GeoPoint, LocationEstimate, RawObservation, TowerIdentity, TowerObservation};
pub use algorithms::{FilterMode, PathRefiner, RefinedPath};
pub use processing::{LocationCache, TowerLocationResolver};
pub use lookup::{
    GeolocationService, HttpGeolocationService, LookupError, MockGeolocationService, RetryPolicy,
};
pub use validation::{ErrorReporter, GeocellError, Result};
pub use utils::{DisplayMode, EstimatorConfig, LookupConfig, ResolutionMode};
pub use api::{
    CellEstimator, Cells, EstimateOptions, EstimateOutcome, JsonMapRenderer, MapPayload,
    MapRenderer,
};
