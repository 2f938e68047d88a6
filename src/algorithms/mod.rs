//! Core positioning algorithms

pub mod power;
pub mod geometry;
pub mod path;

pub use geometry::{distance_meters, haversine_km, interpolate};
pub use path::{wave_density, FilterMode, PathRefiner, RefinedPath};
pub use power::{combine_power, power_of};
