//! Power-weighted path refinement
//!
//! The serving cell's location is moved step by step towards each admitted
//! neighbour. The step size comes from balancing the inverse-square reach of
//! the accumulated power against the neighbour's power, so equal powers meet
//! halfway. Every intermediate center is kept as a waypoint and the last one
//! is the fused estimate.

use crate::algorithms::geometry::{distance_meters, interpolate};
use crate::algorithms::power::{combine_power, power_of};
use crate::core::{GeoPoint, LocationEstimate, DENSITY_TOLERANCE, MAX_BISECTION_ITERATIONS};
use serde::{Deserialize, Serialize};

/// Which neighbouring towers take part in the refinement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    /// Candidate must lie inside the serving cell radius around the current center
    #[default]
    Subset,
    /// Serving radius and candidate radius must overlap
    Intersection,
    /// Every candidate is used
    Unbound,
}

impl FilterMode {
    pub const ALL: [FilterMode; 3] = [
        FilterMode::Subset,
        FilterMode::Intersection,
        FilterMode::Unbound,
    ];

    /// Whether a candidate `distance` meters from the current center is admitted
    pub fn admits(&self, serving_radius: f64, candidate_accuracy: f64, distance: f64) -> bool {
        match self {
            FilterMode::Subset => serving_radius >= distance,
            FilterMode::Intersection => serving_radius + candidate_accuracy >= distance,
            FilterMode::Unbound => true,
        }
    }
}

/// Fraction `d` in `[0, 1]` solving `power_a / d² = power_b / (1 - d)²`
///
/// Bisection: the left side falls and the right side rises with `d`, so the
/// signed difference changes sign exactly once. Powers must be positive.
pub fn wave_density(power_a: f64, power_b: f64) -> f64 {
    let mut low = 0.0_f64;
    let mut high = 1.0_f64;
    let mut mid = 0.5;
    let mut iterations = 0;

    while (high - low).abs() > DENSITY_TOLERANCE && iterations < MAX_BISECTION_ITERATIONS {
        mid = (low + high) / 2.0;
        let reach_a = power_a / (mid * mid);
        let reach_b = power_b / ((1.0 - mid) * (1.0 - mid));
        let diff = reach_a - reach_b;

        if diff > 0.0 {
            low = mid;
        } else if diff < 0.0 {
            high = mid;
        } else {
            return mid;
        }
        iterations += 1;
    }

    mid
}

/// Waypoints from the serving cell to the fused position, with its accuracy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefinedPath {
    pub path: Vec<GeoPoint>,
    /// Accuracy radius of the last waypoint (meters)
    pub accuracy: f64,
}

impl RefinedPath {
    /// The fused position (last waypoint); `None` for an empty path
    pub fn marker(&self) -> Option<GeoPoint> {
        self.path.last().copied()
    }
}

/// Fuses an ordered list of tower locations into one position
#[derive(Debug, Clone, Default)]
pub struct PathRefiner {
    filter_mode: FilterMode,
}

impl PathRefiner {
    pub fn new(filter_mode: FilterMode) -> Self {
        Self { filter_mode }
    }

    pub fn filter_mode(&self) -> FilterMode {
        self.filter_mode
    }

    /// Refine `cells` into a waypoint path
    ///
    /// `cells[0]` is treated as the serving cell and the rest must be in
    /// decreasing signal order; callers that cannot guarantee this sort first.
    /// Towers without a signal reading are skipped. When the serving cell has
    /// no reading or no radius, the path is just the serving cell.
    ///
    /// Returns `None` for an empty input.
    pub fn refine(&self, cells: &[LocationEstimate]) -> Option<RefinedPath> {
        let serving = cells.first()?;
        let mut center = serving.position;
        let mut path = vec![center];

        let signal = match serving.signal_strength {
            Some(signal) if serving.accuracy != 0.0 => signal,
            _ => {
                return Some(RefinedPath {
                    path,
                    accuracy: serving.accuracy,
                })
            }
        };

        let radius = serving.accuracy;
        let mut current_power = power_of(signal as f64);

        for cell in &cells[1..] {
            let Some(signal) = cell.signal_strength else {
                continue;
            };

            let candidate_power = power_of(signal as f64);
            let distance = distance_meters(&center, &cell.position);
            if !self.filter_mode.admits(radius, cell.accuracy, distance) {
                tracing::debug!(
                    position = ?cell.position,
                    distance,
                    "candidate rejected by {:?} filter",
                    self.filter_mode
                );
                continue;
            }

            let density = wave_density(current_power, candidate_power);
            center = interpolate(&cell.position, &center, density);
            current_power = combine_power(current_power, candidate_power);
            path.push(center);
        }

        let accuracy = if path.len() > 1 {
            derive_accuracy(radius, &path)
        } else {
            serving.accuracy
        };

        Some(RefinedPath { path, accuracy })
    }
}

/// Accuracy of the fused point from how far the path moved
///
/// `radius - distance` goes negative once the path leaves the serving
/// radius; the absolute value then reports the overshoot as the accuracy.
fn derive_accuracy(radius: f64, path: &[GeoPoint]) -> f64 {
    let origin = &path[0];
    let dist_to_last = distance_meters(origin, &path[path.len() - 1]);
    let dist_to_second = distance_meters(origin, &path[1]);

    let dist_to_center = dist_to_last.min(dist_to_second);
    let dist_to_edge = (radius - dist_to_last).min(radius - dist_to_second);

    dist_to_center.min(dist_to_edge).abs()
}
