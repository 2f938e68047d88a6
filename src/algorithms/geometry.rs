//! Great-circle distance and point interpolation

use crate::core::{GeoPoint, EARTH_RADIUS_KM};
use nalgebra::Vector2;

/// Haversine distance between two points on a spherical Earth (km)
pub fn haversine_km(p: &GeoPoint, q: &GeoPoint) -> f64 {
    let lat1 = p.lat.to_radians();
    let lat2 = q.lat.to_radians();
    let dlat = lat2 - lat1;
    let dlng = (q.lng - p.lng).to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}

/// Great-circle distance in meters
pub fn distance_meters(p: &GeoPoint, q: &GeoPoint) -> f64 {
    1000.0 * haversine_km(p, q)
}

/// Point `density_a` of the way from `point_b` to `point_a`
///
/// `b + density_a * (a - b)` per coordinate. A density of zero or below
/// returns `point_b` untouched.
pub fn interpolate(point_a: &GeoPoint, point_b: &GeoPoint, density_a: f64) -> GeoPoint {
    if density_a <= 0.0 {
        return *point_b;
    }
    if density_a == 1.0 {
        return *point_a;
    }

    let a = Vector2::new(point_a.lat, point_a.lng);
    let b = Vector2::new(point_b.lat, point_b.lng);
    let p = b + (a - b) * density_a;

    GeoPoint::new(p.x, p.y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_distance_zero_for_same_point() {
        let p = GeoPoint::new(40.7018894, 29.8912659);
        assert_eq!(distance_meters(&p, &p), 0.0);
    }

    #[test]
    fn test_distance_one_degree_of_latitude() {
        let p = GeoPoint::new(0.0, 0.0);
        let q = GeoPoint::new(1.0, 0.0);
        // 2 * pi * R / 360
        assert_relative_eq!(haversine_km(&p, &q), 111.19508, max_relative = 1e-6);
        assert_relative_eq!(distance_meters(&p, &q), 1000.0 * haversine_km(&p, &q));
    }

    #[test]
    fn test_distance_is_symmetric() {
        let p = GeoPoint::new(40.7018894, 29.8912659);
        let q = GeoPoint::new(40.7609673, 29.752043);
        assert_relative_eq!(distance_meters(&p, &q), distance_meters(&q, &p), max_relative = 1e-12);
        assert!(distance_meters(&p, &q) > 13_000.0 && distance_meters(&p, &q) < 14_000.0);
    }

    #[test]
    fn test_interpolate_endpoints_are_exact() {
        let a = GeoPoint::new(40.702104, 29.884067099999996);
        let b = GeoPoint::new(40.7018894, 29.8912659);
        assert_eq!(interpolate(&a, &b, 0.0), b);
        assert_eq!(interpolate(&a, &b, 1.0), a);
    }

    #[test]
    fn test_interpolate_non_positive_density_returns_b() {
        let a = GeoPoint::new(1.0, 2.0);
        let b = GeoPoint::new(3.0, 4.0);
        assert_eq!(interpolate(&a, &b, -0.5), b);
        assert_eq!(interpolate(&a, &b, -0.0), b);
    }

    #[test]
    fn test_interpolate_midpoint() {
        let a = GeoPoint::new(10.0, 20.0);
        let b = GeoPoint::new(20.0, 40.0);
        let mid = interpolate(&a, &b, 0.5);
        assert_relative_eq!(mid.lat, 15.0);
        assert_relative_eq!(mid.lng, 30.0);

        let quarter = interpolate(&a, &b, 0.25);
        assert_relative_eq!(quarter.lat, 17.5);
        assert_relative_eq!(quarter.lng, 35.0);
    }
}
