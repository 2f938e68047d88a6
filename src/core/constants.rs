//! Physical constants and service parameters

/// Mean Earth radius used for great-circle distances (km)
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

/// Bracket width at which the density bisection stops
pub const DENSITY_TOLERANCE: f64 = 1e-6;

/// Upper bound on bisection steps; 2^-64 is far below the tolerance
pub const MAX_BISECTION_ITERATIONS: u32 = 64;

/// Geolocation endpoint; `{key}` is replaced by the API key
pub const GEOLOCATION_ENDPOINT: &str =
    "https://www.googleapis.com/geolocation/v1/geolocate?key={key}";

/// Environment variable holding the geolocation API key
pub const API_KEY_ENV_VAR: &str = "GOOGLE_MAPS_API_KEY";
