//! Received signal strength to relative power

/// Convert an RSSI reading (dBm) to linear relative power
///
/// Strictly positive for every finite input.
pub fn power_of(signal_strength_dbm: f64) -> f64 {
    10f64.powf(signal_strength_dbm / 10.0)
}

/// Accumulate the weight of towers folded into a running estimate
pub fn combine_power(a: f64, b: f64) -> f64 {
    a + b
}
