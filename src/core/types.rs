//! Core data types for cell tower positioning

use crate::validation::error::{GeocellError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Network identity of a single cell tower
///
/// Two identities are equal only when all four codes match, which makes the
/// type usable as a cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TowerIdentity {
    /// Mobile country code (MCC)
    pub mobile_country_code: u16,
    /// Mobile network code (MNC)
    pub mobile_network_code: u16,
    /// Location area code (LAC)
    pub location_area_code: u32,
    /// Cell identifier (CID)
    pub cell_id: u64,
}

impl TowerIdentity {
    pub fn new(mcc: u16, mnc: u16, lac: u32, cid: u64) -> Self {
        Self {
            mobile_country_code: mcc,
            mobile_network_code: mnc,
            location_area_code: lac,
            cell_id: cid,
        }
    }
}

impl fmt::Display for TowerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.mobile_country_code,
            self.mobile_network_code,
            self.location_area_code,
            self.cell_id
        )
    }
}

/// A tower seen by the device, with its received signal strength if known
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TowerObservation {
    pub identity: TowerIdentity,
    /// RSSI in dBm (more negative is weaker)
    pub signal_strength: Option<i32>,
}

impl TowerObservation {
    pub fn new(identity: TowerIdentity, signal_strength: Option<i32>) -> Self {
        Self { identity, signal_strength }
    }

    pub fn with_signal(mcc: u16, mnc: u16, lac: u32, cid: u64, rssi: i32) -> Self {
        Self::new(TowerIdentity::new(mcc, mnc, lac, cid), Some(rssi))
    }
}

/// Loosely typed observation as reported by modems and scan tools
///
/// Every field is optional on the wire but no other keys are accepted;
/// conversion into a [`TowerObservation`] fails on the first missing
/// identity code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawObservation {
    #[serde(default)]
    pub mcc: Option<u16>,
    #[serde(default)]
    pub mnc: Option<u16>,
    #[serde(default)]
    pub lac: Option<u32>,
    #[serde(default)]
    pub cid: Option<u64>,
    #[serde(default)]
    pub rssi: Option<i32>,
}

impl TryFrom<RawObservation> for TowerObservation {
    type Error = GeocellError;

    fn try_from(raw: RawObservation) -> Result<Self> {
        let missing = |field: &str| GeocellError::InvalidObservation { field: field.to_string() };

        let cid = raw.cid.ok_or_else(|| missing("cid"))?;
        let lac = raw.lac.ok_or_else(|| missing("lac"))?;
        let mcc = raw.mcc.ok_or_else(|| missing("mcc"))?;
        let mnc = raw.mnc.ok_or_else(|| missing("mnc"))?;

        Ok(TowerObservation::new(TowerIdentity::new(mcc, mnc, lac, cid), raw.rssi))
    }
}

/// Geographic point in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Position with an uncertainty radius
///
/// Produced by the geolocation service for a single tower, and by the
/// estimator for the fused result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationEstimate {
    #[serde(rename = "location")]
    pub position: GeoPoint,
    /// Accuracy radius (meters)
    pub accuracy: f64,
    /// RSSI of the tower this estimate belongs to, if attached
    #[serde(rename = "rssi", default, skip_serializing_if = "Option::is_none")]
    pub signal_strength: Option<i32>,
}

impl LocationEstimate {
    pub fn new(position: GeoPoint, accuracy: f64) -> Self {
        Self {
            position,
            accuracy,
            signal_strength: None,
        }
    }

    pub fn with_signal_strength(mut self, signal_strength: Option<i32>) -> Self {
        self.signal_strength = signal_strength;
        self
    }

    /// Copy of this estimate without signal strength, as stored in the cache
    pub fn stripped(&self) -> Self {
        Self {
            signal_strength: None,
            ..*self
        }
    }
}
