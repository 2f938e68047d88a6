//! Mock geolocation service for testing and offline use

use crate::core::{LocationEstimate, TowerIdentity};
use crate::lookup::{GeolocationService, LookupError, LookupResult};
use parking_lot::Mutex;
use std::collections::HashMap;

/// Canned answers keyed by tower, with per-tower call counting
///
/// Towers with no registered answer fail with HTTP 404.
#[derive(Debug, Default)]
pub struct MockGeolocationService {
    locations: HashMap<TowerIdentity, LocationEstimate>,
    failures: HashMap<TowerIdentity, LookupError>,
    /// Remaining transient failures before the registered answer is served
    flaky: Mutex<HashMap<TowerIdentity, (u32, LookupError)>>,
    calls: Mutex<HashMap<TowerIdentity, usize>>,
}

impl MockGeolocationService {
    /// Create an empty mock service
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `identity` with `location`
    pub fn with_location(mut self, identity: TowerIdentity, location: LocationEstimate) -> Self {
        self.locations.insert(identity, location.stripped());
        self
    }

    /// Always fail `identity` with `error`
    pub fn with_failure(mut self, identity: TowerIdentity, error: LookupError) -> Self {
        self.failures.insert(identity, error);
        self
    }

    /// Fail the first `times` lookups of `identity` with `error`
    pub fn with_flaky(self, identity: TowerIdentity, times: u32, error: LookupError) -> Self {
        self.flaky.lock().insert(identity, (times, error));
        self
    }

    /// Number of lookups issued for `identity`
    pub fn calls_for(&self, identity: &TowerIdentity) -> usize {
        self.calls.lock().get(identity).copied().unwrap_or(0)
    }

    /// Number of lookups issued in total
    pub fn total_calls(&self) -> usize {
        self.calls.lock().values().sum()
    }

    pub fn reset_calls(&self) {
        self.calls.lock().clear();
    }
}

impl GeolocationService for MockGeolocationService {
    fn lookup(&self, identity: &TowerIdentity) -> LookupResult<LocationEstimate> {
        *self.calls.lock().entry(*identity).or_insert(0) += 1;

        if let Some((remaining, error)) = self.flaky.lock().get_mut(identity) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(error.clone());
            }
        }

        if let Some(error) = self.failures.get(identity) {
            return Err(error.clone());
        }

        self.locations
            .get(identity)
            .copied()
            .ok_or_else(|| LookupError::from_status(404))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::GeoPoint;

    #[test]
    fn test_mock_answers_and_counts() {
        let known = TowerIdentity::new(286, 2, 54110, 51861);
        let unknown = TowerIdentity::new(286, 2, 54108, 0);
        let location = LocationEstimate::new(GeoPoint::new(40.7018894, 29.8912659), 3243.0);
        let service = MockGeolocationService::new().with_location(known, location);

        assert_eq!(service.lookup(&known), Ok(location));
        assert_eq!(service.lookup(&unknown), Err(LookupError::from_status(404)));
        assert_eq!(service.lookup(&known), Ok(location));
        assert_eq!(service.calls_for(&known), 2);
        assert_eq!(service.total_calls(), 3);

        service.reset_calls();
        assert_eq!(service.total_calls(), 0);
    }

    #[test]
    fn test_flaky_then_succeeds() {
        let identity = TowerIdentity::new(286, 2, 54110, 16116);
        let location = LocationEstimate::new(GeoPoint::new(40.702104, 29.8840671), 1952.0);
        let service = MockGeolocationService::new()
            .with_location(identity, location)
            .with_flaky(identity, 1, LookupError::from_status(503));

        assert_eq!(service.lookup(&identity), Err(LookupError::from_status(503)));
        assert_eq!(service.lookup(&identity), Ok(location));
    }
}
