//! Geolocation service abstraction
//!
//! The service maps one tower identity to the location and coverage radius
//! the provider has on record. An HTTP implementation talks to the hosted
//! geolocation API; the mock serves canned answers for tests and offline use.

pub mod http;
pub mod mock;
pub mod error;

pub use error::{status_reason, LookupError, LookupResult, RetryPolicy};
pub use http::HttpGeolocationService;
pub use mock::MockGeolocationService;

use crate::core::{LocationEstimate, TowerIdentity};

/// Source of per-tower locations
///
/// Implementations are shared between lookup workers, and must answer
/// deterministically for a fixed identity.
pub trait GeolocationService: Send + Sync {
    /// Location of a single tower, without signal strength
    fn lookup(&self, identity: &TowerIdentity) -> LookupResult<LocationEstimate>;
}
