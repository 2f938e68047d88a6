//! Batch resolution of tower observations into locations

use crate::core::{LocationEstimate, TowerIdentity, TowerObservation};
use crate::lookup::{GeolocationService, LookupResult, RetryPolicy};
use crate::processing::cache::LocationCache;
use crate::utils::config::{EstimatorConfig, ResolutionMode};
use crate::validation::error::{ErrorReporter, GeocellError, Result};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Resolves observed towers through the cache and the geolocation service
///
/// Each distinct uncached tower of a batch is looked up once, either on the
/// calling thread or on a worker pool. Failed lookups are reported to the
/// [`ErrorReporter`] and leave their positions unresolved.
pub struct TowerLocationResolver {
    service: Arc<dyn GeolocationService>,
    cache: Arc<LocationCache>,
    reporter: Arc<ErrorReporter>,
    retry: RetryPolicy,
    mode: ResolutionMode,
    max_workers: usize,
    use_cache: bool,
}

impl TowerLocationResolver {
    /// Sequential resolver with caching and default retries
    pub fn new(
        service: Arc<dyn GeolocationService>,
        cache: Arc<LocationCache>,
        reporter: Arc<ErrorReporter>,
    ) -> Self {
        Self {
            service,
            cache,
            reporter,
            retry: RetryPolicy::default(),
            mode: ResolutionMode::Sequential,
            max_workers: 1,
            use_cache: true,
        }
    }

    /// Resolver using the resolution and retry settings of `config`
    pub fn from_config(
        service: Arc<dyn GeolocationService>,
        cache: Arc<LocationCache>,
        reporter: Arc<ErrorReporter>,
        config: &EstimatorConfig,
    ) -> Self {
        Self::new(service, cache, reporter)
            .with_mode(config.resolution_mode, config.max_workers)
            .with_retry(config.lookup.retry_policy())
            .with_cache_enabled(config.use_cache)
    }

    pub fn with_mode(mut self, mode: ResolutionMode, max_workers: usize) -> Self {
        self.mode = mode;
        self.max_workers = max_workers.max(1);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_cache_enabled(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }

    pub fn cache(&self) -> &Arc<LocationCache> {
        &self.cache
    }

    pub fn reporter(&self) -> &Arc<ErrorReporter> {
        &self.reporter
    }

    /// Locations for `observations`, index for index
    ///
    /// With `preserve_signal`, each location carries the signal strength of
    /// the observation at its position.
    pub fn resolve(
        &self,
        observations: &[TowerObservation],
        preserve_signal: bool,
    ) -> Result<Vec<Option<LocationEstimate>>> {
        let mut results: Vec<Option<LocationEstimate>> = if self.use_cache {
            observations.iter().map(|obs| self.cache.get(&obs.identity)).collect()
        } else {
            vec![None; observations.len()]
        };

        let mut seen = HashSet::new();
        let misses: Vec<TowerIdentity> = observations
            .iter()
            .zip(&results)
            .filter(|(_, result)| result.is_none())
            .map(|(obs, _)| obs.identity)
            .filter(|identity| seen.insert(*identity))
            .collect();

        tracing::debug!(
            towers = observations.len(),
            cached = observations.len() - results.iter().filter(|r| r.is_none()).count(),
            lookups = misses.len(),
            "resolving tower batch"
        );

        if !misses.is_empty() {
            let mut found = HashMap::with_capacity(misses.len());
            for (identity, result) in self.dispatch(&misses)? {
                match result {
                    Ok(location) => {
                        if self.use_cache {
                            self.cache.put(identity, location);
                        }
                        found.insert(identity, location.stripped());
                    }
                    Err(e) => {
                        self.reporter.report_lookup_failure(identity, e.to_string());
                    }
                }
            }

            for (obs, slot) in observations.iter().zip(results.iter_mut()) {
                if slot.is_none() {
                    *slot = found.get(&obs.identity).copied();
                }
            }
        }

        for (obs, slot) in observations.iter().zip(results.iter_mut()) {
            if let Some(location) = slot.as_mut() {
                location.signal_strength = if preserve_signal { obs.signal_strength } else { None };
            }
        }

        Ok(results)
    }

    /// Resolved locations only, in input order; `None` if nothing resolved
    pub fn locate(
        &self,
        observations: &[TowerObservation],
        preserve_signal: bool,
    ) -> Result<Option<Vec<LocationEstimate>>> {
        let located: Vec<LocationEstimate> = self
            .resolve(observations, preserve_signal)?
            .into_iter()
            .flatten()
            .collect();

        Ok(if located.is_empty() { None } else { Some(located) })
    }

    /// Location of a single tower
    pub fn resolve_one(
        &self,
        observation: &TowerObservation,
        preserve_signal: bool,
    ) -> Result<Option<LocationEstimate>> {
        Ok(self
            .resolve(std::slice::from_ref(observation), preserve_signal)?
            .pop()
            .flatten())
    }

    fn dispatch(
        &self,
        misses: &[TowerIdentity],
    ) -> Result<Vec<(TowerIdentity, LookupResult<LocationEstimate>)>> {
        match self.mode {
            ResolutionMode::Sequential => Ok(misses
                .iter()
                .map(|identity| (*identity, self.lookup_with_retry(identity)))
                .collect()),
            ResolutionMode::Parallel => {
                let workers = misses.len().min(self.max_workers);
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(workers)
                    .thread_name(|i| format!("geocell-lookup-{}", i))
                    .build()
                    .map_err(|e| GeocellError::ThreadPool(e.to_string()))?;

                Ok(pool.install(|| {
                    misses
                        .par_iter()
                        .map(|identity| (*identity, self.lookup_with_retry(identity)))
                        .collect()
                }))
            }
        }
    }

    fn lookup_with_retry(&self, identity: &TowerIdentity) -> LookupResult<LocationEstimate> {
        self.retry.run(|| self.service.lookup(identity))
    }
}
