//! Top-level position estimation
//!
//! Resolves observed towers, refines the ordered locations into a single
//! position and optionally renders the result.

use crate::algorithms::path::PathRefiner;
use crate::api::render::{render_to_file, JsonMapRenderer, MapPayload, MapRenderer};
use crate::api::types::{Cells, EstimateOptions, EstimateOutcome};
use crate::core::{LocationEstimate, TowerObservation};
use crate::lookup::{GeolocationService, HttpGeolocationService};
use crate::processing::{LocationCache, TowerLocationResolver};
use crate::utils::config::EstimatorConfig;
use crate::validation::error::{ErrorReporter, Result};
use std::path::Path;
use std::sync::Arc;

/// Estimates device positions from observed cell towers
pub struct CellEstimator {
    resolver: TowerLocationResolver,
    renderer: Box<dyn MapRenderer>,
    config: EstimatorConfig,
}

impl CellEstimator {
    /// Estimator backed by the hosted geolocation API
    ///
    /// The API key is taken from the environment when the configuration does
    /// not carry one.
    pub fn new(config: EstimatorConfig) -> Result<Self> {
        let config = config.with_env_api_key().validated()?;
        let service = Arc::new(HttpGeolocationService::new(&config.lookup)?);
        Self::with_service(config, service, Arc::new(LocationCache::new()))
    }

    /// Estimator using `service` for lookups and sharing `cache`
    pub fn with_service(
        config: EstimatorConfig,
        service: Arc<dyn GeolocationService>,
        cache: Arc<LocationCache>,
    ) -> Result<Self> {
        let config = config.validated()?;
        let reporter = Arc::new(ErrorReporter::new());
        let resolver = TowerLocationResolver::from_config(service, cache, reporter, &config);

        Ok(Self {
            resolver,
            renderer: Box::new(JsonMapRenderer::pretty()),
            config,
        })
    }

    /// Replace the default JSON renderer
    pub fn with_renderer(mut self, renderer: Box<dyn MapRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    pub fn resolver(&self) -> &TowerLocationResolver {
        &self.resolver
    }

    pub fn reporter(&self) -> &Arc<ErrorReporter> {
        self.resolver.reporter()
    }

    /// Estimate using the options of this estimator's configuration
    pub fn estimate_with_config(
        &self,
        cells: &Cells,
        render_target: Option<&Path>,
    ) -> Result<Option<LocationEstimate>> {
        self.estimate(cells, render_target, &EstimateOptions::from(&self.config))
    }

    /// Fused position and accuracy for `cells`
    ///
    /// Returns `Ok(None)` when no tower could be located. Invalid raw
    /// observations are an error and nothing is looked up. When
    /// `render_target` is given, the map document is written there; a render
    /// failure is reported but does not affect the returned estimate.
    pub fn estimate(
        &self,
        cells: &Cells,
        render_target: Option<&Path>,
        options: &EstimateOptions,
    ) -> Result<Option<LocationEstimate>> {
        let Some(outcome) = self.estimate_detailed(cells, options)? else {
            return Ok(None);
        };

        if let Some(target) = render_target {
            let payload = MapPayload::build(&outcome.cells, &outcome.refined, options.display_mode);
            let api_key = &self.config.lookup.api_key;
            let rendered = match payload {
                Some(payload) => render_to_file(self.renderer.as_ref(), &payload, api_key, target)
                    .map_err(|e| e.to_string()),
                None => Err("refined path has no waypoints".to_string()),
            };
            if let Err(reason) = rendered {
                self.reporter().report_render_failure(reason);
            }
        }

        Ok(Some(outcome.estimate))
    }

    /// Like [`estimate`](Self::estimate), also returning the waypoint path
    /// and the tower locations used; never renders
    pub fn estimate_detailed(
        &self,
        cells: &Cells,
        options: &EstimateOptions,
    ) -> Result<Option<EstimateOutcome>> {
        let mut located = match cells {
            Cells::Located(located) => located.clone(),
            Cells::Observed(observations) => match self.resolver.locate(observations, true)? {
                Some(located) => located,
                None => return Ok(None),
            },
            Cells::Raw(raw) => {
                let observations = raw
                    .iter()
                    .cloned()
                    .map(TowerObservation::try_from)
                    .collect::<Result<Vec<_>>>()?;
                match self.resolver.locate(&observations, true)? {
                    Some(located) => located,
                    None => return Ok(None),
                }
            }
        };

        if options.sort_by_signal {
            // stable: towers with equal strength keep their given order
            located.sort_by_key(|cell| std::cmp::Reverse(cell.signal_strength.unwrap_or(0)));
        }

        let Some(refined) = PathRefiner::new(options.filter_mode).refine(&located) else {
            return Ok(None);
        };
        let Some(marker) = refined.marker() else {
            return Ok(None);
        };

        let estimate = LocationEstimate::new(marker, refined.accuracy);
        tracing::info!(
            lat = estimate.position.lat,
            lng = estimate.position.lng,
            accuracy = estimate.accuracy,
            towers = located.len(),
            waypoints = refined.path.len(),
            "position estimated"
        );

        Ok(Some(EstimateOutcome {
            estimate,
            refined,
            cells: located,
        }))
    }
}
