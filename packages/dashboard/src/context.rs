//! The dashboard session: configuration, loaded data, and the
//! aggregation cache, owned together instead of living in globals.

use std::sync::Arc;

use signal_map_analytics::{AggregationCache, Fingerprint};
use signal_map_loader::progress::ProgressCallback;
use signal_map_loader::{Dataset, load_dataset};

use crate::config::DashboardConfig;
use crate::filter::filter;
use crate::reduce::reduce;
use crate::render::{DashboardView, Notice, annotate_regions, build_markers, map_center};
use crate::{DashboardError, Selection};

/// One dashboard session: the configuration, the loaded data, and the
/// region coverage cache.
#[derive(Debug)]
pub struct DashboardContext {
    config: DashboardConfig,
    dataset: Dataset,
    cache: AggregationCache,
}

impl DashboardContext {
    /// Wraps an already loaded dataset.
    #[must_use]
    pub fn new(config: DashboardConfig, dataset: Dataset) -> Self {
        Self {
            config,
            dataset,
            cache: AggregationCache::new(),
        }
    }

    /// Loads the dataset described by `config`.
    ///
    /// Missing or malformed inputs never fail the load; they end up in
    /// [`Dataset::warnings`] and are shown as notices on every render.
    #[must_use]
    pub fn load(config: DashboardConfig, progress: &Arc<dyn ProgressCallback>) -> Self {
        let dataset = load_configured_dataset(&config, progress);
        Self::new(config, dataset)
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// The loaded samples, regions, and load warnings.
    #[must_use]
    pub const fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// `(hits, misses)` of the region coverage cache.
    #[must_use]
    pub const fn cache_stats(&self) -> (u64, u64) {
        self.cache.stats()
    }

    /// Swaps in a new dataset and returns the old one.
    ///
    /// The cached coverage of the outgoing content is invalidated unless
    /// the new dataset has the same fingerprint.
    pub fn replace_dataset(&mut self, dataset: Dataset) -> Dataset {
        log::info!(
            "Replacing dataset ({} samples, {} regions)",
            dataset.samples.len(),
            dataset.regions.regions.len()
        );

        let carriers = self.config.carrier_ids();
        let outgoing = Fingerprint::of(&self.dataset.samples, &self.dataset.regions, &carriers);
        let incoming = Fingerprint::of(&dataset.samples, &dataset.regions, &carriers);
        if outgoing != incoming && self.cache.invalidate(&outgoing) {
            log::debug!("Invalidated region coverage for {outgoing}");
        }

        std::mem::replace(&mut self.dataset, dataset)
    }

    /// Re-reads every configured input file.
    pub fn reload(&mut self, progress: &Arc<dyn ProgressCallback>) {
        let dataset = load_configured_dataset(&self.config, progress);
        self.replace_dataset(dataset);
    }

    /// Runs one full pass for `selection`: filter by carrier and quality,
    /// reduce by stride, build markers, and attach region coverage.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::UnknownCarrier`] or
    /// [`DashboardError::UnknownPrecision`] if `selection` does not match
    /// the configuration.
    pub fn render(&mut self, selection: &Selection) -> Result<DashboardView, DashboardError> {
        selection.validate(&self.config)?;

        let filtered = filter(
            &self.dataset.samples,
            &selection.carrier,
            selection.quality,
            &self.config.quality,
        );
        let displayed = reduce(&filtered, selection.stride);
        let markers = build_markers(
            &displayed,
            &selection.carrier,
            selection.quality,
            &self.config.quality,
        );

        let mut notices: Vec<Notice> = self.dataset.warnings.iter().map(Notice::from).collect();
        if markers.is_empty() {
            notices.push(Notice::empty_result(selection));
        }

        let carriers = self.config.carrier_ids();
        let coverage =
            self.cache
                .get_or_compute(&self.dataset.samples, &self.dataset.regions, &carriers);
        let regions = match &*coverage {
            Ok(summaries) => Some(annotate_regions(
                &self.dataset.regions,
                summaries,
                &self.config.regions,
            )),
            Err(reason) => {
                log::warn!("Region statistics unavailable: {reason}");
                notices.push(Notice::warning(format!(
                    "Region statistics unavailable: {reason}"
                )));
                None
            }
        };

        log::debug!(
            "Rendered {selection}: {} filtered, {} displayed",
            filtered.len(),
            markers.len()
        );

        Ok(DashboardView {
            selection: selection.clone(),
            filtered_count: filtered.len(),
            displayed_count: markers.len(),
            center: map_center(&markers),
            zoom: self.config.map.zoom_start,
            marker_style: self.config.markers,
            markers,
            regions,
            notices,
        })
    }
}

fn load_configured_dataset(
    config: &DashboardConfig,
    progress: &Arc<dyn ProgressCallback>,
) -> Dataset {
    let (request, mut warnings) = config.dataset_request();
    let mut dataset = load_dataset(&request, progress);
    warnings.append(&mut dataset.warnings);
    dataset.warnings = warnings;
    dataset
}
