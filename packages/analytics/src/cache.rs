//! Fingerprint-keyed memoization of regional aggregation.
//!
//! Interactive reruns (new carrier, quality, or precision) reuse the
//! cached coverage as long as the loaded content is unchanged. Entries are
//! keyed on [`Fingerprint`], so replacing the dataset with different
//! content misses the cache even if the old entry is still present.

use std::collections::BTreeMap;
use std::sync::Arc;

use signal_map_geography_models::{RegionCoverage, RegionLayer};
use signal_map_signal_models::{CarrierId, Sample};

use crate::Fingerprint;

/// Memoized [`RegionCoverage`] results, including unavailable ones.
#[derive(Debug, Default)]
pub struct AggregationCache {
    entries: BTreeMap<Fingerprint, Arc<RegionCoverage>>,
    hits: u64,
    misses: u64,
}

impl AggregationCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached coverage for this content, computing and
    /// storing it on a miss.
    pub fn get_or_compute(
        &mut self,
        samples: &[Sample],
        layer: &RegionLayer,
        carriers: &[CarrierId],
    ) -> Arc<RegionCoverage> {
        let key = Fingerprint::of(samples, layer, carriers);

        if let Some(hit) = self.entries.get(&key) {
            self.hits += 1;
            log::debug!("Region coverage cache hit ({key})");
            return Arc::clone(hit);
        }

        self.misses += 1;
        log::info!("Computing region coverage ({key})");
        let coverage = Arc::new(crate::compute_coverage(samples, layer, carriers));
        self.entries.insert(key, Arc::clone(&coverage));
        coverage
    }

    /// Cached coverage for `key`, if present.
    #[must_use]
    pub fn get(&self, key: &Fingerprint) -> Option<Arc<RegionCoverage>> {
        self.entries.get(key).cloned()
    }

    /// Drops the entry for `key`. Returns whether one was present.
    pub fn invalidate(&mut self, key: &Fingerprint) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(hits, misses)` since creation.
    #[must_use]
    pub const fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}
