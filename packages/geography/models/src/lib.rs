#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Administrative region and regional coverage summary types.
//!
//! A [`Region`] is a named boundary polygon loaded once and shared
//! read-only. Aggregation never mutates it; instead it produces
//! [`RegionCoverageSummary`] values that the dashboard attaches to new,
//! independently owned overlay records.

use geo::MultiPolygon;
use serde::{Deserialize, Serialize};
use signal_map_signal_models::CarrierId;
use thiserror::Error;

/// Default property holding a region's display name.
pub const DEFAULT_NAME_ATTRIBUTE: &str = "name";

/// A named administrative boundary in WGS84 coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    /// Unique display name.
    pub name: String,
    /// Boundary polygon(s), `x = longitude`, `y = latitude`.
    pub boundary: MultiPolygon<f64>,
    /// Source file name the region was loaded from.
    pub source: String,
}

/// A loaded set of regions together with what the loader observed.
///
/// Kept separate from a bare `Vec<Region>` so that the join can tell an
/// empty layer apart from a layer whose features lacked the name
/// attribute.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionLayer {
    /// Property that was used for region names.
    pub name_attribute: String,
    /// Regions with unique names, in first-seen order.
    pub regions: Vec<Region>,
    /// Number of polygon features read, named or not.
    pub features_seen: usize,
}

impl RegionLayer {
    /// Looks up a region by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Region> {
        self.regions.iter().find(|region| region.name == name)
    }
}

/// Why region statistics could not be produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegionStatsUnavailable {
    /// No region polygons were loaded.
    #[error("no region polygons are loaded")]
    NoRegions,

    /// Polygon features were loaded but none carried the name attribute.
    #[error("region features are missing the '{attribute}' attribute")]
    MissingNameAttribute {
        /// The attribute that was expected.
        attribute: String,
    },
}

/// Coverage figures for a single carrier within a region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarrierCoverage {
    /// Carrier identifier.
    pub carrier: CarrierId,
    /// Samples in the region whose reading for this carrier is good.
    pub good_count: usize,
    /// `good_count / sample_count * 100`, or 0 for an empty region.
    pub good_percent: f64,
}

/// Per-region coverage statistics across all configured carriers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionCoverageSummary {
    /// Region display name.
    pub region: String,
    /// Number of samples joined to the region.
    pub sample_count: usize,
    /// One entry per configured carrier, in configured order.
    pub carriers: Vec<CarrierCoverage>,
    /// Carrier with the highest good percentage; first carrier wins ties.
    /// `None` when the region has no samples.
    pub best_carrier: Option<CarrierCoverage>,
    /// Samples where at least one carrier is good.
    pub any_good_count: usize,
    /// `any_good_count / sample_count * 100`, or 0 for an empty region.
    pub any_good_percent: f64,
    /// Highway length (km) covered by the path through samples where at
    /// least one carrier is good.
    pub good_coverage_km: f64,
    /// Multi-line human-readable summary.
    pub summary: String,
}

impl RegionCoverageSummary {
    /// Whether any samples fell inside the region.
    #[must_use]
    pub const fn has_data(&self) -> bool {
        self.sample_count > 0
    }

    /// Coverage for a single carrier.
    #[must_use]
    pub fn carrier(&self, carrier: &CarrierId) -> Option<&CarrierCoverage> {
        self.carriers.iter().find(|c| &c.carrier == carrier)
    }
}

/// Outcome of regional aggregation: per-region summaries, or the reason
/// the region overlay cannot be shown.
pub type RegionCoverage = Result<Vec<RegionCoverageSummary>, RegionStatsUnavailable>;

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    #[test]
    fn layer_lookup_by_name() {
        let layer = RegionLayer {
            name_attribute: DEFAULT_NAME_ATTRIBUTE.to_string(),
            regions: vec![Region {
                name: "Vysocina".to_string(),
                boundary: MultiPolygon(vec![polygon![
                    (x: 15.0, y: 49.0),
                    (x: 16.0, y: 49.0),
                    (x: 16.0, y: 50.0),
                    (x: 15.0, y: 49.0),
                ]]),
                source: "kraje.geojson".to_string(),
            }],
            features_seen: 1,
        };

        assert!(layer.get("Vysocina").is_some());
        assert!(layer.get("Praha").is_none());
    }

    #[test]
    fn unavailable_reasons_render() {
        assert_eq!(
            RegionStatsUnavailable::MissingNameAttribute {
                attribute: "name".to_string()
            }
            .to_string(),
            "region features are missing the 'name' attribute"
        );
    }
}
