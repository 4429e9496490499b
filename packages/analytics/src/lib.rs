#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Per-region, per-carrier signal coverage aggregation.
//!
//! Consumes the output of [`signal_map_spatial::join`] and produces one
//! [`RegionCoverageSummary`] per region: the share of good samples per
//! carrier, the best carrier, the share of samples where any carrier is
//! good, and the highway length covered by a good signal.
//!
//! Aggregation depends only on the loaded data and the carrier list, so
//! [`AggregationCache`] memoizes it keyed on a content [`Fingerprint`].

pub mod cache;
pub mod fingerprint;

use std::collections::BTreeMap;

use geo::{Euclidean, Length as _, LineString, Point};
use signal_map_geography_models::{
    CarrierCoverage, RegionCoverage, RegionCoverageSummary, RegionLayer,
};
use signal_map_signal_models::{CarrierId, Sample};
use signal_map_spatial::{JoinResult, JoinedSample};

pub use cache::AggregationCache;
pub use fingerprint::Fingerprint;

/// Joins `samples` against `layer` and aggregates the result.
///
/// # Errors
///
/// Returns [`signal_map_geography_models::RegionStatsUnavailable`] when
/// the region layer cannot be used; callers render without the overlay.
pub fn compute_coverage(
    samples: &[Sample],
    layer: &RegionLayer,
    carriers: &[CarrierId],
) -> RegionCoverage {
    let joined = signal_map_spatial::join(samples, layer)?;
    Ok(aggregate(&joined, carriers))
}

/// Aggregates joined samples into one summary per region, in layer
/// order. Regions without samples get a "no data" summary.
#[must_use]
pub fn aggregate(joined: &JoinResult<'_>, carriers: &[CarrierId]) -> Vec<RegionCoverageSummary> {
    let mut by_region: Vec<Vec<&JoinedSample<'_>>> = vec![Vec::new(); joined.regions.len()];
    for pair in &joined.pairs {
        by_region[pair.region].push(pair);
    }

    joined
        .regions
        .iter()
        .zip(by_region)
        .map(|(region, members)| summarize_region(&region.name, &members, carriers))
        .collect()
}

fn summarize_region(
    name: &str,
    members: &[&JoinedSample<'_>],
    carriers: &[CarrierId],
) -> RegionCoverageSummary {
    let sample_count = members.len();

    let coverage: Vec<CarrierCoverage> = carriers
        .iter()
        .map(|carrier| {
            let good_count = members
                .iter()
                .filter(|pair| pair.sample.is_good_for(carrier))
                .count();
            CarrierCoverage {
                carrier: carrier.clone(),
                good_count,
                good_percent: percent(good_count, sample_count),
            }
        })
        .collect();

    let best_carrier = if sample_count == 0 {
        None
    } else {
        best_of(&coverage).cloned()
    };

    let any_good_count = members
        .iter()
        .filter(|pair| pair.sample.any_carrier_good(carriers))
        .count();

    let good_coverage_km = good_coverage_length_m(members, carriers) / 1000.0;

    let mut summary = RegionCoverageSummary {
        region: name.to_string(),
        sample_count,
        carriers: coverage,
        best_carrier,
        any_good_count,
        any_good_percent: percent(any_good_count, sample_count),
        good_coverage_km,
        summary: String::new(),
    };
    summary.summary = describe(&summary);
    summary
}

/// First carrier with the highest good percentage.
fn best_of(coverage: &[CarrierCoverage]) -> Option<&CarrierCoverage> {
    coverage.iter().fold(None, |best, candidate| match best {
        Some(current) if current.good_percent >= candidate.good_percent => Some(current),
        _ => Some(candidate),
    })
}

/// Length (meters) of highway where at least one carrier is good.
///
/// Segment lengths are measured in the join's projected plane.
///
/// Samples are grouped by highway id and ordered by timestamp, then by
/// load order; samples without a timestamp sort last. Within each group
/// the good samples are connected into a path in that order. Consecutive
/// good samples are connected even if poor samples or a physical gap lie
/// between them.
fn good_coverage_length_m(members: &[&JoinedSample<'_>], carriers: &[CarrierId]) -> f64 {
    let mut by_highway: BTreeMap<Option<&str>, Vec<&JoinedSample<'_>>> = BTreeMap::new();
    for pair in members {
        by_highway
            .entry(pair.sample.highway.as_deref())
            .or_default()
            .push(pair);
    }

    by_highway
        .into_values()
        .map(|mut segment| {
            segment.sort_by(|a, b| {
                let (a, b) = (a.sample, b.sample);
                a.timestamp
                    .is_none()
                    .cmp(&b.timestamp.is_none())
                    .then_with(|| a.timestamp.cmp(&b.timestamp))
                    .then_with(|| a.index.cmp(&b.index))
            });

            let path: Vec<Point<f64>> = segment
                .iter()
                .filter(|pair| pair.sample.any_carrier_good(carriers))
                .map(|pair| pair.position)
                .collect();

            if path.len() < 2 {
                return 0.0;
            }
            Euclidean.length(&LineString::from(path))
        })
        .sum()
}

#[allow(clippy::cast_precision_loss)]
fn percent(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

/// Renders the multi-line popup text for a region.
fn describe(summary: &RegionCoverageSummary) -> String {
    let mut lines = vec![summary.region.clone()];

    if summary.has_data() {
        lines.push(format!("Samples: {}", summary.sample_count));
    } else {
        lines.push("No data".to_string());
    }

    lines.extend(
        summary
            .carriers
            .iter()
            .map(|c| format!("{}: {:.1} % good", c.carrier, c.good_percent)),
    );

    if let Some(best) = &summary.best_carrier {
        lines.push(format!(
            "Best carrier: {} ({:.1} %)",
            best.carrier, best.good_percent
        ));
    }

    lines.push(format!("Any carrier good: {:.1} %", summary.any_good_percent));
    lines.push(format!("Good coverage: {:.2} km", summary.good_coverage_km));

    lines.join("\n")
}
