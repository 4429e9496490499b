#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! In-memory spatial join of signal samples against region polygons.
//!
//! Region polygons are projected into a local planar system (see
//! [`projection`]) and loaded into an R-tree. Each sample is projected
//! the same way and matched against every region whose polygon strictly
//! contains it, so a sample may appear once per overlapping region, and
//! samples outside every region are dropped.

pub mod projection;

use geo::{BoundingRect, Contains, MultiPolygon, Point};
use rstar::{AABB, RTree, RTreeObject};
use signal_map_geography_models::{Region, RegionLayer, RegionStatsUnavailable};
use signal_map_signal_models::Sample;

pub use projection::Projection;

/// A projected region polygon stored in the R-tree.
struct BoundaryEntry {
    region: usize,
    envelope: AABB<[f64; 2]>,
    polygon: MultiPolygon<f64>,
}

impl RTreeObject for BoundaryEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// R-tree over the projected polygons of a region layer.
pub struct SpatialIndex {
    projection: Projection,
    boundaries: RTree<BoundaryEntry>,
}

impl SpatialIndex {
    /// Projects every region in `layer` and bulk-loads the R-tree.
    ///
    /// # Errors
    ///
    /// Returns [`RegionStatsUnavailable`] if the layer holds no regions,
    /// or if features were read but none carried the name attribute.
    pub fn build(layer: &RegionLayer) -> Result<Self, RegionStatsUnavailable> {
        check_layer(layer)?;

        let projection =
            Projection::for_regions(&layer.regions).ok_or(RegionStatsUnavailable::NoRegions)?;

        let entries: Vec<BoundaryEntry> = layer
            .regions
            .iter()
            .enumerate()
            .map(|(region, r)| {
                let polygon = projection.project_multi_polygon(&r.boundary);
                BoundaryEntry {
                    region,
                    envelope: compute_envelope(&polygon),
                    polygon,
                }
            })
            .collect();

        log::debug!("Loaded {} regions into spatial index", entries.len());

        Ok(Self {
            projection,
            boundaries: RTree::bulk_load(entries),
        })
    }

    /// The projection shared by the index and its lookups.
    #[must_use]
    pub const fn projection(&self) -> &Projection {
        &self.projection
    }

    /// Indices of all regions whose polygon strictly contains the
    /// projected `point`, in ascending order.
    #[must_use]
    pub fn lookup(&self, point: Point<f64>) -> Vec<usize> {
        let query_env = AABB::from_point([point.x(), point.y()]);

        let mut hits: Vec<usize> = self
            .boundaries
            .locate_in_envelope_intersecting(&query_env)
            .filter(|entry| entry.polygon.contains(&point))
            .map(|entry| entry.region)
            .collect();
        hits.sort_unstable();
        hits
    }
}

/// One `(sample, region)` pair produced by [`join`].
#[derive(Debug, Clone, Copy)]
pub struct JoinedSample<'a> {
    /// The matched sample.
    pub sample: &'a Sample,
    /// Index of the containing region in [`JoinResult::regions`].
    pub region: usize,
    /// Sample position in the projected plane (meters).
    pub position: Point<f64>,
}

/// Output of [`join`]: matched pairs plus the regions and projection
/// they refer to.
#[derive(Debug, Clone)]
pub struct JoinResult<'a> {
    /// Projection used for containment and length math.
    pub projection: Projection,
    /// All regions of the joined layer, including ones with no samples.
    pub regions: &'a [Region],
    /// Pairs ordered by sample, then region index.
    pub pairs: Vec<JoinedSample<'a>>,
}

impl<'a> JoinResult<'a> {
    /// Pairs belonging to the region at `region`.
    pub fn samples_in(&self, region: usize) -> impl Iterator<Item = &JoinedSample<'a>> {
        self.pairs.iter().filter(move |pair| pair.region == region)
    }
}

/// Inner-joins `samples` against the polygons of `layer`.
///
/// # Errors
///
/// Returns [`RegionStatsUnavailable`] instead of failing when the region
/// layer is empty or lacks the name attribute; callers render without
/// the region overlay in that case.
pub fn join<'a>(
    samples: &'a [Sample],
    layer: &'a RegionLayer,
) -> Result<JoinResult<'a>, RegionStatsUnavailable> {
    let index = SpatialIndex::build(layer)?;
    let projection = *index.projection();

    let mut pairs = Vec::new();
    for sample in samples {
        let position = projection.project_sample(sample);
        for region in index.lookup(position) {
            pairs.push(JoinedSample {
                sample,
                region,
                position,
            });
        }
    }

    log::info!(
        "Joined {} of {} samples against {} regions",
        pairs.len(),
        samples.len(),
        layer.regions.len()
    );

    Ok(JoinResult {
        projection,
        regions: &layer.regions,
        pairs,
    })
}

fn check_layer(layer: &RegionLayer) -> Result<(), RegionStatsUnavailable> {
    if !layer.regions.is_empty() {
        return Ok(());
    }
    if layer.features_seen > 0 {
        return Err(RegionStatsUnavailable::MissingNameAttribute {
            attribute: layer.name_attribute.clone(),
        });
    }
    Err(RegionStatsUnavailable::NoRegions)
}

/// Compute the bounding box envelope for a [`MultiPolygon`].
fn compute_envelope(mp: &MultiPolygon<f64>) -> AABB<[f64; 2]> {
    mp.bounding_rect().map_or_else(
        || AABB::from_point([0.0, 0.0]),
        |rect| AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;
    use signal_map_geography_models::DEFAULT_NAME_ATTRIBUTE;

    fn square(name: &str, min_x: f64, min_y: f64, size: f64) -> Region {
        Region {
            name: name.to_string(),
            boundary: MultiPolygon(vec![polygon![
                (x: min_x, y: min_y),
                (x: min_x + size, y: min_y),
                (x: min_x + size, y: min_y + size),
                (x: min_x, y: min_y + size),
                (x: min_x, y: min_y),
            ]]),
            source: "regions.geojson".to_string(),
        }
    }

    fn layer(regions: Vec<Region>) -> RegionLayer {
        RegionLayer {
            name_attribute: DEFAULT_NAME_ATTRIBUTE.to_string(),
            features_seen: regions.len(),
            regions,
        }
    }

    fn sample(index: usize, lon: f64, lat: f64) -> Sample {
        Sample {
            index,
            latitude: lat,
            longitude: lon,
            readings: std::collections::BTreeMap::new(),
            timestamp: None,
            time_label: None,
            highway: None,
            source: "samples.geojson".to_string(),
        }
    }

    #[test]
    fn join_with_zero_regions_is_unavailable() {
        let samples = vec![sample(0, 15.0, 50.0)];
        let empty = layer(Vec::new());
        let err = join(&samples, &empty).unwrap_err();
        assert_eq!(err, RegionStatsUnavailable::NoRegions);
    }

    #[test]
    fn join_without_name_attribute_is_unavailable() {
        let samples = vec![sample(0, 15.0, 50.0)];
        let unnamed = RegionLayer {
            name_attribute: "NAZEV".to_string(),
            regions: Vec::new(),
            features_seen: 14,
        };
        let err = join(&samples, &unnamed).unwrap_err();
        assert_eq!(
            err,
            RegionStatsUnavailable::MissingNameAttribute {
                attribute: "NAZEV".to_string()
            }
        );
    }

    #[test]
    fn drops_samples_outside_every_region() {
        let samples = vec![
            sample(0, 14.5, 49.5),
            sample(1, 20.0, 49.5),
            sample(2, 15.5, 49.5),
        ];
        let regions = layer(vec![square("A", 14.0, 49.0, 1.0), square("B", 15.0, 49.0, 1.0)]);

        let result = join(&samples, &regions).unwrap();
        let matched: Vec<(usize, usize)> = result
            .pairs
            .iter()
            .map(|p| (p.sample.index, p.region))
            .collect();
        assert_eq!(matched, vec![(0, 0), (2, 1)]);
    }

    #[test]
    fn sample_in_overlapping_regions_appears_once_per_region() {
        let samples = vec![sample(0, 14.75, 49.5)];
        let regions = layer(vec![square("A", 14.0, 49.0, 1.0), square("B", 14.5, 49.0, 1.0)]);

        let result = join(&samples, &regions).unwrap();
        assert_eq!(result.pairs.len(), 2);
        assert_eq!(result.samples_in(0).count(), 1);
        assert_eq!(result.samples_in(1).count(), 1);
    }

    #[test]
    fn boundary_points_are_not_strictly_within() {
        // The shared edge lies on the central meridian, which projects to
        // the straight line x = 0.
        let samples = vec![sample(0, 15.0, 49.5)];
        let regions = layer(vec![square("A", 14.0, 49.0, 1.0), square("B", 15.0, 49.0, 1.0)]);

        let result = join(&samples, &regions).unwrap();
        assert!(result.pairs.is_empty());
        assert_eq!(result.regions.len(), 2);
    }

    #[test]
    fn joined_positions_are_projected() {
        let samples = vec![sample(0, 14.5, 49.5)];
        let regions = layer(vec![square("A", 14.0, 49.0, 1.0)]);

        let result = join(&samples, &regions).unwrap();
        let position = result.pairs[0].position;
        // Region is centered on (14.5, 49.5), which is the projection origin.
        assert!(position.x().abs() < 1e-6);
        assert!(position.y().abs() < 1e-6);
    }
}
