//! Content fingerprints for aggregation inputs.
//!
//! A [`Fingerprint`] is a SHA-256 digest over everything aggregation
//! reads: sample positions, readings, timestamps and highway ids, region
//! names and polygon coordinates, and the carrier list. Two datasets with
//! the same content share a fingerprint regardless of where they live in
//! memory; any change to a reading or a vertex produces a new one.

use geo::{LineString, Polygon};
use sha2::{Digest, Sha256};
use signal_map_geography_models::RegionLayer;
use signal_map_signal_models::{CarrierId, Sample};

/// Hex-encoded SHA-256 digest of aggregation inputs.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Computes the fingerprint of a sample set, region layer, and
    /// carrier list.
    #[must_use]
    pub fn of(samples: &[Sample], layer: &RegionLayer, carriers: &[CarrierId]) -> Self {
        let mut hasher = FingerprintHasher::default();

        hasher.tag("samples");
        hasher.usize(samples.len());
        for sample in samples {
            hasher.f64(sample.longitude);
            hasher.f64(sample.latitude);
            hasher.usize(sample.readings.len());
            for (carrier, reading) in &sample.readings {
                hasher.str(carrier.as_str());
                hasher.f64(*reading);
            }
            hasher.opt_str(sample.timestamp.map(|ts| ts.to_string()).as_deref());
            hasher.opt_str(sample.highway.as_deref());
        }

        hasher.tag("regions");
        hasher.str(&layer.name_attribute);
        hasher.usize(layer.features_seen);
        hasher.usize(layer.regions.len());
        for region in &layer.regions {
            hasher.str(&region.name);
            hasher.usize(region.boundary.0.len());
            for polygon in &region.boundary.0 {
                hasher.polygon(polygon);
            }
        }

        hasher.tag("carriers");
        hasher.usize(carriers.len());
        for carrier in carriers {
            hasher.str(carrier.as_str());
        }

        Self(hex::encode(hasher.inner.finalize()))
    }

    /// The hex digest.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Length-prefixed feeding of values into SHA-256, so that adjacent
/// fields cannot run into each other.
#[derive(Default)]
struct FingerprintHasher {
    inner: Sha256,
}

impl FingerprintHasher {
    fn tag(&mut self, tag: &str) {
        self.str(tag);
    }

    fn usize(&mut self, value: usize) {
        self.inner.update((value as u64).to_le_bytes());
    }

    fn f64(&mut self, value: f64) {
        self.inner.update(value.to_bits().to_le_bytes());
    }

    fn str(&mut self, value: &str) {
        self.usize(value.len());
        self.inner.update(value.as_bytes());
    }

    fn opt_str(&mut self, value: Option<&str>) {
        match value {
            Some(s) => {
                self.inner.update([1u8]);
                self.str(s);
            }
            None => self.inner.update([0u8]),
        }
    }

    fn polygon(&mut self, polygon: &Polygon<f64>) {
        self.ring(polygon.exterior());
        self.usize(polygon.interiors().len());
        for ring in polygon.interiors() {
            self.ring(ring);
        }
    }

    fn ring(&mut self, ring: &LineString<f64>) {
        self.usize(ring.0.len());
        for coord in &ring.0 {
            self.f64(coord.x);
            self.f64(coord.y);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{MultiPolygon, polygon};
    use signal_map_geography_models::Region;
    use std::collections::BTreeMap;

    fn samples() -> Vec<Sample> {
        vec![Sample {
            index: 0,
            latitude: 49.5,
            longitude: 14.5,
            readings: BTreeMap::from([(CarrierId::from("X"), -72.0)]),
            timestamp: None,
            time_label: Some("2024-05-13 10:22:31".to_string()),
            highway: Some("D1".to_string()),
            source: "d1.geojson".to_string(),
        }]
    }

    fn layer() -> RegionLayer {
        RegionLayer {
            name_attribute: "name".to_string(),
            regions: vec![Region {
                name: "Vysocina".to_string(),
                boundary: MultiPolygon(vec![polygon![
                    (x: 14.0, y: 49.0),
                    (x: 15.0, y: 49.0),
                    (x: 15.0, y: 50.0),
                    (x: 14.0, y: 49.0),
                ]]),
                source: "kraje.geojson".to_string(),
            }],
            features_seen: 1,
        }
    }

    fn carriers() -> Vec<CarrierId> {
        vec![CarrierId::from("X")]
    }

    #[test]
    fn identical_content_has_identical_fingerprint() {
        let a = Fingerprint::of(&samples(), &layer(), &carriers());
        let b = Fingerprint::of(&samples(), &layer(), &carriers());
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 64);
    }

    #[test]
    fn reading_change_changes_fingerprint() {
        let base = Fingerprint::of(&samples(), &layer(), &carriers());
        let mut changed = samples();
        changed[0].readings.insert(CarrierId::from("X"), -71.0);
        assert_ne!(base, Fingerprint::of(&changed, &layer(), &carriers()));
    }

    #[test]
    fn vertex_change_changes_fingerprint() {
        let base = Fingerprint::of(&samples(), &layer(), &carriers());
        let mut changed = layer();
        changed.regions[0].boundary = MultiPolygon(vec![polygon![
            (x: 14.0, y: 49.0),
            (x: 15.0, y: 49.0),
            (x: 15.0, y: 50.5),
            (x: 14.0, y: 49.0),
        ]]);
        assert_ne!(base, Fingerprint::of(&samples(), &changed, &carriers()));
    }

    #[test]
    fn carrier_list_is_part_of_the_key() {
        let base = Fingerprint::of(&samples(), &layer(), &carriers());
        let more = vec![CarrierId::from("X"), CarrierId::from("Y")];
        assert_ne!(base, Fingerprint::of(&samples(), &layer(), &more));
    }

    #[test]
    fn labels_do_not_affect_fingerprint() {
        let base = Fingerprint::of(&samples(), &layer(), &carriers());
        let mut relabeled = samples();
        relabeled[0].source = "renamed.geojson".to_string();
        relabeled[0].time_label = None;
        assert_eq!(base, Fingerprint::of(&relabeled, &layer(), &carriers()));
    }
}
