//! Reads signal samples from `GeoJSON` point files.
//!
//! Each feature must be a `Point` with at least one configured carrier
//! reading. The highway id comes from the feature's `highway` property
//! when present, otherwise from the [`SampleSource`].

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use signal_map_signal_models::Sample;

use crate::parsing::{parse_reading, parse_timestamp, property_text};
use crate::progress::ProgressCallback;
use crate::{CarrierColumn, LoadWarning, SampleSource, file_label, read_feature_collection};

/// Feature property holding the measurement time.
pub const TIME_PROPERTY: &str = "time";

/// Feature property that overrides the file-level highway id.
pub const HIGHWAY_PROPERTY: &str = "highway";

/// Loads all sample files in order. `Sample::index` is assigned across
/// files so it matches each sample's position in the returned vector.
#[must_use]
pub fn load_samples(
    sources: &[SampleSource],
    carriers: &[CarrierColumn],
    progress: &Arc<dyn ProgressCallback>,
) -> (Vec<Sample>, Vec<LoadWarning>) {
    let mut samples = Vec::new();
    let mut warnings = Vec::new();

    for source in sources {
        progress.set_message(format!("Reading samples from {}", file_label(&source.path)));

        match read_feature_collection(&source.path) {
            Ok(collection) => {
                let before = samples.len();
                read_samples(
                    &collection,
                    source,
                    carriers,
                    &mut samples,
                    &mut warnings,
                );
                log::info!(
                    "{}: loaded {} samples from {} features",
                    source.path.display(),
                    samples.len() - before,
                    collection.features.len()
                );
            }
            Err(warning) => warnings.push(warning),
        }

        progress.inc(1);
    }

    (samples, warnings)
}

fn read_samples(
    collection: &geojson::FeatureCollection,
    source: &SampleSource,
    carriers: &[CarrierColumn],
    samples: &mut Vec<Sample>,
    warnings: &mut Vec<LoadWarning>,
) {
    let file_highway = source.highway_id();
    let source_name = file_label(&source.path);

    for (feature_idx, feature) in collection.features.iter().enumerate() {
        match sample_from_feature(feature, carriers) {
            Ok(parsed) => {
                let index = samples.len();
                samples.push(Sample {
                    index,
                    latitude: parsed.latitude,
                    longitude: parsed.longitude,
                    readings: parsed.readings,
                    timestamp: parsed.time_label.as_deref().and_then(parse_timestamp),
                    time_label: parsed.time_label,
                    highway: parsed.highway.or_else(|| file_highway.clone()),
                    source: source_name.clone(),
                });
            }
            Err(reason) => {
                log::warn!(
                    "{}: skipping feature {feature_idx}: {reason}",
                    source.path.display()
                );
                warnings.push(malformed(&source.path, feature_idx, reason));
            }
        }
    }
}

/// Fields extracted from a single point feature.
struct ParsedSample {
    latitude: f64,
    longitude: f64,
    readings: BTreeMap<signal_map_signal_models::CarrierId, f64>,
    time_label: Option<String>,
    highway: Option<String>,
}

fn sample_from_feature(
    feature: &geojson::Feature,
    carriers: &[CarrierColumn],
) -> Result<ParsedSample, String> {
    let geometry = feature
        .geometry
        .as_ref()
        .ok_or_else(|| "missing geometry".to_string())?;

    let (longitude, latitude) = match &geometry.value {
        geojson::Value::Point(position) if position.len() >= 2 => (position[0], position[1]),
        geojson::Value::Point(_) => return Err("point has fewer than two coordinates".to_string()),
        other => return Err(format!("expected Point geometry, found {}", geometry_kind(other))),
    };

    if !longitude.is_finite() || !latitude.is_finite() {
        return Err("non-finite coordinates".to_string());
    }

    let readings: BTreeMap<_, _> = carriers
        .iter()
        .filter_map(|column| {
            feature
                .property(&column.property)
                .and_then(parse_reading)
                .map(|reading| (column.carrier.clone(), reading))
        })
        .collect();

    if readings.is_empty() {
        return Err("no carrier readings".to_string());
    }

    Ok(ParsedSample {
        latitude,
        longitude,
        readings,
        time_label: feature.property(TIME_PROPERTY).and_then(property_text),
        highway: feature.property(HIGHWAY_PROPERTY).and_then(property_text),
    })
}

const fn geometry_kind(value: &geojson::Value) -> &'static str {
    match value {
        geojson::Value::Point(_) => "Point",
        geojson::Value::MultiPoint(_) => "MultiPoint",
        geojson::Value::LineString(_) => "LineString",
        geojson::Value::MultiLineString(_) => "MultiLineString",
        geojson::Value::Polygon(_) => "Polygon",
        geojson::Value::MultiPolygon(_) => "MultiPolygon",
        geojson::Value::GeometryCollection(_) => "GeometryCollection",
    }
}

fn malformed(path: &Path, feature: usize, reason: String) -> LoadWarning {
    LoadWarning::MalformedRecord {
        path: path.to_path_buf(),
        feature,
        reason,
    }
}
