//! Reads administrative region polygons from `GeoJSON` files.
//!
//! Every `Polygon`/`MultiPolygon` feature counts toward
//! [`RegionLayer::features_seen`]; only features carrying a non-empty
//! name attribute become regions. Features that share a name are merged
//! into one multi-polygon so region names stay unique.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use geo::MultiPolygon;
use signal_map_geography_models::{Region, RegionLayer};

use crate::parsing::property_text;
use crate::progress::ProgressCallback;
use crate::{LoadWarning, file_label, read_feature_collection};

/// Loads all region files into a single layer.
#[must_use]
pub fn load_regions(
    paths: &[PathBuf],
    name_attribute: &str,
    progress: &Arc<dyn ProgressCallback>,
) -> (RegionLayer, Vec<LoadWarning>) {
    let mut layer = RegionLayer {
        name_attribute: name_attribute.to_string(),
        ..RegionLayer::default()
    };
    let mut warnings = Vec::new();
    let mut unnamed = 0usize;

    for path in paths {
        progress.set_message(format!("Reading regions from {}", file_label(path)));

        match read_feature_collection(path) {
            Ok(collection) => {
                for (feature_idx, feature) in collection.features.iter().enumerate() {
                    match polygon_from_feature(feature) {
                        Ok(boundary) => {
                            layer.features_seen += 1;
                            let name = feature.property(name_attribute).and_then(property_text);
                            if let Some(name) = name {
                                add_region(&mut layer, name, boundary, path);
                            } else {
                                unnamed += 1;
                            }
                        }
                        Err(reason) => {
                            log::warn!(
                                "{}: skipping region feature {feature_idx}: {reason}",
                                path.display()
                            );
                            warnings.push(LoadWarning::MalformedRecord {
                                path: path.clone(),
                                feature: feature_idx,
                                reason,
                            });
                        }
                    }
                }
            }
            Err(warning) => warnings.push(warning),
        }

        progress.inc(1);
    }

    if unnamed > 0 {
        log::warn!("{unnamed} region features have no '{name_attribute}' attribute");
    }
    log::info!(
        "Loaded {} regions from {} polygon features",
        layer.regions.len(),
        layer.features_seen
    );

    (layer, warnings)
}

fn add_region(layer: &mut RegionLayer, name: String, boundary: MultiPolygon<f64>, path: &Path) {
    if let Some(existing) = layer.regions.iter_mut().find(|r| r.name == name) {
        log::debug!("Merging duplicate region '{name}' from {}", path.display());
        existing.boundary.0.extend(boundary.0);
        return;
    }

    layer.regions.push(Region {
        name,
        boundary,
        source: file_label(path),
    });
}

/// Converts a feature's geometry into a [`MultiPolygon`].
/// Handles both `Polygon` and `MultiPolygon` geometry types.
fn polygon_from_feature(feature: &geojson::Feature) -> Result<MultiPolygon<f64>, String> {
    let geometry = feature
        .geometry
        .clone()
        .ok_or_else(|| "missing geometry".to_string())?;

    let geo_geom: geo::Geometry<f64> = geometry
        .try_into()
        .map_err(|e: geojson::Error| format!("invalid geometry: {e}"))?;

    match geo_geom {
        geo::Geometry::MultiPolygon(mp) => Ok(mp),
        geo::Geometry::Polygon(p) => Ok(MultiPolygon(vec![p])),
        _ => Err("expected Polygon or MultiPolygon geometry".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::null_progress;
    use crate::test_support::scratch_dir;
    use std::fs;

    const KRAJE: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "geometry": {"type": "Polygon", "coordinates": [[[14,49],[15,49],[15,50],[14,50],[14,49]]]},
                "properties": {"name": "Vysocina"}
            },
            {
                "type": "Feature",
                "geometry": {"type": "MultiPolygon", "coordinates": [[[[16,49],[17,49],[17,50],[16,50],[16,49]]]]},
                "properties": {"name": "Jihomoravsky"}
            },
            {
                "type": "Feature",
                "geometry": {"type": "Polygon", "coordinates": [[[15,48],[16,48],[16,49],[15,49],[15,48]]]},
                "properties": {"name": "Vysocina"}
            },
            {
                "type": "Feature",
                "geometry": {"type": "Polygon", "coordinates": [[[18,49],[19,49],[19,50],[18,50],[18,49]]]},
                "properties": {"NAZEV": "Zlinsky"}
            },
            {
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [14.0, 50.0]},
                "properties": {"name": "Not a region"}
            }
        ]
    }"#;

    #[test]
    fn loads_named_polygons_and_merges_duplicates() {
        let dir = scratch_dir("regions_mixed");
        let path = dir.join("kraje.geojson");
        fs::write(&path, KRAJE).unwrap();

        let (layer, warnings) = load_regions(&[path], "name", &null_progress());

        let names: Vec<&str> = layer.regions.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Vysocina", "Jihomoravsky"]);
        assert_eq!(layer.get("Vysocina").unwrap().boundary.0.len(), 2);
        assert_eq!(layer.features_seen, 4);
        assert_eq!(warnings.len(), 1);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn wrong_name_attribute_yields_no_regions() {
        let dir = scratch_dir("regions_attribute");
        let path = dir.join("kraje.geojson");
        fs::write(&path, KRAJE).unwrap();

        let (layer, _) = load_regions(&[path], "nazev_kraje", &null_progress());

        assert!(layer.regions.is_empty());
        assert_eq!(layer.features_seen, 4);
        assert_eq!(layer.name_attribute, "nazev_kraje");

        let _ = fs::remove_dir_all(&dir);
    }
}
