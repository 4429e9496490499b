//! Writes a rendered [`DashboardView`] to disk.
//!
//! Produces `markers.geojson` (one `Point` feature per marker),
//! `regions.geojson` (one feature per annotated region, only when the
//! overlay is available), and `summary.json` with the counts, notices, and
//! per-region statistics. Files are written to a `.tmp` sibling first and
//! renamed into place.

use std::path::{Path, PathBuf};

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use serde::Serialize;

use crate::DashboardError;
use crate::render::{AnnotatedRegion, DashboardView, Marker};

pub const MARKERS_FILE: &str = "markers.geojson";
pub const REGIONS_FILE: &str = "regions.geojson";
pub const SUMMARY_FILE: &str = "summary.json";

/// Paths written by [`export_view`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFiles {
    pub markers: PathBuf,
    /// `None` when region statistics were unavailable.
    pub regions: Option<PathBuf>,
    pub summary: PathBuf,
}

/// Writes `view` into `dir`, creating it if needed.
///
/// A `regions.geojson` left over from an earlier export is removed when
/// the view has no region overlay.
///
/// # Errors
///
/// Returns [`DashboardError::Io`] or [`DashboardError::Json`] if a file
/// cannot be serialized or written.
pub fn export_view(view: &DashboardView, dir: &Path) -> Result<ExportedFiles, DashboardError> {
    std::fs::create_dir_all(dir)?;

    let markers = dir.join(MARKERS_FILE);
    write_json(&markers, &markers_collection(view)?)?;

    let regions_path = dir.join(REGIONS_FILE);
    let regions = if let Some(regions) = &view.regions {
        write_json(&regions_path, &regions_collection(regions)?)?;
        Some(regions_path)
    } else {
        if regions_path.exists() {
            std::fs::remove_file(&regions_path)?;
        }
        None
    };

    let summaries: Option<Vec<_>> = view
        .regions
        .as_ref()
        .map(|regions| regions.iter().map(|r| &r.summary).collect());
    let summary = serde_json::json!({
        "selection": view.selection,
        "filteredCount": view.filtered_count,
        "displayedCount": view.displayed_count,
        "center": view.center,
        "zoom": view.zoom,
        "regions": summaries,
        "notices": view.notices,
    });
    let summary_path = dir.join(SUMMARY_FILE);
    write_json(&summary_path, &summary)?;

    log::info!(
        "Exported {} markers and {} regions to {}",
        view.markers.len(),
        view.regions.as_ref().map_or(0, Vec::len),
        dir.display()
    );

    Ok(ExportedFiles {
        markers,
        regions,
        summary: summary_path,
    })
}

/// One `Point` feature per marker. Properties carry the marker fields
/// plus the circle and point style.
///
/// # Errors
///
/// Returns [`DashboardError::Json`] if a marker cannot be serialized.
pub fn markers_collection(view: &DashboardView) -> Result<FeatureCollection, DashboardError> {
    let style = &view.marker_style;
    let features = view
        .markers
        .iter()
        .map(|marker| -> Result<Feature, DashboardError> {
            let mut properties = to_properties(marker)?;
            properties.insert("circleRadiusM".to_string(), style.circle_radius_m.into());
            properties.insert("circleOpacity".to_string(), style.circle_opacity.into());
            properties.insert("pointRadiusPx".to_string(), style.point_radius_px.into());
            properties.insert("pointOpacity".to_string(), style.point_opacity.into());
            Ok(feature(marker_geometry(marker), properties))
        })
        .collect::<Result<Vec<_>, DashboardError>>()?;

    Ok(collection(features))
}

/// One feature per annotated region with its boundary as geometry.
///
/// # Errors
///
/// Returns [`DashboardError::Json`] if a region cannot be serialized.
pub fn regions_collection(regions: &[AnnotatedRegion]) -> Result<FeatureCollection, DashboardError> {
    let features = regions
        .iter()
        .map(|region| -> Result<Feature, DashboardError> {
            let geometry = Geometry::new(Value::from(&region.boundary));
            Ok(feature(geometry, to_properties(region)?))
        })
        .collect::<Result<Vec<_>, DashboardError>>()?;

    Ok(collection(features))
}

fn marker_geometry(marker: &Marker) -> Geometry {
    Geometry::new(Value::Point(vec![marker.longitude, marker.latitude]))
}

fn to_properties<T: Serialize>(value: &T) -> Result<JsonObject, DashboardError> {
    match serde_json::to_value(value)? {
        serde_json::Value::Object(map) => Ok(map),
        other => {
            let mut map = JsonObject::new();
            map.insert("value".to_string(), other);
            Ok(map)
        }
    }
}

fn feature(geometry: Geometry, properties: JsonObject) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(geometry),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

fn collection(features: Vec<Feature>) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), DashboardError> {
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, serde_json::to_string_pretty(value)?)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Selection;
    use crate::config::{MarkerStyle, RegionStyle};
    use crate::render::{Notice, annotate_regions};
    use geo::{MultiPolygon, polygon};
    use signal_map_geography_models::{Region, RegionCoverageSummary, RegionLayer};
    use signal_map_signal_models::{CarrierId, QualityFilter, QualityTier, Stride};
    use std::fs;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("signal_map_dashboard_{name}"));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn view(with_regions: bool) -> DashboardView {
        let layer = RegionLayer {
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
        };
        let summary = RegionCoverageSummary {
            region: "Vysocina".to_string(),
            sample_count: 0,
            carriers: Vec::new(),
            best_carrier: None,
            any_good_count: 0,
            any_good_percent: 0.0,
            good_coverage_km: 0.0,
            summary: "Vysocina\nNo data".to_string(),
        };

        DashboardView {
            selection: Selection {
                carrier: CarrierId::from("O2 LTE"),
                quality: QualityFilter::Tier(QualityTier::Good),
                stride: Stride::ONE,
            },
            filtered_count: 1,
            displayed_count: 1,
            center: None,
            zoom: 10,
            marker_style: MarkerStyle::default(),
            markers: vec![Marker {
                sample_index: 3,
                latitude: 49.5,
                longitude: 14.5,
                carrier: CarrierId::from("O2 LTE"),
                reading: -65.0,
                tier: QualityTier::Good,
                color: "green".to_string(),
                label: "O2 LTE: -65 dBm<br>Time: N/A".to_string(),
            }],
            regions: with_regions
                .then(|| annotate_regions(&layer, &[summary], &RegionStyle::default())),
            notices: vec![Notice::warning("missing data file d9.geojson")],
        }
    }

    #[test]
    fn writes_markers_regions_and_summary() {
        let dir = scratch_dir("export_full");
        let files = export_view(&view(true), &dir).unwrap();

        let markers: geojson::GeoJson = fs::read_to_string(&files.markers).unwrap().parse().unwrap();
        let geojson::GeoJson::FeatureCollection(markers) = markers else {
            panic!("markers.geojson is not a FeatureCollection");
        };
        assert_eq!(markers.features.len(), 1);
        let marker = &markers.features[0];
        assert_eq!(
            marker.property("label").and_then(|v| v.as_str()),
            Some("O2 LTE: -65 dBm<br>Time: N/A")
        );
        assert_eq!(
            marker.property("circleRadiusM").and_then(serde_json::Value::as_f64),
            Some(150.0)
        );

        let regions: geojson::GeoJson = fs::read_to_string(files.regions.as_ref().unwrap())
            .unwrap()
            .parse()
            .unwrap();
        let geojson::GeoJson::FeatureCollection(regions) = regions else {
            panic!("regions.geojson is not a FeatureCollection");
        };
        assert_eq!(
            regions.features[0].property("popupHtml").and_then(|v| v.as_str()),
            Some("Vysocina<br>No data")
        );

        let summary: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&files.summary).unwrap()).unwrap();
        assert_eq!(summary["regions"][0]["region"], "Vysocina");
        assert_eq!(summary["selection"]["quality"], "good");
        assert_eq!(summary["notices"][0]["level"], "warning");

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn unavailable_overlay_removes_stale_regions_file() {
        let dir = scratch_dir("export_no_regions");
        export_view(&view(true), &dir).unwrap();
        assert!(dir.join(REGIONS_FILE).exists());

        let files = export_view(&view(false), &dir).unwrap();

        assert!(files.regions.is_none());
        assert!(!dir.join(REGIONS_FILE).exists());
        let summary: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&files.summary).unwrap()).unwrap();
        assert!(summary["regions"].is_null());

        let _ = fs::remove_dir_all(&dir);
    }
}
