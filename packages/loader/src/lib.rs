#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! `GeoJSON` loading of signal samples and region boundaries.
//!
//! Reads point files (one per highway, each feature carrying per-carrier
//! readings) and polygon files (administrative regions) into owned
//! in-memory collections. Loading never aborts the batch: missing files
//! and malformed records are skipped and reported as [`LoadWarning`]s so
//! the dashboard can show what was left out.

pub mod parsing;
pub mod progress;
pub mod regions;
pub mod samples;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use signal_map_geography_models::RegionLayer;
use signal_map_signal_models::{CarrierId, Sample};
use thiserror::Error;

use crate::progress::ProgressCallback;

/// Errors that can occur while reading a single file.
#[derive(Debug, Error)]
pub enum LoadError {
    /// File could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File is not valid `GeoJSON`.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] Box<geojson::Error>),

    /// File is valid `GeoJSON` but not a `FeatureCollection`.
    #[error("expected a FeatureCollection")]
    NotFeatureCollection,
}

impl From<geojson::Error> for LoadError {
    fn from(value: geojson::Error) -> Self {
        Self::GeoJson(Box::new(value))
    }
}

/// A recoverable problem encountered while loading.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadWarning {
    /// A referenced sample or region file does not exist.
    #[error("missing data file {}", path.display())]
    MissingDataFile {
        /// The referenced path.
        path: PathBuf,
    },

    /// A file exists but could not be parsed.
    #[error("skipped unreadable file {}: {message}", path.display())]
    UnreadableFile {
        /// The file path.
        path: PathBuf,
        /// Parser or I/O error text.
        message: String,
    },

    /// A feature lacks required coordinate or reading fields.
    #[error("skipped feature {feature} in {}: {reason}", path.display())]
    MalformedRecord {
        /// The file path.
        path: PathBuf,
        /// Zero-based feature position in the file.
        feature: usize,
        /// What was wrong with it.
        reason: String,
    },
}

/// Where to read one highway's samples from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleSource {
    /// Path to a `GeoJSON` point `FeatureCollection`.
    pub path: PathBuf,
    /// Highway identifier; defaults to the file stem.
    pub highway: Option<String>,
}

impl SampleSource {
    /// A source whose highway id is derived from the file name.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            highway: None,
        }
    }

    /// The explicit highway id, or the file stem.
    #[must_use]
    pub fn highway_id(&self) -> Option<String> {
        self.highway.clone().or_else(|| {
            self.path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
        })
    }
}

/// Maps a carrier to the feature property holding its reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarrierColumn {
    /// Carrier identifier.
    pub carrier: CarrierId,
    /// Property name, e.g. `"T-Mobile LTE - RSRP"`.
    pub property: String,
}

/// Everything needed to load a dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetRequest {
    /// Sample files, one per highway.
    pub samples: Vec<SampleSource>,
    /// Region polygon files.
    pub regions: Vec<PathBuf>,
    /// Carrier reading columns, in configured order.
    pub carriers: Vec<CarrierColumn>,
    /// Property holding region names.
    pub name_attribute: String,
}

/// A complete snapshot of loaded data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    /// All samples, in load order (`Sample::index` matches the position).
    pub samples: Vec<Sample>,
    /// Region layer.
    pub regions: RegionLayer,
    /// Problems encountered while loading.
    pub warnings: Vec<LoadWarning>,
}

/// Loads every sample and region file in `request`.
///
/// Never fails as a whole; unreadable inputs become warnings.
#[must_use]
pub fn load_dataset(request: &DatasetRequest, progress: &Arc<dyn ProgressCallback>) -> Dataset {
    let total = request.samples.len() + request.regions.len();
    progress.set_total(total as u64);

    let (samples, mut warnings) =
        samples::load_samples(&request.samples, &request.carriers, progress);
    let (regions, region_warnings) =
        regions::load_regions(&request.regions, &request.name_attribute, progress);
    warnings.extend(region_warnings);

    progress.finish(format!(
        "Loaded {} samples and {} regions ({} warnings)",
        samples.len(),
        regions.regions.len(),
        warnings.len()
    ));

    Dataset {
        samples,
        regions,
        warnings,
    }
}

/// Lists every `*.geojson` / `*.json` file in `dir` as a sample source,
/// sorted by file name.
///
/// # Errors
///
/// Returns [`LoadError::Io`] if the directory cannot be read.
pub fn discover_sample_files(dir: &Path) -> Result<Vec<SampleSource>, LoadError> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| {
                        ext.eq_ignore_ascii_case("geojson") || ext.eq_ignore_ascii_case("json")
                    })
        })
        .collect();
    paths.sort();

    log::debug!("Discovered {} sample files in {}", paths.len(), dir.display());

    Ok(paths.into_iter().map(SampleSource::new).collect())
}

/// Reads a `GeoJSON` `FeatureCollection` from disk.
///
/// A missing file is reported as a [`LoadWarning::MissingDataFile`]; any
/// other failure as [`LoadWarning::UnreadableFile`].
pub(crate) fn read_feature_collection(
    path: &Path,
) -> Result<geojson::FeatureCollection, LoadWarning> {
    if !path.exists() {
        log::warn!("Missing data file {}, skipping", path.display());
        return Err(LoadWarning::MissingDataFile {
            path: path.to_path_buf(),
        });
    }

    parse_feature_collection(path).map_err(|e| {
        log::warn!("Failed to read {}: {e}", path.display());
        LoadWarning::UnreadableFile {
            path: path.to_path_buf(),
            message: e.to_string(),
        }
    })
}

fn parse_feature_collection(path: &Path) -> Result<geojson::FeatureCollection, LoadError> {
    let text = std::fs::read_to_string(path)?;
    match text.parse::<geojson::GeoJson>()? {
        geojson::GeoJson::FeatureCollection(collection) => Ok(collection),
        _ => Err(LoadError::NotFeatureCollection),
    }
}

/// Display name for a path in progress messages.
pub(crate) fn file_label(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::PathBuf;

    /// A fresh scratch directory under the system temp dir.
    pub fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("signal_map_loader_{name}"));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::null_progress;
    use crate::test_support::scratch_dir;
    use std::fs;

    #[test]
    fn highway_id_defaults_to_file_stem() {
        let source = SampleSource::new("data/d1.geojson");
        assert_eq!(source.highway_id().as_deref(), Some("d1"));

        let explicit = SampleSource {
            path: PathBuf::from("data/pokryti.geojson"),
            highway: Some("D10".to_string()),
        };
        assert_eq!(explicit.highway_id().as_deref(), Some("D10"));
    }

    #[test]
    fn discovers_geojson_files_sorted() {
        let dir = scratch_dir("discover");
        fs::write(dir.join("d2.geojson"), "{}").unwrap();
        fs::write(dir.join("d1.geojson"), "{}").unwrap();
        fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let sources = discover_sample_files(&dir).unwrap();
        let stems: Vec<String> = sources.iter().filter_map(SampleSource::highway_id).collect();
        assert_eq!(stems, vec!["d1".to_string(), "d2".to_string()]);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn rejects_non_collection_geojson() {
        let dir = scratch_dir("not_collection");
        let path = dir.join("point.geojson");
        fs::write(&path, r#"{"type":"Point","coordinates":[14.0,50.0]}"#).unwrap();

        let err = read_feature_collection(&path).unwrap_err();
        assert!(matches!(err, LoadWarning::UnreadableFile { .. }));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn dataset_load_survives_missing_files() {
        let dir = scratch_dir("dataset_missing");
        let request = DatasetRequest {
            samples: vec![SampleSource::new(dir.join("absent.geojson"))],
            regions: vec![dir.join("absent_regions.geojson")],
            carriers: vec![CarrierColumn {
                carrier: CarrierId::from("O2 LTE"),
                property: "O2 LTE - RSRP".to_string(),
            }],
            name_attribute: "name".to_string(),
        };

        let dataset = load_dataset(&request, &null_progress());
        assert!(dataset.samples.is_empty());
        assert!(dataset.regions.regions.is_empty());
        assert_eq!(dataset.warnings.len(), 2);
        assert!(
            dataset
                .warnings
                .iter()
                .all(|w| matches!(w, LoadWarning::MissingDataFile { .. }))
        );

        let _ = fs::remove_dir_all(&dir);
    }
}
