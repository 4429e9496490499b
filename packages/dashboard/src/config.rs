//! Dashboard configuration.
//!
//! The built-in configuration is embedded at compile time from
//! `config/default.toml`. A user file replaces it entirely; relative
//! dataset paths in a user file resolve against that file's directory.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use signal_map_geography_models::DEFAULT_NAME_ATTRIBUTE;
use signal_map_loader::{
    CarrierColumn, DatasetRequest, LoadError, LoadWarning, SampleSource, discover_sample_files,
};
use signal_map_signal_models::{CarrierId, QualityRange, QualityTier, Stride};
use thiserror::Error;

/// Embedded default configuration.
const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

/// Errors that can occur while loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// The config file path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The config file is not valid TOML or does not match the schema.
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// No carriers are configured.
    #[error("at least one carrier must be configured")]
    NoCarriers,

    /// Two carriers share an id.
    #[error("duplicate carrier id '{0}'")]
    DuplicateCarrier(CarrierId),

    /// No precision options are configured.
    #[error("at least one precision option must be configured")]
    NoPrecisionOptions,

    /// A quality tier's filter range contains nothing.
    #[error("quality tier '{tier}' has an empty range [{min}, {max})")]
    EmptyQualityRange {
        /// The offending tier.
        tier: QualityTier,
        /// Configured lower bound.
        min: f64,
        /// Configured upper bound.
        max: f64,
    },
}

/// Complete dashboard configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Carriers in tie-break order.
    pub carriers: Vec<CarrierConfig>,
    /// Per-tier filter ranges and colors.
    #[serde(default)]
    pub quality: QualityConfig,
    /// Selectable down-sampling strides.
    #[serde(default = "default_precision")]
    pub precision: Vec<PrecisionOption>,
    /// Initial map view.
    #[serde(default)]
    pub map: MapConfig,
    /// Marker geometry and opacity.
    #[serde(default)]
    pub markers: MarkerStyle,
    /// Region name attribute and overlay style.
    #[serde(default)]
    pub regions: RegionStyle,
    /// Input files.
    #[serde(default)]
    pub dataset: DatasetConfig,
    /// Directory that relative dataset paths resolve against.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

/// A carrier and the feature property holding its readings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarrierConfig {
    /// Display id, e.g. `"T-Mobile LTE"`.
    pub id: CarrierId,
    /// Property name, e.g. `"T-Mobile LTE - RSRP"`.
    pub property: String,
}

/// Filter range and marker color for one tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierConfig {
    /// Inclusive lower bound (dBm).
    pub min: f64,
    /// Exclusive upper bound (dBm).
    pub max: f64,
    /// Marker color.
    pub color: String,
}

impl TierConfig {
    fn for_tier(tier: QualityTier) -> Self {
        let range = tier.default_range();
        Self {
            min: range.min,
            max: range.max,
            color: tier.default_color().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityConfig {
    #[serde(default = "QualityConfig::default_good")]
    pub good: TierConfig,
    #[serde(default = "QualityConfig::default_medium")]
    pub medium: TierConfig,
    #[serde(default = "QualityConfig::default_poor")]
    pub poor: TierConfig,
}

impl QualityConfig {
    fn default_good() -> TierConfig {
        TierConfig::for_tier(QualityTier::Good)
    }

    fn default_medium() -> TierConfig {
        TierConfig::for_tier(QualityTier::Medium)
    }

    fn default_poor() -> TierConfig {
        TierConfig::for_tier(QualityTier::Poor)
    }

    #[must_use]
    pub const fn tier(&self, tier: QualityTier) -> &TierConfig {
        match tier {
            QualityTier::Good => &self.good,
            QualityTier::Medium => &self.medium,
            QualityTier::Poor => &self.poor,
        }
    }

    /// The half-open filter range for `tier`.
    #[must_use]
    pub const fn range(&self, tier: QualityTier) -> QualityRange {
        let config = self.tier(tier);
        QualityRange::new(config.min, config.max)
    }

    #[must_use]
    pub fn color(&self, tier: QualityTier) -> &str {
        &self.tier(tier).color
    }
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            good: Self::default_good(),
            medium: Self::default_medium(),
            poor: Self::default_poor(),
        }
    }
}

/// A selectable precision level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrecisionOption {
    /// Menu label.
    pub label: String,
    /// Keep every `stride`-th point. Zero is rejected while parsing.
    pub stride: Stride,
}

fn default_precision() -> Vec<PrecisionOption> {
    [
        (1, "Maximum precision (every point)"),
        (10, "Higher precision (every 10th point)"),
        (20, "Lower precision (every 20th point)"),
    ]
    .into_iter()
    .filter_map(|(stride, label)| {
        Stride::new(stride).ok().map(|stride| PrecisionOption {
            label: label.to_string(),
            stride,
        })
    })
    .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub zoom_start: u8,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self { zoom_start: 10 }
    }
}

/// Each marker is a translucent signal-radius circle plus a small point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerStyle {
    /// Signal-radius circle, in meters.
    pub circle_radius_m: f64,
    /// Fill opacity of the circle.
    pub circle_opacity: f64,
    /// Point radius, in pixels.
    pub point_radius_px: u32,
    /// Fill opacity of the point.
    pub point_opacity: f64,
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            circle_radius_m: 150.0,
            circle_opacity: 0.15,
            point_radius_px: 5,
            point_opacity: 0.7,
        }
    }
}

/// Region layer naming and overlay style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionStyle {
    /// Property holding each region's display name.
    pub name_attribute: String,
    pub fill_color: String,
    pub border_color: String,
    pub weight: f64,
    pub fill_opacity: f64,
    pub highlight_fill_color: String,
    pub highlight_weight: f64,
    pub highlight_fill_opacity: f64,
}

impl RegionStyle {
    /// Style of a region polygon at rest.
    #[must_use]
    pub fn polygon_style(&self) -> PolygonStyle {
        PolygonStyle {
            fill_color: self.fill_color.clone(),
            color: self.border_color.clone(),
            weight: self.weight,
            fill_opacity: self.fill_opacity,
        }
    }

    /// Style of a region polygon under the cursor.
    #[must_use]
    pub fn highlight_style(&self) -> PolygonStyle {
        PolygonStyle {
            fill_color: self.highlight_fill_color.clone(),
            color: self.border_color.clone(),
            weight: self.highlight_weight,
            fill_opacity: self.highlight_fill_opacity,
        }
    }
}

impl Default for RegionStyle {
    fn default() -> Self {
        Self {
            name_attribute: DEFAULT_NAME_ATTRIBUTE.to_string(),
            fill_color: "lightblue".to_string(),
            border_color: "black".to_string(),
            weight: 1.0,
            fill_opacity: 0.5,
            highlight_fill_color: "#00F0F0".to_string(),
            highlight_weight: 3.0,
            highlight_fill_opacity: 0.7,
        }
    }
}

/// Leaflet-style path options for a rendered polygon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolygonStyle {
    pub fill_color: String,
    /// Border color.
    pub color: String,
    pub weight: f64,
    pub fill_opacity: f64,
}

/// Input files. Relative paths resolve against the config directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Explicitly listed sample files.
    pub samples: Vec<SampleFileConfig>,
    /// Directory whose `*.geojson` files are all loaded as samples.
    pub samples_dir: Option<PathBuf>,
    /// Region polygon files.
    pub regions: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleFileConfig {
    pub path: PathBuf,
    /// Highway id; defaults to the file stem.
    #[serde(default)]
    pub highway: Option<String>,
}

impl DashboardConfig {
    /// Returns the embedded default configuration.
    ///
    /// # Panics
    ///
    /// Panics if the embedded TOML fails to parse or validate. Since it is
    /// a compile-time constant, a failure indicates a development error and
    /// is caught by the tests.
    #[must_use]
    pub fn embedded() -> Self {
        Self::from_toml_str(DEFAULT_CONFIG, PathBuf::new())
            .unwrap_or_else(|e| panic!("Failed to parse embedded dashboard config: {e}"))
    }

    /// Parses and validates a configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML (including a zero
    /// precision stride) or any validation error.
    pub fn from_toml_str(text: &str, base_dir: PathBuf) -> Result<Self, ConfigError> {
        let mut config: Self = toml::de::from_str(text)?;
        config.base_dir = base_dir;
        config.validate()?;
        Ok(config)
    }

    /// Reads a configuration file. Relative dataset paths resolve against
    /// the file's directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or any error
    /// from [`Self::from_toml_str`].
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();

        let config = Self::from_toml_str(&text, base_dir)?;
        log::info!(
            "Loaded config {} ({} carriers, {} precision options)",
            path.display(),
            config.carriers.len(),
            config.precision.len()
        );
        Ok(config)
    }

    /// Checks the invariants serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns the first violated rule.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.carriers.is_empty() {
            return Err(ConfigError::NoCarriers);
        }

        let mut seen = BTreeSet::new();
        for carrier in &self.carriers {
            if !seen.insert(&carrier.id) {
                return Err(ConfigError::DuplicateCarrier(carrier.id.clone()));
            }
        }

        if self.precision.is_empty() {
            return Err(ConfigError::NoPrecisionOptions);
        }

        for &tier in QualityTier::ALL {
            let range = self.quality.range(tier);
            // Also rejects NaN bounds.
            if range.min.partial_cmp(&range.max) != Some(Ordering::Less) {
                return Err(ConfigError::EmptyQualityRange {
                    tier,
                    min: range.min,
                    max: range.max,
                });
            }
        }

        Ok(())
    }

    /// Carrier ids in configured order.
    #[must_use]
    pub fn carrier_ids(&self) -> Vec<CarrierId> {
        self.carriers.iter().map(|c| c.id.clone()).collect()
    }

    #[must_use]
    pub fn carrier(&self, id: &CarrierId) -> Option<&CarrierConfig> {
        self.carriers.iter().find(|c| &c.id == id)
    }

    /// The precision option offering `stride`.
    #[must_use]
    pub fn precision_for(&self, stride: Stride) -> Option<&PrecisionOption> {
        self.precision.iter().find(|p| p.stride == stride)
    }

    /// Resolves a dataset path against [`Self::base_dir`].
    #[must_use]
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// Builds the loader request for the configured dataset.
    ///
    /// Explicit sample files come first, followed by files discovered in
    /// `samples_dir` that are not already listed. A missing or unreadable
    /// `samples_dir` becomes a warning rather than an error.
    #[must_use]
    pub fn dataset_request(&self) -> (DatasetRequest, Vec<LoadWarning>) {
        let mut warnings = Vec::new();

        let mut samples: Vec<SampleSource> = self
            .dataset
            .samples
            .iter()
            .map(|file| SampleSource {
                path: self.resolve(&file.path),
                highway: file.highway.clone(),
            })
            .collect();

        if let Some(dir) = &self.dataset.samples_dir {
            let dir = self.resolve(dir);
            if dir.is_dir() {
                match discover_sample_files(&dir) {
                    Ok(found) => {
                        for source in found {
                            if !samples.iter().any(|s| s.path == source.path) {
                                samples.push(source);
                            }
                        }
                    }
                    Err(e) => warnings.push(unreadable_dir(&dir, &e)),
                }
            } else {
                log::warn!("Sample directory {} does not exist", dir.display());
                warnings.push(LoadWarning::MissingDataFile { path: dir });
            }
        }

        let request = DatasetRequest {
            samples,
            regions: self
                .dataset
                .regions
                .iter()
                .map(|path| self.resolve(path))
                .collect(),
            carriers: self
                .carriers
                .iter()
                .map(|c| CarrierColumn {
                    carrier: c.id.clone(),
                    property: c.property.clone(),
                })
                .collect(),
            name_attribute: self.regions.name_attribute.clone(),
        };

        (request, warnings)
    }
}

fn unreadable_dir(dir: &Path, error: &LoadError) -> LoadWarning {
    log::warn!("Failed to list {}: {error}", dir.display());
    LoadWarning::UnreadableFile {
        path: dir.to_path_buf(),
        message: error.to_string(),
    }
}
