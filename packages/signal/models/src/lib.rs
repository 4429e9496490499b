#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Signal sample, carrier, and quality tier types.
//!
//! Defines the canonical signal-quality taxonomy shared by the loader,
//! the regional aggregation, and the dashboard. Two boundary semantics
//! live side by side here and are intentionally not unified:
//!
//! - [`classify`] assigns a reading to the *higher* tier when it sits
//!   exactly on a threshold (`-70` is good, `-85` is medium).
//! - [`QualityRange::contains`] is half-open `[min, max)` and bounds the
//!   poor tier below at `-120`, so `0 dBm` is classified good but not
//!   inside the good range.

use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use thiserror::Error;

/// Readings at or above this value (dBm) classify as [`QualityTier::Good`].
pub const GOOD_THRESHOLD_DBM: f64 = -70.0;

/// Readings at or above this value (dBm) and below
/// [`GOOD_THRESHOLD_DBM`] classify as [`QualityTier::Medium`].
pub const MEDIUM_THRESHOLD_DBM: f64 = -85.0;

/// Lower bound of the poor filter range. Readings below it still
/// classify as poor.
pub const POOR_FLOOR_DBM: f64 = -120.0;

/// Upper bound of the good filter range.
pub const GOOD_CEILING_DBM: f64 = 0.0;

/// Identifier of a mobile carrier (e.g. `"T-Mobile LTE"`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CarrierId(String);

impl CarrierId {
    /// Creates a carrier identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CarrierId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CarrierId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for CarrierId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Signal quality tier derived from a reading in dBm.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum QualityTier {
    /// `>= -70 dBm`
    Good,
    /// `>= -85 dBm` and `< -70 dBm`
    Medium,
    /// `< -85 dBm`
    Poor,
}

impl QualityTier {
    /// All tiers, best first.
    pub const ALL: &[Self] = &[Self::Good, Self::Medium, Self::Poor];

    /// Classifies a reading. See [`classify`].
    #[must_use]
    pub fn classify(strength_dbm: f64) -> Self {
        classify(strength_dbm)
    }

    /// Human-readable label used in selection menus.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Good => "Good",
            Self::Medium => "Medium",
            Self::Poor => "Poor",
        }
    }

    /// Marker color used when the configuration does not override it.
    #[must_use]
    pub const fn default_color(self) -> &'static str {
        match self {
            Self::Good => "green",
            Self::Medium => "orange",
            Self::Poor => "red",
        }
    }

    /// The half-open filter range for this tier.
    #[must_use]
    pub const fn default_range(self) -> QualityRange {
        match self {
            Self::Good => QualityRange::new(GOOD_THRESHOLD_DBM, GOOD_CEILING_DBM),
            Self::Medium => QualityRange::new(MEDIUM_THRESHOLD_DBM, GOOD_THRESHOLD_DBM),
            Self::Poor => QualityRange::new(POOR_FLOOR_DBM, MEDIUM_THRESHOLD_DBM),
        }
    }
}

/// Maps a signal-strength reading (dBm) to its quality tier.
///
/// Total over all `f64` values. Values exactly on a threshold belong to
/// the higher tier. `NaN` fails every comparison and lands in
/// [`QualityTier::Poor`].
#[must_use]
pub fn classify(strength_dbm: f64) -> QualityTier {
    if strength_dbm >= GOOD_THRESHOLD_DBM {
        QualityTier::Good
    } else if strength_dbm >= MEDIUM_THRESHOLD_DBM {
        QualityTier::Medium
    } else {
        QualityTier::Poor
    }
}

/// Half-open reading range `[min, max)` used by the quality filter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityRange {
    /// Inclusive lower bound (dBm).
    pub min: f64,
    /// Exclusive upper bound (dBm).
    pub max: f64,
}

impl QualityRange {
    /// Creates a range `[min, max)`.
    #[must_use]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Whether `reading` falls inside `[min, max)`.
    #[must_use]
    pub fn contains(&self, reading: f64) -> bool {
        reading >= self.min && reading < self.max
    }
}

/// Quality selection in the dashboard: every tier, or one specific tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum QualityFilter {
    /// Keep all readings and color each by its classified tier.
    #[default]
    All,
    /// Keep readings inside the tier's filter range only.
    Tier(QualityTier),
}

impl QualityFilter {
    /// Every filter option in menu order.
    #[must_use]
    pub fn options() -> Vec<Self> {
        std::iter::once(Self::All)
            .chain(QualityTier::ALL.iter().copied().map(Self::Tier))
            .collect()
    }

    /// Human-readable label used in selection menus.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Tier(tier) => tier.label(),
        }
    }
}

impl std::fmt::Display for QualityFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Tier(tier) => write!(f, "{tier}"),
        }
    }
}

/// Error returned when a quality filter string is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown quality filter '{value}': expected all, good, medium, or poor")]
pub struct UnknownQualityFilter {
    /// The rejected input.
    pub value: String,
}

impl FromStr for QualityFilter {
    type Err = UnknownQualityFilter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        QualityTier::from_str(trimmed)
            .map(Self::Tier)
            .map_err(|_| UnknownQualityFilter {
                value: s.to_string(),
            })
    }
}

impl TryFrom<String> for QualityFilter {
    type Error = UnknownQualityFilter;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<QualityFilter> for String {
    fn from(value: QualityFilter) -> Self {
        value.to_string()
    }
}

/// Down-sampling stride: keep every `n`-th sample. Always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct Stride(NonZeroUsize);

/// Error returned when a stride of zero is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid stride {value}: must be at least 1")]
pub struct InvalidStride {
    /// The rejected value.
    pub value: usize,
}

impl Stride {
    /// Keep every sample.
    pub const ONE: Self = Self(NonZeroUsize::MIN);

    /// Creates a stride.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidStride`] if `value` is zero.
    pub const fn new(value: usize) -> Result<Self, InvalidStride> {
        match NonZeroUsize::new(value) {
            Some(n) => Ok(Self(n)),
            None => Err(InvalidStride { value }),
        }
    }

    /// Returns the stride as a plain `usize`.
    #[must_use]
    pub const fn get(self) -> usize {
        self.0.get()
    }
}

impl Default for Stride {
    fn default() -> Self {
        Self::ONE
    }
}

impl TryFrom<usize> for Stride {
    type Error = InvalidStride;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Stride> for usize {
    fn from(value: Stride) -> Self {
        value.get()
    }
}

impl std::fmt::Display for Stride {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One geolocated set of signal readings along a highway.
///
/// Immutable once loaded. Quality tiers are derived on demand rather
/// than stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sample {
    /// Position in the loaded dataset; used as the stable tie-breaker
    /// when ordering samples.
    pub index: usize,
    /// WGS84 latitude.
    pub latitude: f64,
    /// WGS84 longitude.
    pub longitude: f64,
    /// Reading in dBm per carrier. Carriers without a reading are absent.
    pub readings: BTreeMap<CarrierId, f64>,
    /// Parsed measurement time, if the raw value could be parsed.
    pub timestamp: Option<NaiveDateTime>,
    /// Raw measurement time as it appeared in the source file.
    pub time_label: Option<String>,
    /// Highway identifier (e.g. `"D1"`).
    pub highway: Option<String>,
    /// Source file name the sample was loaded from.
    pub source: String,
}

impl Sample {
    /// Returns the reading for `carrier`, if present.
    #[must_use]
    pub fn reading(&self, carrier: &CarrierId) -> Option<f64> {
        self.readings.get(carrier).copied()
    }

    /// Classifies the reading for `carrier`, if present.
    #[must_use]
    pub fn tier(&self, carrier: &CarrierId) -> Option<QualityTier> {
        self.reading(carrier).map(classify)
    }

    /// Whether `carrier` has a good reading. A missing reading is not good.
    #[must_use]
    pub fn is_good_for(&self, carrier: &CarrierId) -> bool {
        self.tier(carrier) == Some(QualityTier::Good)
    }

    /// Whether at least one of `carriers` has a good reading.
    #[must_use]
    pub fn any_carrier_good(&self, carriers: &[CarrierId]) -> bool {
        carriers.iter().any(|carrier| self.is_good_for(carrier))
    }
}
