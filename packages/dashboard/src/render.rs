//! Presentation records for the map: markers, annotated regions, and
//! notices, assembled into a [`DashboardView`].

use geo::{Centroid as _, MultiPoint, MultiPolygon, Point};
use serde::Serialize;
use signal_map_geography_models::{RegionCoverageSummary, RegionLayer};
use signal_map_loader::LoadWarning;
use signal_map_signal_models::{CarrierId, QualityFilter, QualityTier, Sample, classify};
use strum_macros::{AsRefStr, Display};

use crate::Selection;
use crate::config::{MarkerStyle, PolygonStyle, QualityConfig, RegionStyle};

/// Label shown when a sample has no measurement time.
pub const MISSING_TIME_LABEL: &str = "N/A";

/// One displayed sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Marker {
    /// Index of the underlying sample in the dataset.
    pub sample_index: usize,
    /// WGS84 latitude in degrees.
    pub latitude: f64,
    /// WGS84 longitude in degrees.
    pub longitude: f64,
    /// Carrier whose reading is shown.
    pub carrier: CarrierId,
    /// Reading in dBm.
    pub reading: f64,
    /// Tier that picked the color.
    pub tier: QualityTier,
    /// Fill color from the quality config.
    pub color: String,
    /// Popup text, e.g. `"O2 LTE: -72 dBm<br>Time: 2024-05-13 10:22:31"`.
    pub label: String,
}

/// Builds markers for already filtered and reduced samples.
///
/// With [`QualityFilter::All`] each marker takes the color of its
/// classified tier; with a specific tier every marker uses that tier's
/// color. Samples without a reading for `carrier` are skipped.
#[must_use]
pub fn build_markers(
    samples: &[&Sample],
    carrier: &CarrierId,
    quality: QualityFilter,
    colors: &QualityConfig,
) -> Vec<Marker> {
    samples
        .iter()
        .filter_map(|sample| {
            let reading = sample.reading(carrier)?;
            let tier = match quality {
                QualityFilter::All => classify(reading),
                QualityFilter::Tier(tier) => tier,
            };
            let time = sample.time_label.as_deref().unwrap_or(MISSING_TIME_LABEL);

            Some(Marker {
                sample_index: sample.index,
                latitude: sample.latitude,
                longitude: sample.longitude,
                carrier: carrier.clone(),
                reading,
                tier,
                color: colors.color(tier).to_string(),
                label: format!("{carrier}: {reading} dBm<br>Time: {time}"),
            })
        })
        .collect()
}

/// A region together with its coverage summary and display style.
///
/// Built fresh on every render; the loaded [`signal_map_geography_models::Region`]
/// is never modified.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotatedRegion {
    pub name: String,
    /// Normal polygon style.
    pub style: PolygonStyle,
    /// Style while hovered.
    pub highlight: PolygonStyle,
    /// Summary lines joined with `<br>`.
    pub popup_html: String,
    /// Raw figures behind the popup.
    pub summary: RegionCoverageSummary,
    /// WGS84 boundary for rendering.
    #[serde(skip)]
    pub boundary: MultiPolygon<f64>,
}

/// Pairs each summary with its region's boundary and the configured
/// style. Summaries whose region is not in `layer` are dropped.
#[must_use]
pub fn annotate_regions(
    layer: &RegionLayer,
    coverage: &[RegionCoverageSummary],
    style: &RegionStyle,
) -> Vec<AnnotatedRegion> {
    let polygon_style = style.polygon_style();
    let highlight = style.highlight_style();

    coverage
        .iter()
        .filter_map(|summary| {
            let region = layer.get(&summary.region)?;
            Some(AnnotatedRegion {
                name: region.name.clone(),
                style: polygon_style.clone(),
                highlight: highlight.clone(),
                popup_html: popup_html(&summary.summary),
                summary: summary.clone(),
                boundary: region.boundary.clone(),
            })
        })
        .collect()
}

fn popup_html(summary: &str) -> String {
    summary.lines().collect::<Vec<_>>().join("<br>")
}

/// Severity of a [`Notice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NoticeLevel {
    /// Nothing is wrong, e.g. the selection matched no samples.
    Info,
    /// Some input was skipped or the region overlay is missing.
    Warning,
}

/// A message shown alongside the map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    /// An [`NoticeLevel::Info`] notice.
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    /// A [`NoticeLevel::Warning`] notice.
    #[must_use]
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    /// No samples match the selection.
    #[must_use]
    pub fn empty_result(selection: &Selection) -> Self {
        Self::info(format!(
            "No points for {} with quality '{}' in the data",
            selection.carrier, selection.quality
        ))
    }
}

impl From<&LoadWarning> for Notice {
    fn from(warning: &LoadWarning) -> Self {
        Self::warning(warning.to_string())
    }
}

/// Initial map center, in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MapCenter {
    pub latitude: f64,
    pub longitude: f64,
}

/// Mean position of the markers, or `None` when there are none.
#[must_use]
pub fn map_center(markers: &[Marker]) -> Option<MapCenter> {
    let points: MultiPoint<f64> = markers
        .iter()
        .map(|m| Point::new(m.longitude, m.latitude))
        .collect();

    points.centroid().map(|c| MapCenter {
        latitude: c.y(),
        longitude: c.x(),
    })
}

/// Everything needed to draw one dashboard state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub selection: Selection,
    /// Samples matching carrier and quality, before reduction.
    pub filtered_count: usize,
    /// Markers actually shown.
    pub displayed_count: usize,
    /// Mean marker position; `None` when nothing is shown.
    pub center: Option<MapCenter>,
    /// Initial zoom level from the map config.
    pub zoom: u8,
    pub marker_style: MarkerStyle,
    pub markers: Vec<Marker>,
    /// `None` when region statistics are unavailable.
    pub regions: Option<Vec<AnnotatedRegion>>,
    /// Load warnings, the empty-result notice, and overlay problems.
    pub notices: Vec<Notice>,
}

impl DashboardView {
    /// The count lines shown above the map.
    #[must_use]
    pub fn status_lines(&self) -> Vec<String> {
        let carrier = &self.selection.carrier;
        let first = match self.selection.quality {
            QualityFilter::All => {
                format!("Points with a {carrier} signal: {}", self.filtered_count)
            }
            QualityFilter::Tier(tier) => format!(
                "Points with a {carrier} signal of '{tier}' quality: {}",
                self.filtered_count
            ),
        };

        vec![
            first,
            format!("Points displayed after reduction: {}", self.displayed_count),
        ]
    }

    /// Whether the selection matched nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}
