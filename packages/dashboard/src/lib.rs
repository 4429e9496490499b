#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Highway signal-coverage dashboard.
//!
//! Ties the loaded dataset, the configuration, and the aggregation cache
//! together in a [`DashboardContext`]. Each [`Selection`] (carrier,
//! quality filter, precision) produces a [`DashboardView`]: filtered and
//! down-sampled markers plus the per-region coverage overlay, which can be
//! written out as `GeoJSON` with [`export::export_view`].

pub mod config;
pub mod context;
pub mod export;
pub mod filter;
pub mod reduce;
pub mod render;

use serde::{Deserialize, Serialize};
use signal_map_signal_models::{CarrierId, QualityFilter, Stride};
use thiserror::Error;

pub use config::{ConfigError, DashboardConfig};
pub use context::DashboardContext;
pub use render::{AnnotatedRegion, DashboardView, Marker, Notice, NoticeLevel};

/// Errors surfaced by the dashboard.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// Configuration could not be loaded or is invalid.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// The selected carrier is not in the configuration.
    #[error("unknown carrier '{carrier}'")]
    UnknownCarrier {
        /// The rejected carrier id.
        carrier: CarrierId,
    },

    /// The selected stride is not one of the configured precision options.
    #[error("stride {stride} is not a configured precision option")]
    UnknownPrecision {
        /// The rejected stride.
        stride: Stride,
    },

    /// Writing export files failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serializing export files failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// The user's current choice of carrier, quality filter, and precision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    /// Carrier whose readings are shown.
    pub carrier: CarrierId,
    /// Quality tier filter.
    pub quality: QualityFilter,
    /// Keep every `stride`-th filtered sample.
    pub stride: Stride,
}

impl Selection {
    /// The first carrier, every tier, and the first precision option.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoCarriers`] or
    /// [`ConfigError::NoPrecisionOptions`] if `config` was never validated.
    pub fn initial(config: &DashboardConfig) -> Result<Self, DashboardError> {
        let carrier = config.carriers.first().ok_or(ConfigError::NoCarriers)?;
        let precision = config
            .precision
            .first()
            .ok_or(ConfigError::NoPrecisionOptions)?;

        Ok(Self {
            carrier: carrier.id.clone(),
            quality: QualityFilter::All,
            stride: precision.stride,
        })
    }

    /// Checks that the carrier and stride are offered by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::UnknownCarrier`] or
    /// [`DashboardError::UnknownPrecision`].
    pub fn validate(&self, config: &DashboardConfig) -> Result<(), DashboardError> {
        if config.carrier(&self.carrier).is_none() {
            return Err(DashboardError::UnknownCarrier {
                carrier: self.carrier.clone(),
            });
        }
        if config.precision_for(self.stride).is_none() {
            return Err(DashboardError::UnknownPrecision {
                stride: self.stride,
            });
        }
        Ok(())
    }
}

impl std::fmt::Display for Selection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} / {} / every {} point(s)",
            self.carrier, self.quality, self.stride
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use signal_map_signal_models::QualityTier;

    #[test]
    fn initial_selection_uses_first_options() {
        let config = DashboardConfig::embedded();
        let selection = Selection::initial(&config).unwrap();

        assert_eq!(selection.carrier, CarrierId::from("T-Mobile LTE"));
        assert_eq!(selection.quality, QualityFilter::All);
        assert_eq!(selection.stride, Stride::ONE);
        assert!(selection.validate(&config).is_ok());
    }

    #[test]
    fn validate_rejects_unknown_carrier_and_stride() {
        let config = DashboardConfig::embedded();

        let unknown_carrier = Selection {
            carrier: CarrierId::from("Nope LTE"),
            quality: QualityFilter::Tier(QualityTier::Good),
            stride: Stride::ONE,
        };
        assert!(matches!(
            unknown_carrier.validate(&config),
            Err(DashboardError::UnknownCarrier { .. })
        ));

        let unknown_stride = Selection {
            carrier: CarrierId::from("O2 LTE"),
            quality: QualityFilter::All,
            stride: Stride::new(7).unwrap(),
        };
        assert!(matches!(
            unknown_stride.validate(&config),
            Err(DashboardError::UnknownPrecision { .. })
        ));
    }
}
