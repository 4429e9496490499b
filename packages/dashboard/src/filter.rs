//! Carrier and quality-tier filtering.
//!
//! The filter uses each tier's half-open range `[min, max)` from the
//! configuration. This is deliberately not the classifier: `0 dBm`
//! classifies as good but falls outside the good range, and `-130 dBm`
//! classifies as poor but falls outside the poor range.

use signal_map_signal_models::{CarrierId, QualityFilter, Sample};

use crate::config::QualityConfig;

/// Keeps samples that have a reading for `carrier` and, for a specific
/// tier, whose reading lies inside that tier's range. Order is preserved.
#[must_use]
pub fn filter<'a>(
    samples: &'a [Sample],
    carrier: &CarrierId,
    quality: QualityFilter,
    ranges: &QualityConfig,
) -> Vec<&'a Sample> {
    let range = match quality {
        QualityFilter::All => None,
        QualityFilter::Tier(tier) => Some(ranges.range(tier)),
    };

    samples
        .iter()
        .filter(|sample| {
            sample
                .reading(carrier)
                .is_some_and(|reading| range.is_none_or(|range| range.contains(reading)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use signal_map_signal_models::{QualityTier, classify};
    use std::collections::BTreeMap;

    fn sample(index: usize, reading: Option<f64>) -> Sample {
        let mut readings = BTreeMap::new();
        if let Some(reading) = reading {
            readings.insert(CarrierId::from("X"), reading);
        }
        readings.insert(CarrierId::from("Y"), -60.0);
        Sample {
            index,
            latitude: 50.0,
            longitude: 14.0,
            readings,
            timestamp: None,
            time_label: None,
            highway: Some("D1".to_string()),
            source: "d1.geojson".to_string(),
        }
    }

    fn readings_of(kept: &[&Sample]) -> Vec<f64> {
        let x = CarrierId::from("X");
        kept.iter().filter_map(|s| s.reading(&x)).collect()
    }

    #[test]
    fn all_drops_only_missing_readings() {
        let samples = vec![sample(0, Some(-60.0)), sample(1, None), sample(2, Some(-130.0))];
        let kept = filter(
            &samples,
            &CarrierId::from("X"),
            QualityFilter::All,
            &QualityConfig::default(),
        );

        let indexes: Vec<usize> = kept.iter().map(|s| s.index).collect();
        assert_eq!(indexes, vec![0, 2]);
    }

    #[test]
    fn good_filter_keeps_minus_70_up_to_but_excluding_0() {
        let samples: Vec<Sample> = [-70.0, -69.9, -1.0, 0.0, 5.0, -70.0001]
            .into_iter()
            .enumerate()
            .map(|(i, r)| sample(i, Some(r)))
            .collect();

        let kept = filter(
            &samples,
            &CarrierId::from("X"),
            QualityFilter::Tier(QualityTier::Good),
            &QualityConfig::default(),
        );

        assert_eq!(readings_of(&kept), vec![-70.0, -69.9, -1.0]);
    }

    #[test]
    fn filter_ranges_differ_from_classifier_at_the_edges() {
        // Both classify into the tier but fall outside its filter range.
        assert_eq!(classify(0.0), QualityTier::Good);
        assert_eq!(classify(-130.0), QualityTier::Poor);

        let samples = vec![sample(0, Some(0.0)), sample(1, Some(-130.0))];
        let x = CarrierId::from("X");
        let ranges = QualityConfig::default();

        assert!(filter(&samples, &x, QualityFilter::Tier(QualityTier::Good), &ranges).is_empty());
        assert!(filter(&samples, &x, QualityFilter::Tier(QualityTier::Poor), &ranges).is_empty());
    }

    #[test]
    fn medium_and_poor_ranges_are_half_open() {
        let samples: Vec<Sample> = [-85.0, -70.0, -70.5, -120.0, -85.5, -120.5]
            .into_iter()
            .enumerate()
            .map(|(i, r)| sample(i, Some(r)))
            .collect();
        let x = CarrierId::from("X");
        let ranges = QualityConfig::default();

        let medium = filter(&samples, &x, QualityFilter::Tier(QualityTier::Medium), &ranges);
        assert_eq!(readings_of(&medium), vec![-85.0, -70.5]);

        let poor = filter(&samples, &x, QualityFilter::Tier(QualityTier::Poor), &ranges);
        assert_eq!(readings_of(&poor), vec![-120.0, -85.5]);
    }

    #[test]
    fn configured_ranges_are_honored() {
        let samples = vec![sample(0, Some(-75.0)), sample(1, Some(-65.0))];
        let mut ranges = QualityConfig::default();
        ranges.good.min = -80.0;

        let kept = filter(
            &samples,
            &CarrierId::from("X"),
            QualityFilter::Tier(QualityTier::Good),
            &ranges,
        );
        assert_eq!(readings_of(&kept), vec![-75.0, -65.0]);
    }
}
