//! Differential dropout detection.
//!
//! ld-decode's dropout detector over-triggers on sharp, high-contrast
//! content. When most sources flag a pixel, the raw samples of all sources
//! are compared against their own median and anything close to it is
//! treated as a false positive and kept.

use crate::stacking::fuse::median;
use crate::video::{Sample, VideoParameters};

/// Half-width of the acceptance band, as a percentage of the median.
pub const DIFF_DOD_THRESHOLD_PERCENT: f64 = 10.0;

const MIN_INPUT_VALUES: usize = 3;

/// Returns the samples lying strictly inside `median ± 10%`.
///
/// Returns an empty set when fewer than three values are supplied or when
/// `x` lies before the colour burst.
pub fn diff_dod(values: &[Sample], params: &VideoParameters, x: usize) -> Vec<Sample> {
    if values.len() < MIN_INPUT_VALUES {
        tracing::trace!(count = values.len(), "diffDOD: too few input values");
        return Vec::new();
    }

    if x < params.colour_burst_start {
        tracing::trace!(x, "diffDOD: pixel not in colour burst or visible area");
        return Vec::new();
    }

    let mut scratch = values.to_vec();
    let median_value = median(&mut scratch) as f64;
    let (min_value, max_value) = acceptance_band(median_value);

    let output: Vec<Sample> = values
        .iter()
        .copied()
        .filter(|&v| v > min_value && v < max_value)
        .collect();

    if output.is_empty() {
        tracing::trace!(
            ?values,
            min_value,
            max_value,
            median_value,
            "diffDOD: empty output"
        );
    } else {
        tracing::trace!(?values, ?output, "diffDOD: rescued");
    }

    output
}

/// Band limits, clamped to the sample range and truncated.
fn acceptance_band(median_value: f64) -> (Sample, Sample) {
    let delta = (median_value / 100.0) * DIFF_DOD_THRESHOLD_PERCENT;
    let max_value = (median_value + delta).clamp(0.0, Sample::MAX as f64);
    let min_value = (median_value - delta).clamp(0.0, Sample::MAX as f64);
    (min_value as Sample, max_value as Sample)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> VideoParameters {
        VideoParameters {
            colour_burst_start: 10,
            ..VideoParameters::pal()
        }
    }

    #[test]
    fn test_band_is_ten_percent() {
        assert_eq!(acceptance_band(100.0), (90, 110));
        assert_eq!(acceptance_band(51.0), (45, 56));
        assert_eq!(acceptance_band(0.0), (0, 0));
    }

    #[test]
    fn test_band_clamps_to_sample_range() {
        assert_eq!(acceptance_band(65535.0).1, 65535);
        assert_eq!(acceptance_band(65000.0), (58500, 65535));
    }

    #[test]
    fn test_band_edges_are_exclusive() {
        let out = diff_dod(&[90, 91, 100, 100, 100, 109, 110], &params(), 20);
        assert_eq!(out, vec![91, 100, 100, 100, 109]);
    }

    #[test]
    fn test_outlier_is_dropped() {
        let out = diff_dod(&[50, 52, 51, 9000, 49], &params(), 20);
        assert_eq!(out, vec![50, 52, 51, 49]);
    }

    #[test]
    fn test_too_few_values() {
        assert!(diff_dod(&[100, 100], &params(), 20).is_empty());
        assert!(diff_dod(&[], &params(), 20).is_empty());
    }

    #[test]
    fn test_before_colour_burst() {
        assert!(diff_dod(&[100, 100, 100], &params(), 9).is_empty());
        assert_eq!(diff_dod(&[100, 100, 100], &params(), 10).len(), 3);
    }

    #[test]
    fn test_all_outside_band() {
        // median 1000, band (900, 1100)
        assert_eq!(diff_dod(&[10, 1000, 30000, 5, 40000], &params(), 20), vec![1000]);
        assert!(diff_dod(&[10, 20, 30000, 40000], &params(), 20).is_empty());
    }

    #[test]
    fn test_is_pure() {
        let values = [300, 310, 290, 20, 305];
        let first = diff_dod(&values, &params(), 50);
        let second = diff_dod(&values, &params(), 50);
        assert_eq!(first, second);
        assert_eq!(values, [300, 310, 290, 20, 305], "input left untouched");
    }
}
