//! Per-pixel fusion of the samples gathered from every source.

use crate::video::Sample;

/// Rescue is only considered when this many valid samples or fewer remain.
pub const RESCUE_MAX_VALID: usize = 3;

/// Rescue needs more than this many sources available for the frame.
pub const RESCUE_MIN_SOURCES: usize = 3;

/// Result of fusing one pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fused {
    pub value: Sample,
    /// No sample was usable; `value` is the previous good value.
    pub is_dropout: bool,
}

/// Median using introselect. Mutates the buffer order.
///
/// Even-length input averages the two central order statistics in floating
/// point and truncates.
#[inline]
pub fn median(values: &mut [Sample]) -> Sample {
    debug_assert!(!values.is_empty());

    let len = values.len();
    let mid = len / 2;

    let (left_part, upper, _) = values.select_nth_unstable(mid);
    let upper = *upper;
    if len & 1 == 1 {
        upper
    } else {
        let lower = left_part.iter().copied().max().unwrap_or(upper);
        mean2(lower, upper)
    }
}

#[inline]
fn mean2(a: Sample, b: Sample) -> Sample {
    ((a as f64 + b as f64) / 2.0) as Sample
}

/// Whether the differential dropout rescue should run for this pixel.
#[inline]
pub fn needs_rescue(valid_count: usize, available_sources: usize, rescue_enabled: bool) -> bool {
    rescue_enabled && valid_count <= RESCUE_MAX_VALID && available_sources > RESCUE_MIN_SOURCES
}

/// Fuses the usable samples of one pixel.
///
/// More than two values give the median, two give their mean, one is passed
/// through and none falls back to `prev_good` as a dropout. `prev_good` is
/// updated whenever a value was produced from real samples.
pub fn fuse(values: &mut [Sample], prev_good: &mut Sample) -> Fused {
    let value = match values.len() {
        0 => {
            return Fused {
                value: *prev_good,
                is_dropout: true,
            }
        }
        1 => values[0],
        2 => mean2(values[0], values[1]),
        _ => median(values),
    };

    *prev_good = value;
    Fused {
        value,
        is_dropout: false,
    }
}
