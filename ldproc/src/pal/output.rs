use crate::decoder::{Rgb16, RgbFrame};

use super::PalConfig;

/// Height of every emitted frame.
pub const OUTPUT_HEIGHT: usize = 576;

/// Cuts the visible area out of a whole decoded frame.
///
/// Black lines are added on top when the active band is shorter than
/// [`OUTPUT_HEIGHT`], so short band configurations still yield full-height
/// frames.
pub fn crop_frame(config: &PalConfig, rgb: &RgbFrame) -> RgbFrame {
    let params = &config.video_parameters;
    assert_eq!(
        (rgb.width(), rgb.height()),
        (params.field_width, config.frame_height),
        "decoded frame does not match the configured geometry"
    );

    let start = params.active_video_start;
    let end = params.active_video_end;
    let width = end - start;
    let blank_lines = OUTPUT_HEIGHT.saturating_sub(config.active_lines());

    let height = blank_lines + config.active_lines();

    let mut pixels: Vec<Rgb16> = Vec::with_capacity(width * height);
    pixels.resize(width * blank_lines, [0; 3]);
    for y in config.first_active_scan_line..config.last_active_scan_line {
        pixels.extend_from_slice(&rgb.row(y)[start..end]);
    }

    RgbFrame::new(width, height, pixels)
}
