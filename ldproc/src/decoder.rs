//! Colour-decode capability consumed by the PAL frame path.
//!
//! The chroma demodulation filter itself lives outside this crate. Workers
//! only see [`ColourDecoder`]; [`LumaDecoder`] is a luma-only implementation
//! used for monochrome output, demos and tests.

use common::buffer2::Buffer2;

use crate::video::{Field, Sample, VideoParameters};

/// One RGB 16-16-16 pixel.
pub type Rgb16 = [u16; 3];

/// Whole decoded frame, `field_width` wide and `2 * field_height - 1` tall.
pub type RgbFrame = Buffer2<Rgb16>;

/// Frame height for interlaced fields of `field_height` lines.
#[inline]
pub fn frame_height(field_height: usize) -> usize {
    (field_height * 2).saturating_sub(1)
}

/// Decoder holding per-thread calibration state.
pub trait ColourDecoder: Send {
    /// Called once per worker, before the first decode.
    fn update_configuration(&mut self, params: &VideoParameters);

    /// Decodes one frame from its two fields.
    fn perform_decode(
        &mut self,
        first_field: &Field,
        second_field: &Field,
        luma: i32,
        saturation: i32,
        black_and_white: bool,
    ) -> RgbFrame;
}

/// Weaves both fields and emits grey RGB from the luma level alone.
///
/// Saturation is ignored. The first field lands on even frame lines.
#[derive(Debug, Default, Clone)]
pub struct LumaDecoder {
    params: Option<VideoParameters>,
}

impl LumaDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    fn to_rgb(value: Sample, black: f64, range: f64, gain: f64) -> Rgb16 {
        let level = ((value as f64 - black) / range).clamp(0.0, 1.0);
        let out = (level * gain * u16::MAX as f64).clamp(0.0, u16::MAX as f64) as u16;
        [out; 3]
    }
}

impl ColourDecoder for LumaDecoder {
    fn update_configuration(&mut self, params: &VideoParameters) {
        self.params = Some(*params);
    }

    fn perform_decode(
        &mut self,
        first_field: &Field,
        second_field: &Field,
        luma: i32,
        _saturation: i32,
        _black_and_white: bool,
    ) -> RgbFrame {
        let params = self
            .params
            .as_ref()
            .unwrap_or_else(|| panic!("LumaDecoder used before update_configuration"));

        let width = params.field_width;
        let height = frame_height(params.field_height);
        let black = params.black_16b_ire as f64;
        let range = (params.white_16b_ire as f64 - black).max(1.0);
        let gain = luma.max(0) as f64 / 100.0;

        let mut frame = RgbFrame::new_default(width, height);
        for (y, line) in frame.rows_mut().enumerate() {
            let field = if y % 2 == 0 { first_field } else { second_field };
            let source = field.samples.row(y / 2);
            for (out, &value) in line.iter_mut().zip(source) {
                *out = Self::to_rgb(value, black, range, gain);
            }
        }

        frame
    }
}
