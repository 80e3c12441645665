//! PAL frame path: active-area geometry, saturation compensation and
//! cropping of the decoder's whole-frame output.

mod output;


pub use output::{crop_frame, OUTPUT_HEIGHT};

use crate::decoder::{frame_height, ColourDecoder, RgbFrame};
use crate::error::{Error, Result};
use crate::pool::Numbered;
use crate::video::{Field, VideoParameters};
use crate::worker::{run_workers, AbortFlag, FramePool, FrameProcessor, RunSummary};

/// First frame line of the visible picture.
pub const FIRST_ACTIVE_SCAN_LINE: usize = 44;

/// One past the last visible frame line.
pub const LAST_ACTIVE_SCAN_LINE: usize = 620;

/// Luma level passed to the decoder, in percent.
pub const LUMA_PARAM: i32 = 100;

/// Output width is padded to a multiple of this.
const WIDTH_ALIGNMENT: usize = 16;

/// Geometry derived once before any frame is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PalConfig {
    /// Input geometry with the active columns widened for alignment.
    pub video_parameters: VideoParameters,
    pub frame_height: usize,
    pub first_active_scan_line: usize,
    pub last_active_scan_line: usize,
    pub black_and_white: bool,
}

impl PalConfig {
    #[inline]
    pub fn active_width(&self) -> usize {
        self.video_parameters.active_video_end - self.video_parameters.active_video_start
    }

    #[inline]
    pub fn active_lines(&self) -> usize {
        self.last_active_scan_line - self.first_active_scan_line
    }
}

/// Shrinks `last` by one line if needed so the band has an even height.
pub fn even_line_band(first: usize, last: usize) -> (usize, usize) {
    if (last - first) % 2 != 0 {
        (first, last - 1)
    } else {
        (first, last)
    }
}

/// Widens `start..end` until its width is a multiple of 16, growing the right
/// edge on even widths and the left edge on odd ones so the centre moves by
/// at most one sample per step.
pub fn align_active_width(
    mut start: usize,
    mut end: usize,
    field_width: usize,
) -> Result<(usize, usize)> {
    loop {
        let width = end - start;
        if width % WIDTH_ALIGNMENT == 0 {
            return Ok((start, end));
        }

        if width % 2 == 0 {
            end += 1;
            if end > field_width {
                return Err(Error::InvalidGeometry(format!(
                    "active video end {} exceeds field width {} after alignment",
                    end, field_width
                )));
            }
        } else {
            start = start.checked_sub(1).ok_or_else(|| {
                Error::InvalidGeometry("active video start below 0 after alignment".to_string())
            })?;
        }
    }
}

/// Saturation compensation from the measured burst level.
///
/// Stands in for real MTF compensation: a weak burst means the chroma was
/// attenuated, so saturation is raised linearly around 20 IRE.
#[inline]
pub fn saturation_for_burst(burst_median_ire: f64) -> i32 {
    (125.0 + (100.0 / 20.0) * (20.0 - burst_median_ire)) as i32
}

/// One frame of PAL decoding work.
#[derive(Debug, Clone)]
pub struct DecodeInput {
    pub frame_number: i32,
    pub first_field: Field,
    pub second_field: Field,
    pub burst_median_ire: f64,
}

impl DecodeInput {
    /// Orders a captured field pair, swapping it when the capture has
    /// reversed field order. The burst level comes from the resulting first
    /// field.
    pub fn from_fields(frame_number: i32, a: Field, b: Field, reverse_field_order: bool) -> Self {
        let (first_field, second_field) = if reverse_field_order { (b, a) } else { (a, b) };
        Self {
            frame_number,
            burst_median_ire: first_field.metadata.median_burst_ire,
            first_field,
            second_field,
        }
    }
}

impl Numbered for DecodeInput {
    fn frame_number(&self) -> i32 {
        self.frame_number
    }
}

/// Cropped RGB 16-16-16 frame ready for output.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedFrame {
    pub frame_number: i32,
    pub rgb: RgbFrame,
}

impl Numbered for DecodedFrame {
    fn frame_number(&self) -> i32 {
        self.frame_number
    }
}

/// Validated PAL decoding setup shared by all worker threads.
#[derive(Debug, Clone)]
pub struct PalDecoder {
    config: PalConfig,
}

impl PalDecoder {
    /// Checks the source and derives the output geometry. Fails before any
    /// frame is processed when the input is not PAL or cannot be aligned.
    pub fn configure(params: &VideoParameters, black_and_white: bool) -> Result<Self> {
        if !params.is_source_pal {
            tracing::error!("This decoder is for PAL video sources only");
            return Err(Error::NotPal);
        }

        if params.active_video_start >= params.active_video_end
            || params.active_video_end > params.field_width
        {
            return Err(Error::InvalidGeometry(format!(
                "active video {}..{} does not fit field width {}",
                params.active_video_start, params.active_video_end, params.field_width
            )));
        }

        let frame_height = frame_height(params.field_height);
        let (first_active_scan_line, last_active_scan_line) =
            even_line_band(FIRST_ACTIVE_SCAN_LINE, LAST_ACTIVE_SCAN_LINE);
        if frame_height < last_active_scan_line {
            return Err(Error::InvalidGeometry(format!(
                "frame height {} is shorter than the active lines {}..{}",
                frame_height, first_active_scan_line, last_active_scan_line
            )));
        }

        let (active_video_start, active_video_end) = align_active_width(
            params.active_video_start,
            params.active_video_end,
            params.field_width,
        )?;

        let config = PalConfig {
            video_parameters: VideoParameters {
                active_video_start,
                active_video_end,
                ..*params
            },
            frame_height,
            first_active_scan_line,
            last_active_scan_line,
            black_and_white,
        };

        tracing::info!(
            "Input video of {} x {} will be colourised and trimmed to {} x {} RGB 16-16-16 frames",
            params.field_width,
            frame_height,
            config.active_width(),
            config.active_lines()
        );

        Ok(Self { config })
    }

    pub fn config(&self) -> &PalConfig {
        &self.config
    }

    /// Per-worker processor owning `decoder`.
    pub fn make_thread<D: ColourDecoder>(&self, decoder: D) -> PalThread<D> {
        PalThread::new(self.config, decoder)
    }

    /// Decodes every frame of `pool` on `threads` workers.
    pub fn run<P, D, M>(
        &self,
        threads: usize,
        pool: &P,
        abort: &AbortFlag,
        make_decoder: M,
    ) -> Result<RunSummary>
    where
        P: FramePool<Input = DecodeInput, Output = DecodedFrame>,
        D: ColourDecoder,
        M: Fn(usize) -> D + Sync,
    {
        run_workers(threads, pool, abort, |index| {
            self.make_thread(make_decoder(index))
        })
    }
}

/// Worker-side processor: decode, then crop to the visible area.
pub struct PalThread<D> {
    config: PalConfig,
    decoder: D,
}

impl<D: ColourDecoder> PalThread<D> {
    pub fn new(config: PalConfig, mut decoder: D) -> Self {
        decoder.update_configuration(&config.video_parameters);
        Self { config, decoder }
    }
}

impl<D: ColourDecoder> FrameProcessor for PalThread<D> {
    type Input = DecodeInput;
    type Output = DecodedFrame;

    fn process(&mut self, input: DecodeInput) -> DecodedFrame {
        let saturation = saturation_for_burst(input.burst_median_ire);

        let whole_frame = self.decoder.perform_decode(
            &input.first_field,
            &input.second_field,
            LUMA_PARAM,
            saturation,
            self.config.black_and_white,
        );

        DecodedFrame {
            frame_number: input.frame_number,
            rgb: crop_frame(&self.config, &whole_frame),
        }
    }
}
