//! Capture geometry and per-field sample buffers.

use common::buffer2::Buffer2;
use serde::{Deserialize, Serialize};

use crate::dropouts::DropOuts;

/// One 16-bit composite sample. 0 means "no signal".
pub type Sample = u16;

/// Capture geometry, fixed for a whole run.
///
/// Column values are sample offsets within a field line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoParameters {
    pub field_width: usize,
    pub field_height: usize,
    pub active_video_start: usize,
    pub active_video_end: usize,
    pub colour_burst_start: usize,
    pub colour_burst_end: usize,
    pub is_source_pal: bool,
    #[serde(rename = "black16bIre")]
    pub black_16b_ire: Sample,
    #[serde(rename = "white16bIre")]
    pub white_16b_ire: Sample,
}

impl VideoParameters {
    /// Nominal ld-decode PAL geometry at 4fsc.
    pub fn pal() -> Self {
        Self {
            field_width: 1135,
            field_height: 313,
            active_video_start: 185,
            active_video_end: 1107,
            colour_burst_start: 98,
            colour_burst_end: 138,
            is_source_pal: true,
            black_16b_ire: 0x4000,
            white_16b_ire: 0xD300,
        }
    }

    #[inline]
    pub fn field_len(&self) -> usize {
        self.field_width * self.field_height
    }
}

/// Per-field metadata handed over by the frame pool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMetadata {
    pub seq_no: i32,
    pub drop_outs: DropOuts,
    pub median_burst_ire: f64,
    pub field_phase_id: i32,
}

/// One source's samples for one field, with its dropout map.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub samples: Buffer2<Sample>,
    pub metadata: FieldMetadata,
}

impl Field {
    pub fn new(samples: Buffer2<Sample>, metadata: FieldMetadata) -> Self {
        Self { samples, metadata }
    }

    /// Field filled with one value and no dropouts.
    pub fn blank(params: &VideoParameters, value: Sample) -> Self {
        Self::new(
            Buffer2::new_filled(params.field_width, params.field_height, value),
            FieldMetadata::default(),
        )
    }

    #[inline]
    pub fn sample(&self, x: usize, y: usize) -> Sample {
        self.samples[(x, y)]
    }

    #[inline]
    pub fn is_dropout(&self, x: usize, y: usize) -> bool {
        self.metadata.drop_outs.is_dropout(x, y)
    }
}
