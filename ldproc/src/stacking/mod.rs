//! Multi-source field stacking.
//!
//! Every pixel of the output field is fused from the samples of all
//! available sources that are not flagged as dropouts at that position.
//! When too few clean samples remain, [`diff_dod`] re-admits flagged
//! samples that agree with the majority.

mod diff_dod;
mod fuse;


pub use diff_dod::{diff_dod, DIFF_DOD_THRESHOLD_PERCENT};
pub use fuse::{fuse, median, needs_rescue, Fused};

use common::buffer2::Buffer2;

use crate::dropouts::DropOuts;
use crate::error::Result;
use crate::pool::Numbered;
use crate::video::{Field, Sample, VideoParameters};
use crate::worker::{run_workers, AbortFlag, FramePool, FrameProcessor, RunSummary};

/// One frame's worth of stacking work, as handed out by the frame pool.
#[derive(Debug, Clone)]
pub struct StackingInput {
    pub frame_number: i32,
    /// First field of the frame, one entry per source.
    pub first_fields: Vec<Field>,
    /// Second field of the frame, one entry per source.
    pub second_fields: Vec<Field>,
    pub video_parameters: VideoParameters,
    /// Fields are delivered in output order already; carried for the sink.
    pub reverse_field_order: bool,
    pub disable_diff_dod: bool,
    /// Indices into the per-source vectors usable for this frame.
    pub available_sources: Vec<usize>,
}

impl Numbered for StackingInput {
    fn frame_number(&self) -> i32 {
        self.frame_number
    }
}

/// A stacked field and its dropout map.
#[derive(Debug, Clone, PartialEq)]
pub struct StackedField {
    pub samples: Buffer2<Sample>,
    pub drop_outs: DropOuts,
}

/// Result of stacking one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct StackedFrame {
    pub frame_number: i32,
    pub first_field: StackedField,
    pub second_field: StackedField,
    pub first_field_seq_no: i32,
    pub second_field_seq_no: i32,
    pub reverse_field_order: bool,
}

impl Numbered for StackedFrame {
    fn frame_number(&self) -> i32 {
        self.frame_number
    }
}

/// Stacks one field across `sources`, using only the sources listed in
/// `available`.
///
/// The previous good value starts at 0 for every call, so nothing carries
/// over between fields. Dropouts are recorded one pixel at a time and merged
/// once at the end.
pub fn stack_field(
    sources: &[Field],
    params: &VideoParameters,
    available: &[usize],
    rescue_enabled: bool,
) -> StackedField {
    let width = params.field_width;
    let height = params.field_height;

    for &index in available {
        assert!(
            index < sources.len(),
            "Available source {} out of range for {} sources",
            index,
            sources.len()
        );
        let samples = &sources[index].samples;
        assert!(
            samples.width() == width && samples.height() == height,
            "Source {} is {}x{}, expected {}x{}",
            index,
            samples.width(),
            samples.height(),
            width,
            height
        );
    }

    let mut samples = Buffer2::new_default(width, height);
    let mut drop_outs = DropOuts::new();
    let mut prev_good: Sample = 0;
    let mut values: Vec<Sample> = Vec::with_capacity(available.len());

    for y in 0..height {
        for x in 0..width {
            values.clear();
            values.extend(
                available
                    .iter()
                    .map(|&i| &sources[i])
                    .filter(|field| !field.is_dropout(x, y))
                    .map(|field| field.sample(x, y)),
            );

            if needs_rescue(values.len(), available.len(), rescue_enabled) {
                values.clear();
                values.extend(
                    available
                        .iter()
                        .map(|&i| sources[i].sample(x, y))
                        .filter(|&v| v > 0),
                );
                values = diff_dod(&values, params, x);
            }

            let fused = fuse(&mut values, &mut prev_good);
            samples[(x, y)] = fused.value;

            // Sync and burst region is never flagged.
            if fused.is_dropout && x > params.colour_burst_start {
                drop_outs.append(x, x, y + 1);
            }
        }
    }

    if !drop_outs.is_empty() {
        drop_outs.concatenate();
    }

    StackedField { samples, drop_outs }
}

/// Worker-side processor turning a [`StackingInput`] into a [`StackedFrame`].
#[derive(Debug, Default)]
pub struct Stacker;

impl Stacker {
    fn seq_no(fields: &[Field], available: &[usize]) -> i32 {
        let index = available.first().copied().unwrap_or(0);
        fields.get(index).map_or(0, |field| field.metadata.seq_no)
    }
}

impl FrameProcessor for Stacker {
    type Input = StackingInput;
    type Output = StackedFrame;

    fn process(&mut self, input: StackingInput) -> StackedFrame {
        let rescue_enabled = !input.disable_diff_dod;
        let params = &input.video_parameters;

        let first_field = stack_field(
            &input.first_fields,
            params,
            &input.available_sources,
            rescue_enabled,
        );
        let second_field = stack_field(
            &input.second_fields,
            params,
            &input.available_sources,
            rescue_enabled,
        );

        tracing::trace!(
            frame_number = input.frame_number,
            sources = input.available_sources.len(),
            first_drop_outs = first_field.drop_outs.len(),
            second_drop_outs = second_field.drop_outs.len(),
            "Stacked frame"
        );

        StackedFrame {
            frame_number: input.frame_number,
            first_field_seq_no: Self::seq_no(&input.first_fields, &input.available_sources),
            second_field_seq_no: Self::seq_no(&input.second_fields, &input.available_sources),
            first_field,
            second_field,
            reverse_field_order: input.reverse_field_order,
        }
    }
}

/// Stacks every frame of `pool` on `threads` workers.
pub fn run_stacker<P>(threads: usize, pool: &P, abort: &AbortFlag) -> Result<RunSummary>
where
    P: FramePool<Input = StackingInput, Output = StackedFrame>,
{
    run_workers(threads, pool, abort, |_| Stacker)
}
