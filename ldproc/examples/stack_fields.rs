//! Example: stack synthetic captures of one disc
//!
//! Builds four noisy captures of the same PAL fields, marks random dropout
//! runs on each, and stacks them on a worker pool. Prints how many dropouts
//! survive per frame.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example stack_fields [config.yaml]
//! ```

use std::time::Instant;

use anyhow::Context;
use common::buffer2::Buffer2;
use common::log_setup::setup_logging;
use ldproc::stacking::run_stacker;
use ldproc::{
    AbortFlag, Field, FieldMetadata, OrderedPool, ProcessConfig, Sample, StackedFrame,
    StackingInput, VecSink, VideoParameters,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const SOURCES: usize = 4;
const FRAMES: i32 = 8;

fn main() -> anyhow::Result<()> {
    setup_logging("info");

    let config = match std::env::args().nth(1) {
        Some(path) => ProcessConfig::from_file(&path).with_context(|| format!("loading {path}"))?,
        None => ProcessConfig::default(),
    };
    let params = VideoParameters::pal();
    let mut rng = StdRng::seed_from_u64(0x1D);

    let inputs: Vec<StackingInput> = (0..FRAMES)
        .map(|frame_number| StackingInput {
            frame_number,
            first_fields: captures(&mut rng, &params, frame_number * 2),
            second_fields: captures(&mut rng, &params, frame_number * 2 + 1),
            video_parameters: params,
            reverse_field_order: config.reverse_field_order,
            disable_diff_dod: config.disable_diff_dod,
            available_sources: (0..SOURCES).collect(),
        })
        .collect();
    let pool: OrderedPool<StackingInput, StackedFrame, _> =
        OrderedPool::new(inputs, VecSink::default());

    let start = Instant::now();
    let summary = run_stacker(config.threads, &pool, &AbortFlag::new())?;
    let frames = pool.finish()?.frames;

    tracing::info!(
        frames = summary.frames_processed,
        threads = config.threads,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Stacking complete"
    );
    for frame in &frames {
        println!(
            "frame {:>2}: fields {}/{}, dropouts left {} + {}",
            frame.frame_number,
            frame.first_field_seq_no,
            frame.second_field_seq_no,
            frame.first_field.drop_outs.len(),
            frame.second_field.drop_outs.len()
        );
    }

    Ok(())
}

/// One field as seen by every capture: shared picture, per-capture noise and
/// a few dropout runs where the capture reads garbage.
fn captures(rng: &mut StdRng, params: &VideoParameters, seq_no: i32) -> Vec<Field> {
    let level = |x: usize, y: usize| -> Sample {
        let ramp = (x * 0x8000 / params.field_width) as Sample;
        params.black_16b_ire + ramp + (y as Sample % 64) * 16
    };

    (0..SOURCES)
        .map(|_| {
            let mut samples = Buffer2::new_default(params.field_width, params.field_height);
            for y in 0..params.field_height {
                for x in 0..params.field_width {
                    let noise: i32 = rng.random_range(-64..=64);
                    samples[(x, y)] = (level(x, y) as i32 + noise).clamp(0, 0xFFFF) as Sample;
                }
            }

            let mut metadata = FieldMetadata {
                seq_no,
                ..FieldMetadata::default()
            };
            for _ in 0..rng.random_range(0..6) {
                let line = rng.random_range(0..params.field_height);
                let start = rng.random_range(params.active_video_start..params.active_video_end - 40);
                let end = start + rng.random_range(4..40);
                for x in start..=end {
                    samples[(x, line)] = rng.random();
                }
                metadata.drop_outs.append(start, end, line + 1);
            }

            Field::new(samples, metadata)
        })
        .collect()
}
