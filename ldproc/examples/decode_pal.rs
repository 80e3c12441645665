//! Example: run the PAL frame pipeline on synthetic fields
//!
//! Generates a short sequence of PAL field pairs with a moving bar, decodes
//! them with the luma-only decoder on a worker pool and writes a summary of
//! every cropped frame.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example decode_pal [config.yaml]
//! ```

use std::time::Instant;

use anyhow::Context;
use common::log_setup::setup_logging;
use ldproc::pool::FnSink;
use ldproc::{
    AbortFlag, DecodeInput, DecodedFrame, Field, LumaDecoder, OrderedPool, PalDecoder,
    ProcessConfig, VideoParameters,
};

const FRAMES: i32 = 12;

fn main() -> anyhow::Result<()> {
    setup_logging("info");

    let config = match std::env::args().nth(1) {
        Some(path) => ProcessConfig::from_file(&path).with_context(|| format!("loading {path}"))?,
        None => ProcessConfig::default(),
    };
    let params = VideoParameters::pal();
    let decoder = PalDecoder::configure(&params, config.black_and_white)?;

    let inputs = (0..FRAMES).map(|frame_number| {
        DecodeInput::from_fields(
            frame_number,
            bar_field(&params, frame_number, frame_number * 2),
            bar_field(&params, frame_number, frame_number * 2 + 1),
            config.reverse_field_order,
        )
    });

    let sink = FnSink(|frame: DecodedFrame| -> ldproc::Result<()> {
        let mean = frame.rgb.iter().map(|px| px[0] as u64).sum::<u64>() / frame.rgb.len() as u64;
        println!(
            "frame {:>2}: {} x {}, mean level {}",
            frame.frame_number,
            frame.rgb.width(),
            frame.rgb.height(),
            mean
        );
        Ok(())
    });
    let pool: OrderedPool<DecodeInput, DecodedFrame, _> = OrderedPool::new(inputs, sink);

    let start = Instant::now();
    let summary = decoder.run(config.threads, &pool, &AbortFlag::new(), |_| {
        LumaDecoder::new()
    })?;
    pool.finish()?;

    tracing::info!(
        frames = summary.frames_processed,
        threads = config.threads,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Decoding complete"
    );

    Ok(())
}

/// Black field with a white vertical bar that moves with the frame number.
fn bar_field(params: &VideoParameters, frame_number: i32, seq_no: i32) -> Field {
    let mut field = Field::blank(params, params.black_16b_ire);
    field.metadata.seq_no = seq_no;
    field.metadata.median_burst_ire = 20.0;

    let bar_start = params.active_video_start + frame_number as usize * 60;
    let bar_end = (bar_start + 60).min(params.active_video_end);
    for line in field.samples.rows_mut() {
        line[bar_start..bar_end].fill(params.white_16b_ire);
    }
    field
}
