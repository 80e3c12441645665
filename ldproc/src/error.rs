//! Error types for configuration and frame pipeline faults.
//!
//! Per-pixel statistical edge cases (no sources, no valid samples, an empty
//! rescue) are never errors; they resolve to defined fallbacks in the
//! stacking engine.

use thiserror::Error;

/// Errors that can occur before or during a pipeline run.
#[derive(Debug, Error)]
pub enum Error {
    #[error("This decoder is for PAL video sources only")]
    NotPal,

    #[error("Invalid video geometry: {0}")]
    InvalidGeometry(String),

    #[error("At least one worker thread is required")]
    NoThreads,

    #[error("Failed to build worker thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Output rejected frame {frame_number}: {reason}")]
    OutputRejected { frame_number: i32, reason: String },

    #[error("Output incomplete: {written} frames written, {pending} results pending, {missing} never returned")]
    IncompleteOutput {
        written: usize,
        pending: usize,
        missing: usize,
    },

    #[error("Failed to load configuration: {0}")]
    Config(#[from] common::SerdeFormatError),
}

pub type Result<T> = std::result::Result<T, Error>;
