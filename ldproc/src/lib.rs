//! Laserdisc capture processing.
//!
//! Two frame pipelines share one worker model:
//!
//! * [`stacking`] fuses several captures of the same disc into one field pair
//!   per frame, taking the per-pixel median of clean samples and rescuing
//!   pixels that every capture flagged as a dropout.
//! * [`pal`] sizes the visible PAL picture, runs a [`decoder::ColourDecoder`]
//!   on each frame and crops the result.
//!
//! Both run on [`worker::run_workers`], pulling frames from a
//! [`worker::FramePool`]. [`pool::OrderedPool`] restores input order on
//! output.

pub mod config;
pub mod decoder;
pub mod dropouts;
pub mod error;
pub mod pal;
pub mod pool;
pub mod stacking;
pub mod video;
pub mod worker;

pub use config::ProcessConfig;
pub use decoder::{ColourDecoder, LumaDecoder, RgbFrame};
pub use dropouts::{DropOut, DropOuts};
pub use error::{Error, Result};
pub use pal::{DecodeInput, DecodedFrame, PalConfig, PalDecoder};
pub use pool::{FrameSink, Numbered, OrderedPool, VecSink};
pub use stacking::{run_stacker, StackedField, StackedFrame, Stacker, StackingInput};
pub use video::{Field, FieldMetadata, Sample, VideoParameters};
pub use worker::{run_workers, AbortFlag, FramePool, FrameProcessor, RunSummary};
