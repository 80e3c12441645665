//! Worker threads pulling frames from a shared pool.
//!
//! Each worker repeatedly takes one unit of work from a [`FramePool`],
//! processes it to completion and hands the result back. Workers share
//! nothing but the pool and an [`AbortFlag`]; ordering of the final output
//! is the pool's job.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use strum_macros::Display;

use crate::error::{Error, Result};

/// Process-wide cancellation flag shared by all workers of a run.
#[derive(Debug, Clone, Default)]
pub struct AbortFlag(Arc<AtomicBool>);

impl AbortFlag {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    #[inline]
    pub fn set(&self) {
        self.0.store(true, Ordering::Release);
    }
}

/// Thread-safe supplier of input frames and collector of results.
pub trait FramePool: Sync {
    type Input: Send;
    type Output: Send;

    /// Next unit of work, or `None` once the input is exhausted.
    fn get_input_frame(&self) -> Option<Self::Input>;

    /// Hands a result back. An error is fatal for the whole run.
    fn put_output_frame(&self, output: Self::Output) -> Result<()>;
}

/// Turns one unit of work into one result.
pub trait FrameProcessor {
    type Input;
    type Output;

    fn process(&mut self, input: Self::Input) -> Self::Output;
}

/// Why a worker left its loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum StopReason {
    /// The pool had no more input.
    Exhausted,
    /// Another worker, or the caller, raised the abort flag.
    Aborted,
}

/// Raises the abort flag when dropped during a panic, so the other workers
/// stop claiming frames that can no longer be written in order.
struct AbortOnPanic<'a>(&'a AbortFlag);

impl Drop for AbortOnPanic<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.0.set();
        }
    }
}

/// One worker: pulls from `pool` until it runs dry, fails, or is aborted.
pub struct WorkerThread<'a, P, F> {
    pool: &'a P,
    abort: &'a AbortFlag,
    processor: F,
    frames_processed: usize,
}

impl<'a, P, F> WorkerThread<'a, P, F>
where
    P: FramePool,
    F: FrameProcessor<Input = P::Input, Output = P::Output>,
{
    pub fn new(pool: &'a P, abort: &'a AbortFlag, processor: F) -> Self {
        Self {
            pool,
            abort,
            processor,
            frames_processed: 0,
        }
    }

    pub fn frames_processed(&self) -> usize {
        self.frames_processed
    }

    /// Runs until stopped. An output failure raises the abort flag and is
    /// returned; results already submitted stay submitted. A panicking
    /// processor raises the flag too before the panic propagates.
    pub fn run(&mut self) -> Result<StopReason> {
        let _guard = AbortOnPanic(self.abort);

        loop {
            if self.abort.is_set() {
                return Ok(StopReason::Aborted);
            }

            let Some(input) = self.pool.get_input_frame() else {
                return Ok(StopReason::Exhausted);
            };

            let output = self.processor.process(input);

            if let Err(err) = self.pool.put_output_frame(output) {
                self.abort.set();
                tracing::error!("Output failed, aborting run: {}", err);
                return Err(err);
            }

            self.frames_processed += 1;
        }
    }
}

/// Outcome of a completed [`run_workers`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub frames_processed: usize,
    pub stop_reasons: Vec<StopReason>,
}

impl RunSummary {
    pub fn aborted(&self) -> bool {
        self.stop_reasons.contains(&StopReason::Aborted)
    }
}

/// Runs `threads` workers on a dedicated thread pool until the input is
/// exhausted or the run is aborted.
///
/// `make_processor` is called once per worker with the worker index. The
/// first output error of any worker is returned.
pub fn run_workers<P, F, M>(
    threads: usize,
    pool: &P,
    abort: &AbortFlag,
    make_processor: M,
) -> Result<RunSummary>
where
    P: FramePool,
    F: FrameProcessor<Input = P::Input, Output = P::Output>,
    M: Fn(usize) -> F + Sync,
{
    if threads == 0 {
        return Err(Error::NoThreads);
    }

    let thread_pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|index| format!("ldproc-worker-{index}"))
        .build()?;

    let outcomes: Mutex<Vec<(usize, Result<StopReason>)>> =
        Mutex::new(Vec::with_capacity(threads));

    thread_pool.scope(|scope| {
        for index in 0..threads {
            let outcomes = &outcomes;
            let make_processor = &make_processor;
            scope.spawn(move |_| {
                tracing::debug!(worker = index, "Worker started");
                let mut worker = WorkerThread::new(pool, abort, make_processor(index));
                let result = worker.run();
                tracing::debug!(
                    worker = index,
                    frames = worker.frames_processed(),
                    "Worker stopped"
                );
                outcomes.lock().push((worker.frames_processed(), result));
            });
        }
    });

    let mut summary = RunSummary {
        frames_processed: 0,
        stop_reasons: Vec::with_capacity(threads),
    };
    let mut first_error = None;

    for (frames, result) in outcomes.into_inner() {
        summary.frames_processed += frames;
        match result {
            Ok(reason) => summary.stop_reasons.push(reason),
            Err(err) => {
                if first_error.is_none() {
                    first_error = Some(err);
                }
            }
        }
    }

    if let Some(err) = first_error {
        return Err(err);
    }

    tracing::info!(
        frames = summary.frames_processed,
        workers = threads,
        aborted = summary.aborted(),
        "Run finished"
    );

    Ok(summary)
}
