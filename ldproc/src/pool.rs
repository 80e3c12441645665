//! In-memory frame pool that restores input order on output.
//!
//! Inputs are handed out front to back. Results may come back in any order;
//! they are held until every earlier frame has been written, then passed to
//! the [`FrameSink`] in hand-out order.

use std::collections::{BTreeMap, VecDeque};

use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::worker::FramePool;

/// Anything carrying a frame number.
pub trait Numbered {
    fn frame_number(&self) -> i32;
}

/// Destination of ordered results.
pub trait FrameSink<O>: Send {
    fn write_frame(&mut self, frame: O) -> Result<()>;
}

/// Collects frames in memory.
#[derive(Debug)]
pub struct VecSink<O> {
    pub frames: Vec<O>,
}

impl<O> Default for VecSink<O> {
    fn default() -> Self {
        Self { frames: Vec::new() }
    }
}

impl<O: Send> FrameSink<O> for VecSink<O> {
    fn write_frame(&mut self, frame: O) -> Result<()> {
        self.frames.push(frame);
        Ok(())
    }
}

/// Adapts a closure into a [`FrameSink`].
pub struct FnSink<F>(pub F);

impl<O, F> FrameSink<O> for FnSink<F>
where
    F: FnMut(O) -> Result<()> + Send,
{
    fn write_frame(&mut self, frame: O) -> Result<()> {
        (self.0)(frame)
    }
}

struct OutputState<O, S> {
    /// Frame numbers handed out and not yet written, in hand-out order.
    expected: VecDeque<i32>,
    pending: BTreeMap<i32, O>,
    sink: S,
    written: usize,
}

/// Order-preserving [`FramePool`] over a queue of inputs.
pub struct OrderedPool<I, O, S> {
    // Lock order: inputs, then output.
    inputs: Mutex<VecDeque<I>>,
    output: Mutex<OutputState<O, S>>,
}

impl<I, O, S> OrderedPool<I, O, S>
where
    I: Numbered,
    O: Numbered,
    S: FrameSink<O>,
{
    pub fn new(inputs: impl IntoIterator<Item = I>, sink: S) -> Self {
        Self {
            inputs: Mutex::new(inputs.into_iter().collect()),
            output: Mutex::new(OutputState {
                expected: VecDeque::new(),
                pending: BTreeMap::new(),
                sink,
                written: 0,
            }),
        }
    }

    /// Frames written to the sink so far.
    pub fn written(&self) -> usize {
        self.output.lock().written
    }

    /// Consumes the pool and returns the sink, failing if any frame was not
    /// written (never handed out, never returned, or stuck behind a gap).
    pub fn finish(self) -> Result<S> {
        let unclaimed = self.inputs.into_inner().len();
        let output = self.output.into_inner();

        let pending = output.pending.len();
        let missing = output.expected.len() - pending + unclaimed;
        if pending > 0 || missing > 0 {
            return Err(Error::IncompleteOutput {
                written: output.written,
                pending,
                missing,
            });
        }

        tracing::debug!(frames = output.written, "Ordered output complete");
        Ok(output.sink)
    }
}

impl<I, O, S> FramePool for OrderedPool<I, O, S>
where
    I: Numbered + Send,
    O: Numbered + Send,
    S: FrameSink<O>,
{
    type Input = I;
    type Output = O;

    fn get_input_frame(&self) -> Option<I> {
        let mut inputs = self.inputs.lock();
        let input = inputs.pop_front()?;
        // Record under the input lock so hand-out order is exact.
        self.output.lock().expected.push_back(input.frame_number());
        Some(input)
    }

    fn put_output_frame(&self, frame: O) -> Result<()> {
        let mut output = self.output.lock();
        let frame_number = frame.frame_number();

        if !output.expected.contains(&frame_number) || output.pending.contains_key(&frame_number) {
            return Err(Error::OutputRejected {
                frame_number,
                reason: "frame was not handed out or was already returned".to_string(),
            });
        }
        output.pending.insert(frame_number, frame);

        let state = &mut *output;
        while let Some(&next) = state.expected.front() {
            let Some(ready) = state.pending.remove(&next) else {
                break;
            };
            // A failed frame stays expected, so finish() counts it as missing.
            state.sink.write_frame(ready)?;
            state.expected.pop_front();
            state.written += 1;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;
    use crate::worker::{run_workers, AbortFlag, FrameProcessor};

    #[derive(Debug, Clone, PartialEq)]
    struct Item(i32);

    impl Numbered for Item {
        fn frame_number(&self) -> i32 {
            self.0
        }
    }

    /// Sleeps a random short time before echoing the input.
    struct Jitter(StdRng);

    impl FrameProcessor for Jitter {
        type Input = Item;
        type Output = Item;

        fn process(&mut self, input: Item) -> Item {
            std::thread::sleep(Duration::from_micros(self.0.random_range(0..300)));
            input
        }
    }

    fn items(range: std::ops::Range<i32>) -> Vec<Item> {
        range.map(Item).collect()
    }

    #[test]
    fn test_out_of_order_results_are_written_in_order() {
        let pool: OrderedPool<Item, Item, _> = OrderedPool::new(items(10..14), VecSink::default());
        let handed: Vec<Item> = std::iter::from_fn(|| pool.get_input_frame()).collect();
        assert_eq!(handed.len(), 4);
        assert!(pool.get_input_frame().is_none());

        pool.put_output_frame(Item(12)).unwrap();
        pool.put_output_frame(Item(11)).unwrap();
        assert_eq!(pool.written(), 0, "frame 10 still outstanding");

        pool.put_output_frame(Item(10)).unwrap();
        assert_eq!(pool.written(), 3);

        pool.put_output_frame(Item(13)).unwrap();
        let sink = pool.finish().unwrap();
        assert_eq!(sink.frames, items(10..14));
    }

    #[test]
    fn test_unknown_or_duplicate_result_is_rejected() {
        let pool: OrderedPool<Item, Item, _> = OrderedPool::new(items(0..3), VecSink::default());
        pool.get_input_frame().unwrap();
        pool.get_input_frame().unwrap();

        assert!(pool.put_output_frame(Item(2)).is_err(), "not handed out yet");
        pool.put_output_frame(Item(1)).unwrap();
        assert!(pool.put_output_frame(Item(1)).is_err(), "already returned");
    }

    #[test]
    fn test_finish_reports_gaps() {
        let pool: OrderedPool<Item, Item, _> = OrderedPool::new(items(0..5), VecSink::default());
        for _ in 0..3 {
            pool.get_input_frame().unwrap();
        }
        pool.put_output_frame(Item(0)).unwrap();
        pool.put_output_frame(Item(2)).unwrap();

        match pool.finish() {
            Err(Error::IncompleteOutput {
                written,
                pending,
                missing,
            }) => {
                assert_eq!(written, 1);
                assert_eq!(pending, 1);
                // frame 1 never returned, frames 3 and 4 never claimed
                assert_eq!(missing, 3);
            }
            other => panic!("expected IncompleteOutput, got {:?}", other.map(|s| s.frames)),
        }
    }

    #[test]
    fn test_sink_failure_is_returned() {
        let sink = FnSink(|frame: Item| {
            if frame.0 == 1 {
                Err(Error::OutputRejected {
                    frame_number: frame.0,
                    reason: "write failed".to_string(),
                })
            } else {
                Ok(())
            }
        });
        let pool: OrderedPool<Item, Item, _> = OrderedPool::new(items(0..3), sink);
        for _ in 0..3 {
            pool.get_input_frame().unwrap();
        }

        pool.put_output_frame(Item(0)).unwrap();
        let err = pool.put_output_frame(Item(1)).unwrap_err();
        assert!(matches!(err, Error::OutputRejected { frame_number: 1, .. }));
    }

    #[test]
    fn test_parallel_workers_keep_input_order() {
        let pool: OrderedPool<Item, Item, _> = OrderedPool::new(items(100..400), VecSink::default());
        let abort = AbortFlag::new();

        let summary = run_workers(6, &pool, &abort, |index| {
            Jitter(StdRng::seed_from_u64(index as u64))
        })
        .unwrap();

        assert_eq!(summary.frames_processed, 300);
        let sink = pool.finish().unwrap();
        assert_eq!(sink.frames, items(100..400));
    }

    #[test]
    fn test_sink_failure_aborts_parallel_run() {
        let sink = FnSink(|frame: Item| {
            if frame.0 == 50 {
                Err(Error::OutputRejected {
                    frame_number: 50,
                    reason: "disk full".to_string(),
                })
            } else {
                Ok(())
            }
        });
        let pool: OrderedPool<Item, Item, _> = OrderedPool::new(items(0..1000), sink);
        let abort = AbortFlag::new();

        let err = run_workers(4, &pool, &abort, |index| {
            Jitter(StdRng::seed_from_u64(index as u64))
        })
        .unwrap_err();

        assert!(matches!(err, Error::OutputRejected { .. }));
        assert!(abort.is_set());
        assert!(pool.written() >= 50);
        assert!(matches!(
            pool.finish(),
            Err(Error::IncompleteOutput { .. })
        ));
    }
}
