//! Poll-driven source reader
//!
//! One reader instance serves three independently-timed callers: the split
//! assignment producer ([`add_splits`](SourceReader::add_splits) /
//! [`handle_no_more_splits`](SourceReader::handle_no_more_splits)), a single
//! driving loop calling [`poll_next`](SourceReader::poll_next) repeatedly,
//! and the checkpoint coordinator calling
//! [`snapshot_state`](SourceReader::snapshot_state) at arbitrary times.
//!
//! The internal state lock doubles as the checkpoint-exclusion lock: it is
//! held for a whole poll cycle, backoff sleep included, so a checkpoint can
//! never observe the queue while a split is mid-emission. The checkpointed
//! split list is therefore always consistent with exactly the rows already
//! emitted.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::collect::Collector;
use crate::error::ReadError;
use crate::row::RowConverter;
use crate::shutdown::ShutdownFlag;
use crate::source::{RecordSource, RecordStream};
use crate::split::{SourceSplit, SplitQueue};

/// Default idle backoff, matching one poll per second when starved
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(1);

/// Granularity at which the backoff sleep re-checks the shutdown flag
const BACKOFF_SLICE: Duration = Duration::from_millis(50);

/// Where the reader is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderPhase {
    /// No split started yet, assignment ongoing
    Idle,
    /// Draining one split
    Reading,
    /// Queue empty, assignment ongoing, backing off
    Waiting,
    /// Terminal: assignment finished and the queue is permanently empty
    Complete,
}

/// What one `poll_next` cycle did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Drained one split to exhaustion
    Read { split_id: String, rows: usize },
    /// Queue empty, assignment ongoing; slept the backoff interval
    Waiting,
    /// Terminal state reached (idempotent on repeated polls)
    Complete,
}

/// Reader tuning knobs
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Sleep inserted when the queue is empty and assignment is ongoing
    pub backoff: Duration,
    /// Cuts the backoff sleep short when set
    pub shutdown: ShutdownFlag,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            backoff: DEFAULT_BACKOFF,
            shutdown: ShutdownFlag::new(),
        }
    }
}

struct ReaderState {
    phase: ReaderPhase,
    end_signaled: bool,
}

/// Per-task streaming source reader.
///
/// Generic over the split type, the record-stream adapter that opens one
/// split, and the converter that maps the adapter's raw records into
/// canonical rows.
pub struct SourceReader<S, Src, Cv> {
    splits: SplitQueue<S>,
    source: Src,
    converter: Cv,
    assignment_done: AtomicBool,
    // checkpoint-exclusion lock; held for full poll cycles
    state: Mutex<ReaderState>,
    backoff: Duration,
    shutdown: ShutdownFlag,
}

impl<S, Src, Cv> SourceReader<S, Src, Cv>
where
    S: SourceSplit,
    Src: RecordSource<S>,
    Cv: RowConverter<Raw = <Src::Stream as RecordStream>::Raw>,
{
    pub fn new(source: Src, converter: Cv, config: ReaderConfig) -> Self {
        Self {
            splits: SplitQueue::new(),
            source,
            converter,
            assignment_done: AtomicBool::new(false),
            state: Mutex::new(ReaderState {
                phase: ReaderPhase::Idle,
                end_signaled: false,
            }),
            backoff: config.backoff,
            shutdown: config.shutdown,
        }
    }

    /// Bracket the reader's lifetime. No resources are held by default.
    pub fn open(&self) {
        log::debug!("source reader opened");
    }

    pub fn close(&self) {
        log::debug!("source reader closed");
    }

    /// Enqueue newly assigned splits. Callable at any time, including while
    /// a poll cycle is in flight: appends are strictly additive and do not
    /// need the checkpoint lock.
    pub fn add_splits(&self, splits: Vec<S>) {
        log::debug!("{} splits assigned", splits.len());
        self.splits.append(splits);
    }

    /// The assignment producer is done; no further `add_splits` will come.
    /// Monotonic and idempotent.
    pub fn handle_no_more_splits(&self) {
        log::debug!("assignment complete");
        self.assignment_done.store(true, Ordering::Release);
    }

    /// Current lifecycle phase (last branch a poll cycle took)
    pub fn phase(&self) -> ReaderPhase {
        self.state.lock().unwrap().phase
    }

    /// Splits not yet started, for the engine to persist as recoverable
    /// state. Takes the checkpoint-exclusion lock, so it serialises behind
    /// an in-flight poll cycle and never observes a half-emitted split.
    pub fn snapshot_state(&self, checkpoint_id: u64) -> Vec<S> {
        let _cycle = self.state.lock().unwrap();
        let pending = self.splits.snapshot();
        log::debug!("checkpoint {checkpoint_id}: {} splits pending", pending.len());
        pending
    }

    /// Hook for post-checkpoint cleanup; nothing to discard here.
    pub fn notify_checkpoint_complete(&self, checkpoint_id: u64) {
        log::debug!("checkpoint {checkpoint_id} is durable");
    }

    /// One poll cycle. Invoke repeatedly from a single driving loop until it
    /// returns [`PollOutcome::Complete`].
    ///
    /// Takes at most one split from the queue and drains it fully into
    /// `out`, in stream order, closing the stream on every exit path. With
    /// an empty queue the cycle either signals end-of-stream (assignment
    /// done; signalled exactly once per reader lifetime) or sleeps the
    /// backoff interval. Errors propagate to the caller for job-level
    /// escalation; the failed split is abandoned, never retried here.
    pub fn poll_next(&self, out: &mut impl Collector) -> Result<PollOutcome, ReadError> {
        let mut state = self.state.lock().unwrap();
        if let Some(split) = self.splits.take_one() {
            state.phase = ReaderPhase::Reading;
            let rows = self.drain_split(&split, out)?;
            Ok(PollOutcome::Read {
                split_id: split.split_id(),
                rows,
            })
        } else if self.assignment_done.load(Ordering::Acquire) && self.splits.is_empty() {
            state.phase = ReaderPhase::Complete;
            if !state.end_signaled {
                state.end_signaled = true;
                log::info!("all assigned splits read, signalling end of stream");
                out.signal_end_of_stream();
            }
            Ok(PollOutcome::Complete)
        } else {
            state.phase = ReaderPhase::Waiting;
            log::debug!("no split ready, backing off {:?}", self.backoff);
            self.backoff_sleep();
            Ok(PollOutcome::Waiting)
        }
    }

    fn drain_split(&self, split: &S, out: &mut impl Collector) -> Result<usize, ReadError> {
        let id = split.split_id();
        let started = Instant::now();
        log::debug!("reading split {id}");

        let mut stream = self.source.open(split).map_err(|e| ReadError::Open {
            split: id.clone(),
            source: e,
        })?;
        let emitted = self.emit_records(&id, &mut stream, out);
        let closed = stream.close();

        let rows = emitted?;
        closed.map_err(|e| ReadError::Close {
            split: id.clone(),
            source: e,
        })?;

        log::info!(
            "split {id}: {rows} rows in {:.2}s",
            started.elapsed().as_secs_f64()
        );
        Ok(rows)
    }

    fn emit_records(
        &self,
        id: &str,
        stream: &mut Src::Stream,
        out: &mut impl Collector,
    ) -> Result<usize, ReadError> {
        let mut rows = 0usize;
        loop {
            let raw = stream.next_record().map_err(|e| ReadError::Record {
                split: id.to_string(),
                source: e,
            })?;
            let Some(raw) = raw else { break };
            let row = self.converter.convert(raw).map_err(|e| ReadError::Convert {
                split: id.to_string(),
                source: e,
            })?;
            out.collect(row);
            rows += 1;
        }
        Ok(rows)
    }

    fn backoff_sleep(&self) {
        let deadline = Instant::now() + self.backoff;
        while !self.shutdown.requested() {
            let left = deadline.saturating_duration_since(Instant::now());
            if left.is_zero() {
                break;
            }
            std::thread::sleep(left.min(BACKOFF_SLICE));
        }
    }
}
