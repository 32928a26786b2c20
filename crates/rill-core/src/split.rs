//! Splits and the concurrent queue of not-yet-started splits

use std::collections::VecDeque;
use std::fmt;
use std::sync::Mutex;

/// An immutable unit of input data assigned to exactly one reader instance.
///
/// Splits carry no mutable state; identity is by value. A split is enqueued
/// once, dequeued once when its read begins, and never re-enqueued.
pub trait SourceSplit: fmt::Debug + Clone + Send + 'static {
    /// Stable identifier used in log lines and error context
    fn split_id(&self) -> String;
}

/// Queue of splits assigned to a reader but not yet started.
///
/// Three actors touch it concurrently: the assignment producer appends, the
/// poll loop takes, and the checkpoint caller snapshots. All three go through
/// one internal lock, so a snapshot is a consistent point-in-time view:
/// never missing a split that was resident throughout the call, never
/// duplicating one.
pub struct SplitQueue<S> {
    inner: Mutex<VecDeque<S>>,
}

impl<S: Clone> SplitQueue<S> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(VecDeque::new()),
        }
    }

    /// Append splits in argument order. Splits from one call are never
    /// reordered relative to each other.
    pub fn append(&self, splits: impl IntoIterator<Item = S>) {
        self.inner.lock().unwrap().extend(splits);
    }

    /// Remove and return the longest-resident split, if any. O(1).
    pub fn take_one(&self) -> Option<S> {
        self.inner.lock().unwrap().pop_front()
    }

    /// Every split currently resident, oldest first, without removing any.
    pub fn snapshot(&self) -> Vec<S> {
        self.inner.lock().unwrap().iter().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }
}

impl<S: Clone> Default for SplitQueue<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn take_from_empty() {
        let q: SplitQueue<u32> = SplitQueue::new();
        assert!(q.is_empty());
        assert_eq!(q.take_one(), None);
    }

    #[test]
    fn fifo_within_append() {
        let q = SplitQueue::new();
        q.append([1, 2, 3]);
        assert_eq!(q.len(), 3);
        assert_eq!(q.take_one(), Some(1));
        assert_eq!(q.take_one(), Some(2));
        assert_eq!(q.take_one(), Some(3));
        assert_eq!(q.take_one(), None);
    }

    #[test]
    fn earlier_appends_first() {
        let q = SplitQueue::new();
        q.append([1, 2]);
        q.append([3]);
        assert_eq!(q.take_one(), Some(1));
        assert_eq!(q.take_one(), Some(2));
        assert_eq!(q.take_one(), Some(3));
    }

    #[test]
    fn snapshot_leaves_queue_intact() {
        let q = SplitQueue::new();
        q.append([1, 2]);
        assert_eq!(q.snapshot(), vec![1, 2]);
        assert_eq!(q.len(), 2);
        assert_eq!(q.take_one(), Some(1));
    }

    #[test]
    fn snapshot_excludes_taken() {
        let q = SplitQueue::new();
        q.append([1, 2, 3]);
        q.take_one();
        assert_eq!(q.snapshot(), vec![2, 3]);
    }

    #[test]
    fn concurrent_append_and_take_loses_nothing() {
        let q = Arc::new(SplitQueue::new());
        let producer = {
            let q = Arc::clone(&q);
            std::thread::spawn(move || {
                for batch in 0..100u32 {
                    q.append([batch * 2, batch * 2 + 1]);
                }
            })
        };
        let mut taken = Vec::new();
        while taken.len() < 200 {
            if let Some(v) = q.take_one() {
                taken.push(v);
            }
        }
        producer.join().unwrap();
        assert!(q.is_empty());
        taken.sort_unstable();
        assert_eq!(taken, (0..200u32).collect::<Vec<_>>());
    }

    #[test]
    fn concurrent_snapshot_never_duplicates() {
        let q = Arc::new(SplitQueue::new());
        q.append(0..1000u32);
        let snapshotter = {
            let q = Arc::clone(&q);
            std::thread::spawn(move || {
                let mut views = Vec::new();
                for _ in 0..50 {
                    views.push(q.snapshot());
                }
                views
            })
        };
        while q.take_one().is_some() {}
        for view in snapshotter.join().unwrap() {
            // each view is a contiguous suffix of the original sequence
            let mut sorted = view.clone();
            sorted.sort_unstable();
            assert_eq!(view, sorted);
            sorted.dedup();
            assert_eq!(view.len(), sorted.len());
        }
    }
}
