//! The parallel match pipeline: candidate sources, worker threads, and
//! ordered emission.
//!
//! Exactly `nr_threads` workers pull batches from a shared [`Source`], run
//! a thread-local [`Matcher`] over each candidate, and keep their own
//! bounded heap of the best matches seen. When the source is exhausted the
//! per-worker sets are merged, partially sorted to the limit, optionally
//! rescored for match positions, and handed to the sink in rank order.

use std::collections::BinaryHeap;
use std::sync::Mutex;
use std::thread;

use crossbeam_channel::Receiver;

use crate::matcher::Matcher;
use crate::options::MatchOptions;
use crate::score::{sort_limit, Matched};
use crate::{MatchError, MatchInfo, MatchItem};

/// Batch size used by the built-in source adapters.
pub const DEFAULT_BATCH_SIZE: usize = 512;

/// Error type producible by a [`Source`].
pub type SourceError = Box<dyn std::error::Error + Send + Sync>;

/// A concurrent supplier of candidate items.
///
/// `fill` appends zero or more items to `batch` and returns `true` iff it
/// may yield more later. It is called from every worker thread, so
/// implementations serialize internally (typically with a mutex).
pub trait Source<T>: Sync {
    fn fill(&self, batch: &mut Vec<T>) -> Result<bool, SourceError>;

    /// Upper bound on the number of items appended per `fill` call; workers
    /// size their batch buffers from this.
    fn batch_size(&self) -> usize {
        DEFAULT_BATCH_SIZE
    }
}

/// Source over any iterator, serialized by a mutex and batched in blocks of
/// [`DEFAULT_BATCH_SIZE`].
pub struct IterSource<I> {
    iter: Mutex<I>,
    batch_size: usize,
}

impl<I> IterSource<I> {
    pub fn new(iter: I) -> Self {
        Self {
            iter: Mutex::new(iter),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }
}

impl<T, I> Source<T> for IterSource<I>
where
    I: Iterator<Item = T> + Send,
{
    fn fill(&self, batch: &mut Vec<T>) -> Result<bool, SourceError> {
        let mut iter = self.iter.lock().unwrap_or_else(|e| e.into_inner());
        for _ in 0..self.batch_size {
            match iter.next() {
                Some(item) => batch.push(item),
                None => return Ok(false),
            }
        }
        Ok(true)
    }

    fn batch_size(&self) -> usize {
        self.batch_size
    }
}

/// Source over a slice of already-collected candidates, handed out in
/// `batch_size`-sized chunks behind a mutexed cursor. Items are cloned into
/// the batch; the slice itself is never consumed.
pub struct SliceSource<'a, T> {
    items: &'a [T],
    cursor: Mutex<usize>,
    batch_size: usize,
}

impl<'a, T> SliceSource<'a, T> {
    pub fn new(items: &'a [T]) -> Self {
        Self {
            items,
            cursor: Mutex::new(0),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }
}

impl<T> Source<T> for SliceSource<'_, T>
where
    T: Clone + Send + Sync,
{
    fn fill(&self, batch: &mut Vec<T>) -> Result<bool, SourceError> {
        let mut cursor = self.cursor.lock().unwrap_or_else(|e| e.into_inner());
        let end = (*cursor + self.batch_size).min(self.items.len());
        batch.extend_from_slice(&self.items[*cursor..end]);
        *cursor = end;
        Ok(end < self.items.len())
    }

    fn batch_size(&self) -> usize {
        self.batch_size
    }
}

/// Source fed by a `crossbeam_channel` receiver, for callers that stream
/// candidates in from another thread. Ends when all senders are dropped.
pub struct ReceiverSource<T> {
    rx: Receiver<T>,
    batch_size: usize,
}

impl<T> ReceiverSource<T> {
    pub fn new(rx: Receiver<T>) -> Self {
        Self {
            rx,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl<T: Send> Source<T> for ReceiverSource<T> {
    fn fill(&self, batch: &mut Vec<T>) -> Result<bool, SourceError> {
        // Block for one item so workers do not spin on a quiet channel,
        // then drain whatever else is already queued.
        match self.rx.recv() {
            Ok(item) => {
                batch.push(item);
                while batch.len() < self.batch_size {
                    match self.rx.try_recv() {
                        Ok(item) => batch.push(item),
                        Err(_) => break,
                    }
                }
                Ok(true)
            }
            Err(_) => Ok(false),
        }
    }

    fn batch_size(&self) -> usize {
        self.batch_size
    }
}

pub(crate) fn run<T, S, F>(query: &[u8], opts: &MatchOptions, source: &S, mut sink: F) -> Result<(), MatchError>
where
    T: MatchItem,
    S: Source<T> + ?Sized,
    F: FnMut(T, Option<MatchInfo<'_>>),
{
    debug!(
        "matching with {} thread(s), limit {}, want_match_info {}",
        opts.nr_threads, opts.limit, opts.want_match_info
    );

    let worker_results: Vec<Result<Vec<Matched<T>>, MatchError>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..opts.nr_threads)
            .map(|worker| scope.spawn(move || worker_loop(query, opts, source, worker)))
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("matcher worker panicked"))
            .collect()
    });

    // Merge after every worker has finished; the first captured error wins,
    // and no partial result is emitted.
    let mut all: Vec<Matched<T>> = Vec::new();
    let mut first_error = None;
    for result in worker_results {
        match result {
            Ok(mut matches) => all.append(&mut matches),
            Err(e) if first_error.is_none() => first_error = Some(e),
            Err(_) => {}
        }
    }
    if let Some(e) = first_error {
        return Err(e);
    }

    trace!("{} candidate(s) matched overall", all.len());
    sort_limit(&mut all, opts.limit);

    if opts.want_match_info {
        let mut matcher = Matcher::new(query, opts).record_match_positions(true);
        for matched in all {
            if !matcher.match_item(matched.item.match_key()) {
                return Err(MatchError::Rematch(
                    String::from_utf8_lossy(matched.item.match_key()).into_owned(),
                ));
            }
            sink(matched.item, Some(MatchInfo::new(&matcher)));
        }
    } else {
        for matched in all {
            sink(matched.item, None);
        }
    }
    Ok(())
}

fn worker_loop<T, S>(
    query: &[u8],
    opts: &MatchOptions,
    source: &S,
    worker: usize,
) -> Result<Vec<Matched<T>>, MatchError>
where
    T: MatchItem,
    S: Source<T> + ?Sized,
{
    let mut matcher = Matcher::new(query, opts);
    let limit = opts.limit;
    let mut batch: Vec<T> = Vec::with_capacity(source.batch_size());
    // With a limit, each worker retains at most `limit` matches in a heap
    // ordered worst-first; memory stays O(nr_threads * limit).
    let mut heap: BinaryHeap<Matched<T>> =
        BinaryHeap::with_capacity(if limit != 0 { limit + 1 } else { 0 });
    let mut matches: Vec<Matched<T>> = Vec::new();
    let mut processed = 0usize;

    loop {
        let more = source.fill(&mut batch).map_err(MatchError::Source)?;
        processed += batch.len();
        for item in batch.drain(..) {
            if matcher.match_item(item.match_key()) {
                let matched = Matched::new(matcher.score(), item);
                if limit != 0 {
                    heap.push(matched);
                    if heap.len() > limit {
                        heap.pop();
                    }
                } else {
                    matches.push(matched);
                }
            }
        }
        if !more {
            break;
        }
    }

    if limit != 0 {
        matches = heap.into_vec();
    }
    trace!("worker {worker}: {} of {} candidate(s) matched", matches.len(), processed);
    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::MatchOptionsBuilder;

    fn collect(query: &str, items: Vec<String>, opts: &MatchOptions) -> Vec<String> {
        let source = IterSource::new(items.into_iter());
        let mut out = Vec::new();
        run(query.as_bytes(), opts, &source, |item: String, _info| out.push(item)).unwrap();
        out
    }

    #[test]
    fn emits_in_rank_order() {
        let opts = MatchOptionsBuilder::default().build().unwrap();
        let items: Vec<String> = ["foo/foobar", "fbar", "foo/bar"].iter().map(|s| s.to_string()).collect();
        let out = collect("fb", items, &opts);
        assert_eq!(out, vec!["fbar", "foo/bar", "foo/foobar"]);
    }

    #[test]
    fn deterministic_across_thread_counts() {
        let items: Vec<String> = (0..500)
            .map(|i| format!("dir{}/sub{}/file_{}.rs", i % 7, i % 13, i))
            .collect();
        let mut reference = None;
        for nr_threads in [1usize, 2, 4, 8] {
            let opts = MatchOptionsBuilder::default().nr_threads(nr_threads).build().unwrap();
            let out = collect("file1", items.clone(), &opts);
            assert!(!out.is_empty());
            match &reference {
                None => reference = Some(out),
                Some(expected) => assert_eq!(&out, expected, "nr_threads={nr_threads}"),
            }
        }
    }

    #[test]
    fn limit_is_a_prefix_of_the_full_ranking() {
        let items: Vec<String> = (0..100).map(|i| format!("src/module_{i}/lib.rs")).collect();
        let full = collect(
            "lib",
            items.clone(),
            &MatchOptionsBuilder::default().build().unwrap(),
        );
        for limit in [1usize, 5, 50, 200] {
            let opts = MatchOptionsBuilder::default().limit(limit).nr_threads(3usize).build().unwrap();
            let top = collect("lib", items.clone(), &opts);
            assert_eq!(top.len(), limit.min(full.len()));
            assert_eq!(top[..], full[..top.len()]);
        }
    }

    #[test]
    fn slice_source_chunks_without_consuming() {
        let items: Vec<String> = (0..40).map(|i| format!("src/mod_{i}.rs")).collect();
        let source = SliceSource::new(&items).with_batch_size(16);
        let opts = MatchOptionsBuilder::default().nr_threads(2usize).build().unwrap();
        let mut out = Vec::new();
        run(b"mod", &opts, &source, |item: String, _info| out.push(item)).unwrap();
        assert_eq!(out.len(), items.len());
        // The backing slice is untouched and reusable.
        assert_eq!(items.len(), 40);

        let mut batch = Vec::new();
        let source = SliceSource::new(&items).with_batch_size(16);
        assert!(source.fill(&mut batch).unwrap());
        assert_eq!(batch.len(), 16);
        batch.clear();
        assert!(source.fill(&mut batch).unwrap());
        assert!(!source.fill(&mut batch).unwrap());
        assert_eq!(batch.len(), 24);
    }

    #[test]
    fn receiver_source_streams() {
        let (tx, rx) = crossbeam_channel::unbounded::<String>();
        let sender = std::thread::spawn(move || {
            for i in 0..200 {
                tx.send(format!("stream/file{i}")).unwrap();
            }
        });
        let opts = MatchOptionsBuilder::default().nr_threads(2usize).limit(5usize).build().unwrap();
        let source = ReceiverSource::new(rx);
        let mut out = Vec::new();
        run(b"file1", &opts, &source, |item: String, _| out.push(item)).unwrap();
        sender.join().unwrap();
        assert_eq!(out.len(), 5);
        assert_eq!(out[0], "stream/file1");
    }

    #[test]
    fn source_errors_surface_after_join() {
        struct FailingSource;
        impl Source<String> for FailingSource {
            fn fill(&self, _batch: &mut Vec<String>) -> Result<bool, SourceError> {
                Err("backing store went away".into())
            }
        }
        let opts = MatchOptionsBuilder::default().nr_threads(2usize).build().unwrap();
        let err = run(b"x", &opts, &FailingSource, |_: String, _| {}).unwrap_err();
        assert!(matches!(err, MatchError::Source(_)));
    }

    #[test]
    fn match_info_reaches_the_sink() {
        let opts = MatchOptionsBuilder::default().want_match_info(true).build().unwrap();
        let source = IterSource::new(vec!["foo/bar".to_string()].into_iter());
        let mut seen = Vec::new();
        run(b"fb", &opts, &source, |item: String, info| {
            let info = info.expect("match info requested");
            assert!(info.score() > 0);
            assert!(info.score_debug_string().contains("prefix_score="));
            seen.push((item, info.match_positions().to_vec()));
        })
        .unwrap();
        assert_eq!(seen, vec![("foo/bar".to_string(), vec![0usize, 4])]);
    }

    #[test]
    fn empty_query_ranks_by_sort_key_in_flat_lists() {
        let mut opts = MatchOptionsBuilder::default().build().unwrap();
        opts.path = false;
        let items: Vec<String> = ["c", "a", "b"].iter().map(|s| s.to_string()).collect();
        let out = collect("", items, &opts);
        assert_eq!(out, vec!["a", "b", "c"]);
    }
}
