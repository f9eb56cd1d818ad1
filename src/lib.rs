//! pathmatch is a fuzzy path matcher for editor file selection.
//!
//! Given a short query and a large list of candidate strings (typically
//! file paths), it returns the best-matching candidates in descending
//! quality order, with per-keystroke latency in mind: matching runs on a
//! configurable number of threads, each keeping only a bounded set of top
//! matches.
//!
//! # Examples
//!
//! ```
//! use pathmatch::{for_each_match, IterSource, MatchOptionsBuilder};
//!
//! let candidates = ["src/main.rs", "src/matcher.rs", "README.md"];
//! let opts = MatchOptionsBuilder::default()
//!     .limit(10usize)
//!     .build()
//!     .unwrap();
//!
//! let source = IterSource::new(candidates.iter().map(|s| s.to_string()));
//! let mut ranked = Vec::new();
//! for_each_match(b"mat", &opts, source, |item: String, _info| ranked.push(item)).unwrap();
//! assert_eq!(ranked[0], "src/matcher.rs");
//! ```

#[macro_use]
extern crate log;

use thiserror::Error;

pub mod highlight;
pub mod item;
pub mod matcher;
pub mod options;
pub mod path;
pub mod pipeline;
pub mod prelude;
pub mod score;
pub mod strings;

pub use crate::highlight::{group_positions, highlight_regexes, HighlightMode};
pub use crate::item::{KeyMode, LineItem};
pub use crate::matcher::Matcher;
pub use crate::options::{MatchOptions, MatchOptionsBuilder, QueryPathMode};
pub use crate::pipeline::{IterSource, ReceiverSource, SliceSource, Source, SourceError, DEFAULT_BATCH_SIZE};
pub use crate::score::Scorer;

/// Errors surfaced by the matching entry point.
#[derive(Debug, Error)]
pub enum MatchError {
    /// An option carried an unusable value at binding time.
    #[error("invalid option: {0}")]
    InvalidOption(String),
    /// A source failed while producing candidates. Captured by the worker
    /// that hit it and re-surfaced after all workers joined.
    #[error("source error: {0}")]
    Source(SourceError),
    /// A surviving match failed to re-match during position collection.
    /// This indicates a scorer bug and is fatal.
    #[error("failed to re-match known match '{0}' during match position collection")]
    Rematch(String),
}

impl From<options::MatchOptionsBuilderError> for MatchError {
    fn from(e: options::MatchOptionsBuilderError) -> Self {
        MatchError::InvalidOption(e.to_string())
    }
}

/// A candidate considered for matching.
///
/// `match_key` is the byte string matched against the query; `sort_key`
/// breaks ties between equal scores and defaults to the match key. The
/// pipeline only borrows the keys and never mutates the item; matched items
/// are handed back to the sink by value.
pub trait MatchItem: Send {
    fn match_key(&self) -> &[u8];

    fn sort_key(&self) -> &[u8] {
        self.match_key()
    }
}

impl MatchItem for String {
    fn match_key(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl MatchItem for Vec<u8> {
    fn match_key(&self) -> &[u8] {
        self
    }
}

impl MatchItem for &str {
    fn match_key(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl MatchItem for &[u8] {
    fn match_key(&self) -> &[u8] {
        self
    }
}

/// View of the scorer state for one surviving match, passed to the sink
/// when match info was requested.
pub struct MatchInfo<'a> {
    matcher: &'a Matcher,
}

impl<'a> MatchInfo<'a> {
    pub(crate) fn new(matcher: &'a Matcher) -> Self {
        Self { matcher }
    }

    /// Match score; higher is better.
    pub fn score(&self) -> u64 {
        u64::MAX - self.matcher.score()
    }

    /// Human-readable listing of the scorer fields.
    pub fn score_debug_string(&self) -> String {
        self.matcher.scorer().debug_string()
    }

    /// Sorted byte offsets of the matched bytes in the candidate.
    pub fn match_positions(&self) -> &[usize] {
        self.matcher.match_positions()
    }
}

/// Matches every candidate produced by `source` against `query` and invokes
/// `sink` once per surviving match, in descending match quality
/// (ties broken by `sort_key` ascending).
///
/// The sink runs sequentially on the calling thread after all matcher
/// threads have joined. With `want_match_info` set, each sink call also
/// receives the [`MatchInfo`] of a rescoring pass over the survivor.
pub fn for_each_match<T, S, F>(query: &[u8], opts: &MatchOptions, source: S, sink: F) -> Result<(), MatchError>
where
    T: MatchItem,
    S: Source<T>,
    F: FnMut(T, Option<MatchInfo<'_>>),
{
    if opts.nr_threads == 0 {
        return Err(MatchError::InvalidOption("nr_threads must be at least 1".into()));
    }
    pipeline::run(query, opts, &source, sink)
}
