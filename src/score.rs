//! Match quality state and its reduction to a single rank value.
//!
//! A [`Scorer`] accumulates the per-candidate quality signals while the
//! matcher runs; [`Scorer::reverse_score`] collapses them into one packed
//! `u64` where lower is better. A packed scalar keeps the per-worker heaps
//! and the final sort branch-free; the field widths give the same ordering
//! as comparing the fields lexicographically.

use std::cmp::Ordering;

use crate::MatchItem;

/// Worst (and default) `prefix_score`. Fits the packed 31-bit field, so the
/// `MAX - n` tiers below it stay distinct.
pub const PREFIX_SCORE_MAX: u32 = (1 << 31) - 1;

/// Per-candidate match quality, filled by the matcher. All fields are
/// bounded by the candidate's length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scorer {
    /// Tiered quality of the key-part match. Lower is better:
    ///
    /// - `0`: the key segment of the query matched the key as a prefix;
    /// - sum of 1-indexed matched word indices: every alphanumeric query
    ///   character in the key segment matched at a word prefix, and the
    ///   segment is the whole query basename;
    /// - `MAX - 3`: word-prefix match as above, but the query's basename
    ///   block was split across path components;
    /// - `MAX - 2`: greedy match of the whole query basename within the
    ///   key, starting at the key's first character;
    /// - `MAX - 1`: greedy match of the whole query basename within the
    ///   key, or the key's first character matched;
    /// - `MAX`: none of the above.
    pub prefix_score: u32,
    /// Matched characters lying in word-prefix runs of the key. Higher is
    /// better.
    pub word_prefix_len: u32,
    /// Path components that contributed at least one match. Lower is
    /// better.
    pub parts: u32,
    /// Bytes shared between the current file's basename and the start of
    /// the candidate's key. Higher is better.
    pub cur_file_prefix_len: u32,
    /// Components between the current file's directory and the candidate.
    /// Lower is better.
    pub path_distance: u32,
    /// Unmatched characters trailing the last match in the key. Lower is
    /// weakly better, since refining a query edits its end.
    pub unmatched_len: u32,
}

impl Default for Scorer {
    fn default() -> Self {
        Self {
            prefix_score: PREFIX_SCORE_MAX,
            word_prefix_len: 0,
            parts: 0,
            cur_file_prefix_len: 0,
            path_distance: 0,
            unmatched_len: 0,
        }
    }
}

impl Scorer {
    /// Packs the fields into a single reverse score (lower is better).
    ///
    /// Field widths, most significant first: `prefix_score` 31,
    /// `word_prefix_len` 3 (inverted), `parts` 8, `cur_file_prefix_len` 6
    /// (inverted), `path_distance` 6, `unmatched_len` 8. Values saturate at
    /// their field width.
    pub fn reverse_score(&self) -> u64 {
        const WORD_PREFIX_LEN_MAX: u32 = (1 << 3) - 1;
        const PARTS_MAX: u32 = (1 << 8) - 1;
        const CUR_FILE_PREFIX_LEN_MAX: u32 = (1 << 6) - 1;
        const PATH_DISTANCE_MAX: u32 = (1 << 6) - 1;
        const UNMATCHED_LEN_MAX: u32 = (1 << 8) - 1;

        (u64::from(self.prefix_score.min(PREFIX_SCORE_MAX)) << 31)
            | (u64::from(WORD_PREFIX_LEN_MAX - self.word_prefix_len.min(WORD_PREFIX_LEN_MAX)) << 28)
            | (u64::from(self.parts.min(PARTS_MAX)) << 20)
            | (u64::from(CUR_FILE_PREFIX_LEN_MAX - self.cur_file_prefix_len.min(CUR_FILE_PREFIX_LEN_MAX)) << 14)
            | (u64::from(self.path_distance.min(PATH_DISTANCE_MAX)) << 8)
            | u64::from(self.unmatched_len.min(UNMATCHED_LEN_MAX))
    }

    /// Human-readable listing of the fields, for diagnostics and the CLI.
    pub fn debug_string(&self) -> String {
        format!(
            "prefix_score={}, word_prefix_len={}, parts={}, cur_file_prefix_len={}, path_distance={}, unmatched_len={}",
            self.prefix_score,
            self.word_prefix_len,
            self.parts,
            self.cur_file_prefix_len,
            self.path_distance,
            self.unmatched_len
        )
    }
}

/// A matched item bound to its reverse score.
///
/// The `Ord` impl is the total rank order: reverse score ascending, then
/// `sort_key` ascending. "Less" means "better", so a max-heap of `Matched`
/// pops the worst retained match first.
#[derive(Debug, Clone)]
pub struct Matched<T> {
    pub reverse_score: u64,
    pub item: T,
}

impl<T: MatchItem> Matched<T> {
    pub fn new(reverse_score: u64, item: T) -> Self {
        Self { reverse_score, item }
    }
}

impl<T: MatchItem> PartialEq for Matched<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T: MatchItem> Eq for Matched<T> {}

impl<T: MatchItem> PartialOrd for Matched<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: MatchItem> Ord for Matched<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.reverse_score
            .cmp(&other.reverse_score)
            .then_with(|| self.item.sort_key().cmp(other.item.sort_key()))
    }
}

/// Sorts `matches` into rank order. With a non-zero `limit` smaller than
/// the input, only the best `limit` elements are kept and sorted (a partial
/// sort); the rest are discarded.
pub fn sort_limit<T: MatchItem>(matches: &mut Vec<Matched<T>>, limit: usize) {
    if limit != 0 && limit < matches.len() {
        matches.select_nth_unstable(limit);
        matches.truncate(limit);
    }
    matches.sort_unstable();
}
