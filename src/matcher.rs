//! The scorer: decides whether a candidate matches a query and how well.
//!
//! Matching runs in two phases. A right-to-left pass over the candidate's
//! path components establishes whether the query is a subsequence of the
//! candidate (rightmost components are consumed first, since for paths they
//! matter most) and where the query's basename block landed. A refinement
//! pass then re-scores the key — the rightmost component — with a
//! word-prefix-aware two-pass walk, producing the tiered `prefix_score` and
//! the rest of the [`Scorer`] fields.
//!
//! A `Matcher` owns its decode scratch buffers, so matching is `&mut self`
//! and a matcher is not shared between threads; the pipeline builds one per
//! worker.

use crate::options::{MatchOptions, QueryPathMode};
use crate::path::{self, PATH_SEPARATOR_CP};
use crate::score::{Scorer, PREFIX_SCORE_MAX};
use crate::strings::{CodePoint, StringHandler};

pub struct Matcher {
    strings: StringHandler,
    is_path: bool,
    require_full_part: bool,
    is_case_sensitive: bool,
    match_crfile: bool,
    record_positions: bool,
    query_chars: Vec<CodePoint>,
    /// Index of the first query code point after the last path separator.
    query_key_begin_index: usize,
    crfile: Vec<u8>,
    /// `crfile`'s components with the filename popped, so the open file is
    /// not favored over its siblings on path distance.
    cur_file_parts: Vec<Vec<u8>>,
    /// `crfile`'s basename truncated just past its last dot.
    cur_file_basename: Vec<u8>,
    scorer: Scorer,
    positions: Vec<usize>,
    // Decode scratch, reused across candidates.
    key_chars: Vec<CodePoint>,
    key_offsets: Vec<usize>,
    temp_chars: Vec<CodePoint>,
    temp_offsets: Vec<usize>,
}

impl Matcher {
    pub fn new(query: &[u8], opts: &MatchOptions) -> Self {
        let strings = StringHandler::new(opts.unicode);
        let mut query_chars = Vec::new();
        strings.decode(query, &mut query_chars);

        let (query_key_begin_index, require_full_part) = if opts.path {
            let begin = query_chars
                .iter()
                .rposition(|&c| c == PATH_SEPARATOR_CP)
                .map_or(0, |p| p + 1);
            let full_part = match opts.query_path_mode {
                QueryPathMode::Normal => false,
                QueryPathMode::Strict => true,
                QueryPathMode::Auto => query_chars.contains(&PATH_SEPARATOR_CP),
            };
            (begin, full_part)
        } else {
            (0, false)
        };

        // Smartcase: the query fixes sensitivity once, up front.
        let is_case_sensitive = query_chars.iter().any(|&c| strings.is_uppercase(c));

        let crfile = opts.crfile.clone();
        let mut cur_file_parts: Vec<Vec<u8>> =
            path::components(&crfile).iter().map(|p| p.to_vec()).collect();
        cur_file_parts.pop();
        let base = path::basename(&crfile);
        let cur_file_basename = match base.iter().rposition(|&b| b == b'.') {
            Some(dot) => base[..=dot].to_vec(),
            None => base.to_vec(),
        };

        trace!(
            "matcher: {} query code point(s), case_sensitive={}, full_part={}",
            query_chars.len(),
            is_case_sensitive,
            require_full_part
        );

        Self {
            strings,
            is_path: opts.path,
            require_full_part,
            is_case_sensitive,
            match_crfile: opts.match_crfile,
            record_positions: false,
            query_chars,
            query_key_begin_index,
            crfile,
            cur_file_parts,
            cur_file_basename,
            scorer: Scorer::default(),
            positions: Vec::new(),
            key_chars: Vec::new(),
            key_offsets: Vec::new(),
            temp_chars: Vec::new(),
            temp_offsets: Vec::new(),
        }
    }

    /// Enables recording of matched byte positions on subsequent matches.
    pub fn record_match_positions(mut self, on: bool) -> Self {
        self.record_positions = on;
        self
    }

    /// Matches `item` against the query. On a match the scorer state, the
    /// reverse score, and (if enabled) the match positions are available
    /// until the next call.
    pub fn match_item(&mut self, item: &[u8]) -> bool {
        self.scorer = Scorer::default();
        let mut positions = std::mem::take(&mut self.positions);
        positions.clear();
        let matched = self.match_inner(item, &mut positions);
        if matched && self.record_positions {
            positions.sort_unstable();
        }
        self.positions = positions;
        matched
    }

    /// Reverse score of the last match. Lower is better.
    pub fn score(&self) -> u64 {
        self.scorer.reverse_score()
    }

    pub fn scorer(&self) -> &Scorer {
        &self.scorer
    }

    /// Sorted byte offsets matched in the last candidate. Empty unless
    /// position recording is enabled.
    pub fn match_positions(&self) -> &[usize] {
        &self.positions
    }

    fn match_inner(&mut self, item: &[u8], positions: &mut Vec<usize>) -> bool {
        if self.is_path && !self.match_crfile && !self.crfile.is_empty() && item == &self.crfile[..] {
            return false;
        }

        let item_parts: Vec<&[u8]> = if self.is_path {
            path::components(item)
        } else {
            vec![item]
        };

        if self.is_path {
            self.scorer.path_distance = path::distance(&self.cur_file_parts, &item_parts) as u32;
            self.scorer.cur_file_prefix_len = if self.scorer.path_distance == 0 {
                0
            } else {
                let last = item_parts.last().copied().unwrap_or(b"");
                common_prefix_len(&self.cur_file_basename, last) as u32
            };
        }

        if self.query_chars.is_empty() {
            return true;
        }

        self.key_chars.clear();
        self.key_offsets.clear();

        let strings = self.strings;
        let sensitive = self.is_case_sensitive;
        let record = self.record_positions;
        let require_full = self.require_full_part;

        // Remaining (unconsumed) query length; code points are consumed
        // right-to-left, so query_chars[..qi] is what is left.
        let mut qi = self.query_chars.len();
        // Query offset where the key's consumption stopped; the key
        // refinement re-matches query_chars[qkey..].
        let mut qkey = self.query_chars.len();
        let mut parts_count: u32 = 0;
        let mut key_base = item.len();
        let mut part_end = item.len();
        let mut provisional: Vec<usize> = Vec::new();

        for (rev_index, part) in item_parts.iter().rev().enumerate() {
            let part_base = part_end - part.len();
            part_end = part_base;
            if qi == 0 {
                break;
            }

            if rev_index == 0 {
                key_base = part_base;
                strings.decode_with_offsets(part, &mut self.key_chars, &mut self.key_offsets);
            } else {
                self.temp_chars.clear();
                self.temp_offsets.clear();
                strings.decode_with_offsets(part, &mut self.temp_chars, &mut self.temp_offsets);
            }
            let (chars, offsets) = if rev_index == 0 {
                (&self.key_chars, &self.key_offsets)
            } else {
                (&self.temp_chars, &self.temp_offsets)
            };
            let query = &self.query_chars;

            let qi_save = qi;
            let mut consumed = 0usize;
            provisional.clear();

            // In full-part mode a non-key component's trailing separator is
            // structural: query separators are consumed on acceptance below,
            // never matched against item characters.
            let has_structural_sep =
                require_full && rev_index > 0 && chars.last() == Some(&PATH_SEPARATOR_CP);

            for j in (0..chars.len()).rev() {
                if qi == 0 {
                    break;
                }
                if has_structural_sep && j == chars.len() - 1 {
                    continue;
                }
                if match_char(&strings, sensitive, chars[j], query[qi - 1]) {
                    qi -= 1;
                    consumed += 1;
                    if record && rev_index > 0 {
                        let begin = part_base + offsets[j];
                        let end = part_base + offsets.get(j + 1).copied().unwrap_or(part.len());
                        provisional.extend(begin..end);
                    }
                }
            }

            let mut accepted = true;
            if require_full {
                // The consumption must have stopped at a query path
                // component boundary...
                if qi != 0 && query[qi - 1] != PATH_SEPARATOR_CP {
                    accepted = false;
                }
                // ...and a query component must consume a non-key item
                // component entirely.
                if rev_index > 0 {
                    let content_len = chars.len() - usize::from(has_structural_sep);
                    if consumed != content_len {
                        accepted = false;
                    }
                }
            }

            if accepted {
                if consumed > 0 {
                    parts_count += 1;
                }
                if rev_index == 0 {
                    qkey = qi;
                }
                if record && rev_index > 0 {
                    positions.extend_from_slice(&provisional);
                }
                if require_full && qi > 0 && query[qi - 1] == PATH_SEPARATOR_CP {
                    qi -= 1;
                }
            } else {
                qi = qi_save;
            }
        }

        if qi != 0 {
            return false;
        }

        self.scorer.parts = parts_count;
        let mut scorer = self.scorer;
        self.match_key(qkey, &mut scorer, positions, key_base, item.len());
        self.scorer = scorer;
        true
    }

    /// Refined scoring of the key (the rightmost path component, or the
    /// whole item outside path mode) against `query_chars[qkey..]`.
    ///
    /// Pass 0 only matches where the query character sits at a word prefix
    /// (or extends an unbroken run from one); if it consumes the whole
    /// segment the match is word-boundary detectable. Pass 1 is plain
    /// greedy and cannot fail on a verified subsequence.
    fn match_key(
        &self,
        qkey: usize,
        m: &mut Scorer,
        positions: &mut Vec<usize>,
        key_base: usize,
        item_len: usize,
    ) {
        let key = &self.key_chars;
        let offsets = &self.key_offsets;
        let query = &self.query_chars;
        m.unmatched_len = key.len() as u32;
        if qkey == query.len() {
            return;
        }
        let qkey_start = qkey == self.query_key_begin_index;
        let strings = self.strings;
        let sensitive = self.is_case_sensitive;
        let record = self.record_positions;

        let is_word_prefix = |i: usize| -> bool {
            if i == 0 {
                return true;
            }
            if strings.is_alphanumeric(key[i]) && !strings.is_alphanumeric(key[i - 1]) {
                return true;
            }
            if strings.is_uppercase(key[i]) && !strings.is_uppercase(key[i - 1]) {
                return true;
            }
            false
        };

        let mut pass_positions: Vec<usize> = Vec::new();
        for pass in 0..2 {
            let mut qi = qkey;
            let mut word_index: u32 = 0;
            let mut at_word_start = true;
            let mut word_matched = false;
            let mut is_full_prefix = qkey_start;
            let mut word_index_sum: u32 = 0;
            let mut start_matched = false;
            let mut word_prefix_len: u32 = 0;
            pass_positions.clear();

            for i in 0..key.len() {
                if is_word_prefix(i) {
                    word_index += 1;
                    at_word_start = true;
                    word_matched = false;
                }
                if pass == 0 && strings.is_alphanumeric(query[qi]) && !at_word_start {
                    is_full_prefix = false;
                    continue;
                }
                if match_char(&strings, sensitive, key[i], query[qi]) {
                    if i == 0 {
                        start_matched = true;
                    }
                    if at_word_start {
                        word_prefix_len += 1;
                    }
                    if !word_matched {
                        word_index_sum = word_index_sum.saturating_add(word_index);
                        word_matched = true;
                    }
                    if record {
                        let begin = key_base + offsets[i];
                        let end = key_base + offsets.get(i + 1).map_or(item_len - key_base, |&o| o);
                        pass_positions.extend(begin..end);
                    }
                    qi += 1;
                    if qi == query.len() {
                        m.unmatched_len = (key.len() - (i + 1)) as u32;
                        m.word_prefix_len = word_prefix_len;
                        m.prefix_score =
                            prefix_tier(pass, qkey_start, start_matched, is_full_prefix, word_index_sum);
                        if record {
                            positions.extend_from_slice(&pass_positions);
                        }
                        return;
                    }
                } else {
                    at_word_start = false;
                    is_full_prefix = false;
                }
            }
        }
        // Pass 1 consumes any segment the right-to-left phase verified, so
        // falling out of the loop means the segment was empty-equivalent;
        // the scorer keeps its defaults.
    }
}

/// Tier table for `prefix_score`; see the field documentation on
/// [`Scorer`]. `pass` is 0 for the word-prefix pass, 1 for the greedy pass.
fn prefix_tier(
    pass: u32,
    qkey_start: bool,
    start_matched: bool,
    is_full_prefix: bool,
    word_index_sum: u32,
) -> u32 {
    if is_full_prefix {
        return 0;
    }
    if pass == 0 {
        if qkey_start {
            word_index_sum.min(PREFIX_SCORE_MAX - 4)
        } else {
            PREFIX_SCORE_MAX - 3
        }
    } else if qkey_start && start_matched {
        PREFIX_SCORE_MAX - 2
    } else if qkey_start || start_matched {
        PREFIX_SCORE_MAX - 1
    } else {
        PREFIX_SCORE_MAX
    }
}

fn match_char(strings: &StringHandler, sensitive: bool, item: CodePoint, query: CodePoint) -> bool {
    // An insensitive query contains no uppercase (smartcase), so only the
    // item side ever needs folding.
    let item = if !sensitive && strings.is_uppercase(item) {
        strings.to_lowercase(item)
    } else {
        item
    };
    item == query
}

fn common_prefix_len(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b.iter()).take_while(|(x, y)| x == y).count()
}
