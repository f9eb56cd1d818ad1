//! Line-oriented candidate items for drivers.
//!
//! Editor pickers often feed lines that carry more than the path: a
//! tab-separated annotation, or a path whose directory part should not be
//! matched. A [`LineItem`] keeps the full line for display and tiebreaking
//! but restricts matching to a substring chosen by [`KeyMode`], showing off
//! the `match_key` / `sort_key` split of [`MatchItem`].

use crate::path;
use crate::MatchItem;

/// Which part of a line the matcher sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[cfg_attr(feature = "cli", clap(rename_all = "kebab-case"))]
pub enum KeyMode {
    /// Match against the whole line.
    #[default]
    FullLine,
    /// Match against the basename of the line.
    FilenameOnly,
    /// Match against the text before the first tab, if any.
    FirstNonTab,
    /// Match against the text before the last tab, if any.
    UntilLastTab,
}

/// A candidate line whose match key is a substring of the line.
///
/// The sort key stays the full line, so ties still break deterministically
/// on the complete input.
#[derive(Debug, Clone)]
pub struct LineItem {
    line: Vec<u8>,
    key_begin: usize,
    key_end: usize,
}

impl LineItem {
    pub fn new(line: Vec<u8>, mode: KeyMode) -> Self {
        let (key_begin, key_end) = key_range(&line, mode);
        Self {
            line,
            key_begin,
            key_end,
        }
    }

    /// The full line, as read.
    pub fn line(&self) -> &[u8] {
        &self.line
    }

    /// Byte offset of the match key within the line. Match positions are
    /// relative to the key; add this to map them back onto the line.
    pub fn key_offset(&self) -> usize {
        self.key_begin
    }

    pub fn into_line(self) -> Vec<u8> {
        self.line
    }
}

impl MatchItem for LineItem {
    fn match_key(&self) -> &[u8] {
        &self.line[self.key_begin..self.key_end]
    }

    fn sort_key(&self) -> &[u8] {
        &self.line
    }
}

fn key_range(line: &[u8], mode: KeyMode) -> (usize, usize) {
    match mode {
        KeyMode::FullLine => (0, line.len()),
        KeyMode::FilenameOnly => {
            let base = path::basename(line);
            (line.len() - base.len(), line.len())
        }
        KeyMode::FirstNonTab => {
            let end = line.iter().position(|&b| b == b'\t').unwrap_or(line.len());
            (0, end)
        }
        KeyMode::UntilLastTab => {
            let end = line.iter().rposition(|&b| b == b'\t').unwrap_or(line.len());
            (0, end)
        }
    }
}
