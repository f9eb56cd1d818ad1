//! Editor highlight support: grouping match positions into intervals and
//! rendering them as Vim-style regexes.
//!
//! Given a candidate and its sorted match positions, downstream UIs
//! highlight either each contiguous run of matched bytes (detailed), one
//! span from the first to the last matched byte (basic), or nothing.
//! Regexes are byte-faithful (`Vec<u8>`), since candidates are.

/// How match positions are grouped for highlighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[cfg_attr(feature = "cli", clap(rename_all = "snake_case"))]
pub enum HighlightMode {
    /// No highlight regexes.
    #[default]
    None,
    /// One span from the first to the last matched byte.
    Basic,
    /// One span per contiguous run of matched bytes.
    Detailed,
}

/// Groups sorted positions into half-open `[begin, end)` intervals
/// according to `mode`.
pub fn group_positions(mode: HighlightMode, positions: &[usize]) -> Vec<(usize, usize)> {
    match mode {
        HighlightMode::None => Vec::new(),
        HighlightMode::Basic => match (positions.first(), positions.last()) {
            (Some(&first), Some(&last)) => vec![(first, last + 1)],
            _ => Vec::new(),
        },
        HighlightMode::Detailed => {
            let mut groups = Vec::new();
            let mut begin = 0;
            let mut end = 0;
            for &pos in positions {
                if pos != end {
                    if begin != end {
                        groups.push((begin, end));
                    }
                    begin = pos;
                    end = pos;
                }
                end += 1;
            }
            if begin != end {
                groups.push((begin, end));
            }
            groups
        }
    }
}

/// Builds one Vim regex per highlight group.
///
/// Each regex anchors the whole line and brackets the group with `\zs` /
/// `\ze`: `\V` (very nomagic) and `\C` (case sensitivity) keep everything
/// literal except backslashes, which are escaped. `line_prefix` is
/// prepended verbatim-escaped for UIs that decorate each line.
pub fn highlight_regexes(
    mode: HighlightMode,
    item: &[u8],
    positions: &[usize],
    line_prefix: &[u8],
) -> Vec<Vec<u8>> {
    let mut regexes = Vec::new();
    for (begin, end) in group_positions(mode, positions) {
        let mut regex: Vec<u8> = Vec::with_capacity(item.len() + line_prefix.len() + 16);
        regex.extend_from_slice(br"\V\C\^");
        let write = |regex: &mut Vec<u8>, bytes: &[u8]| {
            for &b in bytes {
                if b == b'\\' {
                    regex.extend_from_slice(br"\\");
                } else {
                    regex.push(b);
                }
            }
        };
        write(&mut regex, line_prefix);
        write(&mut regex, &item[..begin]);
        regex.extend_from_slice(br"\zs");
        write(&mut regex, &item[begin..end]);
        regex.extend_from_slice(br"\ze");
        write(&mut regex, &item[end..]);
        regex.extend_from_slice(br"\$");
        regexes.push(regex);
    }
    regexes
}
