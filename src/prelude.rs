//! Convenience re-exports of commonly used types.
//!
//! `use pathmatch::prelude::*;` pulls in everything needed to run a match.

pub use crate::highlight::{group_positions, highlight_regexes, HighlightMode};
pub use crate::item::{KeyMode, LineItem};
pub use crate::matcher::Matcher;
pub use crate::options::{MatchOptions, MatchOptionsBuilder, QueryPathMode};
pub use crate::pipeline::{IterSource, ReceiverSource, SliceSource, Source, SourceError, DEFAULT_BATCH_SIZE};
pub use crate::score::{Matched, Scorer};
pub use crate::{for_each_match, MatchError, MatchInfo, MatchItem};
pub use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
