//! User-facing match options.

use derive_builder::Builder;

/// Governs whether each maximal block of query code points between path
/// separators must match entirely within one candidate component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[cfg_attr(feature = "cli", clap(rename_all = "snake_case"))]
pub enum QueryPathMode {
    /// Query characters match anywhere; separators match literally.
    Normal,
    /// Every query path component must fully consume a candidate component.
    Strict,
    /// Strict iff the query contains a path separator, else normal.
    #[default]
    Auto,
}

/// Options for one matching invocation. Immutable for its duration.
///
/// Build with [`MatchOptionsBuilder`], which validates at binding time:
///
/// ```
/// use pathmatch::MatchOptionsBuilder;
///
/// let opts = MatchOptionsBuilder::default()
///     .limit(10usize)
///     .nr_threads(4usize)
///     .want_match_info(true)
///     .build()
///     .unwrap();
/// assert!(opts.path);
/// ```
#[derive(Debug, Clone, Builder)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct MatchOptions {
    /// The currently open file; biases ranking toward its neighbors in the
    /// tree. Empty means none.
    #[builder(default, setter(into))]
    pub crfile: Vec<u8>,
    /// If false, a candidate equal to `crfile` never matches.
    #[builder(default)]
    pub match_crfile: bool,
    /// Treat the query and all candidates as paths.
    #[builder(default = "true")]
    pub path: bool,
    /// Per-component matching discipline; see [`QueryPathMode`].
    #[builder(default)]
    pub query_path_mode: QueryPathMode,
    /// Decode candidates as UTF-8 instead of raw bytes.
    #[builder(default)]
    pub unicode: bool,
    /// Retain only the best `limit` matches; 0 means unbounded.
    #[builder(default)]
    pub limit: usize,
    /// Number of matcher threads; must be at least 1.
    #[builder(default = "1")]
    pub nr_threads: usize,
    /// Compute match positions for surviving matches.
    #[builder(default)]
    pub want_match_info: bool,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            crfile: Vec::new(),
            match_crfile: false,
            path: true,
            query_path_mode: QueryPathMode::default(),
            unicode: false,
            limit: 0,
            nr_threads: 1,
            want_match_info: false,
        }
    }
}

impl MatchOptionsBuilder {
    fn validate(&self) -> Result<(), String> {
        if self.nr_threads == Some(0) {
            return Err("nr_threads must be at least 1".into());
        }
        Ok(())
    }
}
