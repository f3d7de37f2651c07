use std::io;

/// Errors surfaced by rule compilation, chain resolution, and file loading.
///
/// Two things are deliberately *not* errors: an unknown category reference in
/// a pattern (it stays literal text, so rules can be written before their
/// categories without crashing), and a numbered-category mismatch during
/// matching (that is a match-rejection signal internal to the engine).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The line has no ` > ` and is not a category definition, so it cannot
    /// be decomposed into a from/to pair.
    #[error("malformed rule line: {0:?}")]
    MalformedRule(String),

    /// A chain pair's end point does not descend from its start point.
    #[error("{end:?} does not descend from {start:?}")]
    UnrelatedChainPair { start: String, end: String },

    /// A rule file could not be read.
    #[error("failed to load rule file {file:?}")]
    FileLoad {
        file: String,
        #[source]
        source: io::Error,
    },

    /// A rule file's modification time could not be read.
    #[error("failed to stat rule file {file:?}")]
    FileStat {
        file: String,
        #[source]
        source: io::Error,
    },
}
