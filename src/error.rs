//! Crate-wide error type.
//!
//! Parameter and integrity errors are fatal at construction, I/O errors
//! propagate unchanged, and `NoOverlap`/`AmbiguousOverlap` are ordinary
//! result variants produced by overlap queries rather than failures (see
//! `query::overlap`).

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("alphabet size {0} exceeds the maximum of 36 distinct letters")]
    AlphabetTooLarge(usize),

    #[error("word length {w} is too large for {bits}-bit integers (alphabet size {alphabet_size})")]
    WordLengthTooLarge {
        w: usize,
        bits: u32,
        alphabet_size: usize,
    },

    #[error("sequence id space exhausted")]
    IdExhausted,

    #[error("persistent store error: {0}")]
    StoreIO(#[from] rusqlite::Error),

    #[error("cache entry for sequence length {expected} has {actual} kmers on disk")]
    CorruptCache { expected: usize, actual: usize },

    #[error("no segment qualifies as an overlap")]
    NoOverlap,

    #[error("overlap direction is ambiguous: |d*|={d_star}, margin={margin} < min_margin={min_margin}")]
    AmbiguousOverlap {
        d_star: i64,
        margin: i64,
        min_margin: i64,
    },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}
