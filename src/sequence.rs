//! Sequences and their two identity notions.
//!
//! A `Sequence` carries a stable *content id*, used to key the persistent
//! cache and index so that re-inserting the same data is idempotent, and
//! (once inserted) a runtime integer *seq-id* assigned by [`crate::index::
//! KmerIndex`]. The content hash uses `xxh3` for fast, stable content
//! keying.

use xxhash_rust::xxh3::xxh3_64;

/// Stable content identifier, independent of where/when a sequence is
/// inserted. Formatted as lowercase hex so it can live in a SQLite `TEXT`
/// column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentId(u64);

impl ContentId {
    fn of(letters: &[u8]) -> Self {
        // Length-prefixed so e.g. [0] and [0, 0] never collide trivially.
        let mut buf = Vec::with_capacity(letters.len() + 8);
        buf.extend_from_slice(&(letters.len() as u64).to_le_bytes());
        buf.extend_from_slice(letters);
        Self(xxh3_64(&buf))
    }

    pub fn as_hex(&self) -> String {
        format!("{:016x}", self.0)
    }
}

impl std::fmt::Display for ContentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_hex())
    }
}

/// An ordered array of letter indices over some alphabet, plus a name and a
/// content id. Sequences own nothing persistent; the cache/index own the
/// derived data keyed by `content_id()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    name: String,
    letters: Vec<u8>,
    content_id: ContentId,
}

impl Sequence {
    pub fn new(name: impl Into<String>, letters: Vec<u8>) -> Self {
        let content_id = ContentId::of(&letters);
        Self {
            name: name.into(),
            letters,
            content_id,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn letters(&self) -> &[u8] {
        &self.letters
    }

    pub fn len(&self) -> usize {
        self.letters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.letters.is_empty()
    }

    pub fn content_id(&self) -> ContentId {
        self.content_id
    }
}
