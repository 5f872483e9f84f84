//! Shared SQLite plumbing for [`crate::cache::KmerCache`] and
//! [`crate::index::KmerIndex`].
//!
//! Wraps one SQLite connection per backing file and hands out table names
//! suffixed by a caller-chosen tag, so unrelated `(w, Σ)` configurations can
//! share a file without colliding. A connection is scoped to one operation
//! and released on every exit path (one `Mutex` guard per call): writers
//! take the lock for the duration of an insert or cache miss, and readers
//! only ever see committed state.

use crate::error::Result;
use byteorder::{ByteOrder, LittleEndian};
use rusqlite::Connection;
use std::path::Path;
use std::sync::Mutex;

/// A single SQLite-backed store. Tables are created lazily per (w, Σ)-tagged
/// store by the owning [`crate::cache::KmerCache`]/[`crate::index::
/// KmerIndex`]; this type only owns the connection.
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    /// Opens (creating if absent) a SQLite database file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Opens a private in-memory database, for tests and ephemeral queries.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Runs `f` against the shared connection, holding the single
    /// coarse-grained lock for its duration. Every exit path — including
    /// `f` returning `Err` — releases the lock when the guard drops.
    pub fn with_conn<R>(&self, f: impl FnOnce(&Connection) -> rusqlite::Result<R>) -> Result<R> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        Ok(f(&conn)?)
    }
}

/// Width in bytes of the little-endian fixed-width integer used to pack a
/// kmer in the `kmers` BLOB: `ceil(w * log2(|Σ|) / 8)`, rounded up to 1, 2,
/// 4, or 8 bytes.
pub fn packed_width_bytes(w: usize, alphabet_size: usize) -> usize {
    let bits = (w as f64) * (alphabet_size as f64).log2();
    let raw_bytes = (bits / 8.0).ceil() as usize;
    match raw_bytes {
        0 | 1 => 1,
        2 => 2,
        3 | 4 => 4,
        _ => 8,
    }
}

/// Serializes a kmer array into the fixed-width little-endian BLOB format.
pub fn encode_kmers(kmers: &[u64], width: usize) -> Vec<u8> {
    let mut buf = vec![0u8; kmers.len() * width];
    for (i, &k) in kmers.iter().enumerate() {
        let slot = &mut buf[i * width..(i + 1) * width];
        match width {
            1 => slot[0] = k as u8,
            2 => LittleEndian::write_u16(slot, k as u16),
            4 => LittleEndian::write_u32(slot, k as u32),
            8 => LittleEndian::write_u64(slot, k),
            _ => unreachable!("packed_width_bytes only returns 1, 2, 4, or 8"),
        }
    }
    buf
}

/// Inverse of [`encode_kmers`].
pub fn decode_kmers(bytes: &[u8], width: usize) -> Vec<u64> {
    if width == 0 || bytes.len() % width != 0 {
        return Vec::new();
    }
    bytes
        .chunks_exact(width)
        .map(|slot| match width {
            1 => slot[0] as u64,
            2 => LittleEndian::read_u16(slot) as u64,
            4 => LittleEndian::read_u32(slot) as u64,
            8 => LittleEndian::read_u64(slot),
            _ => unreachable!("packed_width_bytes only returns 1, 2, 4, or 8"),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packed_width_matches_spec_formula() {
        // DNA (|Sigma|=4, 2 bits/letter): w=3 -> 6 bits -> 1 byte.
        assert_eq!(packed_width_bytes(3, 4), 1);
        // w=8 -> 16 bits -> 2 bytes.
        assert_eq!(packed_width_bytes(8, 4), 2);
        // w=16 -> 32 bits -> 4 bytes.
        assert_eq!(packed_width_bytes(16, 4), 4);
        // w=28 -> 56 bits -> rounds to 8 bytes.
        assert_eq!(packed_width_bytes(28, 4), 8);
    }

    #[test]
    fn kmer_blob_round_trips() {
        for width in [1, 2, 4, 8] {
            let max = if width == 8 { u32::MAX as u64 } else { (1u64 << (width * 8).min(63)) - 1 };
            let kmers = vec![0u64, 1, max.min(12345)];
            let blob = encode_kmers(&kmers, width);
            assert_eq!(blob.len(), kmers.len() * width);
            assert_eq!(decode_kmers(&blob, width), kmers);
        }
    }

    #[test]
    fn store_survives_reopen_in_memory_is_isolated() {
        let s1 = Store::open_memory().unwrap();
        let s2 = Store::open_memory().unwrap();
        s1.with_conn(|c| c.execute_batch("CREATE TABLE t (x INTEGER);"))
            .unwrap();
        // s2 has its own private memory database, so this table does not
        // exist there.
        let err = s2.with_conn(|c| c.execute("INSERT INTO t VALUES (1)", []));
        assert!(err.is_err());
    }
}
