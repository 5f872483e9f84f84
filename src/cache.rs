//! K-mer cache.
//!
//! A persistent `content-id -> integer array` mapping with an in-memory hot
//! tier: `seq_kmers_<name>` table, `SELECT ... WHERE seq = ?` then compute-
//! and-insert on miss. Kmer arrays are materialized lazily and may be
//! evicted from the in-memory hot cache on LRU; the on-disk cache is
//! authoritative.

use crate::error::{Error, Result};
use crate::kmer::{Kmer, KmerEncoder};
use crate::sequence::{ContentId, Sequence};
use crate::store::{decode_kmers, encode_kmers, packed_width_bytes, Store};
use dashmap::DashMap;
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};

/// Default number of sequences kept in the in-memory hot tier before LRU
/// eviction kicks in.
const DEFAULT_HOT_CAPACITY: usize = 256;

pub struct KmerCache {
    store: Arc<Store>,
    encoder: KmerEncoder,
    width: usize,
    table: String,
    hot: DashMap<ContentId, Arc<Vec<Kmer>>>,
    hot_order: Mutex<VecDeque<ContentId>>,
    hot_capacity: usize,
}

impl KmerCache {
    /// Opens (creating the backing table if absent) a cache store tagged
    /// `tag`. Callers are responsible for using a distinct `tag` per
    /// `(w, alphabet)` pair sharing a backing file: the cache does not tag
    /// entries with `(w, Σ)` itself, so violating this produces wrong
    /// results silently.
    pub fn open(store: Arc<Store>, tag: &str, encoder: KmerEncoder) -> Result<Self> {
        let table = format!("seq_kmers_{tag}");
        let width = packed_width_bytes(encoder.word_length(), encoder.alphabet().len());
        store.with_conn(|conn| {
            conn.execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {table} (
                    seq   TEXT UNIQUE,
                    kmers BLOB
                );"
            ))
        })?;
        Ok(Self {
            store,
            encoder,
            width,
            table,
            hot: DashMap::new(),
            hot_order: Mutex::new(VecDeque::new()),
            hot_capacity: DEFAULT_HOT_CAPACITY,
        })
    }

    pub fn with_hot_capacity(mut self, capacity: usize) -> Self {
        self.hot_capacity = capacity.max(1);
        self
    }

    /// All content ids currently persisted in this cache.
    pub fn cached_ids(&self) -> Result<HashSet<String>> {
        self.store.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("SELECT seq FROM {}", self.table))?;
            let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
            rows.collect()
        })
    }

    /// Returns the kmer integer array for `seq`, computing and persisting it
    /// on a cold start. Cache hits (hot or on-disk) are strictly faster than
    /// recomputation, the reason the cache exists.
    pub fn kmers(&self, seq: &Sequence) -> Result<Arc<Vec<Kmer>>> {
        let id = seq.content_id();

        if let Some(hit) = self.hot.get(&id) {
            log::debug!("kmer cache hot hit for sequence {id}");
            self.touch(id);
            return Ok(hit.clone());
        }

        if let Some(kmers) = self.read_disk(seq)? {
            log::debug!("kmer cache disk hit for sequence {id}");
            let kmers = Arc::new(kmers);
            self.insert_hot(id, kmers.clone());
            return Ok(kmers);
        }

        log::debug!("kmer cache miss for sequence {id}, computing");
        let kmers = self.encoder.kmers_of(seq.letters())?;
        self.write_disk(seq, &kmers)?;
        let kmers = Arc::new(kmers);
        self.insert_hot(id, kmers.clone());
        Ok(kmers)
    }

    fn read_disk(&self, seq: &Sequence) -> Result<Option<Vec<Kmer>>> {
        let id_hex = seq.content_id().as_hex();
        let width = self.width;
        let blob: Option<Vec<u8>> = self.store.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT kmers FROM {} WHERE seq = ?1", self.table),
                [&id_hex],
                |row| row.get(0),
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                e => Err(e),
            })
        })?;
        let Some(blob) = blob else { return Ok(None) };
        let kmers = decode_kmers(&blob, width);
        let expected_len = seq.len().saturating_sub(self.encoder.word_length()).checked_add(1);
        let expected_len = if seq.len() < self.encoder.word_length() {
            0
        } else {
            expected_len.unwrap_or(0)
        };
        if kmers.len() != expected_len {
            return Err(Error::CorruptCache {
                expected: expected_len,
                actual: kmers.len(),
            });
        }
        Ok(Some(kmers))
    }

    fn write_disk(&self, seq: &Sequence, kmers: &[Kmer]) -> Result<()> {
        let id_hex = seq.content_id().as_hex();
        let blob = encode_kmers(kmers, self.width);
        self.store.with_conn(|conn| {
            conn.execute(
                &format!(
                    "INSERT OR IGNORE INTO {} (seq, kmers) VALUES (?1, ?2)",
                    self.table
                ),
                rusqlite::params![id_hex, blob],
            )
        })?;
        Ok(())
    }

    fn touch(&self, id: ContentId) {
        let mut order = self.hot_order.lock().expect("hot_order mutex poisoned");
        if let Some(pos) = order.iter().position(|&x| x == id) {
            order.remove(pos);
        }
        order.push_back(id);
    }

    fn insert_hot(&self, id: ContentId, kmers: Arc<Vec<Kmer>>) {
        self.hot.insert(id, kmers);
        let mut order = self.hot_order.lock().expect("hot_order mutex poisoned");
        order.push_back(id);
        while order.len() > self.hot_capacity {
            if let Some(evicted) = order.pop_front() {
                self.hot.remove(&evicted);
            }
        }
    }
}
