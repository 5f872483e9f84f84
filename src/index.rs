//! K-mer Index.
//!
//! A persistent multi-map `kmer -> [(seq-id, position)]` plus a
//! content-id -> seq-id registry (`kmers_<tag>` / `kmer_indexed_<tag>`
//! tables), with idempotent insert via a `SELECT seqid ... WHERE seq = ?`
//! short-circuit and a lazily-created SQL index over the `kmer` column.

use crate::cache::KmerCache;
use crate::error::{Error, Result};
use crate::kmer::{Kmer, KmerEncoder};
use crate::sequence::Sequence;
use crate::store::Store;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Runtime integer identifier assigned to an inserted sequence.
pub type SeqId = u32;

pub struct KmerIndex {
    store: Arc<Store>,
    cache: Option<Arc<KmerCache>>,
    encoder: KmerEncoder,
    kmers_table: String,
    log_table: String,
    secondary_index_built: AtomicBool,
}

impl KmerIndex {
    pub fn open(store: Arc<Store>, tag: &str, encoder: KmerEncoder) -> Result<Self> {
        Self::open_with_cache(store, tag, encoder, None)
    }

    /// Opens an index that delegates kmer-array computation to `cache`
    /// rather than recomputing on every insert.
    pub fn open_with_cache(
        store: Arc<Store>,
        tag: &str,
        encoder: KmerEncoder,
        cache: Option<Arc<KmerCache>>,
    ) -> Result<Self> {
        let kmers_table = format!("kmers_{tag}");
        let log_table = format!("kmer_indexed_{tag}");
        store.with_conn(|conn| {
            conn.execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {kmers_table} (
                    kmer  INTEGER,
                    seqid INTEGER,
                    pos   INTEGER
                );
                CREATE TABLE IF NOT EXISTS {log_table} (
                    seq    TEXT UNIQUE,
                    seqid  INTEGER PRIMARY KEY AUTOINCREMENT,
                    length INTEGER
                );"
            ))
        })?;
        Ok(Self {
            store,
            cache,
            encoder,
            kmers_table,
            log_table,
            secondary_index_built: AtomicBool::new(false),
        })
    }

    /// Inserts `seq`, indexing every kmer it contains. Idempotent by
    /// content id: re-inserting the same sequence returns the existing
    /// seq-id without re-indexing.
    pub fn insert(&self, seq: &Sequence) -> Result<SeqId> {
        let id_hex = seq.content_id().as_hex();

        if let Some(existing) = self.lookup_seqid(&id_hex)? {
            log::debug!("sequence {id_hex} already indexed as seqid {existing}, skipping");
            return Ok(existing);
        }

        let kmers = match &self.cache {
            Some(cache) => (*cache.kmers(seq)?).clone(),
            None => self.encoder.kmers_of(seq.letters())?,
        };

        self.store.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            tx.execute(
                &format!("INSERT INTO {} (seq, length) VALUES (?1, ?2)", self.log_table),
                rusqlite::params![id_hex, seq.len() as i64],
            )?;
            let seqid = tx.last_insert_rowid();
            {
                let mut stmt = tx.prepare(&format!(
                    "INSERT INTO {} (kmer, seqid, pos) VALUES (?1, ?2, ?3)",
                    self.kmers_table
                ))?;
                for (pos, &kmer) in kmers.iter().enumerate() {
                    stmt.execute(rusqlite::params![kmer, seqid, pos as i64])?;
                }
            }
            tx.commit()?;
            Ok(seqid)
        })
        .and_then(|seqid| {
            SeqId::try_from(seqid).map_err(|_| Error::IdExhausted)
        })
        .map(|seqid| {
            log::info!("indexed sequence {id_hex} as seqid {seqid} ({} kmers)", kmers.len());
            seqid
        })
    }

    fn lookup_seqid(&self, id_hex: &str) -> Result<Option<SeqId>> {
        let found: Option<i64> = self.store.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT seqid FROM {} WHERE seq = ?1", self.log_table),
                [id_hex],
                |row| row.get(0),
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                e => Err(e),
            })
        })?;
        match found {
            None => Ok(None),
            Some(v) => SeqId::try_from(v).map(Some).map_err(|_| Error::IdExhausted),
        }
    }

    /// Ensures the secondary index over `kmer` exists, building it lazily on
    /// first query and reusing it afterward.
    fn ensure_secondary_index(&self) -> Result<()> {
        if self.secondary_index_built.load(Ordering::Acquire) {
            return Ok(());
        }
        self.store.with_conn(|conn| {
            conn.execute_batch(&format!(
                "CREATE INDEX IF NOT EXISTS idx_{t} ON {t} (kmer);",
                t = self.kmers_table
            ))
        })?;
        self.secondary_index_built.store(true, Ordering::Release);
        Ok(())
    }

    /// All occurrences of `kmer` across indexed sequences.
    pub fn hits(&self, kmer: Kmer) -> Result<Vec<(SeqId, u32)>> {
        self.ensure_secondary_index()?;
        self.store.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT seqid, pos FROM {} WHERE kmer = ?1",
                self.kmers_table
            ))?;
            let rows = stmt.query_map([kmer as i64], |row| {
                Ok((row.get::<_, i64>(0)? as u32, row.get::<_, i64>(1)? as u32))
            })?;
            rows.collect()
        })
    }

    /// Every kmer with at least one hit.
    pub fn distinct_kmers(&self) -> Result<Vec<Kmer>> {
        self.ensure_secondary_index()?;
        self.store.with_conn(|conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT DISTINCT kmer FROM {}", self.kmers_table))?;
            let rows = stmt.query_map([], |row| row.get::<_, i64>(0).map(|v| v as u64))?;
            rows.collect()
        })
    }

    /// All pairs of positions `(pos_a, pos_b)` whose kmer content is
    /// identical between `seq_a` and `seq_b`, and no others. Order of
    /// enumeration is unspecified.
    pub fn seeds(&self, seq_a: SeqId, seq_b: SeqId) -> Result<Vec<(u32, u32)>> {
        self.ensure_secondary_index()?;
        self.store.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT a.pos, b.pos FROM {t} a JOIN {t} b ON a.kmer = b.kmer
                 WHERE a.seqid = ?1 AND b.seqid = ?2",
                t = self.kmers_table
            ))?;
            let rows = stmt.query_map(rusqlite::params![seq_a, seq_b], |row| {
                Ok((row.get::<_, i64>(0)? as u32, row.get::<_, i64>(1)? as u32))
            })?;
            rows.collect()
        })
    }

    /// Length of the sequence assigned `seqid`, as recorded at insert time.
    /// Query modes need this to size the diagonal-band rectangle for
    /// [`crate::segment::build_segments`].
    pub fn seq_length(&self, seqid: SeqId) -> Result<u64> {
        self.store
            .with_conn(|conn| {
                conn.query_row(
                    &format!("SELECT length FROM {} WHERE seqid = ?1", self.log_table),
                    [seqid],
                    |row| row.get::<_, i64>(0),
                )
            })
            .map(|v| v as u64)
    }

    /// Sum of lengths of all indexed sequences.
    pub fn total_length_indexed(&self) -> Result<u64> {
        self.store.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT COALESCE(SUM(length), 0) FROM {}", self.log_table),
                [],
                |row| row.get::<_, i64>(0),
            )
        })
        .map(|v| v as u64)
    }

    /// Number of distinct kmers with at least one hit.
    pub fn num_distinct_kmers(&self) -> Result<u64> {
        self.store.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT COUNT(DISTINCT kmer) FROM {}", self.kmers_table),
                [],
                |row| row.get::<_, i64>(0),
            )
        })
        .map(|v| v as u64)
    }

    pub fn encoder(&self) -> &KmerEncoder {
        &self.encoder
    }
}
