//! Seed generation: joining shared kmers across sequences.
//!
//! Thin wrapper over [`KmerIndex::hits`]/[`KmerIndex::seeds`] that joins
//! shared kmers across two or more indexed sequences. Pairwise queries
//! delegate straight to the index's SQL join; k-tuple queries (`k >= 3`,
//! the Multiple-mode case) fall back to grouping [`KmerIndex::hits`] by
//! sequence and taking the Cartesian product per shared kmer, since no
//! single join expresses an arbitrary-arity equi-join in the index's
//! two-column schema.

use crate::error::{Error, Result};
use crate::index::{KmerIndex, SeqId};

/// Pairwise seeds: every `(pos_a, pos_b)` whose kmer content matches between
/// `seq_a` and `seq_b`.
pub fn pairwise(index: &KmerIndex, seq_a: SeqId, seq_b: SeqId) -> Result<Vec<(u32, u32)>> {
    index.seeds(seq_a, seq_b)
}

/// K-tuple seeds for `seq_ids.len() >= 2`: every tuple of positions, one per
/// sequence in `seq_ids` (same order), sharing a common kmer value. The
/// caller must treat the output as
/// potentially quadratic or higher-order in per-kmer hit counts — a kmer
/// with `h` hits in each of `k` sequences contributes `h^k` tuples.
pub fn multiple(index: &KmerIndex, seq_ids: &[SeqId]) -> Result<Vec<Vec<u32>>> {
    if seq_ids.len() < 2 {
        return Err(Error::InvalidParameter(
            "multiple-sequence seeding requires at least 2 sequence ids".into(),
        ));
    }
    if seq_ids.len() == 2 {
        return Ok(pairwise(index, seq_ids[0], seq_ids[1])?
            .into_iter()
            .map(|(a, b)| vec![a, b])
            .collect());
    }

    let mut out = Vec::new();
    for kmer in index.distinct_kmers()? {
        let hits = index.hits(kmer)?;
        let mut groups: Vec<Vec<u32>> = vec![Vec::new(); seq_ids.len()];
        for (sid, pos) in hits {
            if let Some(slot) = seq_ids.iter().position(|&s| s == sid) {
                groups[slot].push(pos);
            }
        }
        if groups.iter().any(Vec::is_empty) {
            continue;
        }
        out.extend(cartesian_product(&groups));
    }
    Ok(out)
}

fn cartesian_product(groups: &[Vec<u32>]) -> Vec<Vec<u32>> {
    let mut product: Vec<Vec<u32>> = vec![Vec::new()];
    for group in groups {
        let mut next = Vec::with_capacity(product.len() * group.len());
        for prefix in &product {
            for &pos in group {
                let mut tuple = prefix.clone();
                tuple.push(pos);
                next.push(tuple);
            }
        }
        product = next;
    }
    product
}
