//! Local mode: pairwise similar-segment search.

use crate::config::Params;
use crate::error::Result;
use crate::index::{KmerIndex, SeqId};
use crate::seed;
use crate::segment::{build_segments, Segment};
use crate::stats::null_match_probability;

/// All similar segments between `seq_a` and `seq_b` with `p_hat >= p_min`
/// and antidiagonal span `>= k_min`.
pub fn query(index: &KmerIndex, seq_a: SeqId, seq_b: SeqId, params: &Params) -> Result<Vec<Segment>> {
    params.validate()?;
    let m = index.seq_length(seq_a)?;
    let n = index.seq_length(seq_b)?;
    let seeds = seed::pairwise(index, seq_a, seq_b)?;
    let q = null_match_probability(index.encoder().alphabet().len(), params.w);
    let segments = build_segments(&seeds, m, n, q, params);
    Ok(segments
        .into_iter()
        .filter(|s| s.p_hat >= params.p_min && s.span() >= params.k_min as f64)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::Alphabet;
    use crate::kmer::KmerEncoder;
    use crate::sequence::Sequence;
    use crate::store::Store;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::sync::Arc;

    fn random_letters(rng: &mut StdRng, len: usize, alphabet_size: u8) -> Vec<u8> {
        (0..len).map(|_| rng.gen_range(0..alphabet_size)).collect()
    }

    fn mutate(rng: &mut StdRng, letters: &[u8], subst: f64, gap: f64, alphabet_size: u8) -> Vec<u8> {
        let mut out = Vec::with_capacity(letters.len());
        for &l in letters {
            let roll: f64 = rng.gen();
            if roll < gap {
                continue;
            } else if roll < gap + subst {
                let mut nl = rng.gen_range(0..alphabet_size);
                while nl == l {
                    nl = rng.gen_range(0..alphabet_size);
                }
                out.push(nl);
            } else {
                out.push(l);
            }
        }
        out
    }

    /// A shared 1000-letter region embedded in otherwise-unrelated flanking
    /// sequence, with 10% substitutions and 5% gaps in one copy, should
    /// surface as exactly one reasonably confident local segment.
    #[test]
    fn finds_one_segment_over_a_shared_region_with_noisy_flanks() {
        let mut rng = StdRng::seed_from_u64(7);
        let alphabet = Alphabet::dna();
        let shared = random_letters(&mut rng, 1000, 4);
        let mutated = mutate(&mut rng, &shared, 0.1, 0.05, 4);

        let mut s_letters = random_letters(&mut rng, 500, 4);
        s_letters.extend_from_slice(&shared);
        s_letters.extend(random_letters(&mut rng, 500, 4));

        let mut t_letters = random_letters(&mut rng, 500, 4);
        t_letters.extend_from_slice(&mutated);
        t_letters.extend(random_letters(&mut rng, 500, 4));

        let store = Arc::new(Store::open_memory().unwrap());
        let encoder = KmerEncoder::new(alphabet, 12).unwrap();
        let index = KmerIndex::open(store, "local_test", encoder).unwrap();

        let s = index.insert(&Sequence::new("S", s_letters)).unwrap();
        let t = index.insert(&Sequence::new("T", t_letters)).unwrap();

        let params = Params::default();
        let segments = query(&index, s, t, &params).unwrap();

        assert!(!segments.is_empty(), "expected at least one segment over the shared region");
        let best = segments
            .iter()
            .max_by(|a, b| a.score.partial_cmp(&b.score).unwrap())
            .unwrap();
        assert!(best.p_hat >= params.p_min);
        assert!(best.span() > 200.0, "span={}", best.span());
    }

    /// Invalid parameters (`p_min` out of `[0, 1]`, `w == 0`) must fail fast
    /// at the query entry point rather than silently filtering every
    /// segment out.
    #[test]
    fn invalid_params_fail_fast_instead_of_silently_filtering() {
        let store = Arc::new(Store::open_memory().unwrap());
        let encoder = KmerEncoder::new(Alphabet::dna(), 3).unwrap();
        let index = KmerIndex::open(store, "invalid_params_test", encoder).unwrap();
        let s = index.insert(&Sequence::new("S", vec![0, 1, 2, 3])).unwrap();
        let t = index.insert(&Sequence::new("T", vec![0, 1, 2, 3])).unwrap();

        let params = Params {
            p_min: 5.0,
            w: 0,
            ..Params::default()
        };
        let err = query(&index, s, t, &params).expect_err("p_min=5.0, w=0 must be rejected");
        assert!(matches!(err, crate::error::Error::InvalidParameter(_)));
    }
}
