//! Segment builder: greedy clustering of scored seeds into similar segments.
//!
//! Greedily clusters scored seeds on the diagonal into maximal, disjoint
//! similar segments: group candidates by diagonal, extend along the
//! antidiagonal, emit and remove the consumed set, driven by the
//! probabilistic band model of [`crate::stats`] rather than exact-match
//! chaining.

use crate::config::Params;
use crate::stats::{band_radius, estimate_p, local_band_area, score_band, score_for_area};
use rayon::prelude::*;

/// A maximal local region of statistically significant kmer-match density.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub band: (i64, i64),
    pub a_range: (i64, i64),
    pub p_hat: f64,
    pub score: f64,
    pub seed_count: u64,
}

impl Segment {
    /// Antidiagonal span length reported to callers: `(a1 - a0) / 2`.
    pub fn span(&self) -> f64 {
        (self.a_range.1 - self.a_range.0) as f64 / 2.0
    }
}

#[derive(Debug, Clone, Copy)]
struct ScoredSeed {
    d: i64,
    a: i64,
    local_score: f64,
}

/// Clusters `seeds` (positions `(i, j)` for sequences of lengths `m`, `n`)
/// into disjoint similar segments under null-model match probability `q`,
/// via a five-step greedy algorithm. Segments are returned in descending
/// score order; ties break by larger antidiagonal extent, then lower
/// starting antidiagonal. Returns an empty vector on zero seeds — not an
/// error.
pub fn build_segments(seeds: &[(u32, u32)], m: u64, n: u64, q: f64, params: &Params) -> Vec<Segment> {
    if seeds.is_empty() {
        return Vec::new();
    }

    let w = params.w;
    let local_k = (params.k_scale * w as f64).round().max(1.0) as u64;
    let r_local = band_radius(local_k, params.g_max, params.sensitivity) as i64;
    let a_half_width = (2.0 * r_local as f64 * params.k_scale).round().max(0.0) as i64;
    let adjacency = (w as f64 * params.k_scale).round().max(0.0) as i64;

    let points: Vec<(i64, i64)> = seeds
        .iter()
        .map(|&(i, j)| (i as i64 - j as i64, i as i64 + j as i64))
        .collect();

    // Step 2: local neighborhood score for every seed. Independent per seed
    // and purely CPU-bound, so this fans out across rayon's global pool
    // instead of a sequential scan.
    let mut pool: Vec<ScoredSeed> = points
        .par_iter()
        .map(|&(d, a)| {
            let neighbor_count = points
                .iter()
                .filter(|&&(nd, na)| (nd - d).abs() <= r_local && (na - a).abs() <= a_half_width)
                .count() as u64;
            let band = (d - r_local, d + r_local + 1);
            let area = local_band_area(m, n, band.0, band.1, a - a_half_width, a + a_half_width);
            let p_hat = estimate_p(area, neighbor_count, params.g_max, w);
            let score = score_for_area(area as f64, q, neighbor_count, params.bonferroni_n);
            let local_score = if p_hat >= params.p_min && score > 0.0 {
                score
            } else {
                -1.0
            };
            ScoredSeed { d, a, local_score }
        })
        .collect();

    // Step 3: filtering.
    pool.retain(|s| s.local_score > 0.0);
    pool.sort_by(|x, y| {
        y.local_score
            .partial_cmp(&x.local_score)
            .expect("local scores are always finite")
            .then(y.a.cmp(&x.a))
    });

    // Step 4/5: greedy clustering until the filtered pool is exhausted.
    let mut segments = Vec::new();
    while !pool.is_empty() {
        let seed0 = pool[0];
        let mut joined = vec![0usize];
        let mut d_star = seed0.d as f64;
        let mut a0 = seed0.a;
        let mut a1 = seed0.a;

        loop {
            let mut grown = false;
            for (idx, s) in pool.iter().enumerate() {
                if joined.contains(&idx) {
                    continue;
                }
                let in_band = (s.d as f64 - d_star).abs() <= r_local as f64;
                let boundary_dist = if s.a < a0 {
                    a0 - s.a
                } else if s.a > a1 {
                    s.a - a1
                } else {
                    0
                };
                if in_band && boundary_dist <= adjacency {
                    joined.push(idx);
                    a0 = a0.min(s.a);
                    a1 = a1.max(s.a);
                    grown = true;
                }
            }
            if !grown {
                break;
            }
            let sum_d: f64 = joined.iter().map(|&i| pool[i].d as f64).sum();
            d_star = sum_d / joined.len() as f64;
        }

        // The unweighted centroid can drift outside r_local of an
        // early-joined member once enough later points join on one side, so
        // the emitted band is widened to the joined set's actual [min, max]
        // diagonal range rather than trusting centroid +/- r_local alone.
        // Otherwise seed_count could count seeds the band doesn't contain.
        let min_d = joined.iter().map(|&i| pool[i].d).min().expect("joined is non-empty");
        let max_d = joined.iter().map(|&i| pool[i].d).max().expect("joined is non-empty");
        let d0 = ((d_star - r_local as f64).floor() as i64).min(min_d);
        let d1 = (((d_star + r_local as f64).ceil() as i64) + 1).max(max_d + 1);
        let seed_count = joined.len() as u64;
        let area = crate::stats::band_area(m, n, d0, d1);
        let p_hat = (estimate_p(area, seed_count, params.g_max, w) * 100.0).round() / 100.0;
        let score = score_band(m, n, (d0, d1), seed_count, q, params.bonferroni_n);

        segments.push(Segment {
            band: (d0, d1),
            a_range: (a0, a1),
            p_hat,
            score,
            seed_count,
        });

        joined.sort_unstable_by(|a, b| b.cmp(a));
        for idx in joined {
            pool.remove(idx);
        }
    }

    segments.sort_by(|x, y| {
        y.score
            .partial_cmp(&x.score)
            .expect("scores are always finite")
            .then_with(|| y.span().partial_cmp(&x.span()).expect("spans are finite"))
            .then_with(|| x.a_range.0.cmp(&y.a_range.0))
    });
    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::null_match_probability;

    #[test]
    fn empty_seeds_yield_no_segments() {
        let params = Params::default();
        assert!(build_segments(&[], 1000, 1000, 0.01, &params).is_empty());
    }

    #[test]
    fn fully_dense_rectangle_consumes_every_seed_at_full_confidence() {
        // Every (i, j) in a 4x4 rectangle matches: density is 1 everywhere,
        // so every local window's match count equals its lattice area and
        // p_hat saturates to 1.0 regardless of the exact band radius.
        let m = 4u64;
        let n = 4u64;
        let seeds: Vec<(u32, u32)> = (0..m as u32)
            .flat_map(|i| (0..n as u32).map(move |j| (i, j)))
            .collect();
        let params = Params {
            w: 1,
            p_min: 0.7,
            g_max: 0.2,
            sensitivity: 0.9,
            k_min: 1,
            k_scale: 2.0,
            min_margin: 1,
            bonferroni_n: None,
        };
        let q = 0.01;
        let segments = build_segments(&seeds, m, n, q, &params);

        assert!(!segments.is_empty());
        let total: u64 = segments.iter().map(|s| s.seed_count).sum();
        assert_eq!(total, (m * n) as u64, "every seed must end up in exactly one segment");
        for seg in &segments {
            assert!((0.0..=1.0).contains(&seg.p_hat), "p_hat={}", seg.p_hat);
            assert!(seg.score >= 0.0);
        }
        // the largest segment (the fully connected core of the grid) sees
        // local match density 1.0 and should round to p_hat == 1.0.
        let biggest = segments.iter().max_by_key(|s| s.seed_count).unwrap();
        assert!((biggest.p_hat - 1.0).abs() < 1e-9, "p_hat={}", biggest.p_hat);
    }

    #[test]
    fn segments_are_emitted_in_descending_score_order() {
        let m = 4u64;
        let n = 4u64;
        let seeds: Vec<(u32, u32)> = (0..m as u32)
            .flat_map(|i| (0..n as u32).map(move |j| (i, j)))
            .collect();
        let params = Params {
            w: 1,
            k_scale: 1.0,
            ..Params::default()
        };
        let segments = build_segments(&seeds, m, n, 0.01, &params);
        for pair in segments.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn two_isolated_seeds_in_a_large_sparse_rectangle_yield_no_segment() {
        // Two far-apart single seeds in a 1000x1000 rectangle, at w=1 where
        // a single letter match (q=1/4) is expected by chance many times
        // over in any neighborhood of nontrivial area: mu far exceeds the
        // observed count of 1, so score_for_area returns 0 and the seed is
        // discarded in step 3 regardless of p_hat.
        let m = 1000u64;
        let n = 1000u64;
        let seeds = vec![(10u32, 10u32), (900u32, 900u32)];
        let params = Params {
            w: 1,
            ..Params::default()
        };
        let q = null_match_probability(4, params.w);
        let segments = build_segments(&seeds, m, n, q, &params);
        assert!(segments.is_empty());
    }

    /// Every emitted segment's band must contain every seed counted in its
    /// own seed_count, even when the unweighted centroid drifts away from
    /// an early-joined member as later seeds pile onto one side (tandem
    /// repeats produce exactly this shape).
    #[test]
    fn emitted_band_always_contains_every_joined_seed() {
        let m = 2000u64;
        let n = 2000u64;
        // Diagonals 0, 2, 3, 3, 4 at increasing antidiagonal positions: the
        // running unweighted mean walks from 1.0 to 2.4, eventually putting
        // d=0 outside a radius-2 window of the final centroid.
        let seeds: Vec<(u32, u32)> = vec![
            (100, 100),
            (102, 100),
            (104, 101),
            (105, 101),
            (107, 102),
        ];
        let params = Params {
            w: 1,
            p_min: 0.0,
            g_max: 0.2,
            sensitivity: 0.95,
            k_min: 0,
            k_scale: 50.0,
            min_margin: 1,
            bonferroni_n: None,
        };
        let q = 1e-6;
        let segments = build_segments(&seeds, m, n, q, &params);

        for seg in &segments {
            let in_band_count = seeds
                .iter()
                .filter(|&&(i, j)| {
                    let d = i as i64 - j as i64;
                    let a = i as i64 + j as i64;
                    seg.band.0 <= d
                        && d < seg.band.1
                        && seg.a_range.0 <= a
                        && a <= seg.a_range.1
                })
                .count() as u64;
            assert!(
                in_band_count >= seg.seed_count,
                "segment {seg:?} claims seed_count={} but band only contains {in_band_count} of the input seeds",
                seg.seed_count
            );
        }
    }
}
