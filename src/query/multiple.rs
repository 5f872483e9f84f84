//! Multiple mode: consistent k-mer matches across three or more sequences.
//!
//! Generalizes the pairwise diagonal model to `k >= 3` sequences: the first
//! sequence's position `i1` is the reference, `d_r = i_r - i1` for
//! `r = 2..k` gives a `(k-1)`-dimensional diagonal coordinate, and `i1`
//! itself stands in for the pairwise case's antidiagonal extent axis `a`.
//! [`crate::stats`]'s band-area formulas only model one diagonal dimension
//! against a known `m x n` rectangle; here there is no such rectangle (the
//! k-tuple join carries no sequence-length parameters), so each `d_r` axis
//! is treated as an independent Bernoulli trial at the same `q`, and its
//! neighborhood/band area is a hyper-cube volume clipped to the coordinate
//! bounds actually observed across the input tuples rather than the exact
//! lattice count the pairwise model derives for `k = 2`. Recorded as an
//! open design choice in DESIGN.md.

use crate::config::Params;
use crate::error::Result;
use crate::index::{KmerIndex, SeqId};
use crate::seed;
use crate::stats::{band_radius, estimate_p, null_match_probability, score_for_area};

/// A scored k-tuple similar segment.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiSegment {
    /// One `(d0, d1)` band per non-reference sequence (`seq_ids.len() - 1`
    /// entries, in the same order as `seq_ids[1..]`).
    pub bands: Vec<(i64, i64)>,
    pub a_range: (i64, i64),
    pub p_hat: f64,
    pub score: f64,
    pub seed_count: u64,
}

struct ScoredTuple {
    d: Vec<i64>,
    a: i64,
    local_score: f64,
}

/// Clusters k-tuple seeds (`seq_ids.len() >= 3`) across `seq_ids` into
/// scored higher-order segments, using the same greedy clustering as
/// [`crate::segment::build_segments`] generalized to `k - 1` dimensions.
pub fn query(index: &KmerIndex, seq_ids: &[SeqId], params: &Params) -> Result<Vec<MultiSegment>> {
    params.validate()?;
    let tuples = seed::multiple(index, seq_ids)?;
    let q = null_match_probability(index.encoder().alphabet().len(), params.w);
    Ok(build_multi_segments(&tuples, q, params))
}

/// Length-`lo..=hi` overlap of the window `[center - radius, center +
/// radius]` with the bounding interval `[lo, hi]`. Mirrors
/// [`crate::stats::local_band_area`]'s clipping of a neighborhood window to
/// the sequence rectangle, generalized per dimension.
fn clipped_width(center: i64, radius: i64, lo: i64, hi: i64) -> i64 {
    let w_lo = (center - radius).max(lo);
    let w_hi = (center + radius).min(hi);
    (w_hi - w_lo + 1).max(0)
}

/// Overlap of the half-open interval `[lo, hi_exclusive)` with the bounding
/// interval `[bound_lo, bound_hi]`.
fn clipped_interval(lo: i64, hi_exclusive: i64, bound_lo: i64, bound_hi: i64) -> i64 {
    let l = lo.max(bound_lo);
    let h = (hi_exclusive - 1).min(bound_hi);
    (h - l + 1).max(0)
}

fn build_multi_segments(tuples: &[Vec<u32>], q: f64, params: &Params) -> Vec<MultiSegment> {
    if tuples.is_empty() {
        return Vec::new();
    }
    let dims = tuples[0].len() - 1;
    let w = params.w;
    let local_k = (params.k_scale * w as f64).round().max(1.0) as u64;
    let r_local = band_radius(local_k, params.g_max, params.sensitivity) as i64;
    let a_half_width = (2.0 * r_local as f64 * params.k_scale).round().max(0.0) as i64;
    let adjacency = (w as f64 * params.k_scale).round().max(0.0) as i64;

    let points: Vec<(Vec<i64>, i64)> = tuples
        .iter()
        .map(|t| {
            let i1 = t[0] as i64;
            let d: Vec<i64> = t[1..].iter().map(|&ir| ir as i64 - i1).collect();
            (d, i1)
        })
        .collect();

    // No sequence-length parameters flow into this k-tuple join (the seed
    // generator only gives positions), so each dimension's bounding
    // interval is taken from the observed tuples themselves rather than
    // the true sequence length.
    let d_bounds: Vec<(i64, i64)> = (0..dims)
        .map(|k| {
            let vals = points.iter().map(|(d, _)| d[k]);
            (vals.clone().min().unwrap(), vals.max().unwrap())
        })
        .collect();
    let a_bounds = points.iter().map(|(_, a)| *a).fold(
        (i64::MAX, i64::MIN),
        |(lo, hi), a| (lo.min(a), hi.max(a)),
    );

    let mut pool: Vec<ScoredTuple> = points
        .iter()
        .map(|(d, a)| {
            let neighbor_count = points
                .iter()
                .filter(|(nd, na)| {
                    (na - a).abs() <= a_half_width
                        && nd.iter().zip(d).all(|(x, y)| (x - y).abs() <= r_local)
                })
                .count() as u64;
            let area: f64 = d
                .iter()
                .enumerate()
                .map(|(k, &dk)| clipped_width(dk, r_local, d_bounds[k].0, d_bounds[k].1) as f64)
                .product::<f64>()
                * clipped_width(*a, a_half_width, a_bounds.0, a_bounds.1) as f64;
            let p_hat = estimate_p(area.round() as u64, neighbor_count, params.g_max, w);
            let score = score_for_area(area, q, neighbor_count, params.bonferroni_n);
            let local_score = if p_hat >= params.p_min && score > 0.0 {
                score
            } else {
                -1.0
            };
            ScoredTuple {
                d: d.clone(),
                a: *a,
                local_score,
            }
        })
        .collect();

    pool.retain(|s| s.local_score > 0.0);
    pool.sort_by(|x, y| {
        y.local_score
            .partial_cmp(&x.local_score)
            .expect("local scores are always finite")
            .then(y.a.cmp(&x.a))
    });

    let mut segments = Vec::new();
    while !pool.is_empty() {
        let mut joined = vec![0usize];
        let mut d_star: Vec<f64> = pool[0].d.iter().map(|&v| v as f64).collect();
        let mut a0 = pool[0].a;
        let mut a1 = pool[0].a;

        loop {
            let mut grown = false;
            for (idx, s) in pool.iter().enumerate() {
                if joined.contains(&idx) {
                    continue;
                }
                let in_band = s
                    .d
                    .iter()
                    .zip(&d_star)
                    .all(|(&v, &c)| (v as f64 - c).abs() <= r_local as f64);
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
            for (dim, c) in d_star.iter_mut().enumerate() {
                *c = joined.iter().map(|&i| pool[i].d[dim] as f64).sum::<f64>() / joined.len() as f64;
            }
        }

        // As in segment::build_segments: the unweighted per-dimension
        // centroid can drift outside r_local of an early-joined member, so
        // each dimension's band is widened to the joined set's actual
        // [min, max] range on that axis rather than trusting centroid +/-
        // r_local alone.
        let bands: Vec<(i64, i64)> = d_star
            .iter()
            .enumerate()
            .map(|(dim, &c)| {
                let min_dk = joined
                    .iter()
                    .map(|&i| pool[i].d[dim])
                    .min()
                    .expect("joined is non-empty");
                let max_dk = joined
                    .iter()
                    .map(|&i| pool[i].d[dim])
                    .max()
                    .expect("joined is non-empty");
                let lo = ((c - r_local as f64).floor() as i64).min(min_dk);
                let hi = (((c + r_local as f64).ceil() as i64) + 1).max(max_dk + 1);
                (lo, hi)
            })
            .collect();
        let seed_count = joined.len() as u64;
        // Final emission uses the full (not a-restricted) band per
        // dimension, clipped to the empirically observed coordinate bounds
        // rather than to a true sequence rectangle (see build_multi_segments
        // doc comment).
        let area: f64 = bands
            .iter()
            .zip(&d_bounds)
            .map(|(&(d0, d1), &(lo, hi))| clipped_interval(d0, d1, lo, hi) as f64)
            .product();
        let p_hat = (estimate_p(area.round() as u64, seed_count, params.g_max, w) * 100.0).round() / 100.0;
        let score = score_for_area(area, q, seed_count, params.bonferroni_n);

        segments.push(MultiSegment {
            bands,
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
            .then_with(|| {
                let span_x = (x.a_range.1 - x.a_range.0) as f64;
                let span_y = (y.a_range.1 - y.a_range.0) as f64;
                span_y.partial_cmp(&span_x).expect("spans are finite")
            })
            .then_with(|| x.a_range.0.cmp(&y.a_range.0))
    });
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_tuples_yield_no_segments() {
        let params = Params::default();
        assert!(build_multi_segments(&[], 0.01, &params).is_empty());
    }

    #[test]
    fn a_dense_3d_cluster_conserves_every_tuple() {
        // Every (i1, i2, i3) in a 3x3x3 cube matches: density is 1
        // everywhere, mirroring the 2D dense-rectangle case in segment.rs.
        let side = 3u32;
        let tuples: Vec<Vec<u32>> = (0..side)
            .flat_map(|i1| {
                (0..side).flat_map(move |i2| (0..side).map(move |i3| vec![i1, i2, i3]))
            })
            .collect();
        // k_scale/sensitivity are pushed high enough that r_local exceeds
        // the cube's full coordinate range (4) on every axis, so every
        // tuple is a mutual neighbor of every other regardless of which
        // seed the greedy pass starts from.
        let params = Params {
            w: 1,
            p_min: 0.45,
            g_max: 0.3,
            sensitivity: 0.999,
            k_min: 1,
            k_scale: 4.0,
            min_margin: 1,
            bonferroni_n: None,
        };
        let segments = build_multi_segments(&tuples, 0.01, &params);
        assert!(!segments.is_empty());
        let total: u64 = segments.iter().map(|s| s.seed_count).sum();
        assert_eq!(total, (side * side * side) as u64);
        for seg in &segments {
            assert!((0.0..=1.0).contains(&seg.p_hat));
            assert!(seg.score >= 0.0);
            assert_eq!(seg.bands.len(), 2);
        }
    }
}
