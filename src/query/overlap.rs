//! Overlap mode: long-read overlap detection for assembly layout.

use crate::config::Params;
use crate::error::{Error, Result};
use crate::index::{KmerIndex, SeqId};
use crate::seed;
use crate::segment::build_segments;
use crate::stats::null_match_probability;

/// A directed overlap edge, ready to hand to an overlap-graph layout stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlapEdge {
    pub from: SeqId,
    pub to: SeqId,
    pub score: f64,
    pub shift: i64,
}

/// Finds the best-scoring segment whose antidiagonal range touches both
/// opposite corners of the `m x n` rectangle, and reports it as a directed
/// overlap edge.
///
/// `ε` is taken as each candidate segment's own band radius. Returns
/// `Error::NoOverlap` when no segment qualifies, and
/// `Error::AmbiguousOverlap` when the qualifying segment's direction
/// cannot be trusted: either margin (`|d*|` or `|(m-n)-d*|`) at or below
/// `params.min_margin`, which also covers the degenerate `d* ~ 0` case of a
/// sequence overlapping itself.
pub fn query(index: &KmerIndex, seq_a: SeqId, seq_b: SeqId, params: &Params) -> Result<OverlapEdge> {
    params.validate()?;
    let m = index.seq_length(seq_a)?;
    let n = index.seq_length(seq_b)?;
    let seeds = seed::pairwise(index, seq_a, seq_b)?;
    let q = null_match_probability(index.encoder().alphabet().len(), params.w);
    let segments = build_segments(&seeds, m, n, q, params);

    // The achievable antidiagonal range tops out at (m - w) + (n - w), not
    // m + n: valid kmer-start positions run only up to len - w.
    let total = (m as i64 + n as i64 - 2 * params.w as i64).max(0);
    let best = segments
        .into_iter()
        .filter(|s| {
            let eps = ((s.band.1 - s.band.0) / 2).max(0);
            s.a_range.0 <= eps && s.a_range.1 >= total - eps
        })
        .max_by(|x, y| x.score.partial_cmp(&y.score).expect("scores are finite"));

    let Some(segment) = best else {
        return Err(Error::NoOverlap);
    };

    // Midpoint of the half-open band [d0, d1).
    let d_star = (segment.band.0 + segment.band.1 - 1) as f64 / 2.0;
    let margin_a = d_star.abs();
    let margin_b = ((m as i64 - n as i64) as f64 - d_star).abs();
    let min_margin = params.min_margin as f64;

    if margin_a <= min_margin || margin_b <= min_margin {
        return Err(Error::AmbiguousOverlap {
            d_star: d_star.round() as i64,
            margin: margin_a.min(margin_b).round() as i64,
            min_margin: params.min_margin,
        });
    }

    let (from, to, shift) = if d_star > 0.0 {
        (seq_a, seq_b, d_star.round() as i64)
    } else {
        (seq_b, seq_a, (-d_star).round() as i64)
    };

    Ok(OverlapEdge {
        from,
        to,
        score: segment.score,
        shift,
    })
}
