//! Diagonal Statistics — the core's statistical kernel.
//!
//! Converts counts of exact kmer matches inside a diagonal band into a
//! negative-log-p-value (`score_band`), an estimated per-letter match
//! probability (`estimate_p`), and a band radius that keeps a given
//! sensitivity to indel drift (`band_radius`). The inversion used by
//! `estimate_p` is one reasonable closed form for the match density
//! function; see DESIGN.md for the derivation.

use statrs::distribution::{ContinuousCDF, Normal};
use statrs::function::erf::erf_inv;

/// Null-model per-letter-pair match probability `q = |Σ|^-w`.
pub fn null_match_probability(alphabet_size: usize, w: usize) -> f64 {
    (alphabet_size as f64).powi(-(w as i32))
}

/// Number of lattice points `(i, j)` with `0 <= i < m`, `0 <= j < n`, and
/// `d0 <= i - j < d1`, evaluated by summing over the (typically narrow)
/// band width rather than the sequence lengths.
pub fn band_area(m: u64, n: u64, d0: i64, d1: i64) -> u64 {
    let m = m as i64;
    let n = n as i64;
    let mut area: i64 = 0;
    for d in d0..d1 {
        let hi = m.min(n + d);
        let lo = 0i64.max(d);
        if hi > lo {
            area += hi - lo;
        }
    }
    area.max(0) as u64
}

/// Number of lattice points in the band `[d0, d1)` that additionally fall in
/// the antidiagonal window `[a0, a1]` (inclusive), restricted to the
/// `m x n` rectangle. This is the area a local neighborhood score is judged
/// against; plain [`band_area`] only ever sees the `(d0, d1)` component, so
/// local scoring needs this separate, `a`-windowed variant.
pub fn local_band_area(m: u64, n: u64, d0: i64, d1: i64, a0: i64, a1: i64) -> u64 {
    let m = m as i64;
    let n = n as i64;
    let mut area: i64 = 0;
    for d in d0..d1 {
        let i_lo = 0.max(d);
        let i_hi = (m - 1).min(n - 1 + d);
        if i_hi < i_lo {
            continue;
        }
        // i + j = 2i - d must land in [a0, a1] => i in [ceil((a0+d)/2), floor((a1+d)/2)].
        let lo2 = ceil_div2(a0 + d);
        let hi2 = floor_div2(a1 + d);
        let lo = i_lo.max(lo2);
        let hi = i_hi.min(hi2);
        if hi >= lo {
            area += hi - lo + 1;
        }
    }
    area.max(0) as u64
}

fn floor_div2(x: i64) -> i64 {
    x.div_euclid(2)
}

fn ceil_div2(x: i64) -> i64 {
    let q = x.div_euclid(2);
    if x.rem_euclid(2) == 0 {
        q
    } else {
        q + 1
    }
}

/// Shared core of [`score_band`]: negative-log-p-value for `num_matches`
/// observed out of a band whose area is known directly, rather than
/// recomputed from `(m, n, d0, d1)` (local neighborhood scoring uses an
/// `a`-windowed area this way).
pub fn score_for_area(area: f64, q: f64, num_matches: u64, bonferroni_n: Option<u64>) -> f64 {
    let mu = area * q;
    let sigma = (area * q * (1.0 - q)).sqrt();
    let x = num_matches as f64;

    if x <= mu || sigma <= 0.0 {
        return 0.0;
    }

    let z = (mu - x) / sigma;
    let normal = Normal::new(0.0, 1.0).expect("standard normal is always valid");
    let p = normal.cdf(z);
    let mut score = -p.max(f64::MIN_POSITIVE).ln();
    if let Some(n_tests) = bonferroni_n {
        if n_tests > 0 {
            score -= (n_tests as f64).ln();
        }
    }
    score.max(0.0)
}

/// Negative-log-p-value for observing `num_matches` exact kmer matches in a
/// diagonal band of the given sequence lengths, under the null model where
/// each of the `m*n` antidiagonal lattice points independently matches with
/// probability `q`.
///
/// Returns `0.0` whenever `num_matches <= mu` (no evidence of excess matches
/// over the null model). When `bonferroni_n` is `Some(n)`, `ln(n)` is
/// subtracted from the raw score as a Bonferroni correction for `n`
/// independent kmer tests.
pub fn score_band(
    m: u64,
    n: u64,
    band: (i64, i64),
    num_matches: u64,
    q: f64,
    bonferroni_n: Option<u64>,
) -> f64 {
    let area = band_area(m, n, band.0, band.1) as f64;
    score_for_area(area, q, num_matches, bonferroni_n)
}

/// Estimated per-letter match probability `p_hat` for a band of area `A`
/// carrying `X` observed matches, at assumed per-letter gap probability `g`.
///
/// The relation inverted here is `X ≈ A * f(p, g)` with
/// `f(p, g) = (p * (1 - g))^w`: the probability that a random length-`w`
/// window has all `w` letters match (`p` each, independently) and none of
/// its `w` alignment columns carries a gap (`1 - g` each). See DESIGN.md
/// for the derivation of this closed form.
pub fn estimate_p(band_area: u64, num_matches: u64, gap_prob: f64, w: usize) -> f64 {
    if band_area == 0 || w == 0 {
        return 0.0;
    }
    let ratio = (num_matches as f64 / band_area as f64).clamp(0.0, 1.0);
    let base = ratio.powf(1.0 / w as f64);
    let g = gap_prob.clamp(0.0, 0.999);
    (base / (1.0 - g)).clamp(0.0, 1.0)
}

/// Band radius `r` such that a random walk of edits at gap probability
/// `g_max` stays within `[-r, +r]` of its starting diagonal after `k` steps
/// with probability at least `sensitivity`:
/// `P(|shift| <= r after K steps) ≈ erf(r / (2 * sqrt(g * K)))`.
pub fn band_radius(k: u64, g_max: f64, sensitivity: f64) -> u64 {
    if k == 0 || g_max <= 0.0 {
        return 0;
    }
    let target = sensitivity.clamp(0.0, 1.0 - f64::EPSILON);
    let r = 2.0 * (g_max * k as f64).sqrt() * erf_inv(target);
    r.ceil().max(0.0) as u64
}
