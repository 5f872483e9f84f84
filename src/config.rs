//! Explicit configuration structs.
//!
//! Every tunable the diagonal-statistics model, segment builder, and query
//! modes need lives here and is threaded through constructors explicitly —
//! no module-level statics or global mutable configuration.

use crate::error::{Error, Result};

/// Parameters shared by the diagonal-statistics model, the segment builder,
/// and all three query modes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Params {
    /// K-mer length.
    pub w: usize,
    /// Minimum estimated match probability for a segment to be reported.
    pub p_min: f64,
    /// Maximum per-letter gap probability assumed by band-radius calculation.
    pub g_max: f64,
    /// Target probability that a random walk stays within the band.
    pub sensitivity: f64,
    /// Minimum segment antidiagonal length.
    pub k_min: u64,
    /// Neighborhood scale factor for local scoring's second pass.
    pub k_scale: f64,
    /// Minimum corner distance for a reliable overlap direction.
    pub min_margin: i64,
    /// Optional Bonferroni correction factor N (total number of kmer
    /// tests); when set, `stats::score_band` subtracts `ln(N)`.
    pub bonferroni_n: Option<u64>,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            w: 12,
            p_min: 0.7,
            g_max: 0.2,
            sensitivity: 0.95,
            k_min: 100,
            k_scale: 2.0,
            min_margin: 5,
            bonferroni_n: None,
        }
    }
}

impl Params {
    /// Validates the parameter set, failing fast so parameter errors are
    /// caught at construction rather than surfacing as silent wrong results
    /// downstream.
    pub fn validate(&self) -> Result<()> {
        if self.w == 0 {
            return Err(Error::InvalidParameter("w must be > 0".into()));
        }
        if !(0.0..=1.0).contains(&self.p_min) {
            return Err(Error::InvalidParameter(format!(
                "p_min must be in [0, 1], got {}",
                self.p_min
            )));
        }
        if !(0.0..1.0).contains(&self.g_max) {
            return Err(Error::InvalidParameter(format!(
                "g_max must be in [0, 1), got {}",
                self.g_max
            )));
        }
        if !(0.0..1.0).contains(&self.sensitivity) {
            return Err(Error::InvalidParameter(format!(
                "sensitivity must be in [0, 1), got {}",
                self.sensitivity
            )));
        }
        if self.k_scale <= 0.0 {
            return Err(Error::InvalidParameter("k_scale must be > 0".into()));
        }
        if self.min_margin < 0 {
            return Err(Error::InvalidParameter("min_margin must be >= 0".into()));
        }
        Ok(())
    }
}
