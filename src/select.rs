//! Multiplicative bucket selection.
//!
//! A bucket is chosen as `floor(m * frac(digest * a))`. Computing that
//! product in floating point loses every fractional bit once the digest
//! exceeds 2^53, so the fraction of `a` is stored as a 64-bit fixed-point
//! multiplier and the product is taken modulo 2^64 instead. The high bits of
//! `frac * m` (a 128-bit product) are the bucket index.

use thiserror::Error;

/// Fractional part of the golden ratio, Knuth's suggested constant.
pub const GOLDEN_RATIO_CONJUGATE: f64 = 0.618_033_988_749_894_9;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ConfigError {
    #[error("tuning constant must be finite, got {0}")]
    NonFinite(f64),
    #[error("tuning constant {0} has no fractional part")]
    NoFraction(f64),
}

/// The constant `a` of multiplicative hashing, fixed for a table's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tuning {
    bits: u64,
    multiplier: u64,
}

impl Tuning {
    /// Validate `a`. Only its fractional part matters; negative values wrap
    /// into `[0, 1)`.
    pub fn new(a: f64) -> Result<Self, ConfigError> {
        if !a.is_finite() {
            return Err(ConfigError::NonFinite(a));
        }
        let frac = a.rem_euclid(1.0);
        // 2^64 as f64 is exact; the cast saturates just below it.
        let multiplier = (frac * 18_446_744_073_709_551_616.0) as u64;
        if multiplier == 0 {
            return Err(ConfigError::NoFraction(a));
        }
        Ok(Self {
            bits: a.to_bits(),
            multiplier,
        })
    }

    /// The constant as supplied.
    pub fn value(&self) -> f64 {
        f64::from_bits(self.bits)
    }

    /// `frac(a) * 2^64`.
    pub fn multiplier(&self) -> u64 {
        self.multiplier
    }
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            bits: GOLDEN_RATIO_CONJUGATE.to_bits(),
            multiplier: 0x9e37_79b9_7f4a_7c15,
        }
    }
}

/// Map `digest` to a bucket in `[0, bucket_count)`.
///
/// Stable for a fixed `(bucket_count, tuning)` pair. Returns 0 when
/// `bucket_count` is 0.
#[inline]
pub fn select_bucket(digest: u64, bucket_count: usize, tuning: &Tuning) -> usize {
    let frac = digest.wrapping_mul(tuning.multiplier);
    ((u128::from(frac) * bucket_count as u128) >> 64) as usize
}
