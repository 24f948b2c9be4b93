//! Serial (portable) kernels for every supported metric/dtype pair.
//!
//! These functions serve as:
//! - Fallback on platforms without SIMD support
//! - Reference implementations for cross-tier agreement tests
//! - The unconditional last row of the dispatch table
//!
//! Accumulator widths follow the mixed-precision invariant: f16/bf16 inputs
//! accumulate in `f32`, i8 inputs in `i32`, f64 inputs in `f64`.

#![allow(clippy::cast_precision_loss)] // popcounts and i32 accumulators fit f64 exactly
#![allow(clippy::similar_names)]

use half::{bf16, f16};

use super::scalar;

// =============================================================================
// Dot product
// =============================================================================

pub(crate) fn dot_f64(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

pub(crate) fn dot_f32(a: &[f32], b: &[f32]) -> f64 {
    let sum: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    f64::from(sum)
}

pub(crate) fn dot_f16(a: &[f16], b: &[f16]) -> f64 {
    let sum: f32 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| x.to_f32() * y.to_f32())
        .sum();
    f64::from(sum)
}

pub(crate) fn dot_bf16(a: &[bf16], b: &[bf16]) -> f64 {
    let sum: f32 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| x.to_f32() * y.to_f32())
        .sum();
    f64::from(sum)
}

pub(crate) fn dot_i8(a: &[i8], b: &[i8]) -> f64 {
    let sum: i32 = a
        .iter()
        .zip(b.iter())
        .map(|(&x, &y)| i32::from(x) * i32::from(y))
        .sum();
    f64::from(sum)
}

// =============================================================================
// Cosine distance
// =============================================================================

/// Single-pass dot + norms, finalized through the shared zero-norm policy.
pub(crate) fn cos_f32(a: &[f32], b: &[f32]) -> f64 {
    let mut ab = 0.0_f32;
    let mut a2 = 0.0_f32;
    let mut b2 = 0.0_f32;

    for (&x, &y) in a.iter().zip(b.iter()) {
        ab += x * y;
        a2 += x * x;
        b2 += y * y;
    }

    scalar::cos_from_f32(ab, a2, b2)
}

pub(crate) fn cos_f64(a: &[f64], b: &[f64]) -> f64 {
    let mut ab = 0.0_f64;
    let mut a2 = 0.0_f64;
    let mut b2 = 0.0_f64;

    for (&x, &y) in a.iter().zip(b.iter()) {
        ab += x * y;
        a2 += x * x;
        b2 += y * y;
    }

    scalar::cos_from_f64(ab, a2, b2)
}

pub(crate) fn cos_f16(a: &[f16], b: &[f16]) -> f64 {
    let mut ab = 0.0_f32;
    let mut a2 = 0.0_f32;
    let mut b2 = 0.0_f32;

    for (x, y) in a.iter().zip(b.iter()) {
        let (x, y) = (x.to_f32(), y.to_f32());
        ab += x * y;
        a2 += x * x;
        b2 += y * y;
    }

    scalar::cos_from_f32(ab, a2, b2)
}

pub(crate) fn cos_bf16(a: &[bf16], b: &[bf16]) -> f64 {
    let mut ab = 0.0_f32;
    let mut a2 = 0.0_f32;
    let mut b2 = 0.0_f32;

    for (x, y) in a.iter().zip(b.iter()) {
        let (x, y) = (x.to_f32(), y.to_f32());
        ab += x * y;
        a2 += x * x;
        b2 += y * y;
    }

    scalar::cos_from_f32(ab, a2, b2)
}

pub(crate) fn cos_i8(a: &[i8], b: &[i8]) -> f64 {
    let mut ab = 0_i32;
    let mut a2 = 0_i32;
    let mut b2 = 0_i32;

    for (&x, &y) in a.iter().zip(b.iter()) {
        let (x, y) = (i32::from(x), i32::from(y));
        ab += x * y;
        a2 += x * x;
        b2 += y * y;
    }

    scalar::cos_from_f32(ab as f32, a2 as f32, b2 as f32)
}

// =============================================================================
// Squared Euclidean distance
// =============================================================================

pub(crate) fn l2sq_f64(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

pub(crate) fn l2sq_f32(a: &[f32], b: &[f32]) -> f64 {
    let sum: f32 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum();
    f64::from(sum)
}

pub(crate) fn l2sq_f16(a: &[f16], b: &[f16]) -> f64 {
    let sum: f32 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x.to_f32() - y.to_f32();
            d * d
        })
        .sum();
    f64::from(sum)
}

pub(crate) fn l2sq_bf16(a: &[bf16], b: &[bf16]) -> f64 {
    let sum: f32 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x.to_f32() - y.to_f32();
            d * d
        })
        .sum();
    f64::from(sum)
}

pub(crate) fn l2sq_i8(a: &[i8], b: &[i8]) -> f64 {
    let sum: i32 = a
        .iter()
        .zip(b.iter())
        .map(|(&x, &y)| {
            let d = i32::from(x) - i32::from(y);
            d * d
        })
        .sum();
    f64::from(sum)
}

// =============================================================================
// Packed-bitset metrics
// =============================================================================

/// Bit-level disagreement count; `n` counts bytes, not bits.
pub(crate) fn hamming_b8(a: &[u8], b: &[u8]) -> f64 {
    let diff: u64 = a
        .iter()
        .zip(b.iter())
        .map(|(&x, &y)| u64::from((x ^ y).count_ones()))
        .sum();
    diff as f64
}

pub(crate) fn jaccard_b8(a: &[u8], b: &[u8]) -> f64 {
    let mut intersection = 0_u64;
    let mut union = 0_u64;

    for (&x, &y) in a.iter().zip(b.iter()) {
        intersection += u64::from((x & y).count_ones());
        union += u64::from((x | y).count_ones());
    }

    scalar::jaccard_from_counts(intersection, union)
}

// =============================================================================
// Probability divergences
// =============================================================================

/// Kullback-Leibler divergence.
///
/// Zero probabilities on the left contribute nothing; a zero on the right
/// against a non-zero left yields `+inf`. Inputs are assumed non-negative.
pub(crate) fn kl_f64(a: &[f64], b: &[f64]) -> f64 {
    let mut sum = 0.0_f64;
    for (&x, &y) in a.iter().zip(b.iter()) {
        if x > 0.0 {
            if y <= 0.0 {
                return f64::INFINITY;
            }
            sum += x * (x / y).ln();
        }
    }
    sum
}

pub(crate) fn kl_f32(a: &[f32], b: &[f32]) -> f64 {
    let mut sum = 0.0_f32;
    for (&x, &y) in a.iter().zip(b.iter()) {
        if x > 0.0 {
            if y <= 0.0 {
                return f64::INFINITY;
            }
            sum += x * (x / y).ln();
        }
    }
    f64::from(sum)
}

pub(crate) fn kl_f16(a: &[f16], b: &[f16]) -> f64 {
    let mut sum = 0.0_f32;
    for (x, y) in a.iter().zip(b.iter()) {
        let (x, y) = (x.to_f32(), y.to_f32());
        if x > 0.0 {
            if y <= 0.0 {
                return f64::INFINITY;
            }
            sum += x * (x / y).ln();
        }
    }
    f64::from(sum)
}

/// Jensen-Shannon divergence against the midpoint distribution.
///
/// Never infinite: the midpoint is positive wherever either side is.
pub(crate) fn js_f64(a: &[f64], b: &[f64]) -> f64 {
    let mut sum = 0.0_f64;
    for (&x, &y) in a.iter().zip(b.iter()) {
        let m = 0.5 * (x + y);
        if x > 0.0 {
            sum += 0.5 * x * (x / m).ln();
        }
        if y > 0.0 {
            sum += 0.5 * y * (y / m).ln();
        }
    }
    sum
}

pub(crate) fn js_f32(a: &[f32], b: &[f32]) -> f64 {
    let mut sum = 0.0_f32;
    for (&x, &y) in a.iter().zip(b.iter()) {
        let m = 0.5 * (x + y);
        if x > 0.0 {
            sum += 0.5 * x * (x / m).ln();
        }
        if y > 0.0 {
            sum += 0.5 * y * (y / m).ln();
        }
    }
    f64::from(sum)
}

pub(crate) fn js_f16(a: &[f16], b: &[f16]) -> f64 {
    let mut sum = 0.0_f32;
    for (x, y) in a.iter().zip(b.iter()) {
        let (x, y) = (x.to_f32(), y.to_f32());
        let m = 0.5 * (x + y);
        if x > 0.0 {
            sum += 0.5 * x * (x / m).ln();
        }
        if y > 0.0 {
            sum += 0.5 * y * (y / m).ln();
        }
    }
    f64::from(sum)
}

// =============================================================================
// Complex inner products
// =============================================================================
// Inputs are interleaved (re, im) pairs; slices hold 2n scalars for a
// logical length of n. The result is (real, imaginary).

pub(crate) fn dot_f64c(a: &[f64], b: &[f64]) -> [f64; 2] {
    let mut re = 0.0_f64;
    let mut im = 0.0_f64;
    for (pa, pb) in a.chunks_exact(2).zip(b.chunks_exact(2)) {
        re += pa[0] * pb[0] - pa[1] * pb[1];
        im += pa[0] * pb[1] + pa[1] * pb[0];
    }
    [re, im]
}

/// Complex inner product with the first operand conjugated.
pub(crate) fn vdot_f64c(a: &[f64], b: &[f64]) -> [f64; 2] {
    let mut re = 0.0_f64;
    let mut im = 0.0_f64;
    for (pa, pb) in a.chunks_exact(2).zip(b.chunks_exact(2)) {
        re += pa[0] * pb[0] + pa[1] * pb[1];
        im += pa[1] * pb[0] - pa[0] * pb[1];
    }
    [re, im]
}

pub(crate) fn dot_f32c(a: &[f32], b: &[f32]) -> [f64; 2] {
    let mut re = 0.0_f32;
    let mut im = 0.0_f32;
    for (pa, pb) in a.chunks_exact(2).zip(b.chunks_exact(2)) {
        re += pa[0] * pb[0] - pa[1] * pb[1];
        im += pa[0] * pb[1] + pa[1] * pb[0];
    }
    [f64::from(re), f64::from(im)]
}

pub(crate) fn vdot_f32c(a: &[f32], b: &[f32]) -> [f64; 2] {
    let mut re = 0.0_f32;
    let mut im = 0.0_f32;
    for (pa, pb) in a.chunks_exact(2).zip(b.chunks_exact(2)) {
        re += pa[0] * pb[0] + pa[1] * pb[1];
        im += pa[1] * pb[0] - pa[0] * pb[1];
    }
    [f64::from(re), f64::from(im)]
}

pub(crate) fn dot_f16c(a: &[f16], b: &[f16]) -> [f64; 2] {
    let mut re = 0.0_f32;
    let mut im = 0.0_f32;
    for (pa, pb) in a.chunks_exact(2).zip(b.chunks_exact(2)) {
        let (ar, ai) = (pa[0].to_f32(), pa[1].to_f32());
        let (br, bi) = (pb[0].to_f32(), pb[1].to_f32());
        re += ar * br - ai * bi;
        im += ar * bi + ai * br;
    }
    [f64::from(re), f64::from(im)]
}

pub(crate) fn vdot_f16c(a: &[f16], b: &[f16]) -> [f64; 2] {
    let mut re = 0.0_f32;
    let mut im = 0.0_f32;
    for (pa, pb) in a.chunks_exact(2).zip(b.chunks_exact(2)) {
        let (ar, ai) = (pa[0].to_f32(), pa[1].to_f32());
        let (br, bi) = (pb[0].to_f32(), pb[1].to_f32());
        re += ar * br + ai * bi;
        im += ai * br - ar * bi;
    }
    [f64::from(re), f64::from(im)]
}
