//! ARM NEON kernel implementations for aarch64.
//!
//! 128-bit lanes with FMA accumulation. The loops walk exact-chunk iterators
//! and finish on the iterator remainder in scalar code. NEON is always
//! available on aarch64, so no runtime detection is needed and the functions
//! here are safe; unsafety is confined to the intrinsic blocks.

#![allow(clippy::cast_precision_loss)]
#![allow(clippy::similar_names)]

use std::arch::aarch64::*;

use super::scalar;

// =============================================================================
// f32 kernels
// =============================================================================

/// NEON dot product, two registers per 8-element chunk.
#[inline]
pub(crate) fn dot_f32(a: &[f32], b: &[f32]) -> f64 {
    let mut wide_a = a.chunks_exact(8);
    let mut wide_b = b.chunks_exact(8);

    // SAFETY: each chunk spans two full 128-bit registers; vld1q_f32 is
    // unaligned-safe.
    let mut total = unsafe {
        let mut acc_lo = vdupq_n_f32(0.0);
        let mut acc_hi = vdupq_n_f32(0.0);

        for (ca, cb) in wide_a.by_ref().zip(wide_b.by_ref()) {
            acc_lo = vfmaq_f32(acc_lo, vld1q_f32(ca.as_ptr()), vld1q_f32(cb.as_ptr()));
            acc_hi = vfmaq_f32(
                acc_hi,
                vld1q_f32(ca.as_ptr().add(4)),
                vld1q_f32(cb.as_ptr().add(4)),
            );
        }

        vaddvq_f32(vaddq_f32(acc_lo, acc_hi))
    };

    for (&x, &y) in wide_a.remainder().iter().zip(wide_b.remainder()) {
        total += x * y;
    }

    f64::from(total)
}

/// NEON squared L2 distance.
#[inline]
pub(crate) fn l2sq_f32(a: &[f32], b: &[f32]) -> f64 {
    let mut wide_a = a.chunks_exact(4);
    let mut wide_b = b.chunks_exact(4);

    // SAFETY: each chunk spans one full 128-bit register.
    let mut total = unsafe {
        let mut acc = vdupq_n_f32(0.0);

        for (ca, cb) in wide_a.by_ref().zip(wide_b.by_ref()) {
            let gap = vsubq_f32(vld1q_f32(ca.as_ptr()), vld1q_f32(cb.as_ptr()));
            acc = vfmaq_f32(acc, gap, gap);
        }

        vaddvq_f32(acc)
    };

    for (&x, &y) in wide_a.remainder().iter().zip(wide_b.remainder()) {
        let gap = x - y;
        total += gap * gap;
    }

    f64::from(total)
}

/// NEON fused cosine distance - dot product and both norms in one pass.
#[inline]
pub(crate) fn cos_f32(a: &[f32], b: &[f32]) -> f64 {
    let mut wide_a = a.chunks_exact(4);
    let mut wide_b = b.chunks_exact(4);

    // SAFETY: each chunk spans one full 128-bit register.
    let (mut ab, mut a2, mut b2) = unsafe {
        let mut sum_ab = vdupq_n_f32(0.0);
        let mut sum_aa = vdupq_n_f32(0.0);
        let mut sum_bb = vdupq_n_f32(0.0);

        for (ca, cb) in wide_a.by_ref().zip(wide_b.by_ref()) {
            let va = vld1q_f32(ca.as_ptr());
            let vb = vld1q_f32(cb.as_ptr());
            sum_ab = vfmaq_f32(sum_ab, va, vb);
            sum_aa = vfmaq_f32(sum_aa, va, va);
            sum_bb = vfmaq_f32(sum_bb, vb, vb);
        }

        (vaddvq_f32(sum_ab), vaddvq_f32(sum_aa), vaddvq_f32(sum_bb))
    };

    for (&x, &y) in wide_a.remainder().iter().zip(wide_b.remainder()) {
        ab += x * y;
        a2 += x * x;
        b2 += y * y;
    }

    scalar::cos_from_f32(ab, a2, b2)
}

// =============================================================================
// i8 kernels (widening multiply-accumulate ladders)
// =============================================================================

/// NEON i8 dot product.
#[inline]
pub(crate) fn dot_i8(a: &[i8], b: &[i8]) -> f64 {
    let mut wide_a = a.chunks_exact(8);
    let mut wide_b = b.chunks_exact(8);

    // SAFETY: each chunk spans one full 64-bit vld1_s8 load.
    let mut total = unsafe {
        let mut acc = vdupq_n_s32(0);

        for (ca, cb) in wide_a.by_ref().zip(wide_b.by_ref()) {
            let wa = vmovl_s8(vld1_s8(ca.as_ptr()));
            let wb = vmovl_s8(vld1_s8(cb.as_ptr()));
            acc = vmlal_s16(acc, vget_low_s16(wa), vget_low_s16(wb));
            acc = vmlal_s16(acc, vget_high_s16(wa), vget_high_s16(wb));
        }

        vaddvq_s32(acc)
    };

    for (&x, &y) in wide_a.remainder().iter().zip(wide_b.remainder()) {
        total += i32::from(x) * i32::from(y);
    }

    f64::from(total)
}

/// NEON i8 fused cosine distance.
#[inline]
pub(crate) fn cos_i8(a: &[i8], b: &[i8]) -> f64 {
    let mut wide_a = a.chunks_exact(8);
    let mut wide_b = b.chunks_exact(8);

    // SAFETY: see dot_i8.
    let (mut ab, mut a2, mut b2) = unsafe {
        let mut sum_ab = vdupq_n_s32(0);
        let mut sum_aa = vdupq_n_s32(0);
        let mut sum_bb = vdupq_n_s32(0);

        for (ca, cb) in wide_a.by_ref().zip(wide_b.by_ref()) {
            let wa = vmovl_s8(vld1_s8(ca.as_ptr()));
            let wb = vmovl_s8(vld1_s8(cb.as_ptr()));
            sum_ab = vmlal_s16(sum_ab, vget_low_s16(wa), vget_low_s16(wb));
            sum_ab = vmlal_s16(sum_ab, vget_high_s16(wa), vget_high_s16(wb));
            sum_aa = vmlal_s16(sum_aa, vget_low_s16(wa), vget_low_s16(wa));
            sum_aa = vmlal_s16(sum_aa, vget_high_s16(wa), vget_high_s16(wa));
            sum_bb = vmlal_s16(sum_bb, vget_low_s16(wb), vget_low_s16(wb));
            sum_bb = vmlal_s16(sum_bb, vget_high_s16(wb), vget_high_s16(wb));
        }

        (vaddvq_s32(sum_ab), vaddvq_s32(sum_aa), vaddvq_s32(sum_bb))
    };

    for (&x, &y) in wide_a.remainder().iter().zip(wide_b.remainder()) {
        let (x, y) = (i32::from(x), i32::from(y));
        ab += x * y;
        a2 += x * x;
        b2 += y * y;
    }

    scalar::cos_from_f32(ab as f32, a2 as f32, b2 as f32)
}

/// NEON i8 squared L2 distance.
#[inline]
pub(crate) fn l2sq_i8(a: &[i8], b: &[i8]) -> f64 {
    let mut wide_a = a.chunks_exact(8);
    let mut wide_b = b.chunks_exact(8);

    // SAFETY: see dot_i8. Differences fit i16 and square into i32 lanes.
    let mut total = unsafe {
        let mut acc = vdupq_n_s32(0);

        for (ca, cb) in wide_a.by_ref().zip(wide_b.by_ref()) {
            let gap = vsubq_s16(vmovl_s8(vld1_s8(ca.as_ptr())), vmovl_s8(vld1_s8(cb.as_ptr())));
            acc = vmlal_s16(acc, vget_low_s16(gap), vget_low_s16(gap));
            acc = vmlal_s16(acc, vget_high_s16(gap), vget_high_s16(gap));
        }

        vaddvq_s32(acc)
    };

    for (&x, &y) in wide_a.remainder().iter().zip(wide_b.remainder()) {
        let gap = i32::from(x) - i32::from(y);
        total += gap * gap;
    }

    f64::from(total)
}

// =============================================================================
// Packed-bitset kernels
// =============================================================================

/// NEON Hamming distance over packed bitsets; `n` counts bytes.
#[inline]
pub(crate) fn hamming_b8(a: &[u8], b: &[u8]) -> f64 {
    let mut wide_a = a.chunks_exact(16);
    let mut wide_b = b.chunks_exact(16);

    // SAFETY: each chunk spans one full 128-bit register.
    let mut count = unsafe {
        let mut total = 0_u64;

        for (ca, cb) in wide_a.by_ref().zip(wide_b.by_ref()) {
            let va = vld1q_u8(ca.as_ptr());
            let vb = vld1q_u8(cb.as_ptr());
            total += u64::from(vaddlvq_u8(vcntq_u8(veorq_u8(va, vb))));
        }

        total
    };

    for (&x, &y) in wide_a.remainder().iter().zip(wide_b.remainder()) {
        count += u64::from((x ^ y).count_ones());
    }

    count as f64
}

/// NEON Jaccard distance over packed bitsets; `n` counts bytes.
#[inline]
pub(crate) fn jaccard_b8(a: &[u8], b: &[u8]) -> f64 {
    let mut wide_a = a.chunks_exact(16);
    let mut wide_b = b.chunks_exact(16);

    // SAFETY: see hamming_b8.
    let (mut intersection, mut union) = unsafe {
        let mut inter = 0_u64;
        let mut uni = 0_u64;

        for (ca, cb) in wide_a.by_ref().zip(wide_b.by_ref()) {
            let va = vld1q_u8(ca.as_ptr());
            let vb = vld1q_u8(cb.as_ptr());
            inter += u64::from(vaddlvq_u8(vcntq_u8(vandq_u8(va, vb))));
            uni += u64::from(vaddlvq_u8(vcntq_u8(vorrq_u8(va, vb))));
        }

        (inter, uni)
    };

    for (&x, &y) in wide_a.remainder().iter().zip(wide_b.remainder()) {
        intersection += u64::from((x & y).count_ones());
        union += u64::from((x | y).count_ones());
    }

    scalar::jaccard_from_counts(intersection, union)
}
