//! AVX2+FMA+F16C kernel implementations for x86_64.
//!
//! 256-bit lanes with FMA accumulation; half-precision inputs go through
//! F16C conversion into f32 math. Tiers without masked loads finish with a
//! scalar epilogue, so every kernel here ends in a short remainder loop.
//!
//! All functions require runtime Haswell-tier detection before calling.

// SAFETY: Numeric casts in this file are intentional and safe:
// - All casts are from well-bounded values (vector dimensions, loop indices)
// - i32 accumulator totals fit f32/f64 mantissas for supported lengths
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::similar_names)]
#![allow(clippy::too_many_lines)]

use std::arch::x86_64::*;

use half::f16;

use super::scalar;

// =============================================================================
// Horizontal reductions
// =============================================================================

/// Horizontal sum of 8 f32 lanes via two pairwise folds.
#[target_feature(enable = "avx2")]
#[inline]
unsafe fn hsum_ps(v: __m256) -> f32 {
    let folded = _mm_add_ps(_mm256_castps256_ps128(v), _mm256_extractf128_ps(v, 1));
    let folded = _mm_hadd_ps(folded, folded);
    _mm_cvtss_f32(_mm_hadd_ps(folded, folded))
}

/// Horizontal sum of 8 i32 lanes.
#[target_feature(enable = "avx2")]
#[inline]
unsafe fn hsum_epi32(v: __m256i) -> i32 {
    let hi = _mm256_extracti128_si256(v, 1);
    let lo = _mm256_castsi256_si128(v);
    let sum = _mm_add_epi32(lo, hi);
    let sum = _mm_add_epi32(sum, _mm_shuffle_epi32(sum, 0b00_00_11_10));
    let sum = _mm_add_epi32(sum, _mm_shuffle_epi32(sum, 0b00_00_00_01));
    _mm_cvtsi128_si32(sum)
}

// =============================================================================
// f32 kernels
// =============================================================================

/// AVX2 dot product, two registers per 16-element chunk.
///
/// # Safety
///
/// Caller must ensure the CPU supports AVX2+FMA (runtime detection) and
/// `a.len() == b.len()`.
#[target_feature(enable = "avx2", enable = "fma")]
pub(crate) unsafe fn dot_f32(a: &[f32], b: &[f32]) -> f64 {
    // SAFETY: each chunk spans two full 256-bit registers and
    // `_mm256_loadu_ps` tolerates any alignment; the iterator remainder is
    // handled in scalar code.
    let mut wide_a = a.chunks_exact(16);
    let mut wide_b = b.chunks_exact(16);

    let mut acc_lo = _mm256_setzero_ps();
    let mut acc_hi = _mm256_setzero_ps();

    for (ca, cb) in wide_a.by_ref().zip(wide_b.by_ref()) {
        acc_lo = _mm256_fmadd_ps(_mm256_loadu_ps(ca.as_ptr()), _mm256_loadu_ps(cb.as_ptr()), acc_lo);
        acc_hi = _mm256_fmadd_ps(
            _mm256_loadu_ps(ca.as_ptr().add(8)),
            _mm256_loadu_ps(cb.as_ptr().add(8)),
            acc_hi,
        );
    }

    let mut total = hsum_ps(_mm256_add_ps(acc_lo, acc_hi));
    for (&x, &y) in wide_a.remainder().iter().zip(wide_b.remainder()) {
        total += x * y;
    }

    f64::from(total)
}

/// AVX2 squared L2 distance, two registers per 16-element chunk.
///
/// # Safety
///
/// Same requirements as [`dot_f32`].
#[target_feature(enable = "avx2", enable = "fma")]
pub(crate) unsafe fn l2sq_f32(a: &[f32], b: &[f32]) -> f64 {
    let mut wide_a = a.chunks_exact(16);
    let mut wide_b = b.chunks_exact(16);

    let mut acc_lo = _mm256_setzero_ps();
    let mut acc_hi = _mm256_setzero_ps();

    for (ca, cb) in wide_a.by_ref().zip(wide_b.by_ref()) {
        let gap_lo = _mm256_sub_ps(_mm256_loadu_ps(ca.as_ptr()), _mm256_loadu_ps(cb.as_ptr()));
        acc_lo = _mm256_fmadd_ps(gap_lo, gap_lo, acc_lo);
        let gap_hi = _mm256_sub_ps(
            _mm256_loadu_ps(ca.as_ptr().add(8)),
            _mm256_loadu_ps(cb.as_ptr().add(8)),
        );
        acc_hi = _mm256_fmadd_ps(gap_hi, gap_hi, acc_hi);
    }

    let mut total = hsum_ps(_mm256_add_ps(acc_lo, acc_hi));
    for (&x, &y) in wide_a.remainder().iter().zip(wide_b.remainder()) {
        let gap = x - y;
        total += gap * gap;
    }

    f64::from(total)
}

/// AVX2 fused cosine distance - dot product and both norms in one pass.
///
/// # Safety
///
/// Same requirements as [`dot_f32`].
#[target_feature(enable = "avx2", enable = "fma")]
pub(crate) unsafe fn cos_f32(a: &[f32], b: &[f32]) -> f64 {
    let mut wide_a = a.chunks_exact(8);
    let mut wide_b = b.chunks_exact(8);

    let mut sum_ab = _mm256_setzero_ps();
    let mut sum_aa = _mm256_setzero_ps();
    let mut sum_bb = _mm256_setzero_ps();

    for (ca, cb) in wide_a.by_ref().zip(wide_b.by_ref()) {
        let va = _mm256_loadu_ps(ca.as_ptr());
        let vb = _mm256_loadu_ps(cb.as_ptr());
        sum_ab = _mm256_fmadd_ps(va, vb, sum_ab);
        sum_aa = _mm256_fmadd_ps(va, va, sum_aa);
        sum_bb = _mm256_fmadd_ps(vb, vb, sum_bb);
    }

    let mut ab = hsum_ps(sum_ab);
    let mut a2 = hsum_ps(sum_aa);
    let mut b2 = hsum_ps(sum_bb);

    for (&x, &y) in wide_a.remainder().iter().zip(wide_b.remainder()) {
        ab += x * y;
        a2 += x * x;
        b2 += y * y;
    }

    scalar::cos_from_f32(ab, a2, b2)
}

// =============================================================================
// Probability divergences
// =============================================================================

/// Vectorized natural log, Cephes polynomial over the reduced mantissa.
///
/// Valid for strictly positive finite lanes; inputs are clamped to the
/// smallest normal before exponent extraction.
#[target_feature(enable = "avx2", enable = "fma")]
#[inline]
unsafe fn ln_ps(x: __m256) -> __m256 {
    let one = _mm256_set1_ps(1.0);
    let half = _mm256_set1_ps(0.5);

    let x = _mm256_max_ps(x, _mm256_set1_ps(f32::MIN_POSITIVE));
    let mut exponent = _mm256_srli_epi32(_mm256_castps_si256(x), 23);
    exponent = _mm256_sub_epi32(exponent, _mm256_set1_epi32(0x7f));
    let mut e = _mm256_cvtepi32_ps(exponent);
    e = _mm256_add_ps(e, one);

    // Mantissa in [0.5, 1): drop the exponent bits, splice in 2^-1.
    let mant_mask = _mm256_castsi256_ps(_mm256_set1_epi32(!0x7f80_0000_u32 as i32));
    let mut m = _mm256_or_ps(_mm256_and_ps(x, mant_mask), half);

    // Shift mantissas below 1/sqrt(2) up one octave.
    let below = _mm256_cmp_ps(m, _mm256_set1_ps(std::f32::consts::FRAC_1_SQRT_2), _CMP_LT_OQ);
    let shifted = _mm256_and_ps(m, below);
    m = _mm256_sub_ps(m, one);
    e = _mm256_sub_ps(e, _mm256_and_ps(one, below));
    m = _mm256_add_ps(m, shifted);

    let z = _mm256_mul_ps(m, m);
    let mut p = _mm256_set1_ps(7.037_683_6e-2);
    p = _mm256_fmadd_ps(p, m, _mm256_set1_ps(-1.151_461e-1));
    p = _mm256_fmadd_ps(p, m, _mm256_set1_ps(1.167_699_9e-1));
    p = _mm256_fmadd_ps(p, m, _mm256_set1_ps(-1.242_014_1e-1));
    p = _mm256_fmadd_ps(p, m, _mm256_set1_ps(1.424_932_3e-1));
    p = _mm256_fmadd_ps(p, m, _mm256_set1_ps(-1.666_805_7e-1));
    p = _mm256_fmadd_ps(p, m, _mm256_set1_ps(2.000_071_5e-1));
    p = _mm256_fmadd_ps(p, m, _mm256_set1_ps(-2.499_999_4e-1));
    p = _mm256_fmadd_ps(p, m, _mm256_set1_ps(3.333_333_1e-1));
    p = _mm256_mul_ps(p, m);
    p = _mm256_mul_ps(p, z);

    p = _mm256_fmadd_ps(e, _mm256_set1_ps(-2.121_944_4e-4), p);
    p = _mm256_fnmadd_ps(half, z, p);
    let mut r = _mm256_add_ps(m, p);
    r = _mm256_fmadd_ps(e, _mm256_set1_ps(0.693_359_375), r);
    r
}

/// AVX2 Kullback-Leibler divergence.
///
/// Lanes with a zero left probability contribute nothing; any lane with a
/// zero right probability against a non-zero left short-circuits to `+inf`.
///
/// # Safety
///
/// Same requirements as [`dot_f32`].
#[target_feature(enable = "avx2", enable = "fma")]
pub(crate) unsafe fn kl_f32(a: &[f32], b: &[f32]) -> f64 {
    let mut wide_a = a.chunks_exact(8);
    let mut wide_b = b.chunks_exact(8);

    let zero = _mm256_setzero_ps();
    let one = _mm256_set1_ps(1.0);
    let mut sum = _mm256_setzero_ps();

    for (ca, cb) in wide_a.by_ref().zip(wide_b.by_ref()) {
        let va = _mm256_loadu_ps(ca.as_ptr());
        let vb = _mm256_loadu_ps(cb.as_ptr());

        let pos = _mm256_cmp_ps(va, zero, _CMP_GT_OQ);
        let diverged = _mm256_andnot_ps(_mm256_cmp_ps(vb, zero, _CMP_GT_OQ), pos);
        if _mm256_movemask_ps(diverged) != 0 {
            return f64::INFINITY;
        }

        // Inactive lanes log a ratio of 1 and carry a zero weight.
        let num = _mm256_blendv_ps(one, va, pos);
        let den = _mm256_blendv_ps(one, vb, pos);
        let weight = _mm256_and_ps(va, pos);
        sum = _mm256_fmadd_ps(weight, ln_ps(_mm256_div_ps(num, den)), sum);
    }

    let mut total = hsum_ps(sum);

    for (&x, &y) in wide_a.remainder().iter().zip(wide_b.remainder()) {
        if x > 0.0 {
            if y <= 0.0 {
                return f64::INFINITY;
            }
            total += x * (x / y).ln();
        }
    }

    f64::from(total)
}

/// AVX2 Jensen-Shannon divergence against the midpoint distribution.
///
/// # Safety
///
/// Same requirements as [`dot_f32`].
#[target_feature(enable = "avx2", enable = "fma")]
pub(crate) unsafe fn js_f32(a: &[f32], b: &[f32]) -> f64 {
    let mut wide_a = a.chunks_exact(8);
    let mut wide_b = b.chunks_exact(8);

    let zero = _mm256_setzero_ps();
    let one = _mm256_set1_ps(1.0);
    let half = _mm256_set1_ps(0.5);
    let mut sum_a = _mm256_setzero_ps();
    let mut sum_b = _mm256_setzero_ps();

    for (ca, cb) in wide_a.by_ref().zip(wide_b.by_ref()) {
        let va = _mm256_loadu_ps(ca.as_ptr());
        let vb = _mm256_loadu_ps(cb.as_ptr());
        let vm = _mm256_mul_ps(half, _mm256_add_ps(va, vb));

        // The midpoint is positive wherever either side is, so the guarded
        // ratios below never divide by zero on an active lane.
        let pos_a = _mm256_cmp_ps(va, zero, _CMP_GT_OQ);
        let num_a = _mm256_blendv_ps(one, va, pos_a);
        let den_a = _mm256_blendv_ps(one, vm, pos_a);
        let weight_a = _mm256_and_ps(va, pos_a);
        sum_a = _mm256_fmadd_ps(weight_a, ln_ps(_mm256_div_ps(num_a, den_a)), sum_a);

        let pos_b = _mm256_cmp_ps(vb, zero, _CMP_GT_OQ);
        let num_b = _mm256_blendv_ps(one, vb, pos_b);
        let den_b = _mm256_blendv_ps(one, vm, pos_b);
        let weight_b = _mm256_and_ps(vb, pos_b);
        sum_b = _mm256_fmadd_ps(weight_b, ln_ps(_mm256_div_ps(num_b, den_b)), sum_b);
    }

    let mut total = 0.5 * (hsum_ps(sum_a) + hsum_ps(sum_b));

    for (&x, &y) in wide_a.remainder().iter().zip(wide_b.remainder()) {
        let m = 0.5 * (x + y);
        if x > 0.0 {
            total += 0.5 * x * (x / m).ln();
        }
        if y > 0.0 {
            total += 0.5 * y * (y / m).ln();
        }
    }

    f64::from(total)
}

// =============================================================================
// f16 kernels (F16C conversion into f32 math)
// =============================================================================

/// Loads 8 packed halves and converts them to f32 lanes.
#[target_feature(enable = "avx2", enable = "f16c")]
#[inline]
unsafe fn load_f16x8(ptr: *const f16) -> __m256 {
    _mm256_cvtph_ps(_mm_loadu_si128(ptr.cast::<__m128i>()))
}

/// AVX2+F16C dot product over packed halves.
///
/// # Safety
///
/// Caller must ensure the CPU supports AVX2+FMA+F16C and
/// `a.len() == b.len()`.
#[target_feature(enable = "avx2", enable = "fma", enable = "f16c")]
pub(crate) unsafe fn dot_f16(a: &[f16], b: &[f16]) -> f64 {
    let mut wide_a = a.chunks_exact(8);
    let mut wide_b = b.chunks_exact(8);

    let mut acc = _mm256_setzero_ps();

    for (ca, cb) in wide_a.by_ref().zip(wide_b.by_ref()) {
        acc = _mm256_fmadd_ps(load_f16x8(ca.as_ptr()), load_f16x8(cb.as_ptr()), acc);
    }

    let mut total = hsum_ps(acc);

    for (x, y) in wide_a.remainder().iter().zip(wide_b.remainder()) {
        total += x.to_f32() * y.to_f32();
    }

    f64::from(total)
}

/// AVX2+F16C squared L2 distance over packed halves.
///
/// # Safety
///
/// Same requirements as [`dot_f16`].
#[target_feature(enable = "avx2", enable = "fma", enable = "f16c")]
pub(crate) unsafe fn l2sq_f16(a: &[f16], b: &[f16]) -> f64 {
    let mut wide_a = a.chunks_exact(8);
    let mut wide_b = b.chunks_exact(8);

    let mut acc = _mm256_setzero_ps();

    for (ca, cb) in wide_a.by_ref().zip(wide_b.by_ref()) {
        let gap = _mm256_sub_ps(load_f16x8(ca.as_ptr()), load_f16x8(cb.as_ptr()));
        acc = _mm256_fmadd_ps(gap, gap, acc);
    }

    let mut total = hsum_ps(acc);

    for (x, y) in wide_a.remainder().iter().zip(wide_b.remainder()) {
        let gap = x.to_f32() - y.to_f32();
        total += gap * gap;
    }

    f64::from(total)
}

/// AVX2+F16C fused cosine distance over packed halves.
///
/// # Safety
///
/// Same requirements as [`dot_f16`].
#[target_feature(enable = "avx2", enable = "fma", enable = "f16c")]
pub(crate) unsafe fn cos_f16(a: &[f16], b: &[f16]) -> f64 {
    let mut wide_a = a.chunks_exact(8);
    let mut wide_b = b.chunks_exact(8);

    let mut sum_ab = _mm256_setzero_ps();
    let mut sum_aa = _mm256_setzero_ps();
    let mut sum_bb = _mm256_setzero_ps();

    for (ca, cb) in wide_a.by_ref().zip(wide_b.by_ref()) {
        let va = load_f16x8(ca.as_ptr());
        let vb = load_f16x8(cb.as_ptr());
        sum_ab = _mm256_fmadd_ps(va, vb, sum_ab);
        sum_aa = _mm256_fmadd_ps(va, va, sum_aa);
        sum_bb = _mm256_fmadd_ps(vb, vb, sum_bb);
    }

    let mut ab = hsum_ps(sum_ab);
    let mut a2 = hsum_ps(sum_aa);
    let mut b2 = hsum_ps(sum_bb);

    for (x, y) in wide_a.remainder().iter().zip(wide_b.remainder()) {
        let (x, y) = (x.to_f32(), y.to_f32());
        ab += x * y;
        a2 += x * x;
        b2 += y * y;
    }

    scalar::cos_from_f32(ab, a2, b2)
}

// =============================================================================
// i8 kernels (widening 16-bit multiplies, 32-bit accumulators)
// =============================================================================

/// AVX2 i8 dot product.
///
/// Sign-extends 16 bytes to words and lets `madd` fuse the multiply with the
/// pairwise add into i32 lanes.
///
/// # Safety
///
/// Same requirements as [`dot_f32`].
#[target_feature(enable = "avx2")]
pub(crate) unsafe fn dot_i8(a: &[i8], b: &[i8]) -> f64 {
    let mut wide_a = a.chunks_exact(16);
    let mut wide_b = b.chunks_exact(16);

    let mut acc = _mm256_setzero_si256();

    for (ca, cb) in wide_a.by_ref().zip(wide_b.by_ref()) {
        let wa = _mm256_cvtepi8_epi16(_mm_loadu_si128(ca.as_ptr().cast::<__m128i>()));
        let wb = _mm256_cvtepi8_epi16(_mm_loadu_si128(cb.as_ptr().cast::<__m128i>()));
        acc = _mm256_add_epi32(acc, _mm256_madd_epi16(wa, wb));
    }

    let mut total = hsum_epi32(acc);

    for (&x, &y) in wide_a.remainder().iter().zip(wide_b.remainder()) {
        total += i32::from(x) * i32::from(y);
    }

    f64::from(total)
}

/// AVX2 i8 fused cosine distance.
///
/// # Safety
///
/// Same requirements as [`dot_f32`].
#[target_feature(enable = "avx2")]
pub(crate) unsafe fn cos_i8(a: &[i8], b: &[i8]) -> f64 {
    let mut wide_a = a.chunks_exact(16);
    let mut wide_b = b.chunks_exact(16);

    let mut sum_ab = _mm256_setzero_si256();
    let mut sum_aa = _mm256_setzero_si256();
    let mut sum_bb = _mm256_setzero_si256();

    for (ca, cb) in wide_a.by_ref().zip(wide_b.by_ref()) {
        let wa = _mm256_cvtepi8_epi16(_mm_loadu_si128(ca.as_ptr().cast::<__m128i>()));
        let wb = _mm256_cvtepi8_epi16(_mm_loadu_si128(cb.as_ptr().cast::<__m128i>()));
        sum_ab = _mm256_add_epi32(sum_ab, _mm256_madd_epi16(wa, wb));
        sum_aa = _mm256_add_epi32(sum_aa, _mm256_madd_epi16(wa, wa));
        sum_bb = _mm256_add_epi32(sum_bb, _mm256_madd_epi16(wb, wb));
    }

    let mut ab = hsum_epi32(sum_ab);
    let mut a2 = hsum_epi32(sum_aa);
    let mut b2 = hsum_epi32(sum_bb);

    for (&x, &y) in wide_a.remainder().iter().zip(wide_b.remainder()) {
        let (x, y) = (i32::from(x), i32::from(y));
        ab += x * y;
        a2 += x * x;
        b2 += y * y;
    }

    scalar::cos_from_f32(ab as f32, a2 as f32, b2 as f32)
}

/// AVX2 i8 squared L2 distance.
///
/// # Safety
///
/// Same requirements as [`dot_f32`].
#[target_feature(enable = "avx2")]
pub(crate) unsafe fn l2sq_i8(a: &[i8], b: &[i8]) -> f64 {
    let mut wide_a = a.chunks_exact(16);
    let mut wide_b = b.chunks_exact(16);

    let mut acc = _mm256_setzero_si256();

    for (ca, cb) in wide_a.by_ref().zip(wide_b.by_ref()) {
        let wa = _mm256_cvtepi8_epi16(_mm_loadu_si128(ca.as_ptr().cast::<__m128i>()));
        let wb = _mm256_cvtepi8_epi16(_mm_loadu_si128(cb.as_ptr().cast::<__m128i>()));
        // Differences fit i16 and their squares pairwise-sum into i32.
        let gap = _mm256_sub_epi16(wa, wb);
        acc = _mm256_add_epi32(acc, _mm256_madd_epi16(gap, gap));
    }

    let mut total = hsum_epi32(acc);

    for (&x, &y) in wide_a.remainder().iter().zip(wide_b.remainder()) {
        let gap = i32::from(x) - i32::from(y);
        total += gap * gap;
    }

    f64::from(total)
}

// =============================================================================
// Packed-bitset kernels
// =============================================================================

/// Popcount of all four 64-bit lanes of a 256-bit register.
#[target_feature(enable = "avx2")]
#[inline]
unsafe fn popcount_epi64x4(v: __m256i) -> u64 {
    u64::from((_mm256_extract_epi64(v, 0) as u64).count_ones())
        + u64::from((_mm256_extract_epi64(v, 1) as u64).count_ones())
        + u64::from((_mm256_extract_epi64(v, 2) as u64).count_ones())
        + u64::from((_mm256_extract_epi64(v, 3) as u64).count_ones())
}

/// AVX2 Hamming distance over packed bitsets; `n` counts bytes.
///
/// # Safety
///
/// Same requirements as [`dot_f32`].
#[target_feature(enable = "avx2")]
pub(crate) unsafe fn hamming_b8(a: &[u8], b: &[u8]) -> f64 {
    let mut wide_a = a.chunks_exact(32);
    let mut wide_b = b.chunks_exact(32);

    let mut count = 0_u64;

    for (ca, cb) in wide_a.by_ref().zip(wide_b.by_ref()) {
        let va = _mm256_loadu_si256(ca.as_ptr().cast::<__m256i>());
        let vb = _mm256_loadu_si256(cb.as_ptr().cast::<__m256i>());
        count += popcount_epi64x4(_mm256_xor_si256(va, vb));
    }

    for (&x, &y) in wide_a.remainder().iter().zip(wide_b.remainder()) {
        count += u64::from((x ^ y).count_ones());
    }

    count as f64
}

/// AVX2 Jaccard distance over packed bitsets; `n` counts bytes.
///
/// # Safety
///
/// Same requirements as [`dot_f32`].
#[target_feature(enable = "avx2")]
pub(crate) unsafe fn jaccard_b8(a: &[u8], b: &[u8]) -> f64 {
    let mut wide_a = a.chunks_exact(32);
    let mut wide_b = b.chunks_exact(32);

    let mut intersection = 0_u64;
    let mut union = 0_u64;

    for (ca, cb) in wide_a.by_ref().zip(wide_b.by_ref()) {
        let va = _mm256_loadu_si256(ca.as_ptr().cast::<__m256i>());
        let vb = _mm256_loadu_si256(cb.as_ptr().cast::<__m256i>());
        intersection += popcount_epi64x4(_mm256_and_si256(va, vb));
        union += popcount_epi64x4(_mm256_or_si256(va, vb));
    }

    for (&x, &y) in wide_a.remainder().iter().zip(wide_b.remainder()) {
        intersection += u64::from((x & y).count_ones());
        union += u64::from((x | y).count_ones());
    }

    scalar::jaccard_from_counts(intersection, union)
}

// =============================================================================
// Complex f32 kernels
// =============================================================================
// Interleaved (re, im) pairs. The swapped-pair accumulator trick keeps the
// loads contiguous: acc_rr collects (ar*br | ai*bi) lanes, acc_ri collects
// (ar*bi | ai*br) lanes, and the sign vector folds each into the requested
// real/imaginary combination at reduction time.

/// Alternating +1/-1 over the even/odd pair lanes.
#[target_feature(enable = "avx2")]
#[inline]
unsafe fn pair_signs() -> __m256 {
    _mm256_setr_ps(1.0, -1.0, 1.0, -1.0, 1.0, -1.0, 1.0, -1.0)
}

/// AVX2 complex dot product; slices hold `2n` interleaved scalars.
///
/// # Safety
///
/// Caller must ensure AVX2+FMA support, `a.len() == b.len()` and an even
/// scalar count.
#[target_feature(enable = "avx2", enable = "fma")]
pub(crate) unsafe fn dot_f32c(a: &[f32], b: &[f32]) -> [f64; 2] {
    // SAFETY: each chunk spans one full 256-bit register (four complex
    // pairs); the iterator remainder is an even number of scalars.
    let mut wide_a = a.chunks_exact(8);
    let mut wide_b = b.chunks_exact(8);

    let mut acc_rr = _mm256_setzero_ps();
    let mut acc_ri = _mm256_setzero_ps();

    for (ca, cb) in wide_a.by_ref().zip(wide_b.by_ref()) {
        let va = _mm256_loadu_ps(ca.as_ptr());
        let vb = _mm256_loadu_ps(cb.as_ptr());
        let vb_swap = _mm256_permute_ps(vb, 0b10_11_00_01);
        acc_rr = _mm256_fmadd_ps(va, vb, acc_rr);
        acc_ri = _mm256_fmadd_ps(va, vb_swap, acc_ri);
    }

    let mut re = hsum_ps(_mm256_mul_ps(acc_rr, pair_signs()));
    let mut im = hsum_ps(acc_ri);

    let tail_a = wide_a.remainder();
    let tail_b = wide_b.remainder();
    for (pa, pb) in tail_a.chunks_exact(2).zip(tail_b.chunks_exact(2)) {
        re += pa[0] * pb[0] - pa[1] * pb[1];
        im += pa[0] * pb[1] + pa[1] * pb[0];
    }

    [f64::from(re), f64::from(im)]
}

/// AVX2 conjugated complex dot product; slices hold `2n` interleaved scalars.
///
/// # Safety
///
/// Same requirements as [`dot_f32c`].
#[target_feature(enable = "avx2", enable = "fma")]
pub(crate) unsafe fn vdot_f32c(a: &[f32], b: &[f32]) -> [f64; 2] {
    let mut wide_a = a.chunks_exact(8);
    let mut wide_b = b.chunks_exact(8);

    let mut acc_rr = _mm256_setzero_ps();
    let mut acc_ri = _mm256_setzero_ps();

    for (ca, cb) in wide_a.by_ref().zip(wide_b.by_ref()) {
        let va = _mm256_loadu_ps(ca.as_ptr());
        let vb = _mm256_loadu_ps(cb.as_ptr());
        let vb_swap = _mm256_permute_ps(vb, 0b10_11_00_01);
        acc_rr = _mm256_fmadd_ps(va, vb, acc_rr);
        acc_ri = _mm256_fmadd_ps(va, vb_swap, acc_ri);
    }

    // acc_ri's even lanes hold ar*bi, odd lanes ai*br; the conjugated
    // imaginary part wants odd minus even.
    let mut re = hsum_ps(acc_rr);
    let mut im = -hsum_ps(_mm256_mul_ps(acc_ri, pair_signs()));

    let tail_a = wide_a.remainder();
    let tail_b = wide_b.remainder();
    for (pa, pb) in tail_a.chunks_exact(2).zip(tail_b.chunks_exact(2)) {
        re += pa[0] * pb[0] + pa[1] * pb[1];
        im += pa[1] * pb[0] - pa[0] * pb[1];
    }

    [f64::from(re), f64::from(im)]
}
