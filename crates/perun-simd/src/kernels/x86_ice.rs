//! AVX-512 VNNI/VPOPCNTDQ kernel implementations for x86_64.
//!
//! The ice tier adds fused i8 dot products (`vpdpwssd` over sign-extended
//! words) and hardware 64-bit popcounts for the packed-bitset metrics. Tails
//! use byte-granular masked loads; masked-off bytes are zero and contribute
//! nothing to any accumulator.

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::similar_names)]

use std::arch::x86_64::*;

use super::scalar;

/// Predicate with the low `count` of 32 byte lanes set; `count` is in 1..=32.
#[inline]
fn byte_mask32(count: usize) -> __mmask32 {
    !0_u32 >> (32 - count)
}

/// Predicate with the low `count` of 64 byte lanes set; `count` is in 1..=64.
#[inline]
fn byte_mask64(count: usize) -> __mmask64 {
    !0_u64 >> (64 - count)
}

// =============================================================================
// i8 kernels (VNNI word-dot fusion)
// =============================================================================

/// AVX-512 VNNI i8 dot product.
///
/// # Safety
///
/// Caller must ensure the CPU supports the ice tier (runtime detection) and
/// `a.len() == b.len()`.
#[target_feature(enable = "avx512f", enable = "avx512bw", enable = "avx512vl", enable = "avx512vnni")]
pub(crate) unsafe fn dot_i8(a: &[i8], b: &[i8]) -> f64 {
    // SAFETY: full loads cover simd_len * 32 elements; the tail uses a
    // byte-masked load bounded by the remaining count.
    let len = a.len();
    let simd_len = len / 32;
    let remainder = len % 32;

    let mut acc = _mm512_setzero_si512();
    let a_ptr = a.as_ptr();
    let b_ptr = b.as_ptr();

    for i in 0..simd_len {
        let offset = i * 32;
        let wa = _mm512_cvtepi8_epi16(_mm256_loadu_si256(a_ptr.add(offset).cast()));
        let wb = _mm512_cvtepi8_epi16(_mm256_loadu_si256(b_ptr.add(offset).cast()));
        acc = _mm512_dpwssd_epi32(acc, wa, wb);
    }

    if remainder > 0 {
        let base = simd_len * 32;
        let mask = byte_mask32(remainder);
        let wa = _mm512_cvtepi8_epi16(_mm256_maskz_loadu_epi8(mask, a_ptr.add(base)));
        let wb = _mm512_cvtepi8_epi16(_mm256_maskz_loadu_epi8(mask, b_ptr.add(base)));
        acc = _mm512_dpwssd_epi32(acc, wa, wb);
    }

    f64::from(_mm512_reduce_add_epi32(acc))
}

/// AVX-512 VNNI i8 fused cosine distance.
///
/// # Safety
///
/// Same requirements as [`dot_i8`].
#[target_feature(enable = "avx512f", enable = "avx512bw", enable = "avx512vl", enable = "avx512vnni")]
pub(crate) unsafe fn cos_i8(a: &[i8], b: &[i8]) -> f64 {
    let len = a.len();
    let simd_len = len / 32;
    let remainder = len % 32;

    let mut dot = _mm512_setzero_si512();
    let mut na = _mm512_setzero_si512();
    let mut nb = _mm512_setzero_si512();

    let a_ptr = a.as_ptr();
    let b_ptr = b.as_ptr();

    for i in 0..simd_len {
        let offset = i * 32;
        let wa = _mm512_cvtepi8_epi16(_mm256_loadu_si256(a_ptr.add(offset).cast()));
        let wb = _mm512_cvtepi8_epi16(_mm256_loadu_si256(b_ptr.add(offset).cast()));
        dot = _mm512_dpwssd_epi32(dot, wa, wb);
        na = _mm512_dpwssd_epi32(na, wa, wa);
        nb = _mm512_dpwssd_epi32(nb, wb, wb);
    }

    if remainder > 0 {
        let base = simd_len * 32;
        let mask = byte_mask32(remainder);
        let wa = _mm512_cvtepi8_epi16(_mm256_maskz_loadu_epi8(mask, a_ptr.add(base)));
        let wb = _mm512_cvtepi8_epi16(_mm256_maskz_loadu_epi8(mask, b_ptr.add(base)));
        dot = _mm512_dpwssd_epi32(dot, wa, wb);
        na = _mm512_dpwssd_epi32(na, wa, wa);
        nb = _mm512_dpwssd_epi32(nb, wb, wb);
    }

    scalar::cos_from_f32(
        _mm512_reduce_add_epi32(dot) as f32,
        _mm512_reduce_add_epi32(na) as f32,
        _mm512_reduce_add_epi32(nb) as f32,
    )
}

/// AVX-512 VNNI i8 squared L2 distance.
///
/// # Safety
///
/// Same requirements as [`dot_i8`].
#[target_feature(enable = "avx512f", enable = "avx512bw", enable = "avx512vl", enable = "avx512vnni")]
pub(crate) unsafe fn l2sq_i8(a: &[i8], b: &[i8]) -> f64 {
    let len = a.len();
    let simd_len = len / 32;
    let remainder = len % 32;

    let mut acc = _mm512_setzero_si512();
    let a_ptr = a.as_ptr();
    let b_ptr = b.as_ptr();

    for i in 0..simd_len {
        let offset = i * 32;
        let wa = _mm512_cvtepi8_epi16(_mm256_loadu_si256(a_ptr.add(offset).cast()));
        let wb = _mm512_cvtepi8_epi16(_mm256_loadu_si256(b_ptr.add(offset).cast()));
        // Differences fit i16 and square-accumulate into i32 lanes.
        let diff = _mm512_sub_epi16(wa, wb);
        acc = _mm512_dpwssd_epi32(acc, diff, diff);
    }

    if remainder > 0 {
        let base = simd_len * 32;
        let mask = byte_mask32(remainder);
        let wa = _mm512_cvtepi8_epi16(_mm256_maskz_loadu_epi8(mask, a_ptr.add(base)));
        let wb = _mm512_cvtepi8_epi16(_mm256_maskz_loadu_epi8(mask, b_ptr.add(base)));
        let diff = _mm512_sub_epi16(wa, wb);
        acc = _mm512_dpwssd_epi32(acc, diff, diff);
    }

    f64::from(_mm512_reduce_add_epi32(acc))
}

// =============================================================================
// Packed-bitset kernels (hardware popcount)
// =============================================================================

/// AVX-512 VPOPCNTDQ Hamming distance; `n` counts bytes.
///
/// # Safety
///
/// Same requirements as [`dot_i8`].
#[target_feature(enable = "avx512f", enable = "avx512bw", enable = "avx512vpopcntdq")]
pub(crate) unsafe fn hamming_b8(a: &[u8], b: &[u8]) -> f64 {
    let len = a.len();
    let simd_len = len / 64;
    let remainder = len % 64;

    let mut counts = _mm512_setzero_si512();
    let a_ptr = a.as_ptr().cast::<i8>();
    let b_ptr = b.as_ptr().cast::<i8>();

    for i in 0..simd_len {
        let offset = i * 64;
        let va = _mm512_loadu_si512(a_ptr.add(offset).cast());
        let vb = _mm512_loadu_si512(b_ptr.add(offset).cast());
        let diff = _mm512_xor_si512(va, vb);
        counts = _mm512_add_epi64(counts, _mm512_popcnt_epi64(diff));
    }

    if remainder > 0 {
        let base = simd_len * 64;
        let mask = byte_mask64(remainder);
        let va = _mm512_maskz_loadu_epi8(mask, a_ptr.add(base));
        let vb = _mm512_maskz_loadu_epi8(mask, b_ptr.add(base));
        let diff = _mm512_xor_si512(va, vb);
        counts = _mm512_add_epi64(counts, _mm512_popcnt_epi64(diff));
    }

    _mm512_reduce_add_epi64(counts) as f64
}

/// AVX-512 VPOPCNTDQ Jaccard distance; `n` counts bytes.
///
/// # Safety
///
/// Same requirements as [`dot_i8`].
#[target_feature(enable = "avx512f", enable = "avx512bw", enable = "avx512vpopcntdq")]
pub(crate) unsafe fn jaccard_b8(a: &[u8], b: &[u8]) -> f64 {
    let len = a.len();
    let simd_len = len / 64;
    let remainder = len % 64;

    let mut intersections = _mm512_setzero_si512();
    let mut unions = _mm512_setzero_si512();
    let a_ptr = a.as_ptr().cast::<i8>();
    let b_ptr = b.as_ptr().cast::<i8>();

    for i in 0..simd_len {
        let offset = i * 64;
        let va = _mm512_loadu_si512(a_ptr.add(offset).cast());
        let vb = _mm512_loadu_si512(b_ptr.add(offset).cast());
        intersections = _mm512_add_epi64(
            intersections,
            _mm512_popcnt_epi64(_mm512_and_si512(va, vb)),
        );
        unions = _mm512_add_epi64(unions, _mm512_popcnt_epi64(_mm512_or_si512(va, vb)));
    }

    if remainder > 0 {
        let base = simd_len * 64;
        let mask = byte_mask64(remainder);
        let va = _mm512_maskz_loadu_epi8(mask, a_ptr.add(base));
        let vb = _mm512_maskz_loadu_epi8(mask, b_ptr.add(base));
        intersections = _mm512_add_epi64(
            intersections,
            _mm512_popcnt_epi64(_mm512_and_si512(va, vb)),
        );
        unions = _mm512_add_epi64(unions, _mm512_popcnt_epi64(_mm512_or_si512(va, vb)));
    }

    scalar::jaccard_from_counts(
        _mm512_reduce_add_epi64(intersections) as u64,
        _mm512_reduce_add_epi64(unions) as u64,
    )
}
