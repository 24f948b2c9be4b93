//! SIMD micro-kernels, one module per instruction-set tier.
//!
//! # Module Structure
//!
//! - `scalar` — fast-rsqrt and shared metric finalization helpers
//! - `serial` — portable kernels, the reference row of the dispatch table
//! - `x86_haswell` — AVX2+FMA+F16C kernels (x86_64 only)
//! - `x86_skylake` — AVX-512F kernels with masked tails (x86_64 only)
//! - `x86_ice` — AVX-512 VNNI/VPOPCNTDQ kernels (x86_64 only)
//! - `neon` — ARM NEON kernels (aarch64 only)
//!
//! Kernels are pure, stateless and allocation-free. Within a (metric, dtype)
//! pair, different tiers may produce bitwise different results because the
//! reduction tree differs; each tier is reproducible call-to-call and stays
//! within a few ULP per reduction level of the serial row.

// =============================================================================
// Unsafe Invariants Reference
// =============================================================================
// SAFETY: Shared invariants for SIMD unsafe blocks in this module tree.
// - Condition 1: All pointer arithmetic is derived from slice pointers with
//   loop bounds proving in-range access for each lane width.
// - Condition 2: Target-featured functions are called only after the runtime
//   capability probe confirms the tier, or on architectures where the
//   feature is guaranteed.
// - Condition 3: Unaligned loads use `*_loadu_*`/masked-load intrinsics or
//   equivalent APIs that permit unaligned access.

pub(crate) mod scalar;
pub(crate) mod serial;

#[cfg(target_arch = "x86_64")]
pub(crate) mod x86_haswell;

#[cfg(target_arch = "x86_64")]
pub(crate) mod x86_ice;

#[cfg(target_arch = "x86_64")]
pub(crate) mod x86_skylake;

#[cfg(target_arch = "aarch64")]
pub(crate) mod neon;

// =============================================================================
// Tests (separate files per project rules)
// =============================================================================

#[cfg(test)]
mod serial_tests;
