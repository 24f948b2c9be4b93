//! Kernel resolution: binds a (metric, dtype) request to a concrete kernel
//! pointer, respecting caller-imposed tier restrictions.
//!
//! The resolver walks tiers in descending order of power over
//! `supported & allowed` and returns the first cell that exists for the
//! request; the serial row is the unconditional fallback. Resolution is pure
//! and allocation-free - callers are expected to resolve once per
//! (metric, dtype) and reuse the pointer, either directly or through the
//! [`Kernel`] handle.

use std::sync::OnceLock;

use crate::capability::{self, Capability, ANY};
use crate::error::{Error, Result};
use crate::types::{Datatype, MetricKind, SimdScalar};

/// Type-erased kernel pointer: `(a, b, n, out)`.
///
/// `n` is the logical element count (bytes for `b8`, complex pairs for the
/// `*c` dtypes). Real metrics write one `f64` at `out`; complex metrics
/// write two.
///
/// # Safety
///
/// Both pointers must address at least `n` valid elements of the dtype the
/// pointer was resolved for (`2 * n` scalars for complex dtypes), and `out`
/// must have room for the metric's lane count.
pub type KernelFn = unsafe fn(*const u8, *const u8, usize, *mut f64);

/// A resolved dispatch-table cell.
#[derive(Clone, Copy)]
pub struct Resolved {
    /// The type-erased kernel pointer.
    pub func: KernelFn,
    /// The tier the kernel was compiled against.
    pub tier: Capability,
}

// =============================================================================
// Type-erasure shims
// =============================================================================

macro_rules! real_kernel {
    ($shim:ident, $ty:ty, $kernel:path) => {
        unsafe fn $shim(a: *const u8, b: *const u8, n: usize, out: *mut f64) {
            // SAFETY: the resolver hands this shim out only for the dtype it
            // was instantiated with; the caller guarantees `n` valid
            // elements behind each pointer and one output slot.
            unsafe {
                let a = std::slice::from_raw_parts(a.cast::<$ty>(), n);
                let b = std::slice::from_raw_parts(b.cast::<$ty>(), n);
                out.write($kernel(a, b));
            }
        }
    };
}

macro_rules! complex_kernel {
    ($shim:ident, $ty:ty, $kernel:path) => {
        unsafe fn $shim(a: *const u8, b: *const u8, n: usize, out: *mut f64) {
            // SAFETY: complex vectors interleave 2n scalars; the caller
            // guarantees two output slots.
            unsafe {
                let a = std::slice::from_raw_parts(a.cast::<$ty>(), 2 * n);
                let b = std::slice::from_raw_parts(b.cast::<$ty>(), 2 * n);
                let [re, im] = $kernel(a, b);
                out.write(re);
                out.add(1).write(im);
            }
        }
    };
}

mod serial_shims {
    use crate::kernels::serial as k;

    real_kernel!(dot_f64, f64, k::dot_f64);
    real_kernel!(dot_f32, f32, k::dot_f32);
    real_kernel!(dot_f16, half::f16, k::dot_f16);
    real_kernel!(dot_bf16, half::bf16, k::dot_bf16);
    real_kernel!(dot_i8, i8, k::dot_i8);

    real_kernel!(cos_f64, f64, k::cos_f64);
    real_kernel!(cos_f32, f32, k::cos_f32);
    real_kernel!(cos_f16, half::f16, k::cos_f16);
    real_kernel!(cos_bf16, half::bf16, k::cos_bf16);
    real_kernel!(cos_i8, i8, k::cos_i8);

    real_kernel!(l2sq_f64, f64, k::l2sq_f64);
    real_kernel!(l2sq_f32, f32, k::l2sq_f32);
    real_kernel!(l2sq_f16, half::f16, k::l2sq_f16);
    real_kernel!(l2sq_bf16, half::bf16, k::l2sq_bf16);
    real_kernel!(l2sq_i8, i8, k::l2sq_i8);

    real_kernel!(hamming_b8, u8, k::hamming_b8);
    real_kernel!(jaccard_b8, u8, k::jaccard_b8);

    real_kernel!(kl_f64, f64, k::kl_f64);
    real_kernel!(kl_f32, f32, k::kl_f32);
    real_kernel!(kl_f16, half::f16, k::kl_f16);
    real_kernel!(js_f64, f64, k::js_f64);
    real_kernel!(js_f32, f32, k::js_f32);
    real_kernel!(js_f16, half::f16, k::js_f16);

    complex_kernel!(dot_f64c, f64, k::dot_f64c);
    complex_kernel!(dot_f32c, f32, k::dot_f32c);
    complex_kernel!(dot_f16c, half::f16, k::dot_f16c);
    complex_kernel!(vdot_f64c, f64, k::vdot_f64c);
    complex_kernel!(vdot_f32c, f32, k::vdot_f32c);
    complex_kernel!(vdot_f16c, half::f16, k::vdot_f16c);

    pub(super) fn entry(
        metric: crate::types::MetricKind,
        dtype: crate::types::Datatype,
    ) -> Option<super::KernelFn> {
        use crate::types::Datatype as D;
        use crate::types::MetricKind as M;

        let func: super::KernelFn = match (metric, dtype) {
            (M::Dot, D::F64) => dot_f64,
            (M::Dot, D::F32) => dot_f32,
            (M::Dot, D::F16) => dot_f16,
            (M::Dot, D::Bf16) => dot_bf16,
            (M::Dot, D::I8) => dot_i8,
            (M::Dot, D::F64c) => dot_f64c,
            (M::Dot, D::F32c) => dot_f32c,
            (M::Dot, D::F16c) => dot_f16c,

            (M::Vdot, D::F64c) => vdot_f64c,
            (M::Vdot, D::F32c) => vdot_f32c,
            (M::Vdot, D::F16c) => vdot_f16c,

            (M::Cos, D::F64) => cos_f64,
            (M::Cos, D::F32) => cos_f32,
            (M::Cos, D::F16) => cos_f16,
            (M::Cos, D::Bf16) => cos_bf16,
            (M::Cos, D::I8) => cos_i8,

            (M::L2sq, D::F64) => l2sq_f64,
            (M::L2sq, D::F32) => l2sq_f32,
            (M::L2sq, D::F16) => l2sq_f16,
            (M::L2sq, D::Bf16) => l2sq_bf16,
            (M::L2sq, D::I8) => l2sq_i8,

            (M::Hamming, D::B8) => hamming_b8,
            (M::Jaccard, D::B8) => jaccard_b8,

            (M::Kl, D::F64) => kl_f64,
            (M::Kl, D::F32) => kl_f32,
            (M::Kl, D::F16) => kl_f16,
            (M::Js, D::F64) => js_f64,
            (M::Js, D::F32) => js_f32,
            (M::Js, D::F16) => js_f16,

            _ => return None,
        };
        Some(func)
    }
}

#[cfg(target_arch = "x86_64")]
mod haswell_shims {
    use crate::kernels::x86_haswell as k;

    real_kernel!(dot_f32, f32, k::dot_f32);
    real_kernel!(cos_f32, f32, k::cos_f32);
    real_kernel!(l2sq_f32, f32, k::l2sq_f32);
    real_kernel!(kl_f32, f32, k::kl_f32);
    real_kernel!(js_f32, f32, k::js_f32);

    real_kernel!(dot_f16, half::f16, k::dot_f16);
    real_kernel!(cos_f16, half::f16, k::cos_f16);
    real_kernel!(l2sq_f16, half::f16, k::l2sq_f16);

    real_kernel!(dot_i8, i8, k::dot_i8);
    real_kernel!(cos_i8, i8, k::cos_i8);
    real_kernel!(l2sq_i8, i8, k::l2sq_i8);

    real_kernel!(hamming_b8, u8, k::hamming_b8);
    real_kernel!(jaccard_b8, u8, k::jaccard_b8);

    complex_kernel!(dot_f32c, f32, k::dot_f32c);
    complex_kernel!(vdot_f32c, f32, k::vdot_f32c);

    pub(super) fn entry(
        metric: crate::types::MetricKind,
        dtype: crate::types::Datatype,
    ) -> Option<super::KernelFn> {
        use crate::types::Datatype as D;
        use crate::types::MetricKind as M;

        let func: super::KernelFn = match (metric, dtype) {
            (M::Dot, D::F32) => dot_f32,
            (M::Cos, D::F32) => cos_f32,
            (M::L2sq, D::F32) => l2sq_f32,
            (M::Kl, D::F32) => kl_f32,
            (M::Js, D::F32) => js_f32,

            (M::Dot, D::F16) => dot_f16,
            (M::Cos, D::F16) => cos_f16,
            (M::L2sq, D::F16) => l2sq_f16,

            (M::Dot, D::I8) => dot_i8,
            (M::Cos, D::I8) => cos_i8,
            (M::L2sq, D::I8) => l2sq_i8,

            (M::Hamming, D::B8) => hamming_b8,
            (M::Jaccard, D::B8) => jaccard_b8,

            (M::Dot, D::F32c) => dot_f32c,
            (M::Vdot, D::F32c) => vdot_f32c,

            _ => return None,
        };
        Some(func)
    }
}

#[cfg(target_arch = "x86_64")]
mod skylake_shims {
    use crate::kernels::x86_skylake as k;

    real_kernel!(dot_f64, f64, k::dot_f64);
    real_kernel!(cos_f64, f64, k::cos_f64);
    real_kernel!(l2sq_f64, f64, k::l2sq_f64);

    real_kernel!(dot_f32, f32, k::dot_f32);
    real_kernel!(cos_f32, f32, k::cos_f32);
    real_kernel!(l2sq_f32, f32, k::l2sq_f32);

    real_kernel!(dot_f16, half::f16, k::dot_f16);
    real_kernel!(cos_f16, half::f16, k::cos_f16);
    real_kernel!(l2sq_f16, half::f16, k::l2sq_f16);

    pub(super) fn entry(
        metric: crate::types::MetricKind,
        dtype: crate::types::Datatype,
    ) -> Option<super::KernelFn> {
        use crate::types::Datatype as D;
        use crate::types::MetricKind as M;

        let func: super::KernelFn = match (metric, dtype) {
            (M::Dot, D::F64) => dot_f64,
            (M::Cos, D::F64) => cos_f64,
            (M::L2sq, D::F64) => l2sq_f64,

            (M::Dot, D::F32) => dot_f32,
            (M::Cos, D::F32) => cos_f32,
            (M::L2sq, D::F32) => l2sq_f32,

            (M::Dot, D::F16) => dot_f16,
            (M::Cos, D::F16) => cos_f16,
            (M::L2sq, D::F16) => l2sq_f16,

            _ => return None,
        };
        Some(func)
    }
}

#[cfg(target_arch = "x86_64")]
mod ice_shims {
    use crate::kernels::x86_ice as k;

    real_kernel!(dot_i8, i8, k::dot_i8);
    real_kernel!(cos_i8, i8, k::cos_i8);
    real_kernel!(l2sq_i8, i8, k::l2sq_i8);

    real_kernel!(hamming_b8, u8, k::hamming_b8);
    real_kernel!(jaccard_b8, u8, k::jaccard_b8);

    pub(super) fn entry(
        metric: crate::types::MetricKind,
        dtype: crate::types::Datatype,
    ) -> Option<super::KernelFn> {
        use crate::types::Datatype as D;
        use crate::types::MetricKind as M;

        let func: super::KernelFn = match (metric, dtype) {
            (M::Dot, D::I8) => dot_i8,
            (M::Cos, D::I8) => cos_i8,
            (M::L2sq, D::I8) => l2sq_i8,

            (M::Hamming, D::B8) => hamming_b8,
            (M::Jaccard, D::B8) => jaccard_b8,

            _ => return None,
        };
        Some(func)
    }
}

#[cfg(target_arch = "aarch64")]
mod neon_shims {
    use crate::kernels::neon as k;

    real_kernel!(dot_f32, f32, k::dot_f32);
    real_kernel!(cos_f32, f32, k::cos_f32);
    real_kernel!(l2sq_f32, f32, k::l2sq_f32);

    real_kernel!(dot_i8, i8, k::dot_i8);
    real_kernel!(cos_i8, i8, k::cos_i8);
    real_kernel!(l2sq_i8, i8, k::l2sq_i8);

    real_kernel!(hamming_b8, u8, k::hamming_b8);
    real_kernel!(jaccard_b8, u8, k::jaccard_b8);

    pub(super) fn entry(
        metric: crate::types::MetricKind,
        dtype: crate::types::Datatype,
    ) -> Option<super::KernelFn> {
        use crate::types::Datatype as D;
        use crate::types::MetricKind as M;

        let func: super::KernelFn = match (metric, dtype) {
            (M::Dot, D::F32) => dot_f32,
            (M::Cos, D::F32) => cos_f32,
            (M::L2sq, D::F32) => l2sq_f32,

            (M::Dot, D::I8) => dot_i8,
            (M::Cos, D::I8) => cos_i8,
            (M::L2sq, D::I8) => l2sq_i8,

            (M::Hamming, D::B8) => hamming_b8,
            (M::Jaccard, D::B8) => jaccard_b8,

            _ => return None,
        };
        Some(func)
    }
}

// =============================================================================
// Resolution
// =============================================================================

/// Looks up the dispatch-table cell for a single tier.
fn entry(metric: MetricKind, dtype: Datatype, tier: Capability) -> Option<KernelFn> {
    match tier {
        Capability::Serial => serial_shims::entry(metric, dtype),
        #[cfg(target_arch = "x86_64")]
        Capability::Haswell => haswell_shims::entry(metric, dtype),
        #[cfg(target_arch = "x86_64")]
        Capability::Skylake => skylake_shims::entry(metric, dtype),
        #[cfg(target_arch = "x86_64")]
        Capability::Ice => ice_shims::entry(metric, dtype),
        #[cfg(target_arch = "aarch64")]
        Capability::Neon => neon_shims::entry(metric, dtype),
        _ => None,
    }
}

/// Name of the opt-in env var listing tiers to mask out of every resolution.
///
/// Comma-separated lowercase tier names, e.g. `skylake,ice`. Read once per
/// process; intended for debugging tier-specific issues.
pub const FORBID_ENV: &str = "PERUN_SIMD_FORBID";

static FORBIDDEN: OnceLock<u32> = OnceLock::new();

fn forbidden() -> u32 {
    *FORBIDDEN.get_or_init(|| std::env::var(FORBID_ENV).map_or(0, |value| parse_forbid(&value)))
}

/// Parses a comma-separated tier list into a capability mask.
pub(crate) fn parse_forbid(value: &str) -> u32 {
    let mut mask = 0;
    for name in value.split(',').map(str::trim).filter(|name| !name.is_empty()) {
        if let Some(tier) = Capability::from_name(&name.to_ascii_lowercase()) {
            mask |= tier.bit();
        } else {
            tracing::warn!(tier = name, "unknown tier name in {}", FORBID_ENV);
        }
    }
    mask
}

/// Resolves a (metric, dtype) request against the allowed tier mask.
///
/// Walks tiers in descending order of power over `supported & allowed` and
/// returns the first existing cell. Falls through to the serial row even
/// when `allowed` masks it out; returns `None` only for combinations with no
/// serial implementation.
#[must_use]
pub fn resolve(metric: MetricKind, dtype: Datatype, allowed: u32) -> Option<Resolved> {
    let viable = capability::capabilities() & allowed & !forbidden();

    for tier in Capability::DESCENDING {
        if matches!(tier, Capability::Serial) {
            break;
        }
        if viable & tier.bit() != 0 {
            if let Some(func) = entry(metric, dtype, tier) {
                tracing::trace!(metric = %metric, dtype = %dtype, tier = tier.name(), "resolved kernel");
                return Some(Resolved { func, tier });
            }
        }
    }

    entry(metric, dtype, Capability::Serial).map(|func| Resolved {
        func,
        tier: Capability::Serial,
    })
}

// =============================================================================
// Resolve-once handle
// =============================================================================

/// A resolved kernel bound to its (metric, dtype) request.
///
/// Eliminates per-call table walks by resolving once; all subsequent calls
/// go through a single indirect call with no branching. Bare `fn` pointers
/// keep the handle `Copy` and freely shareable across threads - the batch
/// driver hands copies to its workers.
#[derive(Clone, Copy)]
pub struct Kernel {
    func: KernelFn,
    tier: Capability,
    metric: MetricKind,
    datatype: Datatype,
}

impl std::fmt::Debug for Kernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Kernel")
            .field("metric", &self.metric)
            .field("datatype", &self.datatype)
            .field("tier", &self.tier)
            .finish_non_exhaustive()
    }
}

impl Kernel {
    /// Resolves a kernel handle, failing for unsupported combinations.
    pub fn resolve(metric: MetricKind, datatype: Datatype, allowed: u32) -> Result<Self> {
        resolve(metric, datatype, allowed)
            .map(|resolved| Self {
                func: resolved.func,
                tier: resolved.tier,
                metric,
                datatype,
            })
            .ok_or(Error::UnsupportedCombination { metric, datatype })
    }

    /// Returns the metric this handle computes.
    #[must_use]
    pub fn metric(&self) -> MetricKind {
        self.metric
    }

    /// Returns the dtype this handle was resolved for.
    #[must_use]
    pub fn datatype(&self) -> Datatype {
        self.datatype
    }

    /// Returns the tier the resolved kernel was compiled against.
    #[must_use]
    pub fn tier(&self) -> Capability {
        self.tier
    }

    /// Computes the distance between two vectors.
    ///
    /// Zero-length inputs finalize to the metric's identity value without
    /// touching the kernel.
    #[inline]
    pub fn call<T: SimdScalar>(&self, a: &[T], b: &[T]) -> Result<f64> {
        if T::DATATYPE != self.datatype {
            return Err(Error::UnsupportedCombination {
                metric: self.metric,
                datatype: T::DATATYPE,
            });
        }
        if a.len() != b.len() {
            return Err(Error::DimensionMismatch {
                expected: a.len(),
                actual: b.len(),
            });
        }
        if a.is_empty() {
            return Ok(self.metric.empty_value());
        }

        let mut out = 0.0_f64;
        // SAFETY: dtype and equal lengths verified above; `out` is one slot,
        // which is what every real-metric kernel writes.
        unsafe {
            (self.func)(a.as_ptr().cast(), b.as_ptr().cast(), a.len(), &mut out);
        }
        Ok(out)
    }

    /// Computes a complex distance; inputs interleave `2n` scalars.
    #[inline]
    pub fn call_complex<T: SimdScalar>(&self, a: &[T], b: &[T]) -> Result<[f64; 2]> {
        let datatype = T::COMPLEX.ok_or(Error::UnsupportedCombination {
            metric: self.metric,
            datatype: T::DATATYPE,
        })?;
        if datatype != self.datatype {
            return Err(Error::UnsupportedCombination {
                metric: self.metric,
                datatype,
            });
        }
        if a.len() != b.len() {
            return Err(Error::DimensionMismatch {
                expected: a.len(),
                actual: b.len(),
            });
        }
        if a.len() % 2 != 0 {
            return Err(Error::OddComplexLength(a.len()));
        }
        if a.is_empty() {
            return Ok([0.0, 0.0]);
        }

        let mut out = [0.0_f64; 2];
        // SAFETY: dtype, equal lengths and even scalar count verified above;
        // `out` has the two slots complex kernels write.
        unsafe {
            (self.func)(a.as_ptr().cast(), b.as_ptr().cast(), a.len() / 2, out.as_mut_ptr());
        }
        Ok(out)
    }

    /// Raw invocation for the batch driver; the caller owns all checks.
    #[inline]
    pub(crate) unsafe fn invoke(&self, a: *const u8, b: *const u8, n: usize, out: *mut f64) {
        // SAFETY: forwarded contract, see `KernelFn`.
        unsafe { (self.func)(a, b, n, out) }
    }
}

// =============================================================================
// One-shot convenience entry points
// =============================================================================

/// Computes a distance between two vectors, resolving the kernel on the fly.
///
/// Hot loops should prefer [`Kernel::resolve`] + [`Kernel::call`] to amortize
/// the table walk.
#[inline]
pub fn distance<T: SimdScalar>(metric: MetricKind, a: &[T], b: &[T]) -> Result<f64> {
    Kernel::resolve(metric, T::DATATYPE, ANY)?.call(a, b)
}

/// Computes a complex distance between two interleaved vectors.
///
/// Inputs hold `2n` scalars for a logical length of `n`; the result is
/// `[real, imaginary]`.
#[inline]
pub fn complex_distance<T: SimdScalar>(metric: MetricKind, a: &[T], b: &[T]) -> Result<[f64; 2]> {
    let datatype = T::COMPLEX.ok_or(Error::UnsupportedCombination {
        metric,
        datatype: T::DATATYPE,
    })?;
    Kernel::resolve(metric, datatype, ANY)?.call_complex(a, b)
}
