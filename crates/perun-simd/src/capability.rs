//! Runtime CPU capability probe.
//!
//! The probe inspects the host CPU once and yields a bitmask of available
//! instruction-set tiers. The mask is cached process-wide; all later calls
//! are a single atomic load. The numeric bit values are part of the stable
//! interface and must not change between releases.

use std::sync::OnceLock;

/// Portable scalar fallback, always present.
pub const SERIAL: u32 = 1;
/// Arm NEON, always present on aarch64.
pub const NEON: u32 = 1 << 10;
/// Arm SVE with runtime-discovered vector length.
pub const SVE: u32 = 1 << 11;
/// Arm SVE2.
pub const SVE2: u32 = 1 << 12;
/// x86 AVX2 + FMA + F16C.
pub const HASWELL: u32 = 1 << 20;
/// x86 AVX-512 foundation (F + CD + VL + DQ + BW).
pub const SKYLAKE: u32 = 1 << 21;
/// x86 AVX-512 with VNNI, IFMA, BITALG, VBMI2 and VPOPCNTDQ.
pub const ICE: u32 = 1 << 22;
/// x86 AVX-512 with FP16 arithmetic.
pub const SAPPHIRE: u32 = 1 << 23;
/// Mask allowing every tier.
pub const ANY: u32 = u32::MAX;

/// One instruction-set tier a kernel can be compiled against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Portable scalar fallback.
    Serial,
    /// Arm NEON (128-bit lanes).
    Neon,
    /// Arm SVE.
    Sve,
    /// Arm SVE2.
    Sve2,
    /// x86 AVX2 + FMA + F16C (256-bit lanes).
    Haswell,
    /// x86 AVX-512 foundation (512-bit lanes, masked tails).
    Skylake,
    /// x86 AVX-512 with integer-dot and popcount extensions.
    Ice,
    /// x86 AVX-512 with native half-precision arithmetic.
    Sapphire,
}

impl Capability {
    /// Tiers in descending order of power, the resolver's walk order.
    pub const DESCENDING: [Self; 8] = [
        Self::Sapphire,
        Self::Ice,
        Self::Skylake,
        Self::Haswell,
        Self::Sve2,
        Self::Sve,
        Self::Neon,
        Self::Serial,
    ];

    /// Returns the stable bit for this tier.
    #[must_use]
    pub const fn bit(self) -> u32 {
        match self {
            Self::Serial => SERIAL,
            Self::Neon => NEON,
            Self::Sve => SVE,
            Self::Sve2 => SVE2,
            Self::Haswell => HASWELL,
            Self::Skylake => SKYLAKE,
            Self::Ice => ICE,
            Self::Sapphire => SAPPHIRE,
        }
    }

    /// Returns the lowercase tier name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Serial => "serial",
            Self::Neon => "neon",
            Self::Sve => "sve",
            Self::Sve2 => "sve2",
            Self::Haswell => "haswell",
            Self::Skylake => "skylake",
            Self::Ice => "ice",
            Self::Sapphire => "sapphire",
        }
    }

    /// Looks a tier up by its lowercase name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::DESCENDING
            .into_iter()
            .find(|tier| tier.name() == name)
    }
}

/// Cached capability mask - detected once at first use.
static CAPABILITIES: OnceLock<u32> = OnceLock::new();

/// Detects the instruction-set tiers of the current CPU.
fn detect() -> u32 {
    let mut mask = SERIAL;

    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("avx2")
            && is_x86_feature_detected!("fma")
            && is_x86_feature_detected!("f16c")
        {
            mask |= HASWELL;
        }
        if is_x86_feature_detected!("avx512f")
            && is_x86_feature_detected!("avx512cd")
            && is_x86_feature_detected!("avx512vl")
            && is_x86_feature_detected!("avx512dq")
            && is_x86_feature_detected!("avx512bw")
        {
            mask |= SKYLAKE;
            if is_x86_feature_detected!("avx512vnni")
                && is_x86_feature_detected!("avx512ifma")
                && is_x86_feature_detected!("avx512bitalg")
                && is_x86_feature_detected!("avx512vbmi2")
                && is_x86_feature_detected!("avx512vpopcntdq")
            {
                mask |= ICE;
            }
            if is_x86_feature_detected!("avx512fp16") {
                mask |= SAPPHIRE;
            }
        }
    }

    #[cfg(target_arch = "aarch64")]
    {
        mask |= NEON;
        mask |= sve_bits();
    }

    let tiers: Vec<&str> = Capability::DESCENDING
        .into_iter()
        .filter(|tier| mask & tier.bit() != 0)
        .map(Capability::name)
        .collect();
    tracing::debug!(?tiers, "detected CPU capabilities, mask {:#x}", mask);

    mask
}

/// Queries the kernel hardware-capability vector for SVE and SVE2.
#[cfg(all(target_arch = "aarch64", target_os = "linux"))]
fn sve_bits() -> u32 {
    // Linux HWCAP bit assignments from <asm/hwcap.h>.
    const HWCAP_SVE: libc::c_ulong = 1 << 22;
    const HWCAP2_SVE2: libc::c_ulong = 1 << 1;

    let mut mask = 0;
    // SAFETY: getauxval is async-signal-safe and takes no pointers.
    let hwcap = unsafe { libc::getauxval(libc::AT_HWCAP) };
    if hwcap & HWCAP_SVE != 0 {
        mask |= SVE;
        let hwcap2 = unsafe { libc::getauxval(libc::AT_HWCAP2) };
        if hwcap2 & HWCAP2_SVE2 != 0 {
            mask |= SVE2;
        }
    }
    mask
}

#[cfg(all(target_arch = "aarch64", not(target_os = "linux")))]
fn sve_bits() -> u32 {
    0
}

/// Returns the cached capability bitmask of the host CPU.
///
/// The mask always contains [`SERIAL`]. The result is pure and idempotent;
/// callers may cache it, but repeated calls are already a single load.
#[inline]
#[must_use]
pub fn capabilities() -> u32 {
    *CAPABILITIES.get_or_init(detect)
}

/// Warms up the detection cache and the kernel hot paths.
///
/// Call once at application startup so the first real distance computation
/// does not pay for capability detection or cold instruction caches. Useful
/// for latency-sensitive callers such as real-time vector search.
pub fn warmup() {
    let _ = capabilities();

    // 768 dimensions is a common embedding width; three passes settle the
    // branch predictors and bring the kernel code into the i-cache.
    let a = vec![0.01_f32; 768];
    let b = vec![0.01_f32; 768];
    for _ in 0..3 {
        let _ = crate::dispatch::distance(crate::types::MetricKind::Dot, &a, &b);
        let _ = crate::dispatch::distance(crate::types::MetricKind::Cos, &a, &b);
    }
}

/// Enables flush-to-zero and denormals-are-zero for the calling thread.
///
/// Denormal inputs can slow the floating-point kernels by an order of
/// magnitude on x86. Callers that do not need gradual underflow can opt out
/// per thread. No-op on non-x86 hosts.
pub fn flush_denormals() {
    #[cfg(target_arch = "x86_64")]
    {
        use std::arch::x86_64::{_mm_getcsr, _mm_setcsr};
        // MXCSR bit 15 is Flush-To-Zero, bit 6 is Denormals-Are-Zero.
        const FTZ_DAZ_MASK: u32 = 0x8040;
        // SAFETY: Only alters the calling thread's MXCSR rounding-control
        // bits; every x86_64 CPU supports both flags.
        unsafe {
            let csr = _mm_getcsr();
            _mm_setcsr(csr | FTZ_DAZ_MASK);
        }
    }
}
