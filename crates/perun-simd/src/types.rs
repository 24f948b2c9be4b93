//! Metric and scalar-type tags with their stable wire codes.
//!
//! The single-character metric codes, the dtype ordinals and the capability
//! bits in [`crate::capability`] are part of the stable interface: language
//! bindings and persisted configuration rely on the numeric values. Aliases
//! (`inner` for `dot`, `tanimoto` for `jaccard`, ...) share the code of their
//! canonical name and are indistinguishable to callers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// =============================================================================
// Metric kinds
// =============================================================================

/// Distance/similarity metric computed by a kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetricKind {
    /// Unconjugated inner product (real or complex).
    Dot,
    /// Complex inner product with the first operand conjugated.
    Vdot,
    /// Cosine distance: `1 - a.b / (|a| |b|)`, `1` when either norm is zero.
    Cos,
    /// Squared Euclidean distance.
    L2sq,
    /// Bit-level disagreement count over packed bitsets.
    Hamming,
    /// Jaccard distance over packed bitsets: `1 - |a & b| / |a | b|`.
    Jaccard,
    /// Kullback-Leibler divergence over probability vectors.
    Kl,
    /// Jensen-Shannon divergence over probability vectors.
    Js,
}

impl MetricKind {
    /// All metrics, in code order.
    pub const ALL: [Self; 8] = [
        Self::Dot,
        Self::Vdot,
        Self::Cos,
        Self::L2sq,
        Self::Hamming,
        Self::Jaccard,
        Self::Kl,
        Self::Js,
    ];

    /// Returns the stable single-character code for this metric.
    #[must_use]
    pub const fn code(self) -> char {
        match self {
            Self::Dot => 'i',
            Self::Vdot => 'v',
            Self::Cos => 'c',
            Self::L2sq => 'e',
            Self::Hamming => 'h',
            Self::Jaccard => 'j',
            Self::Kl => 'k',
            Self::Js => 's',
        }
    }

    /// Looks a metric up by its single-character code.
    #[must_use]
    pub const fn from_code(code: char) -> Option<Self> {
        match code {
            'i' => Some(Self::Dot),
            'v' => Some(Self::Vdot),
            'c' => Some(Self::Cos),
            'e' => Some(Self::L2sq),
            'h' => Some(Self::Hamming),
            'j' => Some(Self::Jaccard),
            'k' => Some(Self::Kl),
            's' => Some(Self::Js),
            _ => None,
        }
    }

    /// Returns the canonical lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Dot => "dot",
            Self::Vdot => "vdot",
            Self::Cos => "cos",
            Self::L2sq => "l2sq",
            Self::Hamming => "hamming",
            Self::Jaccard => "jaccard",
            Self::Kl => "kl",
            Self::Js => "js",
        }
    }

    /// Value a zero-length input finalizes to without running a kernel.
    ///
    /// Empty sums are zero for every accumulator-style metric; cosine treats
    /// both norms as zero and applies its zero-norm policy.
    #[must_use]
    pub(crate) const fn empty_value(self) -> f64 {
        match self {
            Self::Cos => 1.0,
            _ => 0.0,
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MetricKind {
    type Err = ();

    /// Parses a metric name or one of its aliases (case-insensitive).
    fn from_str(s: &str) -> std::result::Result<Self, ()> {
        match s.to_ascii_lowercase().as_str() {
            "dot" | "inner" => Ok(Self::Dot),
            "vdot" => Ok(Self::Vdot),
            "cos" | "cosine" | "angular" => Ok(Self::Cos),
            "l2sq" | "sqeuclidean" => Ok(Self::L2sq),
            "hamming" | "manhattan" => Ok(Self::Hamming),
            "jaccard" | "tanimoto" => Ok(Self::Jaccard),
            "kl" | "kullback-leibler" => Ok(Self::Kl),
            "js" | "jensen-shannon" => Ok(Self::Js),
            _ => Err(()),
        }
    }
}

// =============================================================================
// Scalar types
// =============================================================================

/// Declared scalar type of a vector's elements.
///
/// Complex variants describe interleaved real/imaginary pairs: a logical
/// element count of `n` spans `2 * n` underlying scalars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Datatype {
    /// IEEE-754 binary64.
    F64,
    /// IEEE-754 binary32.
    F32,
    /// IEEE-754 binary16, packed as 16-bit words.
    F16,
    /// Signed 8-bit integer.
    I8,
    /// 8-bit word interpreted as a packed bitset; `n` counts bytes.
    B8,
    /// Interleaved complex binary64.
    F64c,
    /// Interleaved complex binary32.
    F32c,
    /// Interleaved complex binary16.
    F16c,
    /// Brain float 16, packed as 16-bit words.
    Bf16,
}

impl Datatype {
    /// All dtypes, in ordinal order.
    pub const ALL: [Self; 9] = [
        Self::F64,
        Self::F32,
        Self::F16,
        Self::I8,
        Self::B8,
        Self::F64c,
        Self::F32c,
        Self::F16c,
        Self::Bf16,
    ];

    /// Returns the stable integer ordinal for this dtype.
    #[must_use]
    pub const fn ordinal(self) -> u8 {
        match self {
            Self::F64 => 0,
            Self::F32 => 1,
            Self::F16 => 2,
            Self::I8 => 3,
            Self::B8 => 4,
            Self::F64c => 5,
            Self::F32c => 6,
            Self::F16c => 7,
            Self::Bf16 => 8,
        }
    }

    /// Looks a dtype up by its stable ordinal.
    #[must_use]
    pub const fn from_ordinal(ordinal: u8) -> Option<Self> {
        match ordinal {
            0 => Some(Self::F64),
            1 => Some(Self::F32),
            2 => Some(Self::F16),
            3 => Some(Self::I8),
            4 => Some(Self::B8),
            5 => Some(Self::F64c),
            6 => Some(Self::F32c),
            7 => Some(Self::F16c),
            8 => Some(Self::Bf16),
            _ => None,
        }
    }

    /// Returns true for interleaved complex layouts.
    #[must_use]
    pub const fn is_complex(self) -> bool {
        matches!(self, Self::F64c | Self::F32c | Self::F16c)
    }

    /// Returns the canonical lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::F64 => "f64",
            Self::F32 => "f32",
            Self::F16 => "f16",
            Self::I8 => "i8",
            Self::B8 => "b8",
            Self::F64c => "f64c",
            Self::F32c => "f32c",
            Self::F16c => "f16c",
            Self::Bf16 => "bf16",
        }
    }
}

impl fmt::Display for Datatype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Datatype {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, ()> {
        match s.to_ascii_lowercase().as_str() {
            "f64" => Ok(Self::F64),
            "f32" => Ok(Self::F32),
            "f16" => Ok(Self::F16),
            "i8" => Ok(Self::I8),
            "b8" => Ok(Self::B8),
            "f64c" => Ok(Self::F64c),
            "f32c" => Ok(Self::F32c),
            "f16c" => Ok(Self::F16c),
            "bf16" => Ok(Self::Bf16),
            _ => Err(()),
        }
    }
}

// =============================================================================
// Scalar carrier trait
// =============================================================================

mod sealed {
    pub trait Sealed {}

    impl Sealed for f64 {}
    impl Sealed for f32 {}
    impl Sealed for half::f16 {}
    impl Sealed for half::bf16 {}
    impl Sealed for i8 {}
    impl Sealed for u8 {}
}

/// Rust carrier types for the supported scalar tags.
///
/// Sealed: the dispatch table only knows the dtypes listed in [`Datatype`],
/// and the type-erased kernel pointers rely on the exact memory layout of
/// these carriers.
pub trait SimdScalar: sealed::Sealed + Copy + Send + Sync + 'static {
    /// Tag for plain vectors of this scalar.
    const DATATYPE: Datatype;
    /// Tag for interleaved complex vectors, when the scalar supports them.
    const COMPLEX: Option<Datatype>;
}

impl SimdScalar for f64 {
    const DATATYPE: Datatype = Datatype::F64;
    const COMPLEX: Option<Datatype> = Some(Datatype::F64c);
}

impl SimdScalar for f32 {
    const DATATYPE: Datatype = Datatype::F32;
    const COMPLEX: Option<Datatype> = Some(Datatype::F32c);
}

impl SimdScalar for half::f16 {
    const DATATYPE: Datatype = Datatype::F16;
    const COMPLEX: Option<Datatype> = Some(Datatype::F16c);
}

impl SimdScalar for half::bf16 {
    const DATATYPE: Datatype = Datatype::Bf16;
    const COMPLEX: Option<Datatype> = None;
}

impl SimdScalar for i8 {
    const DATATYPE: Datatype = Datatype::I8;
    const COMPLEX: Option<Datatype> = None;
}

impl SimdScalar for u8 {
    const DATATYPE: Datatype = Datatype::B8;
    const COMPLEX: Option<Datatype> = None;
}
