//! Error types for PerunSIMD.
//!
//! All failures are reported at the dispatch/driver boundary, never from
//! inside a kernel. Numerical edge cases (zero norms, empty unions, infinite
//! divergences) are defined values, not errors.

use thiserror::Error;

use crate::types::{Datatype, MetricKind};

/// Result type alias for PerunSIMD operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when resolving kernels or driving batches.
///
/// Each variant includes a descriptive message suitable for end-users.
/// Error codes follow the pattern `PERUN-XXX` for easy debugging.
#[derive(Error, Debug)]
pub enum Error {
    /// Inner dimensions of the two inputs differ (PERUN-001).
    #[error("[PERUN-001] Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Actual dimension.
        actual: usize,
    },

    /// Outer dimensions differ in paired mode (PERUN-002).
    #[error("[PERUN-002] Row count mismatch in paired mode: {left} vs {right}")]
    RowCountMismatch {
        /// Row count of the left batch.
        left: usize,
        /// Row count of the right batch.
        right: usize,
    },

    /// Output buffer has the wrong length (PERUN-003).
    #[error("[PERUN-003] Output length mismatch: expected {expected}, got {actual}")]
    OutputLengthMismatch {
        /// Expected output length.
        expected: usize,
        /// Actual output length.
        actual: usize,
    },

    /// No kernel exists for the requested metric/dtype pair (PERUN-004).
    #[error("[PERUN-004] No kernel for metric '{metric}' over dtype '{datatype}'")]
    UnsupportedCombination {
        /// Requested metric.
        metric: MetricKind,
        /// Requested scalar type.
        datatype: Datatype,
    },

    /// A complex vector has an odd number of interleaved scalars (PERUN-005).
    #[error("[PERUN-005] Complex vector needs an even scalar count, got {0}")]
    OddComplexLength(usize),

    /// Invalid row-matrix layout (PERUN-006).
    #[error("[PERUN-006] Invalid batch layout: {0}")]
    Layout(String),

    /// Worker pool construction failed (PERUN-007).
    #[error("[PERUN-007] Thread pool error: {0}")]
    ThreadPool(String),
}

impl Error {
    /// Returns the error code (e.g., "PERUN-001").
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::DimensionMismatch { .. } => "PERUN-001",
            Self::RowCountMismatch { .. } => "PERUN-002",
            Self::OutputLengthMismatch { .. } => "PERUN-003",
            Self::UnsupportedCombination { .. } => "PERUN-004",
            Self::OddComplexLength(_) => "PERUN-005",
            Self::Layout(_) => "PERUN-006",
            Self::ThreadPool(_) => "PERUN-007",
        }
    }
}
