//! # PerunSIMD
//!
//! SIMD-accelerated similarity and distance kernels over numerical vectors.
//!
//! PerunSIMD is built for callers that evaluate millions of pairwise kernels
//! per second - vector search indices, nearest-neighbor scans, database UDFs
//! and retrieval pipelines. Given two equally-sized vectors of a declared
//! scalar type, it returns a scalar distance, selecting at run time the best
//! micro-kernel for the host CPU.
//!
//! ## Features
//!
//! - **8 metrics**: dot, vdot, cosine, squared L2, Hamming, Jaccard, KL, JS
//! - **Mixed precision**: f64, f32, f16, bf16, i8 and packed-bit vectors,
//!   with complex interleaved variants for the inner products
//! - **Runtime dispatch**: NEON, AVX2+FMA+F16C, AVX-512F, AVX-512 VNNI -
//!   probed once, resolved to bare function pointers
//! - **Batch driver**: paired, all-pairs and broadcast shapes with an
//!   optional rayon worker pool per call
//!
//! ## Quick Start
//!
//! ```
//! use perun_simd::{distance, Kernel, MetricKind, Datatype, capability};
//!
//! fn main() -> perun_simd::Result<()> {
//!     // One-shot: resolve and call in one go
//!     let a = vec![1.0_f32, 2.0, 3.0];
//!     let b = vec![4.0_f32, 5.0, 6.0];
//!     let d = distance(MetricKind::L2sq, &a, &b)?;
//!     assert!((d - 27.0).abs() < 1e-5);
//!
//!     // Hot loop: resolve once, call many times
//!     let kernel = Kernel::resolve(MetricKind::Cos, Datatype::F32, capability::ANY)?;
//!     let _ = kernel.call(&a, &b)?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
// Clippy lints configured in workspace Cargo.toml [workspace.lints.clippy]
#![cfg_attr(
    test,
    allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_possible_wrap,
        clippy::float_cmp,
        clippy::unreadable_literal
    )
)]

pub mod batch;
pub mod capability;
pub mod dispatch;
pub mod error;
mod kernels;
pub mod types;

#[cfg(test)]
mod batch_tests;
#[cfg(test)]
mod dispatch_tests;

pub use batch::{broadcast, cdist, cdist_complex, pairwise, pairwise_complex, RowMatrix};
pub use capability::{capabilities, flush_denormals, warmup, Capability};
pub use dispatch::{complex_distance, distance, resolve, Kernel, KernelFn, Resolved, FORBID_ENV};
pub use error::{Error, Result};
pub use types::{Datatype, MetricKind, SimdScalar};
