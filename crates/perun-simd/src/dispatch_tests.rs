//! Resolver behavior tests: totality over the supported matrix, tier walk
//! order, serial fallback, and the debugging tier mask.

use crate::capability::{self, Capability, ANY};
use crate::dispatch::{complex_distance, distance, parse_forbid, resolve, Kernel};
use crate::error::Error;
use crate::types::{Datatype, MetricKind};

/// The (metric, dtype) pairs the serial row must cover.
fn supported_matrix() -> Vec<(MetricKind, Datatype)> {
    use Datatype as D;
    use MetricKind as M;

    let mut cells = Vec::new();
    for dtype in [D::F64, D::F32, D::F16, D::Bf16, D::I8, D::F64c, D::F32c, D::F16c] {
        cells.push((M::Dot, dtype));
    }
    for dtype in [D::F64c, D::F32c, D::F16c] {
        cells.push((M::Vdot, dtype));
    }
    for dtype in [D::F64, D::F32, D::F16, D::Bf16, D::I8] {
        cells.push((M::Cos, dtype));
        cells.push((M::L2sq, dtype));
    }
    cells.push((M::Hamming, D::B8));
    cells.push((M::Jaccard, D::B8));
    for dtype in [D::F64, D::F32, D::F16] {
        cells.push((M::Kl, dtype));
        cells.push((M::Js, dtype));
    }
    cells
}

#[test]
fn test_resolver_totality() {
    for (metric, dtype) in supported_matrix() {
        let resolved = resolve(metric, dtype, ANY);
        assert!(resolved.is_some(), "no kernel for {metric}/{dtype}");
    }
}

#[test]
fn test_resolver_rejects_unsupported_combinations() {
    let unsupported = [
        (MetricKind::Jaccard, Datatype::F32),
        (MetricKind::Hamming, Datatype::F64),
        (MetricKind::Vdot, Datatype::F32),
        (MetricKind::Vdot, Datatype::I8),
        (MetricKind::Kl, Datatype::I8),
        (MetricKind::Js, Datatype::B8),
        (MetricKind::Cos, Datatype::F32c),
        (MetricKind::Kl, Datatype::Bf16),
    ];
    for (metric, dtype) in unsupported {
        assert!(resolve(metric, dtype, ANY).is_none(), "{metric}/{dtype}");
        let err = Kernel::resolve(metric, dtype, ANY).unwrap_err();
        assert_eq!(err.code(), "PERUN-004");
    }
}

#[test]
fn test_chosen_tier_is_supported_by_host() {
    let host = capability::capabilities();
    for (metric, dtype) in supported_matrix() {
        let resolved = resolve(metric, dtype, ANY).unwrap();
        assert_ne!(
            host & resolved.tier.bit(),
            0,
            "{metric}/{dtype} resolved to a tier the host lacks"
        );
    }
}

#[test]
fn test_serial_fallback_ignores_allowed_mask() {
    // Even an empty allowed mask lands on the serial row.
    for (metric, dtype) in supported_matrix() {
        let resolved = resolve(metric, dtype, 0).unwrap();
        assert!(matches!(resolved.tier, Capability::Serial));
    }
}

#[test]
fn test_serial_only_mask_resolves_serial() {
    let resolved = resolve(MetricKind::Dot, Datatype::F32, capability::SERIAL).unwrap();
    assert!(matches!(resolved.tier, Capability::Serial));
}

#[test]
fn test_parse_forbid_masks() {
    assert_eq!(parse_forbid(""), 0);
    assert_eq!(parse_forbid("skylake"), capability::SKYLAKE);
    assert_eq!(
        parse_forbid("skylake,ice"),
        capability::SKYLAKE | capability::ICE
    );
    assert_eq!(
        parse_forbid(" haswell , NEON "),
        capability::HASWELL | capability::NEON
    );
    // Unknown names are ignored rather than fatal.
    assert_eq!(parse_forbid("warp-drive,ice"), capability::ICE);
}

#[test]
fn test_distance_checks_shapes() {
    let a = vec![1.0_f32, 2.0];
    let b = vec![1.0_f32, 2.0, 3.0];
    let err = distance(MetricKind::Dot, &a, &b).unwrap_err();
    assert!(matches!(err, Error::DimensionMismatch { expected: 2, actual: 3 }));
}

#[test]
fn test_distance_empty_inputs_use_identity_values() {
    let empty: Vec<f32> = Vec::new();
    assert_eq!(distance(MetricKind::Dot, &empty, &empty).unwrap(), 0.0);
    assert_eq!(distance(MetricKind::L2sq, &empty, &empty).unwrap(), 0.0);
    assert_eq!(distance(MetricKind::Cos, &empty, &empty).unwrap(), 1.0);

    let empty_bits: Vec<u8> = Vec::new();
    assert_eq!(distance(MetricKind::Hamming, &empty_bits, &empty_bits).unwrap(), 0.0);
    assert_eq!(distance(MetricKind::Jaccard, &empty_bits, &empty_bits).unwrap(), 0.0);
}

#[test]
fn test_complex_distance_requires_even_scalars() {
    let a = vec![1.0_f32, 2.0, 3.0];
    let err = complex_distance(MetricKind::Vdot, &a, &a).unwrap_err();
    assert!(matches!(err, Error::OddComplexLength(3)));
}

#[test]
fn test_complex_distance_rejects_integer_carriers() {
    let a = vec![1_i8, 2];
    let err = complex_distance(MetricKind::Dot, &a, &a).unwrap_err();
    assert_eq!(err.code(), "PERUN-004");
}

#[test]
fn test_kernel_handle_rejects_wrong_carrier() {
    let kernel = Kernel::resolve(MetricKind::Dot, Datatype::F32, ANY).unwrap();
    let a = vec![1.0_f64, 2.0];
    let err = kernel.call(&a, &a).unwrap_err();
    assert_eq!(err.code(), "PERUN-004");
}

#[test]
fn test_kernel_handle_reports_request() {
    let kernel = Kernel::resolve(MetricKind::Cos, Datatype::F32, ANY).unwrap();
    assert_eq!(kernel.metric(), MetricKind::Cos);
    assert_eq!(kernel.datatype(), Datatype::F32);
    assert_ne!(capability::capabilities() & kernel.tier().bit(), 0);
}

#[test]
fn test_one_shot_matches_handle() {
    let a: Vec<f32> = (0..100).map(|i| (i as f32).sin()).collect();
    let b: Vec<f32> = (0..100).map(|i| (i as f32).cos()).collect();
    let kernel = Kernel::resolve(MetricKind::L2sq, Datatype::F32, ANY).unwrap();
    assert_eq!(
        distance(MetricKind::L2sq, &a, &b).unwrap(),
        kernel.call(&a, &b).unwrap()
    );
}

#[test]
fn test_complex_one_shot_roundtrip() {
    let a = vec![1.0_f32, 2.0, 3.0, 4.0];
    let b = vec![5.0_f32, 6.0, 7.0, 8.0];
    let [re, im] = complex_distance(MetricKind::Vdot, &a, &b).unwrap();
    assert!((re - 70.0).abs() < 1e-4);
    assert!((im - 8.0).abs() < 1e-4);
}
