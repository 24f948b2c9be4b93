//! Batch driver tests: shape validation, stride handling, thread-count
//! equivalence and agreement with single-pair calls.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::batch::{broadcast, cdist, cdist_complex, pairwise, pairwise_complex, RowMatrix};
use crate::dispatch::{complex_distance, distance};
use crate::error::Error;
use crate::types::MetricKind;

fn random_rows(rng: &mut StdRng, rows: usize, dims: usize) -> Vec<f32> {
    (0..rows * dims).map(|_| rng.gen_range(-1.0..1.0)).collect()
}

#[test]
fn test_cdist_matches_single_pair_calls() {
    let mut rng = StdRng::seed_from_u64(42);
    let a_data = random_rows(&mut rng, 10, 128);
    let b_data = random_rows(&mut rng, 7, 128);
    let a = RowMatrix::new(&a_data, 10, 128).unwrap();
    let b = RowMatrix::new(&b_data, 7, 128).unwrap();

    let mut out = vec![0.0_f64; 70];
    cdist(MetricKind::Cos, &a, &b, &mut out, 1).unwrap();

    for i in 0..10 {
        for j in 0..7 {
            let single = distance(MetricKind::Cos, a.row(i), b.row(j)).unwrap();
            assert_eq!(out[i * 7 + j], single, "cell ({i}, {j})");
        }
    }
}

#[test]
fn test_pairwise_matches_per_row_calls() {
    let mut rng = StdRng::seed_from_u64(7);
    let a_data = random_rows(&mut rng, 100, 256);
    let b_data = random_rows(&mut rng, 100, 256);
    let a = RowMatrix::new(&a_data, 100, 256).unwrap();
    let b = RowMatrix::new(&b_data, 100, 256).unwrap();

    let mut out = vec![0.0_f64; 100];
    pairwise(MetricKind::L2sq, &a, &b, &mut out, 1).unwrap();

    for (row, &value) in out.iter().enumerate() {
        let single = distance(MetricKind::L2sq, a.row(row), b.row(row)).unwrap();
        assert_eq!(value, single, "row {row}");
    }
}

#[test]
fn test_thread_counts_agree() {
    let mut rng = StdRng::seed_from_u64(1234);
    let a_data = random_rows(&mut rng, 24, 96);
    let b_data = random_rows(&mut rng, 17, 96);
    let a = RowMatrix::new(&a_data, 24, 96).unwrap();
    let b = RowMatrix::new(&b_data, 17, 96).unwrap();

    let mut serial = vec![0.0_f64; 24 * 17];
    let mut default_pool = vec![0.0_f64; 24 * 17];
    let mut fixed_pool = vec![0.0_f64; 24 * 17];

    cdist(MetricKind::Dot, &a, &b, &mut serial, 1).unwrap();
    cdist(MetricKind::Dot, &a, &b, &mut default_pool, 0).unwrap();
    cdist(MetricKind::Dot, &a, &b, &mut fixed_pool, 3).unwrap();

    // Every cell runs the same kernel on the same rows regardless of the
    // pool shape, so the results are bitwise identical.
    assert_eq!(serial, default_pool);
    assert_eq!(serial, fixed_pool);
}

#[test]
fn test_strided_rows_match_dense_rows() {
    let mut rng = StdRng::seed_from_u64(99);
    let rows = 5;
    let dims = 64;
    let stride = 80;

    let mut padded = vec![0.0_f32; (rows - 1) * stride + dims];
    let mut dense = Vec::with_capacity(rows * dims);
    for r in 0..rows {
        for c in 0..dims {
            let v = rng.gen_range(-1.0..1.0);
            padded[r * stride + c] = v;
            dense.push(v);
        }
    }

    let strided = RowMatrix::with_stride(&padded, rows, dims, stride).unwrap();
    let contiguous = RowMatrix::new(&dense, rows, dims).unwrap();

    let query: Vec<f32> = (0..dims).map(|i| (i as f32) * 0.01).collect();
    let mut out_strided = vec![0.0_f64; rows];
    let mut out_dense = vec![0.0_f64; rows];
    broadcast(MetricKind::Cos, &query, &strided, &mut out_strided, 1).unwrap();
    broadcast(MetricKind::Cos, &query, &contiguous, &mut out_dense, 1).unwrap();

    assert_eq!(out_strided, out_dense);
}

#[test]
fn test_broadcast_matches_single_row_cdist() {
    let mut rng = StdRng::seed_from_u64(5);
    let query: Vec<f32> = (0..48).map(|_| rng.gen_range(-1.0..1.0)).collect();
    let m_data = random_rows(&mut rng, 9, 48);
    let m = RowMatrix::new(&m_data, 9, 48).unwrap();
    let q = RowMatrix::new(&query, 1, 48).unwrap();

    let mut out_broadcast = vec![0.0_f64; 9];
    let mut out_cdist = vec![0.0_f64; 9];
    broadcast(MetricKind::L2sq, &query, &m, &mut out_broadcast, 1).unwrap();
    cdist(MetricKind::L2sq, &q, &m, &mut out_cdist, 1).unwrap();

    assert_eq!(out_broadcast, out_cdist);
}

#[test]
fn test_pairwise_complex_matches_single_calls() {
    let mut rng = StdRng::seed_from_u64(21);
    let a_data = random_rows(&mut rng, 12, 32);
    let b_data = random_rows(&mut rng, 12, 32);
    let a = RowMatrix::new(&a_data, 12, 32).unwrap();
    let b = RowMatrix::new(&b_data, 12, 32).unwrap();

    let mut out = vec![[0.0_f64; 2]; 12];
    pairwise_complex(MetricKind::Vdot, &a, &b, &mut out, 1).unwrap();

    for (row, &cell) in out.iter().enumerate() {
        let single = complex_distance(MetricKind::Vdot, a.row(row), b.row(row)).unwrap();
        assert_eq!(cell, single, "row {row}");
    }
}

#[test]
fn test_cdist_complex_shape_and_values() {
    let mut rng = StdRng::seed_from_u64(22);
    let a_data = random_rows(&mut rng, 4, 16);
    let b_data = random_rows(&mut rng, 3, 16);
    let a = RowMatrix::new(&a_data, 4, 16).unwrap();
    let b = RowMatrix::new(&b_data, 3, 16).unwrap();

    let mut out = vec![[0.0_f64; 2]; 12];
    cdist_complex(MetricKind::Dot, &a, &b, &mut out, 2).unwrap();

    for i in 0..4 {
        for j in 0..3 {
            let single = complex_distance(MetricKind::Dot, a.row(i), b.row(j)).unwrap();
            assert_eq!(out[i * 3 + j], single, "cell ({i}, {j})");
        }
    }
}

#[test]
fn test_b8_batches() {
    let a_data: Vec<u8> = (0..64_u32).map(|i| (i * 131 % 256) as u8).collect();
    let b_data: Vec<u8> = (0..64_u32).map(|i| (i * 37 % 256) as u8).collect();
    let a = RowMatrix::new(&a_data, 4, 16).unwrap();
    let b = RowMatrix::new(&b_data, 4, 16).unwrap();

    let mut out = vec![0.0_f64; 4];
    pairwise(MetricKind::Hamming, &a, &b, &mut out, 1).unwrap();
    for (row, &value) in out.iter().enumerate() {
        assert_eq!(
            value,
            distance(MetricKind::Hamming, a.row(row), b.row(row)).unwrap()
        );
    }
}

// ============================================================================
// Shape validation
// ============================================================================

#[test]
fn test_pairwise_rejects_mismatched_shapes() {
    let a_data = vec![0.0_f32; 8 * 16];
    let b_data = vec![0.0_f32; 8 * 24];
    let a = RowMatrix::new(&a_data, 8, 16).unwrap();
    let b_wide = RowMatrix::new(&b_data, 8, 24).unwrap();
    let b_tall = RowMatrix::new(&b_data, 12, 16).unwrap();

    let mut out = vec![0.0_f64; 8];
    assert!(matches!(
        pairwise(MetricKind::Dot, &a, &b_wide, &mut out, 1).unwrap_err(),
        Error::DimensionMismatch { .. }
    ));
    assert!(matches!(
        pairwise(MetricKind::Dot, &a, &b_tall, &mut out, 1).unwrap_err(),
        Error::RowCountMismatch { left: 8, right: 12 }
    ));

    let mut short_out = vec![0.0_f64; 3];
    let b = RowMatrix::new(&a_data, 8, 16).unwrap();
    assert!(matches!(
        pairwise(MetricKind::Dot, &a, &b, &mut short_out, 1).unwrap_err(),
        Error::OutputLengthMismatch { expected: 8, actual: 3 }
    ));
}

#[test]
fn test_cdist_rejects_wrong_output_length() {
    let data = vec![0.0_f32; 6 * 8];
    let a = RowMatrix::new(&data, 6, 8).unwrap();
    let b = RowMatrix::new(&data, 6, 8).unwrap();
    let mut out = vec![0.0_f64; 35];
    assert!(matches!(
        cdist(MetricKind::Dot, &a, &b, &mut out, 1).unwrap_err(),
        Error::OutputLengthMismatch { expected: 36, actual: 35 }
    ));
}

#[test]
fn test_row_matrix_layout_validation() {
    let data = vec![0.0_f32; 100];
    // Stride below the row width.
    assert!(matches!(
        RowMatrix::with_stride(&data, 4, 32, 16).unwrap_err(),
        Error::Layout(_)
    ));
    // Buffer too small for the advertised shape.
    assert!(matches!(
        RowMatrix::new(&data, 4, 32).unwrap_err(),
        Error::Layout(_)
    ));
    // Exactly sized buffers are fine, including the last unpadded row.
    let exact = vec![0.0_f32; 3 * 40 + 32];
    assert!(RowMatrix::with_stride(&exact, 4, 32, 40).is_ok());
}

#[test]
fn test_zero_row_batches_are_noops() {
    let data: Vec<f32> = Vec::new();
    let a = RowMatrix::new(&data, 0, 16).unwrap();
    let b = RowMatrix::new(&data, 0, 16).unwrap();
    let mut out = vec![0.0_f64; 0];
    pairwise(MetricKind::Dot, &a, &b, &mut out, 1).unwrap();
    cdist(MetricKind::Dot, &a, &b, &mut out, 0).unwrap();
}

#[test]
fn test_unsupported_combination_surfaces_from_batch() {
    let data = vec![0.0_f32; 32];
    let a = RowMatrix::new(&data, 2, 16).unwrap();
    let mut out = vec![0.0_f64; 2];
    let err = pairwise(MetricKind::Jaccard, &a, &a, &mut out, 1).unwrap_err();
    assert_eq!(err.code(), "PERUN-004");
}
