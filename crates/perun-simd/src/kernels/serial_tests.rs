//! Reference-behavior tests for the serial kernel row.
//!
//! These pin the metric formulas and their edge-case policies (zero-norm
//! cosine, empty-union Jaccard, infinite KL) on the portable kernels that
//! every other tier is compared against.

use half::f16;
use proptest::prelude::*;

use super::serial;

const EPSILON: f64 = 1e-6;

fn f16_vec(values: &[f32]) -> Vec<f16> {
    values.iter().map(|&v| f16::from_f32(v)).collect()
}

// ============================================================================
// Concrete scenarios
// ============================================================================

#[test]
fn test_l2sq_known_value() {
    let a = [1.0_f64, 2.0, 3.0];
    let b = [4.0_f64, 5.0, 6.0];
    assert_eq!(serial::l2sq_f64(&a, &b), 27.0);

    let a32 = [1.0_f32, 2.0, 3.0];
    let b32 = [4.0_f32, 5.0, 6.0];
    assert!((serial::l2sq_f32(&a32, &b32) - 27.0).abs() < EPSILON);
}

#[test]
fn test_cos_orthogonal_and_parallel() {
    assert_eq!(serial::cos_f32(&[1.0, 0.0], &[0.0, 1.0]), 1.0);
    // Self-distance carries only rsqrt approximation error.
    assert!(serial::cos_f32(&[1.0, 0.0], &[1.0, 0.0]).abs() < 1e-4);
}

#[test]
fn test_cos_zero_norm_policy() {
    assert_eq!(serial::cos_f32(&[0.0, 0.0], &[1.0, 1.0]), 1.0);
    assert_eq!(serial::cos_f32(&[1.0, 1.0], &[0.0, 0.0]), 1.0);
    assert_eq!(serial::cos_f64(&[0.0, 0.0], &[0.0, 0.0]), 1.0);
}

#[test]
fn test_hamming_known_value() {
    let a = [0b1111_0000_u8, 0b0000_1111, 0b1010_1010];
    let b = [0b1111_0000_u8, 0b0000_1111, 0b0101_0101];
    assert_eq!(serial::hamming_b8(&a, &b), 8.0);
    assert_eq!(serial::hamming_b8(&a, &a), 0.0);
}

#[test]
fn test_jaccard_disjoint_and_empty() {
    // Disjoint bitsets are maximally distant.
    assert_eq!(serial::jaccard_b8(&[0b1111_0000], &[0b0000_1111]), 1.0);
    // Two empty bitsets are identical, not distant.
    assert_eq!(serial::jaccard_b8(&[0b0000_0000], &[0b0000_0000]), 0.0);
    assert_eq!(serial::jaccard_b8(&[0b1100_0011], &[0b1100_0011]), 0.0);
}

#[test]
fn test_kl_known_values() {
    assert_eq!(serial::kl_f64(&[0.5, 0.5], &[0.5, 0.5]), 0.0);
    let d = serial::kl_f64(&[1.0, 0.0], &[0.5, 0.5]);
    assert!((d - std::f64::consts::LN_2).abs() < 1e-12);

    let d32 = serial::kl_f32(&[1.0, 0.0], &[0.5, 0.5]);
    assert!((d32 - std::f64::consts::LN_2).abs() < EPSILON);
}

#[test]
fn test_kl_infinite_divergence() {
    // Non-zero left against zero right has no finite divergence.
    assert_eq!(serial::kl_f64(&[0.5, 0.5], &[1.0, 0.0]), f64::INFINITY);
    assert_eq!(serial::kl_f32(&[0.5, 0.5], &[1.0, 0.0]), f64::INFINITY);
    // A zero on both sides contributes nothing.
    assert_eq!(serial::kl_f64(&[1.0, 0.0], &[1.0, 0.0]), 0.0);
}

#[test]
fn test_js_known_values() {
    assert_eq!(serial::js_f64(&[0.25, 0.75], &[0.25, 0.75]), 0.0);
    // Disjoint distributions peak at ln 2.
    let d = serial::js_f64(&[1.0, 0.0], &[0.0, 1.0]);
    assert!((d - std::f64::consts::LN_2).abs() < 1e-12);
    // JS stays finite where KL diverges.
    let finite = serial::js_f64(&[0.5, 0.5], &[1.0, 0.0]);
    assert!(finite.is_finite() && finite > 0.0);
}

#[test]
fn test_vdot_conjugated_scenario() {
    // (1+2i, 3+4i) against (5+6i, 7+8i), first operand conjugated.
    let a = [1.0_f64, 2.0, 3.0, 4.0];
    let b = [5.0_f64, 6.0, 7.0, 8.0];
    let [re, im] = serial::vdot_f64c(&a, &b);
    assert_eq!(re, 70.0);
    assert_eq!(im, 8.0);
}

#[test]
fn test_dot_complex_unconjugated() {
    let a = [1.0_f64, 2.0, 3.0, 4.0];
    let b = [5.0_f64, 6.0, 7.0, 8.0];
    let [re, im] = serial::dot_f64c(&a, &b);
    // (1+2i)(5+6i) + (3+4i)(7+8i) = (-7+16i) + (-11+52i)
    assert_eq!(re, -18.0);
    assert_eq!(im, 68.0);
}

#[test]
fn test_complex_conjugate_symmetry() {
    let a = [0.5_f32, -1.25, 2.0, 0.75, -0.5, 1.5];
    let b = [1.0_f32, 0.25, -0.75, 2.5, 0.125, -1.0];
    let [re_ab, im_ab] = serial::vdot_f32c(&a, &b);
    let [re_ba, im_ba] = serial::vdot_f32c(&b, &a);
    assert!((re_ab - re_ba).abs() < EPSILON);
    assert!((im_ab + im_ba).abs() < EPSILON);
}

#[test]
fn test_dot_i8_is_integer_inner_product() {
    let a = [127_i8, -128, 3];
    let b = [1_i8, 2, -3];
    assert_eq!(serial::dot_i8(&a, &b), f64::from(127 - 256 - 9));
}

#[test]
fn test_i8_identity_and_symmetry() {
    let a = [5_i8, -3, 100, -100];
    let b = [-7_i8, 2, 50, 25];
    assert_eq!(serial::l2sq_i8(&a, &a), 0.0);
    assert!(serial::cos_i8(&a, &a).abs() < 1e-4);
    assert_eq!(serial::l2sq_i8(&a, &b), serial::l2sq_i8(&b, &a));
}

#[test]
fn test_f16_tracks_f32_within_half_precision() {
    let a32 = [0.5_f32, -0.25, 0.75, 1.5, -1.0];
    let b32 = [1.0_f32, 0.5, -0.5, 0.25, 2.0];
    let a = f16_vec(&a32);
    let b = f16_vec(&b32);

    // Half-precision inputs round to ~1e-3; the arithmetic itself runs in f32.
    assert!((serial::dot_f16(&a, &b) - serial::dot_f32(&a32, &b32)).abs() < 1e-2);
    assert!((serial::l2sq_f16(&a, &b) - serial::l2sq_f32(&a32, &b32)).abs() < 1e-2);
    assert!((serial::cos_f16(&a, &b) - serial::cos_f32(&a32, &b32)).abs() < 1e-2);
}

#[test]
fn test_single_element_vectors() {
    assert_eq!(serial::dot_f64(&[3.0], &[4.0]), 12.0);
    assert_eq!(serial::l2sq_f64(&[3.0], &[4.0]), 1.0);
    assert_eq!(serial::cos_f64(&[2.0], &[3.0]), 0.0);
    assert_eq!(serial::hamming_b8(&[0xFF], &[0x00]), 8.0);
    assert_eq!(serial::jaccard_b8(&[0x0F], &[0x0F]), 0.0);
    assert_eq!(serial::kl_f64(&[1.0], &[1.0]), 0.0);
    assert_eq!(serial::js_f64(&[1.0], &[1.0]), 0.0);
    let [re, im] = serial::dot_f32c(&[1.0, 1.0], &[1.0, -1.0]);
    assert_eq!(re, 2.0);
    assert_eq!(im, 0.0);
}

#[test]
fn test_triangle_inequality_on_l2() {
    let a = [0.0_f64, 0.0, 0.0];
    let b = [1.0_f64, 2.0, 2.0];
    let c = [4.0_f64, 6.0, 12.0];
    let ab = serial::l2sq_f64(&a, &b).sqrt();
    let bc = serial::l2sq_f64(&b, &c).sqrt();
    let ac = serial::l2sq_f64(&a, &c).sqrt();
    assert!(ac <= ab + bc + 1e-12);
}

#[test]
fn test_dot_scaling_linearity() {
    let a = [1.0_f64, -2.0, 3.5, 0.25];
    let b = [0.5_f64, 4.0, -1.5, 8.0];
    let scaled: Vec<f64> = a.iter().map(|x| x * 3.0).collect();
    let lhs = serial::dot_f64(&scaled, &b);
    let rhs = 3.0 * serial::dot_f64(&a, &b);
    assert!((lhs - rhs).abs() < 1e-12);
}

// ============================================================================
// Property tests
// ============================================================================

proptest! {
    #[test]
    fn prop_l2sq_symmetry_and_identity(v in prop::collection::vec(-100.0_f32..100.0, 1..64)) {
        let w: Vec<f32> = v.iter().map(|x| x + 1.0).collect();
        prop_assert_eq!(serial::l2sq_f32(&v, &v), 0.0);
        prop_assert_eq!(serial::l2sq_f32(&v, &w), serial::l2sq_f32(&w, &v));
    }

    #[test]
    fn prop_cos_self_distance_is_small(v in prop::collection::vec(0.1_f32..10.0, 1..64)) {
        let d = serial::cos_f32(&v, &v);
        prop_assert!((0.0..1e-4).contains(&d));
    }

    #[test]
    fn prop_cos_is_symmetric(
        v in prop::collection::vec(-10.0_f32..10.0, 2..48),
        w in prop::collection::vec(-10.0_f32..10.0, 2..48),
    ) {
        let n = v.len().min(w.len());
        let d_vw = serial::cos_f32(&v[..n], &w[..n]);
        let d_wv = serial::cos_f32(&w[..n], &v[..n]);
        prop_assert!((d_vw - d_wv).abs() < 1e-6);
    }

    #[test]
    fn prop_bitset_self_distances_are_zero(v in prop::collection::vec(any::<u8>(), 1..128)) {
        prop_assert_eq!(serial::hamming_b8(&v, &v), 0.0);
        prop_assert_eq!(serial::jaccard_b8(&v, &v), 0.0);
    }

    #[test]
    fn prop_kl_nonnegative_on_positive_inputs(
        v in prop::collection::vec(0.01_f64..1.0, 1..48),
        w in prop::collection::vec(0.01_f64..1.0, 1..48),
    ) {
        // Normalized distributions keep Gibbs' inequality applicable.
        let n = v.len().min(w.len());
        let sv: f64 = v[..n].iter().sum();
        let sw: f64 = w[..n].iter().sum();
        let p: Vec<f64> = v[..n].iter().map(|x| x / sv).collect();
        let q: Vec<f64> = w[..n].iter().map(|x| x / sw).collect();
        prop_assert!(serial::kl_f64(&p, &q) > -1e-12);
        prop_assert!(serial::js_f64(&p, &q) > -1e-12);
    }
}
