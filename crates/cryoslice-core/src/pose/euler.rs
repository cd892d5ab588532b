//! Euler-angle rotation parameterization.
//!
//! Angles are ZYZ intrinsic `(rot, tilt, psi)` in radians, composed as
//!
//! ```text
//! R = Rz(psi) * Ry(tilt) * Rz(rot)
//! ```
//!
//! which is the convention used by most cryo-EM metadata. The tensor path is
//! batched and differentiable for every angle value; at `tilt = 0` or `pi` the
//! parameterization loses a degree of freedom (gimbal lock), which is left to
//! the caller.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use nalgebra::Matrix3;

/// Below this `|sin(tilt)|` the ZYZ decomposition is treated as degenerate.
const GIMBAL_EPSILON: f64 = 1e-6;

/// Convert a batch of `[rot, tilt, psi]` angles `[N, 3]` (radians) into rotation
/// matrices `[N, 3, 3]`.
pub fn euler_to_matrix<B: Backend>(angles: Tensor<B, 2>) -> Tensor<B, 3> {
    let rot = angles.clone().narrow(1, 0, 1);
    let tilt = angles.clone().narrow(1, 1, 1);
    let psi = angles.narrow(1, 2, 1);

    rotation_z(psi).matmul(rotation_y(tilt)).matmul(rotation_z(rot))
}

/// Elementary rotations about z for angles `[N, 1]`.
pub fn rotation_z<B: Backend>(angle: Tensor<B, 2>) -> Tensor<B, 3> {
    let [n, _] = angle.dims();
    let c = angle.clone().cos();
    let s = angle.clone().sin();
    let zero = angle.zeros_like();
    let one = zero.clone().ones_like();

    Tensor::cat(
        vec![
            c.clone(), s.clone().neg(), zero.clone(),
            s, c, zero.clone(),
            zero.clone(), zero, one,
        ],
        1,
    )
    .reshape([n, 3, 3])
}

/// Elementary rotations about y for angles `[N, 1]`.
pub fn rotation_y<B: Backend>(angle: Tensor<B, 2>) -> Tensor<B, 3> {
    let [n, _] = angle.dims();
    let c = angle.clone().cos();
    let s = angle.clone().sin();
    let zero = angle.zeros_like();
    let one = zero.clone().ones_like();

    Tensor::cat(
        vec![
            c.clone(), zero.clone(), s.clone(),
            zero.clone(), one, zero.clone(),
            s.neg(), zero, c,
        ],
        1,
    )
    .reshape([n, 3, 3])
}

/// Host-side version of [`euler_to_matrix`] for a single angle triple.
pub fn euler_to_matrix_host(rot: f64, tilt: f64, psi: f64) -> Matrix3<f64> {
    let rz = |a: f64| {
        let (s, c) = a.sin_cos();
        Matrix3::new(c, -s, 0.0, s, c, 0.0, 0.0, 0.0, 1.0)
    };
    let (st, ct) = tilt.sin_cos();
    let ry = Matrix3::new(ct, 0.0, st, 0.0, 1.0, 0.0, -st, 0.0, ct);
    rz(psi) * ry * rz(rot)
}

/// Recover `[rot, tilt, psi]` (radians) from a rotation matrix.
///
/// In the gimbal-locked case the in-plane rotation is assigned to `psi` and
/// `rot` is set to zero.
pub fn matrix_to_euler(m: &Matrix3<f64>) -> [f64; 3] {
    let tilt = m[(2, 2)].clamp(-1.0, 1.0).acos();

    if tilt.sin().abs() > GIMBAL_EPSILON {
        let rot = m[(2, 1)].atan2(-m[(2, 0)]);
        let psi = m[(1, 2)].atan2(m[(0, 2)]);
        [rot, tilt, psi]
    } else if m[(2, 2)] > 0.0 {
        [0.0, 0.0, m[(1, 0)].atan2(m[(0, 0)])]
    } else {
        [0.0, std::f64::consts::PI, (-m[(1, 0)]).atan2(-m[(0, 0)])]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;
    use std::f64::consts::FRAC_PI_2;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_zero_angles_give_identity() {
        let device = Default::default();
        let angles = Tensor::<TestBackend, 2>::zeros([2, 3], &device);
        let r = euler_to_matrix(angles).into_data().to_vec::<f32>().unwrap();
        let eye = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0];
        for (i, v) in r.iter().enumerate() {
            assert!((v - eye[i % 9]).abs() < 1e-6);
        }
    }

    #[test]
    fn test_tensor_matches_host() {
        let device = Default::default();
        let (rot, tilt, psi) = (0.3, 1.1, -2.4);
        let angles = Tensor::<TestBackend, 2>::from_floats([[0.3, 1.1, -2.4]], &device);
        let r = euler_to_matrix(angles).into_data().to_vec::<f32>().unwrap();
        let host = euler_to_matrix_host(rot, tilt, psi);
        for i in 0..3 {
            for j in 0..3 {
                assert!((r[i * 3 + j] as f64 - host[(i, j)]).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn test_quarter_turn_about_z() {
        // psi = 90 deg maps x onto y
        let m = euler_to_matrix_host(0.0, 0.0, FRAC_PI_2);
        let x = nalgebra::Vector3::new(1.0, 0.0, 0.0);
        let y = m * x;
        assert!((y[0]).abs() < 1e-12);
        assert!((y[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_matrix_to_euler_round_trip() {
        let angles = [0.7, 1.2, -0.4];
        let m = euler_to_matrix_host(angles[0], angles[1], angles[2]);
        let recovered = matrix_to_euler(&m);
        for (a, b) in angles.iter().zip(recovered.iter()) {
            assert!((a - b).abs() < 1e-9, "expected {}, got {}", a, b);
        }
    }

    #[test]
    fn test_matrix_to_euler_gimbal_lock() {
        let m = euler_to_matrix_host(0.4, 0.0, 0.5);
        let [rot, tilt, psi] = matrix_to_euler(&m);
        assert_eq!(rot, 0.0);
        assert_eq!(tilt, 0.0);
        assert!((psi - 0.9).abs() < 1e-9);

        let m = euler_to_matrix_host(0.0, std::f64::consts::PI, 0.5);
        let rebuilt = {
            let [r, t, p] = matrix_to_euler(&m);
            euler_to_matrix_host(r, t, p)
        };
        assert!((m - rebuilt).norm() < 1e-9);
    }
}
