//! Host-side rotation checks.
//!
//! Rotation matrices supplied directly (rather than built from Euler angles)
//! are read back to the host and checked against SO(3) under an explicit
//! [`RotationPolicy`].

use burn::tensor::backend::Backend;
use burn::tensor::{Shape, Tensor, TensorData};
use nalgebra::Matrix3;
use serde::{Deserialize, Serialize};

use crate::error::{CryoError, Result};

/// Default tolerance on `|R R^T - I|` entries and `|det R - 1|`.
pub const DEFAULT_ROTATION_TOLERANCE: f64 = 1e-4;

/// What to do with rotation matrices that are not proper rotations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RotationPolicy {
    /// Fail with [`CryoError::InvalidRotation`].
    Reject { tolerance: f64 },
    /// Replace each matrix by its nearest proper rotation (SVD projection).
    /// The replacement is a constant: gradients do not flow back through it.
    Orthonormalize,
    /// Use the matrices as given.
    Trust,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self::Reject {
            tolerance: DEFAULT_ROTATION_TOLERANCE,
        }
    }
}

/// Check that `m` is orthonormal with determinant +1.
pub fn check_rotation(m: &Matrix3<f64>, tolerance: f64) -> Result<()> {
    let gram_error = (m * m.transpose() - Matrix3::identity()).abs().max();
    if gram_error > tolerance {
        return Err(CryoError::invalid_rotation(format!(
            "R R^T deviates from identity by {:.3e} (tolerance {:.1e})",
            gram_error, tolerance
        )));
    }

    let det = m.determinant();
    if (det - 1.0).abs() > tolerance {
        return Err(CryoError::invalid_rotation(format!(
            "determinant {:.6} is not +1 (improper rotation)",
            det
        )));
    }

    Ok(())
}

/// Nearest proper rotation to `m` in the Frobenius norm.
pub fn orthonormalize(m: &Matrix3<f64>) -> Result<Matrix3<f64>> {
    let svd = m.svd(true, true);
    let (u, v_t) = match (svd.u, svd.v_t) {
        (Some(u), Some(v_t)) => (u, v_t),
        _ => return Err(CryoError::invalid_rotation("SVD did not converge")),
    };

    let mut correction = Matrix3::identity();
    if (u * v_t).determinant() < 0.0 {
        correction[(2, 2)] = -1.0;
    }
    Ok(u * correction * v_t)
}

/// Read a batch of matrices `[N, 3, 3]` back to the host.
pub fn rotations_to_host<B: Backend>(rotations: &Tensor<B, 3>) -> Result<Vec<Matrix3<f64>>> {
    let values: Vec<f64> = rotations
        .clone()
        .into_data()
        .convert::<f64>()
        .to_vec::<f64>()
        .map_err(|e| CryoError::invalid_rotation(format!("cannot read rotations: {:?}", e)))?;

    Ok(values
        .chunks_exact(9)
        .map(Matrix3::from_row_slice)
        .collect())
}

/// Upload host matrices as a tensor `[N, 3, 3]`.
pub fn rotations_from_host<B: Backend>(
    matrices: &[Matrix3<f64>],
    device: &B::Device,
) -> Tensor<B, 3> {
    let mut values = Vec::with_capacity(matrices.len() * 9);
    for m in matrices {
        for i in 0..3 {
            for j in 0..3 {
                values.push(m[(i, j)] as f32);
            }
        }
    }
    Tensor::from_data(
        TensorData::new(values, Shape::new([matrices.len(), 3, 3])),
        device,
    )
}

/// Apply `policy` to a batch of rotation matrices.
pub fn enforce_policy<B: Backend>(
    rotations: Tensor<B, 3>,
    policy: RotationPolicy,
) -> Result<Tensor<B, 3>> {
    match policy {
        RotationPolicy::Trust => Ok(rotations),
        RotationPolicy::Reject { tolerance } => {
            for (i, m) in rotations_to_host(&rotations)?.iter().enumerate() {
                check_rotation(m, tolerance).map_err(|e| match e {
                    CryoError::InvalidRotation(msg) => {
                        CryoError::invalid_rotation(format!("pose {}: {}", i, msg))
                    }
                    other => other,
                })?;
            }
            Ok(rotations)
        }
        RotationPolicy::Orthonormalize => {
            let device = rotations.device();
            let fixed = rotations_to_host(&rotations)?
                .iter()
                .map(orthonormalize)
                .collect::<Result<Vec<_>>>()?;
            Ok(rotations_from_host(&fixed, &device))
        }
    }
}
