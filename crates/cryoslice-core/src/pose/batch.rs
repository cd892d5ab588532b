//! Batched poses.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use super::euler::euler_to_matrix;
use super::validation::{enforce_policy, RotationPolicy};
use crate::error::{CryoError, Result};

/// A batch of `N` poses: rotations `[N, 3, 3]` and translations `[N, 2]`.
///
/// Angles are radians and translations are pixels. The rotation is applied
/// first (it selects the central slice); the translation then shifts the
/// projected image in-plane.
#[derive(Debug, Clone)]
pub struct PoseBatch<B: Backend> {
    rotations: Tensor<B, 3>,
    translations: Tensor<B, 2>,
}

impl<B: Backend> PoseBatch<B> {
    /// Build poses from ZYZ Euler angles `[N, 3]` in radians.
    ///
    /// Matrices built this way are proper rotations by construction and keep
    /// their gradient connection to the angles.
    pub fn from_euler(angles: Tensor<B, 2>, translations: Tensor<B, 2>) -> Result<Self> {
        let [n, k] = angles.dims();
        if k != 3 {
            return Err(CryoError::shape_mismatch(&[n, 3], &[n, k]));
        }
        Self::check_translations(n, &translations)?;

        Ok(Self {
            rotations: euler_to_matrix(angles),
            translations,
        })
    }

    /// Build poses from ZYZ Euler angles given in degrees.
    ///
    /// This is the boundary conversion for metadata that stores degrees.
    pub fn from_euler_degrees(angles_deg: Tensor<B, 2>, translations: Tensor<B, 2>) -> Result<Self> {
        Self::from_euler(angles_deg.mul_scalar(std::f64::consts::PI / 180.0), translations)
    }

    /// Build poses from explicit rotation matrices `[N, 3, 3]`.
    pub fn from_matrices(
        rotations: Tensor<B, 3>,
        translations: Tensor<B, 2>,
        policy: RotationPolicy,
    ) -> Result<Self> {
        let [n, r, c] = rotations.dims();
        if r != 3 || c != 3 {
            return Err(CryoError::shape_mismatch(&[n, 3, 3], &[n, r, c]));
        }
        Self::check_translations(n, &translations)?;

        Ok(Self {
            rotations: enforce_policy(rotations, policy)?,
            translations,
        })
    }

    /// `n` identity poses with zero translation.
    pub fn identity(n: usize, device: &B::Device) -> Self {
        let eye = Tensor::<B, 2>::eye(3, device)
            .reshape([1, 3, 3])
            .expand([n, 3, 3]);
        Self {
            rotations: eye,
            translations: Tensor::zeros([n, 2], device),
        }
    }

    /// Number of poses.
    pub fn len(&self) -> usize {
        self.rotations.dims()[0]
    }

    /// Whether the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rotation matrices `[N, 3, 3]`.
    pub fn rotations(&self) -> &Tensor<B, 3> {
        &self.rotations
    }

    /// Translations `[N, 2]` in pixels, ordered `(tx, ty)`.
    pub fn translations(&self) -> &Tensor<B, 2> {
        &self.translations
    }

    fn check_translations(n: usize, translations: &Tensor<B, 2>) -> Result<()> {
        let dims = translations.dims();
        if dims != [n, 2] {
            return Err(CryoError::shape_mismatch(&[n, 2], &dims));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_identity_batch() {
        let device = Default::default();
        let poses = PoseBatch::<TestBackend>::identity(3, &device);
        assert_eq!(poses.len(), 3);
        assert_eq!(poses.rotations().dims(), [3, 3, 3]);
        let r = poses.rotations().clone().into_data().to_vec::<f32>().unwrap();
        assert_eq!(&r[9..18], &[1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_degrees_match_radians() {
        let device = Default::default();
        let t = Tensor::<TestBackend, 2>::zeros([1, 2], &device);
        let deg = PoseBatch::from_euler_degrees(
            Tensor::from_floats([[90.0, 45.0, -30.0]], &device),
            t.clone(),
        )
        .unwrap();
        let rad = PoseBatch::from_euler(
            Tensor::from_floats(
                [[std::f32::consts::FRAC_PI_2, std::f32::consts::FRAC_PI_4, -std::f32::consts::PI / 6.0]],
                &device,
            ),
            t,
        )
        .unwrap();
        let a = deg.rotations().clone().into_data().to_vec::<f32>().unwrap();
        let b = rad.rotations().clone().into_data().to_vec::<f32>().unwrap();
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-5);
        }
    }

    #[test]
    fn test_translation_batch_mismatch() {
        let device = Default::default();
        let angles = Tensor::<TestBackend, 2>::zeros([4, 3], &device);
        let t = Tensor::<TestBackend, 2>::zeros([3, 2], &device);
        let err = PoseBatch::from_euler(angles, t).unwrap_err();
        assert!(matches!(err, CryoError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_reject_policy_flags_bad_matrix() {
        let device = Default::default();
        let rotations = Tensor::<TestBackend, 3>::from_floats(
            [[[2.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]],
            &device,
        );
        let t = Tensor::<TestBackend, 2>::zeros([1, 2], &device);
        let err = PoseBatch::from_matrices(rotations, t, RotationPolicy::default()).unwrap_err();
        assert!(matches!(err, CryoError::InvalidRotation(_)));
    }

    #[test]
    fn test_orthonormalize_policy_fixes_matrix() {
        let device = Default::default();
        let rotations = Tensor::<TestBackend, 3>::from_floats(
            [[[1.01, 0.0, 0.0], [0.0, 0.99, 0.0], [0.0, 0.0, 1.0]]],
            &device,
        );
        let t = Tensor::<TestBackend, 2>::zeros([1, 2], &device);
        let poses = PoseBatch::from_matrices(rotations, t, RotationPolicy::Orthonormalize).unwrap();
        let r = poses.rotations().clone().into_data().to_vec::<f32>().unwrap();
        assert!((r[0] - 1.0).abs() < 1e-6);
        assert!((r[4] - 1.0).abs() < 1e-6);
    }
}
