//! In-plane translation by Fourier phase modulation.
//!
//! A real-space shift by `(tx, ty)` pixels multiplies coefficient `(u, v)` by
//! `exp(-2 pi i (u tx + v ty) / D)`. The operation is exact and differentiable
//! in the translation.
//!
//! Shifting a slice that is not exactly Hermitian (interpolation already
//! breaks the symmetry slightly) leaves a small, meaningless imaginary
//! residual after the inverse transform.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use std::f64::consts::PI;

use crate::complex::ComplexTensor;
use crate::error::{validate_grid_size, CryoError, Result};
use crate::grid::centered_axis;

/// Applies per-image translations to Fourier slices `[N, D, D]`.
#[derive(Debug, Clone)]
pub struct TranslationPhaseShifter<B: Backend> {
    size: usize,
    u: Tensor<B, 3>,
    v: Tensor<B, 3>,
}

impl<B: Backend> TranslationPhaseShifter<B> {
    /// Create a shifter for side length `size`.
    pub fn new(size: usize, device: &B::Device) -> Result<Self> {
        validate_grid_size(size)?;
        let axis = centered_axis::<B>(size, device);
        let u = axis.clone().reshape([1, 1, size]).expand([1, size, size]);
        let v = axis.reshape([1, size, 1]).expand([1, size, size]);
        Ok(Self { size, u, v })
    }

    /// Phase ramp `-2 pi (u tx + v ty) / D` for translations `[N, 2]`.
    pub fn phase(&self, translations: &Tensor<B, 2>) -> Tensor<B, 3> {
        let [n, _] = translations.dims();
        let d = self.size;
        let shape = [n, d, d];

        let tx = translations.clone().narrow(1, 0, 1).reshape([n, 1, 1]).expand(shape);
        let ty = translations.clone().narrow(1, 1, 1).reshape([n, 1, 1]).expand(shape);
        let u = self.u.clone().expand(shape);
        let v = self.v.clone().expand(shape);

        (u * tx + v * ty).mul_scalar(-2.0 * PI / d as f64)
    }

    /// Shift every slice by its translation (pixels, `(tx, ty)`).
    pub fn shift(
        &self,
        slices: ComplexTensor<B, 3>,
        translations: &Tensor<B, 2>,
    ) -> Result<ComplexTensor<B, 3>> {
        let [n, h, w] = slices.dims();
        if h != self.size || w != self.size {
            return Err(CryoError::shape_mismatch(&[n, self.size, self.size], &[n, h, w]));
        }
        let t_dims = translations.dims();
        if t_dims != [n, 2] {
            return Err(CryoError::shape_mismatch(&[n, 2], &t_dims));
        }

        Ok(slices.rotate_phase(self.phase(translations)))
    }
}
