//! Centered, separable discrete Fourier transform.
//!
//! Both the spatial index `n` and the frequency index `k` run over
//! `-D/2 ..= D/2 - 1` (array index `D/2` is the origin), so
//!
//! ```text
//! F[k] = sum_n f[n] * exp(-2 pi i k n / D)
//! ```
//!
//! is computed directly without any shift bookkeeping. The forward transform
//! is unnormalized; inverses divide by `D` per transformed axis.
//!
//! The DFT matrix is symmetric, so applying it along the last axis is a plain
//! right-multiplication `x @ F`.

use burn::tensor::backend::Backend;
use burn::tensor::{Shape, Tensor, TensorData};
use std::f64::consts::PI;

use crate::complex::ComplexTensor;
use crate::error::{validate_grid_size, CryoError, Result};

/// Dense centered DFT for one grid size.
#[derive(Debug, Clone)]
pub struct CenteredDft<B: Backend> {
    size: usize,
    forward: ComplexTensor<B, 2>,
    inverse: ComplexTensor<B, 2>,
}

impl<B: Backend> CenteredDft<B> {
    /// Build the forward and inverse DFT matrices for side length `size`.
    pub fn new(size: usize, device: &B::Device) -> Result<Self> {
        validate_grid_size(size)?;
        tracing::debug!(size, "building centered DFT matrices");

        Ok(Self {
            size,
            forward: dft_matrix(size, -1.0, device),
            inverse: dft_matrix(size, 1.0, device),
        })
    }

    /// Grid side length.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Forward 2-D transform of a batch of complex images `[N, D, D]`.
    pub fn forward_2d(&self, images: ComplexTensor<B, 3>) -> Result<ComplexTensor<B, 3>> {
        self.check_trailing(&images.dims(), 2)?;
        Ok(self.transform_2d(images, &self.forward))
    }

    /// Forward 2-D transform of a batch of real images `[N, D, D]`.
    pub fn forward_2d_real(&self, images: Tensor<B, 3>) -> Result<ComplexTensor<B, 3>> {
        self.forward_2d(ComplexTensor::from_real(images))
    }

    /// Inverse 2-D transform of a batch of Fourier slices `[N, D, D]`.
    ///
    /// Slices that are not exactly Hermitian (interpolation error, phase
    /// shifts by fractional pixels) leave a small imaginary residual in the
    /// result. Callers wanting a real image take `.re`.
    pub fn inverse_2d(&self, slices: ComplexTensor<B, 3>) -> Result<ComplexTensor<B, 3>> {
        self.check_trailing(&slices.dims(), 2)?;
        let norm = 1.0 / (self.size * self.size) as f64;
        Ok(self.transform_2d(slices, &self.inverse).mul_scalar(norm))
    }

    /// Forward 3-D transform of a batch of complex volumes `[M, D, D, D]`.
    pub fn forward_3d(&self, volumes: ComplexTensor<B, 4>) -> Result<ComplexTensor<B, 4>> {
        self.check_trailing(&volumes.dims(), 3)?;
        Ok(self.transform_3d(volumes, &self.forward))
    }

    /// Forward 3-D transform of a batch of real volumes `[M, D, D, D]`.
    pub fn forward_3d_real(&self, volumes: Tensor<B, 4>) -> Result<ComplexTensor<B, 4>> {
        self.forward_3d(ComplexTensor::from_real(volumes))
    }

    /// Inverse 3-D transform of a batch of Fourier volumes `[M, D, D, D]`.
    pub fn inverse_3d(&self, volumes: ComplexTensor<B, 4>) -> Result<ComplexTensor<B, 4>> {
        self.check_trailing(&volumes.dims(), 3)?;
        let norm = 1.0 / (self.size * self.size * self.size) as f64;
        Ok(self.transform_3d(volumes, &self.inverse).mul_scalar(norm))
    }

    fn transform_2d(
        &self,
        x: ComplexTensor<B, 3>,
        matrix: &ComplexTensor<B, 2>,
    ) -> ComplexTensor<B, 3> {
        // [N, v, u]: u first, then v
        let x = apply_last_axis(x, matrix);
        let x = apply_last_axis(x.swap_dims(1, 2), matrix);
        x.swap_dims(1, 2)
    }

    fn transform_3d(
        &self,
        x: ComplexTensor<B, 4>,
        matrix: &ComplexTensor<B, 2>,
    ) -> ComplexTensor<B, 4> {
        // [M, z, y, x]: x, then y, then z
        let x = apply_last_axis(x, matrix);
        let x = apply_last_axis(x.swap_dims(2, 3), matrix).swap_dims(2, 3);
        apply_last_axis(x.swap_dims(1, 3), matrix).swap_dims(1, 3)
    }

    fn check_trailing<const R: usize>(&self, dims: &[usize; R], axes: usize) -> Result<()> {
        let trailing = &dims[R - axes..];
        if trailing.iter().any(|&d| d != self.size) {
            let mut expected = dims.to_vec();
            for d in expected[R - axes..].iter_mut() {
                *d = self.size;
            }
            return Err(CryoError::shape_mismatch(&expected, dims));
        }
        Ok(())
    }
}

/// Right-multiply the last axis of `x` by a symmetric complex matrix.
fn apply_last_axis<B: Backend, const R: usize>(
    x: ComplexTensor<B, R>,
    matrix: &ComplexTensor<B, 2>,
) -> ComplexTensor<B, R> {
    let dims = x.dims();
    let n = dims[R - 1];
    let rows = dims.iter().product::<usize>() / n;

    let flat = x.reshape([rows, n]);
    let re = flat.re.clone().matmul(matrix.re.clone()) - flat.im.clone().matmul(matrix.im.clone());
    let im = flat.re.matmul(matrix.im.clone()) + flat.im.matmul(matrix.re.clone());

    ComplexTensor::new(re, im).reshape(dims)
}

/// `exp(sign * 2 pi i k n / D)` over centered `k, n`.
fn dft_matrix<B: Backend>(size: usize, sign: f64, device: &B::Device) -> ComplexTensor<B, 2> {
    let half = (size / 2) as i64;
    let d = size as i64;
    let mut re = Vec::with_capacity(size * size);
    let mut im = Vec::with_capacity(size * size);

    for k in 0..d {
        for n in 0..d {
            // Reduce k*n modulo D in integers to keep the phase exact.
            let phase_index = ((k - half) * (n - half)).rem_euclid(d);
            let phase = sign * 2.0 * PI * phase_index as f64 / size as f64;
            re.push(phase.cos() as f32);
            im.push(phase.sin() as f32);
        }
    }

    let shape = Shape::new([size, size]);
    ComplexTensor::new(
        Tensor::from_data(TensorData::new(re, shape.clone()), device),
        Tensor::from_data(TensorData::new(im, shape), device),
    )
}
