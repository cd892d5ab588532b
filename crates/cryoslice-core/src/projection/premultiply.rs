//! Real-space premultiplication compensating the interpolation kernel.
//!
//! Sampling the Fourier volume with kernel `k` is equivalent to multiplying
//! the real-space density by `K_hat(x / D)` along each axis (for trilinear
//! sampling, `sinc^2`). Dividing the density by the same separable factor
//! before the forward transform undoes that apodization.

use burn::tensor::backend::Backend;
use burn::tensor::{Shape, Tensor, TensorData};

use crate::error::{validate_grid_size, CryoError, Result};
use crate::grid::centered_coordinates;
use crate::interpolation::InterpolationKernel;

/// Per-axis correction factors for one kernel and grid size.
#[derive(Debug, Clone)]
pub struct VolumePremultiplier {
    kernel: InterpolationKernel,
    size: usize,
    factors: Vec<f32>,
}

impl VolumePremultiplier {
    /// Precompute `1 / K_hat(x / size)` over centered coordinates `x`.
    pub fn new(kernel: InterpolationKernel, size: usize) -> Result<Self> {
        validate_grid_size(size)?;
        let factors = centered_coordinates(size)
            .into_iter()
            .map(|x| (1.0 / kernel.fourier_response(x as f64 / size as f64)) as f32)
            .collect();
        Ok(Self {
            kernel,
            size,
            factors,
        })
    }

    /// Kernel these factors compensate.
    pub fn kernel(&self) -> InterpolationKernel {
        self.kernel
    }

    /// 1-D correction factors, indexed like the volume axes.
    pub fn factors(&self) -> &[f32] {
        &self.factors
    }

    /// Separable correction expanded to a full `[D, D, D]` grid.
    pub fn correction_volume<B: Backend>(&self, device: &B::Device) -> Tensor<B, 3> {
        let d = self.size;
        let mut values = Vec::with_capacity(d * d * d);
        for fz in &self.factors {
            for fy in &self.factors {
                for fx in &self.factors {
                    values.push(fz * fy * fx);
                }
            }
        }
        Tensor::from_data(TensorData::new(values, Shape::new([d, d, d])), device)
    }

    /// Multiply a batch of real-space volumes `[M, D, D, D]` by the correction.
    pub fn apply<B: Backend>(&self, volumes: Tensor<B, 4>) -> Result<Tensor<B, 4>> {
        let [m, d0, d1, d2] = volumes.dims();
        let d = self.size;
        if [d0, d1, d2] != [d, d, d] {
            return Err(CryoError::shape_mismatch(&[m, d, d, d], &[m, d0, d1, d2]));
        }

        let correction = self
            .correction_volume::<B>(&volumes.device())
            .reshape([1, d, d, d])
            .expand([m, d, d, d]);
        Ok(volumes * correction)
    }
}
