//! Nearest-neighbour sampling with zero padding.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use super::linear::{in_bounds, FlatVolumes};
use super::trait_::SliceSampler;
use crate::complex::ComplexTensor;

/// Nearest-neighbour sampler.
///
/// Rounding has zero derivative, so gradients reach the voxel values but not
/// the sampling coordinates.
#[derive(Debug, Clone, Copy, Default)]
pub struct NearestSampler;

impl NearestSampler {
    /// Create a new nearest-neighbour sampler.
    pub fn new() -> Self {
        Self
    }
}

impl<B: Backend> SliceSampler<B> for NearestSampler {
    fn sample(&self, volumes: &ComplexTensor<B, 4>, coords: Tensor<B, 3>) -> ComplexTensor<B, 2> {
        let [n, d0, d1, d2] = volumes.dims();
        let [_, p, _] = coords.dims();
        let flat = FlatVolumes::new(volumes, p);

        let coords = coords.reshape([n * p, 3]).round();
        let x = coords.clone().narrow(1, 0, 1).squeeze::<1>(1);
        let y = coords.clone().narrow(1, 1, 1).squeeze::<1>(1);
        let z = coords.narrow(1, 2, 1).squeeze::<1>(1);

        let mask = in_bounds(&x, d2) * in_bounds(&y, d1) * in_bounds(&z, d0);

        let x_i = x.clamp(0.0, (d2 - 1) as f64).int();
        let y_i = y.clamp(0.0, (d1 - 1) as f64).int();
        let z_i = z.clamp(0.0, (d0 - 1) as f64).int();

        let idx = z_i * (d1 * d2) as i32 + y_i * d2 as i32 + x_i;
        flat.gather(idx).mul_real(mask).reshape([n, p])
    }
}
