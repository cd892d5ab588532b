//! Sampler trait for complex volumes.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use crate::complex::ComplexTensor;

/// Samples a batch of complex volumes at continuous voxel coordinates.
///
/// # Type Parameters
/// * `B` - The Burn backend
pub trait SliceSampler<B: Backend> {
    /// Evaluate each volume at its own set of points.
    ///
    /// # Arguments
    /// * `volumes` - Complex volumes `[N, Z, Y, X]`
    /// * `coords` - Continuous voxel indices `[N, P, 3]` ordered `(x, y, z)`
    ///
    /// # Returns
    /// Complex samples `[N, P]`
    fn sample(&self, volumes: &ComplexTensor<B, 4>, coords: Tensor<B, 3>) -> ComplexTensor<B, 2>;
}
