//! Central-slice extraction.
//!
//! By the central-slice theorem, the 2-D transform of a projection along the
//! viewing axis equals the plane through the origin of the 3-D transform that
//! is orthogonal to that axis. The projector builds the `kz = 0` plane
//! `(u, v, 0)`, rotates it into the volume frame with `R^T`, and interpolates.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use crate::complex::ComplexTensor;
use crate::error::{validate_grid_size, CryoError, Result};
use crate::grid::central_plane_points;
use crate::interpolation::{InterpolationKernel, SliceSampler};
use crate::volume::FourierVolume;

/// Extracts `D x D` Fourier slices from a batch of volumes.
#[derive(Debug, Clone)]
pub struct CentralSliceProjector<B: Backend> {
    size: usize,
    kernel: InterpolationKernel,
    plane: Tensor<B, 2>,
}

impl<B: Backend> CentralSliceProjector<B> {
    /// Create a projector for side length `size`.
    pub fn new(size: usize, kernel: InterpolationKernel, device: &B::Device) -> Result<Self> {
        validate_grid_size(size)?;
        Ok(Self {
            size,
            kernel,
            plane: central_plane_points(size, device),
        })
    }

    /// Side length.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Interpolation kernel.
    pub fn kernel(&self) -> InterpolationKernel {
        self.kernel
    }

    /// Project volume `i` under rotation `i` for every `i`.
    ///
    /// # Arguments
    /// * `volume` - Fourier volumes `[N, D, D, D]`
    /// * `rotations` - Rotation matrices `[N, 3, 3]`
    ///
    /// # Returns
    /// Fourier slices `[N, D, D]` indexed `[v, u]`
    pub fn project(
        &self,
        volume: &FourierVolume<B>,
        rotations: &Tensor<B, 3>,
    ) -> Result<ComplexTensor<B, 3>> {
        let d = self.size;
        if volume.size() != d {
            return Err(CryoError::invalid_grid(format!(
                "projector expects {}^3 volumes, got {}^3",
                d,
                volume.size()
            )));
        }
        let [n, r, c] = rotations.dims();
        if r != 3 || c != 3 {
            return Err(CryoError::shape_mismatch(&[n, 3, 3], &[n, r, c]));
        }
        if volume.batch_size() != n {
            return Err(CryoError::batch_mismatch(format!(
                "{} volumes for {} rotations",
                volume.batch_size(),
                n
            )));
        }

        let coords = self.sample_coordinates(rotations.clone());
        tracing::trace!(batch = n, size = d, "extracting central slices");

        let samples = self.kernel.sample(volume.data(), coords);
        Ok(samples.reshape([n, d, d]))
    }

    /// Continuous voxel indices `[N, D*D, 3]` at which each slice samples.
    pub fn sample_coordinates(&self, rotations: Tensor<B, 3>) -> Tensor<B, 3> {
        let [n, _, _] = rotations.dims();
        let p = self.size * self.size;

        // Row vectors: p @ R == (R^T p)^T
        let plane = self.plane.clone().reshape([1, p, 3]).expand([n, p, 3]);
        plane.matmul(rotations).add_scalar((self.size / 2) as f64)
    }
}
