//! Fourier-domain volumes consumed by the projector.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use super::validate_cube;
use crate::complex::ComplexTensor;
use crate::error::{CryoError, Result};
use crate::fourier::CenteredDft;
use crate::projection::VolumePremultiplier;

/// A batch of complex Fourier volumes `[M, D, D, D]`, layout `[m, kz, ky, kx]`,
/// zero frequency at index `D/2` on every axis.
#[derive(Debug, Clone)]
pub struct FourierVolume<B: Backend> {
    data: ComplexTensor<B, 4>,
}

impl<B: Backend> FourierVolume<B> {
    /// Wrap complex data, checking the grid invariants.
    pub fn new(data: ComplexTensor<B, 4>) -> Result<Self> {
        let [_, d0, d1, d2] = data.dims();
        validate_cube([d0, d1, d2])?;
        Ok(Self { data })
    }

    /// Premultiply real-space volumes `[M, D, D, D]` and transform them.
    ///
    /// Differentiable with respect to `volumes`; this is the path sampled
    /// latent densities take during training.
    pub fn from_real(
        volumes: Tensor<B, 4>,
        dft: &CenteredDft<B>,
        premultiplier: &VolumePremultiplier,
    ) -> Result<Self> {
        let [_, d0, d1, d2] = volumes.dims();
        let size = validate_cube([d0, d1, d2])?;
        if size != dft.size() {
            return Err(CryoError::invalid_grid(format!(
                "volume size {} does not match transform size {}",
                size,
                dft.size()
            )));
        }

        let corrected = premultiplier.apply(volumes)?;
        Self::new(dft.forward_3d_real(corrected)?)
    }

    /// Side length `D`.
    pub fn size(&self) -> usize {
        self.data.dims()[1]
    }

    /// Number of volumes in the batch.
    pub fn batch_size(&self) -> usize {
        self.data.dims()[0]
    }

    /// Complex voxel data.
    pub fn data(&self) -> &ComplexTensor<B, 4> {
        &self.data
    }

    /// Explicitly repeat a single volume `n` times.
    ///
    /// The observation model never broadcasts on its own; callers projecting
    /// one volume under many poses say so here.
    pub fn repeat(&self, n: usize) -> Result<Self> {
        let [m, d, _, _] = self.data.dims();
        if m != 1 {
            return Err(CryoError::batch_mismatch(format!(
                "only a single volume can be repeated, batch holds {}",
                m
            )));
        }
        let shape = [n, d, d, d];
        Ok(Self {
            data: ComplexTensor::new(
                self.data.re.clone().expand(shape),
                self.data.im.clone().expand(shape),
            ),
        })
    }

    /// The axis-aligned central section `kz = 0` of each volume, `[M, D, D]`.
    pub fn central_section(&self) -> ComplexTensor<B, 3> {
        let [m, d, _, _] = self.data.dims();
        self.data.clone().narrow(1, d / 2, 1).reshape([m, d, d])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpolation::InterpolationKernel;
    use crate::volume::DensityMap;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_point_source_spectrum_is_flat() {
        let device = Default::default();
        let d = 8;
        let dft = CenteredDft::<TestBackend>::new(d, &device).unwrap();
        let pre = VolumePremultiplier::new(InterpolationKernel::Linear, d).unwrap();
        let fourier = DensityMap::point_source(d, 1.0, &device)
            .unwrap()
            .to_fourier(&dft, &pre)
            .unwrap();

        assert_eq!(fourier.batch_size(), 1);
        let re = fourier.data().re.clone().into_data().to_vec::<f32>().unwrap();
        assert!(re.iter().all(|v| (v - 1.0).abs() < 1e-5));
    }

    #[test]
    fn test_repeat_requires_single_volume() {
        let device = Default::default();
        let data = ComplexTensor::<TestBackend, 4>::zeros([2, 4, 4, 4], &device);
        let vol = FourierVolume::new(data).unwrap();
        assert!(matches!(vol.repeat(3), Err(CryoError::BatchMismatch(_))));

        let single = FourierVolume::new(ComplexTensor::<TestBackend, 4>::zeros([1, 4, 4, 4], &device)).unwrap();
        assert_eq!(single.repeat(5).unwrap().batch_size(), 5);
    }

    #[test]
    fn test_central_section_shape() {
        let device = Default::default();
        let vol = FourierVolume::new(ComplexTensor::<TestBackend, 4>::zeros([3, 6, 6, 6], &device)).unwrap();
        assert_eq!(vol.central_section().dims(), [3, 6, 6]);
    }
}
