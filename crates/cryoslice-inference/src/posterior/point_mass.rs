//! Point-mass (MAP) posterior.

use burn::module::{Ignored, Module, Param};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use super::{PosteriorKind, VolumePosterior};
use crate::error::{InferenceError, Result};

/// Degenerate posterior holding a single density estimate.
#[derive(Module, Debug)]
pub struct PointMassPosterior<B: Backend> {
    density: Param<Tensor<B, 3>>,
    prior_std: Ignored<f64>,
}

impl<B: Backend> PointMassPosterior<B> {
    /// Zero-initialized estimate.
    pub fn new(size: usize, prior_std: f64, device: &B::Device) -> Result<Self> {
        Self::from_density(Tensor::zeros([size, size, size], device), prior_std)
    }

    /// Start from a given density.
    pub fn from_density(density: Tensor<B, 3>, prior_std: f64) -> Result<Self> {
        let [d0, d1, d2] = density.dims();
        if d0 == 0 || d0 != d1 || d1 != d2 {
            return Err(InferenceError::invalid_configuration(format!(
                "posterior grid must be a non-empty cube, got {:?}",
                [d0, d1, d2]
            )));
        }
        if !(prior_std > 0.0) {
            return Err(InferenceError::invalid_configuration(format!(
                "prior scale must be positive, got {}",
                prior_std
            )));
        }
        Ok(Self {
            density: Param::from_tensor(density),
            prior_std: Ignored(prior_std),
        })
    }
}

impl<B: Backend> VolumePosterior<B> for PointMassPosterior<B> {
    fn kind(&self) -> PosteriorKind {
        PosteriorKind::PointMass
    }

    fn size(&self) -> usize {
        self.density.val().dims()[0]
    }

    fn sample(&self) -> Tensor<B, 3> {
        self.density.val()
    }

    fn mean(&self) -> Tensor<B, 3> {
        self.density.val()
    }

    /// Negative log of the `N(0, prior_std^2)` prior, dropping constants.
    fn regularizer(&self) -> Tensor<B, 1> {
        let p = self.prior_std.0;
        self.density.val().powf_scalar(2.0).sum().div_scalar(2.0 * p * p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::tensor::ElementConversion;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_sample_equals_mean() {
        let device = Default::default();
        let density = Tensor::<TestBackend, 3>::ones([2, 2, 2], &device);
        let posterior = PointMassPosterior::from_density(density, 2.0).unwrap();
        assert_eq!(
            posterior.sample().into_data().to_vec::<f32>().unwrap(),
            posterior.mean().into_data().to_vec::<f32>().unwrap()
        );
        assert_eq!(posterior.kind(), PosteriorKind::PointMass);
    }

    #[test]
    fn test_negative_log_prior() {
        let device = Default::default();
        let density = Tensor::<TestBackend, 3>::ones([2, 2, 2], &device);
        let posterior = PointMassPosterior::from_density(density, 2.0).unwrap();
        let penalty: f64 = posterior.regularizer().into_scalar().elem();
        assert!((penalty - 8.0 / 8.0).abs() < 1e-6);
    }

    #[test]
    fn test_rejects_non_cube() {
        let device = Default::default();
        let density = Tensor::<TestBackend, 3>::ones([2, 2, 3], &device);
        assert!(PointMassPosterior::from_density(density, 1.0).is_err());
    }
}
