//! Mean-field Gaussian posterior.

use burn::module::{Ignored, Module, Param};
use burn::tensor::backend::Backend;
use burn::tensor::{Distribution, Tensor};

use super::{PosteriorKind, VolumePosterior};
use crate::error::{InferenceError, Result};

/// Independent Gaussian per voxel, `N(loc, softplus(raw_scale)^2)`, with an
/// isotropic `N(0, prior_std^2)` prior.
#[derive(Module, Debug)]
pub struct GaussianPosterior<B: Backend> {
    loc: Param<Tensor<B, 3>>,
    raw_scale: Param<Tensor<B, 3>>,
    prior_std: Ignored<f64>,
}

impl<B: Backend> GaussianPosterior<B> {
    /// Zero-mean posterior with every voxel at scale `init_scale`.
    pub fn new(size: usize, prior_std: f64, init_scale: f64, device: &B::Device) -> Result<Self> {
        Self::from_mean(Tensor::zeros([size, size, size], device), prior_std, init_scale)
    }

    /// Posterior centered on an initial density estimate.
    pub fn from_mean(loc: Tensor<B, 3>, prior_std: f64, init_scale: f64) -> Result<Self> {
        let [d0, d1, d2] = loc.dims();
        if d0 == 0 || d0 != d1 || d1 != d2 {
            return Err(InferenceError::invalid_configuration(format!(
                "posterior grid must be a non-empty cube, got {:?}",
                [d0, d1, d2]
            )));
        }
        if !(prior_std > 0.0) || !(init_scale > 0.0) {
            return Err(InferenceError::invalid_configuration(format!(
                "scales must be positive, got prior {} and initial {}",
                prior_std, init_scale
            )));
        }

        // softplus^-1(s) = ln(e^s - 1)
        let raw = init_scale.exp_m1().ln();
        let raw_scale = Tensor::full([d0, d0, d0], raw, &loc.device());
        Ok(Self {
            loc: Param::from_tensor(loc),
            raw_scale: Param::from_tensor(raw_scale),
            prior_std: Ignored(prior_std),
        })
    }

    /// Per-voxel standard deviation.
    pub fn scale(&self) -> Tensor<B, 3> {
        self.raw_scale.val().exp().log1p()
    }

    /// Prior standard deviation.
    pub fn prior_std(&self) -> f64 {
        self.prior_std.0
    }
}

impl<B: Backend> VolumePosterior<B> for GaussianPosterior<B> {
    fn kind(&self) -> PosteriorKind {
        PosteriorKind::Gaussian
    }

    fn size(&self) -> usize {
        self.loc.val().dims()[0]
    }

    fn sample(&self) -> Tensor<B, 3> {
        let loc = self.loc.val();
        let eps = Tensor::random(loc.dims(), Distribution::Normal(0.0, 1.0), &loc.device());
        loc + self.scale() * eps
    }

    fn mean(&self) -> Tensor<B, 3> {
        self.loc.val()
    }

    fn regularizer(&self) -> Tensor<B, 1> {
        // KL(N(m, s^2) || N(0, p^2)) = ln(p / s) + (s^2 + m^2) / (2 p^2) - 1/2
        let p = self.prior_std.0;
        let scale = self.scale();
        let loc = self.loc.val();
        let kl = scale.clone().log().neg().add_scalar(p.ln() - 0.5)
            + (scale.powf_scalar(2.0) + loc.powf_scalar(2.0)).div_scalar(2.0 * p * p);
        kl.sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::Autodiff;
    use burn::tensor::ElementConversion;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_initial_scale() {
        let device = Default::default();
        let posterior = GaussianPosterior::<TestBackend>::new(4, 1.0, 0.3, &device).unwrap();
        let scale = posterior.scale().into_data().to_vec::<f32>().unwrap();
        assert!(scale.iter().all(|s| (s - 0.3).abs() < 1e-5));
        assert_eq!(posterior.size(), 4);
    }

    #[test]
    fn test_kl_vanishes_at_prior() {
        let device = Default::default();
        let posterior = GaussianPosterior::<TestBackend>::new(4, 0.7, 0.7, &device).unwrap();
        let kl: f64 = posterior.regularizer().into_scalar().elem();
        assert!(kl.abs() < 1e-3, "kl = {}", kl);
    }

    #[test]
    fn test_kl_positive_away_from_prior() {
        let device = Default::default();
        let loc = Tensor::<TestBackend, 3>::ones([2, 2, 2], &device);
        let posterior = GaussianPosterior::from_mean(loc, 1.0, 0.5).unwrap();
        // per voxel: ln 2 + (0.25 + 1) / 2 - 0.5
        let expected = 8.0 * (2f64.ln() + 0.625 - 0.5);
        let kl: f64 = posterior.regularizer().into_scalar().elem();
        assert!((kl - expected).abs() < 1e-3);
    }

    #[test]
    fn test_sample_is_reparameterized() {
        type AB = Autodiff<TestBackend>;
        let device = Default::default();
        let posterior = GaussianPosterior::<AB>::new(2, 1.0, 0.2, &device).unwrap();
        let loss = posterior.sample().powf_scalar(2.0).sum();
        let grads = loss.backward();
        assert!(posterior.loc.val().grad(&grads).is_some());
        assert!(posterior.raw_scale.val().grad(&grads).is_some());
    }

    #[test]
    fn test_rejects_bad_scale() {
        let device = Default::default();
        assert!(GaussianPosterior::<TestBackend>::new(4, 1.0, 0.0, &device).is_err());
        assert!(GaussianPosterior::<TestBackend>::new(4, -1.0, 0.1, &device).is_err());
    }
}
