//! Per-coefficient Gaussian observation noise.
//!
//! Every Fourier coefficient is observed with independent Gaussian noise of
//! standard deviation `sigma` on the real and on the imaginary channel.

use burn::tensor::backend::Backend;
use burn::tensor::{Distribution, ElementConversion, Tensor};
use std::f64::consts::PI;

use crate::complex::ComplexTensor;
use crate::error::{CryoError, Result};

/// Independent Gaussian over Fourier slices `[N, D, D]`.
#[derive(Debug, Clone)]
pub struct GaussianObservation<B: Backend> {
    mean: ComplexTensor<B, 3>,
    sigma: f64,
}

impl<B: Backend> GaussianObservation<B> {
    /// Distribution centered on `mean` with standard deviation `sigma > 0`.
    pub fn new(mean: ComplexTensor<B, 3>, sigma: f64) -> Result<Self> {
        if !sigma.is_finite() || sigma <= 0.0 {
            return Err(CryoError::invalid_noise(format!(
                "Gaussian observation needs a positive finite sigma, got {}",
                sigma
            )));
        }
        Ok(Self { mean, sigma })
    }

    /// Mean slices.
    pub fn mean(&self) -> &ComplexTensor<B, 3> {
        &self.mean
    }

    /// Standard deviation per channel.
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Draw one noisy observation per slice.
    pub fn sample(&self) -> ComplexTensor<B, 3> {
        let shape = self.mean.dims();
        let device = self.mean.device();
        ComplexTensor::new(
            self.mean.re.clone() + Tensor::random(shape, Distribution::Normal(0.0, self.sigma), &device),
            self.mean.im.clone() + Tensor::random(shape, Distribution::Normal(0.0, self.sigma), &device),
        )
    }

    /// Log density of `observed`, summed per slice, `[N]`.
    ///
    /// `mask` (`[D, D]`, entries 0 or 1) restricts the sum to retained
    /// coefficients; the normalizing constant counts only those.
    pub fn log_prob(
        &self,
        observed: &ComplexTensor<B, 3>,
        mask: Option<&Tensor<B, 2>>,
    ) -> Result<Tensor<B, 1>> {
        let dims = self.mean.dims();
        if observed.dims() != dims {
            return Err(CryoError::shape_mismatch(&dims, &observed.dims()));
        }
        let [n, h, w] = dims;

        let residual = observed.clone() - self.mean.clone();
        let mut squared = residual.abs_squared();
        let mut count = (h * w) as f64;

        if let Some(mask) = mask {
            if mask.dims() != [h, w] {
                return Err(CryoError::shape_mismatch(&[h, w], &mask.dims()));
            }
            count = mask.clone().sum().into_scalar().elem::<f64>();
            squared = squared * mask.clone().reshape([1, h, w]).expand([n, h, w]);
        }

        let var = self.sigma * self.sigma;
        // Two real channels per coefficient.
        let log_norm = count * (2.0 * self.sigma.ln() + (2.0 * PI).ln());

        let sum_sq = squared.reshape([n, h * w]).sum_dim(1).reshape([n]);
        Ok(sum_sq.mul_scalar(-0.5 / var).sub_scalar(log_norm))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray<f32>;

    fn mean(device: &<TestBackend as Backend>::Device) -> ComplexTensor<TestBackend, 3> {
        ComplexTensor::new(
            Tensor::ones([2, 4, 4], device),
            Tensor::zeros([2, 4, 4], device),
        )
    }

    #[test]
    fn test_rejects_bad_sigma() {
        let device = Default::default();
        assert!(GaussianObservation::new(mean(&device), 0.0).is_err());
        assert!(GaussianObservation::new(mean(&device), -1.0).is_err());
        assert!(GaussianObservation::new(mean(&device), f64::NAN).is_err());
    }

    #[test]
    fn test_log_prob_of_mean() {
        let device = Default::default();
        let sigma = 0.5;
        let dist = GaussianObservation::new(mean(&device), sigma).unwrap();
        let lp = dist.log_prob(&mean(&device), None).unwrap();
        let values = lp.into_data().to_vec::<f32>().unwrap();
        let expected = -16.0 * (2.0 * sigma.ln() + (2.0 * PI).ln());
        for v in values {
            assert!((v as f64 - expected).abs() < 1e-3, "expected {}, got {}", expected, v);
        }
    }

    #[test]
    fn test_mask_restricts_sum() {
        let device = Default::default();
        let dist = GaussianObservation::new(mean(&device), 1.0).unwrap();
        let mut mask_values = [[0.0f32; 4]; 4];
        mask_values[2][2] = 1.0;
        let mask = Tensor::<TestBackend, 2>::from_floats(mask_values, &device);

        // Far from the mean everywhere except the retained coefficient
        let observed = ComplexTensor::new(
            Tensor::ones([2, 4, 4], &device).mul_scalar(100.0),
            Tensor::zeros([2, 4, 4], &device),
        );
        let lp = dist.log_prob(&observed, Some(&mask)).unwrap();
        let v = lp.into_data().to_vec::<f32>().unwrap()[0] as f64;
        let expected = -0.5 * 99.0 * 99.0 - (2.0 * PI).ln();
        assert!((v - expected).abs() < 1e-2);
    }

    #[test]
    fn test_sample_shape() {
        let device = Default::default();
        let dist = GaussianObservation::new(mean(&device), 0.1).unwrap();
        assert_eq!(dist.sample().dims(), [2, 4, 4]);
    }
}
