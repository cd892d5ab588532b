//! Evidence lower bound.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// Negative ELBO estimated from a single posterior draw.
///
/// The data term is the mean per-image log-likelihood of the batch; the
/// regularizer is spread over the whole dataset so that its weight per image
/// does not depend on the batch size.
#[derive(Debug, Clone)]
pub struct ElboLoss {
    kl_weight: f64,
    dataset_len: usize,
}

/// Components of one loss evaluation, all of shape `[1]`.
#[derive(Debug, Clone)]
pub struct ElboTerms<B: Backend> {
    /// Quantity to minimize.
    pub loss: Tensor<B, 1>,
    /// Mean log-likelihood per image.
    pub log_likelihood: Tensor<B, 1>,
    /// Raw regularizer before weighting.
    pub regularizer: Tensor<B, 1>,
}

impl ElboLoss {
    /// `dataset_len` is clamped to at least one image.
    pub fn new(kl_weight: f64, dataset_len: usize) -> Self {
        Self {
            kl_weight,
            dataset_len: dataset_len.max(1),
        }
    }

    /// Combine per-image log-likelihoods `[N]` with a posterior regularizer `[1]`.
    pub fn forward<B: Backend>(
        &self,
        log_likelihood: Tensor<B, 1>,
        regularizer: Tensor<B, 1>,
    ) -> ElboTerms<B> {
        let mean_ll = log_likelihood.mean();
        let weight = self.kl_weight / self.dataset_len as f64;
        let loss = mean_ll.clone().neg() + regularizer.clone().mul_scalar(weight);
        ElboTerms {
            loss,
            log_likelihood: mean_ll,
            regularizer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::tensor::ElementConversion;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_negative_elbo() {
        let device = Default::default();
        let ll = Tensor::<TestBackend, 1>::from_floats([-2.0, -4.0], &device);
        let reg = Tensor::<TestBackend, 1>::from_floats([10.0], &device);
        let terms = ElboLoss::new(0.5, 5).forward(ll, reg);

        let loss: f64 = terms.loss.into_scalar().elem();
        assert!((loss - (3.0 + 1.0)).abs() < 1e-6);
        let ll: f64 = terms.log_likelihood.into_scalar().elem();
        assert!((ll + 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_weight_ignores_regularizer() {
        let device = Default::default();
        let ll = Tensor::<TestBackend, 1>::from_floats([-1.0], &device);
        let reg = Tensor::<TestBackend, 1>::from_floats([1e6], &device);
        let loss: f64 = ElboLoss::new(0.0, 1).forward(ll, reg).loss.into_scalar().elem();
        assert!((loss - 1.0).abs() < 1e-6);
    }
}
