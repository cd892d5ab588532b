//! Posterior trait.

use burn::module::Module;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use super::PosteriorKind;

/// Distribution over real-space densities `[D, D, D]` with trainable parameters.
///
/// `sample` must be reparameterized: gradients of anything computed from the
/// draw flow back into the module parameters.
pub trait VolumePosterior<B: Backend>: Module<B> {
    /// Family tag.
    fn kind(&self) -> PosteriorKind;

    /// Grid side length `D`.
    fn size(&self) -> usize;

    /// One differentiable draw.
    fn sample(&self) -> Tensor<B, 3>;

    /// Posterior mean, used as the point estimate after training.
    fn mean(&self) -> Tensor<B, 3>;

    /// Scalar `[1]` penalty added to the data term: the KL divergence to the
    /// prior for proper distributions, the negative log prior for point masses.
    fn regularizer(&self) -> Tensor<B, 1>;
}
