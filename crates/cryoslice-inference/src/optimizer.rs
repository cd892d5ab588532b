//! Parameter updates for posterior modules.

use burn::module::AutodiffModule;
use burn::optim::adaptor::OptimizerAdaptor;
use burn::optim::{Adam, AdamConfig, GradientsParams, Optimizer as BurnOptimizer};
use burn::tensor::backend::AutodiffBackend;

/// Optimizer over a trainable module.
///
/// Gradients are consumed by [`Optimizer::step`]; nothing is carried over to
/// the next iteration apart from the optimizer's own moment estimates.
pub trait Optimizer<M, B>
where
    M: AutodiffModule<B>,
    B: AutodiffBackend,
{
    /// Apply one update and return the new module.
    fn step(&mut self, module: M, gradients: GradientsParams) -> M;

    /// Current learning rate.
    fn learning_rate(&self) -> f64;
}

/// Adam with a fixed learning rate.
pub struct AdamOptimizer<M: AutodiffModule<B>, B: AutodiffBackend> {
    optimizer: OptimizerAdaptor<Adam, M, B>,
    learning_rate: f64,
}

impl<M: AutodiffModule<B>, B: AutodiffBackend> AdamOptimizer<M, B> {
    /// Adam with the default moment decay rates.
    pub fn new(learning_rate: f64) -> Self {
        Self {
            optimizer: AdamConfig::new().init(),
            learning_rate,
        }
    }
}

impl<M, B> Optimizer<M, B> for AdamOptimizer<M, B>
where
    M: AutodiffModule<B>,
    B: AutodiffBackend,
{
    fn step(&mut self, module: M, gradients: GradientsParams) -> M {
        self.optimizer.step(self.learning_rate, module, gradients)
    }

    fn learning_rate(&self) -> f64 {
        self.learning_rate
    }
}
