//! Stochastic variational fitting of a volume posterior.

use std::sync::Arc;

use burn::module::AutodiffModule;
use burn::optim::GradientsParams;
use burn::tensor::backend::AutodiffBackend;
use burn::tensor::{ElementConversion, Tensor};
use cryoslice_core::{CenteredDft, FourierVolume, ObservationModel, VolumePremultiplier};

use crate::config::TrainingConfig;
use crate::dataset::{load_batch, sample_indices, ParticleBatch, ProjectionDataset};
use crate::error::{InferenceError, Result};
use crate::loss::{ElboLoss, ElboTerms};
use crate::optimizer::{AdamOptimizer, Optimizer};
use crate::posterior::VolumePosterior;
use crate::progress::{ConsoleProgressCallback, ProgressCallback, ProgressTracker};

/// Result of [`Trainer::fit`].
#[derive(Debug)]
pub struct TrainingOutput<P> {
    /// Posterior after the last update.
    pub posterior: P,
    /// Loss per iteration; non-finite entries mark skipped updates.
    pub history: Vec<f64>,
}

impl<P> TrainingOutput<P> {
    /// Number of iterations that ran before the loop ended.
    pub fn iterations(&self) -> usize {
        self.history.len()
    }

    /// Last finite loss, if any.
    pub fn final_loss(&self) -> Option<f64> {
        self.history.iter().rev().copied().find(|l| l.is_finite())
    }
}

/// Bounded training loop around the observation model.
///
/// Each iteration draws a density from the posterior, renders it under the
/// batch poses, scores the batch, backpropagates, and applies one Adam step.
pub struct Trainer<B: AutodiffBackend> {
    config: TrainingConfig,
    model: ObservationModel<B>,
    dft: CenteredDft<B>,
    premultiplier: VolumePremultiplier,
    tracker: ProgressTracker,
    device: B::Device,
}

impl<B: AutodiffBackend> Trainer<B> {
    /// Validate `config`, seed the backend and build the forward model.
    pub fn new(config: TrainingConfig, device: &B::Device) -> Result<Self> {
        config.validate()?;
        B::seed(config.seed);

        let model = ObservationModel::new(config.size, config.kernel, config.noise_std, device)?;
        let dft = CenteredDft::new(config.size, device)?;
        let premultiplier = VolumePremultiplier::new(config.kernel, config.size)?;

        let mut tracker = ProgressTracker::new();
        tracker.add_callback(Arc::new(ConsoleProgressCallback::new(config.log_interval)));

        Ok(Self {
            config,
            model,
            dft,
            premultiplier,
            tracker,
            device: device.clone(),
        })
    }

    /// Register an additional progress observer.
    pub fn with_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.tracker.add_callback(callback);
        self
    }

    /// Fit `posterior` to `dataset` for at most `num_iterations` steps.
    ///
    /// A non-finite loss is logged and its update skipped. The run fails with
    /// [`InferenceError::NumericalInstability`] only when no iteration
    /// produced a finite loss.
    pub fn fit<P, S>(&self, mut posterior: P, dataset: &S) -> Result<TrainingOutput<P>>
    where
        P: VolumePosterior<B> + AutodiffModule<B>,
        S: ProjectionDataset + ?Sized,
    {
        let size = self.config.size;
        if dataset.is_empty() {
            return Err(InferenceError::empty_dataset("no images to train on"));
        }
        if dataset.image_size() != size || posterior.size() != size {
            return Err(InferenceError::invalid_configuration(format!(
                "grid sizes disagree: config {}, dataset {}, posterior {}",
                size,
                dataset.image_size(),
                posterior.size()
            )));
        }

        let total = self.config.num_iterations;
        let loss_fn = ElboLoss::new(self.config.kl_weight, dataset.len());
        let mut optimizer = AdamOptimizer::<P, B>::new(self.config.learning_rate);
        let mut history = Vec::with_capacity(total);

        tracing::info!(
            posterior = %posterior.kind(),
            images = dataset.len(),
            size,
            iterations = total,
            "fitting volume posterior"
        );
        self.tracker.start();

        for iteration in 1..=total {
            let indices = sample_indices::<B>(dataset.len(), self.config.batch_size, &self.device)?;
            let batch = load_batch(dataset, &indices, &self.dft, &self.device)?;

            let terms = self.evaluate(&posterior, &batch, &loss_fn)?;
            let loss = scalar(&terms.loss);
            history.push(loss);

            if !loss.is_finite() {
                self.tracker
                    .error(&format!("non-finite loss at iteration {}; update skipped", iteration));
                continue;
            }

            let metrics = vec![
                ("log_likelihood".to_string(), scalar(&terms.log_likelihood)),
                ("regularizer".to_string(), scalar(&terms.regularizer)),
            ];
            let grads = GradientsParams::from_grads(terms.loss.backward(), &posterior);
            posterior = optimizer.step(posterior, grads);

            self.tracker
                .update(iteration, Some(total), loss, optimizer.learning_rate(), metrics);
            if self.tracker.should_stop() {
                break;
            }
        }

        let output = TrainingOutput { posterior, history };
        let Some(final_loss) = output.final_loss() else {
            let msg = format!(
                "no finite loss in {} iterations; posterior left unchanged",
                output.iterations()
            );
            self.tracker.error(&msg);
            return Err(InferenceError::numerical_instability(msg));
        };
        self.tracker
            .complete(output.iterations(), final_loss, self.config.learning_rate);
        Ok(output)
    }

    /// Steps 1 to 3 of an iteration: sample, render, score.
    fn evaluate<P>(
        &self,
        posterior: &P,
        batch: &ParticleBatch<B>,
        loss_fn: &ElboLoss,
    ) -> Result<ElboTerms<B>>
    where
        P: VolumePosterior<B>,
    {
        let d = self.config.size;
        let density: Tensor<B, 4> = posterior.sample().reshape([1, d, d, d]);
        let volume = FourierVolume::from_real(density, &self.dft, &self.premultiplier)?
            .repeat(batch.len())?;

        let observation = self.model.observe(&volume, &batch.poses)?;
        let log_likelihood = self.model.log_likelihood(&observation, &batch.images)?;
        Ok(loss_fn.forward(log_likelihood, posterior.regularizer()))
    }
}

fn scalar<B: AutodiffBackend>(tensor: &Tensor<B, 1>) -> f64 {
    tensor.clone().into_scalar().elem::<f64>()
}
