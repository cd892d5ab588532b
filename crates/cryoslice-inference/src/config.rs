//! Training and simulation configuration.

use burn::config::Config;
use cryoslice_core::InterpolationKernel;

use crate::error::{self, InferenceError};
use crate::posterior::PosteriorKind;

/// Configuration for [`crate::trainer::Trainer`].
#[derive(Config, Debug)]
pub struct TrainingConfig {
    /// Grid side length `D` (even).
    pub size: usize,
    /// Noise standard deviation assumed by the likelihood (must be positive).
    pub noise_std: f64,
    /// Number of optimizer steps.
    #[config(default = "500")]
    pub num_iterations: usize,
    /// Images per step.
    #[config(default = "16")]
    pub batch_size: usize,
    /// Adam learning rate.
    #[config(default = "1e-2")]
    pub learning_rate: f64,
    /// Weight on the posterior regularizer relative to the data term.
    #[config(default = "1.0")]
    pub kl_weight: f64,
    /// Standard deviation of the zero-mean Gaussian prior on voxels.
    #[config(default = "1.0")]
    pub prior_std: f64,
    /// Initial posterior scale for the Gaussian family.
    #[config(default = "0.1")]
    pub init_scale: f64,
    /// Posterior family.
    #[config(default = "PosteriorKind::Gaussian")]
    pub posterior: PosteriorKind,
    /// Kernel shared by the projector and the premultiplier.
    #[config(default = "InterpolationKernel::Linear")]
    pub kernel: InterpolationKernel,
    /// Iterations between progress log lines.
    #[config(default = "50")]
    pub log_interval: usize,
    /// Backend random seed.
    #[config(default = "42")]
    pub seed: u64,
}

impl TrainingConfig {
    /// Check the settings that the forward model cannot check itself.
    pub fn validate(&self) -> error::Result<()> {
        if !(self.noise_std > 0.0 && self.noise_std.is_finite()) {
            return Err(InferenceError::invalid_configuration(format!(
                "training needs a positive finite noise level, got {}",
                self.noise_std
            )));
        }
        if self.batch_size == 0 {
            return Err(InferenceError::invalid_configuration("batch size must be positive"));
        }
        if !(self.learning_rate > 0.0) {
            return Err(InferenceError::invalid_configuration(format!(
                "learning rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if !(self.prior_std > 0.0) || !(self.init_scale > 0.0) {
            return Err(InferenceError::invalid_configuration(
                "prior and initial posterior scales must be positive",
            ));
        }
        if self.kl_weight < 0.0 {
            return Err(InferenceError::invalid_configuration("KL weight must be non-negative"));
        }
        Ok(())
    }
}

/// Configuration for [`crate::dataset::simulate_dataset`].
#[derive(Config, Debug)]
pub struct SimulationConfig {
    /// Number of particle images.
    pub num_images: usize,
    /// Per-channel Fourier noise standard deviation.
    #[config(default = "0.0")]
    pub noise_std: f64,
    /// Largest in-plane shift in pixels along each axis.
    #[config(default = "0.0")]
    pub max_shift: f64,
    /// Kernel used to render the projections.
    #[config(default = "InterpolationKernel::Linear")]
    pub kernel: InterpolationKernel,
    /// Images rendered per forward pass.
    #[config(default = "32")]
    pub chunk_size: usize,
}
