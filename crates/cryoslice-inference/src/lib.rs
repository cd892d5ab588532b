//! Variational recovery of cryo-EM densities.
//!
//! Fits a posterior over the real-space density to a stack of particle images
//! by maximizing the evidence lower bound through the differentiable
//! observation model in `cryoslice-core`.

pub mod config;
pub mod dataset;
pub mod error;
pub mod loss;
pub mod optimizer;
pub mod posterior;
pub mod progress;
pub mod trainer;

pub use config::{SimulationConfig, TrainingConfig};
pub use dataset::{
    load_batch, sample_indices, simulate_dataset, InMemoryDataset, ParticleBatch, ParticleImage,
    ProjectionDataset,
};
pub use error::{InferenceError, Result};
pub use loss::{ElboLoss, ElboTerms};
pub use optimizer::{AdamOptimizer, Optimizer};
pub use posterior::{GaussianPosterior, PointMassPosterior, PosteriorKind, VolumePosterior};
pub use progress::{
    ConsoleProgressCallback, EarlyStoppingCallback, HistoryCallback, ProgressCallback,
    ProgressInfo, ProgressTracker,
};
pub use trainer::{Trainer, TrainingOutput};
