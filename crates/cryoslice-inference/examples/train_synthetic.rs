//! Simulate particle images of a two-blob phantom and recover the density.
//!
//! ```text
//! RUST_LOG=info cargo run -p cryoslice-inference --example train_synthetic -- --size 16
//! ```

use std::sync::Arc;

use anyhow::Result;
use burn::backend::Autodiff;
use burn::config::Config;
use burn::tensor::backend::Backend;
use burn::tensor::{ElementConversion, Tensor};
use burn_ndarray::NdArray;
use clap::Parser;
use cryoslice_core::DensityMap;
use cryoslice_inference::{
    simulate_dataset, GaussianPosterior, HistoryCallback, PointMassPosterior, PosteriorKind,
    SimulationConfig, Trainer, TrainingConfig, VolumePosterior,
};
use tracing::info;

type TrainBackend = Autodiff<NdArray<f32>>;

#[derive(Parser, Debug)]
#[command(about = "Fit a volume posterior to simulated cryo-EM projections")]
struct Args {
    /// Grid side length (even)
    #[arg(long, default_value_t = 16)]
    size: usize,

    /// Number of simulated particle images
    #[arg(long, default_value_t = 256)]
    images: usize,

    /// Fourier-domain noise standard deviation
    #[arg(long, default_value_t = 0.5)]
    noise: f64,

    /// Optimizer steps
    #[arg(long, default_value_t = 300)]
    iterations: usize,

    /// Fit a point estimate instead of a Gaussian posterior
    #[arg(long)]
    map: bool,

    /// Write the training configuration to this JSON file
    #[arg(long)]
    save_config: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let device = Default::default();
    let d = args.size;

    // Two blobs of unequal mass so that the handedness is recoverable.
    let offset = d as f32 / 6.0;
    let phantom = DensityMap::<TrainBackend>::from_fn(d, &device, |x, y, z| {
        let a = ((x - offset).powi(2) + y.powi(2) + z.powi(2)) / 2.0;
        let b = ((x + offset).powi(2) + (y - offset).powi(2) + z.powi(2)) / 4.5;
        (-a).exp() + 0.5 * (-b).exp()
    })?;

    let simulation = SimulationConfig::new(args.images).with_noise_std(args.noise);
    let dataset = simulate_dataset(&phantom, &simulation, &device)?;

    let posterior_kind = if args.map {
        PosteriorKind::PointMass
    } else {
        PosteriorKind::Gaussian
    };
    let config = TrainingConfig::new(d, args.noise.max(1e-3))
        .with_num_iterations(args.iterations)
        .with_posterior(posterior_kind);
    if let Some(path) = &args.save_config {
        config.save(path)?;
        info!("Saved training configuration to {}", path);
    }

    let history = Arc::new(HistoryCallback::new());
    let trainer = Trainer::<TrainBackend>::new(config.clone(), &device)?.with_callback(history.clone());

    let estimate = match config.posterior {
        PosteriorKind::Gaussian => {
            let posterior = GaussianPosterior::new(d, config.prior_std, config.init_scale, &device)?;
            trainer.fit(posterior, &dataset)?.posterior.mean()
        }
        PosteriorKind::PointMass => {
            let posterior = PointMassPosterior::new(d, config.prior_std, &device)?;
            trainer.fit(posterior, &dataset)?.posterior.mean()
        }
    };

    let error = relative_error(estimate, phantom.into_tensor());
    let losses = history.losses();
    info!(
        "Loss {:.3} -> {:.3} over {} iterations, relative density error {:.3}",
        losses.first().copied().unwrap_or(f64::NAN),
        losses.last().copied().unwrap_or(f64::NAN),
        losses.len(),
        error
    );
    Ok(())
}

fn relative_error<B: Backend>(estimate: Tensor<B, 3>, truth: Tensor<B, 3>) -> f64 {
    let residual: f64 = (estimate - truth.clone()).powf_scalar(2.0).sum().into_scalar().elem();
    let norm: f64 = truth.powf_scalar(2.0).sum().into_scalar().elem();
    (residual / norm).sqrt()
}
