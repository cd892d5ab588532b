//! Variational families over the latent density.
//!
//! Every family implements [`VolumePosterior`], so the trainer and the
//! observation model stay agnostic of which one is being fitted.

pub mod gaussian;
pub mod point_mass;
pub mod trait_;

pub use gaussian::GaussianPosterior;
pub use point_mass::PointMassPosterior;
pub use trait_::VolumePosterior;

use serde::{Deserialize, Serialize};

/// Tag naming a posterior family, used in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PosteriorKind {
    /// Mean-field Gaussian over voxels.
    #[default]
    Gaussian,
    /// Single point estimate (MAP).
    PointMass,
}

impl std::fmt::Display for PosteriorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gaussian => write!(f, "gaussian"),
            Self::PointMass => write!(f, "point-mass"),
        }
    }
}
