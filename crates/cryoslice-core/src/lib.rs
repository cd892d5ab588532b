//! Differentiable Fourier-slice forward model for cryo-EM.
//!
//! A density's 3-D Fourier transform is sliced through its origin under a
//! pose, shifted in-plane by phase modulation and, optionally, wrapped in a
//! Gaussian noise model. Every operator is batched over burn tensors and
//! differentiable on autodiff backends.

pub mod complex;
pub mod error;
pub mod fourier;
pub mod grid;
pub mod interpolation;
pub mod observation;
pub mod pose;
pub mod projection;
pub mod volume;

pub use complex::ComplexTensor;
pub use error::{CryoError, Result};
pub use fourier::CenteredDft;
pub use interpolation::InterpolationKernel;
pub use observation::{GaussianObservation, Observation, ObservationConfig, ObservationModel};
pub use pose::{PoseBatch, RotationPolicy};
pub use projection::{CentralSliceProjector, RadialMask, TranslationPhaseShifter, VolumePremultiplier};
pub use volume::{DensityMap, FourierVolume};
