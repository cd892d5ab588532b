//! Interpolation of complex Fourier volumes at continuous coordinates.
//!
//! Samplers zero-pad: any kernel tap that falls outside the volume contributes
//! nothing. Inside the Nyquist disk used for likelihoods every tap is in
//! bounds, so the padding rule only affects coefficients that are masked out.

pub mod kernel;
pub mod linear;
pub mod nearest;
pub mod trait_;

pub use kernel::InterpolationKernel;
pub use linear::LinearSampler;
pub use nearest::NearestSampler;
pub use trait_::SliceSampler;
