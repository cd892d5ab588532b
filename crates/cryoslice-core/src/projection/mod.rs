//! Fourier-slice projection operators.

pub mod central_slice;
pub mod mask;
pub mod phase_shift;
pub mod premultiply;

pub use central_slice::CentralSliceProjector;
pub use mask::RadialMask;
pub use phase_shift::TranslationPhaseShifter;
pub use premultiply::VolumePremultiplier;
