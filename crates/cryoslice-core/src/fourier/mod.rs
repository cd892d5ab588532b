//! Discrete Fourier transforms on centered grids.
//!
//! The transforms are dense and separable, built from tensor matmuls so they
//! stay differentiable on any autodiff backend.

pub mod dft;

pub use dft::CenteredDft;
