//! Observation model: projection, phase shift and Gaussian noise.

pub mod gaussian;
pub mod model;

pub use gaussian::GaussianObservation;
pub use model::{Observation, ObservationConfig, ObservationModel};
