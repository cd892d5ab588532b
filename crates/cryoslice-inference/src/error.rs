//! Error types for training and dataset handling.

use cryoslice_core::CryoError;
use thiserror::Error;

/// Main error type for inference workflows.
#[derive(Error, Debug)]
pub enum InferenceError {
    /// Error raised by the forward model.
    #[error(transparent)]
    Model(#[from] CryoError),

    /// Dataset holds no images.
    #[error("Empty dataset: {0}")]
    EmptyDataset(String),

    /// Random-access index beyond the dataset length.
    #[error("Index {index} out of range for dataset of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// Loss or gradient became non-finite.
    #[error("Numerical instability: {0}")]
    NumericalInstability(String),

    /// Invalid training or simulation configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Image buffer does not match the dataset grid.
    #[error("Invalid image: {0}")]
    InvalidImage(String),
}

/// Result type for inference workflows.
pub type Result<T> = std::result::Result<T, InferenceError>;

impl InferenceError {
    /// Create an empty dataset error.
    pub fn empty_dataset(msg: impl Into<String>) -> Self {
        Self::EmptyDataset(msg.into())
    }

    /// Create an out-of-range error.
    pub fn index_out_of_range(index: usize, len: usize) -> Self {
        Self::IndexOutOfRange { index, len }
    }

    /// Create a numerical instability error.
    pub fn numerical_instability(msg: impl Into<String>) -> Self {
        Self::NumericalInstability(msg.into())
    }

    /// Create an invalid configuration error.
    pub fn invalid_configuration(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    /// Create an invalid image error.
    pub fn invalid_image(msg: impl Into<String>) -> Self {
        Self::InvalidImage(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_error_converts() {
        fn fails() -> Result<()> {
            Err(CryoError::invalid_noise("sigma = -1"))?;
            Ok(())
        }
        let err = fails().unwrap_err();
        assert!(matches!(err, InferenceError::Model(CryoError::InvalidNoise(_))));
        assert_eq!(err.to_string(), "Invalid noise level: sigma = -1");
    }

    #[test]
    fn test_index_message() {
        let err = InferenceError::index_out_of_range(7, 3);
        assert_eq!(err.to_string(), "Index 7 out of range for dataset of length 3");
    }
}
