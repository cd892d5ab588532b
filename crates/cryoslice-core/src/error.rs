//! Error types for forward-model operations.
//!
//! Numerical operators in this crate are infallible once their inputs are
//! validated; every fallible entry point funnels through [`CryoError`].

use thiserror::Error;

/// Main error type for forward-model operations.
#[derive(Error, Debug)]
pub enum CryoError {
    /// Grid is not cubic, not even-sized, or empty.
    #[error("Invalid grid: {0}")]
    InvalidGrid(String),

    /// Rotation matrix failed the orthonormality check.
    #[error("Invalid rotation: {0}")]
    InvalidRotation(String),

    /// Noise level is negative or not finite.
    #[error("Invalid noise level: {0}")]
    InvalidNoise(String),

    /// Volume cannot be normalized (zero or non-finite mass).
    #[error("Degenerate volume: {0}")]
    DegenerateVolume(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Batch sizes of two inputs disagree.
    #[error("Batch mismatch: {0}")]
    BatchMismatch(String),

    /// Shape mismatch.
    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },
}

/// Result type for forward-model operations.
pub type Result<T> = std::result::Result<T, CryoError>;

impl CryoError {
    /// Create an invalid grid error.
    pub fn invalid_grid(msg: impl Into<String>) -> Self {
        Self::InvalidGrid(msg.into())
    }

    /// Create an invalid rotation error.
    pub fn invalid_rotation(msg: impl Into<String>) -> Self {
        Self::InvalidRotation(msg.into())
    }

    /// Create an invalid noise error.
    pub fn invalid_noise(msg: impl Into<String>) -> Self {
        Self::InvalidNoise(msg.into())
    }

    /// Create a degenerate volume error.
    pub fn degenerate_volume(msg: impl Into<String>) -> Self {
        Self::DegenerateVolume(msg.into())
    }

    /// Create an invalid configuration error.
    pub fn invalid_configuration(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    /// Create a batch mismatch error.
    pub fn batch_mismatch(msg: impl Into<String>) -> Self {
        Self::BatchMismatch(msg.into())
    }

    /// Create a shape mismatch error from any pair of dimension lists.
    pub fn shape_mismatch(expected: &[usize], actual: &[usize]) -> Self {
        Self::ShapeMismatch {
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        }
    }
}

/// Check that a grid side length is usable by the centered Fourier conventions.
pub fn validate_grid_size(size: usize) -> Result<()> {
    if size == 0 {
        return Err(CryoError::invalid_grid("grid size must be positive"));
    }
    if size % 2 != 0 {
        return Err(CryoError::invalid_grid(format!(
            "grid size must be even so the origin sits at index size/2, got {}",
            size
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = CryoError::invalid_noise("sigma = -1");
        assert!(matches!(err, CryoError::InvalidNoise(_)));
    }

    #[test]
    fn test_error_display() {
        let err = CryoError::degenerate_volume("zero mass");
        assert_eq!(err.to_string(), "Degenerate volume: zero mass");
    }

    #[test]
    fn test_shape_mismatch() {
        let err = CryoError::shape_mismatch(&[4, 32, 32], &[3, 32, 32]);
        let err_str = err.to_string();
        assert!(err_str.contains("expected [4, 32, 32]"));
        assert!(err_str.contains("got [3, 32, 32]"));
    }

    #[test]
    fn test_grid_size_validation() {
        assert!(validate_grid_size(64).is_ok());
        assert!(matches!(validate_grid_size(0), Err(CryoError::InvalidGrid(_))));
        assert!(matches!(validate_grid_size(33), Err(CryoError::InvalidGrid(_))));
    }
}
