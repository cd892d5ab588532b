//! Densities in real space and their Fourier transforms.

pub mod density;
pub mod fourier;

pub use density::DensityMap;
pub use fourier::FourierVolume;

use crate::error::{validate_grid_size, CryoError, Result};

/// Check that trailing dimensions form an even-sided cube.
pub(crate) fn validate_cube(dims: [usize; 3]) -> Result<usize> {
    let [d0, d1, d2] = dims;
    if d0 != d1 || d1 != d2 {
        return Err(CryoError::invalid_grid(format!(
            "volume must be cubic, got {}x{}x{}",
            d0, d1, d2
        )));
    }
    validate_grid_size(d0)?;
    Ok(d0)
}
