//! Radial frequency mask.
//!
//! Coefficients beyond the Nyquist radius cannot be represented by the grid
//! sampling and are excluded from every likelihood. With radius `r` the mask
//! keeps `u^2 + v^2 <= (r - 1)^2`; at the default `r = D/2` this is the
//! largest disk whose trilinear taps all stay inside the volume.

use burn::tensor::backend::Backend;
use burn::tensor::{Shape, Tensor, TensorData};

use crate::complex::ComplexTensor;
use crate::error::{validate_grid_size, CryoError, Result};
use crate::grid::radial_distance_squared;

/// Binary disk mask over a centered `[D, D]` Fourier plane.
#[derive(Debug, Clone)]
pub struct RadialMask {
    size: usize,
    radius: usize,
    values: Vec<f32>,
}

impl RadialMask {
    /// Mask of radius `radius` on a `size x size` plane.
    pub fn new(size: usize, radius: usize) -> Result<Self> {
        validate_grid_size(size)?;
        if radius == 0 {
            return Err(CryoError::invalid_configuration("mask radius must be positive"));
        }
        let limit = ((radius - 1) * (radius - 1)) as f32;
        let values = radial_distance_squared(size)
            .into_iter()
            .map(|r2| if r2 <= limit { 1.0 } else { 0.0 })
            .collect();
        Ok(Self {
            size,
            radius,
            values,
        })
    }

    /// Mask at the Nyquist radius `size / 2`.
    pub fn nyquist(size: usize) -> Result<Self> {
        Self::new(size, size / 2)
    }

    /// Side length.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Radius the mask was built with.
    pub fn radius(&self) -> usize {
        self.radius
    }

    /// Mask values, row-major `[v, u]`.
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Number of retained coefficients.
    pub fn count(&self) -> usize {
        self.values.iter().filter(|&&v| v > 0.0).count()
    }

    /// Mask as a tensor `[D, D]`.
    pub fn to_tensor<B: Backend>(&self, device: &B::Device) -> Tensor<B, 2> {
        Tensor::from_data(
            TensorData::new(self.values.clone(), Shape::new([self.size, self.size])),
            device,
        )
    }

    /// Zero all coefficients outside the disk.
    pub fn apply<B: Backend>(&self, slices: ComplexTensor<B, 3>) -> Result<ComplexTensor<B, 3>> {
        let [n, h, w] = slices.dims();
        if h != self.size || w != self.size {
            return Err(CryoError::shape_mismatch(&[n, self.size, self.size], &[n, h, w]));
        }
        let mask = self
            .to_tensor::<B>(&slices.device())
            .reshape([1, h, w])
            .expand([n, h, w]);
        Ok(slices.mul_real(mask))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_mask() {
        let mask = RadialMask::new(4, 2).unwrap();
        // Only (0,0) and its four neighbours satisfy r^2 <= 1
        assert_eq!(mask.count(), 5);
        assert_eq!(mask.values()[2 * 4 + 2], 1.0);
        assert_eq!(mask.values()[0], 0.0);
    }

    #[test]
    fn test_zero_radius_rejected() {
        assert!(RadialMask::new(8, 0).is_err());
    }
}
