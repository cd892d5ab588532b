//! Real-space density maps.

use burn::tensor::backend::Backend;
use burn::tensor::{ElementConversion, Shape, Tensor, TensorData};

use super::fourier::FourierVolume;
use super::validate_cube;
use crate::error::{CryoError, Result};
use crate::fourier::CenteredDft;
use crate::grid::centered_coordinates;
use crate::projection::VolumePremultiplier;

/// Real-valued cubic density `[D, D, D]` laid out `[z, y, x]`, origin at `D/2`.
#[derive(Debug, Clone)]
pub struct DensityMap<B: Backend> {
    data: Tensor<B, 3>,
}

impl<B: Backend> DensityMap<B> {
    /// Wrap a tensor, checking that it is an even-sided cube.
    pub fn new(data: Tensor<B, 3>) -> Result<Self> {
        validate_cube(data.dims())?;
        Ok(Self { data })
    }

    /// Build a density by evaluating `f(x, y, z)` at centered voxel coordinates.
    pub fn from_fn(
        size: usize,
        device: &B::Device,
        f: impl Fn(f32, f32, f32) -> f32,
    ) -> Result<Self> {
        validate_cube([size, size, size])?;
        let coords = centered_coordinates(size);
        let mut values = Vec::with_capacity(size * size * size);
        for z in &coords {
            for y in &coords {
                for x in &coords {
                    values.push(f(*x, *y, *z));
                }
            }
        }
        Self::new(Tensor::from_data(
            TensorData::new(values, Shape::new([size, size, size])),
            device,
        ))
    }

    /// Point mass at the grid origin.
    pub fn point_source(size: usize, mass: f32, device: &B::Device) -> Result<Self> {
        Self::from_fn(size, device, |x, y, z| {
            if x == 0.0 && y == 0.0 && z == 0.0 {
                mass
            } else {
                0.0
            }
        })
    }

    /// Isotropic Gaussian blob centered at `center` (voxels from the origin).
    pub fn gaussian_blob(
        size: usize,
        center: [f32; 3],
        sigma: f32,
        amplitude: f32,
        device: &B::Device,
    ) -> Result<Self> {
        if !(sigma > 0.0) {
            return Err(CryoError::invalid_configuration(format!(
                "blob width must be positive, got {}",
                sigma
            )));
        }
        let inv = 1.0 / (2.0 * sigma * sigma);
        Self::from_fn(size, device, |x, y, z| {
            let r2 = (x - center[0]).powi(2) + (y - center[1]).powi(2) + (z - center[2]).powi(2);
            amplitude * (-r2 * inv).exp()
        })
    }

    /// Side length.
    pub fn size(&self) -> usize {
        self.data.dims()[0]
    }

    /// Voxel values.
    pub fn tensor(&self) -> &Tensor<B, 3> {
        &self.data
    }

    /// Consume the map, returning the voxel tensor.
    pub fn into_tensor(self) -> Tensor<B, 3> {
        self.data
    }

    /// Total mass (sum of voxel values).
    pub fn mass(&self) -> f64 {
        self.data.clone().sum().into_scalar().elem::<f64>()
    }

    /// Rescale to unit total mass.
    ///
    /// Fails instead of producing NaNs when the mass is zero or not finite.
    pub fn normalize_mass(self) -> Result<Self> {
        let mass = self.mass();
        if !mass.is_finite() || mass.abs() < f64::EPSILON {
            return Err(CryoError::degenerate_volume(format!(
                "cannot normalize a volume with total mass {}",
                mass
            )));
        }
        Ok(Self {
            data: self.data.div_scalar(mass),
        })
    }

    /// Premultiply and transform to a single-entry Fourier volume batch.
    pub fn to_fourier(
        &self,
        dft: &CenteredDft<B>,
        premultiplier: &VolumePremultiplier,
    ) -> Result<FourierVolume<B>> {
        let d = self.size();
        FourierVolume::from_real(self.data.clone().reshape([1, d, d, d]), dft, premultiplier)
    }
}
