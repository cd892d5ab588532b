//! Particle image datasets, simulation and batch loading.
//!
//! Images are stored in real space with Euler angles in degrees, the way
//! particle metadata is usually written. [`load_batch`] is the boundary where
//! angles become radians and images move to the Fourier domain.

use burn::tensor::backend::Backend;
use burn::tensor::{Distribution, Shape, Tensor, TensorData};
use cryoslice_core::complex::ComplexTensor;
use cryoslice_core::error::validate_grid_size;
use cryoslice_core::pose::validation::rotations_to_host;
use cryoslice_core::pose::{matrix_to_euler, uniform_rotations, uniform_translations};
use cryoslice_core::{CenteredDft, DensityMap, ObservationModel, PoseBatch, VolumePremultiplier};

use crate::config::SimulationConfig;
use crate::error::{InferenceError, Result};

/// One particle image with its pose metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleImage {
    /// Real-space pixels `[D * D]`, row-major `[y, x]`.
    pub pixels: Vec<f32>,
    /// ZYZ Euler angles `(rot, tilt, psi)` in degrees.
    pub angles_deg: [f32; 3],
    /// In-plane shift `(tx, ty)` in pixels.
    pub shift: [f32; 2],
}

/// Random-access collection of particle images on a common grid.
pub trait ProjectionDataset {
    /// Number of images.
    fn len(&self) -> usize;

    /// Grid side length `D`.
    fn image_size(&self) -> usize;

    /// Fetch image `index`.
    fn get(&self, index: usize) -> Result<ParticleImage>;

    /// Whether the dataset holds no images.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Dataset held entirely in host memory.
#[derive(Debug, Clone)]
pub struct InMemoryDataset {
    size: usize,
    images: Vec<ParticleImage>,
}

impl InMemoryDataset {
    /// Empty dataset on a `size x size` grid.
    pub fn new(size: usize) -> Result<Self> {
        validate_grid_size(size)?;
        Ok(Self {
            size,
            images: Vec::new(),
        })
    }

    /// Build from a list of images, checking every buffer length.
    pub fn from_images(size: usize, images: Vec<ParticleImage>) -> Result<Self> {
        let mut dataset = Self::new(size)?;
        for image in images {
            dataset.push(image)?;
        }
        Ok(dataset)
    }

    /// Append one image.
    pub fn push(&mut self, image: ParticleImage) -> Result<()> {
        let expected = self.size * self.size;
        if image.pixels.len() != expected {
            return Err(InferenceError::invalid_image(format!(
                "expected {} pixels, got {}",
                expected,
                image.pixels.len()
            )));
        }
        if image.angles_deg.iter().chain(image.shift.iter()).any(|v| !v.is_finite()) {
            return Err(InferenceError::invalid_image("pose metadata must be finite"));
        }
        self.images.push(image);
        Ok(())
    }
}

impl ProjectionDataset for InMemoryDataset {
    fn len(&self) -> usize {
        self.images.len()
    }

    fn image_size(&self) -> usize {
        self.size
    }

    fn get(&self, index: usize) -> Result<ParticleImage> {
        self.images
            .get(index)
            .cloned()
            .ok_or_else(|| InferenceError::index_out_of_range(index, self.images.len()))
    }
}

/// A batch ready for the observation model.
#[derive(Debug, Clone)]
pub struct ParticleBatch<B: Backend> {
    /// Poses in radians.
    pub poses: PoseBatch<B>,
    /// Centered Fourier transforms of the images `[N, D, D]`.
    pub images: ComplexTensor<B, 3>,
    /// Dataset indices the batch was drawn from.
    pub indices: Vec<usize>,
}

impl<B: Backend> ParticleBatch<B> {
    /// Number of images.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Whether the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Gather `indices` from `dataset` and convert them for the forward model.
pub fn load_batch<B, S>(
    dataset: &S,
    indices: &[usize],
    dft: &CenteredDft<B>,
    device: &B::Device,
) -> Result<ParticleBatch<B>>
where
    B: Backend,
    S: ProjectionDataset + ?Sized,
{
    if indices.is_empty() {
        return Err(InferenceError::invalid_configuration("cannot load an empty batch"));
    }
    let d = dataset.image_size();
    if d != dft.size() {
        return Err(InferenceError::invalid_configuration(format!(
            "dataset grid {} does not match transform size {}",
            d,
            dft.size()
        )));
    }

    let n = indices.len();
    let mut pixels = Vec::with_capacity(n * d * d);
    let mut angles = Vec::with_capacity(n * 3);
    let mut shifts = Vec::with_capacity(n * 2);
    for &index in indices {
        let image = dataset.get(index)?;
        pixels.extend_from_slice(&image.pixels);
        angles.extend_from_slice(&image.angles_deg);
        shifts.extend_from_slice(&image.shift);
    }

    let angles = Tensor::from_data(TensorData::new(angles, Shape::new([n, 3])), device);
    let shifts = Tensor::from_data(TensorData::new(shifts, Shape::new([n, 2])), device);
    let pixels = Tensor::from_data(TensorData::new(pixels, Shape::new([n, d, d])), device);

    Ok(ParticleBatch {
        poses: PoseBatch::from_euler_degrees(angles, shifts)?,
        images: dft.forward_2d_real(pixels)?,
        indices: indices.to_vec(),
    })
}

/// Draw `batch_size` indices uniformly (with replacement) using the backend RNG.
pub fn sample_indices<B: Backend>(
    len: usize,
    batch_size: usize,
    device: &B::Device,
) -> Result<Vec<usize>> {
    if len == 0 {
        return Err(InferenceError::empty_dataset("cannot sample from an empty dataset"));
    }
    let draws = Tensor::<B, 1>::random([batch_size], Distribution::Uniform(0.0, len as f64), device);
    Ok(to_host(draws)?
        .into_iter()
        .map(|u| (u.max(0.0) as usize).min(len - 1))
        .collect())
}

/// Render `config.num_images` noisy projections of `density` under random poses.
///
/// Noise is added in real space, scaled so that after [`load_batch`] each
/// channel of every retained Fourier coefficient has variance
/// `config.noise_std^2`, the level the observation model's likelihood assumes.
pub fn simulate_dataset<B: Backend>(
    density: &DensityMap<B>,
    config: &SimulationConfig,
    device: &B::Device,
) -> Result<InMemoryDataset> {
    if config.num_images == 0 {
        return Err(InferenceError::empty_dataset("simulation asked for zero images"));
    }
    if config.chunk_size == 0 {
        return Err(InferenceError::invalid_configuration("chunk size must be positive"));
    }

    let d = density.size();
    let dft = CenteredDft::<B>::new(d, device)?;
    let premultiplier = VolumePremultiplier::new(config.kernel, d)?;
    let volume = density.to_fourier(&dft, &premultiplier)?;
    let model = ObservationModel::<B>::new(d, config.kernel, config.noise_std, device)?;

    // Real white noise of variance s^2 per pixel puts D^2 s^2 / 2 on each
    // channel of every non-self-conjugate Fourier coefficient.
    let pixel_std = config.noise_std * std::f64::consts::SQRT_2 / d as f64;

    let mut dataset = InMemoryDataset::new(d)?;
    let mut remaining = config.num_images;
    while remaining > 0 {
        let n = remaining.min(config.chunk_size);

        let angles_deg: Vec<f32> = rotations_to_host(&uniform_rotations::<B>(n, device))?
            .iter()
            .flat_map(|m| matrix_to_euler(m).map(|a| a.to_degrees() as f32))
            .collect();
        let shifts = uniform_translations::<B>(n, config.max_shift, device);
        let shift_values = to_host(shifts.clone())?;

        let angles = Tensor::from_data(
            TensorData::new(angles_deg.clone(), Shape::new([n, 3])),
            device,
        );
        let poses = PoseBatch::from_euler_degrees(angles, shifts)?;
        let observation = model.observe(&volume.repeat(n)?, &poses)?;
        let mut images = dft.inverse_2d(observation.projection)?.re;
        if pixel_std > 0.0 {
            images = images + Tensor::random([n, d, d], Distribution::Normal(0.0, pixel_std), device);
        }
        let pixels = to_host(images)?;

        for i in 0..n {
            dataset.push(ParticleImage {
                pixels: pixels[i * d * d..(i + 1) * d * d].to_vec(),
                angles_deg: [angles_deg[3 * i], angles_deg[3 * i + 1], angles_deg[3 * i + 2]],
                shift: [shift_values[2 * i], shift_values[2 * i + 1]],
            })?;
        }
        remaining -= n;
    }

    tracing::info!(
        images = dataset.len(),
        size = d,
        noise_std = config.noise_std,
        "simulated particle dataset"
    );
    Ok(dataset)
}

fn to_host<B: Backend, const D: usize>(tensor: Tensor<B, D>) -> Result<Vec<f32>> {
    tensor
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| InferenceError::invalid_image(format!("cannot read tensor data: {:?}", e)))
}
