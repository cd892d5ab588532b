//! Pose-conditioned observation model.
//!
//! `observe` is a pure function of its inputs: project, shift, and (for a
//! positive noise level) wrap the result in a Gaussian. Nothing is cached
//! between calls.

use burn::config::Config;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use super::gaussian::GaussianObservation;
use crate::complex::ComplexTensor;
use crate::error::{self, CryoError};
use crate::interpolation::InterpolationKernel;
use crate::pose::PoseBatch;
use crate::projection::{CentralSliceProjector, RadialMask, TranslationPhaseShifter};
use crate::volume::FourierVolume;

/// Configuration for [`ObservationModel`].
#[derive(Config, Debug)]
pub struct ObservationConfig {
    /// Grid side length `D` (even).
    pub size: usize,
    /// Per-channel noise standard deviation; 0 makes observations deterministic.
    #[config(default = "0.0")]
    pub noise_std: f64,
    /// Kernel used to sample the Fourier volume.
    #[config(default = "InterpolationKernel::Linear")]
    pub kernel: InterpolationKernel,
}

impl ObservationConfig {
    /// Build the model on `device`.
    pub fn init<B: Backend>(&self, device: &B::Device) -> error::Result<ObservationModel<B>> {
        ObservationModel::new(self.size, self.kernel, self.noise_std, device)
    }
}

/// Result of one forward evaluation.
#[derive(Debug, Clone)]
pub struct Observation<B: Backend> {
    /// Noiseless, phase-shifted Fourier slices `[N, D, D]`.
    pub projection: ComplexTensor<B, 3>,
    /// Noise model around `projection`; `None` when sigma is zero.
    pub distribution: Option<GaussianObservation<B>>,
}

impl<B: Backend> Observation<B> {
    /// A noisy draw, or the projection itself when there is no noise.
    pub fn sample(&self) -> ComplexTensor<B, 3> {
        match &self.distribution {
            Some(dist) => dist.sample(),
            None => self.projection.clone(),
        }
    }
}

/// Projector, phase shifter and noise level for one grid size.
#[derive(Debug, Clone)]
pub struct ObservationModel<B: Backend> {
    noise_std: f64,
    projector: CentralSliceProjector<B>,
    shifter: TranslationPhaseShifter<B>,
    mask: RadialMask,
}

impl<B: Backend> ObservationModel<B> {
    /// Create an observation model.
    ///
    /// # Arguments
    /// * `size` - Grid side length
    /// * `kernel` - Interpolation kernel; volumes must be premultiplied for it
    /// * `noise_std` - Noise standard deviation, `>= 0`
    /// * `device` - Device for the precomputed grids
    pub fn new(
        size: usize,
        kernel: InterpolationKernel,
        noise_std: f64,
        device: &B::Device,
    ) -> error::Result<Self> {
        if !noise_std.is_finite() || noise_std < 0.0 {
            return Err(CryoError::invalid_noise(format!(
                "noise standard deviation must be finite and >= 0, got {}",
                noise_std
            )));
        }
        tracing::debug!(size, ?kernel, noise_std, "building observation model");

        Ok(Self {
            noise_std,
            projector: CentralSliceProjector::new(size, kernel, device)?,
            shifter: TranslationPhaseShifter::new(size, device)?,
            mask: RadialMask::nyquist(size)?,
        })
    }

    /// Grid side length.
    pub fn size(&self) -> usize {
        self.projector.size()
    }

    /// Interpolation kernel.
    pub fn kernel(&self) -> InterpolationKernel {
        self.projector.kernel()
    }

    /// Noise standard deviation.
    pub fn noise_std(&self) -> f64 {
        self.noise_std
    }

    /// Nyquist mask applied to likelihoods.
    pub fn mask(&self) -> &RadialMask {
        &self.mask
    }

    /// Project volume `i` under pose `i`.
    ///
    /// The volume batch must match the pose batch exactly; use
    /// [`FourierVolume::repeat`] to project one volume under many poses.
    pub fn observe(
        &self,
        volume: &FourierVolume<B>,
        poses: &PoseBatch<B>,
    ) -> error::Result<Observation<B>> {
        if volume.batch_size() != poses.len() {
            return Err(CryoError::batch_mismatch(format!(
                "{} volumes for {} poses",
                volume.batch_size(),
                poses.len()
            )));
        }

        let slices = self.projector.project(volume, poses.rotations())?;
        let projection = self.shifter.shift(slices, poses.translations())?;

        let distribution = if self.noise_std > 0.0 {
            Some(GaussianObservation::new(projection.clone(), self.noise_std)?)
        } else {
            None
        };

        Ok(Observation {
            projection,
            distribution,
        })
    }

    /// Masked log-likelihood of `observed` slices under `observation`, `[N]`.
    pub fn log_likelihood(
        &self,
        observation: &Observation<B>,
        observed: &ComplexTensor<B, 3>,
    ) -> error::Result<Tensor<B, 1>> {
        let dist = observation.distribution.as_ref().ok_or_else(|| {
            CryoError::invalid_noise("log-likelihood is undefined for a noiseless observation")
        })?;
        let mask = self.mask.to_tensor::<B>(&observed.device());
        dist.log_prob(observed, Some(&mask))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_negative_noise_rejected() {
        let device = Default::default();
        let err = ObservationModel::<TestBackend>::new(8, InterpolationKernel::Linear, -0.1, &device)
            .unwrap_err();
        assert!(matches!(err, CryoError::InvalidNoise(_)));
    }

    #[test]
    fn test_config_defaults() {
        let config = ObservationConfig::new(16);
        assert_eq!(config.noise_std, 0.0);
        assert_eq!(config.kernel, InterpolationKernel::Linear);
        let config = config.with_noise_std(0.5);
        let device = Default::default();
        let model = config.init::<TestBackend>(&device).unwrap();
        assert_eq!(model.size(), 16);
        assert_eq!(model.noise_std(), 0.5);
    }

    #[test]
    fn test_config_json_round_trip() {
        let config = ObservationConfig::new(8)
            .with_noise_std(0.25)
            .with_kernel(InterpolationKernel::Nearest);
        let json = config.to_string();
        let restored = ObservationConfig::load_binary(json.as_bytes()).unwrap();
        assert_eq!(restored.size, 8);
        assert_eq!(restored.noise_std, 0.25);
        assert_eq!(restored.kernel, InterpolationKernel::Nearest);
    }

    #[test]
    fn test_noiseless_has_no_likelihood() {
        let device = Default::default();
        let model = ObservationModel::<TestBackend>::new(4, InterpolationKernel::Linear, 0.0, &device).unwrap();
        let volume = FourierVolume::new(ComplexTensor::zeros([1, 4, 4, 4], &device)).unwrap();
        let poses = PoseBatch::identity(1, &device);
        let obs = model.observe(&volume, &poses).unwrap();
        assert!(obs.distribution.is_none());
        assert!(model.log_likelihood(&obs, &obs.projection).is_err());
    }

    #[test]
    fn test_volume_pose_mismatch() {
        let device = Default::default();
        let model = ObservationModel::<TestBackend>::new(4, InterpolationKernel::Linear, 1.0, &device).unwrap();
        let volume = FourierVolume::new(ComplexTensor::zeros([1, 4, 4, 4], &device)).unwrap();
        let poses = PoseBatch::identity(3, &device);
        assert!(matches!(
            model.observe(&volume, &poses),
            Err(CryoError::BatchMismatch(_))
        ));
    }
}
