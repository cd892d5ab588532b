//! Interpolation kernel selection.
//!
//! The kernel fixes both how the projector samples the Fourier volume and how
//! the real-space volume must be premultiplied beforehand. Interpolating in
//! Fourier space with kernel `k` multiplies real space by the continuous
//! transform `K_hat`, so the premultiplier divides by it.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use serde::{Deserialize, Serialize};

use super::linear::LinearSampler;
use super::nearest::NearestSampler;
use super::trait_::SliceSampler;
use crate::complex::ComplexTensor;

/// Finite-support interpolation kernels available to the projector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum InterpolationKernel {
    /// Box kernel, support radius 1/2. Not differentiable w.r.t. coordinates.
    Nearest,
    /// Triangle kernel (trilinear), support radius 1.
    #[default]
    Linear,
}

impl InterpolationKernel {
    /// Half-width of the kernel in voxels.
    pub fn support_radius(&self) -> f64 {
        match self {
            Self::Nearest => 0.5,
            Self::Linear => 1.0,
        }
    }

    /// Continuous Fourier transform of the kernel at normalized frequency
    /// `f` (cycles per voxel).
    pub fn fourier_response(&self, f: f64) -> f64 {
        match self {
            Self::Nearest => sinc(f),
            Self::Linear => sinc(f).powi(2),
        }
    }
}

impl<B: Backend> SliceSampler<B> for InterpolationKernel {
    fn sample(&self, volumes: &ComplexTensor<B, 4>, coords: Tensor<B, 3>) -> ComplexTensor<B, 2> {
        match self {
            Self::Nearest => NearestSampler::new().sample(volumes, coords),
            Self::Linear => LinearSampler::new().sample(volumes, coords),
        }
    }
}

/// Normalized sinc, `sin(pi x) / (pi x)`.
pub fn sinc(x: f64) -> f64 {
    if x.abs() < 1e-12 {
        1.0
    } else {
        let px = std::f64::consts::PI * x;
        px.sin() / px
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sinc() {
        assert_eq!(sinc(0.0), 1.0);
        assert!(sinc(1.0).abs() < 1e-12);
        assert!((sinc(0.5) - 2.0 / std::f64::consts::PI).abs() < 1e-12);
    }

    #[test]
    fn test_linear_response_is_sinc_squared() {
        let k = InterpolationKernel::Linear;
        assert!((k.fourier_response(0.25) - sinc(0.25).powi(2)).abs() < 1e-12);
        assert_eq!(k.support_radius(), 1.0);
    }

    #[test]
    fn test_default_kernel_is_linear() {
        assert_eq!(InterpolationKernel::default(), InterpolationKernel::Linear);
    }
}
