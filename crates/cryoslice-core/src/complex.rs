//! Complex-valued tensors as paired real/imaginary channels.
//!
//! Burn has no complex element type, so every Fourier-domain quantity is
//! carried as two float tensors of identical shape. All arithmetic here is
//! built from differentiable float ops.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// A complex tensor stored as separate real and imaginary parts.
#[derive(Debug, Clone)]
pub struct ComplexTensor<B: Backend, const D: usize> {
    /// Real channel.
    pub re: Tensor<B, D>,
    /// Imaginary channel.
    pub im: Tensor<B, D>,
}

impl<B: Backend, const D: usize> ComplexTensor<B, D> {
    /// Pair two channels. Both must have the same shape.
    pub fn new(re: Tensor<B, D>, im: Tensor<B, D>) -> Self {
        debug_assert_eq!(re.dims(), im.dims(), "real and imaginary shapes differ");
        Self { re, im }
    }

    /// Lift a real tensor (zero imaginary part).
    pub fn from_real(re: Tensor<B, D>) -> Self {
        let im = re.zeros_like();
        Self { re, im }
    }

    /// All-zero complex tensor.
    pub fn zeros(shape: [usize; D], device: &B::Device) -> Self {
        Self {
            re: Tensor::zeros(shape, device),
            im: Tensor::zeros(shape, device),
        }
    }

    /// Shape shared by both channels.
    pub fn dims(&self) -> [usize; D] {
        self.re.dims()
    }

    /// Device of the underlying channels.
    pub fn device(&self) -> B::Device {
        self.re.device()
    }

    /// Complex product `self * other`.
    pub fn mul(self, other: Self) -> Self {
        let re = self.re.clone() * other.re.clone() - self.im.clone() * other.im.clone();
        let im = self.re * other.im + self.im * other.re;
        Self { re, im }
    }

    /// Multiply by a unit phasor `exp(i * phase)`.
    pub fn rotate_phase(self, phase: Tensor<B, D>) -> Self {
        let c = phase.clone().cos();
        let s = phase.sin();
        self.mul(Self::new(c, s))
    }

    /// Multiply both channels by a real tensor (broadcast where the shape allows).
    pub fn mul_real(self, factor: Tensor<B, D>) -> Self {
        Self {
            re: self.re * factor.clone(),
            im: self.im * factor,
        }
    }

    /// Multiply both channels by a scalar.
    pub fn mul_scalar(self, factor: f64) -> Self {
        Self {
            re: self.re.mul_scalar(factor),
            im: self.im.mul_scalar(factor),
        }
    }

    /// Squared magnitude `re^2 + im^2`.
    pub fn abs_squared(self) -> Tensor<B, D> {
        self.re.powf_scalar(2.0) + self.im.powf_scalar(2.0)
    }

    /// Magnitude.
    pub fn abs(self) -> Tensor<B, D> {
        self.abs_squared().sqrt()
    }

    /// Reshape both channels.
    pub fn reshape<const D2: usize>(self, shape: [usize; D2]) -> ComplexTensor<B, D2> {
        ComplexTensor {
            re: self.re.reshape(shape),
            im: self.im.reshape(shape),
        }
    }

    /// Swap two dimensions of both channels.
    pub fn swap_dims(self, dim1: usize, dim2: usize) -> Self {
        Self {
            re: self.re.swap_dims(dim1, dim2),
            im: self.im.swap_dims(dim1, dim2),
        }
    }

    /// Narrow both channels along one dimension.
    pub fn narrow(self, dim: usize, start: usize, length: usize) -> Self {
        Self {
            re: self.re.narrow(dim, start, length),
            im: self.im.narrow(dim, start, length),
        }
    }
}

impl<B: Backend, const D: usize> std::ops::Add for ComplexTensor<B, D> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            re: self.re + rhs.re,
            im: self.im + rhs.im,
        }
    }
}

impl<B: Backend, const D: usize> std::ops::Sub for ComplexTensor<B, D> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self {
            re: self.re - rhs.re,
            im: self.im - rhs.im,
        }
    }
}
