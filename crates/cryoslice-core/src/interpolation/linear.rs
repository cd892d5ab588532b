//! Trilinear sampling with zero padding.

use burn::tensor::backend::Backend;
use burn::tensor::{Int, Tensor};

use super::trait_::SliceSampler;
use crate::complex::ComplexTensor;

/// Trilinear sampler.
///
/// Each corner of the enclosing voxel cell contributes only if it lies inside
/// the volume; corners outside read as zero. Weights are differentiable with
/// respect to the coordinates, so gradients reach the rotation that produced
/// them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearSampler;

impl LinearSampler {
    /// Create a new linear sampler.
    pub fn new() -> Self {
        Self
    }
}

impl<B: Backend> SliceSampler<B> for LinearSampler {
    fn sample(&self, volumes: &ComplexTensor<B, 4>, coords: Tensor<B, 3>) -> ComplexTensor<B, 2> {
        let [n, d0, d1, d2] = volumes.dims(); // [N, Z, Y, X]
        let [_, p, _] = coords.dims();
        let flat = FlatVolumes::new(volumes, p);

        let coords = coords.reshape([n * p, 3]);
        let x = coords.clone().narrow(1, 0, 1).squeeze::<1>(1);
        let y = coords.clone().narrow(1, 1, 1).squeeze::<1>(1);
        let z = coords.narrow(1, 2, 1).squeeze::<1>(1);

        let x_taps = axis_taps(x, d2);
        let y_taps = axis_taps(y, d1);
        let z_taps = axis_taps(z, d0);

        let stride_z = (d1 * d2) as i32;
        let stride_y = d2 as i32;

        let mut acc: Option<ComplexTensor<B, 1>> = None;
        for (zi, wz) in &z_taps {
            for (yi, wy) in &y_taps {
                for (xi, wx) in &x_taps {
                    let idx = zi.clone() * stride_z + yi.clone() * stride_y + xi.clone();
                    let weight = wz.clone() * wy.clone() * wx.clone();
                    let value = flat.gather(idx).mul_real(weight);
                    acc = Some(match acc {
                        Some(sum) => sum + value,
                        None => value,
                    });
                }
            }
        }

        // 8 taps always produce a value
        let acc = acc.unwrap_or_else(|| ComplexTensor::zeros([n * p], &flat.device()));
        acc.reshape([n, p])
    }
}

/// Lower and upper taps along one axis: clamped indices paired with their
/// linear weights, zeroed where the tap is out of bounds.
fn axis_taps<B: Backend>(coord: Tensor<B, 1>, len: usize) -> [(Tensor<B, 1, Int>, Tensor<B, 1>); 2] {
    let lo = coord.clone().floor();
    let frac = coord - lo.clone();
    let hi = lo.clone() + 1.0;

    let lo_weight = (frac.ones_like() - frac.clone()) * in_bounds(&lo, len);
    let hi_weight = frac * in_bounds(&hi, len);

    let max = (len - 1) as f64;
    [
        (lo.clamp(0.0, max).int(), lo_weight),
        (hi.clamp(0.0, max).int(), hi_weight),
    ]
}

/// 1.0 where `index` lies in `[0, len - 1]`, else 0.0.
pub(crate) fn in_bounds<B: Backend>(index: &Tensor<B, 1>, len: usize) -> Tensor<B, 1> {
    let lower = index.clone().greater_equal_elem(0.0).float();
    let upper = index.clone().lower_equal_elem((len - 1) as f64).float();
    lower * upper
}

/// Volume batch flattened to one axis, with per-point batch offsets.
pub(crate) struct FlatVolumes<B: Backend> {
    data: ComplexTensor<B, 1>,
    offsets: Tensor<B, 1, Int>,
}

impl<B: Backend> FlatVolumes<B> {
    /// Flatten `[N, Z, Y, X]` volumes for `points_per_volume` lookups each.
    pub(crate) fn new(volumes: &ComplexTensor<B, 4>, points_per_volume: usize) -> Self {
        let [n, d0, d1, d2] = volumes.dims();
        let voxels = d0 * d1 * d2;
        let device = volumes.device();

        let offsets = (Tensor::<B, 1, Int>::arange(0..n as i64, &device) * voxels as i32)
            .reshape([n, 1])
            .expand([n, points_per_volume])
            .reshape([n * points_per_volume]);

        Self {
            data: volumes.clone().reshape([n * voxels]),
            offsets,
        }
    }

    /// Gather one value per point; `local` indexes within the point's volume.
    pub(crate) fn gather(&self, local: Tensor<B, 1, Int>) -> ComplexTensor<B, 1> {
        let idx = local + self.offsets.clone();
        ComplexTensor::new(
            self.data.re.clone().gather(0, idx.clone()),
            self.data.im.clone().gather(0, idx),
        )
    }

    pub(crate) fn device(&self) -> B::Device {
        self.data.device()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::tensor::{Shape, TensorData};
    use burn_ndarray::NdArray;

    type TestBackend = NdArray<f32>;

    fn cube(device: &<TestBackend as Backend>::Device) -> ComplexTensor<TestBackend, 4> {
        // Shape [N=1, Z=2, Y=2, X=2], value = 100 z + 10 y + x, imaginary = -real
        let values = vec![0.0, 1.0, 10.0, 11.0, 100.0, 101.0, 110.0, 111.0];
        let re = Tensor::<TestBackend, 4>::from_data(
            TensorData::new(values, Shape::new([1, 2, 2, 2])),
            device,
        );
        ComplexTensor::new(re.clone(), re.neg())
    }

    #[test]
    fn test_grid_points_are_exact() {
        let device = Default::default();
        let volumes = cube(&device);
        let coords = Tensor::<TestBackend, 3>::from_floats(
            [[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 1.0]]],
            &device,
        );
        let out = LinearSampler::new().sample(&volumes, coords);
        let re = out.re.into_data().to_vec::<f32>().unwrap();
        let im = out.im.into_data().to_vec::<f32>().unwrap();
        assert_eq!(re, vec![0.0, 1.0, 10.0, 111.0]);
        assert_eq!(im, vec![0.0, -1.0, -10.0, -111.0]);
    }

    #[test]
    fn test_cell_center_is_average() {
        let device = Default::default();
        let volumes = cube(&device);
        let coords = Tensor::<TestBackend, 3>::from_floats([[[0.5, 0.5, 0.5]]], &device);
        let out = LinearSampler::new().sample(&volumes, coords);
        let expected = (0.0 + 1.0 + 10.0 + 11.0 + 100.0 + 101.0 + 110.0 + 111.0) / 8.0;
        assert!((out.re.into_scalar() - expected).abs() < 1e-4);
    }

    #[test]
    fn test_outside_reads_zero() {
        let device = Default::default();
        let volumes = cube(&device);
        let coords = Tensor::<TestBackend, 3>::from_floats(
            [[[-1.0, 0.0, 0.0], [5.0, 5.0, 5.0], [1.5, 1.0, 1.0]]],
            &device,
        );
        let out = LinearSampler::new().sample(&volumes, coords);
        let re = out.re.into_data().to_vec::<f32>().unwrap();
        assert_eq!(re[0], 0.0);
        assert_eq!(re[1], 0.0);
        // Half of the weight falls outside: 0.5 * 111
        assert!((re[2] - 55.5).abs() < 1e-4);
    }

    #[test]
    fn test_batches_read_their_own_volume() {
        let device = Default::default();
        let first = Tensor::<TestBackend, 4>::ones([1, 2, 2, 2], &device);
        let second = first.clone().mul_scalar(3.0);
        let re = Tensor::cat(vec![first, second], 0);
        let volumes = ComplexTensor::from_real(re);
        let coords = Tensor::<TestBackend, 3>::from_floats(
            [[[0.5, 0.5, 0.5]], [[0.5, 0.5, 0.5]]],
            &device,
        );
        let out = LinearSampler::new().sample(&volumes, coords);
        let re = out.re.into_data().to_vec::<f32>().unwrap();
        assert!((re[0] - 1.0).abs() < 1e-6);
        assert!((re[1] - 3.0).abs() < 1e-6);
    }
}
