//! Random pose generation.

use burn::tensor::backend::Backend;
use burn::tensor::{Distribution, Tensor};

/// Draw `n` rotations uniformly from SO(3).
///
/// A normalized isotropic Gaussian 4-vector is a uniform unit quaternion;
/// `q` and `-q` give the same matrix, so no hemisphere fix is needed.
pub fn uniform_rotations<B: Backend>(n: usize, device: &B::Device) -> Tensor<B, 3> {
    let q = Tensor::<B, 2>::random([n, 4], Distribution::Normal(0.0, 1.0), device);
    let norm = q.clone().powf_scalar(2.0).sum_dim(1).sqrt();
    quaternion_to_matrix(q / norm)
}

/// Convert unit quaternions `[N, 4]` ordered `(w, x, y, z)` to matrices `[N, 3, 3]`.
pub fn quaternion_to_matrix<B: Backend>(q: Tensor<B, 2>) -> Tensor<B, 3> {
    let [n, _] = q.dims();
    let w = q.clone().narrow(1, 0, 1);
    let x = q.clone().narrow(1, 1, 1);
    let y = q.clone().narrow(1, 2, 1);
    let z = q.narrow(1, 3, 1);

    let xx = x.clone() * x.clone();
    let yy = y.clone() * y.clone();
    let zz = z.clone() * z.clone();
    let xy = x.clone() * y.clone();
    let xz = x.clone() * z.clone();
    let yz = y.clone() * z.clone();
    let wx = w.clone() * x;
    let wy = w.clone() * y;
    let wz = w * z;

    let one = xx.ones_like();
    let r00 = one.clone() - (yy.clone() + zz.clone()).mul_scalar(2.0);
    let r01 = (xy.clone() - wz.clone()).mul_scalar(2.0);
    let r02 = (xz.clone() + wy.clone()).mul_scalar(2.0);
    let r10 = (xy + wz).mul_scalar(2.0);
    let r11 = one.clone() - (xx.clone() + zz).mul_scalar(2.0);
    let r12 = (yz.clone() - wx.clone()).mul_scalar(2.0);
    let r20 = (xz - wy).mul_scalar(2.0);
    let r21 = (yz + wx).mul_scalar(2.0);
    let r22 = one - (xx + yy).mul_scalar(2.0);

    Tensor::cat(vec![r00, r01, r02, r10, r11, r12, r20, r21, r22], 1).reshape([n, 3, 3])
}

/// Draw `n` in-plane translations uniformly from `[-max_shift, max_shift]^2` pixels.
pub fn uniform_translations<B: Backend>(
    n: usize,
    max_shift: f64,
    device: &B::Device,
) -> Tensor<B, 2> {
    if max_shift <= 0.0 {
        return Tensor::zeros([n, 2], device);
    }
    Tensor::random([n, 2], Distribution::Uniform(-max_shift, max_shift), device)
}
