//! Centered coordinate grids.
//!
//! Every grid in the forward model puts its origin at index `size / 2`, so a
//! grid of even side `D` spans the integer coordinates `-D/2 ..= D/2 - 1`.

use burn::tensor::backend::Backend;
use burn::tensor::{Shape, Tensor, TensorData};

/// Centered integer coordinates `-size/2 ..= size/2 - 1` as floats.
pub fn centered_coordinates(size: usize) -> Vec<f32> {
    let half = (size / 2) as f32;
    (0..size).map(|i| i as f32 - half).collect()
}

/// Centered coordinates for one axis as a tensor of shape `[size]`.
pub fn centered_axis<B: Backend>(size: usize, device: &B::Device) -> Tensor<B, 1> {
    Tensor::<B, 1>::from_data(
        TensorData::new(centered_coordinates(size), Shape::new([size])),
        device,
    )
}

/// Points of the central `z = 0` plane of a cubic grid.
///
/// Returns a tensor of shape `[size * size, 3]` whose rows are `(u, v, 0)`,
/// ordered row-major over `[v, u]` so that reshaping a per-point result to
/// `[size, size]` yields an image indexed `[v, u]`.
pub fn central_plane_points<B: Backend>(size: usize, device: &B::Device) -> Tensor<B, 2> {
    let coords = centered_coordinates(size);
    let total = size * size;

    let mut grid = Vec::with_capacity(total * 3);
    for v in &coords {
        for u in &coords {
            grid.push(*u);
            grid.push(*v);
            grid.push(0.0);
        }
    }

    Tensor::<B, 1>::from_data(TensorData::new(grid, Shape::new([total * 3])), device)
        .reshape([total, 3])
}

/// Squared radial frequency `u^2 + v^2` over a centered `[size, size]` plane.
pub fn radial_distance_squared(size: usize) -> Vec<f32> {
    let coords = centered_coordinates(size);
    let mut out = Vec::with_capacity(size * size);
    for v in &coords {
        for u in &coords {
            out.push(u * u + v * v);
        }
    }
    out
}
