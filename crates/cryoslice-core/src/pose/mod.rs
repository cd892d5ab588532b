//! Poses: rotation parameterization, validation and sampling.

pub mod batch;
pub mod euler;
pub mod sampling;
pub mod validation;

pub use batch::PoseBatch;
pub use euler::{euler_to_matrix, euler_to_matrix_host, matrix_to_euler};
pub use sampling::{uniform_rotations, uniform_translations};
pub use validation::{check_rotation, orthonormalize, RotationPolicy};
