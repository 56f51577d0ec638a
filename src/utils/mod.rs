//! Numeric helpers shared by the physics modules and simulators.

pub mod convolve;
pub mod finite_difference;
pub mod geometry;
pub mod parallel;

pub use convolve::{convolve2d, ConvolveMode};
pub use finite_difference::jacobian;
pub use geometry::{avg_pool, derotate, get_meshgrid, to_elliptical, translate_rotate};
pub use parallel::{batch_forward, jacobian_parallel};
