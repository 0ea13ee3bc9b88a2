//! Measurements over a velocity field.

use glam::Vec2;
use ndarray::{Array2, ArrayView2};

use crate::{grid::ScalarField, kernels::cell};

/// Central-difference divergence of every cell, using the same stencil as the projection.
pub fn divergence_field(field: ArrayView2<'_, Vec2>) -> ScalarField {
    let field = field.to_owned();
    let dx = (field.nrows() as f32).recip();
    Array2::from_shape_fn(field.dim(), |(i, j)| cell::divergence(&field, i, j, dx))
}

/// Mean absolute divergence over the grid.
pub fn mean_abs_divergence(field: ArrayView2<'_, Vec2>) -> f32 {
    let div = divergence_field(field);
    if div.is_empty() {
        return 0.0;
    }

    div.iter().map(|d| d.abs()).sum::<f32>() / div.len() as f32
}

/// Largest velocity magnitude in the field.
pub fn max_speed(field: ArrayView2<'_, Vec2>) -> f32 {
    field.iter().map(|v| v.length()).fold(0.0, f32::max)
}

/// Sum of all cell velocities.
pub fn net_velocity(field: ArrayView2<'_, Vec2>) -> Vec2 {
    field.iter().copied().sum()
}
