//! Per-cell evaluation of each stage. Every backend computes a cell by calling these, which keeps
//! the backends bit-identical.

use glam::Vec2;

use crate::{
    grid::{bilerp, cell_center, neighbours, ScalarField, VectorField},
    impulse::Impulse,
};

use super::JacobiConstants;

#[inline]
pub fn advect(velocity: &VectorField, i: usize, j: usize, dt: f32, dx: f32) -> Vec2 {
    let back = Vec2::new(i as f32, j as f32) - dt * velocity[(i, j)] / dx;
    bilerp(velocity, back)
}

#[inline]
pub fn diffuse(x: &VectorField, b: &VectorField, i: usize, j: usize, c: JacobiConstants) -> Vec2 {
    let [l, r, d, u] = neighbours(x, i, j);
    (l + r + d + u + c.alpha * b[(i, j)]) / c.beta
}

#[inline]
pub fn inject(velocity: &VectorField, impulse: &Impulse, i: usize, j: usize, dx: f32) -> Vec2 {
    velocity[(i, j)] + impulse.force_at(cell_center(i, j, dx))
}

#[inline]
pub fn divergence(velocity: &VectorField, i: usize, j: usize, dx: f32) -> f32 {
    let [l, r, d, u] = neighbours(velocity, i, j);
    ((r.x - l.x) + (u.y - d.y)) / (2.0 * dx)
}

#[inline]
pub fn pressure(x: &ScalarField, b: &VectorField, i: usize, j: usize, c: JacobiConstants) -> f32 {
    let [l, r, d, u] = neighbours(x, i, j);
    (l + r + d + u + c.alpha * b[(i, j)].x) / c.beta
}

#[inline]
pub fn gradient(pressure: &ScalarField, i: usize, j: usize, dx: f32) -> Vec2 {
    let [l, r, d, u] = neighbours(pressure, i, j);
    Vec2::new(r - l, u - d) / (2.0 * dx)
}

#[inline]
pub fn project(velocity: &VectorField, pressure: &ScalarField, i: usize, j: usize, dx: f32) -> Vec2 {
    velocity[(i, j)] - gradient(pressure, i, j, dx)
}
