use crate::{grid::{ScalarField, VectorField}, impulse::Impulse, FluidError};

pub mod cell;
mod cpu;

pub use cpu::CpuKernels;

/// The six per-cell stages of the stable fluids method.
///
/// Every operation is a map over grid cells: it reads its input buffers and writes every cell of
/// `out`. Implementations must finish writing all cells before returning, and must not read from
/// `out`. Buffers are always `N x N` and share a shape.
pub trait KernelSet {
    /// Semi-Lagrangian transport of `velocity` along itself over `dt`.
    fn advect(&self, velocity: &VectorField, out: &mut VectorField, dt: f32, dx: f32) -> Result<(), FluidError>;

    /// One Jacobi sweep of the implicit viscosity solve with right-hand side `b`.
    fn diffuse_jacobi_step(
        &self,
        x: &VectorField,
        b: &VectorField,
        out: &mut VectorField,
        constants: JacobiConstants,
    ) -> Result<(), FluidError>;

    /// Adds the impulse's force to `velocity`.
    fn inject_force(&self, velocity: &VectorField, out: &mut VectorField, impulse: &Impulse, dx: f32) -> Result<(), FluidError>;

    /// Writes the divergence of `velocity` to the x channel of `divergence` and resets `pressure`
    /// to zero, the initial guess of the pressure solve.
    fn compute_divergence(
        &self,
        velocity: &VectorField,
        divergence: &mut VectorField,
        pressure: &mut ScalarField,
        dx: f32,
    ) -> Result<(), FluidError>;

    /// One Jacobi sweep of the pressure Poisson solve. `b` holds the divergence in its x channel.
    fn pressure_jacobi_step(
        &self,
        x: &ScalarField,
        b: &VectorField,
        out: &mut ScalarField,
        constants: JacobiConstants,
    ) -> Result<(), FluidError>;

    /// `out = velocity - grad(pressure)`.
    fn subtract_gradient(
        &self,
        velocity: &VectorField,
        pressure: &ScalarField,
        out: &mut VectorField,
        dx: f32,
    ) -> Result<(), FluidError>;
}

impl<K: KernelSet + ?Sized> KernelSet for &K {
    fn advect(&self, velocity: &VectorField, out: &mut VectorField, dt: f32, dx: f32) -> Result<(), FluidError> {
        (**self).advect(velocity, out, dt, dx)
    }

    fn diffuse_jacobi_step(&self, x: &VectorField, b: &VectorField, out: &mut VectorField, constants: JacobiConstants) -> Result<(), FluidError> {
        (**self).diffuse_jacobi_step(x, b, out, constants)
    }

    fn inject_force(&self, velocity: &VectorField, out: &mut VectorField, impulse: &Impulse, dx: f32) -> Result<(), FluidError> {
        (**self).inject_force(velocity, out, impulse, dx)
    }

    fn compute_divergence(&self, velocity: &VectorField, divergence: &mut VectorField, pressure: &mut ScalarField, dx: f32) -> Result<(), FluidError> {
        (**self).compute_divergence(velocity, divergence, pressure, dx)
    }

    fn pressure_jacobi_step(&self, x: &ScalarField, b: &VectorField, out: &mut ScalarField, constants: JacobiConstants) -> Result<(), FluidError> {
        (**self).pressure_jacobi_step(x, b, out, constants)
    }

    fn subtract_gradient(&self, velocity: &VectorField, pressure: &ScalarField, out: &mut VectorField, dx: f32) -> Result<(), FluidError> {
        (**self).subtract_gradient(velocity, pressure, out, dx)
    }
}

/// Constants of a Jacobi sweep `x' = (sum of neighbours + alpha * b) / beta`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JacobiConstants {
    pub alpha: f32,
    pub beta: f32,
}

impl JacobiConstants {
    /// Implicit viscosity: `alpha = dx² / (viscosity * dt)`, `beta = alpha + 4`.
    ///
    /// `viscosity` and `dt` must both be strictly positive.
    #[inline]
    pub fn diffusion(dx: f32, viscosity: f32, dt: f32) -> Self {
        let alpha = dx * dx / (viscosity * dt);
        Self { alpha, beta: alpha + 4.0 }
    }

    /// Pressure Poisson equation: `alpha = -dx²`, `beta = 4`.
    #[inline]
    pub fn pressure(dx: f32) -> Self {
        Self { alpha: -dx * dx, beta: 4.0 }
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.alpha.is_finite() && self.beta.is_finite()
    }
}
