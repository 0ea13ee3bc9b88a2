use thiserror::Error;

pub mod diagnostics;
pub mod grid;
pub mod impulse;
pub mod kernels;
pub mod resolution;
pub mod simulator;

pub use glam::Vec2;
pub use impulse::{Impulse, WindHandle};
pub use kernels::{CpuKernels, JacobiConstants, KernelSet};
pub use resolution::Resolution;
pub use simulator::{FluidParams, FluidSimulator};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FluidError {
    #[error("resolution {0} is outside the supported range 8..=1024")]
    InvalidResolution(u32),
    #[error("viscosity must be finite and strictly positive, got {0}")]
    InvalidViscosity(f32),
    #[error("time step must be finite and strictly positive, got {0}")]
    InvalidTimeStep(f32),
    #[error("invalid wind impulse: {0}")]
    InvalidImpulse(&'static str),
    #[error("the simulator has not been initialized")]
    Uninitialized,
    /// A kernel dispatch failed. Buffer contents are undefined afterwards and the simulator must be
    /// re-initialized.
    #[error("kernel backend failure: {0}")]
    Backend(String),
}
