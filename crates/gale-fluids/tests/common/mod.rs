#![allow(dead_code)]

use std::cell::RefCell;

use gale_fluids::{
    grid::{ScalarField, VectorField},
    CpuKernels, FluidError, Impulse, JacobiConstants, KernelSet,
};

/// One dispatched stage, with whatever the test needs to inspect afterwards.
#[derive(Debug, Clone)]
pub enum Call {
    Advect { dt: f32, dx: f32 },
    Diffuse(JacobiConstants),
    InjectForce { impulse: Impulse, input: VectorField, output: VectorField },
    Divergence { input: VectorField },
    Pressure(JacobiConstants),
    SubtractGradient { output: VectorField },
}

impl Call {
    pub fn name(&self) -> &'static str {
        match self {
            Call::Advect { .. } => "advect",
            Call::Diffuse(_) => "diffuse",
            Call::InjectForce { .. } => "inject",
            Call::Divergence { .. } => "divergence",
            Call::Pressure(_) => "pressure",
            Call::SubtractGradient { .. } => "subtract",
        }
    }
}

/// Delegates to the reference kernels and records every call.
pub struct RecordingKernels {
    inner: CpuKernels,
    pub calls: RefCell<Vec<Call>>,
}

impl RecordingKernels {
    pub fn new() -> Self {
        Self {
            inner: CpuKernels::reference(),
            calls: RefCell::new(vec![]),
        }
    }

    pub fn take(&self) -> Vec<Call> {
        self.calls.borrow_mut().drain(..).collect()
    }
}

impl KernelSet for RecordingKernels {
    fn advect(&self, velocity: &VectorField, out: &mut VectorField, dt: f32, dx: f32) -> Result<(), FluidError> {
        self.calls.borrow_mut().push(Call::Advect { dt, dx });
        self.inner.advect(velocity, out, dt, dx)
    }

    fn diffuse_jacobi_step(&self, x: &VectorField, b: &VectorField, out: &mut VectorField, constants: JacobiConstants) -> Result<(), FluidError> {
        self.calls.borrow_mut().push(Call::Diffuse(constants));
        self.inner.diffuse_jacobi_step(x, b, out, constants)
    }

    fn inject_force(&self, velocity: &VectorField, out: &mut VectorField, impulse: &Impulse, dx: f32) -> Result<(), FluidError> {
        self.inner.inject_force(velocity, out, impulse, dx)?;
        self.calls.borrow_mut().push(Call::InjectForce {
            impulse: *impulse,
            input: velocity.clone(),
            output: out.clone(),
        });
        Ok(())
    }

    fn compute_divergence(&self, velocity: &VectorField, divergence: &mut VectorField, pressure: &mut ScalarField, dx: f32) -> Result<(), FluidError> {
        self.calls.borrow_mut().push(Call::Divergence { input: velocity.clone() });
        self.inner.compute_divergence(velocity, divergence, pressure, dx)
    }

    fn pressure_jacobi_step(&self, x: &ScalarField, b: &VectorField, out: &mut ScalarField, constants: JacobiConstants) -> Result<(), FluidError> {
        self.calls.borrow_mut().push(Call::Pressure(constants));
        self.inner.pressure_jacobi_step(x, b, out, constants)
    }

    fn subtract_gradient(&self, velocity: &VectorField, pressure: &ScalarField, out: &mut VectorField, dx: f32) -> Result<(), FluidError> {
        self.inner.subtract_gradient(velocity, pressure, out, dx)?;
        self.calls.borrow_mut().push(Call::SubtractGradient { output: out.clone() });
        Ok(())
    }
}

/// Fails every dispatch, as a lost compute device would.
pub struct FailingKernels;

impl KernelSet for FailingKernels {
    fn advect(&self, _: &VectorField, _: &mut VectorField, _: f32, _: f32) -> Result<(), FluidError> {
        Err(FluidError::Backend("device lost".into()))
    }

    fn diffuse_jacobi_step(&self, _: &VectorField, _: &VectorField, _: &mut VectorField, _: JacobiConstants) -> Result<(), FluidError> {
        Err(FluidError::Backend("device lost".into()))
    }

    fn inject_force(&self, _: &VectorField, _: &mut VectorField, _: &Impulse, _: f32) -> Result<(), FluidError> {
        Err(FluidError::Backend("device lost".into()))
    }

    fn compute_divergence(&self, _: &VectorField, _: &mut VectorField, _: &mut ScalarField, _: f32) -> Result<(), FluidError> {
        Err(FluidError::Backend("device lost".into()))
    }

    fn pressure_jacobi_step(&self, _: &ScalarField, _: &VectorField, _: &mut ScalarField, _: JacobiConstants) -> Result<(), FluidError> {
        Err(FluidError::Backend("device lost".into()))
    }

    fn subtract_gradient(&self, _: &VectorField, _: &ScalarField, _: &mut VectorField, _: f32) -> Result<(), FluidError> {
        Err(FluidError::Backend("device lost".into()))
    }
}
