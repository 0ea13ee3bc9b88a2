use std::sync::Arc;

use ndarray::{Array2, Zip};
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::{grid::{ScalarField, VectorField}, impulse::Impulse, FluidError};

use super::{cell, JacobiConstants, KernelSet};

/// CPU implementation of the kernel set.
///
/// The parallel flavour spreads the cells of each stage over rayon worker threads; the reference
/// flavour walks them in order on the calling thread. Both produce identical fields.
#[derive(Debug, Clone, Default)]
pub struct CpuKernels {
    execution: Execution,
}

#[derive(Debug, Clone, Default)]
enum Execution {
    #[default]
    Parallel,
    Pool(Arc<ThreadPool>),
    Serial,
}

impl CpuKernels {
    /// Dispatches on rayon's global thread pool.
    pub fn parallel() -> Self {
        Self { execution: Execution::Parallel }
    }

    /// Dispatches on a dedicated pool of `threads` workers.
    pub fn with_threads(threads: usize) -> Result<Self, FluidError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("gale-kernel-{i}"))
            .build()
            .map_err(|e| FluidError::Backend(e.to_string()))?;

        Ok(Self { execution: Execution::Pool(Arc::new(pool)) })
    }

    /// Single-threaded reference.
    pub fn reference() -> Self {
        Self { execution: Execution::Serial }
    }

    pub fn is_parallel(&self) -> bool {
        !matches!(self.execution, Execution::Serial)
    }

    /// Writes `f(i, j)` into every cell of `out`. Returns once all cells are written.
    fn dispatch<T, F>(&self, out: &mut Array2<T>, f: F)
    where
        T: Send,
        F: Fn(usize, usize) -> T + Sync + Send,
    {
        match &self.execution {
            Execution::Parallel => {
                Zip::indexed(out).par_for_each(|(i, j), o| *o = f(i, j));
            }
            Execution::Pool(pool) => pool.install(|| {
                Zip::indexed(out).par_for_each(|(i, j), o| *o = f(i, j));
            }),
            Execution::Serial => {
                Zip::indexed(out).for_each(|(i, j), o| *o = f(i, j));
            }
        }
    }
}

fn check_shape<A, B>(input: &Array2<A>, out: &Array2<B>) -> Result<(), FluidError> {
    if input.dim() != out.dim() {
        return Err(FluidError::Backend(format!(
            "buffer shape mismatch: {:?} vs {:?}", input.dim(), out.dim(),
        )));
    }

    Ok(())
}

impl KernelSet for CpuKernels {
    fn advect(&self, velocity: &VectorField, out: &mut VectorField, dt: f32, dx: f32) -> Result<(), FluidError> {
        check_shape(velocity, out)?;
        self.dispatch(out, |i, j| cell::advect(velocity, i, j, dt, dx));
        Ok(())
    }

    fn diffuse_jacobi_step(
        &self,
        x: &VectorField,
        b: &VectorField,
        out: &mut VectorField,
        constants: JacobiConstants,
    ) -> Result<(), FluidError> {
        check_shape(x, out)?;
        check_shape(b, out)?;
        self.dispatch(out, |i, j| cell::diffuse(x, b, i, j, constants));
        Ok(())
    }

    fn inject_force(&self, velocity: &VectorField, out: &mut VectorField, impulse: &Impulse, dx: f32) -> Result<(), FluidError> {
        check_shape(velocity, out)?;
        self.dispatch(out, |i, j| cell::inject(velocity, impulse, i, j, dx));
        Ok(())
    }

    fn compute_divergence(
        &self,
        velocity: &VectorField,
        divergence: &mut VectorField,
        pressure: &mut ScalarField,
        dx: f32,
    ) -> Result<(), FluidError> {
        check_shape(velocity, divergence)?;
        check_shape(velocity, pressure)?;
        self.dispatch(divergence, |i, j| glam::Vec2::new(cell::divergence(velocity, i, j, dx), 0.0));
        pressure.fill(0.0);
        Ok(())
    }

    fn pressure_jacobi_step(
        &self,
        x: &ScalarField,
        b: &VectorField,
        out: &mut ScalarField,
        constants: JacobiConstants,
    ) -> Result<(), FluidError> {
        check_shape(x, out)?;
        check_shape(b, out)?;
        self.dispatch(out, |i, j| cell::pressure(x, b, i, j, constants));
        Ok(())
    }

    fn subtract_gradient(
        &self,
        velocity: &VectorField,
        pressure: &ScalarField,
        out: &mut VectorField,
        dx: f32,
    ) -> Result<(), FluidError> {
        check_shape(velocity, out)?;
        check_shape(pressure, out)?;
        self.dispatch(out, |i, j| cell::project(velocity, pressure, i, j, dx));
        Ok(())
    }
}
