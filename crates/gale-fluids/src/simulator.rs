use glam::Vec2;
use ndarray::ArrayView2;
use tracing::{debug, debug_span, trace};

use crate::{
    grid::{bilerp, to_cell_space, GridBuffers},
    impulse::{Impulse, ImpulseSlot, WindHandle},
    kernels::{CpuKernels, JacobiConstants, KernelSet},
    resolution::{actual_dimension, Resolution},
    FluidError,
};

/// Solver configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FluidParams {
    /// Requested grid resolution. The allocated dimension is this rounded down to a multiple of
    /// the work-group width.
    pub resolution: u32,
    /// Kinematic viscosity of the air. Must be strictly positive.
    pub viscosity: f32,
    /// Number of Jacobi sweeps of the viscosity solve.
    pub diffusion_iterations: usize,
    /// Number of Jacobi sweeps of the pressure solve.
    pub pressure_iterations: usize,
}

impl Default for FluidParams {
    fn default() -> Self {
        Self {
            resolution: 512,
            viscosity: 1e-6,
            diffusion_iterations: 20,
            pressure_iterations: 20,
        }
    }
}

/// Default parameters at one of the standard resolutions.
impl From<Resolution> for FluidParams {
    fn from(resolution: Resolution) -> Self {
        Self {
            resolution: resolution.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug)]
struct SimulationState {
    params: FluidParams,
    buffers: GridBuffers,
    /// Cell size in normalized field units.
    dx: f32,
    ticks: u64,
}

/// A 2D stable-fluids wind field.
///
/// The simulator owns every grid buffer and the pending-impulse slot. It is created empty and
/// becomes usable after [`initialize`](Self::initialize); [`shutdown`](Self::shutdown) releases the
/// buffers again.
#[derive(Debug)]
pub struct FluidSimulator<K = CpuKernels> {
    kernels: K,
    state: Option<SimulationState>,
    impulse: ImpulseSlot,
}

impl Default for FluidSimulator<CpuKernels> {
    fn default() -> Self {
        Self::new(CpuKernels::default())
    }
}

impl<K: KernelSet> FluidSimulator<K> {
    pub fn new(kernels: K) -> Self {
        Self {
            kernels,
            state: None,
            impulse: ImpulseSlot::default(),
        }
    }

    /// Allocates zeroed buffers with the default iteration counts.
    pub fn initialize(&mut self, resolution: u32, viscosity: f32) -> Result<(), FluidError> {
        self.initialize_with(FluidParams {
            resolution,
            viscosity,
            ..Default::default()
        })
    }

    /// Allocates zeroed buffers for `params`, replacing any previous state.
    pub fn initialize_with(&mut self, params: FluidParams) -> Result<(), FluidError> {
        let dimension = actual_dimension(params.resolution)?;

        if !(params.viscosity.is_finite() && params.viscosity > 0.0) {
            return Err(FluidError::InvalidViscosity(params.viscosity));
        }

        self.impulse.clear();
        self.state = Some(SimulationState {
            params,
            buffers: GridBuffers::new(dimension),
            dx: (dimension as f32).recip(),
            ticks: 0,
        });

        debug!(
            requested = params.resolution,
            dimension,
            viscosity = params.viscosity,
            "initialized wind field"
        );

        Ok(())
    }

    /// Releases all buffers. The simulator must be re-initialized before further use.
    pub fn shutdown(&mut self) {
        if let Some(state) = self.state.take() {
            debug!(ticks = state.ticks, "released wind field buffers");
        }

        self.impulse.clear();
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    /// Records a one-shot impulse for the next step.
    ///
    /// `position` is in normalized field coordinates. A zero `direction` is accepted and applies no
    /// force. Calling this again before the next step replaces the pending impulse.
    pub fn add_wind(&self, position: Vec2, direction: Vec2, magnitude: f32, radius: f32) -> Result<(), FluidError> {
        self.impulse.store(Impulse::new(position, direction, magnitude, radius)?);
        Ok(())
    }

    /// A handle through which other threads can request wind.
    pub fn wind_handle(&self) -> WindHandle {
        WindHandle::new(self.impulse.clone())
    }

    /// The impulse that the next step will apply, if any.
    pub fn pending_impulse(&self) -> Option<Impulse> {
        self.impulse.peek()
    }

    /// Advances the field by `dt`: advect, diffuse, inject force, project.
    ///
    /// On error the buffers are left in an undefined state and the simulator should be
    /// re-initialized.
    pub fn step(&mut self, dt: f32) -> Result<(), FluidError> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(FluidError::InvalidTimeStep(dt));
        }

        let state = self.state.as_mut().ok_or(FluidError::Uninitialized)?;
        let _span = debug_span!("step", tick = state.ticks).entered();

        let kernels = &self.kernels;
        let dx = state.dx;
        let params = state.params;
        let buffers = &mut state.buffers;

        // Tiny dt or viscosity overflows alpha.
        let diffusion = JacobiConstants::diffusion(dx, params.viscosity, dt);
        if !diffusion.is_finite() {
            return Err(FluidError::InvalidTimeStep(dt));
        }

        advect(kernels, buffers, dt, dx)?;
        diffuse(kernels, buffers, diffusion, params.diffusion_iterations)?;

        let impulse = self.impulse.take().unwrap_or(Impulse::NONE);
        inject_force(kernels, buffers, &impulse, dx)?;

        compute_divergence(kernels, buffers, dx)?;
        solve_pressure(kernels, buffers, JacobiConstants::pressure(dx), params.pressure_iterations)?;
        subtract_gradient(kernels, buffers, dx)?;

        state.ticks += 1;
        Ok(())
    }

    /// The current velocity field, `dimension x dimension`, indexed `(x, y)`.
    ///
    /// The view borrows the simulator, so it cannot outlive the next step.
    pub fn current_field(&self) -> Result<ArrayView2<'_, Vec2>, FluidError> {
        let state = self.state.as_ref().ok_or(FluidError::Uninitialized)?;
        Ok(state.buffers.velocity().view())
    }

    /// Bilinearly samples the current field at a normalized position, clamped to the field edge.
    pub fn sample(&self, position: Vec2) -> Result<Vec2, FluidError> {
        let state = self.state.as_ref().ok_or(FluidError::Uninitialized)?;
        let p = to_cell_space(position, state.buffers.dimension());
        Ok(bilerp(state.buffers.velocity(), p))
    }

    /// Allocated grid dimension, or zero before initialization.
    pub fn dimension(&self) -> usize {
        self.state.as_ref().map_or(0, |s| s.buffers.dimension())
    }

    /// Cell size in normalized field units.
    pub fn dx(&self) -> Option<f32> {
        self.state.as_ref().map(|s| s.dx)
    }

    pub fn params(&self) -> Option<&FluidParams> {
        self.state.as_ref().map(|s| &s.params)
    }

    /// Number of completed steps since initialization.
    pub fn ticks(&self) -> u64 {
        self.state.as_ref().map_or(0, |s| s.ticks)
    }

    /// Number of allocated grid buffers.
    pub fn buffer_count(&self) -> usize {
        self.state.as_ref().map_or(0, |s| s.buffers.len())
    }

    pub fn kernels(&self) -> &K {
        &self.kernels
    }
}

fn advect<K: KernelSet>(kernels: &K, buffers: &mut GridBuffers, dt: f32, dx: f32) -> Result<(), FluidError> {
    trace!("advect");
    let (velocity, out) = buffers.velocity_pass();
    kernels.advect(velocity, out, dt, dx)?;
    buffers.swap_velocity();
    Ok(())
}

fn diffuse<K: KernelSet>(kernels: &K, buffers: &mut GridBuffers, constants: JacobiConstants, iterations: usize) -> Result<(), FluidError> {
    trace!(alpha = constants.alpha, beta = constants.beta, iterations, "diffuse");
    buffers.snapshot_velocity();

    for _iter in 0..iterations {
        let (x, b, out) = buffers.velocity_scratch_pass();
        kernels.diffuse_jacobi_step(x, b, out, constants)?;
        buffers.swap_velocity();
    }

    Ok(())
}

fn inject_force<K: KernelSet>(kernels: &K, buffers: &mut GridBuffers, impulse: &Impulse, dx: f32) -> Result<(), FluidError> {
    trace!(noop = impulse.is_noop(), "inject force");
    let (velocity, out) = buffers.velocity_pass();
    kernels.inject_force(velocity, out, impulse, dx)?;
    buffers.swap_velocity();
    Ok(())
}

fn compute_divergence<K: KernelSet>(kernels: &K, buffers: &mut GridBuffers, dx: f32) -> Result<(), FluidError> {
    trace!("divergence");
    let (velocity, divergence, pressure) = buffers.divergence_pass();
    kernels.compute_divergence(velocity, divergence, pressure, dx)
}

fn solve_pressure<K: KernelSet>(kernels: &K, buffers: &mut GridBuffers, constants: JacobiConstants, iterations: usize) -> Result<(), FluidError> {
    trace!(iterations, "pressure");

    for _iter in 0..iterations {
        let (x, b, out) = buffers.pressure_pass();
        kernels.pressure_jacobi_step(x, b, out, constants)?;
        buffers.swap_pressure();
    }

    Ok(())
}

fn subtract_gradient<K: KernelSet>(kernels: &K, buffers: &mut GridBuffers, dx: f32) -> Result<(), FluidError> {
    trace!("subtract gradient");
    let (velocity, pressure, out) = buffers.gradient_pass();
    kernels.subtract_gradient(velocity, pressure, out, dx)?;
    buffers.swap_velocity();
    Ok(())
}
