use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Args;
use gale_fluids::{diagnostics, CpuKernels, FluidParams, FluidSimulator};
use gale_io::FieldDataEncoder;
use glam::Vec2;
use indicatif::{ProgressBar, ProgressIterator, ProgressStyle};
use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::info;

#[derive(Args)]
pub struct RunArgs {
    /// Directory to record into; must not exist yet
    #[arg(short, long)]
    output: PathBuf,

    /// Requested grid resolution, truncated to a multiple of 8
    #[arg(short, long, default_value_t = 512)]
    resolution: u32,

    /// Kinematic viscosity of the air
    #[arg(long, default_value_t = 1e-6)]
    viscosity: f32,

    /// Jacobi sweeps for both the diffusion and the pressure solve
    #[arg(long, default_value_t = 20)]
    iterations: usize,

    #[arg(long, default_value_t = 60)]
    fps: u32,

    /// Length of the recording in seconds
    #[arg(short, long, default_value_t = 10.0)]
    duration: f32,

    /// Radius of each gust in normalized field units
    #[arg(long, default_value_t = 0.2)]
    gust_radius: f32,

    #[arg(long, default_value_t = 1.0)]
    min_strength: f32,

    #[arg(long, default_value_t = 5.0)]
    max_strength: f32,

    /// Seed for the gust generator; random when omitted
    #[arg(long)]
    seed: Option<u64>,

    /// Size of a dedicated worker pool; the global rayon pool is used when omitted
    #[arg(long)]
    threads: Option<usize>,
}

impl RunArgs {
    fn frames(&self) -> u64 {
        (self.duration * self.fps as f32).round() as u64
    }
}

/// Random gusts from above, one per frame, aimed at the middle of the field.
struct Gusts {
    rng: StdRng,
    min: f32,
    max: f32,
}

impl Gusts {
    fn draw(&mut self) -> (Vec2, f32) {
        let direction = Vec2::new(self.rng.gen_range(-1.0..1.0), -1.0);
        let magnitude = if self.min < self.max {
            self.rng.gen_range(self.min..self.max)
        } else {
            self.min
        };

        (direction, magnitude)
    }
}

pub fn run(args: RunArgs) -> anyhow::Result<()> {
    if args.fps == 0 {
        bail!("fps must be positive");
    }
    if !(args.min_strength > 0.0 && args.min_strength <= args.max_strength) {
        bail!("gust strength range {}..{} is empty or not positive", args.min_strength, args.max_strength);
    }

    let frames = args.frames();
    if frames == 0 {
        bail!("a duration of {}s at {} fps records no frames", args.duration, args.fps);
    }

    let kernels = match args.threads {
        Some(n) => CpuKernels::with_threads(n)?,
        None => CpuKernels::parallel(),
    };

    let mut sim = FluidSimulator::new(kernels);
    sim.initialize_with(FluidParams {
        resolution: args.resolution,
        viscosity: args.viscosity,
        diffusion_iterations: args.iterations,
        pressure_iterations: args.iterations,
    })?;

    let mut encoder = FieldDataEncoder::new(args.output.clone(), frames, args.fps)
        .with_context(|| format!("creating recording at {}", args.output.display()))?;
    encoder.encode_metadata(&sim)?;

    let mut gusts = Gusts {
        rng: match args.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        },
        min: args.min_strength,
        max: args.max_strength,
    };

    info!(
        dimension = sim.dimension(),
        frames,
        fps = args.fps,
        "recording wind field to {}",
        args.output.display()
    );

    let dt = 1.0 / args.fps as f32;
    let center = Vec2::splat(0.5);

    let bar_template = "Simulating {spinner:.green} [{elapsed}] [{bar:50.white/white}] {pos}/{len} ({eta})";
    let style = ProgressStyle::with_template(bar_template)?
        .progress_chars("=> ").tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
    let progress = ProgressBar::new(frames).with_style(style);

    for frame in (0..frames).progress_with(progress) {
        let (direction, magnitude) = gusts.draw();
        sim.add_wind(center, direction, magnitude, args.gust_radius)?;
        sim.step(dt).with_context(|| format!("stepping frame {frame}"))?;
        encoder.encode_frame(&sim).with_context(|| format!("writing frame {frame}"))?;
    }

    let field = sim.current_field()?;
    info!(
        max_speed = diagnostics::max_speed(field),
        mean_divergence = diagnostics::mean_abs_divergence(field),
        "recorded {} frames",
        encoder.frames_written()
    );

    Ok(())
}
