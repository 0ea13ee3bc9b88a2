use std::path::PathBuf;

use anyhow::Context;
use gale_fluids::diagnostics;
use gale_io::FieldDataDecoder;
use glam::Vec2;
use tracing::info;

pub fn inspect(path: PathBuf) -> anyhow::Result<()> {
    let mut decoder = FieldDataDecoder::new(path.clone());
    let meta = decoder.decode_metadata()
        .with_context(|| format!("reading metadata from {}", path.display()))?;

    info!(
        dimension = meta.dimension,
        fps = meta.fps,
        frames = meta.num_frames,
        viscosity = meta.viscosity,
        "{:.2}s recording",
        meta.duration()
    );

    let mut peak = 0.0f32;
    while let Some(frame) = decoder.decode_frame()? {
        let speed = diagnostics::max_speed(frame.velocity());
        peak = peak.max(speed);

        info!(
            frame = frame.index,
            max_speed = speed,
            mean_divergence = diagnostics::mean_abs_divergence(frame.velocity()),
            center = %frame.sample(Vec2::splat(0.5))
        );
    }

    info!(peak_speed = peak, "done");
    Ok(())
}
