use std::{fs::File, io::{BufWriter, Write}, path::PathBuf};

use gale_fluids::{FluidError, FluidSimulator, KernelSet};
use thiserror::Error;

use crate::{as_bytes::AsBytes, frame_path, EncodeField};

/// Writes a recording directory: one `_meta` file plus one file per frame.
pub struct FieldDataEncoder {
    /// The directory into which the field data will be placed.
    path: PathBuf,
    num_frames: u64,
    fps: u32,
    current_frame: u64,
}

impl FieldDataEncoder {
    /// Creates the recording directory. Fails if it already exists.
    pub fn new(path: PathBuf, num_frames: u64, fps: u32) -> Result<FieldDataEncoder, EncodingError> {
        if num_frames == 0 {
            return Err(EncodingError::Empty);
        }

        std::fs::create_dir(&path)?;

        Ok(Self {
            path,
            num_frames,
            fps,
            current_frame: 0,
        })
    }

    pub fn encode_metadata<K: KernelSet>(&mut self, sim: &FluidSimulator<K>) -> Result<(), EncodingError> {
        let params = sim.params().ok_or(FluidError::Uninitialized)?;

        let path = self.path.join("_meta");
        let mut writer = BufWriter::new(File::create(path)?);

        writer.write_all(&(sim.dimension() as u32).to_bytes())?;
        writer.write_all(&self.fps.to_bytes())?;
        writer.write_all(&self.num_frames.to_bytes())?;
        writer.write_all(&params.viscosity.to_bytes())?;
        writer.flush()?;

        Ok(())
    }

    pub fn encode_frame<F: EncodeField>(&mut self, field: &F) -> Result<(), EncodingError> {
        if self.current_frame >= self.num_frames {
            return Err(EncodingError::FrameLimit(self.num_frames));
        }

        let path = frame_path(&self.path, self.current_frame, self.num_frames);
        let mut encoder = FieldFrameEncoder {
            writer: BufWriter::new(File::create(path)?),
        };

        field.encode_state(&mut encoder)?;
        encoder.finish()?;

        self.current_frame += 1;

        Ok(())
    }

    /// Number of frames written so far.
    pub fn frames_written(&self) -> u64 {
        self.current_frame
    }
}

pub struct FieldFrameEncoder<W: Write> {
    writer: BufWriter<W>,
}

impl<W: Write> FieldFrameEncoder<W> {
    /// Writes a `u64` element count followed by the elements.
    pub fn encode_section<const N: usize, T, I>(&mut self, len: usize, values: I) -> Result<(), EncodingError>
    where
        I: Iterator<Item = T>,
        T: AsBytes<N>,
    {
        self.writer.write_all(&(len as u64).to_bytes())?;

        let bytes: Vec<_> = values.flat_map(|v| v.to_bytes()).collect();
        if bytes.len() != len * N {
            return Err(EncodingError::LengthMismatch { declared: len, written: bytes.len() / N });
        }
        self.writer.write_all(&bytes)?;

        Ok(())
    }

    fn finish(mut self) -> Result<(), EncodingError> {
        self.writer.flush()?;
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum EncodingError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Fluid(#[from] FluidError),
    #[error("a recording needs at least one frame")]
    Empty,
    #[error("recording was declared with {0} frames")]
    FrameLimit(u64),
    #[error("section declared {declared} elements but {written} were written")]
    LengthMismatch { declared: usize, written: usize },
}
