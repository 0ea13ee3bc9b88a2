use std::{fs::File, io::{BufReader, Read}, path::PathBuf};

use gale_fluids::{grid::{bilerp, to_cell_space, VectorField}, Vec2};
use ndarray::{Array2, ArrayView2, ShapeError};
use thiserror::Error;

use crate::{as_bytes::AsBytes, frame_path};

/// Reads back a recording written by [`FieldDataEncoder`](crate::FieldDataEncoder).
///
/// [`decode_metadata`](Self::decode_metadata) must be called first; until then no frames are
/// visible.
pub struct FieldDataDecoder {
    /// The directory in which the field data resides.
    path: PathBuf,
    dimension: usize,
    num_frames: u64,
    current_frame: u64,
}

impl FieldDataDecoder {
    pub fn new(path: PathBuf) -> FieldDataDecoder {
        Self {
            path,
            dimension: 0,
            num_frames: 0,
            current_frame: 0,
        }
    }

    fn read_value<const N: usize, T: AsBytes<N>, R: Read>(reader: &mut R) -> Result<T, DecodingError> {
        let mut bytes = [0; N];
        reader.read_exact(&mut bytes)?;
        Ok(T::from_bytes(bytes))
    }

    fn read_values<const N: usize, T: AsBytes<N>, R: Read>(reader: &mut R, count: usize) -> Result<Vec<T>, DecodingError> {
        let mut bytes = vec![0; N * count];
        reader.read_exact(&mut bytes)?;

        Ok(bytes.chunks_exact(N).map(|chunk| {
            let mut b = [0; N];
            b.copy_from_slice(chunk);
            T::from_bytes(b)
        }).collect())
    }

    pub fn decode_metadata(&mut self) -> Result<FieldMetadata, DecodingError> {
        let path = self.path.join("_meta");
        let mut reader = BufReader::new(File::open(path)?);

        let dimension = Self::read_value::<4, u32, _>(&mut reader)?;
        let fps = Self::read_value::<4, u32, _>(&mut reader)?;
        let num_frames = Self::read_value::<8, u64, _>(&mut reader)?;
        let viscosity = Self::read_value::<4, f32, _>(&mut reader)?;

        if dimension == 0 {
            return Err(DecodingError::Malformed("zero field dimension"));
        }

        self.dimension = dimension as usize;
        self.num_frames = num_frames;
        self.current_frame = 0;

        Ok(FieldMetadata {
            dimension,
            fps,
            num_frames,
            viscosity,
        })
    }

    /// Reads the next frame, or `None` once every frame has been read.
    pub fn decode_frame(&mut self) -> Result<Option<FieldFrame>, DecodingError> {
        if self.current_frame >= self.num_frames {
            return Ok(None)
        }

        let index = self.current_frame;
        let path = frame_path(&self.path, index, self.num_frames);
        let mut reader = BufReader::new(File::open(path)?);

        let expected = self.dimension * self.dimension;
        let found = Self::read_value::<8, u64, _>(&mut reader)? as usize;
        if found != expected {
            return Err(DecodingError::CellCount { frame: index, expected, found });
        }

        let cells = Self::read_values::<8, Vec2, _>(&mut reader, found)?;
        let velocity = Array2::from_shape_vec((self.dimension, self.dimension), cells)?;

        self.current_frame += 1;

        Ok(Some(FieldFrame { index, velocity }))
    }

    /// Rewinds to the first frame.
    pub fn reset(&mut self) {
        self.current_frame = 0;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldMetadata {
    pub dimension: u32,
    pub fps: u32,
    pub num_frames: u64,
    pub viscosity: f32,
}

impl FieldMetadata {
    /// Length of the recording in seconds.
    pub fn duration(&self) -> f32 {
        self.num_frames as f32 / self.fps.max(1) as f32
    }
}

/// One decoded velocity field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFrame {
    pub index: u64,
    velocity: VectorField,
}

impl FieldFrame {
    pub fn dimension(&self) -> usize {
        self.velocity.nrows()
    }

    pub fn velocity(&self) -> ArrayView2<'_, Vec2> {
        self.velocity.view()
    }

    pub fn into_velocity(self) -> VectorField {
        self.velocity
    }

    /// Bilinearly samples the frame at a normalized position, the same way the live simulator does.
    pub fn sample(&self, position: Vec2) -> Vec2 {
        bilerp(&self.velocity, to_cell_space(position, self.dimension()))
    }
}

#[derive(Debug, Error)]
pub enum DecodingError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Shape(#[from] ShapeError),
    #[error("frame {frame} holds {found} cells, expected {expected}")]
    CellCount { frame: u64, expected: usize, found: usize },
    #[error("malformed recording: {0}")]
    Malformed(&'static str),
}
