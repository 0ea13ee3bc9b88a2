use std::{io::Write, path::{Path, PathBuf}};

use encode::{EncodingError, FieldFrameEncoder};
use gale_fluids::{grid::VectorField, FluidSimulator, KernelSet};

pub mod as_bytes;
pub mod decode;
pub mod encode;

pub use decode::{DecodingError, FieldDataDecoder, FieldFrame, FieldMetadata};
pub use encode::FieldDataEncoder;

/// Anything that can write a velocity field as one recorded frame.
pub trait EncodeField {
    fn encode_state<W: Write>(&self, encoder: &mut FieldFrameEncoder<W>) -> Result<(), EncodingError>;
}

impl EncodeField for VectorField {
    fn encode_state<W: Write>(&self, encoder: &mut FieldFrameEncoder<W>) -> Result<(), EncodingError> {
        encoder.encode_section(self.len(), self.iter().copied())
    }
}

impl<K: KernelSet> EncodeField for FluidSimulator<K> {
    fn encode_state<W: Write>(&self, encoder: &mut FieldFrameEncoder<W>) -> Result<(), EncodingError> {
        let field = self.current_field()?;
        encoder.encode_section(field.len(), field.iter().copied())
    }
}

/// Frame files are zero padded to the width of the last frame index.
pub(crate) fn frame_path(dir: &Path, frame: u64, num_frames: u64) -> PathBuf {
    let max_digits = num_frames.saturating_sub(1).checked_ilog10().unwrap_or(0) + 1;
    let digits = frame.checked_ilog10().unwrap_or(0) + 1;
    let zeros = max_digits.saturating_sub(digits);

    dir.join(format!("{}{frame}.dat", "0".repeat(zeros as usize)))
}
