use crate::FluidError;

/// Width of one parallel work group. Grid dimensions are always a multiple of this.
pub const WORK_GROUP_WIDTH: u32 = 8;

/// Largest supported grid dimension.
pub const MAX_RESOLUTION: u32 = 1024;

/// The standard field resolutions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Resolution {
    R128 = 128,
    R256 = 256,
    R512 = 512,
    R1024 = 1024,
}

impl Resolution {
    pub const ALL: [Resolution; 4] = [Self::R128, Self::R256, Self::R512, Self::R1024];

    #[inline]
    pub fn size(self) -> u32 {
        self as u32
    }
}

impl From<Resolution> for u32 {
    fn from(r: Resolution) -> u32 {
        r.size()
    }
}

impl TryFrom<u32> for Resolution {
    type Error = FluidError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::ALL.into_iter()
            .find(|r| r.size() == value)
            .ok_or(FluidError::InvalidResolution(value))
    }
}

/// Number of work groups along one axis for a requested resolution.
#[inline]
pub fn work_groups(requested: u32) -> u32 {
    requested / WORK_GROUP_WIDTH
}

/// Maps a requested resolution to the grid dimension actually allocated.
///
/// The request is divided by the work-group width, truncating any remainder, then multiplied back,
/// so `100` becomes `96` while the standard sizes map to themselves. Requests that would yield an
/// empty grid or exceed [`MAX_RESOLUTION`] are rejected.
pub fn actual_dimension(requested: u32) -> Result<usize, FluidError> {
    if !(WORK_GROUP_WIDTH..=MAX_RESOLUTION).contains(&requested) {
        return Err(FluidError::InvalidResolution(requested));
    }

    Ok((work_groups(requested) * WORK_GROUP_WIDTH) as usize)
}
