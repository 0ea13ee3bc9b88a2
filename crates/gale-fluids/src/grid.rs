use glam::Vec2;
use ndarray::Array2;

/// One scalar per cell.
pub type ScalarField = Array2<f32>;
/// One 2-component vector per cell.
pub type VectorField = Array2<Vec2>;

/// Number of vector buffers: velocity, velocity back buffer and scratch.
pub const VECTOR_BUFFERS: usize = 3;
/// Number of scalar buffers: pressure and its back buffer.
pub const SCALAR_BUFFERS: usize = 2;

/// Fixed arena of grid buffers for an `N x N` simulation.
///
/// Buffers are addressed by index. The logical roles (current velocity, back buffer, scratch,
/// current pressure, pressure back buffer) are indices into the arena, so a swap only exchanges two
/// indices. Nothing is allocated after construction.
#[derive(Debug, Clone)]
pub struct GridBuffers {
    /// Size of the grid, in cells along one axis.
    dimension: usize,

    vectors: [VectorField; VECTOR_BUFFERS],
    scalars: [ScalarField; SCALAR_BUFFERS],

    /// Current (readable) velocity field.
    velocity: usize,
    /// Free velocity buffer, written by the next advancing stage.
    velocity_back: usize,
    /// Pre-diffusion snapshot and divergence storage.
    scratch: usize,
    /// Current pressure field.
    pressure: usize,
    /// Free pressure buffer.
    pressure_back: usize,
}

impl GridBuffers {
    /// Allocates zero-filled buffers for a `dimension x dimension` grid.
    pub fn new(dimension: usize) -> Self {
        let shape = (dimension, dimension);

        Self {
            dimension,
            vectors: std::array::from_fn(|_| Array2::from_elem(shape, Vec2::ZERO)),
            scalars: std::array::from_fn(|_| Array2::from_elem(shape, 0.0)),
            velocity: 0,
            velocity_back: 1,
            scratch: 2,
            pressure: 0,
            pressure_back: 1,
        }
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of allocated grid buffers.
    #[inline]
    pub fn len(&self) -> usize {
        self.vectors.len() + self.scalars.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn velocity(&self) -> &VectorField {
        &self.vectors[self.velocity]
    }

    #[inline]
    pub fn pressure(&self) -> &ScalarField {
        &self.scalars[self.pressure]
    }

    #[inline]
    pub fn scratch(&self) -> &VectorField {
        &self.vectors[self.scratch]
    }

    /// The back buffer becomes the current velocity field and vice versa.
    #[inline]
    pub fn swap_velocity(&mut self) {
        std::mem::swap(&mut self.velocity, &mut self.velocity_back);
    }

    #[inline]
    pub fn swap_pressure(&mut self) {
        std::mem::swap(&mut self.pressure, &mut self.pressure_back);
    }

    /// Copies the current velocity field into the scratch buffer.
    pub fn snapshot_velocity(&mut self) {
        let (scratch, others) = split_write(&mut self.vectors, self.scratch);
        scratch.assign(others.get(self.velocity));
    }

    /// Current velocity (read) and velocity back buffer (write).
    pub fn velocity_pass(&mut self) -> (&VectorField, &mut VectorField) {
        let (out, others) = split_write(&mut self.vectors, self.velocity_back);
        (others.get(self.velocity), out)
    }

    /// Current velocity and scratch (read), velocity back buffer (write).
    pub fn velocity_scratch_pass(&mut self) -> (&VectorField, &VectorField, &mut VectorField) {
        let (out, others) = split_write(&mut self.vectors, self.velocity_back);
        (others.get(self.velocity), others.get(self.scratch), out)
    }

    /// Current velocity (read), scratch and current pressure (write).
    pub fn divergence_pass(&mut self) -> (&VectorField, &mut VectorField, &mut ScalarField) {
        let (scratch, others) = split_write(&mut self.vectors, self.scratch);
        (others.get(self.velocity), scratch, &mut self.scalars[self.pressure])
    }

    /// Current pressure and scratch (read), pressure back buffer (write).
    pub fn pressure_pass(&mut self) -> (&ScalarField, &VectorField, &mut ScalarField) {
        let (out, others) = split_write(&mut self.scalars, self.pressure_back);
        (others.get(self.pressure), &self.vectors[self.scratch], out)
    }

    /// Current velocity and current pressure (read), velocity back buffer (write).
    pub fn gradient_pass(&mut self) -> (&VectorField, &ScalarField, &mut VectorField) {
        let (out, others) = split_write(&mut self.vectors, self.velocity_back);
        (others.get(self.velocity), &self.scalars[self.pressure], out)
    }

    /// Base addresses of every buffer's storage, in arena order.
    #[cfg(test)]
    pub(crate) fn storage_addresses(&self) -> [usize; VECTOR_BUFFERS + SCALAR_BUFFERS] {
        let v = self.vectors.each_ref().map(|a| a.as_ptr() as usize);
        let s = self.scalars.each_ref().map(|a| a.as_ptr() as usize);
        [v[0], v[1], v[2], s[0], s[1]]
    }
}

/// The buffers of an arena other than the one being written.
struct Others<'a, T> {
    before: &'a [T],
    after: &'a [T],
    write: usize,
}

impl<'a, T> Others<'a, T> {
    fn get(&self, i: usize) -> &'a T {
        assert_ne!(i, self.write, "buffer {i} is bound for both reading and writing");

        if i < self.write {
            &self.before[i]
        } else {
            &self.after[i - self.write - 1]
        }
    }
}

fn split_write<T>(slots: &mut [T], write: usize) -> (&mut T, Others<'_, T>) {
    let (before, rest) = slots.split_at_mut(write);
    let (out, after) = rest.split_at_mut(1);

    (&mut out[0], Others { before, after, write })
}

/// Reads a cell, clamping the coordinates to the grid edge.
#[inline]
pub fn clamped<T: Copy>(field: &Array2<T>, i: isize, j: isize) -> T {
    let (nx, ny) = field.dim();
    let i = i.clamp(0, nx as isize - 1) as usize;
    let j = j.clamp(0, ny as isize - 1) as usize;
    field[(i, j)]
}

/// The four edge-clamped neighbours of a cell: left, right, down, up.
#[inline]
pub fn neighbours<T: Copy>(field: &Array2<T>, i: usize, j: usize) -> [T; 4] {
    let (i, j) = (i as isize, j as isize);
    [
        clamped(field, i - 1, j),
        clamped(field, i + 1, j),
        clamped(field, i, j - 1),
        clamped(field, i, j + 1),
    ]
}

/// Bilinearly interpolates a vector field at a point given in cell-index space, where cell `(i, j)`
/// has its center at `(i, j)`. Coordinates outside the grid are clamped to the edge.
pub fn bilerp(field: &VectorField, p: Vec2) -> Vec2 {
    let (nx, ny) = field.dim();
    let max = Vec2::new(nx as f32 - 1.0, ny as f32 - 1.0);
    let p = p.clamp(Vec2::ZERO, max);

    let i0 = p.x.floor() as usize;
    let j0 = p.y.floor() as usize;
    let i1 = (i0 + 1).min(nx - 1);
    let j1 = (j0 + 1).min(ny - 1);
    let t = p - Vec2::new(i0 as f32, j0 as f32);
    let s = 1.0 - t;

    field[(i0, j0)] * (s.x * s.y)
        + field[(i1, j0)] * (t.x * s.y)
        + field[(i0, j1)] * (s.x * t.y)
        + field[(i1, j1)] * (t.x * t.y)
}

/// Converts a normalized field position (`[0, 1]` on both axes) to cell-index space.
#[inline]
pub fn to_cell_space(position: Vec2, dimension: usize) -> Vec2 {
    position * dimension as f32 - 0.5
}

/// Normalized position of the center of cell `(i, j)`.
#[inline]
pub fn cell_center(i: usize, j: usize, dx: f32) -> Vec2 {
    (Vec2::new(i as f32, j as f32) + 0.5) * dx
}
