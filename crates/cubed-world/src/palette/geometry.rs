//! Cell addressing inside a cubic palette volume.

use crate::error::PaletteError;

/// Largest supported edge length.
pub const MAX_DIMENSION: u32 = 256;

/// Validated power-of-two edge length and the matching index layout.
///
/// Cells are laid out y-major: `index = y << 2n | z << n | x`, `n = log2(dimension)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    shift: u32,
}

impl Geometry {
    pub fn new(dimension: u32) -> Result<Self, PaletteError> {
        if dimension < 2 || dimension > MAX_DIMENSION || !dimension.is_power_of_two() {
            return Err(PaletteError::InvalidDimension {
                dimension,
                max: MAX_DIMENSION,
            });
        }
        Ok(Self {
            shift: dimension.trailing_zeros(),
        })
    }

    /// Geometry for `dimension = 1 << shift`.
    pub(crate) const fn from_shift(shift: u32) -> Self {
        Self { shift }
    }

    pub fn dimension(self) -> u32 {
        1 << self.shift
    }

    pub fn volume(self) -> usize {
        1 << (3 * self.shift)
    }

    /// Storage index of a cell, rejecting negative or out-of-bounds coordinates.
    pub fn index(self, x: i32, y: i32, z: i32) -> Result<usize, PaletteError> {
        self.check('x', x)?;
        self.check('y', y)?;
        self.check('z', z)?;
        Ok(self.index_unchecked(x, y, z))
    }

    /// Coordinates must already be within `[0, dimension)`.
    pub(crate) fn index_unchecked(self, x: i32, y: i32, z: i32) -> usize {
        let mask = self.mask() as i32;
        (((y & mask) << (2 * self.shift)) | ((z & mask) << self.shift) | (x & mask)) as usize
    }

    /// Inverse of [`index`](Geometry::index): `(x, y, z)`.
    pub(crate) fn coords(self, index: usize) -> (i32, i32, i32) {
        let mask = self.mask() as usize;
        let x = index & mask;
        let z = (index >> self.shift) & mask;
        let y = index >> (2 * self.shift);
        (x as i32, y as i32, z as i32)
    }

    fn mask(self) -> u32 {
        self.dimension() - 1
    }

    fn check(self, axis: char, value: i32) -> Result<(), PaletteError> {
        if value < 0 || value as u32 >= self.dimension() {
            return Err(PaletteError::OutOfRange {
                axis,
                value,
                dimension: self.dimension(),
            });
        }
        Ok(())
    }
}
