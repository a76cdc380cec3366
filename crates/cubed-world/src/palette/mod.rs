//! Paletted storage for cubic volumes of global ids.
//!
//! A palette stores one id per cell of a `dimension³` volume. Callers use
//! [`AdaptivePalette`], which switches between a [`UniformPalette`] (the whole
//! volume holds one id) and a bit-packed [`GeneralPalette`], and always picks the
//! smallest valid representation before it is written to the wire.

pub mod adaptive;
pub mod decode;
pub mod general;
pub mod geometry;
pub mod scratch;
pub mod settings;
mod table;
pub mod uniform;

pub use adaptive::{AdaptivePalette, Storage};
pub use decode::read_palette;
pub use general::GeneralPalette;
pub use geometry::Geometry;
pub use scratch::ScratchBuffer;
pub use settings::PaletteSettings;
pub use uniform::UniformPalette;

use crate::error::PaletteError;

/// Width used once a palette abandons its indirect table.
pub const DIRECT_BITS_PER_ENTRY: u8 = 16;

/// Largest global id a palette can hold.
pub const MAX_GLOBAL_ID: u32 = (1 << DIRECT_BITS_PER_ENTRY) - 1;

/// Operations shared by every palette representation.
///
/// Structural mutators on a [`UniformPalette`] fail with
/// [`PaletteError::Unsupported`]; go through [`AdaptivePalette`] instead.
pub trait Palette {
    /// Edge length of the volume.
    fn dimension(&self) -> u32;

    /// Number of cells, `dimension³`.
    fn volume(&self) -> usize {
        let dimension = self.dimension() as usize;
        dimension * dimension * dimension
    }

    /// Global id stored at the given cell.
    fn get(&self, x: i32, y: i32, z: i32) -> Result<u32, PaletteError>;

    /// Visit every cell as `(x, y, z, value)`.
    fn for_each(&self, visitor: impl FnMut(i32, i32, i32, u32));

    /// Visit every cell whose value is non-zero.
    fn for_each_present(&self, visitor: impl FnMut(i32, i32, i32, u32));

    /// Number of cells holding a non-zero value.
    fn count(&self) -> usize;

    /// Width of one packed entry; 0 for a uniform volume.
    fn bits_per_entry(&self) -> u8;

    fn set(&mut self, x: i32, y: i32, z: i32, value: u32) -> Result<(), PaletteError>;

    fn fill(&mut self, value: u32) -> Result<(), PaletteError>;

    /// Overwrite the whole volume from `supplier`, staging values in `scratch`.
    fn set_all_with(
        &mut self,
        scratch: &mut ScratchBuffer,
        supplier: impl FnMut(i32, i32, i32) -> u32,
    ) -> Result<(), PaletteError>;

    /// Like [`set`](Palette::set), but a no-op when the value is unchanged.
    fn replace(&mut self, x: i32, y: i32, z: i32, value: u32) -> Result<(), PaletteError>;

    /// Map every cell through `function(x, y, z, old) -> new`, staging values in `scratch`.
    fn replace_all_with(
        &mut self,
        scratch: &mut ScratchBuffer,
        function: impl FnMut(i32, i32, i32, u32) -> u32,
    ) -> Result<(), PaletteError>;

    fn set_all(&mut self, supplier: impl FnMut(i32, i32, i32) -> u32) -> Result<(), PaletteError> {
        self.set_all_with(&mut ScratchBuffer::new(), supplier)
    }

    fn replace_all(
        &mut self,
        function: impl FnMut(i32, i32, i32, u32) -> u32,
    ) -> Result<(), PaletteError> {
        self.replace_all_with(&mut ScratchBuffer::new(), function)
    }
}

/// Minimum number of bits able to represent `value`.
pub fn bits_to_represent(value: u32) -> u8 {
    (u32::BITS - value.leading_zeros()) as u8
}

pub(crate) fn check_value(value: u32) -> Result<u32, PaletteError> {
    if value > MAX_GLOBAL_ID {
        return Err(PaletteError::ValueTooLarge {
            value,
            bits: DIRECT_BITS_PER_ENTRY,
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bits_to_represent_values() {
        assert_eq!(bits_to_represent(0), 0);
        assert_eq!(bits_to_represent(1), 1);
        assert_eq!(bits_to_represent(2), 2);
        assert_eq!(bits_to_represent(3), 2);
        assert_eq!(bits_to_represent(15), 4);
        assert_eq!(bits_to_represent(16), 5);
        assert_eq!(bits_to_represent(255), 8);
        assert_eq!(bits_to_represent(256), 9);
    }

    #[test]
    fn global_id_limit() {
        assert_eq!(check_value(MAX_GLOBAL_ID).unwrap(), 65_535);
        assert!(matches!(
            check_value(MAX_GLOBAL_ID + 1),
            Err(PaletteError::ValueTooLarge { value: 65_536, bits: 16 })
        ));
    }
}
