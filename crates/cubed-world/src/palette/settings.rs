//! Construction parameters for palettes.

use serde::Deserialize;

use super::geometry::Geometry;
use super::DIRECT_BITS_PER_ENTRY;
use crate::error::PaletteError;

/// Dimension and width policy of a palette.
///
/// `default_bits_per_entry` is the width a packed palette starts at;
/// `max_bits_per_entry` is the last width that still uses an indirect table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PaletteSettings {
    pub dimension: u32,
    pub max_bits_per_entry: u8,
    pub default_bits_per_entry: u8,
}

impl PaletteSettings {
    /// Block states of a 16×16×16 section.
    pub const BLOCKS: Self = Self {
        dimension: 16,
        max_bits_per_entry: 8,
        default_bits_per_entry: 4,
    };

    /// Biomes of a section, one per 4×4×4 cell group.
    pub const BIOMES: Self = Self {
        dimension: 4,
        max_bits_per_entry: 3,
        default_bits_per_entry: 1,
    };

    /// Check the settings and return the volume geometry they describe.
    pub fn validate(&self) -> Result<Geometry, PaletteError> {
        let geometry = Geometry::new(self.dimension)?;
        if self.default_bits_per_entry == 0
            || self.default_bits_per_entry > self.max_bits_per_entry
            || self.max_bits_per_entry >= DIRECT_BITS_PER_ENTRY
        {
            return Err(PaletteError::InvalidBits {
                default_bits: self.default_bits_per_entry,
                max_bits: self.max_bits_per_entry,
            });
        }
        Ok(geometry)
    }
}
