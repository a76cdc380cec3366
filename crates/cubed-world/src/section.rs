//! A 16×16×16 section owning one block palette and one biome palette.

use bytes::BufMut;

use crate::coords::{section_local, SECTION_EDGE};
use crate::error::PaletteError;
use crate::palette::{AdaptivePalette, Palette, PaletteSettings};

#[derive(Debug, Clone)]
pub struct ChunkSection {
    blocks: AdaptivePalette,
    biomes: AdaptivePalette,
}

impl Default for ChunkSection {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkSection {
    /// Empty section using the block and biome presets.
    pub fn new() -> Self {
        Self {
            blocks: AdaptivePalette::blocks(),
            biomes: AdaptivePalette::biomes(),
        }
    }

    /// Palettes with custom settings. Neither may be finer than one cell per
    /// block, so the block count always fits the `i16` header.
    pub fn with_settings(blocks: PaletteSettings, biomes: PaletteSettings) -> Result<Self, PaletteError> {
        for settings in [blocks, biomes] {
            if settings.dimension > SECTION_EDGE as u32 {
                return Err(PaletteError::InvalidDimension {
                    dimension: settings.dimension,
                    max: SECTION_EDGE as u32,
                });
            }
        }
        Ok(Self {
            blocks: AdaptivePalette::new(blocks)?,
            biomes: AdaptivePalette::new(biomes)?,
        })
    }

    pub fn blocks(&self) -> &AdaptivePalette {
        &self.blocks
    }

    pub fn blocks_mut(&mut self) -> &mut AdaptivePalette {
        &mut self.blocks
    }

    pub fn biomes(&self) -> &AdaptivePalette {
        &self.biomes
    }

    pub fn biomes_mut(&mut self) -> &mut AdaptivePalette {
        &mut self.biomes
    }

    /// Block state at world coordinates inside this section.
    pub fn block(&self, x: i32, y: i32, z: i32) -> Result<u32, PaletteError> {
        let dimension = self.blocks.dimension();
        self.blocks.get(
            section_local(x, dimension),
            section_local(y, dimension),
            section_local(z, dimension),
        )
    }

    pub fn set_block(&mut self, x: i32, y: i32, z: i32, state: u32) -> Result<(), PaletteError> {
        let dimension = self.blocks.dimension();
        self.blocks.set(
            section_local(x, dimension),
            section_local(y, dimension),
            section_local(z, dimension),
            state,
        )
    }

    pub fn biome(&self, x: i32, y: i32, z: i32) -> Result<u32, PaletteError> {
        let dimension = self.biomes.dimension();
        self.biomes.get(
            section_local(x, dimension),
            section_local(y, dimension),
            section_local(z, dimension),
        )
    }

    pub fn set_biome(&mut self, x: i32, y: i32, z: i32, biome: u32) -> Result<(), PaletteError> {
        let dimension = self.biomes.dimension();
        self.biomes.set(
            section_local(x, dimension),
            section_local(y, dimension),
            section_local(z, dimension),
            biome,
        )
    }

    /// Non-air blocks in the section.
    pub fn block_count(&self) -> usize {
        self.blocks.count()
    }

    pub fn is_empty(&self) -> bool {
        self.block_count() == 0
    }

    pub fn clear(&mut self) {
        self.blocks.clear();
        self.biomes.clear();
    }

    /// Independent copy for serialization on another thread.
    pub fn snapshot(&self) -> ChunkSection {
        self.clone()
    }

    /// Block count (`i16`, big-endian), block palette, biome palette.
    pub fn write(&mut self, buf: &mut impl BufMut) {
        buf.put_i16(self.block_count() as i16);
        self.blocks.write(buf);
        self.biomes.write(buf);
    }
}
