//! Palette that switches representation on demand.

use std::collections::HashSet;

use bytes::BufMut;
use cubed_proto::codec::ProtoEncode;
use tracing::debug;

use super::general::GeneralPalette;
use super::geometry::Geometry;
use super::scratch::ScratchBuffer;
use super::settings::PaletteSettings;
use super::uniform::UniformPalette;
use super::{bits_to_represent, check_value, Palette, DIRECT_BITS_PER_ENTRY};
use crate::error::PaletteError;

/// The representation currently backing an [`AdaptivePalette`].
#[derive(Debug, Clone)]
pub enum Storage {
    Uniform(UniformPalette),
    General(GeneralPalette),
}

/// Public-facing palette.
///
/// Starts out uniform, upgrades to a [`GeneralPalette`] on the first write that
/// breaks uniformity, and shrinks back to the smallest valid representation every
/// time it is written.
#[derive(Debug, Clone)]
pub struct AdaptivePalette {
    settings: PaletteSettings,
    geometry: Geometry,
    storage: Storage,
}

impl AdaptivePalette {
    /// Empty (all zero) palette.
    pub fn new(settings: PaletteSettings) -> Result<Self, PaletteError> {
        let geometry = settings.validate()?;
        Ok(Self::with_geometry(settings, geometry))
    }

    /// Block-state palette of a section.
    pub fn blocks() -> Self {
        Self::with_geometry(PaletteSettings::BLOCKS, Geometry::from_shift(4))
    }

    /// Biome palette of a section.
    pub fn biomes() -> Self {
        Self::with_geometry(PaletteSettings::BIOMES, Geometry::from_shift(2))
    }

    fn with_geometry(settings: PaletteSettings, geometry: Geometry) -> Self {
        Self {
            settings,
            geometry,
            storage: Storage::Uniform(UniformPalette::with_geometry(geometry, 0)),
        }
    }

    /// Build from global ids in storage order. Ids must already be validated.
    pub(crate) fn from_values(
        settings: PaletteSettings,
        geometry: Geometry,
        values: &mut [u32],
    ) -> Self {
        let mut palette = Self::with_geometry(settings, geometry);
        let first = values[0];
        if values.iter().all(|&value| value == first) {
            palette.storage = Storage::Uniform(UniformPalette::with_geometry(geometry, first));
        } else {
            let mut general = palette.new_general();
            general.pack_values(values);
            palette.storage = Storage::General(general);
        }
        palette
    }

    pub fn settings(&self) -> PaletteSettings {
        self.settings
    }

    pub fn max_bits_per_entry(&self) -> u8 {
        self.settings.max_bits_per_entry
    }

    pub fn default_bits_per_entry(&self) -> u8 {
        self.settings.default_bits_per_entry
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn is_uniform(&self) -> bool {
        matches!(self.storage, Storage::Uniform(_))
    }

    /// Reset every cell to 0.
    pub fn clear(&mut self) {
        self.storage = Storage::Uniform(UniformPalette::with_geometry(self.geometry, 0));
    }

    /// Replace the active representation with the smallest valid one.
    ///
    /// Never changes the logical content.
    pub fn optimize(&mut self) {
        let Storage::General(general) = &mut self.storage else {
            return;
        };

        if general.count() == 0 {
            debug!("collapsed empty palette to uniform");
            self.storage = Storage::Uniform(UniformPalette::with_geometry(self.geometry, 0));
            return;
        }

        let mut distinct = HashSet::new();
        general.for_each(|_, _, _, value| {
            distinct.insert(value);
        });

        if distinct.len() == 1 {
            let value = distinct.into_iter().next().unwrap_or_default();
            debug!(value, "collapsed single-value palette to uniform");
            self.storage = Storage::Uniform(UniformPalette::with_geometry(self.geometry, value));
            return;
        }

        // The rebuilt table always holds 0, live or not.
        distinct.insert(0);
        let current = general.bits_per_entry();
        let needed = bits_to_represent(distinct.len() as u32 - 1);
        let target = if needed > self.settings.max_bits_per_entry {
            DIRECT_BITS_PER_ENTRY
        } else {
            needed
        };
        if current > self.settings.default_bits_per_entry && target < current {
            debug!(from = current, to = target, entries = distinct.len(), "shrinking palette");
            general.resize(target);
        }
    }

    /// Optimize, then encode the active representation.
    pub fn write(&mut self, buf: &mut impl BufMut) {
        self.optimize();
        match &self.storage {
            Storage::Uniform(uniform) => uniform.proto_encode(buf),
            Storage::General(general) => general.proto_encode(buf),
        }
    }

    fn new_general(&self) -> GeneralPalette {
        GeneralPalette::with_geometry(
            self.geometry,
            self.settings.default_bits_per_entry,
            self.settings.max_bits_per_entry,
        )
    }

    /// Upgrade a uniform representation in place and hand out the packed one.
    fn ensure_general(&mut self) -> Result<&mut GeneralPalette, PaletteError> {
        if let Storage::Uniform(uniform) = self.storage {
            let mut general = self.new_general();
            general.fill(uniform.value())?;
            self.storage = Storage::General(general);
        }
        match &mut self.storage {
            Storage::General(general) => Ok(general),
            Storage::Uniform(_) => unreachable!("uniform storage was just upgraded"),
        }
    }
}

impl Palette for AdaptivePalette {
    fn dimension(&self) -> u32 {
        self.geometry.dimension()
    }

    fn get(&self, x: i32, y: i32, z: i32) -> Result<u32, PaletteError> {
        match &self.storage {
            Storage::Uniform(uniform) => uniform.get(x, y, z),
            Storage::General(general) => general.get(x, y, z),
        }
    }

    fn for_each(&self, visitor: impl FnMut(i32, i32, i32, u32)) {
        match &self.storage {
            Storage::Uniform(uniform) => uniform.for_each(visitor),
            Storage::General(general) => general.for_each(visitor),
        }
    }

    fn for_each_present(&self, visitor: impl FnMut(i32, i32, i32, u32)) {
        match &self.storage {
            Storage::Uniform(uniform) => uniform.for_each_present(visitor),
            Storage::General(general) => general.for_each_present(visitor),
        }
    }

    fn count(&self) -> usize {
        match &self.storage {
            Storage::Uniform(uniform) => uniform.count(),
            Storage::General(general) => general.count(),
        }
    }

    fn bits_per_entry(&self) -> u8 {
        match &self.storage {
            Storage::Uniform(uniform) => uniform.bits_per_entry(),
            Storage::General(general) => general.bits_per_entry(),
        }
    }

    fn set(&mut self, x: i32, y: i32, z: i32, value: u32) -> Result<(), PaletteError> {
        self.geometry.index(x, y, z)?;
        check_value(value)?;
        self.ensure_general()?.set(x, y, z, value)
    }

    /// Always cheap: the volume becomes uniform.
    fn fill(&mut self, value: u32) -> Result<(), PaletteError> {
        check_value(value)?;
        self.storage = Storage::Uniform(UniformPalette::with_geometry(self.geometry, value));
        Ok(())
    }

    fn set_all_with(
        &mut self,
        scratch: &mut ScratchBuffer,
        supplier: impl FnMut(i32, i32, i32) -> u32,
    ) -> Result<(), PaletteError> {
        // Every cell is overwritten, so a uniform volume starts from a fresh table.
        if self.is_uniform() {
            let mut general = self.new_general();
            general.set_all_with(scratch, supplier)?;
            self.storage = Storage::General(general);
            return Ok(());
        }
        self.ensure_general()?.set_all_with(scratch, supplier)
    }

    fn replace(&mut self, x: i32, y: i32, z: i32, value: u32) -> Result<(), PaletteError> {
        if self.get(x, y, z)? == value {
            return Ok(());
        }
        self.set(x, y, z, value)
    }

    fn replace_all_with(
        &mut self,
        scratch: &mut ScratchBuffer,
        function: impl FnMut(i32, i32, i32, u32) -> u32,
    ) -> Result<(), PaletteError> {
        self.ensure_general()?.replace_all_with(scratch, function)
    }
}
