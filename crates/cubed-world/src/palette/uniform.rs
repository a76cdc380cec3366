//! Palette for a volume filled with a single value.

use bytes::BufMut;
use cubed_proto::codec::ProtoEncode;
use cubed_proto::types::VarInt;

use super::geometry::Geometry;
use super::scratch::ScratchBuffer;
use super::{check_value, Palette};
use crate::error::PaletteError;

/// Every cell holds `value`. Changing the structure means replacing the palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformPalette {
    geometry: Geometry,
    value: u32,
}

impl UniformPalette {
    pub fn new(dimension: u32, value: u32) -> Result<Self, PaletteError> {
        Ok(Self::with_geometry(Geometry::new(dimension)?, check_value(value)?))
    }

    pub(crate) fn with_geometry(geometry: Geometry, value: u32) -> Self {
        Self { geometry, value }
    }

    pub fn value(&self) -> u32 {
        self.value
    }
}

impl Palette for UniformPalette {
    fn dimension(&self) -> u32 {
        self.geometry.dimension()
    }

    fn get(&self, x: i32, y: i32, z: i32) -> Result<u32, PaletteError> {
        self.geometry.index(x, y, z)?;
        Ok(self.value)
    }

    fn for_each(&self, mut visitor: impl FnMut(i32, i32, i32, u32)) {
        for index in 0..self.geometry.volume() {
            let (x, y, z) = self.geometry.coords(index);
            visitor(x, y, z, self.value);
        }
    }

    fn for_each_present(&self, visitor: impl FnMut(i32, i32, i32, u32)) {
        if self.value != 0 {
            self.for_each(visitor);
        }
    }

    fn count(&self) -> usize {
        if self.value == 0 {
            0
        } else {
            self.geometry.volume()
        }
    }

    fn bits_per_entry(&self) -> u8 {
        0
    }

    fn set(&mut self, _x: i32, _y: i32, _z: i32, _value: u32) -> Result<(), PaletteError> {
        Err(PaletteError::Unsupported("set"))
    }

    /// Filling with the value already held is the only accepted fill.
    fn fill(&mut self, value: u32) -> Result<(), PaletteError> {
        if value == self.value {
            Ok(())
        } else {
            Err(PaletteError::Unsupported("fill"))
        }
    }

    fn set_all_with(
        &mut self,
        _scratch: &mut ScratchBuffer,
        _supplier: impl FnMut(i32, i32, i32) -> u32,
    ) -> Result<(), PaletteError> {
        Err(PaletteError::Unsupported("set_all"))
    }

    fn replace(&mut self, _x: i32, _y: i32, _z: i32, _value: u32) -> Result<(), PaletteError> {
        Err(PaletteError::Unsupported("replace"))
    }

    fn replace_all_with(
        &mut self,
        _scratch: &mut ScratchBuffer,
        _function: impl FnMut(i32, i32, i32, u32) -> u32,
    ) -> Result<(), PaletteError> {
        Err(PaletteError::Unsupported("replace_all"))
    }
}

/// `0u8` width, the value, then an empty word array.
impl ProtoEncode for UniformPalette {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(0);
        VarInt::from(self.value).proto_encode(buf);
        VarInt(0).proto_encode(buf);
    }
}
