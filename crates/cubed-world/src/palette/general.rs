//! Bit-packed palette able to hold any value in any cell.
//!
//! Entries are packed into 64-bit words, `64 / bits_per_entry` per word, never
//! straddling a word boundary. While `bits_per_entry <= max_bits_per_entry` the
//! stored bits are local indices into an [`IndirectTable`]; past that threshold
//! the palette switches to [`DIRECT_BITS_PER_ENTRY`]-wide raw global ids.

use bytes::BufMut;
use cubed_proto::codec::{write_long_array, ProtoEncode};
use cubed_proto::types::VarInt;
use tracing::trace;

use super::geometry::Geometry;
use super::scratch::ScratchBuffer;
use super::settings::PaletteSettings;
use super::table::IndirectTable;
use super::{bits_to_represent, check_value, Palette, DIRECT_BITS_PER_ENTRY};
use crate::error::PaletteError;

#[derive(Debug, Clone)]
pub struct GeneralPalette {
    geometry: Geometry,
    max_bits_per_entry: u8,
    bits_per_entry: u8,
    /// Cells whose value is non-zero.
    count: usize,
    words: Vec<u64>,
    /// Authoritative only in indirect mode.
    table: IndirectTable,
}

impl GeneralPalette {
    /// Empty palette at the settings' default width.
    pub fn new(settings: PaletteSettings) -> Result<Self, PaletteError> {
        let geometry = settings.validate()?;
        Ok(Self::with_geometry(
            geometry,
            settings.default_bits_per_entry,
            settings.max_bits_per_entry,
        ))
    }

    pub(crate) fn with_geometry(geometry: Geometry, bits_per_entry: u8, max_bits_per_entry: u8) -> Self {
        let bits_per_entry = effective_bits(bits_per_entry, max_bits_per_entry);
        Self {
            geometry,
            max_bits_per_entry,
            bits_per_entry,
            count: 0,
            words: vec![0; word_count(geometry.volume(), bits_per_entry)],
            table: IndirectTable::new(),
        }
    }

    pub fn max_bits_per_entry(&self) -> u8 {
        self.max_bits_per_entry
    }

    /// Entries hold raw global ids instead of table indices.
    pub fn is_direct(&self) -> bool {
        self.bits_per_entry > self.max_bits_per_entry
    }

    /// Size of the indirect table, 0 in direct mode.
    pub fn palette_len(&self) -> usize {
        if self.is_direct() {
            0
        } else {
            self.table.len()
        }
    }

    /// Packed storage as sent on the wire.
    pub fn words(&self) -> &[u64] {
        &self.words
    }

    /// Local index for `value`, growing the table or widening entries when full.
    pub fn palette_index_of(&mut self, value: u32) -> Result<u32, PaletteError> {
        check_value(value)?;
        Ok(self.index_for(value))
    }

    /// Repack every cell at `new_bits` wide entries.
    ///
    /// Widths past `max_bits_per_entry` switch to direct mode. Going back to
    /// indirect mode rebuilds the table from the live values.
    pub fn resize(&mut self, new_bits: u8) {
        let mut resized =
            GeneralPalette::with_geometry(self.geometry, new_bits.max(1), self.max_bits_per_entry);
        for index in 0..self.geometry.volume() {
            let value = self.value_at(index);
            if value != 0 {
                let local = resized.index_for(value);
                resized.write_local(index, local);
            }
        }
        debug_assert_eq!(resized.count, self.count, "resize changed the non-empty count");
        trace!(
            from = self.bits_per_entry,
            to = resized.bits_per_entry,
            direct = resized.is_direct(),
            "resized palette"
        );
        *self = resized;
    }

    /// `value` must already have passed [`check_value`].
    fn index_for(&mut self, value: u32) -> u32 {
        loop {
            if self.is_direct() {
                return value;
            }
            if let Some(index) = self.table.index_of(value) {
                return index;
            }
            if self.table.len() < 1 << self.bits_per_entry {
                return self.table.push(value);
            }
            self.resize(self.bits_per_entry + 1);
        }
    }

    fn value_at(&self, index: usize) -> u32 {
        self.value_of_local(self.read_local(index))
    }

    fn value_of_local(&self, local: u32) -> u32 {
        if self.is_direct() {
            local
        } else {
            self.table.id(local)
        }
    }

    fn locate(&self, index: usize) -> (usize, u32) {
        let per_word = entries_per_word(self.bits_per_entry);
        let word = index / per_word;
        let offset = (index - word * per_word) as u32 * self.bits_per_entry as u32;
        (word, offset)
    }

    fn read_local(&self, index: usize) -> u32 {
        let (word, offset) = self.locate(index);
        ((self.words[word] >> offset) & entry_mask(self.bits_per_entry)) as u32
    }

    /// Store a local index and keep `count` in step.
    fn write_local(&mut self, index: usize, local: u32) {
        let (word, offset) = self.locate(index);
        let mask = entry_mask(self.bits_per_entry);
        let block = self.words[word];
        let old = (block >> offset) & mask;
        self.words[word] = (block & !(mask << offset)) | ((local as u64) << offset);

        // Local 0 is id 0 in both modes.
        match (old == 0, local == 0) {
            (true, false) => self.count += 1,
            (false, true) => self.count -= 1,
            _ => {}
        }
    }

    /// Replace the whole volume with `values` (global ids, in storage order).
    ///
    /// Existing table entries keep their indices; new ids are appended and the
    /// width grows (possibly into direct mode) before anything is packed.
    pub(crate) fn pack_values(&mut self, values: &mut [u32]) {
        debug_assert_eq!(values.len(), self.geometry.volume());

        if !self.is_direct() {
            for value in values.iter_mut() {
                *value = self.table.index_or_insert(*value);
            }
            let needed = bits_to_represent(self.table.len() as u32 - 1).max(self.bits_per_entry);
            if needed > self.max_bits_per_entry {
                for local in values.iter_mut() {
                    *local = self.table.id(*local);
                }
                trace!(from = self.bits_per_entry, "bulk rebuild switched palette to direct mode");
                self.bits_per_entry = DIRECT_BITS_PER_ENTRY;
                self.table = IndirectTable::new();
            } else if needed != self.bits_per_entry {
                trace!(from = self.bits_per_entry, to = needed, "bulk rebuild widened palette");
                self.bits_per_entry = needed;
            }
        }

        let bits = self.bits_per_entry as usize;
        let per_word = entries_per_word(self.bits_per_entry);
        self.words.clear();
        self.words.extend(values.chunks(per_word).map(|chunk| {
            chunk
                .iter()
                .enumerate()
                .fold(0u64, |word, (slot, &local)| word | ((local as u64) << (slot * bits)))
        }));
        self.count = values.iter().filter(|&&local| local != 0).count();
        debug_assert_eq!(self.words.len(), word_count(values.len(), self.bits_per_entry));
    }

    fn visit(&self, include_empty: bool, mut visitor: impl FnMut(i32, i32, i32, u32)) {
        if !include_empty && self.count == 0 {
            return;
        }
        let bits = self.bits_per_entry as usize;
        let mask = entry_mask(self.bits_per_entry);
        let per_word = entries_per_word(self.bits_per_entry);
        let volume = self.geometry.volume();

        for (word_index, &word) in self.words.iter().enumerate() {
            let start = word_index * per_word;
            let end = (start + per_word).min(volume);
            for index in start..end {
                let local = ((word >> ((index - start) * bits)) & mask) as u32;
                if include_empty || local != 0 {
                    let (x, y, z) = self.geometry.coords(index);
                    visitor(x, y, z, self.value_of_local(local));
                }
            }
        }
    }
}

impl Palette for GeneralPalette {
    fn dimension(&self) -> u32 {
        self.geometry.dimension()
    }

    fn get(&self, x: i32, y: i32, z: i32) -> Result<u32, PaletteError> {
        let index = self.geometry.index(x, y, z)?;
        Ok(self.value_at(index))
    }

    fn for_each(&self, visitor: impl FnMut(i32, i32, i32, u32)) {
        self.visit(true, visitor);
    }

    fn for_each_present(&self, visitor: impl FnMut(i32, i32, i32, u32)) {
        self.visit(false, visitor);
    }

    fn count(&self) -> usize {
        self.count
    }

    fn bits_per_entry(&self) -> u8 {
        self.bits_per_entry
    }

    fn set(&mut self, x: i32, y: i32, z: i32, value: u32) -> Result<(), PaletteError> {
        let index = self.geometry.index(x, y, z)?;
        let local = self.palette_index_of(value)?;
        self.write_local(index, local);
        Ok(())
    }

    fn fill(&mut self, value: u32) -> Result<(), PaletteError> {
        if value == 0 {
            self.words.fill(0);
            self.count = 0;
            return Ok(());
        }
        let local = self.palette_index_of(value)? as u64;
        let bits = self.bits_per_entry as usize;
        let word = (0..entries_per_word(self.bits_per_entry))
            .fold(0u64, |word, slot| word | (local << (slot * bits)));
        self.words.fill(word);
        self.count = self.geometry.volume();
        Ok(())
    }

    fn set_all_with(
        &mut self,
        scratch: &mut ScratchBuffer,
        mut supplier: impl FnMut(i32, i32, i32) -> u32,
    ) -> Result<(), PaletteError> {
        let values = scratch.prepare(self.geometry.volume());
        for (index, slot) in values.iter_mut().enumerate() {
            let (x, y, z) = self.geometry.coords(index);
            *slot = check_value(supplier(x, y, z))?;
        }
        let first = values[0];
        if values.iter().all(|&value| value == first) {
            return self.fill(first);
        }
        self.pack_values(values);
        Ok(())
    }

    fn replace(&mut self, x: i32, y: i32, z: i32, value: u32) -> Result<(), PaletteError> {
        if self.get(x, y, z)? != value {
            self.set(x, y, z, value)?;
        }
        Ok(())
    }

    fn replace_all_with(
        &mut self,
        scratch: &mut ScratchBuffer,
        mut function: impl FnMut(i32, i32, i32, u32) -> u32,
    ) -> Result<(), PaletteError> {
        let values = scratch.prepare(self.geometry.volume());
        for (index, slot) in values.iter_mut().enumerate() {
            let (x, y, z) = self.geometry.coords(index);
            *slot = check_value(function(x, y, z, self.value_at(index)))?;
        }
        self.pack_values(values);
        Ok(())
    }
}

impl ProtoEncode for GeneralPalette {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.bits_per_entry);
        if !self.is_direct() {
            VarInt(self.table.len() as i32).proto_encode(buf);
            for &id in self.table.ids() {
                VarInt::from(id).proto_encode(buf);
            }
        }
        write_long_array(buf, &self.words);
    }
}

fn effective_bits(bits_per_entry: u8, max_bits_per_entry: u8) -> u8 {
    if bits_per_entry > max_bits_per_entry {
        DIRECT_BITS_PER_ENTRY
    } else {
        bits_per_entry
    }
}

fn entries_per_word(bits_per_entry: u8) -> usize {
    64 / bits_per_entry as usize
}

fn entry_mask(bits_per_entry: u8) -> u64 {
    (1u64 << bits_per_entry) - 1
}

pub(crate) fn word_count(volume: usize, bits_per_entry: u8) -> usize {
    volume.div_ceil(entries_per_word(bits_per_entry))
}
