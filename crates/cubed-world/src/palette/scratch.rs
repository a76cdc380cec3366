//! Reusable staging buffer for bulk palette rebuilds.

/// Caller-owned buffer that `set_all_with`/`replace_all_with` stage a whole
/// volume in before packing it.
///
/// Keep one per section (or per worker) and pass it to every bulk operation to
/// avoid reallocating `dimension³` entries each time.
#[derive(Debug, Default)]
pub struct ScratchBuffer {
    values: Vec<u32>,
}

impl ScratchBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(volume: usize) -> Self {
        Self {
            values: Vec::with_capacity(volume),
        }
    }

    pub fn capacity(&self) -> usize {
        self.values.capacity()
    }

    /// Slice of exactly `volume` entries. Contents are unspecified.
    pub(crate) fn prepare(&mut self, volume: usize) -> &mut [u32] {
        self.values.resize(volume, 0);
        &mut self.values[..volume]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepare_sizes_to_volume() {
        let mut scratch = ScratchBuffer::new();
        assert_eq!(scratch.prepare(64).len(), 64);
        assert_eq!(scratch.prepare(4096).len(), 4096);
        assert_eq!(scratch.prepare(64).len(), 64);
        assert!(scratch.capacity() >= 4096);
    }

    #[test]
    fn with_capacity_preallocates() {
        let scratch = ScratchBuffer::with_capacity(4096);
        assert!(scratch.capacity() >= 4096);
    }
}
