//! World to section-local coordinate conversion.

/// Edge length of a section in blocks.
pub const SECTION_EDGE: i32 = 16;

const SECTION_SHIFT: u32 = SECTION_EDGE.trailing_zeros();

/// Map a world coordinate onto `[0, dimension)` for a palette of `dimension`
/// cells spanning one section.
///
/// Blocks (`dimension = 16`) keep the low four bits; biomes (`dimension = 4`)
/// group four blocks per cell. Negative coordinates wrap like positive ones.
pub fn section_local(world: i32, dimension: u32) -> i32 {
    let shift = SECTION_SHIFT.saturating_sub(dimension.trailing_zeros());
    (world >> shift) & (dimension as i32 - 1)
}
