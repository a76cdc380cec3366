//! Section storage: adaptive palettes and the chunk section that owns them.

pub mod coords;
pub mod error;
pub mod palette;
pub mod section;
