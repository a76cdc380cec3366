//! Wire primitives for the voxel chunk protocol.

pub mod codec;
pub mod error;
pub mod types;
