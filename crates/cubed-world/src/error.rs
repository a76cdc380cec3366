//! Palette and section errors.

use cubed_proto::error::ProtoError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PaletteError {
    #[error("{axis} coordinate {value} is outside [0, {dimension})")]
    OutOfRange {
        axis: char,
        value: i32,
        dimension: u32,
    },

    #[error("dimension must be a power of two between 2 and {max}, got {dimension}")]
    InvalidDimension { dimension: u32, max: u32 },

    #[error("invalid bits per entry: default {default_bits}, max {max_bits}")]
    InvalidBits { default_bits: u8, max_bits: u8 },

    #[error("operation `{0}` is unsupported for uniform representation")]
    Unsupported(&'static str),

    #[error("global id {value} does not fit in {bits} bits")]
    ValueTooLarge { value: u32, bits: u8 },

    #[error("decode error: {0}")]
    Decode(#[from] ProtoError),

    #[error("malformed palette: {0}")]
    Malformed(String),
}
