//! Protocol encoding/decoding traits and helpers.

use bytes::{Buf, BufMut};

use crate::error::ProtoError;
use crate::types::VarInt;

/// Encode a value onto a buffer.
pub trait ProtoEncode {
    fn proto_encode(&self, buf: &mut impl BufMut);
}

/// Decode a value from a buffer.
pub trait ProtoDecode: Sized {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError>;
}

impl ProtoEncode for u8 {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(*self);
    }
}

impl ProtoDecode for u8 {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        ensure_remaining(buf, 1)?;
        Ok(buf.get_u8())
    }
}

/// Longs go over the wire big-endian.
impl ProtoEncode for u64 {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_u64(*self);
    }
}

impl ProtoDecode for u64 {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        ensure_remaining(buf, 8)?;
        Ok(buf.get_u64())
    }
}

/// Write a long array (VarInt length + big-endian u64 words).
pub fn write_long_array(buf: &mut impl BufMut, words: &[u64]) {
    VarInt(words.len() as i32).proto_encode(buf);
    for word in words {
        word.proto_encode(buf);
    }
}

/// Read a long array (VarInt length + big-endian u64 words).
pub fn read_long_array(buf: &mut impl Buf) -> Result<Vec<u64>, ProtoError> {
    let len = read_length(buf)?;
    ensure_remaining(buf, len.saturating_mul(8))?;
    let mut words = Vec::with_capacity(len);
    for _ in 0..len {
        words.push(buf.get_u64());
    }
    Ok(words)
}

/// Read a VarInt that must be a non-negative length or count.
pub fn read_length(buf: &mut impl Buf) -> Result<usize, ProtoError> {
    let len = VarInt::proto_decode(buf)?.0;
    usize::try_from(len).map_err(|_| ProtoError::InvalidData(format!("negative length {len}")))
}

fn ensure_remaining(buf: &impl Buf, needed: usize) -> Result<(), ProtoError> {
    if buf.remaining() < needed {
        return Err(ProtoError::BufferTooShort {
            needed,
            remaining: buf.remaining(),
        });
    }
    Ok(())
}
