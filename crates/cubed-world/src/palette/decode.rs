//! Reading palettes back from their wire form.

use bytes::Buf;
use cubed_proto::codec::{read_length, read_long_array, ProtoDecode};
use cubed_proto::types::VarInt;

use super::adaptive::AdaptivePalette;
use super::general::word_count;
use super::settings::PaletteSettings;
use super::{check_value, DIRECT_BITS_PER_ENTRY};
use crate::error::PaletteError;

/// Parse one encoded palette into a fresh [`AdaptivePalette`] with `settings`.
///
/// Any width in `1..=16` is accepted; the decoded palette picks its own
/// representation, so re-encoding may differ from the input while holding the
/// same content.
pub fn read_palette(buf: &mut impl Buf, settings: PaletteSettings) -> Result<AdaptivePalette, PaletteError> {
    let geometry = settings.validate()?;
    let volume = geometry.volume();
    let bits = u8::proto_decode(buf)?;

    if bits == 0 {
        let value = read_id(buf)?;
        let words = read_length(buf)?;
        if words != 0 {
            return Err(PaletteError::Malformed(format!(
                "uniform palette carries {words} data words"
            )));
        }
        let mut values = vec![value; volume];
        return Ok(AdaptivePalette::from_values(settings, geometry, &mut values));
    }
    if bits > DIRECT_BITS_PER_ENTRY {
        return Err(PaletteError::Malformed(format!("{bits} bits per entry")));
    }

    let table = if bits <= settings.max_bits_per_entry {
        let len = read_length(buf)?;
        if len == 0 || len > 1 << bits {
            return Err(PaletteError::Malformed(format!(
                "table of {len} ids at {bits} bits per entry"
            )));
        }
        Some((0..len).map(|_| read_id(buf)).collect::<Result<Vec<_>, _>>()?)
    } else {
        None
    };

    let words = read_long_array(buf)?;
    let expected = word_count(volume, bits);
    if words.len() != expected {
        return Err(PaletteError::Malformed(format!(
            "expected {expected} data words, got {}",
            words.len()
        )));
    }

    let per_word = 64 / bits as usize;
    let mask = (1u64 << bits) - 1;
    let mut values = Vec::with_capacity(volume);
    for index in 0..volume {
        let word = words[index / per_word];
        let local = ((word >> ((index % per_word) * bits as usize)) & mask) as u32;
        let value = match &table {
            Some(ids) => *ids.get(local as usize).ok_or_else(|| {
                PaletteError::Malformed(format!("palette index {local} past table of {}", ids.len()))
            })?,
            None => local,
        };
        values.push(value);
    }
    Ok(AdaptivePalette::from_values(settings, geometry, &mut values))
}

fn read_id(buf: &mut impl Buf) -> Result<u32, PaletteError> {
    let id = VarInt::proto_decode(buf)?.0;
    let id = u32::try_from(id).map_err(|_| PaletteError::Malformed(format!("negative id {id}")))?;
    check_value(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::{Palette, UniformPalette};
    use bytes::{BufMut, BytesMut};
    use cubed_proto::codec::{write_long_array, ProtoEncode};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn assert_same_content(left: &AdaptivePalette, right: &AdaptivePalette) {
        let dimension = left.dimension() as i32;
        for y in 0..dimension {
            for z in 0..dimension {
                for x in 0..dimension {
                    assert_eq!(
                        left.get(x, y, z).unwrap(),
                        right.get(x, y, z).unwrap(),
                        "mismatch at ({x}, {y}, {z})"
                    );
                }
            }
        }
    }

    fn roundtrip(palette: &mut AdaptivePalette) -> AdaptivePalette {
        let mut buf = BytesMut::new();
        palette.write(&mut buf);
        let mut bytes = buf.freeze();
        let decoded = read_palette(&mut bytes, palette.settings()).unwrap();
        assert!(!bytes.has_remaining(), "trailing bytes after palette");
        decoded
    }

    #[test]
    fn uniform_roundtrip() {
        let mut palette = AdaptivePalette::blocks();
        palette.fill(9).unwrap();
        let decoded = roundtrip(&mut palette);
        assert!(decoded.is_uniform());
        assert_eq!(decoded.get(3, 3, 3).unwrap(), 9);
        assert_eq!(decoded.count(), 4096);
    }

    #[test]
    fn random_sets_roundtrip() {
        let mut rng = StdRng::seed_from_u64(42);
        for distinct in [2u32, 9, 40, 200, 5000] {
            let mut palette = AdaptivePalette::blocks();
            for _ in 0..2000 {
                let (x, y, z) = (rng.gen_range(0..16), rng.gen_range(0..16), rng.gen_range(0..16));
                palette.set(x, y, z, rng.gen_range(0..distinct)).unwrap();
            }
            let decoded = roundtrip(&mut palette);
            assert_same_content(&palette, &decoded);
            assert_eq!(decoded.count(), palette.count());
        }
    }

    #[test]
    fn biome_roundtrip() {
        let mut palette = AdaptivePalette::biomes();
        palette.set_all(|x, y, z| ((x ^ y ^ z) % 3) as u32 + 1).unwrap();
        let decoded = roundtrip(&mut palette);
        assert_same_content(&palette, &decoded);
    }

    #[test]
    fn reencoding_is_stable() {
        let mut palette = AdaptivePalette::blocks();
        palette.set_all(|x, _, z| (x * 2 + z) as u32 % 13).unwrap();
        let mut first = BytesMut::new();
        palette.write(&mut first);

        let mut decoded = read_palette(&mut first.clone().freeze(), PaletteSettings::BLOCKS).unwrap();
        let mut second = BytesMut::new();
        decoded.write(&mut second);
        assert_eq!(first, second);
    }

    #[test]
    fn accepts_foreign_direct_width() {
        // A 15-bit direct encoding of a biome-sized volume.
        let mut buf = BytesMut::new();
        buf.put_u8(15);
        let mut words = vec![0u64; 16];
        words[0] = 300 | (301 << 15);
        write_long_array(&mut buf, &words);

        let decoded = read_palette(&mut buf.freeze(), PaletteSettings::BIOMES).unwrap();
        assert_eq!(decoded.get(0, 0, 0).unwrap(), 300);
        assert_eq!(decoded.get(1, 0, 0).unwrap(), 301);
        assert_eq!(decoded.get(2, 0, 0).unwrap(), 0);
        assert_eq!(decoded.count(), 2);
    }

    #[test]
    fn rejects_uniform_with_data() {
        let mut buf = BytesMut::new();
        UniformPalette::new(16, 1).unwrap().proto_encode(&mut buf);
        buf[2] = 1;
        buf.put_u64(0);
        assert!(matches!(
            read_palette(&mut buf.freeze(), PaletteSettings::BLOCKS),
            Err(PaletteError::Malformed(_))
        ));
    }

    #[test]
    fn rejects_wrong_word_count() {
        let mut buf = BytesMut::new();
        buf.put_u8(4);
        VarInt(1).proto_encode(&mut buf);
        VarInt(0).proto_encode(&mut buf);
        write_long_array(&mut buf, &[0; 10]);
        assert!(matches!(
            read_palette(&mut buf.freeze(), PaletteSettings::BLOCKS),
            Err(PaletteError::Malformed(_))
        ));
    }

    #[test]
    fn rejects_index_past_table() {
        let mut buf = BytesMut::new();
        buf.put_u8(1);
        VarInt(1).proto_encode(&mut buf);
        VarInt(0).proto_encode(&mut buf);
        write_long_array(&mut buf, &[0b10]);
        assert!(matches!(
            read_palette(&mut buf.freeze(), PaletteSettings::BIOMES),
            Err(PaletteError::Malformed(_))
        ));
    }

    #[test]
    fn rejects_oversized_table_and_width() {
        let mut buf = BytesMut::new();
        buf.put_u8(1);
        VarInt(3).proto_encode(&mut buf);
        assert!(read_palette(&mut buf.freeze(), PaletteSettings::BIOMES).is_err());

        let mut buf = BytesMut::new();
        buf.put_u8(17);
        assert!(matches!(
            read_palette(&mut buf.freeze(), PaletteSettings::BLOCKS),
            Err(PaletteError::Malformed(_))
        ));
    }

    #[test]
    fn rejects_negative_id() {
        let mut buf = BytesMut::new();
        buf.put_u8(0);
        VarInt(-5).proto_encode(&mut buf);
        VarInt(0).proto_encode(&mut buf);
        assert!(matches!(
            read_palette(&mut buf.freeze(), PaletteSettings::BLOCKS),
            Err(PaletteError::Malformed(_))
        ));
    }

    #[test]
    fn truncated_input_is_decode_error() {
        let mut palette = AdaptivePalette::blocks();
        palette.set(0, 0, 0, 1).unwrap();
        let mut buf = BytesMut::new();
        palette.write(&mut buf);
        let truncated = buf.freeze().slice(..100);
        assert!(matches!(
            read_palette(&mut truncated.clone(), PaletteSettings::BLOCKS),
            Err(PaletteError::Decode(_))
        ));
    }
}
