mod config;

use bytes::{Buf, BytesMut};
use config::{InspectConfig, LayerSection};
use cubed_world::coords::SECTION_EDGE;
use cubed_world::palette::{read_palette, AdaptivePalette, Palette, ScratchBuffer, Storage};
use cubed_world::section::ChunkSection;
use tracing::{error, info, warn};

type BoxError = Box<dyn std::error::Error>;

fn main() {
    let path = std::env::args().nth(1).unwrap_or_else(|| "inspect.toml".to_string());
    let config = match InspectConfig::load(&path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load {path}: {e}");
            std::process::exit(1);
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!("cubed-inspect v{} using {}", env!("CARGO_PKG_VERSION"), path);

    if let Err(e) = run(&config) {
        error!("Inspection failed: {e}");
        std::process::exit(1);
    }
}

fn run(config: &InspectConfig) -> Result<(), BoxError> {
    if config.layers.is_empty() {
        warn!("No layers configured, section stays empty");
    }
    let section = build_section(config)?;
    info!("Built section with {} non-air blocks", section.block_count());

    let mut snapshot = section.snapshot();
    describe("blocks", snapshot.blocks_mut());
    describe("biomes", snapshot.biomes_mut());

    let mut buf = BytesMut::new();
    snapshot.write(&mut buf);
    info!("Encoded section: {} bytes", buf.len());

    verify(config, &section, buf)?;
    info!("Decoded section matches");
    Ok(())
}

fn build_section(config: &InspectConfig) -> Result<ChunkSection, BoxError> {
    let mut section = ChunkSection::with_settings(config.palette.blocks, config.palette.biomes)?;
    let mut scratch = ScratchBuffer::with_capacity(section.blocks().volume());

    section
        .blocks_mut()
        .set_all_with(&mut scratch, |_, y, _| top_layer(&config.layers, y).map_or(0, |layer| layer.block))?;

    let scale = SECTION_EDGE / section.biomes().dimension() as i32;
    section.biomes_mut().set_all_with(&mut scratch, |_, y, _| {
        top_layer(&config.layers, y * scale)
            .and_then(|layer| layer.biome)
            .unwrap_or(0)
    })?;
    Ok(section)
}

/// Later layers win where ranges overlap.
fn top_layer(layers: &[LayerSection], y: i32) -> Option<&LayerSection> {
    layers.iter().rev().find(|layer| layer.covers(y))
}

fn describe(name: &str, palette: &mut AdaptivePalette) {
    let mut buf = BytesMut::new();
    palette.write(&mut buf);
    match palette.storage() {
        Storage::Uniform(uniform) => {
            info!("{name}: uniform value {} ({} bytes)", uniform.value(), buf.len())
        }
        Storage::General(general) if general.is_direct() => info!(
            "{name}: direct, {} bits per entry, {} words ({} bytes)",
            general.bits_per_entry(),
            general.words().len(),
            buf.len()
        ),
        Storage::General(general) => info!(
            "{name}: indirect, {} bits per entry, {} palette ids, {} words ({} bytes)",
            general.bits_per_entry(),
            general.palette_len(),
            general.words().len(),
            buf.len()
        ),
    }
}

fn verify(config: &InspectConfig, section: &ChunkSection, buf: BytesMut) -> Result<(), BoxError> {
    let mut bytes = buf.freeze();
    if bytes.remaining() < 2 {
        return Err("encoded section is missing its block count".into());
    }
    let count = bytes.get_i16();
    if usize::try_from(count).ok() != Some(section.block_count()) {
        return Err(format!("block count {count}, expected {}", section.block_count()).into());
    }
    let blocks = read_palette(&mut bytes, config.palette.blocks)?;
    let biomes = read_palette(&mut bytes, config.palette.biomes)?;
    if bytes.has_remaining() {
        return Err(format!("{} trailing bytes", bytes.remaining()).into());
    }
    compare("blocks", section.blocks(), &blocks)?;
    compare("biomes", section.biomes(), &biomes)
}

fn compare(name: &str, expected: &AdaptivePalette, decoded: &AdaptivePalette) -> Result<(), BoxError> {
    let mut mismatch = None;
    expected.for_each(|x, y, z, value| {
        if mismatch.is_none() && decoded.get(x, y, z).ok() != Some(value) {
            mismatch = Some((x, y, z));
        }
    });
    match mismatch {
        Some((x, y, z)) => Err(format!("{name} differ at ({x}, {y}, {z})").into()),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(source: &str) -> InspectConfig {
        toml::from_str(source).unwrap()
    }

    const LAYERED: &str = r#"
        [logging]
        level = "info"

        [[layer]]
        block = 1
        from_y = 0
        to_y = 7
        biome = 2

        [[layer]]
        block = 3
        from_y = 4
        to_y = 4
    "#;

    #[test]
    fn layers_fill_blocks_and_biomes() {
        let config = config(LAYERED);
        let section = build_section(&config).unwrap();
        assert_eq!(section.block(0, 0, 0).unwrap(), 1);
        assert_eq!(section.block(5, 4, 5).unwrap(), 3);
        assert_eq!(section.block(5, 8, 5).unwrap(), 0);
        assert_eq!(section.block_count(), 8 * 256);

        // biome cells cover 4 block rows each
        assert_eq!(section.biomes().get(0, 0, 0).unwrap(), 2);
        assert_eq!(section.biomes().get(0, 1, 0).unwrap(), 0);
        assert_eq!(section.biomes().get(0, 2, 0).unwrap(), 0);
    }

    #[test]
    fn encoded_section_verifies() {
        let config = config(LAYERED);
        let section = build_section(&config).unwrap();
        let mut snapshot = section.snapshot();
        let mut buf = BytesMut::new();
        snapshot.write(&mut buf);
        verify(&config, &section, buf).unwrap();
    }

    #[test]
    fn verify_rejects_truncated_output() {
        let config = config(LAYERED);
        let section = build_section(&config).unwrap();
        let mut snapshot = section.snapshot();
        let mut buf = BytesMut::new();
        snapshot.write(&mut buf);
        buf.truncate(buf.len() - 1);
        assert!(verify(&config, &section, buf).is_err());
    }

    #[test]
    fn verify_rejects_wrong_block_count() {
        let config = config(LAYERED);
        let section = build_section(&config).unwrap();
        let mut snapshot = section.snapshot();
        let mut buf = BytesMut::new();
        snapshot.write(&mut buf);
        buf[0] = 0xFF;
        buf[1] = 0xFF;
        assert!(verify(&config, &section, buf).is_err());
    }

    #[test]
    fn oversized_block_palette_is_rejected() {
        let config = config(
            r#"
            [logging]
            level = "info"

            [palette.blocks]
            dimension = 32
            max_bits_per_entry = 8
            default_bits_per_entry = 4
            "#,
        );
        assert!(build_section(&config).is_err());
    }

    #[test]
    fn empty_config_builds_empty_section() {
        let config = config("[logging]\nlevel = \"warn\"\n");
        let section = build_section(&config).unwrap();
        assert!(section.is_empty());
        // bulk writes leave packed storage until the next write optimizes it
        assert!(!section.blocks().is_uniform());
        assert_eq!(section.blocks().count(), 0);

        let mut snapshot = section.snapshot();
        let mut buf = BytesMut::new();
        snapshot.write(&mut buf);
        assert!(snapshot.blocks().is_uniform());
        assert!(snapshot.biomes().is_uniform());
        verify(&config, &section, buf).unwrap();
    }
}
