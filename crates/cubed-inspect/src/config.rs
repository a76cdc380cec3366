use cubed_world::palette::PaletteSettings;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct InspectConfig {
    pub logging: LoggingSection,
    #[serde(default)]
    pub palette: PaletteSection,
    #[serde(default, rename = "layer")]
    pub layers: Vec<LayerSection>,
}

#[derive(Debug, Deserialize)]
pub struct LoggingSection {
    pub level: String,
}

#[derive(Debug, Deserialize)]
pub struct PaletteSection {
    #[serde(default = "default_blocks")]
    pub blocks: PaletteSettings,
    #[serde(default = "default_biomes")]
    pub biomes: PaletteSettings,
}

fn default_blocks() -> PaletteSettings {
    PaletteSettings::BLOCKS
}

fn default_biomes() -> PaletteSettings {
    PaletteSettings::BIOMES
}

impl Default for PaletteSection {
    fn default() -> Self {
        Self {
            blocks: default_blocks(),
            biomes: default_biomes(),
        }
    }
}

/// Horizontal slab of one block state, `from_y..=to_y` in section-local Y.
#[derive(Debug, Deserialize)]
pub struct LayerSection {
    pub block: u32,
    pub from_y: i32,
    pub to_y: i32,
    #[serde(default)]
    pub biome: Option<u32>,
}

impl LayerSection {
    pub fn covers(&self, y: i32) -> bool {
        (self.from_y..=self.to_y).contains(&y)
    }
}

impl InspectConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minimal_config() {
        let config: InspectConfig = toml::from_str(
            r#"
            [logging]
            level = "debug"
            "#,
        )
        .unwrap();
        assert_eq!(config.logging.level, "debug");
        // palette presets default when absent
        assert_eq!(config.palette.blocks, PaletteSettings::BLOCKS);
        assert_eq!(config.palette.biomes, PaletteSettings::BIOMES);
        assert!(config.layers.is_empty());
    }

    #[test]
    fn parse_layers_and_palettes() {
        let config: InspectConfig = toml::from_str(
            r#"
            [logging]
            level = "info"

            [palette.biomes]
            dimension = 8
            max_bits_per_entry = 4
            default_bits_per_entry = 2

            [[layer]]
            block = 1
            from_y = 0
            to_y = 3
            biome = 7

            [[layer]]
            block = 9
            from_y = 4
            to_y = 4
            "#,
        )
        .unwrap();
        assert_eq!(config.palette.blocks, PaletteSettings::BLOCKS);
        assert_eq!(config.palette.biomes.dimension, 8);
        assert_eq!(config.layers.len(), 2);
        assert_eq!(config.layers[0].biome, Some(7));
        assert_eq!(config.layers[1].biome, None);
        assert!(config.layers[0].covers(3));
        assert!(!config.layers[0].covers(4));
        assert!(config.layers[1].covers(4));
    }

    #[test]
    fn missing_logging_is_rejected() {
        assert!(toml::from_str::<InspectConfig>("[[layer]]\nblock = 1\nfrom_y = 0\nto_y = 0\n").is_err());
    }
}
