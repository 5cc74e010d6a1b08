use glam::{IVec2, IVec3, UVec2};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::constants::*;
use crate::core::voxel::{VoxelProperties, VoxelType};
use crate::error::{Error, Result};
use crate::world::noise::NoiseParams;

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct WorldSettings {
    pub chunk_width: i32,
    pub chunk_height: i32,
    pub render_radius: i32,
    pub seed: i32,
    pub water_level: i32,
    pub shore_height: i32,
    pub check_delay_ms: u64,
    pub noise: NoiseSettings,
    pub atlas: AtlasSettings,
    /// Overrides on top of the built-in voxel table.
    pub voxels: Vec<VoxelEntry>,
    /// Priority ordered; the first biome is the fallback.
    pub biomes: Vec<BiomeSettings>,
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            chunk_width: DEFAULT_CHUNK_WIDTH,
            chunk_height: DEFAULT_CHUNK_HEIGHT,
            render_radius: DEFAULT_RENDER_RADIUS,
            seed: DEFAULT_SEED,
            water_level: DEFAULT_WATER_LEVEL,
            shore_height: DEFAULT_SHORE_HEIGHT,
            check_delay_ms: DEFAULT_CHECK_DELAY_MS,
            noise: NoiseSettings::default(),
            atlas: AtlasSettings::default(),
            voxels: Vec::new(),
            biomes: default_biomes(),
        }
    }
}

impl WorldSettings {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let settings = Self::from_toml_str(&content)?;
        tracing::info!(
            "Loaded world settings from {} ({} biomes)",
            path.as_ref().display(),
            settings.biomes.len()
        );
        Ok(settings)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let settings: WorldSettings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Rejects configurations that would break streaming mid-run.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_width <= 0 || self.chunk_height <= 0 {
            return Err(invalid(format!(
                "chunk dimensions must be positive, got {}x{}",
                self.chunk_width, self.chunk_height
            )));
        }
        if self.render_radius < 1 {
            return Err(invalid(format!(
                "render_radius must be at least 1, got {}",
                self.render_radius
            )));
        }
        if self.water_level < 0 || self.water_level >= self.chunk_height {
            return Err(invalid(format!(
                "water_level {} outside chunk height {}",
                self.water_level, self.chunk_height
            )));
        }
        if self.shore_height < 0 {
            return Err(invalid("shore_height must be non-negative".to_string()));
        }
        if self.check_delay_ms == 0 {
            return Err(invalid("check_delay_ms must be positive".to_string()));
        }

        self.noise.temperature.validate("noise.temperature")?;
        self.noise.precipitation.validate("noise.precipitation")?;
        self.noise.warp_x.validate("noise.warp_x")?;
        self.noise.warp_z.validate("noise.warp_z")?;
        if self.noise.warp_amplitude_x < 0.0 || self.noise.warp_amplitude_z < 0.0 {
            return Err(invalid("warp amplitudes must be non-negative".to_string()));
        }

        self.atlas.validate()?;

        for entry in &self.voxels {
            if matches!(entry.kind, VoxelType::Nothing | VoxelType::Air) && entry.is_solid {
                return Err(invalid(format!("{:?} cannot be solid", entry.kind)));
            }
        }

        if self.biomes.is_empty() {
            return Err(invalid("at least one biome is required".to_string()));
        }
        for biome in &self.biomes {
            biome.validate()?;
        }
        Ok(())
    }

    /// Channel parameters with the world seed folded in.
    pub fn seeded(&self, params: NoiseParams) -> NoiseParams {
        params.reseeded(self.seed)
    }
}

fn invalid(message: String) -> Error {
    Error::InvalidConfig(message)
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct NoiseSettings {
    pub temperature: NoiseParams,
    pub precipitation: NoiseParams,
    pub warp_x: NoiseParams,
    pub warp_z: NoiseParams,
    pub warp_amplitude_x: f32,
    pub warp_amplitude_z: f32,
}

impl Default for NoiseSettings {
    fn default() -> Self {
        Self {
            temperature: NoiseParams {
                seed: 101,
                octaves: 3,
                magnitude: 0.004,
                ..NoiseParams::default()
            },
            precipitation: NoiseParams {
                seed: 202,
                octaves: 3,
                magnitude: 0.005,
                ..NoiseParams::default()
            },
            warp_x: NoiseParams {
                seed: 303,
                octaves: 2,
                magnitude: 0.02,
                ..NoiseParams::default()
            },
            warp_z: NoiseParams {
                seed: 404,
                octaves: 2,
                magnitude: 0.02,
                ..NoiseParams::default()
            },
            warp_amplitude_x: 20.0,
            warp_amplitude_z: 20.0,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct AtlasSettings {
    pub tiles_x: u32,
    pub tiles_y: u32,
    /// Inward inset on every tile edge, in UV units.
    pub texture_offset: f32,
}

impl Default for AtlasSettings {
    fn default() -> Self {
        Self {
            tiles_x: ATLAS_TILES,
            tiles_y: ATLAS_TILES,
            texture_offset: TEXTURE_OFFSET,
        }
    }
}

impl AtlasSettings {
    fn validate(&self) -> Result<()> {
        if self.tiles_x == 0 || self.tiles_y == 0 {
            return Err(invalid("atlas tile counts must be positive".to_string()));
        }
        let max_offset = 0.5 / self.tiles_x.max(self.tiles_y) as f32;
        if !(self.texture_offset >= 0.0 && self.texture_offset < max_offset) {
            return Err(invalid(format!(
                "texture_offset {} must be in [0, {max_offset})",
                self.texture_offset
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct VoxelEntry {
    pub kind: VoxelType,
    pub is_solid: bool,
    pub generates_collider: bool,
    pub top: UVec2,
    pub bottom: UVec2,
    pub side: UVec2,
}

impl VoxelEntry {
    pub fn properties(&self) -> VoxelProperties {
        VoxelProperties::new(
            self.is_solid,
            self.generates_collider,
            self.top,
            self.bottom,
            self.side,
        )
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct BiomeSettings {
    pub name: String,
    /// `[min, max)` of the anchor's temperature sample.
    pub temperature: [f32; 2],
    /// `[min, max)` of the anchor's precipitation sample.
    pub precipitation: [f32; 2],
    pub height: NoiseParams,
    pub use_domain_warp: bool,
    pub surface: VoxelType,
    pub underwater: VoxelType,
    pub shore: VoxelType,
    pub underground: VoxelType,
    pub deep_underground: VoxelType,
    pub features: Vec<FeatureSettings>,
}

impl Default for BiomeSettings {
    fn default() -> Self {
        Self {
            name: "plains".to_string(),
            temperature: [0.0, 1.0],
            precipitation: [0.0, 1.0],
            height: NoiseParams {
                seed: 11,
                octaves: 4,
                magnitude: 0.01,
                persistence: 0.5,
                modifier: 1.3,
                plateau_exponent: 2.5,
                offset: IVec2::ZERO,
            },
            use_domain_warp: true,
            surface: VoxelType::Grass,
            underwater: VoxelType::Sand,
            shore: VoxelType::Sand,
            underground: VoxelType::Dirt,
            deep_underground: VoxelType::Stone,
            features: Vec::new(),
        }
    }
}

impl BiomeSettings {
    fn validate(&self) -> Result<()> {
        let name = &self.name;
        if self.temperature[0] > self.temperature[1] || self.precipitation[0] > self.precipitation[1] {
            return Err(invalid(format!("biome {name}: climate range min exceeds max")));
        }
        self.height.validate(&format!("biome {name} height"))?;
        for feature in &self.features {
            feature.validate(name)?;
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeatureSettings {
    Stone(StoneSettings),
    Trees(TreeSettings),
    Cacti(CactusSettings),
}

impl FeatureSettings {
    fn validate(&self, biome: &str) -> Result<()> {
        match self {
            FeatureSettings::Stone(stone) => {
                stone.noise.validate(&format!("biome {biome} stone"))
            }
            FeatureSettings::Trees(trees) => trees.placement.validate(biome, "trees"),
            FeatureSettings::Cacti(cacti) => cacti.placement.validate(biome, "cacti"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct StoneSettings {
    pub noise: NoiseParams,
    pub limit: f32,
}

impl Default for StoneSettings {
    fn default() -> Self {
        Self {
            noise: NoiseParams {
                seed: 505,
                octaves: 2,
                magnitude: 0.06,
                ..NoiseParams::default()
            },
            limit: 0.68,
        }
    }
}

/// Parameters shared by every separation-constrained column feature.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct PlacementSettings {
    pub noise: NoiseParams,
    pub threshold: f32,
    /// Scan range above the chunk's y-origin.
    pub height_limit: i32,
    pub min_height: i32,
    pub max_height: i32,
    pub separation: f32,
}

impl Default for PlacementSettings {
    fn default() -> Self {
        Self {
            noise: NoiseParams {
                seed: 606,
                octaves: 1,
                magnitude: 0.9,
                ..NoiseParams::default()
            },
            threshold: FEATURE_NOISE_THRESHOLD,
            height_limit: 48,
            min_height: 4,
            max_height: 8,
            separation: 5.0,
        }
    }
}

impl PlacementSettings {
    fn validate(&self, biome: &str, feature: &str) -> Result<()> {
        self.noise.validate(&format!("biome {biome} {feature}"))?;
        if self.min_height < 1 || self.min_height > self.max_height {
            return Err(invalid(format!(
                "biome {biome} {feature}: height range [{}, {}] is invalid",
                self.min_height, self.max_height
            )));
        }
        if self.height_limit < 0 || !(self.separation >= 0.0) {
            return Err(invalid(format!(
                "biome {biome} {feature}: height_limit and separation must be non-negative"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct TreeSettings {
    #[serde(flatten)]
    pub placement: PlacementSettings,
    /// Leaf offsets relative to the trunk top.
    pub leaves: Vec<IVec3>,
    pub require_local_maximum: bool,
}

impl Default for TreeSettings {
    fn default() -> Self {
        Self {
            placement: PlacementSettings::default(),
            leaves: default_leaf_template(),
            require_local_maximum: false,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct CactusSettings {
    #[serde(flatten)]
    pub placement: PlacementSettings,
}

impl Default for CactusSettings {
    fn default() -> Self {
        Self {
            placement: PlacementSettings {
                noise: NoiseParams {
                    seed: 707,
                    octaves: 1,
                    magnitude: 0.9,
                    ..NoiseParams::default()
                },
                height_limit: 48,
                min_height: 2,
                max_height: 4,
                separation: 2.0,
                ..PlacementSettings::default()
            },
        }
    }
}

/// Two wide layers below the trunk top, a narrow ring level with it and a cap.
/// The trunk column itself is left out.
pub fn default_leaf_template() -> Vec<IVec3> {
    let mut leaves = Vec::new();
    for y in -2..=-1 {
        for x in -2i32..=2 {
            for z in -2i32..=2 {
                if (x, z) != (0, 0) && !(x.abs() == 2 && z.abs() == 2) {
                    leaves.push(IVec3::new(x, y, z));
                }
            }
        }
    }
    for x in -1..=1 {
        for z in -1..=1 {
            if (x, z) != (0, 0) {
                leaves.push(IVec3::new(x, 0, z));
            }
        }
    }
    leaves.push(IVec3::new(0, 1, 0));
    leaves
}

fn default_biomes() -> Vec<BiomeSettings> {
    let plains = BiomeSettings {
        name: "plains".to_string(),
        temperature: [0.35, 0.6],
        precipitation: [0.0, 1.0],
        features: vec![
            FeatureSettings::Stone(StoneSettings::default()),
            FeatureSettings::Trees(TreeSettings::default()),
        ],
        ..BiomeSettings::default()
    };

    let snowy = BiomeSettings {
        name: "snowy".to_string(),
        temperature: [0.0, 0.35],
        precipitation: [0.0, 1.0],
        height: NoiseParams {
            seed: 12,
            modifier: 1.5,
            plateau_exponent: 2.0,
            ..plains.height
        },
        surface: VoxelType::Snow,
        underwater: VoxelType::Ice,
        shore: VoxelType::Snow,
        features: vec![FeatureSettings::Stone(StoneSettings::default())],
        ..BiomeSettings::default()
    };

    let desert = BiomeSettings {
        name: "desert".to_string(),
        temperature: [0.6, 1.0],
        precipitation: [0.0, 0.5],
        height: NoiseParams {
            seed: 13,
            modifier: 1.1,
            plateau_exponent: 1.5,
            ..plains.height
        },
        surface: VoxelType::Sand,
        underwater: VoxelType::Sand,
        shore: VoxelType::Sand,
        underground: VoxelType::Sand,
        deep_underground: VoxelType::SandStone,
        features: vec![FeatureSettings::Cacti(CactusSettings::default())],
        ..BiomeSettings::default()
    };

    let forest = BiomeSettings {
        name: "forest".to_string(),
        temperature: [0.6, 1.0],
        precipitation: [0.5, 1.0],
        height: NoiseParams {
            seed: 14,
            ..plains.height
        },
        features: vec![FeatureSettings::Trees(TreeSettings {
            placement: PlacementSettings {
                threshold: 0.6,
                separation: 4.0,
                ..PlacementSettings::default()
            },
            ..TreeSettings::default()
        })],
        ..BiomeSettings::default()
    };

    vec![plains, snowy, desert, forest]
}
