//! Configuration loaded once at startup and shared read-only afterwards.

pub mod settings;

pub use settings::{
    AtlasSettings, BiomeSettings, CactusSettings, FeatureSettings, NoiseSettings,
    PlacementSettings, StoneSettings, TreeSettings, VoxelEntry, WorldSettings,
};
