//! World generation and streaming modules
//! Contains noise, biomes, the layer pipeline, feature placement and the streamer.

pub mod biome;
pub mod features;
pub mod generator;
pub mod index;
pub mod layers;
pub mod noise;
pub mod scheduler;
pub mod streamer;

// Re-export commonly used types
pub use biome::{Biome, BiomeAnchor, BiomeMap, BiomeSelection};
pub use features::FeaturePlacer;
pub use generator::TerrainGenerator;
pub use index::{ChunkMap, WorldIndex};
pub use layers::{LayerHandler, LayerPipeline};
pub use noise::{DomainWarp, NoiseField, NoiseGrid, NoiseParams, local_maxima};
pub use scheduler::{TickScheduler, drive};
pub use streamer::{StreamingSet, World, chunk_ring};
