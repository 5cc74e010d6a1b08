// Core module with fundamental types
pub mod core;

// Render module with mesh building and the render sink boundary
pub mod render;

// World module with generation and streaming
pub mod world;

// Settings loaded from TOML
pub mod utils;

// Other modules
pub mod constants;
pub mod error;

// Re-exports
pub use constants::*;
pub use self::core::{
    FeatureData, FeatureKind, Vertex, VoxelCatalog, VoxelGrid, VoxelProperties, VoxelType,
};
pub use error::{Error, Result};
pub use render::{
    ChunkMesh, CollisionBuffers, Direction, MergedMesh, MeshBuffers, MeshBuilder, NullSink,
    RecordingSink, RenderSink,
};
pub use utils::WorldSettings;
pub use world::{
    BiomeMap, ChunkMap, NoiseField, NoiseParams, StreamingSet, TerrainGenerator, TickScheduler,
    World, WorldIndex, chunk_ring, drive,
};
