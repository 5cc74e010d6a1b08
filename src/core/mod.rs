//! Core data structures for the world
//! Contains voxel types and properties, chunk grids, and vertices.

pub mod chunk;
pub mod vertex;
pub mod voxel;

// Re-export commonly used types
pub use chunk::{FeatureData, FeatureKind, VoxelGrid, chunk_origin_of};
pub use vertex::Vertex;
pub use voxel::{VoxelCatalog, VoxelProperties, VoxelType};
