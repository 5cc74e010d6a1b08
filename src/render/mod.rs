//! Rendering-related modules
//! Contains the face-culling mesh builder and the render sink boundary.

pub mod mesh;
pub mod sink;

// Re-export commonly used types
pub use mesh::{ChunkMesh, CollisionBuffers, Direction, MergedMesh, MeshBuffers, MeshBuilder};
pub use sink::{MeshStats, NullSink, RecordingSink, RenderSink};
