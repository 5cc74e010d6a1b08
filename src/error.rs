//! Error types for world configuration and startup

/// Errors surfaced while loading or validating a world.
///
/// Streaming itself never fails: unloaded lookups resolve to
/// [`VoxelType::Nothing`](crate::VoxelType::Nothing) and edits to unloaded
/// chunks are dropped.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, Error>;
