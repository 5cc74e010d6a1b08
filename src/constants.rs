// World constants
pub const DEFAULT_CHUNK_WIDTH: i32 = 16;
pub const DEFAULT_CHUNK_HEIGHT: i32 = 64;
pub const DEFAULT_RENDER_RADIUS: i32 = 8;
pub const DEFAULT_WATER_LEVEL: i32 = 16;
pub const DEFAULT_SHORE_HEIGHT: i32 = 1;
pub const DEFAULT_SEED: i32 = 2147;

// Streaming
pub const DEFAULT_CHECK_DELAY_MS: u64 = 1000;

// Generation
pub const UNDERGROUND_DEPTH: i32 = 4;
pub const FEATURE_NOISE_THRESHOLD: f32 = 0.7;
pub const BIOME_NEIGHBOR_SAMPLES: usize = 4;

// Atlas and meshing
pub const ATLAS_TILES: u32 = 4;
pub const TEXTURE_OFFSET: f32 = 0.001;
pub const VOXEL_HALF_EXTENT: f32 = 0.5;
pub const WATER_HALF_HEIGHT: f32 = 0.4;
