//! Ordered column-fill handlers
//!
//! Per-voxel handlers run for every `y` of a column and the first one that
//! claims the voxel wins. Per-column handlers run once afterwards with `y`
//! pinned to the chunk's y-origin and scan whatever range they need.

use glam::IVec3;

use crate::constants::UNDERGROUND_DEPTH;
use crate::core::chunk::VoxelGrid;
use crate::core::voxel::VoxelType;
use crate::utils::settings::{BiomeSettings, FeatureSettings, StoneSettings, WorldSettings};
use crate::world::features::FeaturePlacer;
use crate::world::noise::NoiseField;

/// One link of the fill chain. `pos` is chunk-local, `ground` is a world y.
pub trait LayerHandler: Send {
    /// Returns true when the position was claimed and the chain should stop.
    fn attempt(&self, grid: &mut VoxelGrid, pos: IVec3, ground: i32) -> bool;
}

fn world_y(grid: &VoxelGrid, pos: IVec3) -> i32 {
    grid.origin().y + pos.y
}

pub struct BedrockLayer;

impl LayerHandler for BedrockLayer {
    fn attempt(&self, grid: &mut VoxelGrid, pos: IVec3, _ground: i32) -> bool {
        if world_y(grid, pos) != 0 {
            return false;
        }
        grid.set(pos, VoxelType::Bedrock);
        true
    }
}

/// Everything strictly below ground: a shallow band of `underground` and
/// `deep` beneath it.
pub struct UndergroundLayer {
    pub underground: VoxelType,
    pub deep: VoxelType,
    pub depth: i32,
}

impl LayerHandler for UndergroundLayer {
    fn attempt(&self, grid: &mut VoxelGrid, pos: IVec3, ground: i32) -> bool {
        let y = world_y(grid, pos);
        if y >= ground {
            return false;
        }
        let voxel = if y > ground - self.depth {
            self.underground
        } else {
            self.deep
        };
        grid.set(pos, voxel);
        true
    }
}

pub struct SurfaceLayer {
    pub surface: VoxelType,
    pub underwater: VoxelType,
    pub shore: VoxelType,
    pub water_level: i32,
    pub shore_height: i32,
}

impl SurfaceLayer {
    pub fn voxel_for(&self, y: i32) -> VoxelType {
        if y < self.water_level {
            self.underwater
        } else if y <= self.water_level + self.shore_height {
            self.shore
        } else {
            self.surface
        }
    }
}

impl LayerHandler for SurfaceLayer {
    fn attempt(&self, grid: &mut VoxelGrid, pos: IVec3, ground: i32) -> bool {
        let y = world_y(grid, pos);
        if y != ground {
            return false;
        }
        grid.set(pos, self.voxel_for(y));
        true
    }
}

pub struct WaterLayer {
    pub water_level: i32,
}

impl LayerHandler for WaterLayer {
    fn attempt(&self, grid: &mut VoxelGrid, pos: IVec3, ground: i32) -> bool {
        let y = world_y(grid, pos);
        if y > ground && y <= self.water_level {
            grid.set(pos, VoxelType::Water);
            return true;
        }
        false
    }
}

pub struct AirLayer;

impl LayerHandler for AirLayer {
    fn attempt(&self, grid: &mut VoxelGrid, pos: IVec3, ground: i32) -> bool {
        if world_y(grid, pos) > ground {
            grid.set(pos, VoxelType::Air);
            return true;
        }
        false
    }
}

/// Stone outcrops: where the column's stone noise exceeds `limit`, the column
/// from the chunk's y-origin up to ground becomes stone. Bedrock is kept.
pub struct StoneLayer {
    noise: NoiseField,
    limit: f32,
}

impl StoneLayer {
    pub fn new(noise: NoiseField, limit: f32) -> Self {
        StoneLayer { noise, limit }
    }

    pub fn from_settings(settings: &StoneSettings, world_seed: i32) -> Self {
        Self::new(NoiseField::new(settings.noise.reseeded(world_seed)), settings.limit)
    }
}

impl LayerHandler for StoneLayer {
    fn attempt(&self, grid: &mut VoxelGrid, pos: IVec3, ground: i32) -> bool {
        let world = grid.local_to_world(pos);
        if self.noise.sample_octaves(world.x as f32, world.z as f32) <= self.limit {
            return false;
        }
        let origin_y = grid.origin().y;
        for y in origin_y..=ground {
            let local = IVec3::new(pos.x, y - origin_y, pos.z);
            if grid.get(local) != VoxelType::Bedrock {
                grid.set(local, VoxelType::Stone);
            }
        }
        false
    }
}

#[derive(Default)]
pub struct LayerPipeline {
    voxel_handlers: Vec<Box<dyn LayerHandler>>,
    column_handlers: Vec<Box<dyn LayerHandler>>,
}

impl LayerPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_voxel_handler(mut self, handler: impl LayerHandler + 'static) -> Self {
        self.voxel_handlers.push(Box::new(handler));
        self
    }

    pub fn with_column_handler(mut self, handler: impl LayerHandler + 'static) -> Self {
        self.column_handlers.push(Box::new(handler));
        self
    }

    /// Bedrock, underground bands, surface, water and air, in that order.
    pub fn canonical(surface: SurfaceLayer, underground: VoxelType, deep: VoxelType) -> Self {
        let water_level = surface.water_level;
        Self::new()
            .with_voxel_handler(BedrockLayer)
            .with_voxel_handler(UndergroundLayer {
                underground,
                deep,
                depth: UNDERGROUND_DEPTH,
            })
            .with_voxel_handler(surface)
            .with_voxel_handler(WaterLayer { water_level })
            .with_voxel_handler(AirLayer)
    }

    /// Canonical chain for a biome plus its configured column features.
    pub fn for_biome(biome: &BiomeSettings, world: &WorldSettings) -> Self {
        let surface = SurfaceLayer {
            surface: biome.surface,
            underwater: biome.underwater,
            shore: biome.shore,
            water_level: world.water_level,
            shore_height: world.shore_height,
        };
        let mut pipeline = Self::canonical(surface, biome.underground, biome.deep_underground);
        for feature in &biome.features {
            pipeline = match feature {
                FeatureSettings::Stone(stone) => {
                    pipeline.with_column_handler(StoneLayer::from_settings(stone, world.seed))
                }
                FeatureSettings::Trees(trees) => {
                    pipeline.with_column_handler(FeaturePlacer::trees(trees, world))
                }
                FeatureSettings::Cacti(cacti) => {
                    pipeline.with_column_handler(FeaturePlacer::cacti(cacti, world))
                }
            };
        }
        pipeline
    }

    pub fn voxel_handler_count(&self) -> usize {
        self.voxel_handlers.len()
    }

    pub fn column_handler_count(&self) -> usize {
        self.column_handlers.len()
    }

    /// Runs per-voxel handlers until one claims `pos`.
    pub fn handle_voxel(&self, grid: &mut VoxelGrid, pos: IVec3, ground: i32) -> bool {
        self.voxel_handlers
            .iter()
            .any(|handler| handler.attempt(grid, pos, ground))
    }

    /// Fills the local column `(x, z)`: a full y sweep, then column handlers.
    pub fn fill_column(&self, grid: &mut VoxelGrid, x: i32, z: i32, ground: i32) {
        for y in 0..grid.height() {
            self.handle_voxel(grid, IVec3::new(x, y, z), ground);
        }
        let column = IVec3::new(x, 0, z);
        for handler in &self.column_handlers {
            if handler.attempt(grid, column, ground) {
                break;
            }
        }
    }
}
