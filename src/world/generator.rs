//! Chunk terrain generation
//!
//! Fills one `VoxelGrid` column by column: the biome map picks a biome and a
//! blended ground level, then that biome's layer pipeline writes the column.

use glam::{IVec2, IVec3, Vec3};

use crate::core::chunk::VoxelGrid;
use crate::error::Result;
use crate::utils::settings::WorldSettings;
use crate::world::biome::BiomeMap;

pub struct TerrainGenerator {
    biomes: BiomeMap,
}

impl TerrainGenerator {
    pub fn new(biomes: BiomeMap) -> Self {
        TerrainGenerator { biomes }
    }

    /// Validates `settings` before building the biome map.
    pub fn from_settings(settings: &WorldSettings) -> Result<Self> {
        Ok(Self::new(BiomeMap::from_settings(settings)?))
    }

    pub fn biome_map(&self) -> &BiomeMap {
        &self.biomes
    }

    pub fn biome_map_mut(&mut self) -> &mut BiomeMap {
        &mut self.biomes
    }

    pub fn recompute_anchors(&mut self, viewer: Vec3, render_radius: i32, chunk_width: i32) {
        self.biomes.recompute_anchors(viewer, render_radius, chunk_width);
    }

    /// Regenerates every voxel of `grid` and resets its feature bookkeeping.
    /// Columns are filled x outer, z inner.
    pub fn generate_chunk(&self, grid: &mut VoxelGrid) {
        grid.features_mut().reset();
        let width = grid.width();
        let height = grid.height();

        for x in 0..width {
            for z in 0..width {
                let world = grid.local_to_world(IVec3::new(x, 0, z));
                let selection = self
                    .biomes
                    .select_biome_and_ground(IVec2::new(world.x, world.z), height);
                selection
                    .biome
                    .layers()
                    .fill_column(grid, x, z, selection.ground_level);
            }
        }

        tracing::debug!(
            "Generated chunk {} ({} features, {} pending leaves)",
            grid.origin(),
            grid.features().placed.len(),
            grid.features().pending_leaves.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::voxel::VoxelType;

    fn small_settings() -> WorldSettings {
        WorldSettings {
            chunk_width: 8,
            chunk_height: 32,
            render_radius: 2,
            water_level: 8,
            ..WorldSettings::default()
        }
    }

    fn generate(settings: &WorldSettings, origin: IVec3) -> VoxelGrid {
        let mut generator = TerrainGenerator::from_settings(settings).unwrap();
        generator.recompute_anchors(Vec3::ZERO, settings.render_radius, settings.chunk_width);
        let mut grid = VoxelGrid::new(origin, settings.chunk_width, settings.chunk_height);
        generator.generate_chunk(&mut grid);
        grid
    }

    #[test]
    fn test_generation_is_deterministic() {
        let settings = small_settings();
        let a = generate(&settings, IVec3::new(-8, 0, 16));
        let b = generate(&settings, IVec3::new(-8, 0, 16));
        assert_eq!(a.voxels(), b.voxels());
        assert_eq!(a.features().placed, b.features().placed);
        assert_eq!(a.features().pending_leaves, b.features().pending_leaves);
    }

    #[test]
    fn test_every_column_has_bedrock() {
        let settings = small_settings();
        let grid = generate(&settings, IVec3::ZERO);
        assert!(grid.voxels().iter().all(|&v| v != VoxelType::Nothing));
        for x in 0..grid.width() {
            for z in 0..grid.width() {
                assert_eq!(grid.get(IVec3::new(x, 0, z)), VoxelType::Bedrock);
            }
        }
    }

    #[test]
    fn test_water_fills_up_to_water_level() {
        let settings = small_settings();
        let grid = generate(&settings, IVec3::ZERO);
        for x in 0..grid.width() {
            for z in 0..grid.width() {
                let y = settings.water_level;
                let voxel = grid.get(IVec3::new(x, y, z));
                assert_ne!(voxel, VoxelType::Air, "air at water level in column ({x}, {z})");
            }
        }
    }

    #[test]
    fn test_regeneration_resets_features() {
        let settings = small_settings();
        let generator = TerrainGenerator::from_settings(&settings).unwrap();
        let mut grid = VoxelGrid::new(IVec3::ZERO, 8, 32);
        grid.features_mut().placed.push(IVec3::new(100, 0, 100));
        generator.generate_chunk(&mut grid);
        assert!(!grid.features().placed.contains(&IVec3::new(100, 0, 100)));
    }

    #[test]
    fn test_from_settings_validates() {
        let settings = WorldSettings {
            biomes: Vec::new(),
            ..small_settings()
        };
        assert!(TerrainGenerator::from_settings(&settings).is_err());

        let settings = WorldSettings {
            water_level: 40,
            ..small_settings()
        };
        assert!(TerrainGenerator::from_settings(&settings).is_err());
    }
}
