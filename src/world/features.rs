//! Separation-constrained tree and cactus placement
//!
//! Placement is driven entirely by noise and by the order columns are filled
//! (x outer, z inner), so a given seed always yields the same forest.

use glam::{IVec2, IVec3};

use crate::core::chunk::{FeatureKind, VoxelGrid};
use crate::core::voxel::VoxelType;
use crate::utils::settings::{CactusSettings, PlacementSettings, TreeSettings, WorldSettings};
use crate::world::layers::LayerHandler;
use crate::world::noise::{NoiseField, NoiseGrid, local_maxima};

pub struct FeaturePlacer {
    kind: FeatureKind,
    host: VoxelType,
    body: VoxelType,
    noise: NoiseField,
    threshold: f32,
    height_limit: i32,
    min_height: i32,
    max_height: i32,
    separation: f32,
    water_level: i32,
    leaves: Vec<IVec3>,
    require_local_maximum: bool,
}

impl FeaturePlacer {
    fn from_placement(
        kind: FeatureKind,
        host: VoxelType,
        body: VoxelType,
        placement: &PlacementSettings,
        world: &WorldSettings,
    ) -> Self {
        FeaturePlacer {
            kind,
            host,
            body,
            noise: NoiseField::new(placement.noise.reseeded(world.seed)),
            threshold: placement.threshold,
            height_limit: placement.height_limit,
            min_height: placement.min_height,
            max_height: placement.max_height,
            separation: placement.separation,
            water_level: world.water_level,
            leaves: Vec::new(),
            require_local_maximum: false,
        }
    }

    /// Log trunks on grass above the water line, with a leaf crown.
    pub fn trees(settings: &TreeSettings, world: &WorldSettings) -> Self {
        let mut placer = Self::from_placement(
            FeatureKind::Tree,
            VoxelType::Grass,
            VoxelType::Log,
            &settings.placement,
            world,
        );
        placer.leaves = settings.leaves.clone();
        placer.require_local_maximum = settings.require_local_maximum;
        placer
    }

    /// Cactus columns on sand at or above the water line.
    pub fn cacti(settings: &CactusSettings, world: &WorldSettings) -> Self {
        Self::from_placement(
            FeatureKind::Cactus,
            VoxelType::Sand,
            VoxelType::Cactus,
            &settings.placement,
            world,
        )
    }

    pub fn kind(&self) -> FeatureKind {
        self.kind
    }

    fn host_level_ok(&self, y: i32) -> bool {
        match self.kind {
            FeatureKind::Tree => y > self.water_level,
            FeatureKind::Cactus => y >= self.water_level,
        }
    }

    /// Whether the column is a peak of the feature noise within its 3x3
    /// world neighbourhood. Independent of chunk borders.
    fn is_local_maximum(&self, world_x: i32, world_z: i32) -> bool {
        let grid = NoiseGrid::from_fn(3, 3, |dx, dz| {
            self.noise.sample_octaves(
                (world_x + dx as i32 - 1) as f32,
                (world_z + dz as i32 - 1) as f32,
            )
        });
        local_maxima(&grid, IVec2::new(world_x - 1, world_z - 1))
            .contains(&IVec2::new(world_x, world_z))
    }

    fn too_close(&self, grid: &VoxelGrid, candidate: IVec3) -> bool {
        let candidate = candidate.as_vec3();
        grid.features()
            .placed
            .iter()
            .any(|placed| placed.as_vec3().distance(candidate) < self.separation)
    }

    fn place(&self, grid: &mut VoxelGrid, base: IVec3) {
        let height = grid
            .features_mut()
            .next_height(self.kind, self.min_height, self.max_height);
        grid.features_mut().placed.push(base);

        for j in 1..=height {
            grid.set(base + IVec3::Y * j, self.body);
        }

        if !self.leaves.is_empty() {
            let top = base + IVec3::Y * height;
            let features = grid.features_mut();
            features
                .pending_leaves
                .extend(self.leaves.iter().map(|offset| top + *offset));
        }
        tracing::trace!("Placed {:?} at {} (height {})", self.kind, grid.local_to_world(base), height);
    }
}

impl LayerHandler for FeaturePlacer {
    /// Scans the column upwards from the chunk's y-origin up to and including
    /// `height_limit`, planting on every eligible host. Never claims the column.
    fn attempt(&self, grid: &mut VoxelGrid, pos: IVec3, _ground: i32) -> bool {
        let world = grid.local_to_world(pos);
        if self.noise.sample_octaves(world.x as f32, world.z as f32) <= self.threshold {
            return false;
        }
        if self.require_local_maximum && !self.is_local_maximum(world.x, world.z) {
            return false;
        }

        let origin_y = grid.origin().y;
        let limit = self.height_limit.min(grid.height() - 1);
        for local_y in 0..=limit {
            let candidate = IVec3::new(pos.x, local_y, pos.z);
            if grid.get(candidate) != self.host || !self.host_level_ok(origin_y + local_y) {
                continue;
            }
            if self.too_close(grid, candidate) {
                continue;
            }
            self.place(grid, candidate);
        }
        false
    }
}
