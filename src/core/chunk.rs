use glam::IVec3;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::core::voxel::VoxelType;

/// Placeable column features that share one separation list per chunk.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum FeatureKind {
    Tree,
    Cactus,
}

/// Per-generation-pass bookkeeping for trees and cacti.
///
/// All positions are chunk-local. Pending leaves may lie outside the chunk;
/// they are delivered through the world once neighbours exist.
#[derive(Clone, Debug, Default)]
pub struct FeatureData {
    pub placed: Vec<IVec3>,
    pub pending_leaves: Vec<IVec3>,
    height_cursors: FxHashMap<FeatureKind, i32>,
}

impl FeatureData {
    pub fn reset(&mut self) {
        self.placed.clear();
        self.pending_leaves.clear();
        self.height_cursors.clear();
    }

    /// Returns the height for the next accepted instance of `kind`, then
    /// advances the cursor, wrapping from `max` back to `min`.
    pub fn next_height(&mut self, kind: FeatureKind, min: i32, max: i32) -> i32 {
        let cursor = self.height_cursors.entry(kind).or_insert(min);
        let height = (*cursor).clamp(min, max);
        *cursor = if height >= max { min } else { height + 1 };
        height
    }
}

/// Chunk origin that contains `world_pos`: `floor(pos / size) * size` per axis,
/// with the chunk height used on y.
pub fn chunk_origin_of(world_pos: IVec3, width: i32, height: i32) -> IVec3 {
    IVec3::new(
        world_pos.x.div_euclid(width) * width,
        world_pos.y.div_euclid(height) * height,
        world_pos.z.div_euclid(width) * width,
    )
}

/// Fixed-size voxel column for one chunk, stored flat as
/// `x + width * y + width * height * z`.
#[derive(Clone, Debug)]
pub struct VoxelGrid {
    origin: IVec3,
    width: i32,
    height: i32,
    voxels: Vec<VoxelType>,
    features: FeatureData,
}

impl VoxelGrid {
    /// Creates an all-air grid. `origin` must be chunk aligned.
    pub fn new(origin: IVec3, width: i32, height: i32) -> Self {
        debug_assert!(width > 0 && height > 0);
        debug_assert_eq!(origin.x.rem_euclid(width), 0);
        debug_assert_eq!(origin.z.rem_euclid(width), 0);
        let len = (width * height * width) as usize;
        VoxelGrid {
            origin,
            width,
            height,
            voxels: vec![VoxelType::Air; len],
            features: FeatureData::default(),
        }
    }

    pub fn origin(&self) -> IVec3 {
        self.origin
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.voxels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voxels.is_empty()
    }

    pub fn voxels(&self) -> &[VoxelType] {
        &self.voxels
    }

    pub fn features(&self) -> &FeatureData {
        &self.features
    }

    pub fn features_mut(&mut self) -> &mut FeatureData {
        &mut self.features
    }

    pub fn contains_local(&self, local: IVec3) -> bool {
        local.x >= 0
            && local.y >= 0
            && local.z >= 0
            && local.x < self.width
            && local.y < self.height
            && local.z < self.width
    }

    pub fn index_from_pos(&self, local: IVec3) -> usize {
        (local.x + self.width * local.y + self.width * self.height * local.z) as usize
    }

    pub fn pos_from_index(&self, index: usize) -> IVec3 {
        let index = index as i32;
        IVec3::new(
            index % self.width,
            (index / self.width) % self.height,
            index / (self.width * self.height),
        )
    }

    pub fn local_to_world(&self, local: IVec3) -> IVec3 {
        local + self.origin
    }

    pub fn world_to_local(&self, world: IVec3) -> IVec3 {
        world - self.origin
    }

    /// Voxel at a local position, or `Nothing` when it lies outside this grid.
    pub fn get(&self, local: IVec3) -> VoxelType {
        if self.contains_local(local) {
            self.voxels[self.index_from_pos(local)]
        } else {
            VoxelType::Nothing
        }
    }

    /// Writes a voxel if `local` is inside the grid; returns whether it did.
    pub fn set(&mut self, local: IVec3, voxel: VoxelType) -> bool {
        if self.contains_local(local) {
            let index = self.index_from_pos(local);
            self.voxels[index] = voxel;
            true
        } else {
            false
        }
    }

    pub fn fill(&mut self, voxel: VoxelType) {
        self.voxels.fill(voxel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_bijection() {
        let grid = VoxelGrid::new(IVec3::ZERO, 4, 6);
        for z in 0..4 {
            for y in 0..6 {
                for x in 0..4 {
                    let pos = IVec3::new(x, y, z);
                    let index = grid.index_from_pos(pos);
                    assert!(index < grid.len());
                    assert_eq!(grid.pos_from_index(index), pos);
                }
            }
        }
    }

    #[test]
    fn test_chunk_origin_floors_negative_positions() {
        assert_eq!(chunk_origin_of(IVec3::new(0, 0, 0), 16, 64), IVec3::ZERO);
        assert_eq!(chunk_origin_of(IVec3::new(15, 63, 15), 16, 64), IVec3::ZERO);
        assert_eq!(
            chunk_origin_of(IVec3::new(-1, 5, -16), 16, 64),
            IVec3::new(-16, 0, -16)
        );
        assert_eq!(
            chunk_origin_of(IVec3::new(-17, -1, 33), 16, 64),
            IVec3::new(-32, -64, 32)
        );
        assert_eq!(
            chunk_origin_of(IVec3::new(16, 64, 31), 16, 64),
            IVec3::new(16, 64, 16)
        );
    }

    #[test]
    fn test_out_of_bounds_reads_nothing_and_drops_writes() {
        let mut grid = VoxelGrid::new(IVec3::new(16, 0, -16), 4, 4);
        assert_eq!(grid.get(IVec3::new(-1, 0, 0)), VoxelType::Nothing);
        assert_eq!(grid.get(IVec3::new(0, 4, 0)), VoxelType::Nothing);
        assert!(!grid.set(IVec3::new(4, 0, 0), VoxelType::Stone));
        assert!(grid.set(IVec3::new(3, 3, 3), VoxelType::Stone));
        assert_eq!(grid.get(IVec3::new(3, 3, 3)), VoxelType::Stone);
        assert_eq!(grid.get(IVec3::new(0, 0, 0)), VoxelType::Air);
    }

    #[test]
    fn test_local_world_round_trip() {
        let grid = VoxelGrid::new(IVec3::new(-32, 0, 48), 16, 32);
        let world = IVec3::new(-20, 7, 50);
        let local = grid.world_to_local(world);
        assert_eq!(local, IVec3::new(12, 7, 2));
        assert_eq!(grid.local_to_world(local), world);
    }

    #[test]
    fn test_height_cursor_cycles() {
        let mut features = FeatureData::default();
        let heights: Vec<i32> = (0..6)
            .map(|_| features.next_height(FeatureKind::Tree, 4, 6))
            .collect();
        assert_eq!(heights, vec![4, 5, 6, 4, 5, 6]);
        assert_eq!(features.next_height(FeatureKind::Cactus, 2, 3), 2);

        features.reset();
        assert_eq!(features.next_height(FeatureKind::Tree, 4, 6), 4);
    }
}
