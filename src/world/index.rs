//! Origin-keyed chunk registry used for every cross-chunk voxel query.

use glam::IVec3;
use rustc_hash::FxHashMap;

use crate::core::chunk::{VoxelGrid, chunk_origin_of};
use crate::core::voxel::VoxelType;

/// Read access to loaded chunks by origin.
pub trait WorldIndex {
    fn chunk(&self, origin: IVec3) -> Option<&VoxelGrid>;

    fn chunk_width(&self) -> i32;

    fn chunk_height(&self) -> i32;

    fn origin_of(&self, world: IVec3) -> IVec3 {
        chunk_origin_of(world, self.chunk_width(), self.chunk_height())
    }

    /// Voxel at a world position, or `Nothing` if its chunk is not loaded.
    fn voxel_at(&self, world: IVec3) -> VoxelType {
        match self.chunk(self.origin_of(world)) {
            Some(grid) => grid.get(grid.world_to_local(world)),
            None => VoxelType::Nothing,
        }
    }
}

#[derive(Debug, Default)]
pub struct ChunkMap {
    width: i32,
    height: i32,
    chunks: FxHashMap<IVec3, VoxelGrid>,
}

impl ChunkMap {
    pub fn new(width: i32, height: i32) -> Self {
        ChunkMap {
            width,
            height,
            chunks: FxHashMap::default(),
        }
    }

    pub fn insert(&mut self, grid: VoxelGrid) -> Option<VoxelGrid> {
        debug_assert_eq!(grid.width(), self.width);
        debug_assert_eq!(grid.height(), self.height);
        self.chunks.insert(grid.origin(), grid)
    }

    pub fn remove(&mut self, origin: IVec3) -> Option<VoxelGrid> {
        self.chunks.remove(&origin)
    }

    pub fn contains(&self, origin: IVec3) -> bool {
        self.chunks.contains_key(&origin)
    }

    pub fn get_mut(&mut self, origin: IVec3) -> Option<&mut VoxelGrid> {
        self.chunks.get_mut(&origin)
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn origins(&self) -> impl Iterator<Item = IVec3> + '_ {
        self.chunks.keys().copied()
    }

    /// Loaded origins in a stable `(x, z)` order.
    pub fn sorted_origins(&self) -> Vec<IVec3> {
        let mut origins: Vec<IVec3> = self.origins().collect();
        origins.sort_by_key(|o| (o.x, o.z, o.y));
        origins
    }

    /// Writes a voxel into whichever loaded chunk owns `world` and returns
    /// that chunk's origin. Unloaded targets are dropped.
    pub fn set_voxel(&mut self, world: IVec3, voxel: VoxelType) -> Option<IVec3> {
        let origin = self.origin_of(world);
        let grid = self.chunks.get_mut(&origin)?;
        let local = grid.world_to_local(world);
        grid.set(local, voxel).then_some(origin)
    }
}

impl WorldIndex for ChunkMap {
    fn chunk(&self, origin: IVec3) -> Option<&VoxelGrid> {
        self.chunks.get(&origin)
    }

    fn chunk_width(&self) -> i32 {
        self.width
    }

    fn chunk_height(&self) -> i32 {
        self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voxel_at_crosses_chunks() {
        let mut map = ChunkMap::new(4, 8);
        let mut left = VoxelGrid::new(IVec3::new(-4, 0, 0), 4, 8);
        left.set(IVec3::new(3, 2, 1), VoxelType::Stone);
        map.insert(left);
        map.insert(VoxelGrid::new(IVec3::ZERO, 4, 8));

        assert_eq!(map.voxel_at(IVec3::new(-1, 2, 1)), VoxelType::Stone);
        assert_eq!(map.voxel_at(IVec3::new(0, 2, 1)), VoxelType::Air);
        assert_eq!(map.voxel_at(IVec3::new(4, 2, 1)), VoxelType::Nothing);
        assert_eq!(map.voxel_at(IVec3::new(0, -1, 0)), VoxelType::Nothing);
        assert_eq!(map.voxel_at(IVec3::new(0, 8, 0)), VoxelType::Nothing);
    }

    #[test]
    fn test_set_voxel_drops_unloaded_targets() {
        let mut map = ChunkMap::new(4, 8);
        map.insert(VoxelGrid::new(IVec3::ZERO, 4, 8));

        assert_eq!(map.set_voxel(IVec3::new(1, 1, 1), VoxelType::Log), Some(IVec3::ZERO));
        assert_eq!(map.voxel_at(IVec3::new(1, 1, 1)), VoxelType::Log);
        assert_eq!(map.set_voxel(IVec3::new(9, 1, 1), VoxelType::Log), None);
        assert_eq!(map.set_voxel(IVec3::new(1, 20, 1), VoxelType::Log), None);
    }
}
