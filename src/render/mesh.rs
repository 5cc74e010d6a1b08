use glam::{IVec3, Vec2, Vec3};

use crate::constants::{VOXEL_HALF_EXTENT, WATER_HALF_HEIGHT};
use crate::core::chunk::VoxelGrid;
use crate::core::vertex::Vertex;
use crate::core::voxel::{VoxelCatalog, VoxelType};
use crate::world::index::WorldIndex;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Direction {
    Backward,
    Forward,
    Left,
    Right,
    Down,
    Up,
}

impl Direction {
    pub const ALL: [Direction; 6] = [
        Direction::Backward,
        Direction::Forward,
        Direction::Left,
        Direction::Right,
        Direction::Down,
        Direction::Up,
    ];

    pub fn offset(self) -> IVec3 {
        match self {
            Direction::Backward => IVec3::NEG_Z,
            Direction::Forward => IVec3::Z,
            Direction::Left => IVec3::NEG_X,
            Direction::Right => IVec3::X,
            Direction::Down => IVec3::NEG_Y,
            Direction::Up => IVec3::Y,
        }
    }

    /// Corner signs of the face, wound so the quad faces outward.
    fn corners(self) -> [[f32; 3]; 4] {
        match self {
            Direction::Backward => [
                [-1.0, -1.0, -1.0],
                [-1.0, 1.0, -1.0],
                [1.0, 1.0, -1.0],
                [1.0, -1.0, -1.0],
            ],
            Direction::Forward => [
                [1.0, -1.0, 1.0],
                [1.0, 1.0, 1.0],
                [-1.0, 1.0, 1.0],
                [-1.0, -1.0, 1.0],
            ],
            Direction::Left => [
                [-1.0, -1.0, 1.0],
                [-1.0, 1.0, 1.0],
                [-1.0, 1.0, -1.0],
                [-1.0, -1.0, -1.0],
            ],
            Direction::Right => [
                [1.0, -1.0, -1.0],
                [1.0, 1.0, -1.0],
                [1.0, 1.0, 1.0],
                [1.0, -1.0, 1.0],
            ],
            Direction::Down => [
                [-1.0, -1.0, -1.0],
                [1.0, -1.0, -1.0],
                [1.0, -1.0, 1.0],
                [-1.0, -1.0, 1.0],
            ],
            Direction::Up => [
                [-1.0, 1.0, 1.0],
                [1.0, 1.0, 1.0],
                [1.0, 1.0, -1.0],
                [-1.0, 1.0, -1.0],
            ],
        }
    }
}

/// One sub-mesh: positions and UVs in parallel, two triangles per quad.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshBuffers {
    pub positions: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub indices: Vec<u32>,
}

impl MeshBuffers {
    pub fn add_quad(&mut self, corners: [Vec3; 4], uvs: [Vec2; 4]) {
        let base_idx = self.positions.len() as u32;
        self.positions.extend_from_slice(&corners);
        self.uvs.extend_from_slice(&uvs);
        self.indices.extend_from_slice(&[
            base_idx,
            base_idx + 1,
            base_idx + 2,
            base_idx,
            base_idx + 2,
            base_idx + 3,
        ]);
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Geometry for collider-generating voxels only.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CollisionBuffers {
    pub positions: Vec<Vec3>,
    pub indices: Vec<u32>,
}

impl CollisionBuffers {
    pub fn add_quad(&mut self, corners: [Vec3; 4]) {
        let base_idx = self.positions.len() as u32;
        self.positions.extend_from_slice(&corners);
        self.indices.extend_from_slice(&[
            base_idx,
            base_idx + 1,
            base_idx + 2,
            base_idx,
            base_idx + 2,
            base_idx + 3,
        ]);
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Both sub-meshes in one vertex stream; `submeshes[1]` is water.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MergedMesh {
    pub positions: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub submeshes: [Vec<u32>; 2],
}

/// Chunk geometry relative to the chunk origin. Rebuilt wholesale.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChunkMesh {
    pub opaque: MeshBuffers,
    pub water: MeshBuffers,
    pub collision: CollisionBuffers,
}

impl ChunkMesh {
    pub fn face_count(&self) -> usize {
        (self.opaque.vertex_count() + self.water.vertex_count()) / 4
    }

    pub fn is_empty(&self) -> bool {
        self.opaque.is_empty() && self.water.is_empty()
    }

    pub fn merged(&self) -> MergedMesh {
        let offset = self.opaque.vertex_count() as u32;
        let mut positions = self.opaque.positions.clone();
        positions.extend_from_slice(&self.water.positions);
        let mut uvs = self.opaque.uvs.clone();
        uvs.extend_from_slice(&self.water.uvs);
        let water_indices = self.water.indices.iter().map(|i| i + offset).collect();

        MergedMesh {
            positions,
            uvs,
            submeshes: [self.opaque.indices.clone(), water_indices],
        }
    }

    /// `Pod` vertices for a single-buffer upload, with the merged index lists.
    pub fn interleaved(&self) -> (Vec<Vertex>, [Vec<u32>; 2]) {
        let merged = self.merged();
        let vertices = merged
            .positions
            .iter()
            .zip(&merged.uvs)
            .map(|(position, uv)| Vertex {
                position: position.to_array(),
                uv: uv.to_array(),
            })
            .collect();
        (vertices, merged.submeshes)
    }
}

/// Face-culling mesher. Reads voxel properties from a shared catalog and
/// resolves neighbours across chunk borders through a `WorldIndex`.
pub struct MeshBuilder<'a> {
    catalog: &'a VoxelCatalog,
}

impl<'a> MeshBuilder<'a> {
    pub fn new(catalog: &'a VoxelCatalog) -> Self {
        MeshBuilder { catalog }
    }

    pub fn build(&self, grid: &VoxelGrid, world: &impl WorldIndex) -> ChunkMesh {
        let mut mesh = ChunkMesh::default();

        for (index, &voxel) in grid.voxels().iter().enumerate() {
            if voxel.is_empty() {
                continue;
            }
            let pos = grid.pos_from_index(index);
            for direction in Direction::ALL {
                let neighbour = self.neighbour(grid, world, pos, direction);
                if self.face_visible(voxel, neighbour) {
                    self.add_face(&mut mesh, voxel, pos, direction);
                }
            }
        }

        tracing::debug!(
            "Meshed chunk {}: {} opaque / {} water vertices, {} collision triangles",
            grid.origin(),
            mesh.opaque.vertex_count(),
            mesh.water.vertex_count(),
            mesh.collision.triangle_count()
        );
        mesh
    }

    /// Number of faces the voxel at local `pos` would emit.
    pub fn visible_faces(&self, grid: &VoxelGrid, world: &impl WorldIndex, pos: IVec3) -> usize {
        let voxel = grid.get(pos);
        if voxel.is_empty() {
            return 0;
        }
        Direction::ALL
            .iter()
            .filter(|&&direction| {
                self.face_visible(voxel, self.neighbour(grid, world, pos, direction))
            })
            .count()
    }

    fn neighbour(
        &self,
        grid: &VoxelGrid,
        world: &impl WorldIndex,
        pos: IVec3,
        direction: Direction,
    ) -> VoxelType {
        let next = pos + direction.offset();
        if grid.contains_local(next) {
            grid.get(next)
        } else {
            world.voxel_at(grid.local_to_world(next))
        }
    }

    fn face_visible(&self, voxel: VoxelType, neighbour: VoxelType) -> bool {
        if voxel == VoxelType::Water {
            neighbour == VoxelType::Air
        } else {
            !self.catalog.is_solid(neighbour)
        }
    }

    fn add_face(&self, mesh: &mut ChunkMesh, voxel: VoxelType, pos: IVec3, direction: Direction) {
        let half_height = if voxel == VoxelType::Water {
            WATER_HALF_HEIGHT
        } else {
            VOXEL_HALF_EXTENT
        };
        let half = Vec3::new(VOXEL_HALF_EXTENT, half_height, VOXEL_HALF_EXTENT);
        let centre = pos.as_vec3();
        let corners = direction
            .corners()
            .map(|sign| centre + Vec3::from_array(sign) * half);
        let uvs = self.face_uvs(voxel, direction);

        if voxel == VoxelType::Water {
            mesh.water.add_quad(corners, uvs);
        } else {
            mesh.opaque.add_quad(corners, uvs);
        }
        if self.catalog.generates_collider(voxel) {
            mesh.collision.add_quad(corners);
        }
    }

    /// Atlas UVs for one face, inset by the texture offset on every edge.
    fn face_uvs(&self, voxel: VoxelType, direction: Direction) -> [Vec2; 4] {
        let properties = self.catalog.properties(voxel);
        let tile = match direction {
            Direction::Up => properties.top,
            Direction::Down => properties.bottom,
            _ => properties.side,
        }
        .as_vec2();
        let size = self.catalog.tile_size();
        let inset = self.catalog.texture_offset();
        let min = tile * size + inset;
        let max = tile * size + size - inset;

        [
            Vec2::new(max.x, min.y),
            Vec2::new(max.x, max.y),
            Vec2::new(min.x, max.y),
            Vec2::new(min.x, min.y),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::index::ChunkMap;

    fn single_chunk(fill: impl FnOnce(&mut VoxelGrid)) -> ChunkMap {
        let mut grid = VoxelGrid::new(IVec3::ZERO, 5, 5);
        fill(&mut grid);
        let mut map = ChunkMap::new(5, 5);
        map.insert(grid);
        map
    }

    fn build(map: &ChunkMap, catalog: &VoxelCatalog) -> ChunkMesh {
        let grid = map.chunk(IVec3::ZERO).unwrap();
        MeshBuilder::new(catalog).build(grid, map)
    }

    #[test]
    fn test_isolated_voxel_emits_six_faces() {
        let catalog = VoxelCatalog::default();
        let map = single_chunk(|grid| {
            grid.set(IVec3::new(2, 2, 2), VoxelType::Stone);
        });
        let mesh = build(&map, &catalog);
        assert_eq!(mesh.face_count(), 6);
        assert_eq!(mesh.opaque.vertex_count(), 24);
        assert_eq!(mesh.opaque.triangle_count(), 12);
        assert_eq!(mesh.collision.vertex_count(), 24);
        assert!(mesh.water.is_empty());
    }

    #[test]
    fn test_solid_block_culls_interior() {
        let catalog = VoxelCatalog::default();
        let map = single_chunk(|grid| {
            for x in 1..4 {
                for y in 1..4 {
                    for z in 1..4 {
                        grid.set(IVec3::new(x, y, z), VoxelType::Stone);
                    }
                }
            }
        });
        let grid = map.chunk(IVec3::ZERO).unwrap();
        let builder = MeshBuilder::new(&catalog);
        assert_eq!(builder.visible_faces(grid, &map, IVec3::new(2, 2, 2)), 0);
        assert_eq!(builder.visible_faces(grid, &map, IVec3::new(1, 1, 1)), 3);
        assert_eq!(builder.build(grid, &map).face_count(), 54);
    }

    #[test]
    fn test_unloaded_neighbour_draws_boundary_face() {
        let catalog = VoxelCatalog::default();
        let mut map = single_chunk(|grid| {
            grid.set(IVec3::new(0, 2, 2), VoxelType::Stone);
        });
        assert_eq!(build(&map, &catalog).face_count(), 6);

        let mut left = VoxelGrid::new(IVec3::new(-5, 0, 0), 5, 5);
        left.set(IVec3::new(4, 2, 2), VoxelType::Stone);
        map.insert(left);
        assert_eq!(build(&map, &catalog).face_count(), 5);
    }

    #[test]
    fn test_water_faces_only_touch_air() {
        let catalog = VoxelCatalog::default();
        let map = single_chunk(|grid| {
            grid.set(IVec3::new(2, 2, 2), VoxelType::Water);
            grid.set(IVec3::new(3, 2, 2), VoxelType::Water);
            grid.set(IVec3::new(2, 1, 2), VoxelType::Stone);
        });
        let grid = map.chunk(IVec3::ZERO).unwrap();
        let builder = MeshBuilder::new(&catalog);
        assert_eq!(builder.visible_faces(grid, &map, IVec3::new(2, 2, 2)), 4);

        let mesh = builder.build(grid, &map);
        // The second water voxel only hides its face toward the first.
        assert_eq!(mesh.water.vertex_count(), (4 + 5) * 4);
        // Stone still shows its top face against water.
        assert_eq!(mesh.opaque.vertex_count(), 6 * 4);
        assert_eq!(mesh.collision.vertex_count(), 6 * 4);
        let top = mesh
            .water
            .positions
            .iter()
            .map(|p| p.y)
            .fold(f32::MIN, f32::max);
        assert!((top - (2.0 + WATER_HALF_HEIGHT)).abs() < 1e-6);
    }

    #[test]
    fn test_leaves_render_but_do_not_cull() {
        let catalog = VoxelCatalog::default();
        let map = single_chunk(|grid| {
            grid.set(IVec3::new(2, 2, 2), VoxelType::Leaves);
            grid.set(IVec3::new(3, 2, 2), VoxelType::Stone);
        });
        let mesh = build(&map, &catalog);
        // Leaves are not solid, so the stone face behind them stays.
        assert_eq!(mesh.face_count(), 5 + 6);
        assert_eq!(mesh.collision.vertex_count(), mesh.opaque.vertex_count());
    }

    #[test]
    fn test_uvs_are_inset_within_tile() {
        let catalog = VoxelCatalog::default();
        let map = single_chunk(|grid| {
            grid.set(IVec3::new(2, 2, 2), VoxelType::Grass);
        });
        let mesh = build(&map, &catalog);
        let size = catalog.tile_size();
        let inset = catalog.texture_offset();
        let tile = catalog.properties(VoxelType::Grass).top.as_vec2();

        // Up is the last direction emitted.
        let up = &mesh.opaque.uvs[20..24];
        for uv in up {
            assert!(uv.x >= tile.x * size.x + inset - 1e-6);
            assert!(uv.x <= (tile.x + 1.0) * size.x - inset + 1e-6);
            assert!(uv.y >= tile.y * size.y + inset - 1e-6);
            assert!(uv.y <= (tile.y + 1.0) * size.y - inset + 1e-6);
        }
        assert!((up[0].x - (size.x - inset)).abs() < 1e-6);
        assert!((up[0].y - inset).abs() < 1e-6);
    }

    #[test]
    fn test_merged_offsets_water_indices() {
        let catalog = VoxelCatalog::default();
        let map = single_chunk(|grid| {
            grid.set(IVec3::new(1, 1, 1), VoxelType::Stone);
            grid.set(IVec3::new(3, 3, 3), VoxelType::Water);
        });
        let mesh = build(&map, &catalog);
        let merged = mesh.merged();
        assert_eq!(merged.positions.len(), 48);
        assert_eq!(merged.submeshes[0], mesh.opaque.indices);
        assert_eq!(merged.submeshes[1][0], 24);
        assert!(merged.submeshes[1].iter().all(|&i| (24..48).contains(&i)));

        let (vertices, submeshes) = mesh.interleaved();
        assert_eq!(vertices.len(), 48);
        assert_eq!(vertices[24].position, mesh.water.positions[0].to_array());
        assert_eq!(submeshes, merged.submeshes);
        assert_eq!(bytemuck::cast_slice::<Vertex, u8>(&vertices).len(), 48 * 20);
    }
}
