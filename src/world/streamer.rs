//! Chunk streaming around a moving viewer
//!
//! Each tick computes two chunk-aligned rings around the viewer, one for
//! voxel data (radius + 1) and one for meshes (radius), diffs them against
//! what is loaded and generates, meshes and retires chunks to match.

use std::sync::Arc;

use glam::{IVec3, Vec3};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::core::chunk::{VoxelGrid, chunk_origin_of};
use crate::core::voxel::{VoxelCatalog, VoxelType};
use crate::error::Result;
use crate::render::mesh::{ChunkMesh, MeshBuilder};
use crate::render::sink::RenderSink;
use crate::utils::settings::WorldSettings;
use crate::world::generator::TerrainGenerator;
use crate::world::index::{ChunkMap, WorldIndex};

/// Diff produced by one tick. Creations are ordered nearest-first.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StreamingSet {
    pub data_to_create: Vec<IVec3>,
    pub data_to_remove: Vec<IVec3>,
    pub render_to_create: Vec<IVec3>,
    pub render_to_remove: Vec<IVec3>,
}

impl StreamingSet {
    pub fn is_empty(&self) -> bool {
        self.data_to_create.is_empty()
            && self.data_to_remove.is_empty()
            && self.render_to_create.is_empty()
            && self.render_to_remove.is_empty()
    }
}

/// Chunk origins covering a square of `radius` chunk widths around the
/// viewer, sorted by squared xz distance from the viewer.
pub fn chunk_ring(viewer: Vec3, radius: i32, width: i32, height: i32) -> Vec<IVec3> {
    let centre = viewer.round().as_ivec3();
    let reach = radius * width;
    let mut seen = FxHashSet::default();
    let mut ring = Vec::new();

    for x in (centre.x - reach..=centre.x + reach).step_by(width as usize) {
        for z in (centre.z - reach..=centre.z + reach).step_by(width as usize) {
            let origin = chunk_origin_of(IVec3::new(x, 0, z), width, height);
            if seen.insert(origin) {
                ring.push(origin);
            }
        }
    }

    ring.sort_by_key(|origin| {
        let dx = (origin.x - centre.x) as i64;
        let dz = (origin.z - centre.z) as i64;
        (dx * dx + dz * dz, origin.x, origin.z)
    });
    ring
}

pub struct World<S: RenderSink> {
    settings: Arc<WorldSettings>,
    catalog: VoxelCatalog,
    generator: TerrainGenerator,
    chunks: ChunkMap,
    meshes: FxHashMap<IVec3, ChunkMesh>,
    dirty: FxHashSet<IVec3>,
    last_set: StreamingSet,
    last_viewer: Option<Vec3>,
    tick_count: u64,
    sink: S,
}

impl<S: RenderSink> World<S> {
    pub fn new(settings: WorldSettings, sink: S) -> Result<Self> {
        Self::with_shared_settings(Arc::new(settings), sink)
    }

    pub fn with_shared_settings(settings: Arc<WorldSettings>, sink: S) -> Result<Self> {
        settings.validate()?;
        tracing::info!(
            "Creating world: seed {}, chunks {}x{}, render radius {}",
            settings.seed,
            settings.chunk_width,
            settings.chunk_height,
            settings.render_radius
        );
        Ok(World {
            catalog: VoxelCatalog::from_settings(&settings),
            generator: TerrainGenerator::from_settings(&settings)?,
            chunks: ChunkMap::new(settings.chunk_width, settings.chunk_height),
            meshes: FxHashMap::default(),
            dirty: FxHashSet::default(),
            last_set: StreamingSet::default(),
            last_viewer: None,
            tick_count: 0,
            sink,
            settings,
        })
    }

    pub fn settings(&self) -> &WorldSettings {
        &self.settings
    }

    pub fn catalog(&self) -> &VoxelCatalog {
        &self.catalog
    }

    pub fn generator(&self) -> &TerrainGenerator {
        &self.generator
    }

    pub fn chunk_width(&self) -> i32 {
        self.settings.chunk_width
    }

    pub fn chunk(&self, origin: IVec3) -> Option<&VoxelGrid> {
        self.chunks.chunk(origin)
    }

    pub fn mesh(&self, origin: IVec3) -> Option<&ChunkMesh> {
        self.meshes.get(&origin)
    }

    pub fn chunks(&self) -> &ChunkMap {
        &self.chunks
    }

    pub fn data_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn render_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn last_streaming_set(&self) -> &StreamingSet {
        &self.last_set
    }

    pub fn last_viewer(&self) -> Option<Vec3> {
        self.last_viewer
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn voxel_at(&self, world: IVec3) -> VoxelType {
        self.chunks.voxel_at(world)
    }

    /// Edits a loaded voxel and schedules the affected meshes for a rebuild.
    /// Edits to unloaded chunks are dropped and return false.
    pub fn set_voxel(&mut self, world: IVec3, voxel: VoxelType) -> bool {
        if self.chunks.set_voxel(world, voxel).is_none() {
            tracing::trace!("Dropped edit at {} (chunk not loaded)", world);
            return false;
        }
        self.mark_dirty_around(world);
        true
    }

    /// Runs one full streaming pass for `viewer` and returns its diff.
    pub fn tick(&mut self, viewer: Vec3) -> &StreamingSet {
        self.tick_count += 1;
        self.apply_removals();

        let (width, height, radius) = (
            self.settings.chunk_width,
            self.settings.chunk_height,
            self.settings.render_radius,
        );
        self.generator.recompute_anchors(viewer, radius, width);

        let data_ring = chunk_ring(viewer, radius + 1, width, height);
        let render_ring = chunk_ring(viewer, radius, width, height);
        let set = self.diff(&data_ring, &render_ring);

        for &origin in &set.data_to_create {
            let mut grid = VoxelGrid::new(origin, width, height);
            self.generator.generate_chunk(&mut grid);
            self.chunks.insert(grid);
        }

        self.deliver_pending_leaves();

        for &origin in &set.render_to_create {
            if !self.mesh_chunk(origin) {
                tracing::warn!("No voxel data for render chunk {}", origin);
            }
        }

        let rebuilt = self.rebuild_dirty();

        tracing::info!(
            "Tick {} at {:?}: +{}/-{} data, +{}/-{} renders, {} rebuilt",
            self.tick_count,
            viewer,
            set.data_to_create.len(),
            set.data_to_remove.len(),
            set.render_to_create.len(),
            set.render_to_remove.len(),
            rebuilt
        );

        self.last_set = set;
        self.last_viewer = Some(viewer);
        &self.last_set
    }

    fn diff(&self, data_ring: &[IVec3], render_ring: &[IVec3]) -> StreamingSet {
        let data_keep: FxHashSet<IVec3> = data_ring.iter().copied().collect();
        let render_keep: FxHashSet<IVec3> = render_ring.iter().copied().collect();

        let mut render_loaded: Vec<IVec3> = self.meshes.keys().copied().collect();
        render_loaded.sort_by_key(|o| (o.x, o.z));

        StreamingSet {
            data_to_create: data_ring
                .iter()
                .copied()
                .filter(|origin| !self.chunks.contains(*origin))
                .collect(),
            data_to_remove: self
                .chunks
                .sorted_origins()
                .into_iter()
                .filter(|origin| !data_keep.contains(origin))
                .collect(),
            render_to_create: render_ring
                .iter()
                .copied()
                .filter(|origin| !self.meshes.contains_key(origin))
                .collect(),
            render_to_remove: render_loaded
                .into_iter()
                .filter(|origin| !render_keep.contains(origin))
                .collect(),
        }
    }

    /// Drops what the previous tick scheduled for removal.
    fn apply_removals(&mut self) {
        let removals = std::mem::take(&mut self.last_set);
        for origin in &removals.render_to_remove {
            if self.meshes.remove(origin).is_some() {
                self.sink.retire_mesh(*origin);
            }
            self.dirty.remove(origin);
        }
        for origin in &removals.data_to_remove {
            self.chunks.remove(*origin);
        }
    }

    /// Writes queued leaves into whichever loaded chunk owns them. Leaves only
    /// replace air; leaves whose chunk is not loaded stay queued.
    pub fn deliver_pending_leaves(&mut self) -> usize {
        let height = self.settings.chunk_height;
        let mut delivered = 0;

        for origin in self.chunks.sorted_origins() {
            let pending = match self.chunks.get_mut(origin) {
                Some(grid) if !grid.features().pending_leaves.is_empty() => {
                    std::mem::take(&mut grid.features_mut().pending_leaves)
                }
                _ => continue,
            };

            let mut waiting = Vec::new();
            for local in pending {
                let world = origin + local;
                if world.y < 0 || world.y >= height {
                    continue;
                }
                if !self.chunks.contains(self.chunks.origin_of(world)) {
                    waiting.push(local);
                    continue;
                }
                if self.chunks.voxel_at(world) == VoxelType::Air
                    && self.chunks.set_voxel(world, VoxelType::Leaves).is_some()
                {
                    delivered += 1;
                    self.mark_dirty_around(world);
                }
            }

            if !waiting.is_empty() {
                tracing::trace!("{} leaves near {} wait for neighbours", waiting.len(), origin);
            }
            if let Some(grid) = self.chunks.get_mut(origin) {
                grid.features_mut().pending_leaves = waiting;
            }
        }
        delivered
    }

    /// Rebuilds and resubmits every rendered chunk touched since its last
    /// mesh. Returns how many were rebuilt.
    pub fn rebuild_dirty(&mut self) -> usize {
        let mut origins: Vec<IVec3> = self.dirty.drain().collect();
        origins.sort_by_key(|o| (o.x, o.z));
        let mut rebuilt = 0;
        for origin in origins {
            if self.meshes.contains_key(&origin) && self.mesh_chunk(origin) {
                rebuilt += 1;
            }
        }
        rebuilt
    }

    pub fn is_dirty(&self, origin: IVec3) -> bool {
        self.dirty.contains(&origin)
    }

    fn mesh_chunk(&mut self, origin: IVec3) -> bool {
        let Some(grid) = self.chunks.chunk(origin) else {
            return false;
        };
        let mesh = MeshBuilder::new(&self.catalog).build(grid, &self.chunks);
        self.sink.submit_mesh(origin, &mesh.opaque, &mesh.water, &mesh.collision);
        self.meshes.insert(origin, mesh);
        self.dirty.remove(&origin);
        true
    }

    /// Marks the owning chunk and any chunk sharing a face with `world` dirty,
    /// as long as it currently has a mesh.
    fn mark_dirty_around(&mut self, world: IVec3) {
        for offset in [IVec3::ZERO, IVec3::X, IVec3::NEG_X, IVec3::Z, IVec3::NEG_Z] {
            let owner = self.chunks.origin_of(world + offset);
            if self.meshes.contains_key(&owner) {
                self.dirty.insert(owner);
            }
        }
    }
}
