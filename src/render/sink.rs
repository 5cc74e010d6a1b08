//! Boundary to whatever displays chunk geometry.

use glam::IVec3;
use rustc_hash::FxHashMap;

use crate::render::mesh::{CollisionBuffers, MeshBuffers};

/// Receives finished chunk meshes. A second submit for the same origin
/// replaces the first.
pub trait RenderSink {
    fn submit_mesh(
        &mut self,
        origin: IVec3,
        opaque: &MeshBuffers,
        water: &MeshBuffers,
        collision: &CollisionBuffers,
    );

    fn retire_mesh(&mut self, origin: IVec3);
}

/// Discards everything.
#[derive(Debug, Default)]
pub struct NullSink;

impl RenderSink for NullSink {
    fn submit_mesh(&mut self, _: IVec3, _: &MeshBuffers, _: &MeshBuffers, _: &CollisionBuffers) {}

    fn retire_mesh(&mut self, _: IVec3) {}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MeshStats {
    pub opaque_vertices: usize,
    pub water_vertices: usize,
    pub collision_triangles: usize,
}

/// Keeps per-origin statistics of the live meshes plus submit/retire counters.
#[derive(Debug, Default)]
pub struct RecordingSink {
    live: FxHashMap<IVec3, MeshStats>,
    pub submissions: usize,
    pub retirements: usize,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn stats(&self, origin: IVec3) -> Option<MeshStats> {
        self.live.get(&origin).copied()
    }

    pub fn total_vertices(&self) -> usize {
        self.live
            .values()
            .map(|stats| stats.opaque_vertices + stats.water_vertices)
            .sum()
    }
}

impl RenderSink for RecordingSink {
    fn submit_mesh(
        &mut self,
        origin: IVec3,
        opaque: &MeshBuffers,
        water: &MeshBuffers,
        collision: &CollisionBuffers,
    ) {
        self.submissions += 1;
        self.live.insert(
            origin,
            MeshStats {
                opaque_vertices: opaque.vertex_count(),
                water_vertices: water.vertex_count(),
                collision_triangles: collision.triangle_count(),
            },
        );
    }

    fn retire_mesh(&mut self, origin: IVec3) {
        self.retirements += 1;
        self.live.remove(&origin);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec2, Vec3};

    #[test]
    fn test_recording_sink_replaces_and_retires() {
        let mut sink = RecordingSink::new();
        let mut opaque = MeshBuffers::default();
        opaque.add_quad([Vec3::ZERO; 4], [Vec2::ZERO; 4]);
        let empty = MeshBuffers::default();
        let collision = CollisionBuffers::default();

        sink.submit_mesh(IVec3::ZERO, &opaque, &empty, &collision);
        sink.submit_mesh(IVec3::ZERO, &opaque, &opaque, &collision);
        assert_eq!(sink.live_count(), 1);
        assert_eq!(sink.submissions, 2);
        assert_eq!(sink.stats(IVec3::ZERO).map(|s| s.water_vertices), Some(4));
        assert_eq!(sink.total_vertices(), 8);

        sink.retire_mesh(IVec3::ZERO);
        assert_eq!(sink.live_count(), 0);
        assert_eq!(sink.retirements, 1);
    }
}
