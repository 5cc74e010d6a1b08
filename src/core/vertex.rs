use bytemuck::{Pod, Zeroable};

/// Interleaved vertex layout for renderers that upload a single buffer.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}
