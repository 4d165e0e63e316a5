//! Renderer: hands built meshes to a GPU backend and drives the
//! load → build → draw → destroy lifecycle of a single OBJ model.
//! wgpu = 23.x

pub mod backend;
pub mod gpu;
pub mod model;

use asset::MeshVertex;
use bytemuck::{Pod, Zeroable};
use wgpu::{VertexBufferLayout, VertexStepMode};

pub use backend::{DrawCall, HeadlessBackend, HeadlessMesh, MeshBackend, UploadedMesh};
pub use gpu::{GpuMesh, WgpuBackend};
pub use model::{GpuState, ObjModel};

/// Vertex: position + normal, tightly packed.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub pos: [f32; 3],
    pub normal: [f32; 3],
}

impl Vertex {
    pub const LAYOUT: VertexBufferLayout<'static> = VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as u64,
        step_mode: VertexStepMode::Vertex,
        attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3],
    };
}

impl From<MeshVertex> for Vertex {
    fn from(v: MeshVertex) -> Self {
        Self {
            pos: v.position,
            normal: v.normal,
        }
    }
}

/// Shading and viewport parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderSettings {
    /// Model colour (linear RGB).
    pub color: [f32; 3],
    /// Direction the light travels in; normalized before upload.
    pub light_direction: [f32; 3],
    pub width: u32,
    pub height: u32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0],
            light_direction: [0.0, -1.0, -1.0],
            width: 1280,
            height: 720,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_is_position_then_normal() {
        assert_eq!(std::mem::size_of::<Vertex>(), 24);
        assert_eq!(Vertex::LAYOUT.array_stride, 24);
        assert_eq!(Vertex::LAYOUT.attributes[1].offset, 12);

        let v = Vertex::from(MeshVertex::new([1.0, 2.0, 3.0], [4.0, 5.0, 6.0]));
        let floats: &[f32] = bytemuck::cast_slice(std::slice::from_ref(&v));
        assert_eq!(floats, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }
}
