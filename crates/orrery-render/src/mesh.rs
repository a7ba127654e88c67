//! Sphere geometry and its GPU buffers.
//!
//! Every body is drawn from the same unit UV sphere; radius, spin and
//! placement come from the per-body model matrix.

use bytemuck::{Pod, Zeroable};
use std::f32::consts::{PI, TAU};

/// Vertex format with position, normal, and UV coordinates.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct VertexPositionNormalUv {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl VertexPositionNormalUv {
    /// Get the vertex buffer layout for this vertex type.
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
            wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];

        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<VertexPositionNormalUv>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}

/// CPU-side sphere mesh.
#[derive(Debug, Clone)]
pub struct SphereMesh {
    pub vertices: Vec<VertexPositionNormalUv>,
    pub indices: Vec<u32>,
}

impl SphereMesh {
    /// Generate a unit UV sphere.
    ///
    /// `width_segments` runs around the equator (clamped to at least 3),
    /// `height_segments` from pole to pole (clamped to at least 2). The seam
    /// column is duplicated so UVs span the full `[0, 1]` range, with `v = 0`
    /// at the north pole to match top-down image rows.
    pub fn uv_sphere(width_segments: u32, height_segments: u32) -> Self {
        let w = width_segments.max(3);
        let h = height_segments.max(2);
        let row = w + 1;

        let mut vertices = Vec::with_capacity((row * (h + 1)) as usize);
        for iy in 0..=h {
            let v = iy as f32 / h as f32;
            let (sin_theta, cos_theta) = (v * PI).sin_cos();
            for ix in 0..=w {
                let u = ix as f32 / w as f32;
                let (sin_phi, cos_phi) = (u * TAU).sin_cos();
                let p = [-cos_phi * sin_theta, cos_theta, sin_phi * sin_theta];
                vertices.push(VertexPositionNormalUv {
                    position: p,
                    normal: p,
                    uv: [u, v],
                });
            }
        }

        let mut indices = Vec::with_capacity((6 * w * (h - 1)) as usize);
        for iy in 0..h {
            for ix in 0..w {
                let a = iy * row + ix + 1;
                let b = iy * row + ix;
                let c = (iy + 1) * row + ix;
                let d = (iy + 1) * row + ix + 1;
                // Pole rows collapse to a single triangle per segment.
                if iy != 0 {
                    indices.extend_from_slice(&[a, b, d]);
                }
                if iy != h - 1 {
                    indices.extend_from_slice(&[b, c, d]);
                }
            }
        }

        Self { vertices, indices }
    }

    /// Upload to the GPU.
    pub fn upload(&self, device: &wgpu::Device, label: &str) -> MeshBuffer {
        use wgpu::util::DeviceExt;

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-vertices")),
            contents: bytemuck::cast_slice(&self.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-indices")),
            contents: bytemuck::cast_slice(&self.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        MeshBuffer {
            vertex_buffer,
            index_buffer,
            index_count: self.indices.len() as u32,
        }
    }
}

/// A mesh resident on the GPU, indexed with `u32`.
pub struct MeshBuffer {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

impl MeshBuffer {
    /// Bind vertex and index buffers to a render pass.
    pub fn bind(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
    }

    /// Draw the entire mesh using indexed rendering.
    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        render_pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}
