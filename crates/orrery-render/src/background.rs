//! Star background: a flat image drawn behind all scene geometry.
//!
//! Uses a fullscreen triangle into the HDR target. The image is scaled to
//! cover the viewport while keeping its aspect ratio, cropping the excess.

use bytemuck::{Pod, Zeroable};

use crate::bloom::{HDR_FORMAT, create_fullscreen_pipeline};
use crate::texture::ManagedTexture;

/// Uniform for the background pass.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct BackgroundUniform {
    /// xy = UV scale around the image center, zw unused.
    pub uv_scale: [f32; 4],
}

const BACKGROUND_SHADER_SOURCE: &str = r#"
struct BackgroundUniform {
    uv_scale: vec4<f32>,
};

@group(0) @binding(0) var<uniform> background: BackgroundUniform;
@group(1) @binding(0) var stars_tex: texture_2d<f32>;
@group(1) @binding(1) var stars_sampler: sampler;

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_fullscreen(@builtin(vertex_index) idx: u32) -> VertexOutput {
    let uv = vec2<f32>(f32((idx << 1u) & 2u), f32(idx & 2u));
    var out: VertexOutput;
    out.position = vec4<f32>(uv.x * 2.0 - 1.0, 1.0 - uv.y * 2.0, 0.0, 1.0);
    out.uv = uv;
    return out;
}

@fragment
fn fs_background(in: VertexOutput) -> @location(0) vec4<f32> {
    let uv = (in.uv - vec2<f32>(0.5)) * background.uv_scale.xy + vec2<f32>(0.5);
    return vec4<f32>(textureSample(stars_tex, stars_sampler, uv).rgb, 1.0);
}
"#;

/// UV scale that makes an image of `image_aspect` cover a viewport of
/// `viewport_aspect` without stretching.
///
/// Both components are at most 1; the image axis that overflows the viewport
/// is cropped symmetrically. Degenerate aspects fall back to `(1, 1)`.
pub fn cover_uv_scale(viewport_aspect: f32, image_aspect: f32) -> [f32; 2] {
    let valid = |a: f32| a.is_finite() && a > 0.0;
    if !valid(viewport_aspect) || !valid(image_aspect) {
        return [1.0, 1.0];
    }
    if viewport_aspect > image_aspect {
        [1.0, image_aspect / viewport_aspect]
    } else {
        [viewport_aspect / image_aspect, 1.0]
    }
}

/// Draws the star image into the HDR target.
pub struct BackgroundRenderer {
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    texture_bind_group: wgpu::BindGroup,
    image_aspect: f32,
}

impl BackgroundRenderer {
    /// `texture_bind_group_layout` must be the layout `texture` was created with.
    /// `sample_count` must match the color target of the background pass.
    pub fn new(
        device: &wgpu::Device,
        texture_bind_group_layout: &wgpu::BindGroupLayout,
        texture: &ManagedTexture,
        viewport_aspect: f32,
        sample_count: u32,
    ) -> Self {
        use wgpu::util::DeviceExt;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("background-shader"),
            source: wgpu::ShaderSource::Wgsl(BACKGROUND_SHADER_SOURCE.into()),
        });

        let uniform_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("background-uniform-bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: std::num::NonZeroU64::new(16),
                },
                count: None,
            }],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("background-pipeline-layout"),
            bind_group_layouts: &[&uniform_bgl, texture_bind_group_layout],
            immediate_size: 0,
        });
        let pipeline = create_fullscreen_pipeline(
            device,
            &shader,
            &layout,
            "fs_background",
            HDR_FORMAT,
            None,
            sample_count,
            "background-pipeline",
        );

        let (width, height) = texture.dimensions;
        let image_aspect = width as f32 / height.max(1) as f32;
        let uniform = BackgroundUniform::new(cover_uv_scale(viewport_aspect, image_aspect));
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("background-uniform"),
            contents: bytemuck::bytes_of(&uniform),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("background-uniform-bg"),
            layout: &uniform_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        log::info!(
            "Background renderer initialized: {}x{} image",
            width,
            height
        );

        Self {
            pipeline,
            uniform_buffer,
            uniform_bind_group,
            texture_bind_group: texture.bind_group.clone(),
            image_aspect,
        }
    }

    /// Recompute the cover scale for a new viewport aspect ratio.
    pub fn resize(&self, queue: &wgpu::Queue, viewport_aspect: f32) {
        let uniform = BackgroundUniform::new(cover_uv_scale(viewport_aspect, self.image_aspect));
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniform));
    }

    /// Draw into a pass whose color target is the (possibly multisampled)
    /// HDR scene target.
    pub fn render(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
        render_pass.set_bind_group(1, &self.texture_bind_group, &[]);
        render_pass.draw(0..3, 0..1);
    }
}

impl BackgroundUniform {
    fn new(uv_scale: [f32; 2]) -> Self {
        Self {
            uv_scale: [uv_scale[0], uv_scale[1], 0.0, 0.0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matching_aspect_is_identity() {
        assert_eq!(cover_uv_scale(16.0 / 9.0, 16.0 / 9.0), [1.0, 1.0]);
    }

    #[test]
    fn test_wide_viewport_crops_image_vertically() {
        let [u, v] = cover_uv_scale(2.0, 1.0);
        assert_eq!(u, 1.0);
        assert!((v - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_tall_viewport_crops_image_horizontally() {
        let [u, v] = cover_uv_scale(0.5, 1.0);
        assert!((u - 0.5).abs() < 1e-6);
        assert_eq!(v, 1.0);
    }

    #[test]
    fn test_degenerate_aspect_falls_back() {
        assert_eq!(cover_uv_scale(f32::NAN, 1.0), [1.0, 1.0]);
        assert_eq!(cover_uv_scale(1.5, 0.0), [1.0, 1.0]);
        assert_eq!(cover_uv_scale(f32::INFINITY, 1.0), [1.0, 1.0]);
    }

    #[test]
    fn test_uniform_is_16_bytes() {
        assert_eq!(std::mem::size_of::<BackgroundUniform>(), 16);
    }
}
