//! Lit, textured sphere pipeline for celestial bodies.
//!
//! Bodies are shaded with one ambient term and one point light with linear
//! range falloff. Emissive bodies add their own albedo scaled into HDR so the
//! bloom pass picks them up.

use std::num::NonZeroU64;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use crate::bloom::HDR_FORMAT;
use crate::camera::CameraUniform;
use crate::depth::DepthBuffer;
use crate::mesh::{MeshBuffer, VertexPositionNormalUv};

/// Per-frame lighting uniform.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
pub struct LightingUniform {
    /// xyz = point light position, w = range (0 disables falloff).
    pub point_position_range: [f32; 4],
    /// rgb = point light color premultiplied by intensity.
    pub point_color: [f32; 4],
    /// rgb = ambient color premultiplied by intensity.
    pub ambient_color: [f32; 4],
}

impl LightingUniform {
    pub fn new(
        light_position: Vec3,
        light_range: f32,
        light_color: Vec3,
        light_intensity: f32,
        ambient_color: Vec3,
        ambient_intensity: f32,
    ) -> Self {
        let point = light_color * light_intensity;
        let ambient = ambient_color * ambient_intensity;
        Self {
            point_position_range: light_position.extend(light_range.max(0.0)).to_array(),
            point_color: point.extend(1.0).to_array(),
            ambient_color: ambient.extend(1.0).to_array(),
        }
    }
}

/// Point light falloff, mirrored by the WGSL `attenuation`.
///
/// Linear ramp from 1 at the light to 0 at `range`. A range of zero or less
/// means the light never falls off.
pub fn attenuation(distance: f32, range: f32) -> f32 {
    if range <= 0.0 {
        return 1.0;
    }
    (1.0 - distance / range).clamp(0.0, 1.0)
}

/// Per-body uniform.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct BodyUniform {
    /// Object-to-world transform (uniform scale only).
    pub model: [[f32; 4]; 4],
    /// x = emissive multiplier, yzw unused.
    pub emissive: [f32; 4],
}

impl BodyUniform {
    pub fn new(model: Mat4, emissive: f32) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            emissive: [emissive, 0.0, 0.0, 0.0],
        }
    }
}

const BODY_SHADER_SOURCE: &str = r#"
struct CameraUniform {
    view_proj: mat4x4<f32>,
    camera_pos: vec4<f32>,
};

struct LightingUniform {
    point_position_range: vec4<f32>,
    point_color: vec4<f32>,
    ambient_color: vec4<f32>,
};

struct BodyUniform {
    model: mat4x4<f32>,
    emissive: vec4<f32>,
};

@group(0) @binding(0) var<uniform> camera: CameraUniform;
@group(0) @binding(1) var<uniform> lighting: LightingUniform;
@group(1) @binding(0) var<uniform> body: BodyUniform;
@group(2) @binding(0) var albedo_tex: texture_2d<f32>;
@group(2) @binding(1) var albedo_sampler: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) world_normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    let world = body.model * vec4<f32>(in.position, 1.0);
    var out: VertexOutput;
    out.clip_position = camera.view_proj * world;
    out.world_pos = world.xyz;
    out.world_normal = normalize((body.model * vec4<f32>(in.normal, 0.0)).xyz);
    out.uv = in.uv;
    return out;
}

fn attenuation(distance: f32, range: f32) -> f32 {
    if (range <= 0.0) {
        return 1.0;
    }
    return clamp(1.0 - distance / range, 0.0, 1.0);
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let albedo = textureSample(albedo_tex, albedo_sampler, in.uv).rgb;
    let n = normalize(in.world_normal);

    let to_light = lighting.point_position_range.xyz - in.world_pos;
    let distance = length(to_light);
    let l = to_light / max(distance, 0.0001);
    let diffuse = max(dot(n, l), 0.0) * attenuation(distance, lighting.point_position_range.w);

    var color = albedo * (lighting.ambient_color.rgb + lighting.point_color.rgb * diffuse);
    color += albedo * body.emissive.x;
    return vec4<f32>(color, 1.0);
}
"#;

/// Pipeline and bind group layouts for drawing bodies into the HDR target.
pub struct BodyPipeline {
    pub pipeline: wgpu::RenderPipeline,
    /// Group 0: camera (binding 0) and lighting (binding 1).
    pub frame_bind_group_layout: wgpu::BindGroupLayout,
    /// Group 1: per-body uniform.
    pub body_bind_group_layout: wgpu::BindGroupLayout,
}

impl BodyPipeline {
    /// `texture_bind_group_layout` is group 2 (albedo texture + sampler).
    /// `sample_count` must match the color and depth targets of the pass.
    pub fn new(
        device: &wgpu::Device,
        texture_bind_group_layout: &wgpu::BindGroupLayout,
        sample_count: u32,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("body-shader"),
            source: wgpu::ShaderSource::Wgsl(BODY_SHADER_SOURCE.into()),
        });

        let frame_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("body-frame-bind-group-layout"),
                entries: &[
                    uniform_entry(
                        0,
                        wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                        std::mem::size_of::<CameraUniform>(),
                    ),
                    uniform_entry(
                        1,
                        wgpu::ShaderStages::FRAGMENT,
                        std::mem::size_of::<LightingUniform>(),
                    ),
                ],
            });

        let body_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("body-bind-group-layout"),
                entries: &[uniform_entry(
                    0,
                    wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    std::mem::size_of::<BodyUniform>(),
                )],
            });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("body-pipeline-layout"),
            bind_group_layouts: &[
                &frame_bind_group_layout,
                &body_bind_group_layout,
                texture_bind_group_layout,
            ],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("body-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[VertexPositionNormalUv::layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(DepthBuffer::stencil_state(true)),
            multisample: wgpu::MultisampleState {
                count: sample_count,
                ..Default::default()
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: HDR_FORMAT,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview_mask: None,
            cache: None,
        });

        Self {
            pipeline,
            frame_bind_group_layout,
            body_bind_group_layout,
        }
    }
}

/// Draw one body.
pub fn draw_body(
    render_pass: &mut wgpu::RenderPass<'_>,
    pipeline: &BodyPipeline,
    frame_bind_group: &wgpu::BindGroup,
    body_bind_group: &wgpu::BindGroup,
    texture_bind_group: &wgpu::BindGroup,
    mesh: &MeshBuffer,
) {
    render_pass.set_pipeline(&pipeline.pipeline);
    render_pass.set_bind_group(0, frame_bind_group, &[]);
    render_pass.set_bind_group(1, body_bind_group, &[]);
    render_pass.set_bind_group(2, texture_bind_group, &[]);
    mesh.bind(render_pass);
    mesh.draw(render_pass);
}

fn uniform_entry(
    binding: u32,
    visibility: wgpu::ShaderStages,
    size: usize,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: NonZeroU64::new(size as u64),
        },
        count: None,
    }
}
