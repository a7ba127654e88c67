//! HDR bloom post-processing.
//!
//! The scene renders into an `Rgba16Float` target owned by [`BloomPipeline`].
//! Bright pixels are extracted with a soft threshold, blurred through a
//! downsample/upsample mip chain, and added on top of the ACES-tonemapped
//! scene when the result is written to the swapchain.

use bytemuck::{Pod, Zeroable};

/// Format of the HDR scene target and every bloom mip.
pub const HDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

/// Upper bound on mip levels; beyond this the chain is a few pixels wide.
pub const MAX_ITERATIONS: u32 = 8;

/// Configuration for the bloom post-processing effect.
#[derive(Clone, Debug, PartialEq)]
pub struct BloomConfig {
    /// When false only the tonemap pass runs.
    pub enabled: bool,
    /// Luminance above which pixels contribute to bloom.
    pub threshold: f32,
    /// Width of the soft transition around the threshold, in \[0, 1\].
    pub soft_knee: f32,
    /// Multiplier on the glow composited over the scene.
    pub strength: f32,
    /// Spread of the upsample tent filter, in \[0, 1\].
    pub radius: f32,
    /// Number of mip levels in the blur chain, in \[1, 8\].
    pub iterations: u32,
}

impl Default for BloomConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: 0.85,
            soft_knee: 0.5,
            strength: 1.5,
            radius: 0.4,
            iterations: 5,
        }
    }
}

impl BloomConfig {
    /// Clamp every field into its supported range.
    pub fn sanitized(mut self) -> Self {
        self.threshold = self.threshold.max(0.0);
        self.soft_knee = self.soft_knee.clamp(0.0, 1.0);
        self.strength = self.strength.max(0.0);
        self.radius = self.radius.clamp(0.0, 1.0);
        self.iterations = self.iterations.clamp(1, MAX_ITERATIONS);
        self
    }

    fn params(&self) -> BloomParams {
        BloomParams {
            threshold: self.threshold,
            // The knee is expressed relative to the threshold.
            knee: self.threshold * self.soft_knee,
            strength: self.strength,
            radius: self.radius,
        }
    }
}

/// GPU uniform for bloom shader parameters.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct BloomParams {
    threshold: f32,
    knee: f32,
    strength: f32,
    radius: f32,
}

/// WGSL shader source for every bloom pass.
const BLOOM_SHADER_SOURCE: &str = r#"
struct BloomParams {
    threshold: f32,
    knee: f32,
    strength: f32,
    radius: f32,
};

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@group(0) @binding(0) var<uniform> params: BloomParams;
@group(1) @binding(0) var input_tex: texture_2d<f32>;
@group(1) @binding(1) var input_sampler: sampler;

@vertex
fn vs_fullscreen(@builtin(vertex_index) idx: u32) -> VertexOutput {
    let uv = vec2<f32>(f32((idx << 1u) & 2u), f32(idx & 2u));
    var out: VertexOutput;
    out.position = vec4<f32>(uv * 2.0 - 1.0, 0.0, 1.0);
    out.uv = vec2<f32>(uv.x, 1.0 - uv.y);
    return out;
}

fn soft_threshold(color: vec3<f32>) -> vec3<f32> {
    let luminance = dot(color, vec3<f32>(0.2126, 0.7152, 0.0722));
    let knee = params.knee;
    let soft = clamp(luminance - params.threshold + knee, 0.0, 2.0 * knee);
    let curve = soft * soft / (4.0 * knee + 0.0001);
    let factor = max(luminance - params.threshold, curve) / max(luminance, 0.0001);
    return color * max(factor, 0.0);
}

@fragment
fn fs_extract(in: VertexOutput) -> @location(0) vec4<f32> {
    let color = textureSample(input_tex, input_sampler, in.uv).rgb;
    return vec4<f32>(soft_threshold(color), 1.0);
}

@fragment
fn fs_downsample(in: VertexOutput) -> @location(0) vec4<f32> {
    let texel = 1.0 / vec2<f32>(textureDimensions(input_tex));
    let a = textureSample(input_tex, input_sampler, in.uv + vec2(-texel.x, -texel.y)).rgb;
    let b = textureSample(input_tex, input_sampler, in.uv + vec2( texel.x, -texel.y)).rgb;
    let c = textureSample(input_tex, input_sampler, in.uv + vec2(-texel.x,  texel.y)).rgb;
    let d = textureSample(input_tex, input_sampler, in.uv + vec2( texel.x,  texel.y)).rgb;
    return vec4<f32>((a + b + c + d) * 0.25, 1.0);
}

@fragment
fn fs_upsample(in: VertexOutput) -> @location(0) vec4<f32> {
    // 3x3 tent filter; radius widens the taps.
    let texel = (0.5 + 1.5 * params.radius) / vec2<f32>(textureDimensions(input_tex));
    var sum = textureSample(input_tex, input_sampler, in.uv).rgb * 4.0;
    sum += textureSample(input_tex, input_sampler, in.uv + vec2(-texel.x, 0.0)).rgb * 2.0;
    sum += textureSample(input_tex, input_sampler, in.uv + vec2( texel.x, 0.0)).rgb * 2.0;
    sum += textureSample(input_tex, input_sampler, in.uv + vec2(0.0, -texel.y)).rgb * 2.0;
    sum += textureSample(input_tex, input_sampler, in.uv + vec2(0.0,  texel.y)).rgb * 2.0;
    sum += textureSample(input_tex, input_sampler, in.uv + vec2(-texel.x, -texel.y)).rgb;
    sum += textureSample(input_tex, input_sampler, in.uv + vec2( texel.x, -texel.y)).rgb;
    sum += textureSample(input_tex, input_sampler, in.uv + vec2(-texel.x,  texel.y)).rgb;
    sum += textureSample(input_tex, input_sampler, in.uv + vec2( texel.x,  texel.y)).rgb;
    return vec4<f32>(sum / 16.0, 1.0);
}

fn aces(hdr: vec3<f32>) -> vec3<f32> {
    let a = 2.51;
    let b = 0.03;
    let c = 2.43;
    let d = 0.59;
    let e = 0.14;
    return clamp((hdr * (a * hdr + b)) / (hdr * (c * hdr + d) + e), vec3<f32>(0.0), vec3<f32>(1.0));
}

@fragment
fn fs_tonemap(in: VertexOutput) -> @location(0) vec4<f32> {
    return vec4<f32>(aces(textureSample(input_tex, input_sampler, in.uv).rgb), 1.0);
}

@fragment
fn fs_bloom_composite(in: VertexOutput) -> @location(0) vec4<f32> {
    let bloom = textureSample(input_tex, input_sampler, in.uv).rgb * params.strength;
    return vec4<f32>(aces(bloom), 1.0);
}
"#;

/// Dimensions of each level of the blur chain: half resolution first, then
/// halving per level, never below 1×1.
pub fn mip_chain_sizes(width: u32, height: u32, iterations: u32) -> Vec<(u32, u32)> {
    let mut sizes = Vec::with_capacity(iterations as usize);
    let (mut w, mut h) = ((width / 2).max(1), (height / 2).max(1));
    for _ in 0..iterations {
        sizes.push((w, h));
        w = (w / 2).max(1);
        h = (h / 2).max(1);
    }
    sizes
}

/// One offscreen target with the bind group that samples it.
struct RenderTarget {
    view: wgpu::TextureView,
    bind_group: wgpu::BindGroup,
}

/// Multi-pass bloom post-processing pipeline.
pub struct BloomPipeline {
    config: BloomConfig,
    texture_bgl: wgpu::BindGroupLayout,
    extract_pipeline: wgpu::RenderPipeline,
    downsample_pipeline: wgpu::RenderPipeline,
    upsample_pipeline: wgpu::RenderPipeline,
    tonemap_pipeline: wgpu::RenderPipeline,
    composite_pipeline: wgpu::RenderPipeline,
    sampler: wgpu::Sampler,
    params_buffer: wgpu::Buffer,
    params_bind_group: wgpu::BindGroup,
    hdr: RenderTarget,
    mips: Vec<RenderTarget>,
    size: (u32, u32),
}

impl BloomPipeline {
    /// Create the pipeline and its render targets at `width`×`height`.
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        config: BloomConfig,
    ) -> Self {
        use wgpu::util::DeviceExt;

        let config = config.sanitized();
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("bloom-shader"),
            source: wgpu::ShaderSource::Wgsl(BLOOM_SHADER_SOURCE.into()),
        });

        let params_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("bloom-params-bgl"),
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
        let texture_bgl = crate::texture::texture_bind_group_layout(device, "bloom-texture-bgl");

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("bloom-layout"),
            bind_group_layouts: &[&params_bgl, &texture_bgl],
            immediate_size: 0,
        });

        let additive = Some(wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent::OVER,
        });
        let fullscreen = |entry: &str, format, blend, label: &str| {
            create_fullscreen_pipeline(device, &shader, &layout, entry, format, blend, 1, label)
        };
        let extract_pipeline = fullscreen("fs_extract", HDR_FORMAT, None, "bloom-extract");
        let downsample_pipeline =
            fullscreen("fs_downsample", HDR_FORMAT, None, "bloom-downsample");
        let upsample_pipeline = fullscreen("fs_upsample", HDR_FORMAT, additive, "bloom-upsample");
        let tonemap_pipeline = fullscreen("fs_tonemap", surface_format, None, "bloom-tonemap");
        let composite_pipeline = fullscreen(
            "fs_bloom_composite",
            surface_format,
            additive,
            "bloom-composite",
        );

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("bloom-sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("bloom-params"),
            contents: bytemuck::bytes_of(&config.params()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let params_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("bloom-params-bg"),
            layout: &params_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: params_buffer.as_entire_binding(),
            }],
        });

        let size = (width.max(1), height.max(1));
        let hdr = create_target(device, &texture_bgl, &sampler, size, "bloom-hdr");
        let mips = create_mip_chain(device, &texture_bgl, &sampler, size, config.iterations);

        Self {
            config,
            texture_bgl,
            extract_pipeline,
            downsample_pipeline,
            upsample_pipeline,
            tonemap_pipeline,
            composite_pipeline,
            sampler,
            params_buffer,
            params_bind_group,
            hdr,
            mips,
            size,
        }
    }

    /// The HDR view the scene renders into.
    pub fn hdr_view(&self) -> &wgpu::TextureView {
        &self.hdr.view
    }

    /// Current render-target size in physical pixels.
    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn config(&self) -> &BloomConfig {
        &self.config
    }

    /// Recreate the HDR target and mip chain. No-op if the size is unchanged.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        let size = (width.max(1), height.max(1));
        if size == self.size {
            return;
        }
        self.size = size;
        self.hdr = create_target(device, &self.texture_bgl, &self.sampler, size, "bloom-hdr");
        self.mips = create_mip_chain(
            device,
            &self.texture_bgl,
            &self.sampler,
            size,
            self.config.iterations,
        );
        log::debug!("Bloom targets resized to {}x{}", size.0, size.1);
    }

    /// Update bloom parameters, rebuilding the mip chain if its depth changed.
    pub fn update_config(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        config: BloomConfig,
    ) {
        let config = config.sanitized();
        queue.write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(&config.params()));
        if config.iterations != self.config.iterations {
            self.mips = create_mip_chain(
                device,
                &self.texture_bgl,
                &self.sampler,
                self.size,
                config.iterations,
            );
        }
        self.config = config;
    }

    /// Resolve the HDR target onto `surface_view`: extract → downsample →
    /// upsample → tonemap → composite. With bloom disabled only tonemap runs.
    pub fn execute(&self, encoder: &mut wgpu::CommandEncoder, surface_view: &wgpu::TextureView) {
        let clear = wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT);

        if self.config.enabled && !self.mips.is_empty() {
            self.run_pass(
                encoder,
                &self.extract_pipeline,
                &self.hdr,
                &self.mips[0].view,
                clear,
                "bloom-extract",
            );

            for i in 1..self.mips.len() {
                self.run_pass(
                    encoder,
                    &self.downsample_pipeline,
                    &self.mips[i - 1],
                    &self.mips[i].view,
                    clear,
                    "bloom-downsample",
                );
            }

            for i in (0..self.mips.len() - 1).rev() {
                self.run_pass(
                    encoder,
                    &self.upsample_pipeline,
                    &self.mips[i + 1],
                    &self.mips[i].view,
                    wgpu::LoadOp::Load,
                    "bloom-upsample",
                );
            }
        }

        self.run_pass(
            encoder,
            &self.tonemap_pipeline,
            &self.hdr,
            surface_view,
            wgpu::LoadOp::Clear(wgpu::Color::BLACK),
            "bloom-tonemap",
        );

        if self.config.enabled && !self.mips.is_empty() {
            self.run_pass(
                encoder,
                &self.composite_pipeline,
                &self.mips[0],
                surface_view,
                wgpu::LoadOp::Load,
                "bloom-composite",
            );
        }
    }

    fn run_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        pipeline: &wgpu::RenderPipeline,
        source: &RenderTarget,
        target_view: &wgpu::TextureView,
        load: wgpu::LoadOp<wgpu::Color>,
        label: &str,
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &self.params_bind_group, &[]);
        pass.set_bind_group(1, &source.bind_group, &[]);
        pass.draw(0..3, 0..1);
    }
}

/// Create a fullscreen-triangle pipeline with the given fragment entry point.
pub(crate) fn create_fullscreen_pipeline(
    device: &wgpu::Device,
    shader: &wgpu::ShaderModule,
    layout: &wgpu::PipelineLayout,
    fragment_entry: &str,
    target_format: wgpu::TextureFormat,
    blend: Option<wgpu::BlendState>,
    sample_count: u32,
    label: &str,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_fullscreen"),
            buffers: &[],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState {
            count: sample_count,
            ..Default::default()
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some(fragment_entry),
            targets: &[Some(wgpu::ColorTargetState {
                format: target_format,
                blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        multiview_mask: None,
        cache: None,
    })
}

fn create_target(
    device: &wgpu::Device,
    texture_bgl: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    (width, height): (u32, u32),
    label: &str,
) -> RenderTarget {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: HDR_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout: texture_bgl,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    });
    RenderTarget { view, bind_group }
}

fn create_mip_chain(
    device: &wgpu::Device,
    texture_bgl: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    (width, height): (u32, u32),
    iterations: u32,
) -> Vec<RenderTarget> {
    mip_chain_sizes(width, height, iterations)
        .into_iter()
        .map(|size| create_target(device, texture_bgl, sampler, size, "bloom-mip"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::create_test_device;

    /// CPU mirror of the shader's `soft_threshold` factor.
    fn threshold_factor(luminance: f32, params: &BloomParams) -> f32 {
        let knee = params.knee;
        let soft = (luminance - params.threshold + knee).clamp(0.0, 2.0 * knee);
        let curve = soft * soft / (4.0 * knee + 0.0001);
        ((luminance - params.threshold).max(curve) / luminance.max(0.0001)).max(0.0)
    }

    #[test]
    fn test_default_matches_stock_scene() {
        let config = BloomConfig::default();
        assert!(config.enabled);
        assert_eq!(config.threshold, 0.85);
        assert_eq!(config.strength, 1.5);
        assert_eq!(config.radius, 0.4);
        assert_eq!(config.iterations, 5);
    }

    #[test]
    fn test_sanitized_clamps_ranges() {
        let config = BloomConfig {
            enabled: true,
            threshold: -1.0,
            soft_knee: 3.0,
            strength: -2.0,
            radius: 1.5,
            iterations: 40,
        }
        .sanitized();
        assert_eq!(config.threshold, 0.0);
        assert_eq!(config.soft_knee, 1.0);
        assert_eq!(config.strength, 0.0);
        assert_eq!(config.radius, 1.0);
        assert_eq!(config.iterations, MAX_ITERATIONS);

        let config = BloomConfig {
            iterations: 0,
            ..Default::default()
        };
        assert_eq!(config.sanitized().iterations, 1);
    }

    #[test]
    fn test_bright_pixels_bloom_dim_pixels_do_not() {
        let params = BloomConfig::default().params();
        assert!(threshold_factor(4.0, &params) > 0.7);
        assert_eq!(threshold_factor(0.3, &params), 0.0);
    }

    #[test]
    fn test_knee_softens_the_cutoff() {
        let params = BloomConfig::default().params();
        // Just under the threshold, the knee still lets a little through.
        let below = threshold_factor(params.threshold - 0.05, &params);
        assert!(below > 0.0 && below < 0.2, "got {below}");
    }

    #[test]
    fn test_mip_chain_halves_each_level() {
        assert_eq!(
            mip_chain_sizes(1920, 1080, 5),
            vec![(960, 540), (480, 270), (240, 135), (120, 67), (60, 33)]
        );
    }

    #[test]
    fn test_mip_chain_never_reaches_zero() {
        let sizes = mip_chain_sizes(3, 1, 4);
        assert_eq!(sizes, vec![(1, 1), (1, 1), (1, 1), (1, 1)]);
    }

    #[test]
    fn test_params_uniform_size() {
        assert_eq!(std::mem::size_of::<BloomParams>(), 16);
    }

    #[test]
    fn test_resize_tracks_size() {
        let Some((device, _queue)) = create_test_device() else {
            return;
        };
        let mut bloom = BloomPipeline::new(
            &device,
            wgpu::TextureFormat::Bgra8UnormSrgb,
            800,
            600,
            BloomConfig::default(),
        );
        assert_eq!(bloom.size(), (800, 600));
        bloom.resize(&device, 1920, 1080);
        assert_eq!(bloom.size(), (1920, 1080));
        assert_eq!(bloom.mips.len(), 5);
    }
}
