//! GPU side of the solar system: uploads the scene's meshes and textures once,
//! then draws the background, the lit bodies and the bloom chain each frame.

use std::sync::Arc;

use orrery_config::{BloomSettings, RenderConfig};
use orrery_render::{
    BackgroundRenderer, BloomConfig, BloomPipeline, BodyPipeline, BodyUniform, DepthBuffer,
    FrameEncoder, LightingUniform, ManagedTexture, MeshBuffer, MultisampleTarget, RenderContext,
    RenderPassBuilder, SPACE_BLACK, SphereMesh, SurfaceError, TextureError, TextureManager,
    draw_body, msaa_sample_count,
};
use orrery_scene::{SceneState, Viewport};
use tracing::info;
use wgpu::util::DeviceExt;

/// Map the configured bloom settings onto the render pipeline's parameters.
pub fn bloom_config_from(settings: &BloomSettings) -> BloomConfig {
    BloomConfig {
        enabled: settings.enabled,
        threshold: settings.threshold,
        soft_knee: settings.soft_knee,
        strength: settings.strength,
        radius: settings.radius,
        iterations: settings.iterations,
    }
    .sanitized()
}

fn lighting_uniform(scene: &SceneState) -> LightingUniform {
    let lights = scene.lights();
    LightingUniform::new(
        lights.point.position,
        lights.point.range,
        lights.point.color,
        lights.point.intensity,
        lights.ambient.color,
        lights.ambient.intensity,
    )
}

/// GPU resources for one body.
struct BodyGpu {
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    texture: Arc<ManagedTexture>,
}

/// Draws a [`SceneState`] to the window surface.
pub struct SystemRenderer {
    body_pipeline: BodyPipeline,
    sphere: MeshBuffer,
    bodies: Vec<BodyGpu>,
    camera_buffer: wgpu::Buffer,
    lighting_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    background: Option<BackgroundRenderer>,
    depth: DepthBuffer,
    /// Multisampled scene color, resolved into the bloom HDR target. `None`
    /// when MSAA is disabled and the scene draws into the HDR target directly.
    msaa: Option<MultisampleTarget>,
    bloom: BloomPipeline,
}

impl SystemRenderer {
    /// Upload every body texture, the background and the shared sphere mesh.
    ///
    /// Fails on the first texture that cannot be read or decoded.
    pub fn new(
        ctx: &RenderContext,
        scene: &SceneState,
        render_config: &RenderConfig,
    ) -> Result<Self, TextureError> {
        let device = &ctx.device;
        let queue = &ctx.queue;
        let (width, height) = ctx.size();

        let sample_count = msaa_sample_count(render_config.msaa_samples);
        let mut textures = TextureManager::new(device);
        let body_pipeline = BodyPipeline::new(device, textures.bind_group_layout(), sample_count);

        let segments = render_config.sphere_segments;
        let sphere = SphereMesh::uv_sphere(segments, segments).upload(device, "body-sphere");

        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("camera-uniform"),
            contents: bytemuck::bytes_of(&scene.camera().to_uniform()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let lighting_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("lighting-uniform"),
            contents: bytemuck::bytes_of(&lighting_uniform(scene)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame-bind-group"),
            layout: &body_pipeline.frame_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: camera_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: lighting_buffer.as_entire_binding(),
                },
            ],
        });

        let mut bodies = Vec::with_capacity(scene.bodies().len());
        for body in scene.bodies() {
            let texture = textures.load(device, queue, &body.texture)?;
            let uniform = BodyUniform::new(body.model_matrix(), body.emissive);
            let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{}-uniform", body.name)),
                contents: bytemuck::bytes_of(&uniform),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(&format!("{}-bind-group", body.name)),
                layout: &body_pipeline.body_bind_group_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                }],
            });
            info!(
                body = %body.name,
                width = texture.dimensions.0,
                height = texture.dimensions.1,
                "Body uploaded"
            );
            bodies.push(BodyGpu {
                uniform_buffer,
                bind_group,
                texture,
            });
        }

        let background = match scene.background() {
            Some(path) => {
                let texture = textures.load(device, queue, path)?;
                Some(BackgroundRenderer::new(
                    device,
                    textures.bind_group_layout(),
                    &texture,
                    scene.viewport().aspect_ratio(),
                    sample_count,
                ))
            }
            None => None,
        };

        let depth = DepthBuffer::new(device, width, height, sample_count);
        let msaa = (sample_count > 1)
            .then(|| MultisampleTarget::new(device, width, height, sample_count));
        let bloom = BloomPipeline::new(
            device,
            ctx.surface_format,
            width,
            height,
            bloom_config_from(&render_config.bloom),
        );

        info!(
            bodies = bodies.len(),
            textures = textures.len(),
            segments,
            msaa = sample_count,
            bloom = bloom.config().enabled,
            "System renderer initialized"
        );

        Ok(Self {
            body_pipeline,
            sphere,
            bodies,
            camera_buffer,
            lighting_buffer,
            frame_bind_group,
            background,
            depth,
            msaa,
            bloom,
        })
    }

    /// Resize every size-dependent target to `viewport`.
    pub fn resize(&mut self, ctx: &RenderContext, viewport: Viewport) {
        let (width, height) = (viewport.width(), viewport.height());
        self.depth.resize(&ctx.device, width, height);
        if let Some(msaa) = &mut self.msaa {
            msaa.resize(&ctx.device, width, height);
        }
        self.bloom.resize(&ctx.device, width, height);
        if let Some(background) = &self.background {
            background.resize(&ctx.queue, viewport.aspect_ratio());
        }
    }

    /// Swap in new bloom parameters.
    pub fn set_bloom(&mut self, ctx: &RenderContext, settings: &BloomSettings) {
        self.bloom
            .update_config(&ctx.device, &ctx.queue, bloom_config_from(settings));
    }

    /// Render target size in pixels.
    pub fn size(&self) -> (u32, u32) {
        self.bloom.size()
    }

    /// Upload this frame's uniforms, draw, and present.
    pub fn render(&self, ctx: &RenderContext, scene: &SceneState) -> Result<(), SurfaceError> {
        let queue = &ctx.queue;
        queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::bytes_of(&scene.camera().to_uniform()),
        );
        queue.write_buffer(
            &self.lighting_buffer,
            0,
            bytemuck::bytes_of(&lighting_uniform(scene)),
        );
        for (gpu, body) in self.bodies.iter().zip(scene.bodies()) {
            let uniform = BodyUniform::new(body.model_matrix(), body.emissive);
            queue.write_buffer(&gpu.uniform_buffer, 0, bytemuck::bytes_of(&uniform));
        }

        let surface_texture = ctx.get_current_texture()?;
        let mut frame = FrameEncoder::new(&ctx.device, surface_texture);
        let hdr_view = self.bloom.hdr_view();
        let scene_view = self.msaa.as_ref().map_or(hdr_view, |msaa| &msaa.view);

        {
            let builder = RenderPassBuilder::new()
                .clear_color(SPACE_BLACK)
                .label("background-pass");
            let mut pass = frame.begin_render_pass_to(&builder, scene_view);
            if let Some(background) = &self.background {
                background.render(&mut pass);
            }
        }

        {
            let mut builder = RenderPassBuilder::new()
                .preserve_color()
                .depth(self.depth.view.clone(), DepthBuffer::CLEAR_VALUE)
                .label("body-pass");
            if self.msaa.is_some() {
                builder = builder.msaa_resolve(hdr_view.clone());
            }
            let mut pass = frame.begin_render_pass_to(&builder, scene_view);
            for gpu in &self.bodies {
                draw_body(
                    &mut pass,
                    &self.body_pipeline,
                    &self.frame_bind_group,
                    &gpu.bind_group,
                    &gpu.texture.bind_group,
                    &self.sphere,
                );
            }
        }

        let (encoder, surface_view) = frame.encoder_and_view();
        self.bloom.execute(encoder, surface_view);
        frame.submit(queue);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orrery_config::Config;
    use orrery_scene::SceneBuilder;

    #[test]
    fn test_bloom_mapping_keeps_stock_values() {
        let config = bloom_config_from(&BloomSettings::default());
        assert!(config.enabled);
        assert_eq!(config.threshold, 0.85);
        assert_eq!(config.strength, 1.5);
        assert_eq!(config.radius, 0.4);
        assert_eq!(config.iterations, 5);
    }

    #[test]
    fn test_bloom_mapping_sanitizes() {
        let settings = BloomSettings {
            radius: 3.0,
            iterations: 0,
            strength: -1.0,
            ..Default::default()
        };
        let config = bloom_config_from(&settings);
        assert_eq!(config.radius, 1.0);
        assert_eq!(config.iterations, 1);
        assert_eq!(config.strength, 0.0);
    }

    #[test]
    fn test_default_render_config_is_multisampled() {
        assert_eq!(msaa_sample_count(RenderConfig::default().msaa_samples), 4);
        let disabled = RenderConfig {
            msaa_samples: 1,
            ..Default::default()
        };
        assert_eq!(msaa_sample_count(disabled.msaa_samples), 1);
    }

    #[test]
    fn test_lighting_uniform_follows_central_body() {
        let mut scene = SceneBuilder::from_config(&Config::default())
            .require_textures(false)
            .build()
            .unwrap();
        scene.advance(0.0);
        let uniform = lighting_uniform(&scene);
        assert_eq!(uniform.point_position_range, [0.0, 0.0, 0.0, 300.0]);
        assert!((uniform.point_color[0] - 1.2).abs() < 1e-6);
        assert!((uniform.ambient_color[0] - 0.3).abs() < 1e-6);
    }
}
