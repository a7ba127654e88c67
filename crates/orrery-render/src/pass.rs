//! Render pass abstraction for reducing wgpu boilerplate.
//!
//! [`RenderPassBuilder`] describes the attachments of one pass and
//! [`FrameEncoder`] owns the command encoder and swapchain image for a frame.

/// Clear color for the HDR scene target: empty space.
pub const SPACE_BLACK: wgpu::Color = wgpu::Color {
    r: 0.0,
    g: 0.0,
    b: 0.0,
    a: 1.0,
};

/// Configuration for depth stencil attachment.
#[derive(Debug)]
pub struct DepthAttachmentConfig {
    pub view: wgpu::TextureView,
    pub clear_value: f32,
}

/// Builder for configuring render pass descriptors with a fluent API.
#[derive(Debug)]
pub struct RenderPassBuilder {
    clear_color: Option<wgpu::Color>,
    depth_attachment: Option<DepthAttachmentConfig>,
    msaa_resolve_target: Option<wgpu::TextureView>,
    label: Option<&'static str>,
}

impl Default for RenderPassBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderPassBuilder {
    /// Create a builder that clears color to [`SPACE_BLACK`] and has no depth.
    pub fn new() -> Self {
        Self {
            clear_color: Some(SPACE_BLACK),
            depth_attachment: None,
            msaa_resolve_target: None,
            label: None,
        }
    }

    /// Set the clear color for the color attachment.
    pub fn clear_color(mut self, color: wgpu::Color) -> Self {
        self.clear_color = Some(color);
        self
    }

    /// Load the existing color contents instead of clearing.
    pub fn preserve_color(mut self) -> Self {
        self.clear_color = None;
        self
    }

    /// Attach a depth buffer, cleared to `clear_value` at the start of the pass.
    pub fn depth(mut self, view: wgpu::TextureView, clear_value: f32) -> Self {
        self.depth_attachment = Some(DepthAttachmentConfig { view, clear_value });
        self
    }

    /// Resolve the multisampled color attachment into `resolve_target` at the
    /// end of the pass.
    pub fn msaa_resolve(mut self, resolve_target: wgpu::TextureView) -> Self {
        self.msaa_resolve_target = Some(resolve_target);
        self
    }

    /// Set debug label for the render pass.
    pub fn label(mut self, label: &'static str) -> Self {
        self.label = Some(label);
        self
    }

    fn color_load_op(&self) -> wgpu::LoadOp<wgpu::Color> {
        match self.clear_color {
            Some(color) => wgpu::LoadOp::Clear(color),
            None => wgpu::LoadOp::Load,
        }
    }

    /// Begin a pass on `encoder` targeting `color_view`.
    pub fn begin<'encoder>(
        &self,
        encoder: &'encoder mut wgpu::CommandEncoder,
        color_view: &'encoder wgpu::TextureView,
    ) -> wgpu::RenderPass<'encoder> {
        let color_attachment = wgpu::RenderPassColorAttachment {
            view: color_view,
            resolve_target: self.msaa_resolve_target.as_ref(),
            ops: wgpu::Operations {
                load: self.color_load_op(),
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        };

        let depth_stencil_attachment =
            self.depth_attachment
                .as_ref()
                .map(|depth| wgpu::RenderPassDepthStencilAttachment {
                    view: &depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(depth.clear_value),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                });

        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: self.label,
            color_attachments: &[Some(color_attachment)],
            depth_stencil_attachment,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        })
    }
}

/// Per-frame command encoding.
///
/// Dropping a `FrameEncoder` without calling [`submit`](Self::submit)
/// discards the recorded commands and the acquired swapchain image.
pub struct FrameEncoder {
    encoder: wgpu::CommandEncoder,
    surface_texture: wgpu::SurfaceTexture,
    surface_view: wgpu::TextureView,
}

impl FrameEncoder {
    /// Create a new frame encoder for the acquired surface texture.
    pub fn new(device: &wgpu::Device, surface_texture: wgpu::SurfaceTexture) -> Self {
        let encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("frame-encoder"),
        });
        let surface_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            encoder,
            surface_texture,
            surface_view,
        }
    }

    /// Begin a render pass that draws straight to the swapchain image.
    pub fn begin_render_pass<'a>(
        &'a mut self,
        builder: &RenderPassBuilder,
    ) -> wgpu::RenderPass<'a> {
        builder.begin(&mut self.encoder, &self.surface_view)
    }

    /// Begin a render pass that draws into an offscreen view (e.g. the HDR target).
    pub fn begin_render_pass_to<'a>(
        &'a mut self,
        builder: &RenderPassBuilder,
        view: &'a wgpu::TextureView,
    ) -> wgpu::RenderPass<'a> {
        builder.begin(&mut self.encoder, view)
    }

    /// Split borrow of the encoder and the swapchain view, for post-processing
    /// chains that record their own passes.
    pub fn encoder_and_view(&mut self) -> (&mut wgpu::CommandEncoder, &wgpu::TextureView) {
        (&mut self.encoder, &self.surface_view)
    }

    /// Submit the command buffer to the queue and present the surface texture.
    pub fn submit(self, queue: &wgpu::Queue) {
        queue.submit([self.encoder.finish()]);
        self.surface_texture.present();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_sets_clear_color() {
        let builder = RenderPassBuilder::new().clear_color(wgpu::Color::RED);
        assert!(matches!(
            builder.color_load_op(),
            wgpu::LoadOp::Clear(c) if c == wgpu::Color::RED
        ));
    }

    #[test]
    fn test_default_clears_to_black() {
        let builder = RenderPassBuilder::new();
        assert!(matches!(
            builder.color_load_op(),
            wgpu::LoadOp::Clear(c) if c == SPACE_BLACK
        ));
    }

    #[test]
    fn test_preserve_color_loads() {
        let builder = RenderPassBuilder::new().preserve_color();
        assert!(matches!(builder.color_load_op(), wgpu::LoadOp::Load));
    }

    #[test]
    fn test_depth_attachment_is_optional() {
        let builder = RenderPassBuilder::new();
        assert!(builder.depth_attachment.is_none());
    }

    #[test]
    fn test_msaa_resolve_target_is_optional() {
        let builder = RenderPassBuilder::new();
        assert!(builder.msaa_resolve_target.is_none());
    }

    #[test]
    fn test_msaa_resolve_target_is_stored() {
        let Some((device, _queue)) = crate::test_util::create_test_device() else {
            return;
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("resolve"),
            size: wgpu::Extent3d {
                width: 4,
                height: 4,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba16Float,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let builder = RenderPassBuilder::new().msaa_resolve(view);
        assert!(builder.msaa_resolve_target.is_some());
    }

    #[test]
    fn test_label_is_stored() {
        let builder = RenderPassBuilder::new().label("scene-pass");
        assert_eq!(builder.label, Some("scene-pass"));
    }
}
