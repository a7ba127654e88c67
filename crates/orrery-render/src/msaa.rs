//! Multisampled HDR color target for antialiased scene passes.
//!
//! The scene is drawn into a [`MultisampleTarget`] and resolved into the
//! single-sample HDR texture that feeds bloom.

use crate::bloom::HDR_FORMAT;

/// Sample count used when multisampling is requested.
pub const MSAA_SAMPLES: u32 = 4;

/// Map a configured sample count onto one every adapter supports for
/// `Rgba16Float` and `Depth32Float`: 0 and 1 disable MSAA, anything else is 4.
pub fn msaa_sample_count(requested: u32) -> u32 {
    if requested <= 1 { 1 } else { MSAA_SAMPLES }
}

/// Multisampled color attachment sized to the render target.
pub struct MultisampleTarget {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    width: u32,
    height: u32,
    sample_count: u32,
}

impl MultisampleTarget {
    /// Create a target. Zero dimensions are clamped to 1.
    pub fn new(device: &wgpu::Device, width: u32, height: u32, sample_count: u32) -> Self {
        let (width, height) = (width.max(1), height.max(1));
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("msaa-color"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format: HDR_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        log::debug!("MSAA color target {width}x{height} at {sample_count}x");

        Self {
            texture,
            view,
            width,
            height,
            sample_count,
        }
    }

    /// Recreate at a new size. No-op if the dimensions are unchanged.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        if self.width == width.max(1) && self.height == height.max(1) {
            return;
        }
        *self = Self::new(device, width, height, self.sample_count);
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }
}
