//! wgpu rendering for the orrery: device and surface management, render passes,
//! sphere meshes, textures, the lit body pipeline, the star background and bloom.

pub mod background;
pub mod bloom;
pub mod body_pipeline;
pub mod camera;
pub mod depth;
pub mod gpu;
pub mod mesh;
pub mod msaa;
pub mod pass;
pub mod texture;

#[cfg(test)]
mod test_util;

pub use background::{BackgroundRenderer, cover_uv_scale};
pub use bloom::{BloomConfig, BloomPipeline, HDR_FORMAT, MAX_ITERATIONS, mip_chain_sizes};
pub use body_pipeline::{
    BodyPipeline, BodyUniform, LightingUniform, attenuation, draw_body,
};
pub use camera::{Camera, CameraUniform};
pub use depth::DepthBuffer;
pub use gpu::{RenderContext, RenderContextError, SurfaceError, init_render_context_blocking};
pub use mesh::{MeshBuffer, SphereMesh, VertexPositionNormalUv};
pub use msaa::{MSAA_SAMPLES, MultisampleTarget, msaa_sample_count};
pub use pass::{DepthAttachmentConfig, FrameEncoder, RenderPassBuilder, SPACE_BLACK};
pub use texture::{
    COLOR_TEXTURE_FORMAT, DecodedImage, ManagedTexture, TextureError, TextureManager,
    decode_image, mip_level_count, texture_bind_group_layout,
};
