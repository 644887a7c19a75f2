//! Rendering module
//!
//! Scene rendering with wgpu into a low-resolution target, followed by the
//! pixelation, palette and output passes.

mod align;
mod camera;
mod context;
mod material;
mod mesh;
mod palette;
mod particles;
mod pipeline;
mod pixelate;
mod postprocess;
mod sky;
mod texture;
mod water;

pub use align::{PixelGrid, pixel_align_frustum, reset_frustum};
pub use camera::{Camera, Frustum, Projection};
pub use context::{
    GlobalUniform, Lighting, MaterialBinding, ModelUniform, RenderFrame, Renderer, RendererError,
};
pub use material::{Material, MaterialKind, MaterialUniform};
pub use mesh::{Mesh, Vertex};
pub use palette::{
    DEFAULT_PALETTE_HEX, MAX_PALETTE_SIZE, Palette, PalettePass, PaletteUniform, hex_to_rgb,
};
pub use particles::{EmitterConfig, Particle, ParticleEmitter};
pub use pipeline::{FrameOutcome, FramePipeline, PostChain};
pub use pixelate::{PixelateUniform, PixelationPass, PixelationSettings, edge_strength};
pub use postprocess::{
    ColorTarget, DEPTH_FORMAT, FullscreenQuad, HDR_FORMAT, NORMAL_FORMAT, OutputPass,
    OutputUniform, RenderTarget,
};
pub use sky::{Sky, SkyParams, SkyUniform, sun_direction};
pub use texture::{Texture, TextureError, TextureOptions};
pub use water::{WATER_TIME_STEP, Water, WaterParams, WaterUniform};
