//! Pixel-art water scene renderer
//!
//! This crate provides:
//! - A wgpu scene pass with procedural sky, animated water and fire particles
//! - Pixelation and palette quantization post-processing
//! - Pixel-grid camera alignment for shimmer-free panning
//! - An egui developer panel driven by configuration events

pub mod assets;
pub mod core;
pub mod input;
pub mod renderer;
pub mod ui;

// Re-exports for convenience
pub use egui;
pub use glam;
pub use wgpu;
pub use winit;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::assets::{AssetLoader, LoadResult};
    pub use crate::core::{
        ConfigEvent, DebugInfo, Engine, EngineConfig, EngineContext, FrameStats, Game,
        SceneParams,
    };
    pub use crate::input::{Input, OrbitController};
    pub use crate::renderer::{
        Camera, Material, Mesh, Projection, RenderFrame, Renderer, Texture, TextureOptions, Vertex,
    };
    pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
    pub use winit::keyboard::KeyCode;
}
