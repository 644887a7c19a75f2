//! Pixelation pass
//!
//! The scene is drawn into a target `pixel_size` times smaller than the
//! window, then upscaled with nearest texel fetches. Depth and normal
//! discontinuities darken or brighten the edge texels.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use super::align::PixelGrid;
use super::postprocess::{FullscreenQuad, PostPass, RenderTarget};

/// User-facing pixelation knobs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PixelationSettings {
    /// Native pixels per logical pixel
    pub pixel_size: u32,
    /// Highlight applied on normal creases
    pub normal_edge_strength: f32,
    /// Darkening applied on depth outlines
    pub depth_edge_strength: f32,
}

impl Default for PixelationSettings {
    fn default() -> Self {
        Self {
            pixel_size: 6,
            normal_edge_strength: 0.3,
            depth_edge_strength: 0.4,
        }
    }
}

impl PixelationSettings {
    pub const MAX_PIXEL_SIZE: u32 = 16;

    /// Copy with every field clamped into its valid range
    #[must_use]
    pub fn sanitized(self) -> Self {
        Self {
            pixel_size: self.pixel_size.clamp(1, Self::MAX_PIXEL_SIZE),
            normal_edge_strength: clamp_strength(self.normal_edge_strength),
            depth_edge_strength: clamp_strength(self.depth_edge_strength),
        }
    }

    /// Grid for a window of `width` x `height`
    #[must_use]
    pub fn grid(&self, width: u32, height: u32) -> PixelGrid {
        PixelGrid::from_target(width, height, self.pixel_size.max(1))
    }
}

fn clamp_strength(value: f32) -> f32 {
    if value.is_finite() { value.clamp(0.0, 2.0) } else { 0.0 }
}

/// Combine the edge indicators into a colour multiplier.
///
/// Depth outlines take precedence over normal creases.
#[must_use]
pub fn edge_strength(depth_edge: f32, normal_edge: f32, settings: &PixelationSettings) -> f32 {
    if depth_edge > 0.0 {
        1.0 - settings.depth_edge_strength * depth_edge
    } else {
        1.0 + settings.normal_edge_strength * normal_edge
    }
}

/// GPU-compatible pixelation uniform
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct PixelateUniform {
    /// Low-resolution size and its reciprocal
    pub resolution: [f32; 4],
    /// Full-resolution output size
    pub output_size: [f32; 4],
    /// x: normal edge strength, y: depth edge strength
    pub strengths: [f32; 4],
}

impl PixelateUniform {
    #[must_use]
    pub fn new(settings: &PixelationSettings, grid: PixelGrid, output: (u32, u32)) -> Self {
        let width = grid.width.max(1) as f32;
        let height = grid.height.max(1) as f32;
        Self {
            resolution: [width, height, 1.0 / width, 1.0 / height],
            output_size: [output.0.max(1) as f32, output.1.max(1) as f32, 0.0, 0.0],
            strengths: [
                settings.normal_edge_strength,
                settings.depth_edge_strength,
                0.0,
                0.0,
            ],
        }
    }
}

/// Upscale + edge detection pass
pub struct PixelationPass {
    pass: PostPass,
}

impl PixelationPass {
    #[must_use]
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat) -> Self {
        let color = wgpu::TextureSampleType::Float { filterable: false };
        let pass = PostPass::new(
            device,
            "pixelation_pass",
            include_str!("shaders/pixelate.wgsl"),
            std::mem::size_of::<PixelateUniform>() as u64,
            &[color, color, wgpu::TextureSampleType::Depth],
            format,
        );
        Self { pass }
    }

    pub fn update(&self, queue: &wgpu::Queue, uniform: &PixelateUniform) {
        self.pass.write_uniform(queue, uniform);
    }

    pub fn bind_group(&self, device: &wgpu::Device, scene: &RenderTarget) -> wgpu::BindGroup {
        self.pass.bind_group(
            device,
            &[&scene.color_view, &scene.normal_view, &scene.depth_view],
        )
    }

    pub fn draw(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        bind_group: &wgpu::BindGroup,
        quad: &FullscreenQuad,
    ) {
        self.pass.draw(encoder, target, bind_group, quad);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = PixelationSettings::default();
        assert_eq!(settings.pixel_size, 6);
        assert!((settings.normal_edge_strength - 0.3).abs() < f32::EPSILON);
        assert!((settings.depth_edge_strength - 0.4).abs() < f32::EPSILON);
    }

    #[test]
    fn test_sanitize_clamps() {
        let settings = PixelationSettings {
            pixel_size: 0,
            normal_edge_strength: -1.0,
            depth_edge_strength: f32::NAN,
        }
        .sanitized();
        assert_eq!(settings.pixel_size, 1);
        assert_eq!(settings.normal_edge_strength, 0.0);
        assert_eq!(settings.depth_edge_strength, 0.0);

        let large = PixelationSettings {
            pixel_size: 99,
            ..Default::default()
        };
        assert_eq!(large.sanitized().pixel_size, PixelationSettings::MAX_PIXEL_SIZE);
    }

    #[test]
    fn test_grid_uses_pixel_size() {
        let settings = PixelationSettings::default();
        let grid = settings.grid(1920, 1080);
        assert_eq!(grid.width, 320);
        assert_eq!(grid.height, 180);

        let unclamped = PixelationSettings {
            pixel_size: 0,
            ..Default::default()
        };
        assert_eq!(unclamped.grid(64, 32).width, 64);
    }

    #[test]
    fn test_depth_edge_wins_over_normal_edge() {
        let settings = PixelationSettings::default();
        let depth = edge_strength(1.0, 1.0, &settings);
        assert!((depth - 0.6).abs() < 1e-6);

        let half = edge_strength(0.5, 0.0, &settings);
        assert!((half - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_normal_edge_brightens() {
        let settings = PixelationSettings::default();
        assert!((edge_strength(0.0, 1.0, &settings) - 1.3).abs() < 1e-6);
        assert_eq!(edge_strength(0.0, 0.0, &settings), 1.0);
    }

    #[test]
    fn test_uniform_packing() {
        let settings = PixelationSettings::default();
        let grid = PixelGrid {
            width: 200,
            height: 100,
        };
        let uniform = PixelateUniform::new(&settings, grid, (1200, 600));
        assert_eq!(uniform.resolution, [200.0, 100.0, 0.005, 0.01]);
        assert_eq!(uniform.output_size[0], 1200.0);
        assert_eq!(std::mem::size_of::<PixelateUniform>(), 48);
    }
}
