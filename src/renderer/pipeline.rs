//! Per-frame post chain
//!
//! scene target -> pixelation -> palette (optional) -> output surface

use super::align::PixelGrid;
use super::palette::{PalettePass, PaletteUniform};
use super::pixelate::{PixelateUniform, PixelationPass, PixelationSettings};
use super::postprocess::{ColorTarget, FullscreenQuad, HDR_FORMAT, OutputPass, RenderTarget};
use crate::core::PaletteSettings;

/// What happened to a frame's post chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Targets are ready; the scene and post passes should run
    Ready,
    /// The pixel grid collapsed to zero; nothing but a clear is recorded
    Skipped,
}

/// Which passes run after pixelation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostChain {
    pub palette: bool,
}

impl PostChain {
    /// Number of fullscreen passes, output included
    #[must_use]
    pub fn pass_count(&self) -> usize {
        2 + usize::from(self.palette)
    }
}

struct BindGroups {
    pixelate: wgpu::BindGroup,
    palette: wgpu::BindGroup,
    output_from_ping: wgpu::BindGroup,
    output_from_pong: wgpu::BindGroup,
}

/// Owns the intermediate targets and the fullscreen passes
pub struct FramePipeline {
    quad: FullscreenQuad,
    scene: RenderTarget,
    ping: ColorTarget,
    pong: ColorTarget,
    pixelation: PixelationPass,
    palette: PalettePass,
    output: OutputPass,
    bind_groups: BindGroups,
    grid: PixelGrid,
    output_size: (u32, u32),
    chain: PostChain,
}

impl FramePipeline {
    #[must_use]
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        let grid = PixelationSettings::default().grid(width, height);
        let scene = RenderTarget::new(device, grid.width, grid.height);
        let ping = ColorTarget::new(device, "post_ping", width, height);
        let pong = ColorTarget::new(device, "post_pong", width, height);

        let pixelation = PixelationPass::new(device, HDR_FORMAT);
        let palette = PalettePass::new(device, HDR_FORMAT);
        let output = OutputPass::new(device, surface_format);

        let bind_groups = Self::create_bind_groups(
            device, &scene, &ping, &pong, &pixelation, &palette, &output,
        );

        Self {
            quad: FullscreenQuad::new(device),
            scene,
            ping,
            pong,
            pixelation,
            palette,
            output,
            bind_groups,
            grid,
            output_size: (width.max(1), height.max(1)),
            chain: PostChain { palette: true },
        }
    }

    fn create_bind_groups(
        device: &wgpu::Device,
        scene: &RenderTarget,
        ping: &ColorTarget,
        pong: &ColorTarget,
        pixelation: &PixelationPass,
        palette: &PalettePass,
        output: &OutputPass,
    ) -> BindGroups {
        BindGroups {
            pixelate: pixelation.bind_group(device, scene),
            palette: palette.bind_group(device, &ping.view),
            output_from_ping: output.bind_group(device, &ping.view),
            output_from_pong: output.bind_group(device, &pong.view),
        }
    }

    /// Size the targets for this frame and upload pass uniforms.
    ///
    /// Rebuilds the low-resolution target when the pixel grid changed
    /// (new pixel size or window size).
    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        size: (u32, u32),
        pixelation: &PixelationSettings,
        palette: &PaletteSettings,
    ) -> FrameOutcome {
        let settings = pixelation.sanitized();
        let grid = settings.grid(size.0, size.1);
        if grid.is_degenerate() || size.0 == 0 || size.1 == 0 {
            return FrameOutcome::Skipped;
        }

        let mut rebuilt = false;
        if grid != self.grid {
            log::debug!("Rebuilding scene target at {}x{}", grid.width, grid.height);
            self.scene = RenderTarget::new(device, grid.width, grid.height);
            self.grid = grid;
            rebuilt = true;
        }
        if size != self.output_size {
            self.ping = ColorTarget::new(device, "post_ping", size.0, size.1);
            self.pong = ColorTarget::new(device, "post_pong", size.0, size.1);
            self.output_size = size;
            rebuilt = true;
        }
        if rebuilt {
            self.bind_groups = Self::create_bind_groups(
                device,
                &self.scene,
                &self.ping,
                &self.pong,
                &self.pixelation,
                &self.palette,
                &self.output,
            );
        }

        self.pixelation
            .update(queue, &PixelateUniform::new(&settings, grid, size));
        self.chain = PostChain {
            palette: palette.enabled,
        };
        if palette.enabled {
            self.palette
                .update(queue, &PaletteUniform::new(&palette.palette, palette.opacity));
        }
        self.output.update(queue);

        FrameOutcome::Ready
    }

    #[must_use]
    pub fn scene_target(&self) -> &RenderTarget {
        &self.scene
    }

    #[must_use]
    pub fn quad(&self) -> &FullscreenQuad {
        &self.quad
    }

    /// Record the post chain, ending on `surface`
    pub fn run(&self, encoder: &mut wgpu::CommandEncoder, surface: &wgpu::TextureView) {
        self.pixelation
            .draw(encoder, &self.ping.view, &self.bind_groups.pixelate, &self.quad);

        let output_source = if self.chain.palette {
            self.palette
                .draw(encoder, &self.pong.view, &self.bind_groups.palette, &self.quad);
            &self.bind_groups.output_from_pong
        } else {
            &self.bind_groups.output_from_ping
        };

        self.output.draw(encoder, surface, output_source, &self.quad);
    }
}
