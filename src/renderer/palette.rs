//! Palette quantization
//!
//! Maps every pixel to the closest entry of a small fixed palette. The CPU
//! implementation here is the reference; `PalettePass` runs the same rule on
//! the GPU as a fullscreen post-process.

use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::postprocess::{FullscreenQuad, PostPass};
use crate::core::ConfigError;

/// Upper bound on palette entries.
///
/// Also injected into `palette.wgsl` so the shader array and the host agree.
pub const MAX_PALETTE_SIZE: usize = 16;

/// The colours of the default water scene palette.
pub const DEFAULT_PALETTE_HEX: [u32; 10] = [
    0xFDC5B6, 0xC8DCDC, 0xEEE0BE, 0xF5FEEA, 0xFFFFFF, 0xFFFFCC, 0xB4B7AD, 0xBFD6DA, 0x68777D,
    0x6C7C84,
];

/// Convert a 0xRRGGBB value into a normalized colour.
#[must_use]
pub fn hex_to_rgb(hex: u32) -> Vec3 {
    Vec3::new(
        ((hex >> 16) & 0xFF) as f32 / 255.0,
        ((hex >> 8) & 0xFF) as f32 / 255.0,
        (hex & 0xFF) as f32 / 255.0,
    )
}

/// Clamp a colour into `0..=1`, rejecting NaN and infinities
fn normalized(color: Vec3) -> Result<Vec3, ConfigError> {
    match color.to_array().into_iter().find(|c| !c.is_finite()) {
        Some(value) => Err(ConfigError::InvalidValue {
            name: "palette colour",
            value,
        }),
        None => Ok(color.clamp(Vec3::ZERO, Vec3::ONE)),
    }
}

/// Ordered, non-empty set of output colours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec3>", into = "Vec<Vec3>")]
pub struct Palette {
    colors: SmallVec<[Vec3; MAX_PALETTE_SIZE]>,
}

impl Palette {
    /// Build a palette from colours.
    ///
    /// Channels are clamped to `0..=1`.
    ///
    /// # Errors
    ///
    /// Returns an error if `colors` is empty, longer than `MAX_PALETTE_SIZE`
    /// or has a non-finite channel.
    pub fn new(colors: impl IntoIterator<Item = Vec3>) -> Result<Self, ConfigError> {
        let colors = colors
            .into_iter()
            .map(normalized)
            .collect::<Result<SmallVec<[Vec3; MAX_PALETTE_SIZE]>, _>>()?;
        if colors.is_empty() {
            return Err(ConfigError::EmptyPalette);
        }
        if colors.len() > MAX_PALETTE_SIZE {
            return Err(ConfigError::PaletteTooLarge(colors.len()));
        }
        Ok(Self { colors })
    }

    /// Build a palette from 0xRRGGBB values
    ///
    /// # Errors
    ///
    /// Same as [`Palette::new`].
    pub fn from_hex(hex: &[u32]) -> Result<Self, ConfigError> {
        Self::new(hex.iter().copied().map(hex_to_rgb))
    }

    /// Number of active entries (always at least one)
    #[must_use]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Always false; kept for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    #[must_use]
    pub fn colors(&self) -> &[Vec3] {
        &self.colors
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<Vec3> {
        self.colors.get(index).copied()
    }

    /// Replace the entry at `index`.
    ///
    /// # Errors
    ///
    /// Returns an error if `index` is out of range or `color` is not finite.
    pub fn set(&mut self, index: usize, color: Vec3) -> Result<(), ConfigError> {
        let color = normalized(color)?;
        let len = self.colors.len();
        let slot = self
            .colors
            .get_mut(index)
            .ok_or(ConfigError::PaletteIndex { index, len })?;
        *slot = color;
        Ok(())
    }

    /// Append an entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the palette is already full or `color` is not
    /// finite.
    pub fn push(&mut self, color: Vec3) -> Result<(), ConfigError> {
        let color = normalized(color)?;
        if self.colors.len() >= MAX_PALETTE_SIZE {
            return Err(ConfigError::PaletteTooLarge(self.colors.len() + 1));
        }
        self.colors.push(color);
        Ok(())
    }

    /// Remove the entry at `index`.
    ///
    /// # Errors
    ///
    /// Returns an error if `index` is out of range or it is the last entry.
    pub fn remove(&mut self, index: usize) -> Result<Vec3, ConfigError> {
        let len = self.colors.len();
        if index >= len {
            return Err(ConfigError::PaletteIndex { index, len });
        }
        if len == 1 {
            return Err(ConfigError::EmptyPalette);
        }
        Ok(self.colors.remove(index))
    }

    /// Find the closest entry by Euclidean RGB distance.
    ///
    /// Ties go to the earliest entry.
    #[must_use]
    pub fn nearest(&self, color: Vec3) -> (usize, Vec3) {
        let mut best = 0;
        let mut best_distance = color.distance_squared(self.colors[0]);
        for (index, candidate) in self.colors.iter().enumerate().skip(1) {
            let distance = color.distance_squared(*candidate);
            if distance < best_distance {
                best = index;
                best_distance = distance;
            }
        }
        (best, self.colors[best])
    }

    /// Quantize one RGBA sample; the result is scaled by `opacity`.
    #[must_use]
    pub fn quantize(&self, rgba: Vec4, opacity: f32) -> Vec4 {
        let (_, color) = self.nearest(rgba.truncate());
        color.extend(rgba.w) * opacity
    }

    /// Quantize a buffer of RGBA samples in place.
    ///
    /// Each pixel is independent, so any chunking or ordering gives the
    /// same result.
    pub fn quantize_pixels(&self, pixels: &mut [[f32; 4]], opacity: f32) {
        for pixel in pixels.iter_mut() {
            *pixel = self.quantize(Vec4::from_array(*pixel), opacity).to_array();
        }
    }

    /// Quantize an 8-bit image, returning a new image
    #[must_use]
    pub fn quantize_image(&self, image: &image::RgbaImage, opacity: f32) -> image::RgbaImage {
        let mut out = image.clone();
        for pixel in out.pixels_mut() {
            let [r, g, b, a] = pixel.0;
            let sample = Vec4::new(r as f32, g as f32, b as f32, a as f32) / 255.0;
            let quantized = self.quantize(sample, opacity) * 255.0;
            pixel.0 = quantized
                .round()
                .clamp(Vec4::ZERO, Vec4::splat(255.0))
                .to_array()
                .map(|c| c as u8);
        }
        out
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colors: DEFAULT_PALETTE_HEX.iter().copied().map(hex_to_rgb).collect(),
        }
    }
}

impl TryFrom<Vec<Vec3>> for Palette {
    type Error = ConfigError;

    fn try_from(colors: Vec<Vec3>) -> Result<Self, Self::Error> {
        Self::new(colors)
    }
}

impl From<Palette> for Vec<Vec3> {
    fn from(palette: Palette) -> Self {
        palette.colors.into_vec()
    }
}

/// GPU-compatible palette uniform
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct PaletteUniform {
    /// Palette entries, `w` unused
    pub colors: [[f32; 4]; MAX_PALETTE_SIZE],
    /// Number of active entries
    pub count: u32,
    /// Global opacity factor
    pub opacity: f32,
    _padding: [f32; 2],
}

impl PaletteUniform {
    #[must_use]
    pub fn new(palette: &Palette, opacity: f32) -> Self {
        let mut colors = [[0.0; 4]; MAX_PALETTE_SIZE];
        for (slot, color) in colors.iter_mut().zip(palette.colors()) {
            *slot = color.extend(1.0).to_array();
        }
        Self {
            colors,
            count: palette.len() as u32,
            opacity,
            _padding: [0.0; 2],
        }
    }
}

/// Shader source with the palette bound substituted in
#[must_use]
pub fn palette_shader_source() -> String {
    include_str!("shaders/palette.wgsl")
        .replace("{{MAX_PALETTE_SIZE}}", &MAX_PALETTE_SIZE.to_string())
}

/// Fullscreen palette quantization pass
pub struct PalettePass {
    pass: PostPass,
}

impl PalettePass {
    #[must_use]
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat) -> Self {
        let pass = PostPass::new(
            device,
            "palette_pass",
            &palette_shader_source(),
            std::mem::size_of::<PaletteUniform>() as u64,
            &[wgpu::TextureSampleType::Float { filterable: false }],
            format,
        );
        Self { pass }
    }

    pub fn update(&self, queue: &wgpu::Queue, uniform: &PaletteUniform) {
        self.pass.write_uniform(queue, uniform);
    }

    pub fn bind_group(&self, device: &wgpu::Device, source: &wgpu::TextureView) -> wgpu::BindGroup {
        self.pass.bind_group(device, &[source])
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

    fn rgb() -> Palette {
        Palette::new([Vec3::X, Vec3::Y, Vec3::Z]).unwrap()
    }

    #[test]
    fn test_nearest_red() {
        let palette = rgb();
        let (index, color) = palette.nearest(Vec3::new(0.9, 0.1, 0.1));
        assert_eq!(index, 0);
        assert_eq!(color, Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_single_entry_always_matches() {
        let palette = Palette::new([Vec3::ONE]).unwrap();
        for color in [Vec3::ZERO, Vec3::new(0.2, 0.7, 0.1), Vec3::ONE, Vec3::splat(0.5)] {
            assert_eq!(palette.nearest(color).1, Vec3::ONE);
        }
    }

    #[test]
    fn test_result_is_palette_member() {
        let palette = Palette::default();
        for i in 0..64 {
            let t = i as f32 / 63.0;
            let color = Vec3::new(t, (t * 7.0).fract(), 1.0 - t);
            let (index, matched) = palette.nearest(color);
            assert_eq!(palette.colors()[index], matched);
            assert!(palette.colors().contains(&matched));
        }
    }

    #[test]
    fn test_tie_goes_to_first_entry() {
        let palette = Palette::new([Vec3::ZERO, Vec3::ONE]).unwrap();
        let (index, _) = palette.nearest(Vec3::splat(0.5));
        assert_eq!(index, 0);

        let duplicated = Palette::new([Vec3::X, Vec3::Y, Vec3::Y]).unwrap();
        assert_eq!(duplicated.nearest(Vec3::Y).0, 1);
    }

    #[test]
    fn test_strictly_closest_wins() {
        let palette = rgb();
        let (index, _) = palette.nearest(Vec3::new(0.1, 0.2, 0.8));
        assert_eq!(index, 2);
    }

    #[test]
    fn test_quantize_keeps_alpha_and_applies_opacity() {
        let palette = rgb();
        let out = palette.quantize(Vec4::new(0.1, 0.8, 0.2, 0.5), 1.0);
        assert_eq!(out, Vec4::new(0.0, 1.0, 0.0, 0.5));

        let faded = palette.quantize(Vec4::new(0.1, 0.8, 0.2, 1.0), 0.5);
        assert_eq!(faded, Vec4::new(0.0, 0.5, 0.0, 0.5));
    }

    #[test]
    fn test_quantize_pixels_is_pointwise() {
        let palette = rgb();
        let mut pixels = [[0.9, 0.1, 0.1, 1.0], [0.0, 0.2, 0.9, 0.25]];
        palette.quantize_pixels(&mut pixels, 1.0);
        assert_eq!(pixels[0], [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(pixels[1], [0.0, 0.0, 1.0, 0.25]);

        let mut reversed = [[0.0, 0.2, 0.9, 0.25], [0.9, 0.1, 0.1, 1.0]];
        palette.quantize_pixels(&mut reversed, 1.0);
        assert_eq!(reversed[0], pixels[1]);
        assert_eq!(reversed[1], pixels[0]);
    }

    #[test]
    fn test_quantize_image() {
        let palette = rgb();
        let image = image::RgbaImage::from_pixel(2, 2, image::Rgba([230, 20, 30, 255]));
        let out = palette.quantize_image(&image, 1.0);
        assert!(out.pixels().all(|p| p.0 == [255, 0, 0, 255]));
    }

    #[test]
    fn test_empty_palette_rejected() {
        assert!(matches!(
            Palette::new(std::iter::empty()),
            Err(ConfigError::EmptyPalette)
        ));
    }

    #[test]
    fn test_oversized_palette_rejected() {
        let colors = vec![Vec3::ONE; MAX_PALETTE_SIZE + 1];
        assert!(matches!(
            Palette::new(colors),
            Err(ConfigError::PaletteTooLarge(17))
        ));
    }

    #[test]
    fn test_remove_last_entry_rejected() {
        let mut palette = Palette::new([Vec3::ONE]).unwrap();
        assert!(matches!(palette.remove(0), Err(ConfigError::EmptyPalette)));
        assert_eq!(palette.len(), 1);
    }

    #[test]
    fn test_out_of_range_channels_are_clamped() {
        let palette = Palette::new([Vec3::splat(2.0), Vec3::new(5.0, -3.0, 0.5)]).unwrap();
        assert_eq!(palette.colors(), &[Vec3::ONE, Vec3::new(1.0, 0.0, 0.5)]);
    }

    #[test]
    fn test_non_finite_channels_rejected() {
        assert!(matches!(
            Palette::new([Vec3::ONE, Vec3::new(f32::NAN, 0.0, 0.0)]),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            Palette::try_from(vec![Vec3::new(0.0, f32::INFINITY, 0.0)]),
            Err(ConfigError::InvalidValue { .. })
        ));

        let mut palette = rgb();
        assert!(palette.push(Vec3::splat(f32::NAN)).is_err());
        assert!(palette.set(1, Vec3::new(0.0, 0.0, f32::NEG_INFINITY)).is_err());
        assert_eq!(palette, rgb());
    }

    #[test]
    fn test_push_and_set() {
        let mut palette = rgb();
        palette.push(Vec3::splat(2.0)).unwrap();
        assert_eq!(palette.get(3), Some(Vec3::ONE));

        palette.set(0, Vec3::splat(0.25)).unwrap();
        assert_eq!(palette.get(0), Some(Vec3::splat(0.25)));
        assert!(palette.set(10, Vec3::ZERO).is_err());
    }

    #[test]
    fn test_default_palette() {
        let palette = Palette::default();
        assert_eq!(palette.len(), DEFAULT_PALETTE_HEX.len());
        assert_eq!(palette.get(4), Some(Vec3::ONE));
    }

    #[test]
    fn test_hex_to_rgb() {
        let color = hex_to_rgb(0xFF8000);
        assert!((color.x - 1.0).abs() < f32::EPSILON);
        assert!((color.y - 128.0 / 255.0).abs() < f32::EPSILON);
        assert!(color.z.abs() < f32::EPSILON);
    }

    #[test]
    fn test_uniform_packing() {
        let palette = rgb();
        let uniform = PaletteUniform::new(&palette, 0.75);
        assert_eq!(uniform.count, 3);
        assert_eq!(uniform.colors[1], [0.0, 1.0, 0.0, 1.0]);
        assert_eq!(uniform.colors[3], [0.0; 4]);
        assert_eq!(std::mem::size_of::<PaletteUniform>(), 16 * MAX_PALETTE_SIZE + 16);
    }

    #[test]
    fn test_shader_bound_matches_host() {
        let source = palette_shader_source();
        assert!(!source.contains("{{MAX_PALETTE_SIZE}}"));
        assert!(source.contains(&format!("array<vec4<f32>, {MAX_PALETTE_SIZE}>")));
    }
}
