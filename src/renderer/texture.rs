//! Texture upload and GPU management
//!
//! Decoding happens off-thread in the asset loader; this module only turns
//! decoded RGBA pixels into GPU textures.

use wgpu::util::DeviceExt;

/// How a texture is stored and sampled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureOptions {
    /// Colour data (sRGB) rather than raw vectors such as normals
    pub srgb: bool,
    /// Min/mag filter
    pub filter: wgpu::FilterMode,
}

impl TextureOptions {
    /// Smoothly filtered colour texture
    pub const COLOR: Self = Self {
        srgb: true,
        filter: wgpu::FilterMode::Linear,
    };

    /// Nearest-filtered colour texture, for crisp texels under pixelation
    pub const PIXEL: Self = Self {
        srgb: true,
        filter: wgpu::FilterMode::Nearest,
    };

    /// Linear data such as normal maps
    pub const DATA: Self = Self {
        srgb: false,
        filter: wgpu::FilterMode::Linear,
    };

    #[must_use]
    pub const fn format(&self) -> wgpu::TextureFormat {
        if self.srgb {
            wgpu::TextureFormat::Rgba8UnormSrgb
        } else {
            wgpu::TextureFormat::Rgba8Unorm
        }
    }
}

/// A GPU texture with its view and sampler
#[derive(Debug)]
pub struct Texture {
    /// The GPU texture
    pub texture: wgpu::Texture,
    /// Texture view for binding
    pub view: wgpu::TextureView,
    /// Sampler for texture filtering
    pub sampler: wgpu::Sampler,
    /// Texture dimensions
    pub size: wgpu::Extent3d,
}

impl Texture {
    /// Create a texture from a decoded image
    pub fn from_image(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        img: &image::RgbaImage,
        label: Option<&str>,
        options: TextureOptions,
    ) -> Result<Self, TextureError> {
        Self::from_rgba(device, queue, img.as_raw(), img.dimensions(), label, options)
    }

    /// Create a texture from raw RGBA data
    ///
    /// # Errors
    ///
    /// Returns an error if the size is zero or does not match the data length
    pub fn from_rgba(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        rgba: &[u8],
        dimensions: (u32, u32),
        label: Option<&str>,
        options: TextureOptions,
    ) -> Result<Self, TextureError> {
        let expected = dimensions.0 as usize * dimensions.1 as usize * 4;
        if expected == 0 || rgba.len() != expected {
            return Err(TextureError::DimensionMismatch {
                width: dimensions.0,
                height: dimensions.1,
                bytes: rgba.len(),
            });
        }
        Ok(Self::create(device, queue, rgba, dimensions, label, options))
    }

    fn create(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        rgba: &[u8],
        dimensions: (u32, u32),
        label: Option<&str>,
        options: TextureOptions,
    ) -> Self {
        let size = wgpu::Extent3d {
            width: dimensions.0,
            height: dimensions.1,
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label,
                size,
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: options.format(),
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            rgba,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("texture_sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: options.filter,
            min_filter: options.filter,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
            size,
        }
    }

    /// Create a 1x1 white texture (useful as default/placeholder)
    #[must_use]
    pub fn white(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        Self::create(
            device,
            queue,
            &[255, 255, 255, 255],
            (1, 1),
            Some("white_texture"),
            TextureOptions::COLOR,
        )
    }

    /// 1x1 normal map pointing straight up, used until real normals load
    #[must_use]
    pub fn flat_normal(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        Self::create(
            device,
            queue,
            &FLAT_NORMAL,
            (1, 1),
            Some("flat_normal_texture"),
            TextureOptions::DATA,
        )
    }

    /// Get texture width
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.size.width
    }

    /// Get texture height
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.size.height
    }
}

/// Tangent-space +Z encoded as 8-bit RGBA
pub const FLAT_NORMAL: [u8; 4] = [128, 128, 255, 255];

/// Errors that can occur during texture creation
#[derive(Debug, Clone)]
pub enum TextureError {
    /// Pixel data does not match the requested size
    DimensionMismatch { width: u32, height: u32, bytes: usize },
}

impl std::fmt::Display for TextureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DimensionMismatch {
                width,
                height,
                bytes,
            } => write!(f, "{bytes} bytes do not describe a {width}x{height} RGBA image"),
        }
    }
}

impl std::error::Error for TextureError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formats() {
        assert_eq!(TextureOptions::COLOR.format(), wgpu::TextureFormat::Rgba8UnormSrgb);
        assert_eq!(TextureOptions::DATA.format(), wgpu::TextureFormat::Rgba8Unorm);
        assert_eq!(TextureOptions::PIXEL.filter, wgpu::FilterMode::Nearest);
    }

    #[test]
    fn test_flat_normal_decodes_to_up() {
        let decoded: Vec<f32> = FLAT_NORMAL[..3]
            .iter()
            .map(|&c| c as f32 / 255.0 * 2.0 - 1.0)
            .collect();
        assert!(decoded[0].abs() < 0.01);
        assert!(decoded[1].abs() < 0.01);
        assert!((decoded[2] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_error_display() {
        let err = TextureError::DimensionMismatch {
            width: 2,
            height: 2,
            bytes: 3,
        };
        assert_eq!(err.to_string(), "3 bytes do not describe a 2x2 RGBA image");
    }
}
