//! Material system for meshes

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// How a surface is shaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaterialKind {
    /// Lambert diffuse plus a roughness-driven highlight
    #[default]
    Standard,
    /// Colour is the view-space normal
    Normal,
}

/// Material properties for rendering
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct MaterialUniform {
    /// Base color (RGB), w: 1.0 when the diffuse texture is sampled
    pub color: [f32; 4],
    /// x: roughness, y: metalness, z: kind (0 standard, 1 normal), w: uv repeat
    pub params: [f32; 4],
}

impl Default for MaterialUniform {
    fn default() -> Self {
        Material::default().to_uniform()
    }
}

/// Material definition
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Base color
    pub color: Vec3,
    /// 0 is a mirror-like highlight, 1 is fully matte
    pub roughness: f32,
    pub metalness: f32,
    pub kind: MaterialKind,
    /// Whether this material uses a texture
    pub use_texture: bool,
    /// Texture repeats across the UV range
    pub uv_repeat: f32,
}

impl Material {
    /// Create a new material with a color
    pub fn new(color: Vec3) -> Self {
        Self {
            color,
            roughness: 1.0,
            metalness: 0.0,
            kind: MaterialKind::Standard,
            use_texture: false,
            uv_repeat: 1.0,
        }
    }

    /// Standard material with explicit roughness/metalness
    pub fn standard(color: Vec3, roughness: f32, metalness: f32) -> Self {
        Self {
            roughness: roughness.clamp(0.0, 1.0),
            metalness: metalness.clamp(0.0, 1.0),
            ..Self::new(color)
        }
    }

    /// Shade with the surface normal
    pub fn normal() -> Self {
        Self {
            kind: MaterialKind::Normal,
            ..Self::new(Vec3::ONE)
        }
    }

    /// Sample the diffuse texture `repeat` times across the surface
    #[must_use]
    pub fn with_texture(mut self, repeat: f32) -> Self {
        self.use_texture = true;
        self.uv_repeat = repeat;
        self
    }

    /// Convert to uniform data
    pub fn to_uniform(&self) -> MaterialUniform {
        let kind = match self.kind {
            MaterialKind::Standard => 0.0,
            MaterialKind::Normal => 1.0,
        };
        MaterialUniform {
            color: self.color.extend(if self.use_texture { 1.0 } else { 0.0 }).to_array(),
            params: [self.roughness, self.metalness, kind, self.uv_repeat],
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::new(Vec3::new(0.8, 0.8, 0.8))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_textured_uniform() {
        let uniform = Material::standard(Vec3::ONE, 0.8, 0.4).with_texture(4.0).to_uniform();
        assert_eq!(uniform.color, [1.0, 1.0, 1.0, 1.0]);
        assert_eq!(uniform.params, [0.8, 0.4, 0.0, 4.0]);
    }

    #[test]
    fn test_normal_material_kind() {
        let uniform = Material::normal().to_uniform();
        assert_eq!(uniform.params[2], 1.0);
        assert_eq!(uniform.color[3], 0.0);
    }

    #[test]
    fn test_standard_clamps() {
        let material = Material::standard(Vec3::ONE, -1.0, 3.0);
        assert_eq!(material.roughness, 0.0);
        assert_eq!(material.metalness, 1.0);
        assert_eq!(std::mem::size_of::<MaterialUniform>(), 32);
    }
}
