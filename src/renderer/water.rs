//! Animated water surface
//!
//! A large plane shaded with four scrolling samples of a tiling normal map,
//! a sun highlight and a Fresnel blend towards a reflection colour.

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use wgpu::util::DeviceExt;

use super::palette::hex_to_rgb;
use super::texture::Texture;

/// Time added to the water clock every frame
pub const WATER_TIME_STEP: f32 = 1.0 / 60.0;

/// Tunable water parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaterParams {
    /// Deep water colour
    pub color: Vec3,
    /// Colour reflected off the surface at grazing angles
    pub reflection_color: Vec3,
    pub distortion_scale: f32,
    /// Normal map tiling; larger means finer ripples
    pub size: f32,
    pub alpha: f32,
    /// Unit direction the ripples drift in
    pub flow: Vec2,
}

impl Default for WaterParams {
    fn default() -> Self {
        Self {
            color: hex_to_rgb(0x001e0f),
            reflection_color: Vec3::new(0.55, 0.65, 0.75),
            distortion_scale: 3.7,
            size: 1.0,
            alpha: 1.0,
            flow: Vec2::new(1.0, 1.0).normalize(),
        }
    }
}

impl WaterParams {
    /// Set the flow direction; a zero vector keeps the current flow
    pub fn set_flow(&mut self, flow: Vec2) {
        if let Some(direction) = flow.try_normalize() {
            self.flow = direction;
        }
    }

    /// Copy with every field clamped into its valid range
    #[must_use]
    pub fn sanitized(self, previous: &Self) -> Self {
        let finite = |value: f32, fallback: f32| if value.is_finite() { value } else { fallback };
        let mut next = Self {
            color: self.color.clamp(Vec3::ZERO, Vec3::ONE),
            reflection_color: self.reflection_color.clamp(Vec3::ZERO, Vec3::ONE),
            distortion_scale: finite(self.distortion_scale, previous.distortion_scale)
                .clamp(0.0, 8.0),
            size: finite(self.size, previous.size).clamp(0.1, 10.0),
            alpha: finite(self.alpha, previous.alpha).clamp(0.0, 1.0),
            flow: previous.flow,
        };
        next.set_flow(self.flow);
        next
    }
}

/// GPU-compatible water uniform
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct WaterUniform {
    /// rgb: water colour, a: alpha
    pub color: [f32; 4],
    /// rgb: reflection colour, a: distortion scale
    pub reflection: [f32; 4],
    /// xy: flow, z: size, w: time
    pub flow: [f32; 4],
}

impl WaterUniform {
    #[must_use]
    pub fn new(params: &WaterParams, time: f32) -> Self {
        Self {
            color: params.color.extend(params.alpha).to_array(),
            reflection: params.reflection_color.extend(params.distortion_scale).to_array(),
            flow: [params.flow.x, params.flow.y, params.size, time],
        }
    }
}

/// GPU resources for the water plane
pub struct Water {
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    /// Accumulated water clock
    pub time: f32,
}

impl Water {
    #[must_use]
    pub fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        normals: &Texture,
        params: &WaterParams,
    ) -> Self {
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("water_uniform_buffer"),
            contents: bytemuck::bytes_of(&WaterUniform::new(params, 0.0)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = Self::create_bind_group(device, layout, &uniform_buffer, normals);

        Self {
            uniform_buffer,
            bind_group,
            time: 0.0,
        }
    }

    fn create_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        uniform_buffer: &wgpu::Buffer,
        normals: &Texture,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("water_bind_group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&normals.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&normals.sampler),
                },
            ],
        })
    }

    /// Swap in a loaded normal map
    pub fn set_normals(
        &mut self,
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        normals: &Texture,
    ) {
        self.bind_group = Self::create_bind_group(device, layout, &self.uniform_buffer, normals);
    }

    /// Advance the clock by one frame and upload parameters
    pub fn update(&mut self, queue: &wgpu::Queue, params: &WaterParams) {
        self.time += WATER_TIME_STEP;
        queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(&WaterUniform::new(params, self.time)),
        );
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    /// Get bind group layout for water
    pub fn bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("water_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = WaterParams::default();
        assert!((params.distortion_scale - 3.7).abs() < f32::EPSILON);
        assert!((params.color.y - 30.0 / 255.0).abs() < 1e-6);
        assert!((params.flow.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_flow_is_normalized() {
        let mut params = WaterParams::default();
        params.set_flow(Vec2::new(3.0, 4.0));
        assert!((params.flow - Vec2::new(0.6, 0.8)).length() < 1e-6);
    }

    #[test]
    fn test_zero_flow_keeps_previous() {
        let mut params = WaterParams::default();
        params.set_flow(Vec2::new(0.0, -2.0));
        params.set_flow(Vec2::ZERO);
        assert_eq!(params.flow, Vec2::new(0.0, -1.0));
    }

    #[test]
    fn test_sanitize_clamps_and_normalizes() {
        let previous = WaterParams::default();
        let next = WaterParams {
            alpha: 2.0,
            size: 0.0,
            distortion_scale: f32::INFINITY,
            flow: Vec2::new(-5.0, 0.0),
            ..Default::default()
        }
        .sanitized(&previous);
        assert_eq!(next.alpha, 1.0);
        assert!((next.size - 0.1).abs() < f32::EPSILON);
        assert!((next.distortion_scale - 3.7).abs() < f32::EPSILON);
        assert_eq!(next.flow, Vec2::new(-1.0, 0.0));
    }

    #[test]
    fn test_uniform_packing() {
        let uniform = WaterUniform::new(&WaterParams::default(), 2.5);
        assert_eq!(uniform.flow[3], 2.5);
        assert_eq!(uniform.color[3], 1.0);
        assert!((uniform.reflection[3] - 3.7).abs() < f32::EPSILON);
        assert_eq!(std::mem::size_of::<WaterUniform>(), 48);
    }
}
