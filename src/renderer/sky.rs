//! Procedural sky
//!
//! Preetham-style daylight model. The scattering coefficients only depend
//! on the sky parameters, so they are computed here once per change and the
//! shader evaluates the per-direction terms. The sky is drawn as a
//! fullscreen quad at the far plane before any geometry.

use std::f32::consts::PI;

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use wgpu::util::DeviceExt;

/// Wavelength-dependent Rayleigh scattering at sea level
const TOTAL_RAYLEIGH: Vec3 = Vec3::new(5.804_542_996e-6, 1.356_291_142e-5, 3.026_590_247e-5);
/// Mie scattering constant per wavelength
const MIE_CONST: Vec3 = Vec3::new(1.839_991_851e14, 2.779_802_392e14, 4.079_047_954e14);
/// Angle past the horizon at which the sun stops lighting the sky
const CUTOFF_ANGLE: f32 = 1.610_731_155_6;
const STEEPNESS: f32 = 1.5;
/// Extraterrestrial solar irradiance
const SOLAR_IRRADIANCE: f32 = 1000.0;

/// Tunable sky parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkyParams {
    pub turbidity: f32,
    pub rayleigh: f32,
    pub mie_coefficient: f32,
    pub mie_directional_g: f32,
    /// 0..1, where 0.5 puts the sun on the horizon
    pub elevation: f32,
    /// 0..1 around the vertical axis
    pub azimuth: f32,
}

impl Default for SkyParams {
    fn default() -> Self {
        Self {
            turbidity: 10.0,
            rayleigh: 2.0,
            mie_coefficient: 0.005,
            mie_directional_g: 0.8,
            elevation: 0.49,
            azimuth: 0.205,
        }
    }
}

impl SkyParams {
    /// Unit vector pointing at the sun
    #[must_use]
    pub fn sun_direction(&self) -> Vec3 {
        sun_direction(self.elevation, self.azimuth)
    }

    /// Copy clamped to the ranges the scattering model tolerates
    #[must_use]
    pub fn sanitized(self) -> Self {
        let finite = |value: f32, fallback: f32| if value.is_finite() { value } else { fallback };
        let defaults = Self::default();
        Self {
            turbidity: finite(self.turbidity, defaults.turbidity).clamp(0.0, 20.0),
            rayleigh: finite(self.rayleigh, defaults.rayleigh).clamp(0.0, 4.0),
            mie_coefficient: finite(self.mie_coefficient, defaults.mie_coefficient).clamp(0.0, 0.1),
            mie_directional_g: finite(self.mie_directional_g, defaults.mie_directional_g)
                .clamp(0.0, 0.999),
            elevation: finite(self.elevation, defaults.elevation).clamp(0.0, 1.0),
            azimuth: finite(self.azimuth, defaults.azimuth).clamp(0.0, 1.0),
        }
    }
}

/// Sun direction from normalized elevation and azimuth.
///
/// `theta = PI * (elevation - 0.5)`, `phi = 2 PI * (azimuth - 0.5)`.
#[must_use]
pub fn sun_direction(elevation: f32, azimuth: f32) -> Vec3 {
    let theta = PI * (elevation - 0.5);
    let phi = 2.0 * PI * (azimuth - 0.5);
    Vec3::new(phi.cos(), phi.sin() * theta.sin(), phi.sin() * theta.cos())
}

/// Sun irradiance reaching the atmosphere for a sun at `zenith_cos`
#[must_use]
pub fn sun_intensity(zenith_cos: f32) -> f32 {
    let zenith_angle = zenith_cos.clamp(-1.0, 1.0).acos();
    SOLAR_IRRADIANCE * (1.0 - (-((CUTOFF_ANGLE - zenith_angle) / STEEPNESS)).exp()).max(0.0)
}

/// Mie scattering coefficient for a turbidity
#[must_use]
pub fn total_mie(turbidity: f32) -> Vec3 {
    let c = (0.2 * turbidity) * 10e-18;
    0.434 * c * MIE_CONST
}

/// GPU-compatible sky uniform
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct SkyUniform {
    /// xyz: sun direction, w: sun intensity
    pub sun: [f32; 4],
    /// xyz: Rayleigh coefficient, w: sun fade
    pub beta_r: [f32; 4],
    /// xyz: Mie coefficient, w: Mie directional g
    pub beta_m: [f32; 4],
}

impl SkyUniform {
    #[must_use]
    pub fn new(params: &SkyParams) -> Self {
        let params = params.sanitized();
        let sun = params.sun_direction();
        let sun_e = sun_intensity(sun.dot(Vec3::Y));
        let sun_fade = 1.0 - (1.0 - (sun.y / 450_000.0).exp()).clamp(0.0, 1.0);
        let rayleigh = params.rayleigh - (1.0 - sun_fade);
        let beta_r = TOTAL_RAYLEIGH * rayleigh;
        let beta_m = total_mie(params.turbidity) * params.mie_coefficient;

        Self {
            sun: sun.extend(sun_e).to_array(),
            beta_r: beta_r.extend(sun_fade).to_array(),
            beta_m: beta_m.extend(params.mie_directional_g).to_array(),
        }
    }
}

/// GPU resources for the sky
pub struct Sky {
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl Sky {
    #[must_use]
    pub fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, params: &SkyParams) -> Self {
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("sky_uniform_buffer"),
            contents: bytemuck::bytes_of(&SkyUniform::new(params)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("sky_bind_group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        Self {
            uniform_buffer,
            bind_group,
        }
    }

    /// Upload new parameters
    pub fn update(&self, queue: &wgpu::Queue, params: &SkyParams) {
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&SkyUniform::new(params)));
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    /// Get bind group layout for the sky
    pub fn bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sky_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sun_direction_is_unit_length() {
        for i in 0..=10 {
            for j in 0..=10 {
                let dir = sun_direction(i as f32 / 10.0, j as f32 / 10.0);
                assert!((dir.length() - 1.0).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn test_default_sun_sits_near_horizon() {
        let sun = SkyParams::default().sun_direction();
        assert!(sun.y.abs() < 0.05, "sun.y = {}", sun.y);
    }

    #[test]
    fn test_horizon_elevation_gives_flat_sun() {
        let sun = sun_direction(0.5, 0.25);
        assert!(sun.y.abs() < 1e-6);
        assert!((sun.z - -1.0).abs() < 1e-6);
    }

    #[test]
    fn test_sun_intensity_falls_off_past_cutoff() {
        let zenith = sun_intensity(1.0);
        let horizon = sun_intensity(0.0);
        let below = sun_intensity(-0.5);
        assert!(zenith > horizon);
        assert!(horizon > 0.0);
        assert_eq!(below, 0.0);
    }

    #[test]
    fn test_uniform_packs_coefficients() {
        let uniform = SkyUniform::new(&SkyParams::default());
        assert!(uniform.sun[3] > 0.0);
        assert!(uniform.beta_r[0] > 0.0 && uniform.beta_r[2] > uniform.beta_r[0]);
        assert!((uniform.beta_m[3] - 0.8).abs() < f32::EPSILON);
        assert_eq!(std::mem::size_of::<SkyUniform>(), 48);
    }

    #[test]
    fn test_sanitize_replaces_nan() {
        let params = SkyParams {
            turbidity: f32::NAN,
            elevation: 3.0,
            ..Default::default()
        }
        .sanitized();
        assert_eq!(params.turbidity, 10.0);
        assert_eq!(params.elevation, 1.0);
    }
}
