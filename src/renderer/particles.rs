//! Particle system for the fire effect
//!
//! Particles are simulated on the CPU and drawn as camera-facing quads from
//! an instance buffer.

use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4};

/// A single particle, laid out as one instance
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct Particle {
    /// World position
    pub position: [f32; 3],
    /// Total lifetime (seconds)
    pub lifetime: f32,
    /// Velocity
    pub velocity: [f32; 3],
    /// Age (seconds since spawn)
    pub age: f32,
    /// Color (RGBA)
    pub color: [f32; 4],
    /// Billboard size in world units
    pub size: f32,
    /// Rotation (radians)
    pub rotation: f32,
    /// Size at spawn; `size` shrinks from it
    start_size: f32,
    /// Angular velocity (radians per second)
    spin: f32,
}

impl Particle {
    /// Normalized age in `0..=1`
    #[must_use]
    pub fn progress(&self) -> f32 {
        if self.lifetime <= 0.0 {
            1.0
        } else {
            (self.age / self.lifetime).clamp(0.0, 1.0)
        }
    }

    /// Vertex buffer layout for instanced drawing
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 7] = wgpu::vertex_attr_array![
            0 => Float32x3, // position
            1 => Float32,   // lifetime
            2 => Float32x3, // velocity
            3 => Float32,   // age
            4 => Float32x4, // color
            5 => Float32,   // size
            6 => Float32,   // rotation
        ];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Particle>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &ATTRIBUTES,
        }
    }
}

/// Particle emitter configuration
#[derive(Debug, Clone)]
pub struct EmitterConfig {
    /// Maximum number of particles
    pub max_particles: u32,
    /// Particles spawned per second
    pub spawn_rate: f32,
    /// Particle lifetime range (min, max)
    pub lifetime: (f32, f32),
    /// Initial velocity range
    pub velocity_min: Vec3,
    pub velocity_max: Vec3,
    /// Particles spawn within this radius of the emitter on the XZ plane
    pub spawn_radius: f32,
    /// Initial size range
    pub size: (f32, f32),
    /// Fraction of the initial size left at death
    pub end_size: f32,
    /// Start color
    pub start_color: Vec4,
    /// End color (fade to)
    pub end_color: Vec4,
    /// Constant acceleration
    pub gravity: Vec3,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            max_particles: 1000,
            spawn_rate: 100.0,
            lifetime: (1.0, 2.0),
            velocity_min: Vec3::new(-1.0, 1.0, -1.0),
            velocity_max: Vec3::new(1.0, 3.0, 1.0),
            spawn_radius: 0.0,
            size: (0.1, 0.3),
            end_size: 1.0,
            start_color: Vec4::new(1.0, 1.0, 1.0, 1.0),
            end_color: Vec4::new(1.0, 1.0, 1.0, 0.0),
            gravity: Vec3::new(0.0, -9.8, 0.0),
        }
    }
}

impl EmitterConfig {
    /// Rising flames: hot yellow cores fading to transparent red
    #[must_use]
    pub fn fire() -> Self {
        Self {
            max_particles: 400,
            spawn_rate: 140.0,
            lifetime: (0.5, 1.2),
            velocity_min: Vec3::new(-0.8, 3.0, -0.8),
            velocity_max: Vec3::new(0.8, 6.0, 0.8),
            spawn_radius: 1.2,
            size: (1.2, 2.4),
            end_size: 0.2,
            start_color: Vec4::new(1.0, 0.85, 0.3, 1.0),
            end_color: Vec4::new(0.9, 0.15, 0.02, 0.0),
            gravity: Vec3::new(0.0, 2.0, 0.0),
        }
    }

    /// Set maximum particles
    #[must_use]
    pub const fn with_max_particles(mut self, max: u32) -> Self {
        self.max_particles = max;
        self
    }

    /// Set spawn rate (particles per second)
    #[must_use]
    pub const fn with_spawn_rate(mut self, rate: f32) -> Self {
        self.spawn_rate = rate;
        self
    }
}

/// Particle emitter
#[derive(Debug)]
pub struct ParticleEmitter {
    /// Configuration
    pub config: EmitterConfig,
    /// World position
    pub position: Vec3,
    particles: Vec<Particle>,
    spawn_accumulator: f32,
    active: bool,
    rng: XorShift,
    /// GPU buffer (if uploaded)
    buffer: Option<wgpu::Buffer>,
}

impl ParticleEmitter {
    /// Create a new emitter
    #[must_use]
    pub fn new(config: EmitterConfig) -> Self {
        Self {
            particles: Vec::with_capacity(config.max_particles as usize),
            config,
            position: Vec3::ZERO,
            spawn_accumulator: 0.0,
            active: true,
            rng: XorShift::new(12345),
            buffer: None,
        }
    }

    /// Set emitter position
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// Stop emitting (particles continue to live)
    pub fn stop(&mut self) {
        self.active = false;
    }

    /// Get active particle count
    #[must_use]
    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    /// Check if emitter is active
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Advance the simulation
    pub fn update(&mut self, delta_time: f32) {
        if !delta_time.is_finite() || delta_time <= 0.0 {
            return;
        }

        let config = &self.config;
        self.particles.retain_mut(|particle| {
            particle.age += delta_time;

            let velocity = Vec3::from(particle.velocity) + config.gravity * delta_time;
            particle.velocity = velocity.into();
            particle.position = (Vec3::from(particle.position) + velocity * delta_time).into();
            particle.rotation += particle.spin * delta_time;

            let t = particle.progress();
            particle.color = config.start_color.lerp(config.end_color, t).into();
            particle.size = particle.start_size * (1.0 + (config.end_size - 1.0) * t);

            particle.age < particle.lifetime
        });

        if self.active {
            self.spawn_accumulator += self.config.spawn_rate * delta_time;

            while self.spawn_accumulator >= 1.0
                && self.particles.len() < self.config.max_particles as usize
            {
                self.spawn_particle();
                self.spawn_accumulator -= 1.0;
            }
            // Drop spawns that had no room
            self.spawn_accumulator = self.spawn_accumulator.min(1.0);
        }
    }

    fn spawn_particle(&mut self) {
        use std::f32::consts::TAU;

        let config = &self.config;
        let rng = &mut self.rng;

        let lifetime = lerp(config.lifetime.0, config.lifetime.1, rng.next_f32());
        let velocity = Vec3::new(
            lerp(config.velocity_min.x, config.velocity_max.x, rng.next_f32()),
            lerp(config.velocity_min.y, config.velocity_max.y, rng.next_f32()),
            lerp(config.velocity_min.z, config.velocity_max.z, rng.next_f32()),
        );

        let angle = rng.next_f32() * TAU;
        let distance = config.spawn_radius * rng.next_f32().sqrt();
        let offset = Vec3::new(angle.cos() * distance, 0.0, angle.sin() * distance);

        let size = lerp(config.size.0, config.size.1, rng.next_f32());

        let particle = Particle {
            position: (self.position + offset).into(),
            lifetime,
            velocity: velocity.into(),
            age: 0.0,
            color: config.start_color.into(),
            size,
            rotation: rng.next_f32() * TAU,
            start_size: size,
            spin: lerp(-2.0, 2.0, rng.next_f32()),
        };

        self.particles.push(particle);
    }

    /// Get particles for rendering
    #[must_use]
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Create or update GPU buffer
    pub fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) {
        if self.particles.is_empty() {
            return;
        }

        let data = bytemuck::cast_slice(&self.particles);

        if let Some(buffer) = &self.buffer
            && buffer.size() >= data.len() as u64
        {
            queue.write_buffer(buffer, 0, data);
            return;
        }

        // Sized for the maximum so it is only created once
        let capacity = std::mem::size_of::<Particle>() * self.config.max_particles as usize;
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("particle_buffer"),
            size: capacity.max(data.len()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        queue.write_buffer(&buffer, 0, data);
        self.buffer = Some(buffer);
    }

    /// Get GPU buffer
    #[must_use]
    pub fn buffer(&self) -> Option<&wgpu::Buffer> {
        self.buffer.as_ref()
    }
}

/// Simple linear interpolation
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Small deterministic generator, one per emitter
#[derive(Debug, Clone)]
struct XorShift(u32);

impl XorShift {
    fn new(seed: u32) -> Self {
        Self(seed.max(1))
    }

    fn next_f32(&mut self) -> f32 {
        let mut s = self.0;
        s ^= s << 13;
        s ^= s >> 17;
        s ^= s << 5;
        self.0 = s;
        (s as f32) / (u32::MAX as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_particle_emitter_update() {
        let config = EmitterConfig {
            max_particles: 100,
            spawn_rate: 10.0,
            lifetime: (1.0, 1.0),
            ..Default::default()
        };

        let mut emitter = ParticleEmitter::new(config);
        emitter.update(1.0);

        assert_eq!(emitter.particle_count(), 10);
    }

    #[test]
    fn test_particle_death() {
        let config = EmitterConfig {
            max_particles: 10,
            spawn_rate: 100.0,
            lifetime: (0.1, 0.1),
            ..Default::default()
        };

        let mut emitter = ParticleEmitter::new(config);

        emitter.update(0.05);
        assert!(emitter.particle_count() > 0);

        emitter.stop();
        assert!(!emitter.is_active());
        emitter.update(0.2);

        assert_eq!(emitter.particle_count(), 0);
    }

    #[test]
    fn test_max_particles_respected() {
        let mut emitter = ParticleEmitter::new(EmitterConfig::fire().with_max_particles(20));
        for _ in 0..10 {
            emitter.update(0.1);
        }
        assert!(emitter.particle_count() <= 20);
    }

    #[test]
    fn test_fire_rises_and_fades() {
        let mut emitter = ParticleEmitter::new(EmitterConfig::fire().with_spawn_rate(50.0));
        emitter.set_position(Vec3::new(5.0, 1.0, 0.0));
        emitter.update(0.1);
        emitter.stop();
        emitter.update(0.3);

        for particle in emitter.particles() {
            assert!(particle.position[1] > 1.0);
            assert!(particle.color[3] < 1.0);
            assert!(particle.size < particle.start_size);
            let horizontal = Vec3::new(particle.position[0] - 5.0, 0.0, particle.position[2]);
            assert!(horizontal.length() < 1.2 + 0.8 * 0.4 + 1e-3);
        }
    }

    #[test]
    fn test_zero_delta_is_ignored() {
        let mut emitter = ParticleEmitter::new(EmitterConfig::fire());
        emitter.update(0.0);
        emitter.update(f32::NAN);
        assert_eq!(emitter.particle_count(), 0);
    }

    #[test]
    fn test_instance_stride() {
        assert_eq!(std::mem::size_of::<Particle>(), 64);
        assert_eq!(Particle::layout().array_stride, 64);
    }
}
