//! Post-processing plumbing
//!
//! Render targets, the fullscreen quad, and a small helper for building
//! fullscreen passes that read textures with `textureLoad` and write one
//! colour target.

use bytemuck::{Pod, Zeroable};

/// Format of the scene colour and intermediate post targets
pub const HDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
/// Format of the encoded view-space normal target
pub const NORMAL_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
/// Format of the scene depth target
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Shared vertex stage and colour helpers, prepended to every post shader
const FULLSCREEN_WGSL: &str = include_str!("shaders/fullscreen.wgsl");

/// Concatenate the shared fullscreen prelude with a pass shader
pub(crate) fn fullscreen_source(body: &str) -> String {
    format!("{FULLSCREEN_WGSL}\n{body}")
}

/// Low-resolution scene target: colour, encoded normals and depth
pub struct RenderTarget {
    /// HDR color texture
    pub color_texture: wgpu::Texture,
    /// Color texture view
    pub color_view: wgpu::TextureView,
    /// View-space normals, encoded as `n * 0.5 + 0.5`
    pub normal_texture: wgpu::Texture,
    /// Normal texture view
    pub normal_view: wgpu::TextureView,
    /// Depth texture
    pub depth_texture: wgpu::Texture,
    /// Depth texture view
    pub depth_view: wgpu::TextureView,
    /// Width
    pub width: u32,
    /// Height
    pub height: u32,
}

impl RenderTarget {
    /// Create a new render target; zero sizes are bumped to 1
    #[must_use]
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let usage = wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING;

        let (color_texture, color_view) =
            create_texture(device, "scene_color_texture", width, height, HDR_FORMAT, usage);
        let (normal_texture, normal_view) =
            create_texture(device, "scene_normal_texture", width, height, NORMAL_FORMAT, usage);
        let (depth_texture, depth_view) =
            create_texture(device, "scene_depth_texture", width, height, DEPTH_FORMAT, usage);

        Self {
            color_texture,
            color_view,
            normal_texture,
            normal_view,
            depth_texture,
            depth_view,
            width,
            height,
        }
    }
}

/// Full-resolution colour target used between post passes
pub struct ColorTarget {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub width: u32,
    pub height: u32,
}

impl ColorTarget {
    #[must_use]
    pub fn new(device: &wgpu::Device, label: &str, width: u32, height: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let (texture, view) = create_texture(
            device,
            label,
            width,
            height,
            HDR_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        );
        Self {
            texture,
            view,
            width,
            height,
        }
    }
}

fn create_texture(
    device: &wgpu::Device,
    label: &str,
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
    usage: wgpu::TextureUsages,
) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

/// Full-screen quad for post-processing
pub struct FullscreenQuad {
    /// Vertex buffer
    pub vertex_buffer: wgpu::Buffer,
    /// Number of vertices
    pub vertex_count: u32,
}

/// Fullscreen quad vertex
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct QuadVertex {
    /// Position
    pub position: [f32; 2],
    /// UV coordinates
    pub uv: [f32; 2],
}

impl FullscreenQuad {
    /// Two triangles covering clip space
    pub const VERTICES: [QuadVertex; 6] = [
        QuadVertex {
            position: [-1.0, -1.0],
            uv: [0.0, 1.0],
        },
        QuadVertex {
            position: [1.0, -1.0],
            uv: [1.0, 1.0],
        },
        QuadVertex {
            position: [1.0, 1.0],
            uv: [1.0, 0.0],
        },
        QuadVertex {
            position: [-1.0, -1.0],
            uv: [0.0, 1.0],
        },
        QuadVertex {
            position: [1.0, 1.0],
            uv: [1.0, 0.0],
        },
        QuadVertex {
            position: [-1.0, 1.0],
            uv: [0.0, 0.0],
        },
    ];

    /// Create a fullscreen quad
    #[must_use]
    pub fn new(device: &wgpu::Device) -> Self {
        use wgpu::util::DeviceExt;

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("fullscreen_quad_vertices"),
            contents: bytemuck::cast_slice(&Self::VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });

        Self {
            vertex_buffer,
            vertex_count: Self::VERTICES.len() as u32,
        }
    }

    /// Get vertex buffer layout
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: 8,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
            ],
        }
    }
}

/// Output stage uniform
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct OutputUniform {
    /// 1 when the surface is not sRGB and the shader must encode
    pub encode_srgb: u32,
    /// Linear exposure multiplier
    pub exposure: f32,
    _padding: [f32; 2],
}

impl OutputUniform {
    #[must_use]
    pub fn for_format(format: wgpu::TextureFormat) -> Self {
        Self {
            encode_srgb: u32::from(!format.is_srgb()),
            exposure: 1.0,
            _padding: [0.0; 2],
        }
    }
}

/// A fullscreen pass: one uniform buffer plus N texture inputs
pub struct PostPass {
    label: &'static str,
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    uniform_buffer: wgpu::Buffer,
}

impl PostPass {
    /// Build a pass. `inputs` lists the sample type of each texture binding,
    /// bound in order starting at binding 1.
    pub fn new(
        device: &wgpu::Device,
        label: &'static str,
        source: &str,
        uniform_size: u64,
        inputs: &[wgpu::TextureSampleType],
        format: wgpu::TextureFormat,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(fullscreen_source(source).into()),
        });

        let mut entries = vec![wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }];
        entries.extend(inputs.iter().enumerate().map(|(i, sample_type)| {
            wgpu::BindGroupLayoutEntry {
                binding: i as u32 + 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: *sample_type,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            }
        }));

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(label),
            entries: &entries,
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(label),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[FullscreenQuad::layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: uniform_size,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            label,
            pipeline,
            bind_group_layout,
            uniform_buffer,
        }
    }

    /// Upload the pass uniform
    pub fn write_uniform<T: Pod>(&self, queue: &wgpu::Queue, value: &T) {
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(value));
    }

    /// Bind the uniform plus `views` (in binding order)
    pub fn bind_group(
        &self,
        device: &wgpu::Device,
        views: &[&wgpu::TextureView],
    ) -> wgpu::BindGroup {
        let mut entries = vec![wgpu::BindGroupEntry {
            binding: 0,
            resource: self.uniform_buffer.as_entire_binding(),
        }];
        entries.extend(views.iter().enumerate().map(|(i, view)| wgpu::BindGroupEntry {
            binding: i as u32 + 1,
            resource: wgpu::BindingResource::TextureView(view),
        }));

        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(self.label),
            layout: &self.bind_group_layout,
            entries: &entries,
        })
    }

    /// Record the pass into `encoder`, writing `target`
    pub fn draw(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        bind_group: &wgpu::BindGroup,
        quad: &FullscreenQuad,
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(self.label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, bind_group, &[]);
        pass.set_vertex_buffer(0, quad.vertex_buffer.slice(..));
        pass.draw(0..quad.vertex_count, 0..1);
    }
}

/// Final copy onto the surface
pub struct OutputPass {
    pass: PostPass,
    uniform: OutputUniform,
}

impl OutputPass {
    #[must_use]
    pub fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat) -> Self {
        let pass = PostPass::new(
            device,
            "output_pass",
            include_str!("shaders/output.wgsl"),
            std::mem::size_of::<OutputUniform>() as u64,
            &[wgpu::TextureSampleType::Float { filterable: false }],
            surface_format,
        );
        Self {
            pass,
            uniform: OutputUniform::for_format(surface_format),
        }
    }

    pub fn update(&self, queue: &wgpu::Queue) {
        self.pass.write_uniform(queue, &self.uniform);
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

    #[test]
    fn test_quad_covers_clip_space() {
        let xs: Vec<f32> = FullscreenQuad::VERTICES.iter().map(|v| v.position[0]).collect();
        let ys: Vec<f32> = FullscreenQuad::VERTICES.iter().map(|v| v.position[1]).collect();
        assert!(xs.contains(&-1.0) && xs.contains(&1.0));
        assert!(ys.contains(&-1.0) && ys.contains(&1.0));
        assert_eq!(std::mem::size_of::<QuadVertex>(), 16);
    }

    #[test]
    fn test_output_uniform_encodes_for_linear_surfaces() {
        let linear = OutputUniform::for_format(wgpu::TextureFormat::Bgra8Unorm);
        assert_eq!(linear.encode_srgb, 1);

        let srgb = OutputUniform::for_format(wgpu::TextureFormat::Bgra8UnormSrgb);
        assert_eq!(srgb.encode_srgb, 0);
        assert_eq!(std::mem::size_of::<OutputUniform>(), 16);
    }

    #[test]
    fn test_fullscreen_source_has_vertex_stage() {
        let source = fullscreen_source("// body");
        assert!(source.contains("fn vs_main"));
        assert!(source.ends_with("// body"));
    }
}
