//! Main renderer implementation

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;
use winit::window::Window;

use super::Camera;
use super::material::Material;
use super::mesh::{Mesh, Vertex};
use super::particles::{Particle, ParticleEmitter};
use super::pipeline::{FrameOutcome, FramePipeline};
use super::pixelate::PixelationSettings;
use super::postprocess::{DEPTH_FORMAT, FullscreenQuad, HDR_FORMAT, NORMAL_FORMAT};
use super::sky::{Sky, SkyParams};
use super::texture::Texture;
use super::water::{Water, WaterParams};
use crate::core::PaletteSettings;

const GLOBALS_WGSL: &str = include_str!("shaders/globals.wgsl");

/// Encoded normal of a pixel nothing was drawn on (view-space +Z)
const NORMAL_CLEAR: wgpu::Color = wgpu::Color {
    r: 0.5,
    g: 0.5,
    b: 1.0,
    a: 0.0,
};

/// Per-frame values shared by every scene pipeline
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct GlobalUniform {
    view_proj: [[f32; 4]; 4],
    view: [[f32; 4]; 4],
    sky_inv_view_proj: [[f32; 4]; 4],
    /// w: elapsed time
    camera_position: [f32; 4],
    camera_right: [f32; 4],
    camera_up: [f32; 4],
    sun_direction: [f32; 4],
    sun_color: [f32; 4],
    ambient: [f32; 4],
}

impl GlobalUniform {
    #[must_use]
    pub fn new(camera: &Camera, lighting: &Lighting, time: f32) -> Self {
        Self {
            view_proj: camera.view_projection_matrix().to_cols_array_2d(),
            view: camera.view_matrix().to_cols_array_2d(),
            sky_inv_view_proj: sky_view_projection(camera).inverse().to_cols_array_2d(),
            camera_position: camera.position.extend(time).to_array(),
            camera_right: camera.right().extend(0.0).to_array(),
            camera_up: camera.up().extend(0.0).to_array(),
            sun_direction: lighting.sun_direction.normalize_or(Vec3::Y).extend(0.0).to_array(),
            sun_color: (lighting.sun_color * lighting.sun_intensity).extend(1.0).to_array(),
            ambient: (lighting.ambient_color * lighting.ambient_intensity)
                .extend(1.0)
                .to_array(),
        }
    }
}

/// Rotation-only perspective used to derive sky view rays.
///
/// Independent of projection mode so the sky keeps its gradient under an
/// orthographic camera.
fn sky_view_projection(camera: &Camera) -> Mat4 {
    let mut view = camera.view_matrix();
    view.w_axis.x = 0.0;
    view.w_axis.y = 0.0;
    view.w_axis.z = 0.0;

    let aspect = if camera.aspect.is_finite() && camera.aspect > 0.0 {
        camera.aspect
    } else {
        1.0
    };
    Mat4::perspective_rh(camera.fov, aspect, 0.1, 10.0) * view
}

/// Uniform buffer for model transform
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct ModelUniform {
    model: [[f32; 4]; 4],
    normal_matrix: [[f32; 4]; 4],
}

impl ModelUniform {
    pub fn from_transform(model: Mat4) -> Self {
        let normal_matrix = model.inverse().transpose();
        Self {
            model: model.to_cols_array_2d(),
            normal_matrix: normal_matrix.to_cols_array_2d(),
        }
    }
}

impl Default for ModelUniform {
    fn default() -> Self {
        Self::from_transform(Mat4::IDENTITY)
    }
}

/// Sun and ambient light
#[derive(Debug, Clone)]
pub struct Lighting {
    /// Direction towards the sun
    pub sun_direction: Vec3,
    pub sun_color: Vec3,
    pub sun_intensity: f32,
    pub ambient_color: Vec3,
    pub ambient_intensity: f32,
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            sun_direction: Vec3::new(-1.0, 1.0, 1.0).normalize(),
            sun_color: Vec3::ONE,
            sun_intensity: 2.0 * std::f32::consts::PI,
            ambient_color: super::palette::hex_to_rgb(0xe7e7e7),
            ambient_intensity: 1.2 * std::f32::consts::PI,
        }
    }
}

/// GPU-side material: uniform buffer plus texture bindings
pub struct MaterialBinding {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

/// Renderer construction errors
#[derive(Debug, Clone)]
pub enum RendererError {
    /// The window surface could not be created
    Surface(String),
    /// No adapter can present to the surface
    NoAdapter,
    /// Device request failed
    Device(String),
}

impl std::fmt::Display for RendererError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Surface(e) => write!(f, "Failed to create surface: {e}"),
            Self::NoAdapter => write!(f, "Failed to find GPU adapter"),
            Self::Device(e) => write!(f, "Failed to create device: {e}"),
        }
    }
}

impl std::error::Error for RendererError {}

struct ScenePipelineDesc<'a> {
    label: &'static str,
    source: &'a str,
    bind_group_layouts: &'a [&'a wgpu::BindGroupLayout],
    buffers: &'a [wgpu::VertexBufferLayout<'a>],
    blend: wgpu::BlendState,
    normal_writes: wgpu::ColorWrites,
    cull_mode: Option<wgpu::Face>,
    depth_write: bool,
    depth_compare: wgpu::CompareFunction,
}

fn create_scene_pipeline(
    device: &wgpu::Device,
    desc: &ScenePipelineDesc<'_>,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(desc.label),
        source: wgpu::ShaderSource::Wgsl(format!("{GLOBALS_WGSL}\n{}", desc.source).into()),
    });

    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(desc.label),
        bind_group_layouts: desc.bind_group_layouts,
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(desc.label),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: desc.buffers,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[
                Some(wgpu::ColorTargetState {
                    format: HDR_FORMAT,
                    blend: Some(desc.blend),
                    write_mask: wgpu::ColorWrites::ALL,
                }),
                Some(wgpu::ColorTargetState {
                    format: NORMAL_FORMAT,
                    blend: None,
                    write_mask: desc.normal_writes,
                }),
            ],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: desc.cull_mode,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: desc.depth_write,
            depth_compare: desc.depth_compare,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

/// Main renderer
pub struct Renderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: (u32, u32),
    global_buffer: wgpu::Buffer,
    global_bind_group: wgpu::BindGroup,
    model_bind_group_layout: wgpu::BindGroupLayout,
    material_bind_group_layout: wgpu::BindGroupLayout,
    sky_bind_group_layout: wgpu::BindGroupLayout,
    water_bind_group_layout: wgpu::BindGroupLayout,
    mesh_pipeline: wgpu::RenderPipeline,
    sky_pipeline: wgpu::RenderPipeline,
    water_pipeline: wgpu::RenderPipeline,
    particle_pipeline: wgpu::RenderPipeline,
    white_texture: Texture,
    flat_normal_texture: Texture,
    post: FramePipeline,
    /// Clear color of the scene target
    pub clear_color: wgpu::Color,
}

impl Renderer {
    /// Create a new renderer
    ///
    /// # Errors
    ///
    /// Returns an error if no surface, adapter or device is available
    pub async fn new(window: Arc<Window>, vsync: bool) -> Result<Self, RendererError> {
        let size = window.inner_size();
        let size = (size.width.max(1), size.height.max(1));

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window)
            .map_err(|e| RendererError::Surface(e.to_string()))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RendererError::NoAdapter)?;

        log::info!("Using GPU: {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("pixel_water_device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await
            .map_err(|e| RendererError::Device(e.to_string()))?;

        // Configure surface
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or_else(|| RendererError::Surface("no supported formats".to_string()))?;
        if !surface_format.is_srgb() {
            log::warn!("Surface {surface_format:?} is not sRGB, encoding in the output pass");
        }

        let present_mode = if vsync {
            wgpu::PresentMode::AutoVsync
        } else {
            wgpu::PresentMode::AutoNoVsync
        };

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.0,
            height: size.1,
            present_mode,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let global_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("global_buffer"),
            contents: bytemuck::bytes_of(&GlobalUniform::new(
                &Camera::default(),
                &Lighting::default(),
                0.0,
            )),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let global_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("global_bind_group_layout"),
                entries: &[uniform_entry(
                    0,
                    wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                )],
            });

        let global_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("global_bind_group"),
            layout: &global_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: global_buffer.as_entire_binding(),
            }],
        });

        let model_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("model_bind_group_layout"),
                entries: &[uniform_entry(0, wgpu::ShaderStages::VERTEX)],
            });

        let material_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("material_bind_group_layout"),
                entries: &[
                    uniform_entry(0, wgpu::ShaderStages::FRAGMENT),
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
            });

        let sky_bind_group_layout = Sky::bind_group_layout(&device);
        let water_bind_group_layout = Water::bind_group_layout(&device);

        let mesh_pipeline = create_scene_pipeline(
            &device,
            &ScenePipelineDesc {
                label: "mesh_pipeline",
                source: include_str!("shaders/scene.wgsl"),
                bind_group_layouts: &[
                    &global_bind_group_layout,
                    &model_bind_group_layout,
                    &material_bind_group_layout,
                ],
                buffers: &[Vertex::layout()],
                blend: wgpu::BlendState::REPLACE,
                normal_writes: wgpu::ColorWrites::ALL,
                cull_mode: Some(wgpu::Face::Back),
                depth_write: true,
                depth_compare: wgpu::CompareFunction::Less,
            },
        );

        let sky_pipeline = create_scene_pipeline(
            &device,
            &ScenePipelineDesc {
                label: "sky_pipeline",
                source: include_str!("shaders/sky.wgsl"),
                bind_group_layouts: &[&global_bind_group_layout, &sky_bind_group_layout],
                buffers: &[FullscreenQuad::layout()],
                blend: wgpu::BlendState::REPLACE,
                normal_writes: wgpu::ColorWrites::ALL,
                cull_mode: None,
                depth_write: false,
                depth_compare: wgpu::CompareFunction::LessEqual,
            },
        );

        let water_pipeline = create_scene_pipeline(
            &device,
            &ScenePipelineDesc {
                label: "water_pipeline",
                source: include_str!("shaders/water.wgsl"),
                bind_group_layouts: &[
                    &global_bind_group_layout,
                    &model_bind_group_layout,
                    &water_bind_group_layout,
                ],
                buffers: &[Vertex::layout()],
                blend: wgpu::BlendState::ALPHA_BLENDING,
                normal_writes: wgpu::ColorWrites::ALL,
                cull_mode: None,
                depth_write: true,
                depth_compare: wgpu::CompareFunction::Less,
            },
        );

        let particle_pipeline = create_scene_pipeline(
            &device,
            &ScenePipelineDesc {
                label: "particle_pipeline",
                source: include_str!("shaders/particle.wgsl"),
                bind_group_layouts: &[&global_bind_group_layout],
                buffers: &[Particle::layout()],
                blend: wgpu::BlendState {
                    color: wgpu::BlendComponent {
                        src_factor: wgpu::BlendFactor::SrcAlpha,
                        dst_factor: wgpu::BlendFactor::One,
                        operation: wgpu::BlendOperation::Add,
                    },
                    alpha: wgpu::BlendComponent::OVER,
                },
                normal_writes: wgpu::ColorWrites::empty(),
                cull_mode: None,
                depth_write: false,
                depth_compare: wgpu::CompareFunction::Less,
            },
        );

        let white_texture = Texture::white(&device, &queue);
        let flat_normal_texture = Texture::flat_normal(&device, &queue);
        let post = FramePipeline::new(&device, surface_format, size.0, size.1);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            size,
            global_buffer,
            global_bind_group,
            model_bind_group_layout,
            material_bind_group_layout,
            sky_bind_group_layout,
            water_bind_group_layout,
            mesh_pipeline,
            sky_pipeline,
            water_pipeline,
            particle_pipeline,
            white_texture,
            flat_normal_texture,
            post,
            clear_color: wgpu::Color {
                r: 0.082,
                g: 0.09,
                b: 0.161,
                a: 1.0,
            },
        })
    }

    /// Resize the surface; zero sizes are ignored
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.size = (width, height);
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);

            log::debug!("Resized to {}x{}", width, height);
        }
    }

    /// Upload camera, lights and time
    pub fn update_globals(&self, camera: &Camera, lighting: &Lighting, time: f32) {
        let uniform = GlobalUniform::new(camera, lighting, time);
        self.queue
            .write_buffer(&self.global_buffer, 0, bytemuck::bytes_of(&uniform));
    }

    /// Upload a mesh to GPU
    pub fn upload_mesh(&self, mesh: &mut Mesh) {
        if mesh.vertices.is_empty() || mesh.indices.is_empty() {
            return;
        }

        let vertex_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("vertex_buffer"),
                contents: bytemuck::cast_slice(&mesh.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });

        let index_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("index_buffer"),
                contents: bytemuck::cast_slice(&mesh.indices),
                usage: wgpu::BufferUsages::INDEX,
            });

        mesh.vertex_buffer = Some(vertex_buffer);
        mesh.index_buffer = Some(index_buffer);
    }

    /// Create a model bind group for rendering
    pub fn create_model_bind_group(&self, transform: Mat4) -> (wgpu::Buffer, wgpu::BindGroup) {
        let uniform = ModelUniform::from_transform(transform);
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("model_buffer"),
                contents: bytemuck::bytes_of(&uniform),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("model_bind_group"),
            layout: &self.model_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });

        (buffer, bind_group)
    }

    /// Update a model buffer
    pub fn update_model_buffer(&self, buffer: &wgpu::Buffer, transform: Mat4) {
        let uniform = ModelUniform::from_transform(transform);
        self.queue
            .write_buffer(buffer, 0, bytemuck::bytes_of(&uniform));
    }

    /// Create a material; without a texture a white texel is bound
    pub fn create_material(
        &self,
        material: &Material,
        texture: Option<&Texture>,
    ) -> MaterialBinding {
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("material_buffer"),
                contents: bytemuck::bytes_of(&material.to_uniform()),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
        let bind_group = self.material_bind_group(&buffer, texture.unwrap_or(&self.white_texture));
        MaterialBinding { buffer, bind_group }
    }

    /// Bind a new texture to an existing material
    pub fn set_material_texture(&self, binding: &mut MaterialBinding, texture: &Texture) {
        binding.bind_group = self.material_bind_group(&binding.buffer, texture);
    }

    fn material_bind_group(&self, buffer: &wgpu::Buffer, texture: &Texture) -> wgpu::BindGroup {
        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("material_bind_group"),
            layout: &self.material_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&texture.sampler),
                },
            ],
        })
    }

    /// Create the sky resources
    pub fn create_sky(&self, params: &SkyParams) -> Sky {
        Sky::new(&self.device, &self.sky_bind_group_layout, params)
    }

    /// Create the water resources with a flat normal map
    pub fn create_water(&self, params: &WaterParams) -> Water {
        Water::new(
            &self.device,
            &self.water_bind_group_layout,
            &self.flat_normal_texture,
            params,
        )
    }

    /// Install a loaded normal map on the water
    pub fn set_water_normals(&self, water: &mut Water, normals: &Texture) {
        water.set_normals(&self.device, &self.water_bind_group_layout, normals);
    }

    /// Size the post targets for this frame
    pub fn prepare_post(
        &mut self,
        pixelation: &PixelationSettings,
        palette: &PaletteSettings,
    ) -> FrameOutcome {
        self.post
            .prepare(&self.device, &self.queue, self.size, pixelation, palette)
    }

    /// Begin a render frame
    pub fn begin_frame(&self) -> Option<RenderFrame> {
        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                return None;
            }
            Err(e) => {
                log::error!("Surface error: {:?}", e);
                return None;
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame_encoder"),
            });

        Some(RenderFrame {
            output,
            view,
            encoder,
        })
    }

    /// End a render frame
    pub fn end_frame(&self, frame: RenderFrame) {
        self.queue.submit(std::iter::once(frame.encoder.finish()));
        frame.output.present();
    }

    /// Begin the scene pass into the low-resolution target
    pub fn begin_scene_pass<'a>(&'a self, frame: &'a mut RenderFrame) -> wgpu::RenderPass<'a> {
        let target = self.post.scene_target();
        frame
            .encoder
            .begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[
                    Some(wgpu::RenderPassColorAttachment {
                        view: &target.color_view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(self.clear_color),
                            store: wgpu::StoreOp::Store,
                        },
                    }),
                    Some(wgpu::RenderPassColorAttachment {
                        view: &target.normal_view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(NORMAL_CLEAR),
                            store: wgpu::StoreOp::Store,
                        },
                    }),
                ],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &target.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            })
    }

    /// Record the post chain onto the surface.
    ///
    /// For a skipped frame the surface is only cleared.
    pub fn finish_scene(&self, frame: &mut RenderFrame, outcome: FrameOutcome) {
        match outcome {
            FrameOutcome::Ready => self.post.run(&mut frame.encoder, &frame.view),
            FrameOutcome::Skipped => {
                let _pass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("skipped_frame_clear"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &frame.view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(self.clear_color),
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                });
            }
        }
    }

    /// Draw the sky behind everything
    pub fn draw_sky(&self, render_pass: &mut wgpu::RenderPass<'_>, sky: &Sky) {
        let quad = self.post.quad();
        render_pass.set_pipeline(&self.sky_pipeline);
        render_pass.set_bind_group(0, &self.global_bind_group, &[]);
        render_pass.set_bind_group(1, sky.bind_group(), &[]);
        render_pass.set_vertex_buffer(0, quad.vertex_buffer.slice(..));
        render_pass.draw(0..quad.vertex_count, 0..1);
    }

    /// Draw a mesh with a transform and material
    pub fn draw_mesh(
        &self,
        render_pass: &mut wgpu::RenderPass<'_>,
        mesh: &Mesh,
        model_bind_group: &wgpu::BindGroup,
        material: &MaterialBinding,
    ) {
        let (Some(vertex_buffer), Some(index_buffer)) = (&mesh.vertex_buffer, &mesh.index_buffer)
        else {
            return;
        };

        render_pass.set_pipeline(&self.mesh_pipeline);
        render_pass.set_bind_group(0, &self.global_bind_group, &[]);
        render_pass.set_bind_group(1, model_bind_group, &[]);
        render_pass.set_bind_group(2, &material.bind_group, &[]);
        render_pass.set_vertex_buffer(0, vertex_buffer.slice(..));
        render_pass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        render_pass.draw_indexed(0..mesh.index_count(), 0, 0..1);
    }

    /// Draw the water plane
    pub fn draw_water(
        &self,
        render_pass: &mut wgpu::RenderPass<'_>,
        mesh: &Mesh,
        model_bind_group: &wgpu::BindGroup,
        water: &Water,
    ) {
        let (Some(vertex_buffer), Some(index_buffer)) = (&mesh.vertex_buffer, &mesh.index_buffer)
        else {
            return;
        };

        render_pass.set_pipeline(&self.water_pipeline);
        render_pass.set_bind_group(0, &self.global_bind_group, &[]);
        render_pass.set_bind_group(1, model_bind_group, &[]);
        render_pass.set_bind_group(2, water.bind_group(), &[]);
        render_pass.set_vertex_buffer(0, vertex_buffer.slice(..));
        render_pass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        render_pass.draw_indexed(0..mesh.index_count(), 0, 0..1);
    }

    /// Draw particles
    pub fn draw_particles(
        &self,
        render_pass: &mut wgpu::RenderPass<'_>,
        emitter: &ParticleEmitter,
    ) {
        if emitter.particle_count() == 0 {
            return;
        }

        let Some(buffer) = emitter.buffer() else {
            return;
        };

        render_pass.set_pipeline(&self.particle_pipeline);
        render_pass.set_bind_group(0, &self.global_bind_group, &[]);
        render_pass.set_vertex_buffer(0, buffer.slice(..));
        // 6 vertices per instance (2 triangles)
        render_pass.draw(0..6, 0..emitter.particle_count() as u32);
    }

    /// Get the device
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// Get the queue
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    /// Surface size in native pixels
    pub fn size(&self) -> (u32, u32) {
        self.size
    }
}

/// A render frame in progress
pub struct RenderFrame {
    output: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
    encoder: wgpu::CommandEncoder,
}

impl RenderFrame {
    /// Surface view and encoder, for overlays drawn after the post chain
    pub fn target(&mut self) -> (&wgpu::TextureView, &mut wgpu::CommandEncoder) {
        (&self.view, &mut self.encoder)
    }
}
