//! Pixel-art water scene
//!
//! A bobbing cube on an endless sea, a spinning torus knot on a wooden
//! platform and a camp fire, all rendered through the pixelation and palette
//! passes. Press F1 to toggle the developer panel.
//!
//! Usage: `pixel-water [preset.ron]` (or set `PIXEL_WATER_CONFIG`)

use std::path::PathBuf;

use pixel_water::prelude::*;
use pixel_water::renderer::{
    EmitterConfig, FrameOutcome, Lighting, MaterialBinding, ParticleEmitter, Sky, Water,
    pixel_align_frustum, reset_frustum,
};
use pixel_water::ui::draw_panel;

const GROUND_TEXTURE: &str = "ground";
const WATER_NORMALS: &str = "water_normals";

/// Where the wooden platform sits
const PLATFORM_CENTER: Vec3 = Vec3::new(40.0, 1.0, 0.0);
const PLATFORM_SIZE: f32 = 40.0;

/// A drawable mesh with its own transform and material
struct SceneObject {
    mesh: Mesh,
    model: (wgpu::Buffer, wgpu::BindGroup),
    material: MaterialBinding,
}

impl SceneObject {
    fn new(renderer: &Renderer, mut mesh: Mesh, material: &Material, transform: Mat4) -> Self {
        renderer.upload_mesh(&mut mesh);
        Self {
            mesh,
            model: renderer.create_model_bind_group(transform),
            material: renderer.create_material(material, None),
        }
    }

    fn set_transform(&self, renderer: &Renderer, transform: Mat4) {
        renderer.update_model_buffer(&self.model.0, transform);
    }

    fn draw(&self, renderer: &Renderer, pass: &mut wgpu::RenderPass<'_>) {
        renderer.draw_mesh(pass, &self.mesh, &self.model.1, &self.material);
    }
}

/// GPU resources, created once the renderer exists
struct SceneGpu {
    sky: Sky,
    water: Water,
    water_plane: Mesh,
    water_model: (wgpu::Buffer, wgpu::BindGroup),
    cube: SceneObject,
    knot: SceneObject,
    platform: SceneObject,
    /// Loaded textures, kept for the lifetime of the scene
    textures: Vec<Texture>,
}

struct PixelWater {
    params: SceneParams,
    camera: Camera,
    orbit: OrbitController,
    lighting: Lighting,
    loader: AssetLoader,
    fire: ParticleEmitter,
    gpu: Option<SceneGpu>,
    elapsed: f32,
    knot_rotation: Vec2,
}

impl PixelWater {
    fn new(params: SceneParams, asset_root: PathBuf) -> Self {
        let eye = Vec3::new(30.0, 30.0, 100.0);
        let target = Vec3::new(0.0, 10.0, 0.0);

        let mut fire = ParticleEmitter::new(EmitterConfig::fire());
        fire.set_position(PLATFORM_CENTER + Vec3::new(8.0, 0.0, 8.0));

        Self {
            params,
            camera: Camera::look_at(eye, target, Vec3::Y),
            orbit: OrbitController::looking_from(eye, target),
            lighting: Lighting::default(),
            loader: AssetLoader::new(asset_root),
            fire,
            gpu: None,
            elapsed: 0.0,
            knot_rotation: Vec2::ZERO,
        }
    }

    fn cube_transform(&self) -> Mat4 {
        let t = self.elapsed;
        Mat4::from_scale_rotation_translation(
            Vec3::splat(30.0),
            Quat::from_euler(glam::EulerRot::XYZ, 0.5 * t, 0.0, 0.51 * t),
            Vec3::new(-20.0, t.sin() * 20.0 + 5.0, 0.0),
        )
    }

    fn knot_transform(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            Vec3::splat(1.0),
            Quat::from_euler(
                glam::EulerRot::XYZ,
                self.knot_rotation.x,
                self.knot_rotation.y,
                0.0,
            ),
            PLATFORM_CENTER + Vec3::new(0.0, 8.0, 0.0),
        )
    }

    fn apply_events(&mut self, ctx: &EngineContext) {
        for event in ctx.events.iter() {
            if let Err(e) = self.params.apply(event) {
                log::warn!("Rejected {event:?}: {e}");
            }
        }
    }

    fn install_assets(&mut self, ctx: &EngineContext) {
        let finished = self.loader.poll();
        let (Some(renderer), Some(gpu)) = (ctx.renderer(), &mut self.gpu) else {
            return;
        };

        for loaded in finished {
            // Failures were logged by the loader; the fallback stays bound
            let Ok(image) = loaded.result else {
                continue;
            };

            let options = match loaded.key.as_str() {
                GROUND_TEXTURE => TextureOptions::PIXEL,
                WATER_NORMALS => TextureOptions::DATA,
                other => {
                    log::warn!("No consumer for asset '{other}'");
                    continue;
                }
            };

            let texture = match Texture::from_image(
                renderer.device(),
                renderer.queue(),
                &image,
                Some(loaded.key.as_str()),
                options,
            ) {
                Ok(texture) => texture,
                Err(e) => {
                    log::warn!("Asset '{}' rejected: {e}", loaded.key);
                    continue;
                }
            };

            if loaded.key == GROUND_TEXTURE {
                renderer.set_material_texture(&mut gpu.platform.material, &texture);
            } else {
                renderer.set_water_normals(&mut gpu.water, &texture);
            }
            gpu.textures.push(texture);
        }
    }

    fn update_camera(&mut self, ctx: &mut EngineContext, dt: f32) {
        let camera_params = self.params.camera;

        self.orbit
            .update(&ctx.input, ctx.height(), dt, camera_params.auto_pan);
        self.orbit.apply(&mut self.camera);

        self.camera.projection = camera_params.projection;
        self.camera.zoom = match camera_params.projection {
            Projection::Perspective => 1.0,
            Projection::Orthographic => camera_params.ortho_zoom,
        };
        self.camera.set_aspect(ctx.width(), ctx.height());

        let aspect = ctx.aspect_ratio();
        let grid = self.params.pixelation.grid(ctx.width(), ctx.height());
        // Perspective cameras are reset to centered bounds by the aligner
        let offset = if camera_params.pixel_aligned_panning {
            pixel_align_frustum(&mut self.camera, aspect, grid)
        } else {
            reset_frustum(&mut self.camera, aspect);
            None
        };
        match offset {
            Some(offset) => ctx.debug.add_line(format!(
                "Grid {}x{} | offset ({:+.2}, {:+.2})",
                grid.width, grid.height, offset.x, offset.y
            )),
            None => ctx
                .debug
                .add_line(format!("Grid {}x{}", grid.width, grid.height)),
        }
    }
}

impl Game for PixelWater {
    fn init(&mut self, ctx: &mut EngineContext) {
        log::info!("Initializing pixel water scene");

        let Some(renderer) = ctx.renderer() else {
            return;
        };

        let mut water_plane = Mesh::plane(10_000.0);
        renderer.upload_mesh(&mut water_plane);

        let cube_material = Material::standard(Vec3::ONE, 0.0, 0.0);
        let platform_material = Material::standard(Vec3::ONE, 0.8, 0.4).with_texture(4.0);

        let gpu = SceneGpu {
            sky: renderer.create_sky(&self.params.sky),
            water: renderer.create_water(&self.params.water),
            water_plane,
            water_model: renderer.create_model_bind_group(Mat4::IDENTITY),
            cube: SceneObject::new(renderer, Mesh::cube(), &cube_material, self.cube_transform()),
            knot: SceneObject::new(
                renderer,
                Mesh::torus_knot(3.0, 1.0, 256, 32, 2, 3),
                &Material::normal(),
                self.knot_transform(),
            ),
            platform: SceneObject::new(
                renderer,
                Mesh::plane(PLATFORM_SIZE),
                &platform_material,
                Mat4::from_translation(PLATFORM_CENTER),
            ),
            textures: Vec::new(),
        };
        self.gpu = Some(gpu);

        self.loader
            .request(GROUND_TEXTURE, "textures/hardwood2_diffuse.jpg");
        self.loader
            .request(WATER_NORMALS, "textures/waternormals.jpg");

        self.camera.set_aspect(ctx.width(), ctx.height());
        log::info!("Pixel water scene initialized");
    }

    fn update(&mut self, ctx: &mut EngineContext) {
        if ctx.input.is_key_pressed(KeyCode::Escape) {
            ctx.quit();
            return;
        }

        let dt = ctx.time.delta_seconds();
        self.elapsed += dt;
        self.knot_rotation += Vec2::new(dt, 0.5 * dt);

        self.apply_events(ctx);
        self.install_assets(ctx);

        self.fire.update(dt);
        self.lighting.sun_direction = self.params.sky.sun_direction();
        self.update_camera(ctx, dt);
    }

    fn render(&mut self, ctx: &mut EngineContext, frame: &mut RenderFrame) {
        let Some(renderer) = ctx.renderer_mut() else {
            return;
        };
        let outcome = renderer.prepare_post(&self.params.pixelation, &self.params.palette);
        let renderer: &Renderer = renderer;
        let cube_transform = self.cube_transform();
        let knot_transform = self.knot_transform();

        let Some(gpu) = &mut self.gpu else {
            renderer.finish_scene(frame, FrameOutcome::Skipped);
            return;
        };

        renderer.update_globals(&self.camera, &self.lighting, self.elapsed);
        gpu.sky.update(renderer.queue(), &self.params.sky);
        gpu.water.update(renderer.queue(), &self.params.water);
        gpu.cube.set_transform(renderer, cube_transform);
        gpu.knot.set_transform(renderer, knot_transform);
        self.fire.upload(renderer.device(), renderer.queue());

        if outcome == FrameOutcome::Ready {
            let mut pass = renderer.begin_scene_pass(frame);
            renderer.draw_sky(&mut pass, &gpu.sky);
            gpu.platform.draw(renderer, &mut pass);
            gpu.cube.draw(renderer, &mut pass);
            gpu.knot.draw(renderer, &mut pass);
            renderer.draw_water(&mut pass, &gpu.water_plane, &gpu.water_model.1, &gpu.water);
            renderer.draw_particles(&mut pass, &self.fire);
        }

        renderer.finish_scene(frame, outcome);
    }

    fn ui(&mut self, egui_ctx: &egui::Context, ctx: &mut EngineContext) {
        draw_panel(egui_ctx, &self.params, &ctx.debug, &mut ctx.events);
    }

    fn on_resize(&mut self, _ctx: &mut EngineContext, width: u32, height: u32) {
        self.camera.set_aspect(width, height);
    }
}

/// Preset from the first argument, else `PIXEL_WATER_CONFIG`
fn preset_path() -> Option<PathBuf> {
    std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("PIXEL_WATER_CONFIG").map(PathBuf::from))
}

fn main() {
    let params = match preset_path() {
        Some(path) => match SceneParams::load_ron(&path) {
            Ok(params) => params,
            Err(e) => {
                eprintln!("{e}");
                std::process::exit(1);
            }
        },
        None => SceneParams::default(),
    };

    let asset_root = std::env::var_os("PIXEL_WATER_ASSETS")
        .map_or_else(|| PathBuf::from("assets"), PathBuf::from);

    let config = EngineConfig::default()
        .with_title("pixel water")
        .with_size(1280, 720)
        .with_vsync(true);

    let engine = Engine::new(config, PixelWater::new(params, asset_root));

    if let Err(e) = engine.run() {
        eprintln!("Engine error: {}", e);
    }
}
