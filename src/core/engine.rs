//! Core Engine struct and main loop

use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::core::Time;
use crate::core::debug::DebugInfo;
use crate::core::events::EventQueue;
use crate::input::Input;
use crate::renderer::{RenderFrame, Renderer};
use crate::ui::Gui;

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Window title
    pub title: String,
    /// Initial window width
    pub width: u32,
    /// Initial window height
    pub height: u32,
    /// Enable VSync
    pub vsync: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            title: String::from("pixel water"),
            width: 1280,
            height: 720,
            vsync: true,
        }
    }
}

impl EngineConfig {
    /// Create a new config with a title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set window dimensions
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Enable or disable VSync
    pub fn with_vsync(mut self, vsync: bool) -> Self {
        self.vsync = vsync;
        self
    }
}

/// Game trait that users implement
pub trait Game: 'static {
    /// Called once when the renderer is ready
    fn init(&mut self, engine: &mut EngineContext);

    /// Called every frame after queued events become visible
    fn update(&mut self, engine: &mut EngineContext);

    /// Record the scene and post passes into the frame
    fn render(&mut self, engine: &mut EngineContext, frame: &mut RenderFrame);

    /// Build the developer GUI; changes go through `engine.events`
    fn ui(&mut self, _ctx: &egui::Context, _engine: &mut EngineContext) {}

    /// Called when the window is resized
    fn on_resize(&mut self, _engine: &mut EngineContext, _width: u32, _height: u32) {}

    /// Called when the game is shutting down
    fn shutdown(&mut self, _engine: &mut EngineContext) {}
}

/// Context passed to game callbacks
pub struct EngineContext {
    /// Time tracking
    pub time: Time,
    /// Input state
    pub input: Input,
    /// Configuration changes, applied one frame after they are pushed
    pub events: EventQueue,
    /// Debug information and stats
    pub debug: DebugInfo,
    /// Renderer (available after initialization)
    renderer: Option<Renderer>,
    /// Window size
    window_size: PhysicalSize<u32>,
    /// Should the engine quit
    should_quit: bool,
}

impl EngineContext {
    fn new(width: u32, height: u32) -> Self {
        Self {
            time: Time::new(),
            input: Input::new(),
            events: EventQueue::new(),
            debug: DebugInfo::new(),
            renderer: None,
            window_size: PhysicalSize::new(width, height),
            should_quit: false,
        }
    }

    /// Get the renderer, once the window exists
    pub fn renderer(&self) -> Option<&Renderer> {
        self.renderer.as_ref()
    }

    /// Get the renderer mutably
    pub fn renderer_mut(&mut self) -> Option<&mut Renderer> {
        self.renderer.as_mut()
    }

    /// Get window width
    pub fn width(&self) -> u32 {
        self.window_size.width
    }

    /// Get window height
    pub fn height(&self) -> u32 {
        self.window_size.height
    }

    /// Get aspect ratio
    pub fn aspect_ratio(&self) -> f32 {
        self.window_size.width as f32 / self.window_size.height.max(1) as f32
    }

    /// Request engine shutdown
    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Check if engine should quit
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }
}

/// Main engine struct
pub struct Engine<G: Game> {
    config: EngineConfig,
    game: G,
    context: EngineContext,
    window: Option<Arc<Window>>,
    gui: Option<Gui>,
    initialized: bool,
}

impl<G: Game> Engine<G> {
    /// Create a new engine with the given game
    pub fn new(config: EngineConfig, game: G) -> Self {
        let context = EngineContext::new(config.width, config.height);
        Self {
            config,
            game,
            context,
            window: None,
            gui: None,
            initialized: false,
        }
    }

    /// Run the engine
    pub fn run(mut self) -> Result<(), Box<dyn std::error::Error>> {
        // A host application may already have installed a logger
        let _ = env_logger::try_init();
        log::info!("Starting engine: {}", self.config.title);

        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);
        event_loop.run_app(&mut self)?;

        Ok(())
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(window) = self.window.clone() else {
            return;
        };

        self.context.time.update();
        self.context.debug.record_frame(self.context.time.delta());

        // Changes queued by last frame's GUI become visible now
        self.context.events.swap();

        self.game.update(&mut self.context);

        if self.context.should_quit() {
            self.game.shutdown(&mut self.context);
            event_loop.exit();
            return;
        }

        let Some(mut frame) = self.context.renderer.as_ref().and_then(Renderer::begin_frame)
        else {
            self.context.input.update();
            window.request_redraw();
            return;
        };

        self.game.render(&mut self.context, &mut frame);

        if let Some(gui) = &mut self.gui {
            let game = &mut self.game;
            let context = &mut self.context;
            let show = context.debug.enabled;
            let output = gui.run(&window, |ctx| {
                if show {
                    game.ui(ctx, context);
                }
            });
            if let Some(renderer) = &self.context.renderer {
                gui.paint(renderer, &mut frame, output);
            }
        }

        if let Some(renderer) = &self.context.renderer {
            renderer.end_frame(frame);
        }

        // Clear per-frame input state
        self.context.input.update();
        window.request_redraw();
    }

    fn handle_input(&mut self, event: &WindowEvent) {
        let input = &mut self.context.input;
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key_code) = event.physical_key {
                    input.process_keyboard(key_code, event.state);
                    if key_code == KeyCode::F1
                        && event.state == ElementState::Pressed
                        && !event.repeat
                    {
                        self.context.debug.toggle();
                    }
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                input.process_mouse_button(*button, *state);
            }
            WindowEvent::CursorMoved { position, .. } => {
                input.process_mouse_motion(glam::Vec2::new(position.x as f32, position.y as f32));
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    winit::event::MouseScrollDelta::LineDelta(_, y) => *y,
                    winit::event::MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 40.0,
                };
                input.process_scroll(lines);
            }
            WindowEvent::Focused(false) => input.release_all(),
            _ => {}
        }
    }
}

impl<G: Game> ApplicationHandler for Engine<G> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attrs = Window::default_attributes()
            .with_title(&self.config.title)
            .with_inner_size(PhysicalSize::new(self.config.width, self.config.height));

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        let pending = Renderer::new(Arc::clone(&window), self.config.vsync);
        let renderer = match pollster::block_on(pending) {
            Ok(renderer) => renderer,
            Err(e) => {
                log::error!("{e}");
                event_loop.exit();
                return;
            }
        };

        self.gui = Some(Gui::new(&window, renderer.device(), renderer.surface_format()));
        self.context.window_size = window.inner_size();
        self.context.renderer = Some(renderer);
        self.window = Some(window);

        if !self.initialized {
            self.game.init(&mut self.context);
            self.initialized = true;
            log::info!("Engine initialized successfully");
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let consumed = match (&mut self.gui, &self.window) {
            (Some(gui), Some(window)) => gui.on_window_event(window, &event),
            _ => false,
        };

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, shutting down");
                self.game.shutdown(&mut self.context);
                event_loop.exit();
            }

            WindowEvent::Resized(new_size) => {
                // Minimised windows report 0x0; keep the previous size
                if new_size.width > 0 && new_size.height > 0 {
                    self.context.window_size = new_size;
                    if let Some(renderer) = &mut self.context.renderer {
                        renderer.resize(new_size.width, new_size.height);
                    }
                    self.game
                        .on_resize(&mut self.context, new_size.width, new_size.height);
                }
            }

            WindowEvent::RedrawRequested => self.redraw(event_loop),

            ref other => {
                // Releases always pass so nothing stays held after a GUI drag
                let release = matches!(
                    other,
                    WindowEvent::MouseInput {
                        state: ElementState::Released,
                        ..
                    } | WindowEvent::KeyboardInput {
                        event: KeyEvent {
                            state: ElementState::Released,
                            ..
                        },
                        ..
                    }
                );
                if !consumed || release {
                    self.handle_input(other);
                }
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}
