//! Core engine module
//!
//! Contains the main Engine struct, frame timing and scene configuration

mod debug;
mod easing;
mod engine;
mod events;
mod params;
mod time;

pub use debug::{DebugInfo, FrameStats};
pub use easing::{ease_in_out_cubic, linear_step, stop_go_eased};
pub use engine::{Engine, EngineConfig, EngineContext, Game};
pub use events::{ConfigEvent, EventQueue};
pub use params::{CameraParams, ConfigError, PaletteSettings, SceneParams};
pub use time::Time;
