//! Developer GUI
//!
//! egui overlay integration and the settings panel.

mod gui;
mod panel;

pub use gui::{Gui, GuiOutput};
pub use panel::{draw_panel, from_srgb8, to_srgb8};
