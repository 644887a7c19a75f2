//! Input handling module
//!
//! Raw input state tracking and the orbit camera controller.

mod orbit;
mod state;

pub use orbit::OrbitController;
pub use state::Input;
