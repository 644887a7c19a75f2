//! Asset loading
//!
//! Images are decoded off the frame thread and handed back through a
//! channel; GPU upload happens on the frame thread once a result arrives.

mod loader;

pub use loader::{AssetError, AssetLoader, LoadResult, decode_image};
