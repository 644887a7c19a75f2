//! Background image loading
//!
//! Each request decodes on its own thread. Results are collected with
//! [`AssetLoader::poll`] at the start of a frame, so whatever depends on an
//! image sees it fully decoded or not at all.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};

use rustc_hash::FxHashMap;

/// Errors that can occur while loading an asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetError {
    /// File could not be read
    Io { path: PathBuf, message: String },
    /// File was read but is not a supported image
    Decode { path: PathBuf, message: String },
    /// The decoding thread could not be started
    Spawn(String),
}

impl std::fmt::Display for AssetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, message } => write!(f, "Failed to read {}: {message}", path.display()),
            Self::Decode { path, message } => {
                write!(f, "Failed to decode {}: {message}", path.display())
            }
            Self::Spawn(e) => write!(f, "Failed to start loader thread: {e}"),
        }
    }
}

impl std::error::Error for AssetError {}

/// Decode an image file into 8-bit RGBA
///
/// # Errors
///
/// Returns an error if the file is missing or not a decodable image
pub fn decode_image(path: &Path) -> Result<image::RgbaImage, AssetError> {
    match image::open(path) {
        Ok(image) => Ok(image.to_rgba8()),
        Err(image::ImageError::IoError(e)) => Err(AssetError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        }),
        Err(e) => Err(AssetError::Decode {
            path: path.to_path_buf(),
            message: e.to_string(),
        }),
    }
}

/// A finished request
#[derive(Debug)]
pub struct LoadResult {
    /// Key the request was made with
    pub key: String,
    pub result: Result<image::RgbaImage, AssetError>,
}

/// Asynchronous image loader rooted at an asset directory
#[derive(Debug)]
pub struct AssetLoader {
    root: PathBuf,
    sender: Sender<LoadResult>,
    receiver: Receiver<LoadResult>,
    /// In-flight requests by key
    pending: FxHashMap<String, PathBuf>,
}

impl AssetLoader {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            root: root.into(),
            sender,
            receiver,
            pending: FxHashMap::default(),
        }
    }

    /// Full path of an asset relative to the root
    #[must_use]
    pub fn resolve(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.root.join(relative)
    }

    /// Start decoding `relative` in the background.
    ///
    /// Returns `false` if a request with the same key is still in flight.
    pub fn request(&mut self, key: impl Into<String>, relative: impl AsRef<Path>) -> bool {
        let key = key.into();
        if self.pending.contains_key(&key) {
            log::debug!("Asset '{key}' already loading");
            return false;
        }

        let path = self.resolve(relative);
        log::debug!("Loading asset '{key}' from {}", path.display());

        let sender = self.sender.clone();
        let thread_key = key.clone();
        let thread_path = path.clone();
        let spawned = std::thread::Builder::new()
            .name(format!("asset-{key}"))
            .spawn(move || {
                let result = decode_image(&thread_path);
                // The receiver is gone only when the loader was dropped
                let _ = sender.send(LoadResult {
                    key: thread_key,
                    result,
                });
            });

        if let Err(e) = spawned {
            let _ = self.sender.send(LoadResult {
                key: key.clone(),
                result: Err(AssetError::Spawn(e.to_string())),
            });
        }

        self.pending.insert(key, path);
        true
    }

    /// Collect every request that finished since the last poll
    pub fn poll(&mut self) -> Vec<LoadResult> {
        let mut finished = Vec::new();
        while let Ok(loaded) = self.receiver.try_recv() {
            self.pending.remove(&loaded.key);
            match &loaded.result {
                Ok(image) => log::info!(
                    "Loaded asset '{}' ({}x{})",
                    loaded.key,
                    image.width(),
                    image.height()
                ),
                Err(e) => log::warn!("Asset '{}' failed: {e}", loaded.key),
            }
            finished.push(loaded);
        }
        finished
    }

    #[must_use]
    pub fn is_pending(&self, key: &str) -> bool {
        self.pending.contains_key(key)
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;

    fn wait_for(loader: &mut AssetLoader) -> Vec<LoadResult> {
        let deadline = Instant::now() + Duration::from_secs(10);
        loop {
            let results = loader.poll();
            if !results.is_empty() || Instant::now() > deadline {
                return results;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("pixel-water-{name}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_missing_file_reports_io_error() {
        let mut loader = AssetLoader::new(temp_dir("missing"));
        assert!(loader.request("ground", "nope.png"));

        let results = wait_for(&mut loader);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].key, "ground");
        assert!(matches!(results[0].result, Err(AssetError::Io { .. })));
        assert!(!loader.is_pending("ground"));
    }

    #[test]
    fn test_duplicate_request_is_ignored() {
        let mut loader = AssetLoader::new(temp_dir("duplicate"));
        assert!(loader.request("water", "a.png"));
        assert!(!loader.request("water", "a.png"));
        assert_eq!(loader.pending_count(), 1);
    }

    #[test]
    fn test_decodes_png() {
        let dir = temp_dir("decode");
        let image = image::RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 255]));
        image.save(dir.join("tile.png")).unwrap();

        let mut loader = AssetLoader::new(&dir);
        loader.request("tile", "tile.png");
        let results = wait_for(&mut loader);

        let decoded = results[0].result.as_ref().unwrap();
        assert_eq!(decoded.dimensions(), (3, 2));
        assert_eq!(decoded.get_pixel(2, 1).0, [10, 20, 30, 255]);
    }

    #[test]
    fn test_garbage_reports_decode_error() {
        let dir = temp_dir("garbage");
        std::fs::write(dir.join("bad.png"), b"definitely not a png").unwrap();
        let err = decode_image(&dir.join("bad.png")).unwrap_err();
        assert!(matches!(err, AssetError::Decode { .. }));
    }
}
