//! Live-tunable scene parameters
//!
//! Everything the developer panel can change lives in [`SceneParams`]. The
//! panel never writes these fields; it queues [`ConfigEvent`]s that are
//! applied here at the start of the next frame.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::events::ConfigEvent;
use crate::renderer::{Palette, PixelationSettings, Projection, SkyParams, WaterParams};

/// Errors raised by configuration changes and presets
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A palette must keep at least one colour
    EmptyPalette,
    /// More colours than the shader can hold
    PaletteTooLarge(usize),
    /// Palette index out of range
    PaletteIndex { index: usize, len: usize },
    /// A numeric value that cannot be used (NaN, infinite, non-positive)
    InvalidValue { name: &'static str, value: f32 },
    /// Preset file could not be read
    Io(String),
    /// Preset file could not be parsed
    Parse(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyPalette => write!(f, "Palette must not be empty"),
            Self::PaletteTooLarge(len) => write!(
                f,
                "Palette has {len} colours, at most {} are supported",
                crate::renderer::MAX_PALETTE_SIZE
            ),
            Self::PaletteIndex { index, len } => {
                write!(f, "Palette index {index} out of range (len {len})")
            }
            Self::InvalidValue { name, value } => write!(f, "Invalid value for {name}: {value}"),
            Self::Io(e) => write!(f, "Failed to read preset: {e}"),
            Self::Parse(e) => write!(f, "Failed to parse preset: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Palette quantization settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaletteSettings {
    pub enabled: bool,
    /// Output multiplier in `0..=1`
    pub opacity: f32,
    pub palette: Palette,
}

impl Default for PaletteSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            opacity: 1.0,
            palette: Palette::default(),
        }
    }
}

/// Camera behaviour
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraParams {
    pub projection: Projection,
    /// Snap the projection to the pixel grid every frame
    pub pixel_aligned_panning: bool,
    /// Glide the orbit target back and forth without input
    pub auto_pan: bool,
    /// Zoom of the orthographic projection
    pub ortho_zoom: f32,
}

impl CameraParams {
    pub const MIN_ORTHO_ZOOM: f32 = 0.005;
    pub const MAX_ORTHO_ZOOM: f32 = 1.0;
}

impl Default for CameraParams {
    fn default() -> Self {
        Self {
            projection: Projection::Perspective,
            pixel_aligned_panning: true,
            auto_pan: false,
            ortho_zoom: 0.03,
        }
    }
}

/// Every knob of the scene
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneParams {
    pub pixelation: PixelationSettings,
    pub palette: PaletteSettings,
    pub sky: SkyParams,
    pub water: WaterParams,
    pub camera: CameraParams,
}

fn finite(name: &'static str, value: f32) -> Result<f32, ConfigError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigError::InvalidValue { name, value })
    }
}

impl SceneParams {
    /// Apply one configuration change.
    ///
    /// # Errors
    ///
    /// Returns an error, leaving the parameters untouched, if the event
    /// carries an unusable value or would break a palette invariant.
    pub fn apply(&mut self, event: &ConfigEvent) -> Result<(), ConfigError> {
        match *event {
            ConfigEvent::SetPixelSize(size) => {
                self.pixelation.pixel_size = size;
                self.pixelation = self.pixelation.sanitized();
            }
            ConfigEvent::SetNormalEdgeStrength(value) => {
                self.pixelation.normal_edge_strength = finite("normal_edge_strength", value)?;
                self.pixelation = self.pixelation.sanitized();
            }
            ConfigEvent::SetDepthEdgeStrength(value) => {
                self.pixelation.depth_edge_strength = finite("depth_edge_strength", value)?;
                self.pixelation = self.pixelation.sanitized();
            }
            ConfigEvent::SetPixelAlignedPanning(enabled) => {
                self.camera.pixel_aligned_panning = enabled;
            }
            ConfigEvent::SetPaletteEnabled(enabled) => self.palette.enabled = enabled,
            ConfigEvent::SetPaletteOpacity(value) => {
                self.palette.opacity = finite("palette_opacity", value)?.clamp(0.0, 1.0);
            }
            ConfigEvent::SetPaletteColor { index, color } => {
                self.palette.palette.set(index, color)?;
            }
            ConfigEvent::PushPaletteColor(color) => self.palette.palette.push(color)?,
            ConfigEvent::RemovePaletteColor(index) => {
                self.palette.palette.remove(index)?;
            }
            ConfigEvent::ResetPalette => self.palette.palette = Palette::default(),
            ConfigEvent::SetSky(sky) => self.sky = sky.sanitized(),
            ConfigEvent::SetWater(water) => self.water = water.sanitized(&self.water),
            ConfigEvent::SetProjection(projection) => self.camera.projection = projection,
            ConfigEvent::SetAutoPan(enabled) => self.camera.auto_pan = enabled,
            ConfigEvent::SetOrthoZoom(zoom) => {
                let zoom = finite("ortho_zoom", zoom)?;
                if zoom <= 0.0 {
                    return Err(ConfigError::InvalidValue {
                        name: "ortho_zoom",
                        value: zoom,
                    });
                }
                self.camera.ortho_zoom =
                    zoom.clamp(CameraParams::MIN_ORTHO_ZOOM, CameraParams::MAX_ORTHO_ZOOM);
            }
        }
        Ok(())
    }

    /// Parse a RON preset. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for malformed text or an invalid palette.
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        let params: Self = ron::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Ok(params.sanitized())
    }

    /// Load a RON preset from disk
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Io` if the file cannot be read, otherwise as
    /// [`SceneParams::from_ron_str`].
    pub fn load_ron(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;
        let params = Self::from_ron_str(&text)?;
        log::info!("Loaded preset {}", path.display());
        Ok(params)
    }

    fn sanitized(self) -> Self {
        let defaults = Self::default();
        let opacity = if self.palette.opacity.is_finite() {
            self.palette.opacity.clamp(0.0, 1.0)
        } else {
            defaults.palette.opacity
        };
        let ortho_zoom = if self.camera.ortho_zoom.is_finite() && self.camera.ortho_zoom > 0.0 {
            self.camera
                .ortho_zoom
                .clamp(CameraParams::MIN_ORTHO_ZOOM, CameraParams::MAX_ORTHO_ZOOM)
        } else {
            defaults.camera.ortho_zoom
        };

        Self {
            pixelation: self.pixelation.sanitized(),
            palette: PaletteSettings {
                opacity,
                ..self.palette
            },
            sky: self.sky.sanitized(),
            water: self.water.sanitized(&defaults.water),
            camera: CameraParams {
                ortho_zoom,
                ..self.camera
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;

    #[test]
    fn test_pixel_size_is_clamped() {
        let mut params = SceneParams::default();
        params.apply(&ConfigEvent::SetPixelSize(0)).unwrap();
        assert_eq!(params.pixelation.pixel_size, 1);
        params.apply(&ConfigEvent::SetPixelSize(99)).unwrap();
        assert_eq!(params.pixelation.pixel_size, 16);
    }

    #[test]
    fn test_negative_edge_strength_clamps_to_zero() {
        let mut params = SceneParams::default();
        params.apply(&ConfigEvent::SetDepthEdgeStrength(-1.0)).unwrap();
        assert_eq!(params.pixelation.depth_edge_strength, 0.0);
    }

    #[test]
    fn test_rejected_event_leaves_params() {
        let mut params = SceneParams::default();
        let before = params.clone();

        let err = params
            .apply(&ConfigEvent::SetNormalEdgeStrength(f32::NAN))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                name: "normal_edge_strength",
                ..
            }
        ));
        assert_eq!(params, before);
    }

    #[test]
    fn test_palette_events() {
        let mut params = SceneParams::default();
        let len = params.palette.palette.len();

        params.apply(&ConfigEvent::PushPaletteColor(Vec3::ZERO)).unwrap();
        assert_eq!(params.palette.palette.len(), len + 1);

        params
            .apply(&ConfigEvent::SetPaletteColor {
                index: 0,
                color: Vec3::ONE,
            })
            .unwrap();
        assert_eq!(params.palette.palette.get(0), Some(Vec3::ONE));

        let err = params
            .apply(&ConfigEvent::RemovePaletteColor(100))
            .unwrap_err();
        assert!(matches!(err, ConfigError::PaletteIndex { index: 100, .. }));

        params.apply(&ConfigEvent::ResetPalette).unwrap();
        assert_eq!(params.palette.palette, Palette::default());
    }

    #[test]
    fn test_last_palette_colour_cannot_be_removed() {
        let mut params = SceneParams::default();
        params.palette.palette = Palette::new([Vec3::ONE]).unwrap();
        let err = params.apply(&ConfigEvent::RemovePaletteColor(0)).unwrap_err();
        assert_eq!(err, ConfigError::EmptyPalette);
        assert_eq!(params.palette.palette.len(), 1);
    }

    #[test]
    fn test_opacity_and_zoom() {
        let mut params = SceneParams::default();
        params.apply(&ConfigEvent::SetPaletteOpacity(3.0)).unwrap();
        assert_eq!(params.palette.opacity, 1.0);

        assert!(params.apply(&ConfigEvent::SetOrthoZoom(0.0)).is_err());
        params.apply(&ConfigEvent::SetOrthoZoom(0.1)).unwrap();
        assert!((params.camera.ortho_zoom - 0.1).abs() < f32::EPSILON);
    }

    #[test]
    fn test_ron_preset_with_defaults() {
        let params = SceneParams::from_ron_str(
            "(
                pixelation: (pixel_size: 4),
                palette: (opacity: 0.5, palette: [(1.0, 0.0, 0.0), (0.0, 0.0, 1.0)]),
                camera: (projection: Orthographic),
            )",
        )
        .unwrap();

        assert_eq!(params.pixelation.pixel_size, 4);
        assert!((params.pixelation.normal_edge_strength - 0.3).abs() < f32::EPSILON);
        assert_eq!(params.palette.palette.len(), 2);
        assert!((params.palette.opacity - 0.5).abs() < f32::EPSILON);
        assert!(params.palette.enabled);
        assert_eq!(params.camera.projection, Projection::Orthographic);
        assert_eq!(params.sky, SkyParams::default());
    }

    #[test]
    fn test_ron_preset_rejects_empty_palette() {
        let err = SceneParams::from_ron_str("(palette: (palette: []))").unwrap_err();
        match err {
            ConfigError::Parse(message) => assert!(message.contains("empty")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_ron_preset_is_sanitized() {
        let params = SceneParams::from_ron_str("(pixelation: (pixel_size: 0))").unwrap();
        assert_eq!(params.pixelation.pixel_size, 1);
    }

    #[test]
    fn test_missing_preset_file() {
        let err = SceneParams::load_ron("/nonexistent/preset.ron").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_ron_palette_channels_are_clamped() {
        let params = SceneParams::from_ron_str("(palette: (palette: [(5.0, -3.0, 0.5)]))").unwrap();
        assert_eq!(params.palette.palette.colors(), &[Vec3::new(1.0, 0.0, 0.5)]);
    }

    #[test]
    fn test_non_finite_palette_event_is_rejected() {
        let mut params = SceneParams::default();
        let before = params.clone();
        let event = ConfigEvent::PushPaletteColor(Vec3::new(0.0, f32::NAN, 0.0));
        assert!(matches!(params.apply(&event), Err(ConfigError::InvalidValue { .. })));
        assert_eq!(params.palette.palette, before.palette.palette);
    }
}
