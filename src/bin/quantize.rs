//! Offline palette quantization
//!
//! Usage: `quantize <input> <output> [preset.ron]`
//!
//! Maps every pixel of `input` to its nearest palette colour and writes the
//! result to `output`. The palette and opacity come from the preset when one
//! is given, otherwise the built-in palette is used at full opacity.

use std::path::PathBuf;
use std::process::ExitCode;

use pixel_water::assets::decode_image;
use pixel_water::core::{PaletteSettings, SceneParams};

fn run(input: PathBuf, output: PathBuf, preset: Option<PathBuf>) -> Result<(), String> {
    let settings = match preset {
        Some(path) => SceneParams::load_ron(&path).map_err(|e| e.to_string())?.palette,
        None => PaletteSettings::default(),
    };

    let image = decode_image(&input).map_err(|e| e.to_string())?;
    // A disabled palette pass leaves the frame untouched
    let quantized = if settings.enabled {
        settings.palette.quantize_image(&image, settings.opacity)
    } else {
        image
    };

    quantized
        .save(&output)
        .map_err(|e| format!("Failed to write {}: {e}", output.display()))?;

    log::info!(
        "Quantized {}x{} image to {} colours",
        quantized.width(),
        quantized.height(),
        settings.palette.len()
    );
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    let mut args = std::env::args_os().skip(1).map(PathBuf::from);
    let (Some(input), Some(output)) = (args.next(), args.next()) else {
        eprintln!("usage: quantize <input> <output> [preset.ron]");
        return ExitCode::FAILURE;
    };

    match run(input, output, args.next()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
