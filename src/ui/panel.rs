//! Developer panel
//!
//! Widgets edit copies of the current parameters. Any change is queued as a
//! [`ConfigEvent`] and takes effect next frame.

use glam::{Vec2, Vec3};

use crate::core::{CameraParams, ConfigEvent, DebugInfo, EventQueue, SceneParams};
use crate::renderer::{MAX_PALETTE_SIZE, PixelationSettings, Projection};

/// Display colour to 8-bit sRGB
#[must_use]
pub fn to_srgb8(color: Vec3) -> [u8; 3] {
    (color.clamp(Vec3::ZERO, Vec3::ONE) * 255.0)
        .round()
        .to_array()
        .map(|c| c as u8)
}

/// 8-bit sRGB to display colour
#[must_use]
pub fn from_srgb8(rgb: [u8; 3]) -> Vec3 {
    Vec3::new(rgb[0] as f32, rgb[1] as f32, rgb[2] as f32) / 255.0
}

/// Draw the settings window
pub fn draw_panel(
    ctx: &egui::Context,
    params: &SceneParams,
    debug: &DebugInfo,
    events: &mut EventQueue,
) {
    egui::Window::new("pixel water")
        .default_width(260.0)
        .resizable(false)
        .show(ctx, |ui| {
            for line in debug.lines() {
                ui.label(line);
            }
            ui.separator();

            egui::CollapsingHeader::new("Pixelation")
                .default_open(true)
                .show(ui, |ui| pixelation_section(ui, params, events));
            egui::CollapsingHeader::new("Palette")
                .default_open(true)
                .show(ui, |ui| palette_section(ui, params, events));
            egui::CollapsingHeader::new("Sky").show(ui, |ui| sky_section(ui, params, events));
            egui::CollapsingHeader::new("Water").show(ui, |ui| water_section(ui, params, events));
            egui::CollapsingHeader::new("Camera")
                .show(ui, |ui| camera_section(ui, &params.camera, events));
        });
}

fn pixelation_section(ui: &mut egui::Ui, params: &SceneParams, events: &mut EventQueue) {
    let settings = params.pixelation;

    let mut pixel_size = settings.pixel_size;
    if ui
        .add(
            egui::Slider::new(&mut pixel_size, 1..=PixelationSettings::MAX_PIXEL_SIZE)
                .text("Pixel size"),
        )
        .changed()
    {
        events.push(ConfigEvent::SetPixelSize(pixel_size));
    }

    let mut normal = settings.normal_edge_strength;
    if ui
        .add(egui::Slider::new(&mut normal, 0.0..=2.0).step_by(0.05).text("Normal edge"))
        .changed()
    {
        events.push(ConfigEvent::SetNormalEdgeStrength(normal));
    }

    let mut depth = settings.depth_edge_strength;
    if ui
        .add(egui::Slider::new(&mut depth, 0.0..=1.0).step_by(0.05).text("Depth edge"))
        .changed()
    {
        events.push(ConfigEvent::SetDepthEdgeStrength(depth));
    }

    let mut aligned = params.camera.pixel_aligned_panning;
    if ui.checkbox(&mut aligned, "Pixel-aligned panning").changed() {
        events.push(ConfigEvent::SetPixelAlignedPanning(aligned));
    }
}

fn palette_section(ui: &mut egui::Ui, params: &SceneParams, events: &mut EventQueue) {
    let settings = &params.palette;

    let mut enabled = settings.enabled;
    if ui.checkbox(&mut enabled, "Enabled").changed() {
        events.push(ConfigEvent::SetPaletteEnabled(enabled));
    }

    let mut opacity = settings.opacity;
    if ui
        .add(egui::Slider::new(&mut opacity, 0.0..=1.0).text("Opacity"))
        .changed()
    {
        events.push(ConfigEvent::SetPaletteOpacity(opacity));
    }

    let palette = &settings.palette;
    let removable = palette.len() > 1;
    for (index, color) in palette.colors().iter().enumerate() {
        ui.horizontal(|ui| {
            let mut rgb = to_srgb8(*color);
            if ui.color_edit_button_srgb(&mut rgb).changed() {
                events.push(ConfigEvent::SetPaletteColor {
                    index,
                    color: from_srgb8(rgb),
                });
            }
            ui.monospace(format!("#{:02X}{:02X}{:02X}", rgb[0], rgb[1], rgb[2]));
            if ui
                .add_enabled(removable, egui::Button::new("x"))
                .clicked()
            {
                events.push(ConfigEvent::RemovePaletteColor(index));
            }
        });
    }

    ui.horizontal(|ui| {
        let last = palette.colors().last().copied().unwrap_or(Vec3::ONE);
        if ui
            .add_enabled(palette.len() < MAX_PALETTE_SIZE, egui::Button::new("Add"))
            .clicked()
        {
            events.push(ConfigEvent::PushPaletteColor(last));
        }
        if ui.button("Reset").clicked() {
            events.push(ConfigEvent::ResetPalette);
        }
    });
}

fn sky_section(ui: &mut egui::Ui, params: &SceneParams, events: &mut EventQueue) {
    let mut sky = params.sky;
    let mut changed = false;
    changed |= ui
        .add(egui::Slider::new(&mut sky.turbidity, 0.0..=20.0).text("Turbidity"))
        .changed();
    changed |= ui
        .add(egui::Slider::new(&mut sky.rayleigh, 0.0..=4.0).text("Rayleigh"))
        .changed();
    changed |= ui
        .add(egui::Slider::new(&mut sky.mie_coefficient, 0.0..=0.1).text("Mie coefficient"))
        .changed();
    changed |= ui
        .add(egui::Slider::new(&mut sky.mie_directional_g, 0.0..=1.0).text("Mie directional G"))
        .changed();
    changed |= ui
        .add(egui::Slider::new(&mut sky.elevation, 0.0..=0.5).text("Inclination"))
        .changed();
    changed |= ui
        .add(egui::Slider::new(&mut sky.azimuth, 0.0..=1.0).text("Azimuth"))
        .changed();
    if changed {
        events.push(ConfigEvent::SetSky(sky));
    }
}

fn water_section(ui: &mut egui::Ui, params: &SceneParams, events: &mut EventQueue) {
    let mut water = params.water;
    let mut changed = false;

    ui.horizontal(|ui| {
        let mut rgb = to_srgb8(water.color);
        if ui.color_edit_button_srgb(&mut rgb).changed() {
            water.color = from_srgb8(rgb);
            changed = true;
        }
        ui.label("Color");
    });
    changed |= ui
        .add(egui::Slider::new(&mut water.distortion_scale, 0.0..=8.0).text("Distortion"))
        .changed();
    changed |= ui
        .add(egui::Slider::new(&mut water.size, 0.1..=10.0).text("Size"))
        .changed();
    changed |= ui
        .add(egui::Slider::new(&mut water.alpha, 0.0..=1.0).text("Opacity"))
        .changed();

    let mut flow = water.flow;
    let flow_changed = ui
        .add(egui::Slider::new(&mut flow.x, -1.0..=1.0).step_by(0.01).text("Flow X"))
        .changed()
        | ui
            .add(egui::Slider::new(&mut flow.y, -1.0..=1.0).step_by(0.01).text("Flow Y"))
            .changed();
    if flow_changed && flow != Vec2::ZERO {
        water.flow = flow;
        changed = true;
    }

    if changed {
        events.push(ConfigEvent::SetWater(water));
    }
}

fn camera_section(ui: &mut egui::Ui, camera: &CameraParams, events: &mut EventQueue) {
    let mut projection = camera.projection;
    ui.horizontal(|ui| {
        ui.radio_value(&mut projection, Projection::Perspective, "Perspective");
        ui.radio_value(&mut projection, Projection::Orthographic, "Orthographic");
    });
    if projection != camera.projection {
        events.push(ConfigEvent::SetProjection(projection));
    }

    if projection == Projection::Orthographic {
        let mut zoom = camera.ortho_zoom;
        if ui
            .add(
                egui::Slider::new(
                    &mut zoom,
                    CameraParams::MIN_ORTHO_ZOOM..=CameraParams::MAX_ORTHO_ZOOM,
                )
                    .logarithmic(true)
                    .text("Zoom"),
            )
            .changed()
        {
            events.push(ConfigEvent::SetOrthoZoom(zoom));
        }
    }

    let mut auto_pan = camera.auto_pan;
    if ui.checkbox(&mut auto_pan, "Auto pan").changed() {
        events.push(ConfigEvent::SetAutoPan(auto_pan));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_srgb8_conversion() {
        assert_eq!(to_srgb8(Vec3::new(1.0, 0.5, 0.0)), [255, 128, 0]);
        assert_eq!(to_srgb8(Vec3::new(2.0, -1.0, 0.0)), [255, 0, 0]);
        assert_eq!(from_srgb8([255, 0, 51]), Vec3::new(1.0, 0.0, 0.2));
    }

    #[test]
    fn test_idle_panel_emits_nothing() {
        let ctx = egui::Context::default();
        let params = SceneParams::default();
        let debug = DebugInfo::new();
        let mut events = EventQueue::new();

        for _ in 0..2 {
            let _ = ctx.run(egui::RawInput::default(), |ctx| {
                draw_panel(ctx, &params, &debug, &mut events);
            });
        }
        assert_eq!(events.pending_count(), 0);
    }
}
