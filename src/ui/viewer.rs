use eframe::egui::{self, Color32, ColorImage, Sense, Stroke, TextureHandle, TextureOptions, Ui};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Preview viewer (central panel)
// ---------------------------------------------------------------------------

/// Show the preview scaled to fit, pick pixels on click, and mark labeled
/// pixels in their class colour.
pub fn preview_panel(ui: &mut Ui, state: &mut AppState, texture: &mut Option<TextureHandle>) {
    if state.preview_dirty {
        *texture = state.preview.as_ref().map(|p| {
            let image = ColorImage::from_rgb([p.width, p.height], &p.pixels);
            ui.ctx().load_texture("preview", image, TextureOptions::NEAREST)
        });
        state.preview_dirty = false;
    }

    let Some(tex) = texture.as_ref() else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Select a cube from the list");
        });
        return;
    };

    let image_size = tex.size_vec2();
    let available = ui.available_size();
    let scale = (available.x / image_size.x)
        .min(available.y / image_size.y)
        .max(0.01);

    let response = ui.add(
        egui::Image::from_texture(egui::load::SizedTexture::new(tex.id(), image_size * scale))
            .sense(Sense::click()),
    );

    // Screen position → pixel; floor so the whole displayed cell maps to it.
    let to_pixel = |pos: egui::Pos2| {
        let rel = (pos - response.rect.min) / scale;
        let (x, y) = (rel.x.floor(), rel.y.floor());
        let inside = x >= 0.0 && y >= 0.0 && x < image_size.x && y < image_size.y;
        inside.then_some((x as u32, y as u32))
    };
    let to_screen = |x: u32, y: u32| {
        response.rect.min + egui::vec2((x as f32 + 0.5) * scale, (y as f32 + 0.5) * scale)
    };

    if response.clicked() {
        if let Some((x, y)) = response.interact_pointer_pos().and_then(to_pixel) {
            state.pick_pixel(x, y);
        }
    }

    let painter = ui.painter_at(response.rect);
    let radius = (scale * 0.5).clamp(2.0, 5.0);
    for p in state.labels_for_current() {
        painter.circle_filled(to_screen(p.x, p.y), radius, state.color_map.color_for(&p.label));
    }
    if let Some((x, y)) = state.selected_pixel {
        painter.circle_stroke(to_screen(x, y), radius + 3.0, Stroke::new(2.0, Color32::YELLOW));
    }

    if let Some((x, y)) = response.hover_pos().and_then(to_pixel) {
        ui.label(format!("x = {x}, y = {y}"));
    }
}
