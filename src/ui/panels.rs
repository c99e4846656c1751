use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use crate::state::{AppState, Status};

// ---------------------------------------------------------------------------
// Left side panel – cube list and legend
// ---------------------------------------------------------------------------

/// Render the cube list and the class legend.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.horizontal(|ui: &mut Ui| {
        ui.heading("Cubes");
        if ui.small_button("⟳").on_hover_text("Rescan data directory").clicked() {
            state.refresh_files();
        }
    });
    ui.separator();

    if state.files.is_empty() {
        ui.label("No .hdr files found.");
    }

    let mut clicked = None;
    ScrollArea::vertical()
        .id_salt("cube_list")
        .max_height(ui.available_height() * 0.6)
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for id in &state.files {
                let selected = state.current.as_deref() == Some(id.as_str());
                if ui.selectable_label(selected, id).clicked() {
                    clicked = Some(id.clone());
                }
            }
        });
    if let Some(id) = clicked {
        state.select_cube(&id);
    }

    ui.separator();
    ui.strong("Classes");
    if state.color_map.is_empty() {
        ui.label("No labels yet.");
    }
    for (label, color) in state.color_map.legend_entries() {
        let count = state.labels.iter().filter(|p| p.label == label).count();
        ui.label(RichText::new(format!("● {label}  ({count})")).color(color));
    }
}

// ---------------------------------------------------------------------------
// Right side panel – labeling
// ---------------------------------------------------------------------------

/// Class entry, save button and the labels of the current cube.
pub fn label_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Label");
    ui.separator();

    match (state.selected_pixel, &state.spectrum) {
        (Some((x, y)), Some(sp)) => {
            ui.label(format!("Pixel x = {x}, y = {y}  ({} bands)", sp.len()));
            if ui.small_button("Copy spectrum as JSON").clicked() {
                match serde_json::to_string(sp) {
                    Ok(json) => ui.ctx().copy_text(json),
                    Err(e) => log::error!("Failed to serialize spectrum: {e}"),
                }
            }
        }
        _ => {
            ui.label("No pixel selected.");
        }
    }

    ui.horizontal(|ui: &mut Ui| {
        ui.label("Class:");
        let edit = ui.text_edit_singleline(&mut state.label_input);
        let submitted = edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
        if ui.button("Save").clicked() || submitted {
            state.save_label();
        }
    });

    // Quick-pick existing classes.
    let known: Vec<String> = state
        .color_map
        .legend_entries()
        .map(|(l, _)| l.to_string())
        .collect();
    if !known.is_empty() {
        ui.horizontal_wrapped(|ui: &mut Ui| {
            for label in known {
                let color = state.color_map.color_for(&label);
                if ui.button(RichText::new(&label).color(color)).clicked() {
                    state.label_input = label;
                }
            }
        });
    }

    ui.separator();
    ui.strong("Labeled in this cube");

    let rows: Vec<(u32, u32, String)> = state
        .labels_for_current()
        .map(|p| (p.x, p.y, p.label.clone()))
        .collect();
    TableBuilder::new(ui)
        .striped(true)
        .column(Column::auto())
        .column(Column::auto())
        .column(Column::remainder())
        .header(18.0, |mut header| {
            header.col(|ui| {
                ui.strong("x");
            });
            header.col(|ui| {
                ui.strong("y");
            });
            header.col(|ui| {
                ui.strong("class");
            });
        })
        .body(|mut body| {
            for (x, y, label) in &rows {
                body.row(18.0, |mut row| {
                    row.col(|ui| {
                        ui.label(x.to_string());
                    });
                    row.col(|ui| {
                        ui.label(y.to_string());
                    });
                    row.col(|ui| {
                        ui.label(RichText::new(label).color(state.color_map.color_for(label)));
                    });
                });
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Rescan cubes").clicked() {
                state.refresh_files();
                ui.close_menu();
            }
            if ui.button("Reload labels").clicked() {
                state.reload_labels();
                ui.close_menu();
            }
            if ui
                .add_enabled(state.preview.is_some(), egui::Button::new("Export preview…"))
                .clicked()
            {
                export_preview_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        ui.label(format!(
            "{} cubes, {} labels → {}",
            state.files.len(),
            state.labels.len(),
            state.dataset_path().display()
        ));

        ui.separator();

        match &state.status {
            Some(Status::Info(msg)) => {
                ui.label(RichText::new(msg).color(Color32::LIGHT_GREEN));
            }
            Some(Status::Error(msg)) => {
                ui.label(RichText::new(msg).color(Color32::RED));
            }
            None => {}
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn export_preview_dialog(state: &mut AppState) {
    let mut dialog = rfd::FileDialog::new()
        .set_title("Export preview")
        .add_filter("JPEG", &["jpg", "jpeg"])
        .add_filter("PNG", &["png"]);
    if let Some(name) = state.export_file_name() {
        dialog = dialog.set_file_name(name.to_string_lossy());
    }

    if let Some(path) = dialog.save_file() {
        state.export_preview(&path);
    }
}
