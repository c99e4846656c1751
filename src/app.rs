use eframe::egui;

use hsi_annotator::Config;

use crate::state::AppState;
use crate::ui::{panels, plot, viewer};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct AnnotatorApp {
    pub state: AppState,
    /// GPU copy of `state.preview`.
    texture: Option<egui::TextureHandle>,
}

impl AnnotatorApp {
    pub fn new(config: &Config) -> Self {
        Self {
            state: AppState::new(config),
            texture: None,
        }
    }
}

impl eframe::App for AnnotatorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: cube list ----
        egui::SidePanel::left("cube_panel")
            .default_width(220.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Right side panel: labeling ----
        egui::SidePanel::right("label_panel")
            .default_width(260.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::label_panel(ui, &mut self.state);
            });

        // ---- Bottom panel: spectrum ----
        egui::TopBottomPanel::bottom("spectrum_panel")
            .default_height(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                plot::spectrum_plot(ui, &self.state);
            });

        // ---- Central panel: preview ----
        egui::CentralPanel::default().show(ctx, |ui| {
            viewer::preview_panel(ui, &mut self.state, &mut self.texture);
        });
    }
}
