mod app;
mod color;
mod state;
mod ui;

use anyhow::Result;
use app::AnnotatorApp;
use clap::Parser;
use eframe::egui;
use hsi_annotator::config::{Args, Config};

fn main() -> Result<()> {
    env_logger::init();

    let config = Config::from(Args::parse());
    config.prepare()?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "HSI Annotator – Hyperspectral Labeling",
        options,
        Box::new(move |_cc| Ok(Box::new(AnnotatorApp::new(&config)))),
    )
    .map_err(|e| anyhow::anyhow!("UI failed: {e}"))
}
