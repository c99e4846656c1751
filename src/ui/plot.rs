use eframe::egui::{Color32, Ui};
use egui_plot::{Line, Plot, PlotPoints};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Spectrum plot (bottom panel)
// ---------------------------------------------------------------------------

/// Plot the spectrum of the selected pixel.
pub fn spectrum_plot(ui: &mut Ui, state: &AppState) {
    let (Some(sp), Some((x, y))) = (&state.spectrum, state.selected_pixel) else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.label("Click the preview to inspect a pixel's spectrum");
        });
        return;
    };

    let points: PlotPoints = sp
        .wavelengths
        .iter()
        .zip(sp.spectrum.iter())
        .map(|(&w, &v)| [w, v])
        .collect();

    Plot::new("spectrum_plot")
        .legend(egui_plot::Legend::default())
        .x_axis_label("Wavelength / band")
        .y_axis_label("Value")
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            let line = Line::new(points)
                .name(format!("({x}, {y})"))
                .color(Color32::LIGHT_BLUE)
                .width(1.5);
            plot_ui.line(line);
        });
}
