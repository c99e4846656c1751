use std::path::{Path, PathBuf};

use hsi_annotator::data::model::{LabelRecord, LabeledPoint, PixelSpectrum};
use hsi_annotator::dataset;
use hsi_annotator::preview::PreviewImage;
use hsi_annotator::{Annotator, Config};

use crate::color::ColorMap;

// ---------------------------------------------------------------------------
// Status line
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Info(String),
    Error(String),
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub annotator: Annotator,

    /// Cube identifiers found under the data directory.
    pub files: Vec<String>,

    /// Identifier of the cube on screen.
    pub current: Option<String>,

    /// Preview of `current` (None until a cube is opened).
    pub preview: Option<PreviewImage>,

    /// Set when `preview` changed and the texture must be re-uploaded.
    pub preview_dirty: bool,

    /// Pixel whose spectrum is shown, as (x, y).
    pub selected_pixel: Option<(u32, u32)>,

    pub spectrum: Option<PixelSpectrum>,

    /// Text in the class name field.
    pub label_input: String,

    /// Every labeled pixel in the dataset file.
    pub labels: Vec<LabeledPoint>,

    pub color_map: ColorMap,

    pub status: Option<Status>,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        let mut state = Self {
            annotator: Annotator::new(config),
            files: Vec::new(),
            current: None,
            preview: None,
            preview_dirty: false,
            selected_pixel: None,
            spectrum: None,
            label_input: String::new(),
            labels: Vec::new(),
            color_map: ColorMap::default(),
            status: None,
        };
        state.refresh_files();
        state.reload_labels();
        state
    }

    pub fn dataset_path(&self) -> &Path {
        self.annotator.writer().path()
    }

    /// Re-scan the data directory.
    pub fn refresh_files(&mut self) {
        let listing = self.annotator.list_cubes();
        self.files = listing.files;
        self.status = listing.error.map(|e| {
            Status::Error(format!(
                "{e}: {}",
                self.annotator.store().root().display()
            ))
        });
    }

    /// Re-read the dataset so markers match what is on disk.
    pub fn reload_labels(&mut self) {
        match dataset::read_labels(self.dataset_path()) {
            Ok(labels) => {
                self.labels = labels;
                self.rebuild_color_map();
            }
            Err(e) => {
                log::error!("Failed to read labels: {e}");
                self.status = Some(Status::Error(format!("Error: {e}")));
            }
        }
    }

    pub fn rebuild_color_map(&mut self) {
        self.color_map = ColorMap::new(self.labels.iter().map(|p| p.label.as_str()));
    }

    /// Open a cube and render its preview.
    pub fn select_cube(&mut self, identifier: &str) {
        self.selected_pixel = None;
        self.spectrum = None;
        match self.annotator.preview_image(identifier) {
            Ok(image) => {
                self.current = Some(identifier.to_string());
                self.preview = Some(image);
                self.status = None;
            }
            Err(e) => {
                self.current = None;
                self.preview = None;
                self.status = Some(Status::Error(e.detail));
            }
        }
        self.preview_dirty = true;
    }

    /// Show the spectrum of pixel (x, y) of the current cube.
    pub fn pick_pixel(&mut self, x: u32, y: u32) {
        let Some(id) = self.current.clone() else {
            return;
        };
        match self.annotator.spectrum(&id, x, y) {
            Ok(sp) => {
                self.selected_pixel = Some((x, y));
                self.spectrum = Some(sp);
            }
            Err(e) => {
                self.status = Some(Status::Error(e.detail));
            }
        }
    }

    /// Append the selected pixel with the typed class name.
    pub fn save_label(&mut self) {
        let label = self.label_input.trim().to_string();
        let (Some(id), Some((x, y)), Some(sp)) =
            (self.current.as_deref(), self.selected_pixel, self.spectrum.as_ref())
        else {
            self.status = Some(Status::Error("Pick a pixel first".into()));
            return;
        };
        if label.is_empty() {
            self.status = Some(Status::Error("Enter a class name".into()));
            return;
        }

        let record = LabelRecord::from_spectrum(id, x, y, &label, sp);
        match self.annotator.save_label(&record) {
            Ok(resp) => {
                self.labels.push(LabeledPoint {
                    filename: record.filename,
                    x,
                    y,
                    label,
                });
                self.rebuild_color_map();
                self.status = Some(Status::Info(resp.message));
            }
            Err(e) => {
                self.status = Some(Status::Error(e.detail));
            }
        }
    }

    /// Labeled pixels that belong to the cube on screen.
    pub fn labels_for_current(&self) -> impl Iterator<Item = &LabeledPoint> {
        let current = self.current.as_deref();
        self.labels
            .iter()
            .filter(move |p| Some(p.filename.as_str()) == current)
    }

    pub fn export_preview(&mut self, path: &Path) {
        let Some(image) = &self.preview else {
            return;
        };
        self.status = Some(match image.save(path) {
            Ok(()) => {
                log::info!("Exported preview to {}", path.display());
                Status::Info(format!("Exported {}", path.display()))
            }
            Err(e) => Status::Error(format!("Export failed: {e}")),
        });
    }

    /// Suggested export file name for the current cube.
    pub fn export_file_name(&self) -> Option<PathBuf> {
        self.current
            .as_deref()
            .map(|id| PathBuf::from(format!("{}.jpg", id.replace('/', "_"))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hsi_annotator::data::header::{DataType, EnviHeader};
    use hsi_annotator::data::writer::write_cube;

    fn state(tmp: &Path) -> AppState {
        let config = Config::new(tmp.join("data"), tmp.join("out"));
        config.prepare().unwrap();
        let samples: Vec<f64> = (0..3 * 4 * 5).map(|i| i as f64).collect();
        write_cube(
            &config.data_dir,
            "plots/a",
            &EnviHeader::new(3, 4, 5, DataType::U16),
            &samples,
        )
        .unwrap();
        AppState::new(&config)
    }

    #[test]
    fn select_pick_and_save() {
        let tmp = tempfile::tempdir().unwrap();
        let mut st = state(tmp.path());
        assert_eq!(st.files, vec!["plots/a"]);

        st.select_cube("plots/a");
        assert!(st.preview_dirty);
        assert_eq!(st.preview.as_ref().unwrap().width, 4);

        st.pick_pixel(2, 1);
        assert_eq!(st.spectrum.as_ref().unwrap().len(), 5);

        st.label_input = "  grass ".into();
        st.save_label();
        assert_eq!(st.status, Some(Status::Info("Saved grass".into())));
        assert_eq!(st.labels_for_current().count(), 1);

        // A fresh state sees the same label on disk.
        let reloaded = AppState::new(&Config::new(tmp.path().join("data"), tmp.path().join("out")));
        assert_eq!(reloaded.labels.len(), 1);
        assert_eq!(reloaded.labels[0].label, "grass");
    }

    #[test]
    fn save_requires_pixel_and_label() {
        let tmp = tempfile::tempdir().unwrap();
        let mut st = state(tmp.path());
        st.save_label();
        assert!(matches!(st.status, Some(Status::Error(_))));

        st.select_cube("plots/a");
        st.pick_pixel(0, 0);
        st.label_input.clear();
        st.save_label();
        assert_eq!(st.status, Some(Status::Error("Enter a class name".into())));
        assert!(!st.dataset_path().exists());
    }

    #[test]
    fn failed_open_clears_current_cube() {
        let tmp = tempfile::tempdir().unwrap();
        let mut st = state(tmp.path());
        st.select_cube("plots/missing");
        assert!(st.current.is_none());
        assert!(matches!(st.status, Some(Status::Error(_))));
    }

    #[test]
    fn out_of_range_pick_keeps_previous_spectrum() {
        let tmp = tempfile::tempdir().unwrap();
        let mut st = state(tmp.path());
        st.select_cube("plots/a");
        st.pick_pixel(1, 1);
        st.pick_pixel(40, 40);
        assert_eq!(st.selected_pixel, Some((1, 1)));
        assert!(matches!(st.status, Some(Status::Error(_))));
    }
}
