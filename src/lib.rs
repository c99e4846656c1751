//! Hyperspectral cube annotation core.
//!
//! Open ENVI header/raw pairs, render false-color previews, pull per-pixel
//! spectra, and append labeled pixels to a CSV training set.

pub mod api;
pub mod config;
pub mod data;
pub mod dataset;
pub mod error;
pub mod preview;
pub mod spectrum;

pub use api::Annotator;
pub use config::Config;
pub use data::cube::{Cube, CubeStore};
pub use dataset::DatasetWriter;
pub use preview::PreviewRenderer;
