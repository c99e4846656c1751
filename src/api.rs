//! Boundary operations: what a request handler (or the desktop shell) calls.
//!
//! Each operation opens what it needs afresh; the only shared state is the
//! dataset writer's lock.

use serde::Serialize;
use thiserror::Error;

use crate::config::Config;
use crate::data::cube::CubeStore;
use crate::data::model::{LabelRecord, PixelSpectrum};
use crate::dataset::DatasetWriter;
use crate::error::{CubeError, PreviewError};
use crate::preview::{EncodedPreview, PreviewImage, PreviewRenderer};
use crate::spectrum;

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileList {
    pub files: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaveResponse {
    pub status: &'static str,
    pub message: String,
}

/// Failure as seen by a client: an HTTP-style status and a message.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[error("{status}: {detail}")]
pub struct ApiError {
    pub status: u16,
    pub detail: String,
}

impl ApiError {
    fn internal(detail: impl Into<String>) -> Self {
        Self {
            status: 500,
            detail: detail.into(),
        }
    }
}

impl From<CubeError> for ApiError {
    fn from(e: CubeError) -> Self {
        let status = match e {
            CubeError::NotFound(_) | CubeError::InvalidIdentifier(_) => 404,
            _ => 500,
        };
        Self {
            status,
            detail: e.to_string(),
        }
    }
}

impl From<PreviewError> for ApiError {
    fn from(e: PreviewError) -> Self {
        match e {
            PreviewError::Cube(inner) => inner.into(),
            other => Self::internal(other.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Annotator
// ---------------------------------------------------------------------------

pub struct Annotator {
    store: CubeStore,
    renderer: PreviewRenderer,
    writer: DatasetWriter,
}

impl Annotator {
    pub fn new(config: &Config) -> Self {
        Self::from_parts(
            CubeStore::new(config),
            PreviewRenderer::default(),
            DatasetWriter::new(config),
        )
    }

    pub fn from_parts(store: CubeStore, renderer: PreviewRenderer, writer: DatasetWriter) -> Self {
        Self {
            store,
            renderer,
            writer,
        }
    }

    pub fn store(&self) -> &CubeStore {
        &self.store
    }

    pub fn writer(&self) -> &DatasetWriter {
        &self.writer
    }

    /// Available cubes; a missing data directory yields an empty list with
    /// an error marker rather than a failure.
    pub fn list_cubes(&self) -> FileList {
        match self.store.list() {
            Ok(files) => FileList { files, error: None },
            Err(e) => {
                log::warn!("Listing cubes failed: {e}");
                FileList {
                    files: Vec::new(),
                    error: Some("Path not found".to_string()),
                }
            }
        }
    }

    /// Uncompressed preview, for callers that display it directly.
    pub fn preview_image(&self, identifier: &str) -> Result<PreviewImage, ApiError> {
        let cube = self.store.open(identifier)?;
        Ok(self.renderer.render(&cube)?)
    }

    pub fn preview(&self, identifier: &str) -> Result<EncodedPreview, ApiError> {
        let cube = self.store.open(identifier)?;
        Ok(self.renderer.render_jpeg(&cube)?)
    }

    pub fn spectrum(&self, identifier: &str, x: u32, y: u32) -> Result<PixelSpectrum, ApiError> {
        let cube = self.store.open(identifier)?;
        Ok(spectrum::extract(&cube, x as usize, y as usize)?)
    }

    /// Append a label. The client only ever sees a generic failure message;
    /// the cause goes to the log.
    pub fn save_label(&self, record: &LabelRecord) -> Result<SaveResponse, ApiError> {
        match self.writer.append(record) {
            Ok(ack) => Ok(SaveResponse {
                status: "success",
                message: format!("Saved {}", ack.label),
            }),
            Err(e) => {
                log::error!("Save failed: {e}");
                Err(ApiError::internal("Save failed"))
            }
        }
    }
}
