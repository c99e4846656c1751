use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Header parsing
// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum HeaderError {
    #[error("header does not start with the ENVI signature")]
    MissingMagic,
    #[error("header is missing required field '{0}'")]
    MissingField(&'static str),
    #[error("invalid value for '{field}': '{value}'")]
    InvalidValue { field: String, value: String },
    #[error("unsupported data type code {0}")]
    UnsupportedDataType(u32),
    #[error("unsupported interleave '{0}'")]
    UnsupportedInterleave(String),
    #[error("unterminated '{{' in field '{0}'")]
    UnterminatedBrace(String),
    #[error("header declares {bands} bands but lists {found} wavelengths")]
    WavelengthCount { bands: usize, found: usize },
    #[error("{lines} lines x {samples} samples x {bands} bands does not fit in memory")]
    SizeOverflow {
        lines: usize,
        samples: usize,
        bands: usize,
    },
}

// ---------------------------------------------------------------------------
// Cube access
// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum CubeError {
    #[error("HDR file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("invalid cube identifier '{0}'")]
    InvalidIdentifier(String),
    #[error("data directory not found: {}", .0.display())]
    RootNotFound(PathBuf),
    #[error("failed to parse header {}: {source}", .path.display())]
    Header {
        path: PathBuf,
        #[source]
        source: HeaderError,
    },
    #[error("failed to decode cube {}: {reason}", .path.display())]
    Decode { path: PathBuf, reason: String },
    #[error("band {band} out of range for cube with {bands} bands")]
    BandOutOfBounds { band: usize, bands: usize },
    #[error("pixel (x={x}, y={y}) out of range for {width}x{height} cube")]
    PixelOutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Preview rendering
// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum PreviewError {
    #[error(transparent)]
    Cube(#[from] CubeError),
    #[error("contrast stretch range collapsed (p2={low}, p98={high})")]
    DegenerateRange { low: f64, high: f64 },
    #[error("failed to encode preview: {0}")]
    Encode(#[from] image::ImageError),
}

// ---------------------------------------------------------------------------
// Dataset output
// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("failed to write {}: {source}", .path.display())]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("record has {found} columns but dataset header has {expected}")]
    SchemaMismatch { expected: usize, found: usize },
    #[error("{} exists but has no header row", .0.display())]
    MissingHeader(PathBuf),
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}
