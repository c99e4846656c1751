use std::ffi::OsString;
use std::fs::File;
use std::path::{Component, Path, PathBuf};

use memmap2::Mmap;
use walkdir::WalkDir;

use super::header::EnviHeader;
use super::model::Dimensions;
use crate::config::Config;
use crate::error::CubeError;

pub const HEADER_EXT: &str = ".hdr";
pub const RAW_EXT: &str = ".raw";

// ---------------------------------------------------------------------------
// CubeStore – resolves identifiers under the data directory
// ---------------------------------------------------------------------------

/// Opens cubes by identifier relative to a root directory.
///
/// Nothing is cached: every [`CubeStore::open`] parses the header and maps the
/// raw file again.
#[derive(Debug, Clone)]
pub struct CubeStore {
    root: PathBuf,
}

impl CubeStore {
    pub fn new(config: &Config) -> Self {
        Self::with_root(config.data_dir())
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Header and raw paths for `identifier`.
    pub fn resolve(&self, identifier: &str) -> Result<(PathBuf, PathBuf), CubeError> {
        resolve_paths(&self.root, identifier)
    }

    /// Every cube under the root, as sorted `/`-separated identifiers.
    pub fn list(&self) -> Result<Vec<String>, CubeError> {
        if !self.root.is_dir() {
            return Err(CubeError::RootNotFound(self.root.clone()));
        }

        let mut identifiers = Vec::new();
        for entry in WalkDir::new(&self.root) {
            let entry = match entry {
                Ok(e) => e,
                Err(err) => {
                    log::warn!("Skipping unreadable entry: {err}");
                    continue;
                }
            };
            if !entry.path().is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str() else {
                continue;
            };
            if !name.ends_with(HEADER_EXT) {
                continue;
            }
            let Ok(rel) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            let joined = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            if let Some(id) = joined.strip_suffix(HEADER_EXT) {
                identifiers.push(id.to_string());
            }
        }

        identifiers.sort();
        log::debug!("Found {} cubes under {}", identifiers.len(), self.root.display());
        Ok(identifiers)
    }

    /// Parse the header of `identifier` and map its raw file.
    pub fn open(&self, identifier: &str) -> Result<Cube, CubeError> {
        let (hdr_path, raw_path) = self.resolve(identifier)?;

        if !hdr_path.is_file() {
            return Err(CubeError::NotFound(hdr_path));
        }

        let text = std::fs::read_to_string(&hdr_path).map_err(|source| CubeError::Io {
            path: hdr_path.clone(),
            source,
        })?;
        let header = EnviHeader::parse(&text).map_err(|source| CubeError::Header {
            path: hdr_path.clone(),
            source,
        })?;

        let file = File::open(&raw_path).map_err(|e| CubeError::Decode {
            path: raw_path.clone(),
            reason: format!("cannot open raw file: {e}"),
        })?;
        // SAFETY: the mapping is read-only; concurrent modification of the
        // file by other processes is outside what this tool supports.
        let data = unsafe { Mmap::map(&file) }.map_err(|e| CubeError::Decode {
            path: raw_path.clone(),
            reason: format!("cannot map raw file: {e}"),
        })?;

        let needed = header.raw_len().ok_or_else(|| CubeError::Decode {
            path: raw_path.clone(),
            reason: format!(
                "header describes more than {} bytes ({} lines x {} samples x {} bands)",
                usize::MAX,
                header.lines,
                header.samples,
                header.bands,
            ),
        })?;
        if data.len() < needed {
            return Err(CubeError::Decode {
                path: raw_path,
                reason: format!(
                    "raw file holds {} bytes but header describes {needed} \
                     ({} lines x {} samples x {} bands x {} bytes + offset {})",
                    data.len(),
                    header.lines,
                    header.samples,
                    header.bands,
                    header.data_type.size(),
                    header.header_offset,
                ),
            });
        }

        log::info!(
            "Opened {identifier}: {}x{} px, {} bands, {:?}/{}",
            header.lines,
            header.samples,
            header.bands,
            header.data_type,
            header.interleave.as_str(),
        );

        Ok(Cube {
            identifier: identifier.to_string(),
            header,
            data,
        })
    }
}

/// Normalize a `/`- or `\`-separated identifier into the header/raw paths.
pub(crate) fn resolve_paths(root: &Path, identifier: &str) -> Result<(PathBuf, PathBuf), CubeError> {
    let mut rel = PathBuf::new();
    for part in identifier.split(['/', '\\']) {
        if part.is_empty() || part == "." {
            continue;
        }
        // Anything that is not a plain name (`..`, drive prefixes) could
        // escape the root.
        match Path::new(part).components().next() {
            Some(Component::Normal(_)) => rel.push(part),
            _ => return Err(CubeError::InvalidIdentifier(identifier.to_string())),
        }
    }
    if rel.as_os_str().is_empty() {
        return Err(CubeError::InvalidIdentifier(identifier.to_string()));
    }

    let base = root.join(rel);
    Ok((with_suffix(&base, HEADER_EXT), with_suffix(&base, RAW_EXT)))
}

fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut s = OsString::from(base.as_os_str());
    s.push(suffix);
    PathBuf::from(s)
}

// ---------------------------------------------------------------------------
// Cube – a mapped header/raw pair
// ---------------------------------------------------------------------------

/// Read-only view over one cube. Dropping it releases the mapping.
pub struct Cube {
    identifier: String,
    header: EnviHeader,
    data: Mmap,
}

impl Cube {
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn header(&self) -> &EnviHeader {
        &self.header
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            height: self.header.lines,
            width: self.header.samples,
            bands: self.header.bands,
        }
    }

    /// Wavelength of each band, when the header declares them.
    pub fn wavelengths(&self) -> Option<&[f64]> {
        self.header.wavelengths.as_deref()
    }

    /// One band as a row-major `height × width` plane.
    pub fn band_slice(&self, band: usize) -> Result<Vec<f64>, CubeError> {
        let dims = self.dimensions();
        if band >= dims.bands {
            return Err(CubeError::BandOutOfBounds {
                band,
                bands: dims.bands,
            });
        }
        let mut plane = Vec::with_capacity(dims.height * dims.width);
        for row in 0..dims.height {
            for col in 0..dims.width {
                plane.push(self.sample(row, col, band));
            }
        }
        Ok(plane)
    }

    /// All bands of the pixel at column `x`, row `y`.
    pub fn pixel_vector(&self, x: usize, y: usize) -> Result<Vec<f64>, CubeError> {
        let dims = self.dimensions();
        if x >= dims.width || y >= dims.height {
            return Err(CubeError::PixelOutOfBounds {
                x,
                y,
                width: dims.width,
                height: dims.height,
            });
        }
        Ok((0..dims.bands).map(|b| self.sample(y, x, b)).collect())
    }

    fn sample(&self, row: usize, col: usize, band: usize) -> f64 {
        let size = self.header.data_type.size();
        let start = self.header.header_offset + self.header.sample_index(row, col, band) * size;
        self.header
            .data_type
            .decode(&self.data[start..start + size], self.header.byte_order)
    }
}

impl std::fmt::Debug for Cube {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cube")
            .field("identifier", &self.identifier)
            .field("header", &self.header)
            .field("mapped_bytes", &self.data.len())
            .finish()
    }
}
