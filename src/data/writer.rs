use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use super::cube::resolve_paths;
use super::header::EnviHeader;

/// Write a header/raw pair under `root`.
///
/// `samples` is row-major `(row, column, band)`, i.e. BIP order; it is
/// re-ordered to the header's interleave and encoded in its data type and
/// byte order. Integer types saturate. Returns the header and raw paths.
pub fn write_cube(
    root: &Path,
    identifier: &str,
    header: &EnviHeader,
    samples: &[f64],
) -> Result<(PathBuf, PathBuf)> {
    let Some(payload) = header.data_len() else {
        bail!("cube '{identifier}': header size overflows");
    };
    let expected = payload / header.data_type.size();
    if samples.len() != expected {
        bail!(
            "cube '{identifier}': got {} samples, header describes {expected}",
            samples.len()
        );
    }

    let (hdr_path, raw_path) = resolve_paths(root, identifier)?;
    if let Some(parent) = hdr_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }

    let mut ordered = vec![0.0; expected];
    let mut i = 0;
    for r in 0..header.lines {
        for c in 0..header.samples {
            for b in 0..header.bands {
                ordered[header.sample_index(r, c, b)] = samples[i];
                i += 1;
            }
        }
    }

    let mut bytes = vec![0u8; header.header_offset];
    bytes.reserve(payload);
    for v in ordered {
        header.data_type.encode(v, header.byte_order, &mut bytes);
    }

    std::fs::write(&hdr_path, header.to_string())
        .with_context(|| format!("writing {}", hdr_path.display()))?;
    std::fs::write(&raw_path, &bytes)
        .with_context(|| format!("writing {}", raw_path.display()))?;

    log::debug!(
        "Wrote cube {identifier} ({} bytes of samples)",
        bytes.len() - header.header_offset
    );
    Ok((hdr_path, raw_path))
}
