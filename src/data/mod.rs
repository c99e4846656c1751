/// Data layer: cube headers, cube access, and core types.
///
/// Architecture:
/// ```text
///  <root>/<id>.hdr + <id>.raw
///        │
///        ▼
///   ┌──────────┐
///   │  header   │  parse ENVI text → EnviHeader
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │   cube    │  CubeStore::open → Cube (mapped raw samples)
///   └──────────┘
///        │
///        ▼
///   band_slice / pixel_vector  →  preview, spectrum
/// ```
///
/// `writer` goes the other way and produces header/raw pairs.

pub mod cube;
pub mod header;
pub mod model;
pub mod writer;
