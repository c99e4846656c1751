use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;

use crate::data::cube::Cube;
use crate::error::PreviewError;

pub const JPEG_CONTENT_TYPE: &str = "image/jpeg";
pub const JPEG_QUALITY: u8 = 75;

/// Value written to every channel when the stretch range collapses.
pub const MID_GRAY: u8 = 128;

// ---------------------------------------------------------------------------
// Band selection
// ---------------------------------------------------------------------------

/// Band indices shown as red, green and blue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RgbBands {
    pub red: usize,
    pub green: usize,
    pub blue: usize,
}

/// Picks the three preview bands from the cube's band count.
pub trait BandSelector {
    fn select(&self, band_count: usize) -> RgbBands;
}

impl<F> BandSelector for F
where
    F: Fn(usize) -> RgbBands,
{
    fn select(&self, band_count: usize) -> RgbBands {
        self(band_count)
    }
}

/// Bands at fixed fractions of the band count, truncated toward zero.
///
/// The defaults (0.6, 0.4, 0.1) suit the usual visible/near-infrared band
/// ordering and make a reasonable false-color composite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FractionalBands {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
}

impl Default for FractionalBands {
    fn default() -> Self {
        Self {
            red: 0.6,
            green: 0.4,
            blue: 0.1,
        }
    }
}

impl BandSelector for FractionalBands {
    fn select(&self, band_count: usize) -> RgbBands {
        let pick = |fraction: f64| (band_count as f64 * fraction) as usize;
        RgbBands {
            red: pick(self.red),
            green: pick(self.green),
            blue: pick(self.blue),
        }
    }
}

// ---------------------------------------------------------------------------
// Contrast stretch
// ---------------------------------------------------------------------------

/// What to do when the low and high percentiles coincide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DegeneratePolicy {
    /// Fill the preview with [`MID_GRAY`].
    #[default]
    MidGray,
    /// Return [`PreviewError::DegenerateRange`].
    Fail,
}

/// Linear stretch between two percentiles computed over all channels at once.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PercentileStretch {
    pub low: f64,
    pub high: f64,
}

impl Default for PercentileStretch {
    fn default() -> Self {
        Self {
            low: 2.0,
            high: 98.0,
        }
    }
}

impl PercentileStretch {
    /// Percentile bounds over the finite values, or `None` if there are none.
    pub fn bounds(&self, values: &[f64]) -> Option<(f64, f64)> {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(f64::total_cmp);
        Some((percentile(&sorted, self.low), percentile(&sorted, self.high)))
    }

    /// Map `values` to bytes. Non-finite samples become 0.
    pub fn apply(&self, values: &[f64], policy: DegeneratePolicy) -> Result<Vec<u8>, PreviewError> {
        let (low, high) = self.bounds(values).unwrap_or((f64::NAN, f64::NAN));
        log::debug!("Stretch bounds: p{}={low}, p{}={high}", self.low, self.high);

        if !(high > low) {
            return match policy {
                DegeneratePolicy::MidGray => {
                    log::warn!("Degenerate stretch range [{low}, {high}], using mid-gray preview");
                    Ok(vec![MID_GRAY; values.len()])
                }
                DegeneratePolicy::Fail => Err(PreviewError::DegenerateRange { low, high }),
            };
        }

        let range = high - low;
        Ok(values
            .iter()
            .map(|&v| {
                if v.is_finite() {
                    ((v - low) / range * 255.0).clamp(0.0, 255.0) as u8
                } else {
                    0
                }
            })
            .collect())
    }
}

/// Linear-interpolated percentile of an ascending slice (numpy's default).
fn percentile(sorted: &[f64], p: f64) -> f64 {
    let rank = (p / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = (lo + 1).min(sorted.len() - 1);
    let t = rank - lo as f64;
    let (a, b) = (sorted[lo], sorted[hi]);
    if t >= 0.5 {
        b - (b - a) * (1.0 - t)
    } else {
        a + (b - a) * t
    }
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Interleaved 8-bit RGB preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewImage {
    pub width: usize,
    pub height: usize,
    /// `width * height * 3` bytes, row-major.
    pub pixels: Vec<u8>,
}

impl PreviewImage {
    pub fn encode_jpeg(&self, quality: u8) -> Result<Vec<u8>, PreviewError> {
        let mut buf = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality);
        encoder.encode(
            &self.pixels,
            self.width as u32,
            self.height as u32,
            ExtendedColorType::Rgb8,
        )?;
        Ok(buf)
    }

    /// Save to disk; the format follows the extension (`.jpg`, `.png`, ...).
    pub fn save(&self, path: &Path) -> Result<(), PreviewError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        if ext == "jpg" || ext == "jpeg" {
            let bytes = self.encode_jpeg(JPEG_QUALITY)?;
            std::fs::write(path, bytes).map_err(|e| PreviewError::Encode(e.into()))?;
        } else {
            image::save_buffer(
                path,
                &self.pixels,
                self.width as u32,
                self.height as u32,
                ExtendedColorType::Rgb8,
            )?;
        }
        Ok(())
    }
}

/// Compressed preview ready to hand to a client.
#[derive(Debug, Clone)]
pub struct EncodedPreview {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
}

// ---------------------------------------------------------------------------
// PreviewRenderer
// ---------------------------------------------------------------------------

/// Builds false-color previews from cubes.
#[derive(Debug, Clone)]
pub struct PreviewRenderer<S = FractionalBands> {
    selector: S,
    stretch: PercentileStretch,
    policy: DegeneratePolicy,
}

impl Default for PreviewRenderer {
    fn default() -> Self {
        Self::with_selector(FractionalBands::default())
    }
}

impl<S: BandSelector> PreviewRenderer<S> {
    pub fn with_selector(selector: S) -> Self {
        Self {
            selector,
            stretch: PercentileStretch::default(),
            policy: DegeneratePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: DegeneratePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_stretch(mut self, stretch: PercentileStretch) -> Self {
        self.stretch = stretch;
        self
    }

    pub fn bands_for(&self, band_count: usize) -> RgbBands {
        self.selector.select(band_count)
    }

    pub fn render(&self, cube: &Cube) -> Result<PreviewImage, PreviewError> {
        let dims = cube.dimensions();
        let bands = self.bands_for(dims.bands);
        log::debug!(
            "Preview of {} uses bands r={} g={} b={}",
            cube.identifier(),
            bands.red,
            bands.green,
            bands.blue
        );

        let red = cube.band_slice(bands.red)?;
        let green = cube.band_slice(bands.green)?;
        let blue = cube.band_slice(bands.blue)?;

        let mut stacked = Vec::with_capacity(red.len() * 3);
        for ((r, g), b) in red.iter().zip(&green).zip(&blue) {
            stacked.extend_from_slice(&[*r, *g, *b]);
        }

        let pixels = self.stretch.apply(&stacked, self.policy)?;
        Ok(PreviewImage {
            width: dims.width,
            height: dims.height,
            pixels,
        })
    }

    pub fn render_jpeg(&self, cube: &Cube) -> Result<EncodedPreview, PreviewError> {
        let image = self.render(cube)?;
        Ok(EncodedPreview {
            bytes: image.encode_jpeg(JPEG_QUALITY)?,
            content_type: JPEG_CONTENT_TYPE,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::cube::CubeStore;
    use crate::data::header::{DataType, EnviHeader};
    use crate::data::writer::write_cube;

    #[test]
    fn fractional_bands_for_one_hundred() {
        let picked = FractionalBands::default().select(100);
        assert_eq!(picked, RgbBands { red: 60, green: 40, blue: 10 });
    }

    #[test]
    fn fractional_bands_truncate() {
        assert_eq!(
            FractionalBands::default().select(7),
            RgbBands { red: 4, green: 2, blue: 0 }
        );
        assert_eq!(
            FractionalBands::default().select(1),
            RgbBands { red: 0, green: 0, blue: 0 }
        );
    }

    #[test]
    fn closures_are_selectors() {
        let renderer = PreviewRenderer::with_selector(|n: usize| RgbBands {
            red: n - 1,
            green: 0,
            blue: 0,
        });
        assert_eq!(renderer.bands_for(5).red, 4);
    }

    #[test]
    fn percentile_matches_linear_interpolation() {
        let v: Vec<f64> = (0..=10).map(|i| i as f64).collect();
        assert!((percentile(&v, 2.0) - 0.2).abs() < 1e-12);
        assert!((percentile(&v, 98.0) - 9.8).abs() < 1e-12);
        assert_eq!(percentile(&[5.0], 98.0), 5.0);
    }

    #[test]
    fn stretch_is_joint_over_all_values() {
        // Each channel is constant on its own; only a joint stretch can
        // spread them out.
        let values = [0.0, 50.0, 100.0, 0.0, 50.0, 100.0];
        let stretch = PercentileStretch { low: 0.0, high: 100.0 };
        let out = stretch.apply(&values, DegeneratePolicy::Fail).unwrap();
        assert_eq!(out, vec![0, 127, 255, 0, 127, 255]);
    }

    #[test]
    fn stretch_clips_outliers_and_zeroes_nan() {
        let mut values: Vec<f64> = (0..100).map(|i| i as f64).collect();
        values.push(f64::NAN);
        values.push(1e9);
        let out = PercentileStretch::default()
            .apply(&values, DegeneratePolicy::Fail)
            .unwrap();
        assert_eq!(out[0], 0);
        assert_eq!(out[100], 0);
        assert_eq!(out[101], 255);
    }

    #[test]
    fn degenerate_range_follows_policy() {
        let flat = [3.0; 12];
        let stretch = PercentileStretch::default();
        assert_eq!(
            stretch.apply(&flat, DegeneratePolicy::MidGray).unwrap(),
            vec![MID_GRAY; 12]
        );
        assert!(matches!(
            stretch.apply(&flat, DegeneratePolicy::Fail),
            Err(PreviewError::DegenerateRange { low, high }) if low == 3.0 && high == 3.0
        ));
        assert!(matches!(
            stretch.apply(&[f64::NAN; 3], DegeneratePolicy::Fail),
            Err(PreviewError::DegenerateRange { .. })
        ));
    }

    fn gradient_cube(dir: &Path) -> Cube {
        let (h, w, b) = (4, 5, 10);
        let samples: Vec<f64> = (0..h * w * b).map(|i| (i % 97) as f64).collect();
        write_cube(dir, "grad", &EnviHeader::new(h, w, b, DataType::F32), &samples).unwrap();
        CubeStore::with_root(dir).open("grad").unwrap()
    }

    #[test]
    fn render_is_deterministic_and_sized() {
        let tmp = tempfile::tempdir().unwrap();
        let cube = gradient_cube(tmp.path());
        let renderer = PreviewRenderer::default();
        let first = renderer.render(&cube).unwrap();
        let second = renderer.render(&cube).unwrap();
        assert_eq!(first, second);
        assert_eq!((first.width, first.height), (5, 4));
        assert_eq!(first.pixels.len(), 5 * 4 * 3);
    }

    #[test]
    fn render_jpeg_produces_jpeg_bytes() {
        let tmp = tempfile::tempdir().unwrap();
        let cube = gradient_cube(tmp.path());
        let encoded = PreviewRenderer::default().render_jpeg(&cube).unwrap();
        assert_eq!(encoded.content_type, "image/jpeg");
        assert_eq!(&encoded.bytes[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn save_png_round_trips_dimensions() {
        let tmp = tempfile::tempdir().unwrap();
        let img = PreviewImage {
            width: 3,
            height: 2,
            pixels: vec![10; 18],
        };
        let path = tmp.path().join("preview.png");
        img.save(&path).unwrap();
        let decoded = image::open(&path).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (3, 2));
    }
}
