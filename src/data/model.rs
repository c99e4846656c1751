use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Dimensions
// ---------------------------------------------------------------------------

/// Shape of a cube: rows, columns, spectral bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dimensions {
    pub height: usize,
    pub width: usize,
    pub bands: usize,
}

// ---------------------------------------------------------------------------
// PixelSpectrum – one pixel's band vector
// ---------------------------------------------------------------------------

/// Spectral signature of a single pixel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PixelSpectrum {
    /// Wavelength axis (x) – band indices when the cube has no metadata.
    pub wavelengths: Vec<f64>,
    /// Sample values (y) – same length as `wavelengths`.
    pub spectrum: Vec<f64>,
}

impl PixelSpectrum {
    pub fn len(&self) -> usize {
        self.spectrum.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spectrum.is_empty()
    }
}

// ---------------------------------------------------------------------------
// LabelRecord – one annotation submitted by the user
// ---------------------------------------------------------------------------

/// A labeled pixel ready to be appended to the dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelRecord {
    /// Identifier of the source cube (relative, `/`-separated).
    pub filename: String,
    pub x: u32,
    pub y: u32,
    /// Free-text class name.
    pub label: String,
    pub spectrum: Vec<f64>,
    /// Optional; used for the dataset header on first write.
    #[serde(default)]
    pub wavelengths: Vec<f64>,
}

impl LabelRecord {
    /// Build a record from a freshly extracted spectrum.
    pub fn from_spectrum(
        filename: &str,
        x: u32,
        y: u32,
        label: &str,
        spectrum: &PixelSpectrum,
    ) -> Self {
        Self {
            filename: filename.to_string(),
            x,
            y,
            label: label.to_string(),
            spectrum: spectrum.spectrum.clone(),
            wavelengths: spectrum.wavelengths.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// LabeledPoint – a dataset row read back for display
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledPoint {
    pub filename: String,
    pub x: u32,
    pub y: u32,
    pub label: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_record_wavelengths_default_to_empty() {
        let json = r#"{"filename":"a","x":1,"y":2,"label":"soil","spectrum":[0.1,0.2]}"#;
        let rec: LabelRecord = serde_json::from_str(json).unwrap();
        assert!(rec.wavelengths.is_empty());
        assert_eq!(rec.spectrum, vec![0.1, 0.2]);
    }

    #[test]
    fn negative_coordinates_are_rejected() {
        let json = r#"{"filename":"a","x":-1,"y":2,"label":"soil","spectrum":[]}"#;
        assert!(serde_json::from_str::<LabelRecord>(json).is_err());
    }

    #[test]
    fn pixel_spectrum_serializes_both_axes() {
        let sp = PixelSpectrum {
            wavelengths: vec![0.0, 1.0],
            spectrum: vec![3.5, 4.0],
        };
        let v = serde_json::to_value(&sp).unwrap();
        assert_eq!(v["wavelengths"][1], 1.0);
        assert_eq!(v["spectrum"][0], 3.5);
    }
}
