use crate::data::cube::Cube;
use crate::data::model::PixelSpectrum;
use crate::error::CubeError;

/// Band vector at column `x`, row `y`, paired with its wavelength axis.
///
/// Cubes without wavelength metadata get the band indices `0..bands` as
/// their axis. Out-of-range coordinates are an error, never clamped.
pub fn extract(cube: &Cube, x: usize, y: usize) -> Result<PixelSpectrum, CubeError> {
    let spectrum = cube.pixel_vector(x, y)?;
    let wavelengths = match cube.wavelengths() {
        Some(wl) => wl.to_vec(),
        None => (0..spectrum.len()).map(|i| i as f64).collect(),
    };
    Ok(PixelSpectrum {
        wavelengths,
        spectrum,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::cube::CubeStore;
    use crate::data::header::{DataType, EnviHeader, Interleave};
    use crate::data::writer::write_cube;

    fn samples(h: usize, w: usize, b: usize) -> Vec<f64> {
        (0..h * w * b).map(|i| i as f64).collect()
    }

    #[test]
    fn spectrum_length_matches_band_count_everywhere() {
        let tmp = tempfile::tempdir().unwrap();
        let (h, w, b) = (3, 4, 6);
        write_cube(tmp.path(), "c", &EnviHeader::new(h, w, b, DataType::F64), &samples(h, w, b))
            .unwrap();
        let cube = CubeStore::with_root(tmp.path()).open("c").unwrap();

        for y in 0..h {
            for x in 0..w {
                let sp = extract(&cube, x, y).unwrap();
                assert_eq!(sp.spectrum.len(), b);
                assert_eq!(sp.wavelengths.len(), b);
            }
        }
    }

    #[test]
    fn x_is_column_and_y_is_row() {
        let tmp = tempfile::tempdir().unwrap();
        let (h, w, b) = (3, 4, 2);
        let mut header = EnviHeader::new(h, w, b, DataType::U16);
        header.interleave = Interleave::Bil;
        write_cube(tmp.path(), "c", &header, &samples(h, w, b)).unwrap();
        let cube = CubeStore::with_root(tmp.path()).open("c").unwrap();

        // row 2, column 1 → pixel index 2*4 + 1 = 9
        let sp = extract(&cube, 1, 2).unwrap();
        assert_eq!(sp.spectrum, vec![18.0, 19.0]);
    }

    #[test]
    fn missing_wavelengths_fall_back_to_indices() {
        let tmp = tempfile::tempdir().unwrap();
        write_cube(tmp.path(), "c", &EnviHeader::new(1, 1, 4, DataType::U8), &[9.0; 4]).unwrap();
        let cube = CubeStore::with_root(tmp.path()).open("c").unwrap();
        assert_eq!(extract(&cube, 0, 0).unwrap().wavelengths, vec![0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn header_wavelengths_are_used_in_order() {
        let tmp = tempfile::tempdir().unwrap();
        let mut header = EnviHeader::new(1, 1, 3, DataType::U8);
        header.wavelengths = Some(vec![700.5, 450.0, 550.25]);
        write_cube(tmp.path(), "c", &header, &[1.0, 2.0, 3.0]).unwrap();
        let cube = CubeStore::with_root(tmp.path()).open("c").unwrap();
        let sp = extract(&cube, 0, 0).unwrap();
        assert_eq!(sp.wavelengths, vec![700.5, 450.0, 550.25]);
        assert_eq!(sp.spectrum, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn out_of_range_pixel_is_not_clamped() {
        let tmp = tempfile::tempdir().unwrap();
        write_cube(tmp.path(), "c", &EnviHeader::new(2, 2, 1, DataType::U8), &[0.0; 4]).unwrap();
        let cube = CubeStore::with_root(tmp.path()).open("c").unwrap();
        assert!(matches!(
            extract(&cube, 2, 0),
            Err(CubeError::PixelOutOfBounds { .. })
        ));
    }
}
