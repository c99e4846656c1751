use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::config::Config;
use crate::data::model::{LabelRecord, LabeledPoint};
use crate::error::DatasetError;

/// Leading columns of every dataset row.
pub const FIXED_COLUMNS: [&str; 4] = ["filename", "x", "y", "label"];

// ---------------------------------------------------------------------------
// DatasetWriter – append-only labeled CSV
// ---------------------------------------------------------------------------

/// Acknowledgement of a committed row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveAck {
    pub label: String,
    /// Whether this call created the file and wrote the header.
    pub created: bool,
}

/// Appends [`LabelRecord`]s to the dataset file.
///
/// The header row is written exactly once, by whichever call creates the
/// file, even across writers that share a path. Later records must match
/// its width or they are rejected with [`DatasetError::SchemaMismatch`].
#[derive(Debug)]
pub struct DatasetWriter {
    path: PathBuf,
    lock: Mutex<()>,
}

impl DatasetWriter {
    pub fn new(config: &Config) -> Self {
        Self::with_path(config.dataset_path())
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record, writing the header first if the file is new.
    ///
    /// Either the whole row (and header) is committed or the file is left as
    /// it was.
    pub fn append(&self, record: &LabelRecord) -> Result<SaveAck, DatasetError> {
        self.append_with(record, |file, bytes| file.write_all(bytes))
    }

    /// [`DatasetWriter::append`] with the final write step supplied by the
    /// caller.
    fn append_with<W>(&self, record: &LabelRecord, mut write: W) -> Result<SaveAck, DatasetError>
    where
        W: FnMut(&mut File, &[u8]) -> std::io::Result<()>,
    {
        // The lock only guards the file, so a poisoned guard is still usable.
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());

        match OpenOptions::new().append(true).open(&self.path) {
            Ok(file) => return self.append_row(file, record, &mut write),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(source) => return Err(self.write_failure(source)),
        }

        // New dataset: header and row are staged beside the target and only
        // become visible together. Whoever publishes first owns the header.
        let bytes = encode_rows(record, true).map_err(|source| self.write_failure(source))?;
        let mut staged = tempfile::Builder::new()
            .prefix(".labeled_data")
            .suffix(".tmp")
            .tempfile_in(self.dir())
            .map_err(|source| self.write_failure(source))?;
        write(staged.as_file_mut(), &bytes)
            .and_then(|()| staged.as_file_mut().sync_all())
            .map_err(|source| self.write_failure(source))?;

        match staged.persist_noclobber(&self.path) {
            Ok(_) => {
                log::info!("Created dataset {}", self.path.display());
                Ok(self.saved(record, true))
            }
            Err(e) if e.error.kind() == ErrorKind::AlreadyExists => {
                log::debug!("{} appeared concurrently, appending", self.path.display());
                let file = OpenOptions::new()
                    .append(true)
                    .open(&self.path)
                    .map_err(|source| self.write_failure(source))?;
                self.append_row(file, record, &mut write)
            }
            Err(e) => Err(self.write_failure(e.error)),
        }
    }

    /// Append a data row to an existing dataset whose header must match.
    fn append_row<W>(
        &self,
        mut file: File,
        record: &LabelRecord,
        write: &mut W,
    ) -> Result<SaveAck, DatasetError>
    where
        W: FnMut(&mut File, &[u8]) -> std::io::Result<()>,
    {
        let previous_len = file
            .metadata()
            .map_err(|source| self.write_failure(source))?
            .len();
        if previous_len == 0 {
            return Err(DatasetError::MissingHeader(self.path.clone()));
        }

        let expected = self.header_width()?;
        let found = FIXED_COLUMNS.len() + record.spectrum.len();
        if expected != found {
            return Err(DatasetError::SchemaMismatch { expected, found });
        }

        let result = encode_rows(record, false)
            .and_then(|bytes| write(&mut file, &bytes))
            .and_then(|()| file.flush());
        if let Err(source) = result {
            if let Err(e) = file.set_len(previous_len) {
                log::error!("Failed to roll back {}: {e}", self.path.display());
            }
            return Err(self.write_failure(source));
        }
        Ok(self.saved(record, false))
    }

    fn saved(&self, record: &LabelRecord, created: bool) -> SaveAck {
        log::info!(
            "Saved label '{}' for {} ({}, {})",
            record.label,
            record.filename,
            record.x,
            record.y
        );
        SaveAck {
            label: record.label.clone(),
            created,
        }
    }

    /// Directory the dataset lives in.
    fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        }
    }

    /// Number of columns in the established header row.
    fn header_width(&self) -> Result<usize, DatasetError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&self.path)
            .map_err(|source| self.read_failure(source))?;
        let mut header = csv::StringRecord::new();
        reader
            .read_record(&mut header)
            .map_err(|source| self.read_failure(source))?;
        Ok(header.len())
    }

    fn write_failure(&self, source: std::io::Error) -> DatasetError {
        DatasetError::WriteFailure {
            path: self.path.clone(),
            source,
        }
    }

    fn read_failure(&self, source: csv::Error) -> DatasetError {
        DatasetError::Read {
            path: self.path.clone(),
            source,
        }
    }
}

/// Column names for the first record: its wavelengths when they line up with
/// the spectrum, otherwise `band_<i>`.
pub fn band_columns(record: &LabelRecord) -> Vec<String> {
    if !record.wavelengths.is_empty() && record.wavelengths.len() == record.spectrum.len() {
        record.wavelengths.iter().map(|w| format_float(*w)).collect()
    } else {
        (0..record.spectrum.len()).map(|i| format!("band_{i}")).collect()
    }
}

/// Render a float the way the dataset has always been written: shortest
/// round-trip digits, fixed notation with at least one decimal (`450.0`,
/// `0.0001`) for decimal exponents in `-4..16`, otherwise scientific with a
/// signed two-digit exponent (`1e-05`, `1e+16`). Non-finite values are `nan`,
/// `inf` and `-inf`.
pub fn format_float(v: f64) -> String {
    if v.is_nan() {
        return "nan".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let sci = format!("{v:e}");
    let (mantissa, exp) = match sci.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (sci.as_str(), 0),
    };

    if (-4..16).contains(&exp) {
        let mut fixed = v.to_string();
        if !fixed.contains('.') {
            fixed.push_str(".0");
        }
        fixed
    } else {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{mantissa}e{sign}{:02}", exp.abs())
    }
}

/// Serialize the optional header and the data row into one buffer.
fn encode_rows(record: &LabelRecord, with_header: bool) -> std::io::Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .flexible(true)
        .from_writer(Vec::new());

    if with_header {
        let header = FIXED_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .chain(band_columns(record));
        writer.write_record(header)?;
    }

    let row = [
        record.filename.clone(),
        record.x.to_string(),
        record.y.to_string(),
        record.label.clone(),
    ]
    .into_iter()
    .chain(record.spectrum.iter().map(|v| format_float(*v)));
    writer.write_record(row)?;

    writer.into_inner().map_err(|e| e.into_error())
}

// ---------------------------------------------------------------------------
// Reading labels back
// ---------------------------------------------------------------------------

/// The `(filename, x, y, label)` part of every row in a dataset file.
/// A missing file is an empty dataset.
pub fn read_labels(path: &Path) -> Result<Vec<LabeledPoint>, DatasetError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let read_failure = |source: csv::Error| DatasetError::Read {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(read_failure)?;

    let mut points = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.map_err(read_failure)?;
        let field = |i: usize| record.get(i).unwrap_or("");
        let coord = |i: usize| {
            field(i).trim().parse::<u32>().map_err(|_| {
                read_failure(csv::Error::from(std::io::Error::new(
                    ErrorKind::InvalidData,
                    format!("row {row_no}: '{}' is not a pixel coordinate", field(i)),
                )))
            })
        };
        points.push(LabeledPoint {
            filename: field(0).to_string(),
            x: coord(1)?,
            y: coord(2)?,
            label: field(3).to_string(),
        });
    }
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(label: &str, spectrum: Vec<f64>, wavelengths: Vec<f64>) -> LabelRecord {
        LabelRecord {
            filename: "scene/a".into(),
            x: 3,
            y: 7,
            label: label.into(),
            spectrum,
            wavelengths,
        }
    }

    fn lines(path: &Path) -> Vec<String> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn first_record_fixes_wavelength_header() {
        let tmp = tempfile::tempdir().unwrap();
        let writer = DatasetWriter::with_path(tmp.path().join("out.csv"));

        let ack = writer
            .append(&record("grass", vec![0.1, 0.2], vec![450.0, 500.0]))
            .unwrap();
        assert!(ack.created);
        writer
            .append(&record("soil", vec![0.3, 0.4], vec![]))
            .unwrap();

        let lines = lines(writer.path());
        assert_eq!(lines[0], "filename,x,y,label,450.0,500.0");
        assert_eq!(lines[1], "scene/a,3,7,grass,0.1,0.2");
        assert_eq!(lines[2], "scene/a,3,7,soil,0.3,0.4");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn header_falls_back_to_band_names() {
        let tmp = tempfile::tempdir().unwrap();
        let writer = DatasetWriter::with_path(tmp.path().join("out.csv"));
        writer
            .append(&record("water", vec![1.0, 2.0, 3.0], vec![]))
            .unwrap();
        assert_eq!(lines(writer.path())[0], "filename,x,y,label,band_0,band_1,band_2");
    }

    #[test]
    fn length_mismatched_wavelengths_are_ignored_for_header() {
        let r = record("x", vec![1.0, 2.0], vec![400.0]);
        assert_eq!(band_columns(&r), vec!["band_0", "band_1"]);
    }

    #[test]
    fn mismatched_width_is_rejected_without_writing() {
        let tmp = tempfile::tempdir().unwrap();
        let writer = DatasetWriter::with_path(tmp.path().join("out.csv"));
        writer.append(&record("a", vec![1.0, 2.0], vec![])).unwrap();
        let before = std::fs::read(writer.path()).unwrap();

        let err = writer
            .append(&record("b", vec![1.0, 2.0, 3.0], vec![]))
            .unwrap_err();
        assert!(matches!(err, DatasetError::SchemaMismatch { expected: 6, found: 7 }));
        assert_eq!(std::fs::read(writer.path()).unwrap(), before);
    }

    #[test]
    fn labels_with_commas_are_quoted() {
        let tmp = tempfile::tempdir().unwrap();
        let writer = DatasetWriter::with_path(tmp.path().join("out.csv"));
        writer.append(&record("dry, sandy", vec![1.5], vec![])).unwrap();
        assert_eq!(lines(writer.path())[1], "scene/a,3,7,\"dry, sandy\",1.5");
    }

    #[test]
    fn empty_existing_file_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("out.csv");
        std::fs::write(&path, b"").unwrap();
        let writer = DatasetWriter::with_path(&path);
        let err = writer.append(&record("a", vec![1.0], vec![])).unwrap_err();
        assert!(matches!(err, DatasetError::MissingHeader(_)));
        assert_eq!(std::fs::read(&path).unwrap(), b"");
    }

    fn fail_halfway(file: &mut File, bytes: &[u8]) -> std::io::Result<()> {
        file.write_all(&bytes[..bytes.len() / 2])?;
        Err(std::io::Error::other("disk full"))
    }

    #[test]
    fn failed_first_write_leaves_no_file() {
        let tmp = tempfile::tempdir().unwrap();
        let writer = DatasetWriter::with_path(tmp.path().join("out.csv"));

        let err = writer
            .append_with(&record("a", vec![1.0, 2.0], vec![]), fail_halfway)
            .unwrap_err();
        assert!(matches!(err, DatasetError::WriteFailure { .. }));
        assert!(!writer.path().exists());
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);

        let ack = writer.append(&record("a", vec![1.0, 2.0], vec![])).unwrap();
        assert!(ack.created);
        assert_eq!(lines(writer.path()).len(), 2);
    }

    #[test]
    fn failed_append_truncates_back() {
        let tmp = tempfile::tempdir().unwrap();
        let writer = DatasetWriter::with_path(tmp.path().join("out.csv"));
        writer.append(&record("a", vec![1.0, 2.0], vec![])).unwrap();
        let before = std::fs::read(writer.path()).unwrap();

        let err = writer
            .append_with(&record("b", vec![3.0, 4.0], vec![]), fail_halfway)
            .unwrap_err();
        assert!(matches!(err, DatasetError::WriteFailure { .. }));
        assert_eq!(std::fs::read(writer.path()).unwrap(), before);

        writer.append(&record("c", vec![5.0, 6.0], vec![])).unwrap();
        assert_eq!(lines(writer.path())[2], "scene/a,3,7,c,5.0,6.0");
    }

    #[test]
    fn separate_writers_share_one_header() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("out.csv");
        let first = DatasetWriter::with_path(&path);
        let second = DatasetWriter::with_path(&path);

        assert!(first.append(&record("a", vec![1.0], vec![])).unwrap().created);
        assert!(!second.append(&record("b", vec![2.0], vec![])).unwrap().created);
        assert_eq!(
            lines(&path),
            vec!["filename,x,y,label,band_0", "scene/a,3,7,a,1.0", "scene/a,3,7,b,2.0"]
        );
    }

    #[test]
    fn missing_directory_is_write_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let writer = DatasetWriter::with_path(tmp.path().join("no").join("out.csv"));
        let err = writer.append(&record("a", vec![1.0], vec![])).unwrap_err();
        assert!(matches!(err, DatasetError::WriteFailure { .. }));
    }

    #[test]
    fn format_float_matches_dataset_convention() {
        assert_eq!(format_float(450.0), "450.0");
        assert_eq!(format_float(0.1), "0.1");
        assert_eq!(format_float(-3.0), "-3.0");
        assert_eq!(format_float(1234.5678), "1234.5678");
        assert_eq!(format_float(0.0001), "0.0001");
        assert_eq!(format_float(1e15), "1000000000000000.0");
        assert_eq!(format_float(-0.0), "-0.0");
    }

    #[test]
    fn format_float_switches_to_exponent_at_the_edges() {
        assert_eq!(format_float(1e-5), "1e-05");
        assert_eq!(format_float(2.5e-7), "2.5e-07");
        assert_eq!(format_float(1e16), "1e+16");
        assert_eq!(format_float(1.2345678901234568e17), "1.2345678901234568e+17");
        assert_eq!(format_float(-3e120), "-3e+120");
    }

    #[test]
    fn format_float_spells_non_finite_values() {
        assert_eq!(format_float(f64::NAN), "nan");
        assert_eq!(format_float(f64::INFINITY), "inf");
        assert_eq!(format_float(f64::NEG_INFINITY), "-inf");
    }

    #[test]
    fn read_labels_returns_rows_in_order() {
        let tmp = tempfile::tempdir().unwrap();
        let writer = DatasetWriter::with_path(tmp.path().join("out.csv"));
        writer.append(&record("grass", vec![0.1], vec![])).unwrap();
        let mut second = record("soil", vec![0.2], vec![]);
        second.x = 10;
        writer.append(&second).unwrap();

        let points = read_labels(writer.path()).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[1].label, "soil");
        assert_eq!((points[1].x, points[1].y), (10, 7));
    }

    #[test]
    fn read_labels_of_missing_file_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(read_labels(&tmp.path().join("none.csv")).unwrap().is_empty());
    }

    #[test]
    fn read_labels_rejects_bad_coordinates() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("out.csv");
        std::fs::write(&path, "filename,x,y,label\na,one,2,b\n").unwrap();
        assert!(matches!(read_labels(&path), Err(DatasetError::Read { .. })));
    }
}
