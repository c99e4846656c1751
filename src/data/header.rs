use std::collections::BTreeMap;
use std::fmt;

use byteorder::{BigEndian, ByteOrder, LittleEndian, WriteBytesExt};

use crate::error::HeaderError;

// ---------------------------------------------------------------------------
// DataType – the ENVI `data type` code
// ---------------------------------------------------------------------------

/// Sample encoding of the raw file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    U8,
    I16,
    I32,
    F32,
    F64,
    U16,
    U32,
    I64,
    U64,
}

impl DataType {
    pub fn from_code(code: u32) -> Result<Self, HeaderError> {
        Ok(match code {
            1 => DataType::U8,
            2 => DataType::I16,
            3 => DataType::I32,
            4 => DataType::F32,
            5 => DataType::F64,
            12 => DataType::U16,
            13 => DataType::U32,
            14 => DataType::I64,
            15 => DataType::U64,
            other => return Err(HeaderError::UnsupportedDataType(other)),
        })
    }

    pub fn code(self) -> u32 {
        match self {
            DataType::U8 => 1,
            DataType::I16 => 2,
            DataType::I32 => 3,
            DataType::F32 => 4,
            DataType::F64 => 5,
            DataType::U16 => 12,
            DataType::U32 => 13,
            DataType::I64 => 14,
            DataType::U64 => 15,
        }
    }

    /// Bytes per sample.
    pub fn size(self) -> usize {
        match self {
            DataType::U8 => 1,
            DataType::I16 | DataType::U16 => 2,
            DataType::I32 | DataType::U32 | DataType::F32 => 4,
            DataType::F64 | DataType::I64 | DataType::U64 => 8,
        }
    }

    /// Decode one sample; `bytes` must hold at least `self.size()` bytes.
    pub fn decode(self, bytes: &[u8], endian: Endian) -> f64 {
        match endian {
            Endian::Little => self.decode_with::<LittleEndian>(bytes),
            Endian::Big => self.decode_with::<BigEndian>(bytes),
        }
    }

    fn decode_with<E: ByteOrder>(self, bytes: &[u8]) -> f64 {
        match self {
            DataType::U8 => bytes[0] as f64,
            DataType::I16 => E::read_i16(bytes) as f64,
            DataType::I32 => E::read_i32(bytes) as f64,
            DataType::F32 => E::read_f32(bytes) as f64,
            DataType::F64 => E::read_f64(bytes),
            DataType::U16 => E::read_u16(bytes) as f64,
            DataType::U32 => E::read_u32(bytes) as f64,
            DataType::I64 => E::read_i64(bytes) as f64,
            DataType::U64 => E::read_u64(bytes) as f64,
        }
    }

    /// Append one sample to `out`, saturating to the integer range.
    pub fn encode(self, value: f64, endian: Endian, out: &mut Vec<u8>) {
        match endian {
            Endian::Little => self.encode_with::<LittleEndian>(value, out),
            Endian::Big => self.encode_with::<BigEndian>(value, out),
        }
    }

    fn encode_with<E: ByteOrder>(self, value: f64, out: &mut Vec<u8>) {
        // Writes into a Vec cannot fail.
        let _ = match self {
            DataType::U8 => out.write_u8(value as u8),
            DataType::I16 => out.write_i16::<E>(value as i16),
            DataType::I32 => out.write_i32::<E>(value as i32),
            DataType::F32 => out.write_f32::<E>(value as f32),
            DataType::F64 => out.write_f64::<E>(value),
            DataType::U16 => out.write_u16::<E>(value as u16),
            DataType::U32 => out.write_u32::<E>(value as u32),
            DataType::I64 => out.write_i64::<E>(value as i64),
            DataType::U64 => out.write_u64::<E>(value as u64),
        };
    }
}

// ---------------------------------------------------------------------------
// Interleave / byte order
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interleave {
    /// Band sequential: one full plane per band.
    #[default]
    Bsq,
    /// Band interleaved by line.
    Bil,
    /// Band interleaved by pixel.
    Bip,
}

impl Interleave {
    pub fn parse(s: &str) -> Result<Self, HeaderError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bsq" => Ok(Interleave::Bsq),
            "bil" => Ok(Interleave::Bil),
            "bip" => Ok(Interleave::Bip),
            _ => Err(HeaderError::UnsupportedInterleave(s.trim().to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Interleave::Bsq => "bsq",
            Interleave::Bil => "bil",
            Interleave::Bip => "bip",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endian {
    #[default]
    Little,
    Big,
}

// ---------------------------------------------------------------------------
// EnviHeader
// ---------------------------------------------------------------------------

/// Parsed contents of an ENVI `.hdr` file.
#[derive(Debug, Clone, PartialEq)]
pub struct EnviHeader {
    /// Columns (image width).
    pub samples: usize,
    /// Rows (image height).
    pub lines: usize,
    pub bands: usize,
    /// Bytes to skip at the start of the raw file.
    pub header_offset: usize,
    pub data_type: DataType,
    pub interleave: Interleave,
    pub byte_order: Endian,
    pub wavelengths: Option<Vec<f64>>,
    pub wavelength_units: Option<String>,
    pub band_names: Option<Vec<String>>,
    pub description: Option<String>,
}

impl EnviHeader {
    /// Minimal header with defaults for everything but the shape.
    pub fn new(lines: usize, samples: usize, bands: usize, data_type: DataType) -> Self {
        Self {
            samples,
            lines,
            bands,
            header_offset: 0,
            data_type,
            interleave: Interleave::Bsq,
            byte_order: Endian::Little,
            wavelengths: None,
            wavelength_units: None,
            band_names: None,
            description: None,
        }
    }

    /// Size in bytes of the sample payload (excluding the header offset),
    /// or `None` when it does not fit in `usize`.
    pub fn data_len(&self) -> Option<usize> {
        self.lines
            .checked_mul(self.samples)?
            .checked_mul(self.bands)?
            .checked_mul(self.data_type.size())
    }

    /// Bytes the raw file must hold: offset plus payload.
    pub fn raw_len(&self) -> Option<usize> {
        self.header_offset.checked_add(self.data_len()?)
    }

    /// Index (in samples, not bytes) of row `r`, column `c`, band `b`.
    pub fn sample_index(&self, r: usize, c: usize, b: usize) -> usize {
        match self.interleave {
            Interleave::Bsq => (b * self.lines + r) * self.samples + c,
            Interleave::Bil => (r * self.bands + b) * self.samples + c,
            Interleave::Bip => (r * self.samples + c) * self.bands + b,
        }
    }

    pub fn parse(text: &str) -> Result<Self, HeaderError> {
        let fields = parse_fields(text)?;

        let samples = positive(&fields, "samples")?;
        let lines = positive(&fields, "lines")?;
        let bands = positive(&fields, "bands")?;

        let header_offset = match fields.get("header offset") {
            Some(v) => parse_number::<usize>("header offset", v)?,
            None => 0,
        };

        let code = fields
            .get("data type")
            .ok_or(HeaderError::MissingField("data type"))
            .and_then(|v| parse_number::<u32>("data type", v))?;
        let data_type = DataType::from_code(code)?;

        let interleave = match fields.get("interleave") {
            Some(v) => Interleave::parse(v)?,
            None => Interleave::default(),
        };

        let byte_order = match fields.get("byte order").map(|v| v.trim()) {
            None | Some("0") => Endian::Little,
            Some("1") => Endian::Big,
            Some(other) => {
                return Err(HeaderError::InvalidValue {
                    field: "byte order".into(),
                    value: other.into(),
                })
            }
        };

        let wavelengths = match fields.get("wavelength") {
            Some(v) => {
                let values = split_list(v)
                    .into_iter()
                    .map(|tok| parse_number::<f64>("wavelength", &tok))
                    .collect::<Result<Vec<_>, _>>()?;
                if values.len() != bands {
                    return Err(HeaderError::WavelengthCount {
                        bands,
                        found: values.len(),
                    });
                }
                Some(values)
            }
            None => None,
        };

        let header = EnviHeader {
            samples,
            lines,
            bands,
            header_offset,
            data_type,
            interleave,
            byte_order,
            wavelengths,
            wavelength_units: fields.get("wavelength units").map(|v| v.trim().to_string()),
            band_names: fields.get("band names").map(|v| split_list(v)),
            description: fields.get("description").map(|v| strip_braces(v).trim().to_string()),
        };
        if header.raw_len().is_none() {
            return Err(HeaderError::SizeOverflow {
                lines,
                samples,
                bands,
            });
        }
        Ok(header)
    }
}

impl fmt::Display for EnviHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ENVI")?;
        if let Some(desc) = &self.description {
            writeln!(f, "description = {{{desc}}}")?;
        }
        writeln!(f, "samples = {}", self.samples)?;
        writeln!(f, "lines = {}", self.lines)?;
        writeln!(f, "bands = {}", self.bands)?;
        writeln!(f, "header offset = {}", self.header_offset)?;
        writeln!(f, "file type = ENVI Standard")?;
        writeln!(f, "data type = {}", self.data_type.code())?;
        writeln!(f, "interleave = {}", self.interleave.as_str())?;
        let order = match self.byte_order {
            Endian::Little => 0,
            Endian::Big => 1,
        };
        writeln!(f, "byte order = {order}")?;
        if let Some(names) = &self.band_names {
            writeln!(f, "band names = {{{}}}", names.join(", "))?;
        }
        if let Some(units) = &self.wavelength_units {
            writeln!(f, "wavelength units = {units}")?;
        }
        if let Some(wl) = &self.wavelengths {
            let list: Vec<String> = wl.iter().map(|w| w.to_string()).collect();
            writeln!(f, "wavelength = {{{}}}", list.join(", "))?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Text helpers
// ---------------------------------------------------------------------------

/// Split the header into lower-cased `key → raw value` pairs, joining
/// brace-delimited values that span several lines.
fn parse_fields(text: &str) -> Result<BTreeMap<String, String>, HeaderError> {
    let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());

    match lines.next() {
        Some(first) if first.starts_with("ENVI") => {}
        _ => return Err(HeaderError::MissingMagic),
    }

    let mut fields = BTreeMap::new();
    while let Some(line) = lines.next() {
        if line.starts_with(';') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim().to_ascii_lowercase();
        let mut value = value.trim().to_string();

        if value.starts_with('{') {
            while !value.contains('}') {
                match lines.next() {
                    Some(more) => {
                        value.push(' ');
                        value.push_str(more);
                    }
                    None => return Err(HeaderError::UnterminatedBrace(key)),
                }
            }
        }
        fields.insert(key, value);
    }
    Ok(fields)
}

fn strip_braces(v: &str) -> &str {
    let v = v.trim();
    let v = v.strip_prefix('{').unwrap_or(v);
    v.strip_suffix('}').unwrap_or(v)
}

fn split_list(v: &str) -> Vec<String> {
    strip_braces(v)
        .split(',')
        .map(|tok| tok.trim().to_string())
        .filter(|tok| !tok.is_empty())
        .collect()
}

fn parse_number<T: std::str::FromStr>(field: &str, value: &str) -> Result<T, HeaderError> {
    value.trim().parse::<T>().map_err(|_| HeaderError::InvalidValue {
        field: field.to_string(),
        value: value.trim().to_string(),
    })
}

fn positive(fields: &BTreeMap<String, String>, field: &'static str) -> Result<usize, HeaderError> {
    let raw = fields.get(field).ok_or(HeaderError::MissingField(field))?;
    let n = parse_number::<usize>(field, raw)?;
    if n == 0 {
        return Err(HeaderError::InvalidValue {
            field: field.to_string(),
            value: raw.trim().to_string(),
        });
    }
    Ok(n)
}
