use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use ndarray::Array3;
use thiserror::Error;

use super::model::{ImageCube, WavelengthIndex};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Everything that can go wrong while reading an ENVI image.
#[derive(Debug, Error)]
pub enum EnviError {
    #[error("reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no ENVI header found for {}", .0.display())]
    MissingHeader(PathBuf),
    #[error("header does not start with `ENVI`")]
    NotEnvi,
    #[error("header is missing required key `{0}`")]
    MissingKey(&'static str),
    #[error("header key `{key}` has invalid value `{value}`")]
    InvalidValue { key: String, value: String },
    #[error("header value for `{0}` opens `{{` but never closes it")]
    UnterminatedValue(String),
    #[error("unsupported ENVI data type {0}")]
    UnsupportedDataType(u32),
    #[error("unsupported interleave `{0}`")]
    UnsupportedInterleave(String),
    #[error("header lists {found} wavelengths for {bands} bands")]
    WavelengthCount { found: usize, bands: usize },
    #[error("wavelength {0} is listed more than once")]
    DuplicateWavelength(f64),
    #[error("image of {lines} x {samples} x {bands} samples does not fit in memory")]
    DataTooLarge {
        samples: usize,
        lines: usize,
        bands: usize,
    },
    #[error("data file holds {found} bytes, expected at least {expected}")]
    ShortData { expected: usize, found: usize },
}

type Result<T> = std::result::Result<T, EnviError>;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load an ENVI image from either its binary data file or its `.hdr` header.
///
/// Returns the cube (cast to `f32`) and the wavelength of every band.
pub fn load_file(path: &Path) -> Result<(ImageCube, WavelengthIndex)> {
    let (data_path, header_path) = resolve_paths(path)?;
    log::debug!(
        "ENVI pair: data={} header={}",
        data_path.display(),
        header_path.display()
    );

    let text = std::fs::read_to_string(&header_path).map_err(|source| EnviError::Io {
        path: header_path.clone(),
        source,
    })?;
    let header = EnviHeader::parse(&text)?;
    if let Some(description) = &header.description {
        log::debug!("Description: {description}");
    }
    if let Some(units) = &header.wavelength_units {
        if !matches!(units.to_ascii_lowercase().as_str(), "nm" | "nanometers") {
            log::warn!("Wavelength units are `{units}`; band labels are used as given");
        }
    }

    let bytes = std::fs::read(&data_path).map_err(|source| EnviError::Io {
        path: data_path.clone(),
        source,
    })?;
    let data = header.decode(&bytes)?;

    log::info!(
        "Loaded {}: {} rows x {} columns x {} bands ({:?}, {:?})",
        data_path.display(),
        header.lines,
        header.samples,
        header.bands,
        header.data_type,
        header.interleave,
    );

    Ok((
        ImageCube::new(data, data_path),
        WavelengthIndex::new(header.wavelengths),
    ))
}

/// Work out the `(data, header)` file pair for a user supplied path.
///
/// A `.hdr` path has its suffix stripped to find the binary; a binary path
/// looks for `<path>.hdr` first and `<stem>.hdr` second.
pub fn resolve_paths(path: &Path) -> Result<(PathBuf, PathBuf)> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "hdr" => Ok((data_path_for_header(path), path.to_path_buf())),
        _ => {
            let appended = PathBuf::from(format!("{}.hdr", path.display()));
            let replaced = path.with_extension("hdr");
            let header = [appended, replaced]
                .into_iter()
                .find(|p| p.is_file())
                .ok_or_else(|| EnviError::MissingHeader(path.to_path_buf()))?;
            Ok((path.to_path_buf(), header))
        }
    }
}

/// Extensions ENVI writers commonly give the binary next to a `.hdr`.
const DATA_EXTENSIONS: &[&str] = &["raw", "img", "dat", "bsq", "bil", "bip"];

fn data_path_for_header(header: &Path) -> PathBuf {
    let stripped = header.with_extension("");
    if stripped.is_file() {
        return stripped;
    }
    DATA_EXTENSIONS
        .iter()
        .map(|ext| header.with_extension(ext))
        .find(|p| p.is_file())
        .unwrap_or(stripped)
}

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

/// ENVI sample encodings (the header's `data type` code).
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
    pub fn from_code(code: u32) -> Result<Self> {
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
            other => return Err(EnviError::UnsupportedDataType(other)),
        })
    }

    /// Bytes per sample.
    pub fn size(self) -> usize {
        match self {
            DataType::U8 => 1,
            DataType::I16 | DataType::U16 => 2,
            DataType::I32 | DataType::U32 | DataType::F32 => 4,
            DataType::I64 | DataType::U64 | DataType::F64 => 8,
        }
    }

    /// Decode one sample; `chunk` must be exactly `self.size()` bytes.
    fn read(self, chunk: &[u8], order: ByteOrder) -> f32 {
        macro_rules! read_as {
            ($t:ty, $n:literal) => {{
                let mut buf = [0u8; $n];
                buf.copy_from_slice(chunk);
                match order {
                    ByteOrder::Little => <$t>::from_le_bytes(buf) as f32,
                    ByteOrder::Big => <$t>::from_be_bytes(buf) as f32,
                }
            }};
        }

        match self {
            DataType::U8 => chunk[0] as f32,
            DataType::I16 => read_as!(i16, 2),
            DataType::U16 => read_as!(u16, 2),
            DataType::I32 => read_as!(i32, 4),
            DataType::U32 => read_as!(u32, 4),
            DataType::F32 => read_as!(f32, 4),
            DataType::I64 => read_as!(i64, 8),
            DataType::U64 => read_as!(u64, 8),
            DataType::F64 => read_as!(f64, 8),
        }
    }
}

/// Sample layout in the binary file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interleave {
    /// Band sequential: band, row, column.
    Bsq,
    /// Band interleaved by line: row, band, column.
    Bil,
    /// Band interleaved by pixel: row, column, band.
    Bip,
}

impl Interleave {
    fn parse(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "bsq" => Ok(Interleave::Bsq),
            "bil" => Ok(Interleave::Bil),
            "bip" => Ok(Interleave::Bip),
            _ => Err(EnviError::UnsupportedInterleave(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    Little,
    Big,
}

/// The fields of an ENVI header this tool needs.
#[derive(Debug, Clone)]
pub struct EnviHeader {
    pub samples: usize,
    pub lines: usize,
    pub bands: usize,
    pub header_offset: usize,
    pub data_type: DataType,
    pub interleave: Interleave,
    pub byte_order: ByteOrder,
    pub wavelengths: Vec<f64>,
    pub wavelength_units: Option<String>,
    pub description: Option<String>,
}

impl EnviHeader {
    /// Parse header text.
    ///
    /// Layout:
    /// ```text
    /// ENVI
    /// samples = 640
    /// lines = 480
    /// bands = 3
    /// data type = 1
    /// wavelength = { 0.0, 500.0,
    ///   600.0 }
    /// ```
    pub fn parse(text: &str) -> Result<Self> {
        let fields = parse_fields(text)?;

        let samples = required(&fields, "samples")?;
        let lines = required(&fields, "lines")?;
        let bands = required(&fields, "bands")?;
        let data_type = DataType::from_code(required(&fields, "data type")?)?;

        let header_offset = match fields.get("header offset") {
            Some(v) => parse_number("header offset", v)?,
            None => 0,
        };
        let interleave = match fields.get("interleave") {
            Some(v) => Interleave::parse(v)?,
            None => Interleave::Bsq,
        };
        let byte_order = match fields.get("byte order").map(String::as_str) {
            None | Some("0") => ByteOrder::Little,
            Some("1") => ByteOrder::Big,
            Some(other) => {
                return Err(EnviError::InvalidValue {
                    key: "byte order".into(),
                    value: other.into(),
                })
            }
        };

        let raw_wavelengths = fields
            .get("wavelength")
            .ok_or(EnviError::MissingKey("wavelength"))?;
        let wavelengths = parse_wavelengths(raw_wavelengths)?;
        if wavelengths.len() != bands {
            return Err(EnviError::WavelengthCount {
                found: wavelengths.len(),
                bands,
            });
        }

        let header = EnviHeader {
            samples,
            lines,
            bands,
            header_offset,
            data_type,
            interleave,
            byte_order,
            wavelengths,
            wavelength_units: fields.get("wavelength units").cloned(),
            description: fields.get("description").cloned(),
        };
        header.data_len()?;
        log::debug!("ENVI header: {header:?}");
        Ok(header)
    }

    /// Number of bytes of sample data the header promises.
    pub fn data_len(&self) -> Result<usize> {
        self.samples
            .checked_mul(self.lines)
            .and_then(|n| n.checked_mul(self.bands))
            .and_then(|n| n.checked_mul(self.data_type.size()))
            .ok_or(EnviError::DataTooLarge {
                samples: self.samples,
                lines: self.lines,
                bands: self.bands,
            })
    }

    /// Decode the binary file into a `(lines, samples, bands)` cube.
    pub fn decode(&self, bytes: &[u8]) -> Result<Array3<f32>> {
        let expected = self
            .data_len()?
            .checked_add(self.header_offset)
            .ok_or(EnviError::InvalidValue {
                key: "header offset".into(),
                value: self.header_offset.to_string(),
            })?;
        if bytes.len() < expected {
            return Err(EnviError::ShortData {
                expected,
                found: bytes.len(),
            });
        }
        if bytes.len() > expected {
            log::warn!(
                "Ignoring {} trailing bytes after the image data",
                bytes.len() - expected
            );
        }

        let payload = &bytes[self.header_offset..expected];
        let values: Vec<f32> = payload
            .chunks_exact(self.data_type.size())
            .map(|chunk| self.data_type.read(chunk, self.byte_order))
            .collect();

        let (lines, samples, bands) = (self.lines, self.samples, self.bands);
        let cube = Array3::from_shape_fn((lines, samples, bands), |(row, col, band)| {
            let offset = match self.interleave {
                Interleave::Bsq => (band * lines + row) * samples + col,
                Interleave::Bil => (row * bands + band) * samples + col,
                Interleave::Bip => (row * samples + col) * bands + band,
            };
            values[offset]
        });
        Ok(cube)
    }
}

// -- Header helpers --

/// Split header text into lower-cased `key → value` pairs.
/// Brace-delimited values may span lines; the braces are stripped.
fn parse_fields(text: &str) -> Result<BTreeMap<String, String>> {
    let mut lines = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with(';'));

    if lines.next() != Some("ENVI") {
        return Err(EnviError::NotEnvi);
    }

    let mut fields = BTreeMap::new();
    while let Some(line) = lines.next() {
        let Some((key, value)) = line.split_once('=') else {
            log::debug!("Skipping header line without `=`: {line}");
            continue;
        };
        let key = key.trim().to_ascii_lowercase();
        let mut value = value.trim().to_string();

        if value.starts_with('{') {
            while !value.contains('}') {
                let next = lines
                    .next()
                    .ok_or_else(|| EnviError::UnterminatedValue(key.clone()))?;
                value.push(' ');
                value.push_str(next);
            }
            value = value
                .trim_start_matches('{')
                .trim_end_matches('}')
                .trim()
                .to_string();
        }

        fields.insert(key, value);
    }
    Ok(fields)
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| EnviError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn required<T: FromStr>(fields: &BTreeMap<String, String>, key: &'static str) -> Result<T> {
    let value = fields.get(key).ok_or(EnviError::MissingKey(key))?;
    parse_number(key, value)
}

fn parse_wavelengths(value: &str) -> Result<Vec<f64>> {
    let mut wavelengths: Vec<f64> = Vec::new();
    for token in value.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let wl: f64 = token.parse().map_err(|_| EnviError::InvalidValue {
            key: "wavelength".into(),
            value: token.to_string(),
        })?;
        if wavelengths.contains(&wl) {
            return Err(EnviError::DuplicateWavelength(wl));
        }
        wavelengths.push(wl);
    }
    Ok(wavelengths)
}
