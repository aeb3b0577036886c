use std::path::{Path, PathBuf};

use ndarray::{Array3, ArrayView2, Axis};
use serde::Serialize;

/// Wavelength label of the non-spectral dark reference band.
pub const DARK_BAND_WAVELENGTH: f64 = 0.0;

// ---------------------------------------------------------------------------
// ImageCube – the decoded sample array
// ---------------------------------------------------------------------------

/// A multispectral image held as `(rows, columns, bands)` `f32` samples.
#[derive(Debug, Clone)]
pub struct ImageCube {
    /// Sample data; the last axis is the band axis.
    pub data: Array3<f32>,
    /// Path of the binary data file the cube was read from.
    pub source: PathBuf,
}

impl ImageCube {
    pub fn new(data: Array3<f32>, source: impl Into<PathBuf>) -> Self {
        Self {
            data,
            source: source.into(),
        }
    }

    pub fn rows(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    pub fn columns(&self) -> usize {
        self.data.len_of(Axis(1))
    }

    pub fn bands(&self) -> usize {
        self.data.len_of(Axis(2))
    }

    /// Single band as a `(rows, columns)` view.
    pub fn band(&self, band: usize) -> ArrayView2<'_, f32> {
        self.data.index_axis(Axis(2), band)
    }

    /// File name of the source, used as the prefix of every output file.
    pub fn basename(&self) -> String {
        basename_of(&self.source)
    }
}

pub(crate) fn basename_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string())
}

// ---------------------------------------------------------------------------
// WavelengthIndex – band labels in band order
// ---------------------------------------------------------------------------

/// Ordered mapping from wavelength label (nm) to band index.
///
/// Position in the list is the band index, so the order always matches the
/// cube's band axis.
#[derive(Debug, Clone, PartialEq)]
pub struct WavelengthIndex {
    wavelengths: Vec<f64>,
}

impl WavelengthIndex {
    pub fn new(wavelengths: Vec<f64>) -> Self {
        Self { wavelengths }
    }

    pub fn len(&self) -> usize {
        self.wavelengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wavelengths.is_empty()
    }

    /// `(wavelength, band)` pairs in band order.
    pub fn iter(&self) -> impl Iterator<Item = (f64, usize)> + '_ {
        self.wavelengths.iter().enumerate().map(|(band, &wl)| (wl, band))
    }

    /// Band index for a wavelength label, if present.
    pub fn band_of(&self, wavelength: f64) -> Option<usize> {
        self.wavelengths.iter().position(|&wl| wl == wavelength)
    }

    pub fn has_dark_band(&self) -> bool {
        self.band_of(DARK_BAND_WAVELENGTH).is_some()
    }

    /// Every band except the dark reference band, in band order.
    pub fn spectral_bands(&self) -> Vec<(f64, usize)> {
        self.iter()
            .filter(|&(wl, _)| wl != DARK_BAND_WAVELENGTH)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// SampleTable – long-format (wavelength, value) rows
// ---------------------------------------------------------------------------

/// Long-format table with one row per pixel per band.
#[derive(Debug, Clone, Default)]
pub struct SampleTable {
    pub wavelength: Vec<f64>,
    pub value: Vec<f32>,
    /// Source file name the rows were derived from.
    pub basename: String,
}

impl SampleTable {
    pub fn len(&self) -> usize {
        self.value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = (f64, f32)> + '_ {
        self.wavelength.iter().copied().zip(self.value.iter().copied())
    }

    /// Values grouped by wavelength, groups sorted ascending by wavelength.
    pub fn groups(&self) -> Vec<(f64, Vec<f32>)> {
        let mut groups: Vec<(f64, Vec<f32>)> = Vec::new();
        for (wl, value) in self.rows() {
            // Rows are band-major, so the current group is almost always the last one.
            if let Some((key, values)) = groups.last_mut() {
                if *key == wl {
                    values.push(value);
                    continue;
                }
            }
            match groups.iter_mut().find(|(key, _)| *key == wl) {
                Some((_, values)) => values.push(value),
                None => groups.push((wl, vec![value])),
            }
        }
        groups.sort_by(|a, b| a.0.total_cmp(&b.0));
        groups
    }
}

// ---------------------------------------------------------------------------
// BandSummary – one row of the summary CSV
// ---------------------------------------------------------------------------

/// Descriptive statistics of one band.
///
/// `count` is the number of non-NaN samples. The statistics are `None` when
/// the band has no such samples and are written as empty CSV fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandSummary {
    pub wavelength: f64,
    pub count: usize,
    pub mean: Option<f64>,
    /// Sample standard deviation; `None` with fewer than two values.
    pub std: Option<f64>,
    pub min: Option<f64>,
    #[serde(rename = "25%")]
    pub p25: Option<f64>,
    #[serde(rename = "50%")]
    pub p50: Option<f64>,
    #[serde(rename = "75%")]
    pub p75: Option<f64>,
    #[serde(rename = "95%")]
    pub p95: Option<f64>,
    pub max: Option<f64>,
}
