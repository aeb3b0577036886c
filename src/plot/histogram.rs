use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use plotters::prelude::*;

use super::{render_png, text_style, PlotStyle};
use crate::color::band_colors;
use crate::data::model::{ImageCube, WavelengthIndex};
use crate::data::stats::Histogram;
use crate::export::{output_path, HISTOGRAM_SUFFIX};

/// Bins per band.
pub const BINS: usize = 50;

/// Histogram of one band.
#[derive(Debug, Clone)]
pub struct BandHistogram {
    pub wavelength: f64,
    pub histogram: Histogram,
}

/// Bin every spectral band over the common value range of those bands.
///
/// The dark band is left out. Fails when no spectral band remains or the
/// bands hold no finite samples.
pub fn band_histograms(cube: &ImageCube, index: &WavelengthIndex) -> Result<Vec<BandHistogram>> {
    let bands = index.spectral_bands();
    if bands.is_empty() {
        bail!("no spectral bands to plot besides the dark band");
    }

    let (lower, upper) = bands
        .iter()
        .flat_map(|&(_, band)| cube.band(band).into_iter().copied())
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v as f64), hi.max(v as f64))
        });
    if lower > upper {
        bail!("spectral bands contain no finite samples");
    }

    Ok(bands
        .into_iter()
        .map(|(wavelength, band)| BandHistogram {
            wavelength,
            histogram: Histogram::new(cube.band(band).iter().copied(), BINS, lower, upper),
        })
        .collect())
}

/// Write `<basename>_hist.png`: one line per spectral band showing the
/// share of pixels in each intensity bin.
pub fn render(
    cube: &ImageCube,
    index: &WavelengthIndex,
    out_dir: Option<&Path>,
    style: &PlotStyle,
) -> Result<PathBuf> {
    let histograms = band_histograms(cube, index)?;
    let path = output_path(out_dir, &cube.basename(), HISTOGRAM_SUFFIX);

    let wavelengths: Vec<f64> = histograms.iter().map(|h| h.wavelength).collect();
    let colors = band_colors(&wavelengths);

    let first = &histograms[0].histogram;
    let x_range = first.edges[0]..first.edges[BINS];
    let y_max = histograms
        .iter()
        .flat_map(|h| h.histogram.percentages())
        .fold(0.0f64, f64::max)
        .max(1.0)
        * 1.05;

    render_png(&path, style, |root| {
        let mut chart = ChartBuilder::on(root)
            .caption(
                format!("{}: pixel intensity histogram", cube.basename()),
                text_style(style, 1.25),
            )
            .margin(15)
            .x_label_area_size(50)
            .y_label_area_size(70)
            .build_cartesian_2d(x_range, 0.0..y_max)?;

        chart.plotting_area().fill(&style.panel)?;
        chart
            .configure_mesh()
            .light_line_style(style.grid)
            .bold_line_style(style.grid)
            .axis_style(style.text)
            .label_style(text_style(style, 0.85))
            .axis_desc_style(text_style(style, 1.0))
            .x_desc("Pixel intensity")
            .y_desc("Proportion of pixels (%)")
            .draw()?;

        for (h, &color) in histograms.iter().zip(&colors) {
            let points = h
                .histogram
                .centers()
                .into_iter()
                .zip(h.histogram.percentages());
            chart
                .draw_series(LineSeries::new(points, color.stroke_width(2)))?
                .label(format!("{} nm", h.wavelength))
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                });
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(style.background.mix(0.85))
            .border_style(style.text)
            .label_font(text_style(style, 0.8))
            .draw()?;
        Ok(())
    })?;

    log::info!(
        "Wrote histogram of {} bands to {}",
        histograms.len(),
        path.display()
    );
    Ok(path)
}

#[cfg(test)]
mod tests {
    use ndarray::Array3;

    use super::*;

    fn cube(wavelengths: Vec<f64>) -> (ImageCube, WavelengthIndex) {
        let bands = wavelengths.len();
        // dark band is far outside the spectral range
        let data = Array3::from_shape_fn((4, 5, bands), |(r, c, b)| {
            if b == 0 {
                -1000.0
            } else {
                (r * 5 + c + b) as f32
            }
        });
        (ImageCube::new(data, "scan_3"), WavelengthIndex::new(wavelengths))
    }

    #[test]
    fn dark_band_is_excluded() {
        let (cube, index) = cube(vec![0.0, 500.0, 600.0]);
        let hists = band_histograms(&cube, &index).unwrap();

        let wavelengths: Vec<f64> = hists.iter().map(|h| h.wavelength).collect();
        assert_eq!(wavelengths, vec![500.0, 600.0]);

        // range comes from the spectral bands only
        let edges = &hists[0].histogram.edges;
        assert_eq!(edges.len(), BINS + 1);
        assert!((edges[0] - 1.0).abs() < 1e-9);
        assert!((edges[BINS] - 21.0).abs() < 1e-9);
        for h in &hists {
            assert_eq!(h.histogram.counts.iter().sum::<usize>(), 20);
        }
    }

    #[test]
    fn without_dark_band_every_band_is_kept() {
        let (cube, index) = cube(vec![450.0, 500.0]);
        let hists = band_histograms(&cube, &index).unwrap();
        assert_eq!(hists.len(), 2);
    }

    #[test]
    fn only_dark_band_is_an_error() {
        let (cube, index) = cube(vec![0.0]);
        assert!(band_histograms(&cube, &index).is_err());
    }

    #[test]
    fn writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let (cube, index) = cube(vec![0.0, 500.0, 900.0]);
        let path = render(&cube, &index, Some(dir.path()), &PlotStyle::default()).unwrap();

        assert_eq!(path, dir.path().join("scan_3_hist.png"));
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }
}
