use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use plotters::coord::combinators::{BindKeyPoints, WithKeyPoints};
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;

use super::{render_png, text_style, PlotStyle};
use crate::data::model::SampleTable;
use crate::data::stats::kde;
use crate::export::{output_path, VIOLIN_SUFFIX};

/// KDE evaluation points per violin.
pub const GRIDSIZE: usize = 20;
/// How many bandwidths the density extends past the data range.
pub const CUT: f64 = 2.0;
/// Outline width in pixels.
pub const LINE_WIDTH: u32 = 1;
/// Full width of the widest violin, in category units.
const VIOLIN_WIDTH: f64 = 0.8;

/// Outline of one violin in data units.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// `(value, half_width)` pairs along the value axis.
    Density(Vec<(f64, f64)>),
    /// All samples share one value: drawn as a horizontal line.
    Flat { value: f64, half_width: f64 },
    /// Every sample is NaN: nothing is drawn, the label is kept.
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Violin {
    pub wavelength: f64,
    pub count: usize,
    pub shape: Shape,
}

impl Violin {
    fn value_range(&self) -> (f64, f64) {
        match &self.shape {
            Shape::Density(points) => points
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &(v, _)| {
                    (lo.min(v), hi.max(v))
                }),
            Shape::Flat { value, .. } => (*value, *value),
            Shape::Empty => (f64::INFINITY, f64::NEG_INFINITY),
        }
    }
}

/// One violin per wavelength, ascending by wavelength.
///
/// Each density is normalised to its own peak and then scaled by the band's
/// sample count relative to the largest band, so the widest violin belongs
/// to the band with the most samples. NaN samples are not counted.
pub fn violins(table: &SampleTable) -> Vec<Violin> {
    let groups: Vec<(f64, Vec<f32>)> = table
        .groups()
        .into_iter()
        .map(|(wl, values)| (wl, values.into_iter().filter(|v| !v.is_nan()).collect()))
        .collect();
    let max_count = groups.iter().map(|(_, v)| v.len()).fold(1, usize::max) as f64;

    groups
        .into_iter()
        .map(|(wavelength, values)| {
            let count = values.len();
            let scale = count as f64 / max_count * VIOLIN_WIDTH / 2.0;
            let shape = match (kde(&values, GRIDSIZE, CUT), values.first()) {
                (Some(d), _) => {
                    let peak = d.density.iter().copied().fold(0.0f64, f64::max);
                    Shape::Density(
                        d.support
                            .into_iter()
                            .zip(d.density)
                            .map(|(v, dens)| (v, dens / peak * scale))
                            .collect(),
                    )
                }
                (None, Some(&value)) => Shape::Flat {
                    value: value as f64,
                    half_width: scale,
                },
                (None, None) => Shape::Empty,
            };
            Violin {
                wavelength,
                count,
                shape,
            }
        })
        .collect()
}

/// Category axis with violin `i` centred on `i` and one key point, hence one
/// label, per violin.
fn band_axis(n: usize) -> WithKeyPoints<RangedCoordf64> {
    let positions: Vec<f64> = (0..n).map(|i| i as f64).collect();
    (-0.5..(n as f64 - 0.5)).with_key_points(positions)
}

/// Write `<basename>_violin_plot.png` with one violin per band.
pub fn render(
    table: &SampleTable,
    out_dir: Option<&Path>,
    style: &PlotStyle,
) -> Result<PathBuf> {
    if table.is_empty() {
        bail!("no samples to plot");
    }
    let violins = violins(table);
    let path = output_path(out_dir, &table.basename, VIOLIN_SUFFIX);

    let (lo, hi) = violins
        .iter()
        .map(Violin::value_range)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (a, b)| {
            (lo.min(a), hi.max(b))
        });
    if lo > hi {
        bail!("no samples to plot besides NaN");
    }
    let pad = ((hi - lo) * 0.05).max(0.5);
    let y_range = (lo - pad)..(hi + pad);
    let x_range = band_axis(violins.len());

    let labels: Vec<String> = violins.iter().map(|v| format!("{}", v.wavelength)).collect();
    let label_at = |x: &f64| {
        let i = x.round();
        if (x - i).abs() > 1e-6 || i < 0.0 {
            return String::new();
        }
        labels.get(i as usize).cloned().unwrap_or_default()
    };

    render_png(&path, style, |root| {
        let mut chart = ChartBuilder::on(root)
            .margin(15)
            .x_label_area_size(50)
            .y_label_area_size(70)
            .build_cartesian_2d(x_range, y_range)?;

        chart.plotting_area().fill(&style.panel)?;
        chart
            .configure_mesh()
            .disable_x_mesh()
            .light_line_style(style.grid)
            .bold_line_style(style.grid)
            .axis_style(style.text)
            .x_label_formatter(&label_at)
            .label_style(text_style(style, 0.85))
            .axis_desc_style(text_style(style, 1.0))
            .x_desc("wavelength")
            .y_desc("value")
            .draw()?;

        let outline = style.text.stroke_width(LINE_WIDTH);
        for (i, violin) in violins.iter().enumerate() {
            let center = i as f64;
            match &violin.shape {
                Shape::Density(points) => {
                    let mut polygon: Vec<(f64, f64)> = points
                        .iter()
                        .map(|&(v, hw)| (center - hw, v))
                        .collect();
                    polygon.extend(points.iter().rev().map(|&(v, hw)| (center + hw, v)));

                    chart.draw_series(std::iter::once(Polygon::new(
                        polygon.clone(),
                        style.series_color(i).filled(),
                    )))?;
                    polygon.push(polygon[0]);
                    chart.draw_series(std::iter::once(PathElement::new(polygon, outline)))?;
                }
                Shape::Flat { value, half_width } => {
                    chart.draw_series(std::iter::once(PathElement::new(
                        vec![(center - half_width, *value), (center + half_width, *value)],
                        style.series_color(i).stroke_width(LINE_WIDTH + 1),
                    )))?;
                }
                Shape::Empty => {}
            }
        }
        Ok(())
    })?;

    log::info!(
        "Wrote violin plot of {} bands to {}",
        violins.len(),
        path.display()
    );
    Ok(path)
}

#[cfg(test)]
mod tests {
    use plotters::coord::ranged1d::BoldPoints;

    use super::*;

    fn table() -> SampleTable {
        let mut table = SampleTable {
            basename: "field_2".into(),
            ..Default::default()
        };
        // dark band: 4 constant samples; 500 nm: 8 samples; 600 nm: 4 samples
        for (wl, values) in [
            (0.0, vec![3.0; 4]),
            (600.0, vec![1.0, 2.0, 4.0, 8.0]),
            (500.0, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]),
        ] {
            table.wavelength.extend(std::iter::repeat(wl).take(values.len()));
            table.value.extend(values);
        }
        table
    }

    fn max_half_width(v: &Violin) -> f64 {
        match &v.shape {
            Shape::Density(points) => points.iter().map(|&(_, hw)| hw).fold(0.0, f64::max),
            Shape::Flat { half_width, .. } => *half_width,
            Shape::Empty => 0.0,
        }
    }

    #[test]
    fn one_violin_per_band_including_dark_band() {
        let violins = violins(&table());
        let wavelengths: Vec<f64> = violins.iter().map(|v| v.wavelength).collect();
        assert_eq!(wavelengths, vec![0.0, 500.0, 600.0]);
        assert_eq!(violins[0].shape, Shape::Flat { value: 3.0, half_width: 0.2 });
    }

    #[test]
    fn widths_scale_with_count() {
        let violins = violins(&table());
        assert!((max_half_width(&violins[1]) - 0.4).abs() < 1e-9);
        assert!((max_half_width(&violins[2]) - 0.2).abs() < 1e-9);
    }

    #[test]
    fn density_uses_fixed_grid() {
        let violins = violins(&table());
        match &violins[1].shape {
            Shape::Density(points) => {
                assert_eq!(points.len(), GRIDSIZE);
                assert!(points[0].0 < 1.0);
                assert!(points[GRIDSIZE - 1].0 > 8.0);
            }
            other => panic!("expected density, got {other:?}"),
        }
    }

    #[test]
    fn writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = render(&table(), Some(dir.path()), &PlotStyle::default()).unwrap();
        assert_eq!(path, dir.path().join("field_2_violin_plot.png"));
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn every_band_has_a_label_position() {
        for n in [1, 3, 7, 12, 25] {
            let expected: Vec<f64> = (0..n).map(|i| i as f64).collect();
            assert_eq!(band_axis(n).key_points(BoldPoints(5)), expected);
        }
    }

    #[test]
    fn nan_samples_are_skipped() {
        let mut table = table();
        table.wavelength.extend([500.0, 500.0, 700.0, 700.0]);
        table.value.extend([f32::NAN, f32::NAN, f32::NAN, f32::NAN]);

        let violins = violins(&table);
        assert_eq!(violins[1].count, 8);
        assert!(matches!(violins[1].shape, Shape::Density(_)));
        assert!((max_half_width(&violins[1]) - 0.4).abs() < 1e-9);
        assert_eq!(violins[3].wavelength, 700.0);
        assert_eq!(violins[3].count, 0);
        assert_eq!(violins[3].shape, Shape::Empty);
    }

    #[test]
    fn nan_band_still_renders() {
        let dir = tempfile::tempdir().unwrap();
        let mut table = table();
        table.wavelength.extend([700.0, 700.0]);
        table.value.extend([f32::NAN, f32::NAN]);
        assert!(render(&table, Some(dir.path()), &PlotStyle::default()).is_ok());
    }

    #[test]
    fn all_nan_table_is_an_error() {
        let table = SampleTable {
            wavelength: vec![500.0, 600.0],
            value: vec![f32::NAN, f32::NAN],
            basename: "blank".into(),
        };
        assert!(render(&table, None, &PlotStyle::default()).is_err());
    }

    #[test]
    fn empty_table_is_an_error() {
        assert!(render(&SampleTable::default(), None, &PlotStyle::default()).is_err());
    }
}
