//! Chart rendering: per-band histogram and violin plot, written as PNG.
//!
//! Charts are drawn by plotters into an in-memory RGB buffer and encoded
//! with `image`, so no system fonts or native libraries are needed.

pub mod histogram;
pub mod style;
pub mod violin;

use std::path::Path;
use std::sync::OnceLock;

use anyhow::{anyhow, Context, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::{register_font, FontStyle};

pub use style::{PlotStyle, Theme};

const FONT_FAMILY: &str = "sans-serif";
const FONT_BYTES: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");

/// Register the bundled font with plotters once per process.
fn ensure_font() -> Result<()> {
    static REGISTERED: OnceLock<std::result::Result<(), String>> = OnceLock::new();
    REGISTERED
        .get_or_init(|| {
            register_font(FONT_FAMILY, FontStyle::Normal, FONT_BYTES)
                .map_err(|_| "bundled font is not a valid TrueType font".to_string())
        })
        .clone()
        .map_err(|e| anyhow!(e))
}

/// Text style for labels in the style's text colour.
pub(crate) fn text_style(style: &PlotStyle, scale: f64) -> TextStyle<'static> {
    (FONT_FAMILY, style.font_size as f64 * scale)
        .into_font()
        .color(&style.text)
}

/// Draw a chart with `draw` and write it to `path` as PNG.
pub(crate) fn render_png<F>(path: &Path, style: &PlotStyle, draw: F) -> Result<()>
where
    F: FnOnce(&DrawingArea<BitMapBackend<'_>, Shift>) -> Result<()>,
{
    ensure_font()?;

    let (width, height) = (style.width, style.height);
    let mut buffer = vec![0u8; width as usize * height as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        root.fill(&style.background)?;
        draw(&root)?;
        root.present()?;
    }

    let rgb = image::RgbImage::from_raw(width, height, buffer)
        .context("plot buffer does not match the image size")?;
    rgb.save_with_format(path, image::ImageFormat::Png)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}
