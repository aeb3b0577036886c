use palette::{Hsl, IntoColor, Srgb};
use plotters::style::RGBColor;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<RGBColor> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            to_rgb(rgb)
        })
        .collect()
}

fn to_rgb(color: Srgb) -> RGBColor {
    let c: Srgb<u8> = color.into_format();
    RGBColor(c.red, c.green, c.blue)
}

// ---------------------------------------------------------------------------
// Wavelength → colour
// ---------------------------------------------------------------------------

/// Visible range handled by [`wavelength_to_rgb`], in nanometres.
pub const VISIBLE_NM: std::ops::RangeInclusive<f64> = 380.0..=780.0;

/// Approximate perceived colour of monochromatic light.
///
/// Returns `None` outside [`VISIBLE_NM`].
pub fn wavelength_to_rgb(nm: f64) -> Option<RGBColor> {
    if !VISIBLE_NM.contains(&nm) {
        return None;
    }

    let (r, g, b) = match nm {
        w if w < 440.0 => (-(w - 440.0) / (440.0 - 380.0), 0.0, 1.0),
        w if w < 490.0 => (0.0, (w - 440.0) / (490.0 - 440.0), 1.0),
        w if w < 510.0 => (0.0, 1.0, -(w - 510.0) / (510.0 - 490.0)),
        w if w < 580.0 => ((w - 510.0) / (580.0 - 510.0), 1.0, 0.0),
        w if w < 645.0 => (1.0, -(w - 645.0) / (645.0 - 580.0), 0.0),
        _ => (1.0, 0.0, 0.0),
    };

    // Fade towards the edges of the visible range.
    let intensity = match nm {
        w if w < 420.0 => 0.3 + 0.7 * (w - 380.0) / (420.0 - 380.0),
        w if w > 700.0 => 0.3 + 0.7 * (780.0 - w) / (780.0 - 700.0),
        _ => 1.0,
    };

    let channel = |c: f64| ((c * intensity).powf(0.8)) as f32;
    Some(to_rgb(Srgb::new(channel(r), channel(g), channel(b))))
}

// ---------------------------------------------------------------------------
// Band colours
// ---------------------------------------------------------------------------

/// Colour for each band of a plot.
///
/// Visible wavelengths get their spectral colour; everything else
/// (UV, NIR, the dark band) takes the next colour of a generated palette.
pub fn band_colors(wavelengths: &[f64]) -> Vec<RGBColor> {
    let invisible = wavelengths
        .iter()
        .filter(|wl| !VISIBLE_NM.contains(*wl))
        .count();
    let mut palette = generate_palette(invisible).into_iter();

    wavelengths
        .iter()
        .map(|&wl| {
            wavelength_to_rgb(wl)
                .or_else(|| palette.next())
                .unwrap_or(RGBColor(128, 128, 128))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_requested_size() {
        assert!(generate_palette(0).is_empty());
        let colors = generate_palette(5);
        assert_eq!(colors.len(), 5);
        for (i, a) in colors.iter().enumerate() {
            for b in &colors[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn spectral_colours() {
        assert_eq!(wavelength_to_rgb(700.0), Some(RGBColor(255, 0, 0)));
        assert_eq!(wavelength_to_rgb(510.0), Some(RGBColor(0, 255, 0)));
        assert_eq!(wavelength_to_rgb(440.0), Some(RGBColor(0, 0, 255)));
        assert_eq!(wavelength_to_rgb(850.0), None);
        assert_eq!(wavelength_to_rgb(0.0), None);
    }

    #[test]
    fn invisible_bands_use_the_palette() {
        let colors = band_colors(&[0.0, 550.0, 850.0]);
        assert_eq!(colors.len(), 3);
        assert_eq!(colors[1], wavelength_to_rgb(550.0).unwrap());
        assert_ne!(colors[0], colors[2]);
    }
}
