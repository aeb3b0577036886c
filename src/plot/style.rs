use plotters::style::RGBColor;

// ---------------------------------------------------------------------------
// Plot styling passed explicitly to every renderer
// ---------------------------------------------------------------------------

/// Named look for the output charts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Theme {
    /// Grey plot area with white grid lines (default)
    #[default]
    #[value(name = "darkgrid")]
    DarkGrid,
    /// White plot area with light grey grid lines
    #[value(name = "whitegrid")]
    WhiteGrid,
}

impl Theme {
    pub fn to_style(self) -> PlotStyle {
        match self {
            Theme::DarkGrid => PlotStyle {
                panel: RGBColor(234, 234, 242),
                grid: RGBColor(255, 255, 255),
                ..PlotStyle::base()
            },
            Theme::WhiteGrid => PlotStyle {
                panel: RGBColor(255, 255, 255),
                grid: RGBColor(204, 204, 204),
                ..PlotStyle::base()
            },
        }
    }
}

/// Colours and geometry shared by the histogram and violin renderers.
#[derive(Clone, Debug, PartialEq)]
pub struct PlotStyle {
    /// Figure background.
    pub background: RGBColor,
    /// Plotting area background.
    pub panel: RGBColor,
    pub grid: RGBColor,
    /// Axis labels, captions and outlines.
    pub text: RGBColor,
    /// Fill colours cycled over categorical series.
    pub palette: Vec<RGBColor>,
    /// Image size in pixels.
    pub width: u32,
    pub height: u32,
    pub font_size: u32,
}

impl PlotStyle {
    fn base() -> Self {
        Self {
            background: RGBColor(255, 255, 255),
            panel: RGBColor(255, 255, 255),
            grid: RGBColor(204, 204, 204),
            text: RGBColor(38, 38, 38),
            palette: DEEP.to_vec(),
            width: 1000,
            height: 700,
            font_size: 16,
        }
    }

    /// Palette colour for the `i`-th series, wrapping around.
    pub fn series_color(&self, i: usize) -> RGBColor {
        if self.palette.is_empty() {
            return self.text;
        }
        self.palette[i % self.palette.len()]
    }
}

impl Default for PlotStyle {
    fn default() -> Self {
        Theme::default().to_style()
    }
}

/// Muted ten-colour qualitative palette.
const DEEP: [RGBColor; 10] = [
    RGBColor(76, 114, 176),
    RGBColor(221, 132, 82),
    RGBColor(85, 168, 104),
    RGBColor(196, 78, 82),
    RGBColor(129, 114, 179),
    RGBColor(147, 120, 96),
    RGBColor(218, 139, 195),
    RGBColor(140, 140, 140),
    RGBColor(204, 185, 116),
    RGBColor(100, 181, 205),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn themes_differ_only_in_panel_and_grid() {
        let dark = Theme::DarkGrid.to_style();
        let white = Theme::WhiteGrid.to_style();
        assert_ne!(dark.panel, white.panel);
        assert_eq!(dark.palette, white.palette);
        assert_eq!(PlotStyle::default(), dark);
    }

    #[test]
    fn series_colors_wrap() {
        let style = PlotStyle::default();
        assert_eq!(style.series_color(0), style.series_color(10));
        assert_ne!(style.series_color(0), style.series_color(1));
    }
}
