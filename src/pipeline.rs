use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::data::{loader, reshape};
use crate::export;
use crate::plot::{histogram, violin, PlotStyle};

// ---------------------------------------------------------------------------
// Pipeline configuration
// ---------------------------------------------------------------------------

/// Everything one run needs: where to read, where to write, how to draw.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// ENVI binary or `.hdr` header.
    pub input: PathBuf,
    /// Output folder; files land in the working directory when `None`.
    pub out_dir: Option<PathBuf>,
    pub style: PlotStyle,
}

/// Paths of the files a run wrote.
#[derive(Debug, Clone, PartialEq)]
pub struct Outputs {
    pub histogram: PathBuf,
    pub violin_plot: PathBuf,
    pub summary: PathBuf,
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

/// Load the image and write the histogram, violin plot and summary CSV.
///
/// The long-format table is built once and shared by the violin plot and
/// the summary; the histogram works on the cube directly.
pub fn run(config: &PipelineConfig) -> Result<Outputs> {
    let out_dir = config.out_dir.as_deref();
    if let Some(dir) = out_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating output folder {}", dir.display()))?;
    }

    let (cube, index) = loader::load_file(&config.input)
        .with_context(|| format!("loading {}", config.input.display()))?;
    if index.has_dark_band() {
        log::info!("Dark band present; it is left out of the histogram only");
    }

    let table = reshape::reshape(&cube, &index);

    let histogram = histogram::render(&cube, &index, out_dir, &config.style)
        .context("rendering histogram")?;
    let violin_plot =
        violin::render(&table, out_dir, &config.style).context("rendering violin plot")?;
    let summary = export::export_summary(&table, out_dir).context("exporting summary")?;

    Ok(Outputs {
        histogram,
        violin_plot,
        summary,
    })
}

/// Turn free-form user input (possibly quoted, e.g. from drag and drop)
/// into a path.
pub fn parse_input_path(raw: &str) -> Option<PathBuf> {
    let trimmed = raw
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(Path::new(trimmed).to_path_buf())
    }
}
