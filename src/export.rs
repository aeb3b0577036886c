use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::data::model::{BandSummary, SampleTable};
use crate::data::stats;

pub const HISTOGRAM_SUFFIX: &str = "_hist.png";
pub const VIOLIN_SUFFIX: &str = "_violin_plot.png";
pub const SUMMARY_SUFFIX: &str = "_summary.csv";

/// `<out_dir>/<basename><suffix>`, or just the file name without an output folder.
pub fn output_path(out_dir: Option<&Path>, basename: &str, suffix: &str) -> PathBuf {
    let filename = format!("{basename}{suffix}");
    match out_dir {
        Some(dir) => dir.join(filename),
        None => PathBuf::from(filename),
    }
}

// ---------------------------------------------------------------------------
// Summary CSV
// ---------------------------------------------------------------------------

/// Compute the per-band summary of `table` and write `<basename>_summary.csv`.
pub fn export_summary(table: &SampleTable, out_dir: Option<&Path>) -> Result<PathBuf> {
    let rows = stats::summarize(table);
    let path = output_path(out_dir, &table.basename, SUMMARY_SUFFIX);

    let file = std::fs::File::create(&path)
        .with_context(|| format!("creating {}", path.display()))?;
    write_summary(&rows, file).with_context(|| format!("writing {}", path.display()))?;

    log::info!("Wrote {} band summaries to {}", rows.len(), path.display());
    Ok(path)
}

/// Serialize summaries as CSV: a header row, then one row per band.
pub fn write_summary<W: Write>(rows: &[BandSummary], writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(row).context("serializing band summary")?;
    }
    wtr.flush().context("flushing CSV")?;
    Ok(())
}
