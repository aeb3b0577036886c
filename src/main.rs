mod color;
mod data;
mod export;
mod pipeline;
mod plot;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;

use pipeline::{parse_input_path, PipelineConfig};
use plot::Theme;

#[derive(Parser)]
#[command(name = "exposure-analysis")]
#[command(version, about = "Per-band histogram, violin plot and summary CSV for ENVI images", long_about = None)]
struct Cli {
    /// ENVI image (binary data or its .hdr header); prompted for when omitted
    #[arg(value_name = "IMAGE")]
    image: Option<PathBuf>,

    /// Output folder (defaults to the current directory)
    #[arg(short, long, value_name = "DIR")]
    out_dir: Option<PathBuf>,

    /// Plot theme
    #[arg(long, value_enum, default_value_t = Theme::DarkGrid)]
    style: Theme,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let input = match cli.image {
        Some(path) => path,
        None => prompt_for_path()?,
    };

    let config = PipelineConfig {
        input,
        out_dir: cli.out_dir,
        style: cli.style.to_style(),
    };
    let outputs = pipeline::run(&config)?;

    println!("Wrote {}", outputs.histogram.display());
    println!("Wrote {}", outputs.violin_plot.display());
    println!("Wrote {}", outputs.summary.display());
    Ok(())
}

/// Ask for the image path on stdin.
fn prompt_for_path() -> Result<PathBuf> {
    print!("Path to multispectral image: ");
    io::stdout().flush().context("flushing stdout")?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("reading image path from stdin")?;

    match parse_input_path(&line) {
        Some(path) => Ok(path),
        None => bail!("no image path given"),
    }
}
