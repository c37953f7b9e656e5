//! velociraptor-plot: render a set of configured plots from one catalogue.

use anyhow::{bail, Context};
use clap::builder::PossibleValuesParser;
use clap::Parser;
use std::path::PathBuf;
use tracing::Level;
use velociraptor_catalogue::autoplotter::{render_all, AutoPlotterConfig};
use velociraptor_catalogue::plot::SUPPORTED_FILE_TYPES;
use velociraptor_catalogue::Catalogue;

#[derive(Debug, Parser)]
#[command(name = "velociraptor-plot")]
#[command(about = "Plot quantities from a Velociraptor halo catalogue")]
#[command(version)]
struct Cli {
    /// TOML file describing the plots
    #[arg(short, long)]
    config: PathBuf,

    /// Velociraptor .properties file
    #[arg(short = 'p', long)]
    catalogue: PathBuf,

    /// Directory the plots are written to
    #[arg(short, long)]
    output: PathBuf,

    /// Output file extension
    #[arg(
        short,
        long,
        default_value = "svg",
        ignore_case = true,
        value_parser = PossibleValuesParser::new(SUPPORTED_FILE_TYPES.iter().copied())
    )]
    file_type: String,

    /// Log at debug level
    #[arg(short, long)]
    debug: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.debug { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).with_target(false).init();

    let config = AutoPlotterConfig::from_path(&cli.config)
        .with_context(|| format!("reading plot config {}", cli.config.display()))?;
    let catalogue = Catalogue::load(&cli.catalogue)
        .with_context(|| format!("opening catalogue {}", cli.catalogue.display()))?;
    std::fs::create_dir_all(&cli.output)
        .with_context(|| format!("creating output directory {}", cli.output.display()))?;

    tracing::info!(
        plots = config.len(),
        haloes = catalogue.number_of_haloes(),
        "rendering plots"
    );
    let results = render_all(&config, &catalogue, &cli.output, &cli.file_type);
    let failed: Vec<&str> = results
        .iter()
        .filter(|(_, r)| r.is_err())
        .map(|(name, _)| name.as_str())
        .collect();
    tracing::info!(
        written = results.len() - failed.len(),
        failed = failed.len(),
        "done"
    );
    if !results.is_empty() && failed.len() == results.len() {
        bail!("every plot failed: {}", failed.join(", "));
    }
    Ok(())
}
