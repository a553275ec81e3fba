use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use serde::Serialize;

use lnp_grid::data::export::write_gathered_parquet;
use lnp_grid::data::loader::{load_noise_grid, load_physics_grid, load_sample_store};
use lnp_grid::{run_pipeline, run_pipeline_ordered, GridConfig};

#[derive(Parser)]
#[command(name = "lnp-grid")]
#[command(about = "Gather model-grid parameters at sparse log-likelihood samples")]
#[command(version)]
struct Cli {
    /// Sparse sample store (.parquet or .json)
    #[arg(long)]
    samples: PathBuf,

    /// Physics model grid (.parquet or .csv)
    #[arg(long)]
    physics: PathBuf,

    /// Noise model grid (.parquet)
    #[arg(long)]
    noise: PathBuf,

    /// JSON run configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of objects the sample store must hold
    #[arg(long)]
    expected_objects: Option<usize>,

    /// Parameters to gather, overriding the configuration (comma separated)
    #[arg(long, value_delimiter = ',')]
    parameters: Option<Vec<String>>,

    /// Text file with one object key per line; fixes the column order
    #[arg(long)]
    keys: Option<PathBuf>,

    /// Gather parameters sequentially
    #[arg(long)]
    sequential: bool,

    /// Long-format Parquet output. Without it only a JSON summary is printed.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Serialize)]
struct Summary<'a> {
    n_objects: usize,
    n_samples: usize,
    shift: f64,
    parameters: Vec<&'a str>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => GridConfig::from_json_file(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => GridConfig::default(),
    };
    if let Some(parameters) = cli.parameters.clone() {
        config.parameters = parameters;
    }
    if cli.expected_objects.is_some() {
        config.expected_objects = cli.expected_objects;
    }
    if cli.sequential {
        config.parallel = false;
    }

    let samples = load_sample_store(&cli.samples)
        .with_context(|| format!("loading samples from {}", cli.samples.display()))?;
    let physics = load_physics_grid(&cli.physics)
        .with_context(|| format!("loading physics grid from {}", cli.physics.display()))?;
    let noise = load_noise_grid(&cli.noise)
        .with_context(|| format!("loading noise grid from {}", cli.noise.display()))?;

    let product = match &cli.keys {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading key list {}", path.display()))?;
            let keys: Vec<String> = text
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(String::from)
                .collect();
            run_pipeline_ordered(&samples, &physics, &noise, &keys, &config)
        }
        None => run_pipeline(&samples, &physics, &noise, &config),
    }
    .context("gathering model-grid parameters")?;
    drop((samples, physics, noise));

    if let Some(output) = &cli.output {
        write_gathered_parquet(output, &product)
            .with_context(|| format!("writing {}", output.display()))?;
        info!("wrote {}", output.display());
    }

    let summary = Summary {
        n_objects: product.likelihood.n_objects(),
        n_samples: product.likelihood.n_samples(),
        shift: product.likelihood.shift,
        parameters: product.gathered.keys().map(String::as_str).collect(),
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
