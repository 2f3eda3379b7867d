use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use pipe_map::{Generator, Grid, GridState, Settings, server};
use rand::{SeedableRng, rngs::StdRng};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Pipe map generator.
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Config {
    /// YAML settings file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[clap(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate one map and print it.
    Generate {
        #[arg(short, long)]
        width: Option<usize>,

        #[arg(short = 'H', long)]
        height: Option<usize>,

        #[arg(short, long)]
        seed: Option<u64>,

        #[arg(short, long)]
        attempts: Option<usize>,

        /// Also write the map to this file, or to the configured export path.
        #[arg(short, long, num_args = 0..=1)]
        output: Option<Option<PathBuf>>,

        #[arg(short, long)]
        progress: bool,
    },
    /// Serve a freshly generated map on every `GET /`.
    Serve {
        #[arg(short, long)]
        address: Option<String>,
    },
    /// Check an exported map for half-open pipes.
    Verify { path: PathBuf },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn generate(
    mut settings: Settings,
    width: Option<usize>,
    height: Option<usize>,
    seed: Option<u64>,
    attempts: Option<usize>,
    output: Option<Option<PathBuf>>,
    progress: bool,
) -> Result<()> {
    settings.width = width.unwrap_or(settings.width);
    settings.height = height.unwrap_or(settings.height);
    settings.max_attempts = attempts.unwrap_or(settings.max_attempts);
    settings.validate()?;

    let seed = seed.or(settings.seed).unwrap_or_else(rand::random);
    tracing::info!(
        width = settings.width,
        height = settings.height,
        seed,
        "generating"
    );

    let mut rng = StdRng::seed_from_u64(seed);
    let grid = Generator::from_settings(&settings)
        .with_progress(progress)
        .generate(&mut rng)
        .with_context(|| format!("Seed {seed}"))?;
    print!("{grid}");

    if let Some(path) = output {
        let path = path.unwrap_or(settings.export_path);
        grid.export_text(&path)?;
        tracing::info!(path = %path.display(), "saved map");
    }
    Ok(())
}

fn verify(path: &Path) -> Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read map '{}'", path.display()))?;
    let grid: Grid = text.parse()?;

    if grid.state() != GridState::Resolved {
        bail!("Map '{}' has uncollapsed cells", path.display());
    }
    let mismatches = grid.mismatches();
    for m in &mismatches {
        tracing::warn!(
            "({}, {}) {} ({}, {}) do not connect",
            m.position.0,
            m.position.1,
            m.direction,
            m.neighbour.0,
            m.neighbour.1
        );
    }
    if !mismatches.is_empty() {
        bail!("{} half-open edges", mismatches.len());
    }
    println!(
        "{}: {}x{} map, every edge connects",
        path.display(),
        grid.width(),
        grid.height()
    );
    Ok(())
}

fn main() -> Result<()> {
    let config = Config::parse();
    init_logging(config.verbose);

    let settings = match &config.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    tracing::debug!("{settings:?}");

    match config.command {
        Command::Generate {
            width,
            height,
            seed,
            attempts,
            output,
            progress,
        } => generate(settings, width, height, seed, attempts, output, progress),
        Command::Serve { address } => {
            let mut settings = settings;
            if let Some(address) = address {
                settings.address = address;
            }
            settings.validate()?;
            server::serve(&settings)
        }
        Command::Verify { path } => verify(&path),
    }
}
