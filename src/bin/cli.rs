use std::path::PathBuf;

use clap::Parser;
use harvestforge::{ConfigError, PolicyMode, SimConfig, SimError, World, format_hud, format_side_panel};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
enum CliError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Sim(#[from] SimError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Run the farm headless and print where it ended up.
#[derive(Parser, Debug)]
#[command(name = "harvestforge", version, about = "Headless farm simulation run")]
struct Cli {
    /// Number of ticks to run
    #[arg(short, long, default_value = "200")]
    ticks: u64,

    /// JSON config file; flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Policy mode: basic, broadcast or systematic
    #[arg(short, long)]
    policy: Option<PolicyMode>,

    #[arg(long)]
    scouts: Option<u32>,

    #[arg(long)]
    pickers: Option<u32>,

    /// Upper bound on clusters planted at setup
    #[arg(long)]
    clusters: Option<u32>,

    #[arg(long)]
    seed: Option<u64>,

    /// Print the final snapshot as JSON instead of the HUD
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn build_config(&self) -> Result<SimConfig, CliError> {
        let mut cfg = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| CliError::Io {
                    path: path.clone(),
                    source,
                })?;
                SimConfig::from_json_str(&text)?
            }
            None => SimConfig::default(),
        };
        if let Some(policy) = self.policy {
            cfg.policy = policy;
        }
        if let Some(n) = self.scouts {
            cfg.num_scouts = n;
        }
        if let Some(n) = self.pickers {
            cfg.num_pickers = n;
        }
        if let Some(n) = self.clusters {
            cfg.num_resource_cells = n;
        }
        if let Some(seed) = self.seed {
            cfg.seed = Some(seed);
        }
        Ok(cfg)
    }
}

fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.build_config()?;
    let mut world = World::new(config)?;
    world.run(cli.ticks)?;
    info!(ticks = world.tick(), "run finished");

    let snap = world.snapshot();
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&snap)?);
    } else {
        println!("{}", format_hud(&snap.harvest, snap.tick, snap.policy));
        for line in format_side_panel(&snap) {
            println!("{line}");
        }
    }
    Ok(())
}
