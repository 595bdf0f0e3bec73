mod config;

use std::fs;
use std::io::Read as _;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use torpedo_core::optimizer::OptimizerConfig;
use torpedo_parse::{parse_instance, write_instance};

use crate::config::{load_config, Config};

#[derive(Parser)]
#[command(name = "torpedo", about = "Blast-furnace to converter torpedo scheduling")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Override the config file otherwise looked up next to the instance
    /// file as `torpedo.toml`.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Parse and validate an instance, printing nothing on success.
    Parse { instance: Option<PathBuf> },
    /// Parse an instance and write it back out in canonical form.
    EchoIns { instance: Option<PathBuf> },
    /// Run the initial-solution search only, without local-search polish.
    InitialSolution { instance: Option<PathBuf> },
    /// Run the full pipeline: search, hill-climb, conflict resolution.
    Solve { instance: Option<PathBuf> },
    /// Run the full pipeline and print every torpedo's duty chain.
    PrintSolution { instance: Option<PathBuf> },
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}

fn resolve_config_path(explicit: &Option<PathBuf>, instance_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.clone());
    }
    instance_path.map(|p| p.with_file_name("torpedo.toml"))
}

/// Reads the instance from `path`, or from stdin when no path is given.
fn read_instance(path: &Option<PathBuf>) -> Result<torpedo_core::Instance> {
    let text = match path {
        Some(path) => fs::read_to_string(path).with_context(|| format!("reading instance file {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf).context("reading instance from stdin")?;
            buf
        }
    };
    let source = path.as_ref().map(|p| p.display().to_string()).unwrap_or_else(|| "<stdin>".to_string());
    parse_instance(&text).with_context(|| format!("parsing instance {source}"))
}

fn optimizer_config(config: &Config) -> OptimizerConfig {
    OptimizerConfig { lookahead_cap: config.lookahead_cap, allow_emergency_swap: config.emergency_swap_enabled }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Parse { instance } => {
            read_instance(&instance)?;
        }
        Command::EchoIns { instance } => {
            let instance = read_instance(&instance)?;
            print!("{}", write_instance(&instance));
        }
        Command::InitialSolution { instance: instance_path } => {
            let instance = read_instance(&instance_path)?;
            let (solution, matrix) =
                torpedo_core::initial_solution(&instance).context("initial-solution search failed")?;
            let summary = torpedo_report::build_summary(&instance, &solution, &matrix);
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::Solve { instance: instance_path } => {
            let config_path = resolve_config_path(&cli.config, instance_path.as_deref());
            let config = load_config(config_path.as_deref())?;
            let instance = read_instance(&instance_path)?;
            let (solution, matrix) = solve(&instance, &config)?;
            let summary = torpedo_report::build_summary(&instance, &solution, &matrix);
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::PrintSolution { instance: instance_path } => {
            let config_path = resolve_config_path(&cli.config, instance_path.as_deref());
            let config = load_config(config_path.as_deref())?;
            let instance = read_instance(&instance_path)?;
            let (solution, matrix) = solve(&instance, &config)?;
            let runs = torpedo_core::reconstruct_torpedo_runs(&instance, &solution, &matrix);
            let file_name = instance_path
                .as_ref()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "<stdin>".to_string());
            println!("{file_name}");
            println!("TeamsID=");
            println!("nbTorpedoes={}", runs.len());
            println!();
            print!("{}", torpedo_report::format_runs(&runs));
        }
    }

    Ok(())
}

fn solve(instance: &torpedo_core::Instance, config: &Config) -> Result<(torpedo_core::Solution, Vec<torpedo_core::ScheduleMap>)> {
    let (mut solution, mut matrix) =
        torpedo_core::initial_solution(instance).context("initial-solution search failed")?;
    torpedo_core::hill_climb(instance, &mut solution, &mut matrix, &optimizer_config(config));
    torpedo_core::resolve_conflicts(instance, &solution, &mut matrix).context("conflict resolution failed")?;
    Ok((solution, matrix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_path_defaults_next_to_instance() {
        let path = resolve_config_path(&None, Some(Path::new("/data/instances/foo.txt")));
        assert_eq!(path, Some(PathBuf::from("/data/instances/torpedo.toml")));
    }

    #[test]
    fn explicit_config_path_wins() {
        let explicit = Some(PathBuf::from("/etc/torpedo.toml"));
        let path = resolve_config_path(&explicit, Some(Path::new("/data/instances/foo.txt")));
        assert_eq!(path, Some(PathBuf::from("/etc/torpedo.toml")));
    }

    #[test]
    fn config_path_is_none_when_instance_came_from_stdin() {
        let path = resolve_config_path(&None, None);
        assert_eq!(path, None);
    }

    #[test]
    fn bail_helper_is_available() {
        fn always_fails() -> Result<()> {
            bail!("expected failure")
        }
        assert!(always_fails().is_err());
    }
}
