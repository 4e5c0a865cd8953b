// src/main.rs - Command line entry point for motion groups
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use probe_motion_rs::config::load_config;
use probe_motion_rs::group::MotionGroup;
use probe_motion_rs::transform::Direction;
use serde_json::json;
use std::error::Error;
use std::path::{Path, PathBuf};

/// Probe drive motion planner
#[derive(Parser, Debug)]
#[command(name = "probe-motion", about = "Build motion lists for probe drives and convert them to drive coordinates.")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the motion list
    List {
        config: PathBuf,
        /// Convert the list to drive coordinates first
        #[arg(long)]
        drive: bool,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Print mask statistics
    Mask {
        config: PathBuf,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Convert a single point
    Convert {
        config: PathBuf,
        #[arg(long, value_enum)]
        to: Target,
        /// Point coordinates, one per axis
        #[arg(required = true, allow_negative_numbers = true)]
        point: Vec<f64>,
    },
    /// Print the concrete configuration with presets expanded
    Export { config: PathBuf },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Target {
    Drive,
    Motion,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays machine readable
    let level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::List { config, drive, format } => {
            let group = build_group(&config)?;
            let points = if drive {
                group.drive_list()?
            } else {
                group.builder().motion_list().clone()
            };
            let axes: Vec<String> = match (drive, group.transform()) {
                (true, Some(t)) => t.axes().to_vec(),
                _ => group.builder().space().labels().iter().map(|l| l.to_string()).collect(),
            };
            match format {
                OutputFormat::Text => {
                    println!("# {}", axes.join(" "));
                    for point in points.iter() {
                        let row: Vec<String> = point.iter().map(|v| v.to_string()).collect();
                        println!("{}", row.join(" "));
                    }
                }
                OutputFormat::Json => {
                    let value = json!({
                        "name": group.name(),
                        "axes": axes,
                        "points": points.to_rows(),
                    });
                    println!("{}", serde_json::to_string_pretty(&value)?);
                }
            }
        }
        Commands::Mask { config, format } => {
            let group = build_group(&config)?;
            let builder = group.builder();
            let mask = builder.mask();
            match format {
                OutputFormat::Text => {
                    println!("motion group: {}", group.name());
                    println!("grid shape:   {:?}", mask.shape());
                    println!("allowed:      {} ({:.1}%)", mask.allowed_count(), 100.0 * mask.allowed_fraction());
                    println!("excluded:     {}", mask.excluded_count());
                    println!("motion list:  {} of {} candidates", builder.motion_list().len(), builder.candidate_count());
                }
                OutputFormat::Json => {
                    let value = json!({
                        "name": group.name(),
                        "shape": mask.shape(),
                        "allowed": mask.allowed_count(),
                        "excluded": mask.excluded_count(),
                        "allowed_fraction": mask.allowed_fraction(),
                        "motion_points": builder.motion_list().len(),
                        "candidates": builder.candidate_count(),
                    });
                    println!("{}", serde_json::to_string_pretty(&value)?);
                }
            }
        }
        Commands::Convert { config, to, point } => {
            let group = build_group(&config)?;
            let direction = match to {
                Target::Drive => Direction::ToDrive,
                Target::Motion => Direction::ToMotionSpace,
            };
            let converted = group.convert(&point, direction)?;
            let row: Vec<String> = converted.iter().map(|v| v.to_string()).collect();
            println!("{}", row.join(" "));
        }
        Commands::Export { config } => {
            let group = build_group(&config)?;
            print!("{}", group.config().to_toml_string()?);
        }
    }

    Ok(())
}

fn build_group(path: &Path) -> Result<MotionGroup, Box<dyn Error>> {
    tracing::info!("Loading configuration from: {}", path.display());
    let config = load_config(path)?;
    let group = MotionGroup::new(&config).map_err(|e| {
        tracing::error!("Failed to build motion group '{}': {}", config.name, e);
        e
    })?;
    Ok(group)
}
