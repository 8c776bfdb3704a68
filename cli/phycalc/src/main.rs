//! phycalc CLI: browse parts and PHYs, calculate register values and export them.

mod commands;
mod config;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use phycalc_parts::GroupKind;
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

use commands::Session;
use config::ProjectConfig;

#[derive(Parser)]
#[command(name = "phycalc", version, about = "Radio PHY calculation and register synthesis")]
struct Cli {
    /// Part family (overrides phycalc.toml)
    #[arg(long, global = true)]
    family: Option<String>,
    /// Part revision (overrides phycalc.toml)
    #[arg(long, global = true)]
    revision: Option<String>,
    /// Build target name or tag (overrides phycalc.toml)
    #[arg(long, global = true)]
    target: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List part families and their revisions
    Parts,
    /// List the PHY library of the selected part
    Phys {
        /// Only PHYs of this group
        #[arg(long)]
        group: Option<String>,
        /// Only groups of this kind (customer, sim-tests, studio, non-functional)
        #[arg(long, value_parser = parse_group_kind)]
        kind: Option<GroupKind>,
    },
    /// Show a PHY's definition without calculating it
    Describe {
        /// PHY name or GUID
        phy: String,
    },
    /// Calculate one PHY and export its register values
    Calc {
        /// PHY name or GUID
        phy: String,
        /// Optional input, NAME=VALUE (repeatable)
        #[arg(long = "input", short = 'i')]
        inputs: Vec<String>,
        /// Output format (json, toml, text)
        #[arg(long)]
        format: Option<String>,
        /// Write to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
        /// Leave don't-care fields out of the export
        #[arg(long)]
        hide_do_not_care: bool,
    },
    /// Calculate a profile from its defaults and inputs, with no PHY
    CalcProfile {
        /// Profile name
        profile: String,
        /// Input, NAME=VALUE (repeatable); required profile inputs must be given
        #[arg(long = "input", short = 'i')]
        inputs: Vec<String>,
        /// Output format (json, toml, text)
        #[arg(long)]
        format: Option<String>,
        /// Write to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Calculate every PHY (or one group) in parallel
    Sweep {
        /// Only PHYs of this group
        #[arg(long)]
        group: Option<String>,
        /// Write one export per PHY into this directory
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Output format for written exports (json, toml, text)
        #[arg(long)]
        format: Option<String>,
    },
    /// Show a register map, or validate a .regmap.toml file
    Regmap {
        /// Register map file to validate instead of the part's own
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Write a phycalc.toml into the current directory
    Init,
}

fn main() {
    let cli = Cli::parse();

    let result = run(cli);
    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;
    let found = ProjectConfig::find_and_load(&cwd)?;
    let filter = found.as_ref().and_then(|(config, _)| config.log.filter.clone());
    init_logging(filter.as_deref());

    let (config, project_dir) = match found {
        Some((config, dir)) => {
            debug!(dir = %dir.display(), "using {}", config::CONFIG_FILE);
            (config, dir)
        }
        None => (ProjectConfig::default(), cwd.clone()),
    };

    let session = Session::resolve(config, project_dir, cli.family, cli.revision, cli.target)?;
    match cli.command {
        Commands::Parts => commands::parts::list(),
        Commands::Phys { group, kind } => commands::phys::list(&session, group.as_deref(), kind),
        Commands::Describe { phy } => commands::phys::describe(&session, &phy),
        Commands::Calc {
            phy,
            inputs,
            format,
            output,
            hide_do_not_care,
        } => commands::calc::run(
            &session,
            &phy,
            &inputs,
            format.as_deref(),
            output.as_deref(),
            hide_do_not_care,
        ),
        Commands::CalcProfile {
            profile,
            inputs,
            format,
            output,
        } => commands::calc_profile::run(&session, &profile, &inputs, format.as_deref(), output.as_deref()),
        Commands::Sweep {
            group,
            output_dir,
            format,
        } => commands::sweep::run(&session, group.as_deref(), output_dir.as_deref(), format.as_deref()),
        Commands::Regmap { file } => commands::regmap::run(&session, file.as_deref()),
        Commands::Init => commands::init::run(&cwd, &session.family, &session.revision),
    }
}

fn parse_group_kind(s: &str) -> Result<GroupKind, String> {
    s.parse().map_err(|e: phycalc_parts::PartsError| e.to_string())
}

/// `RUST_LOG` wins, then the config file's `[log] filter`, then `warn`.
fn init_logging(config_filter: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config_filter.unwrap_or("warn")))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
