//! ociofmt - command-line host for the import plugin
//!
//! Drives the read protocol the way an image editor would, lists the roles
//! of a color configuration and bakes preview artifacts.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use ociofmt_plugin::Role;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;

mod commands;

#[derive(Parser)]
#[command(name = "ociofmt")]
#[command(author, version, about = "Color-managed image import")]
#[command(long_about = "
Imports images through OCIO roles the way the host plugin does.

Examples:
  ociofmt import scan.dpx                       # Infer roles, import at 16 bits
  ociofmt import plate.hdr --output-role display -o plate.raw
  ociofmt import plate.png --depth 8 --input-role data
  ociofmt roles --config studio.ocio            # List roles and displays
  ociofmt preview scan.dpx --shader p.glsl --cube p.cube
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Also write logs to this file
    #[arg(long, global = true, value_name = "FILE")]
    log: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run prepare, start, continue and finish on a file
    #[command(visible_alias = "i")]
    Import(ImportArgs),

    /// List roles, their color spaces and the default display
    Roles(RolesArgs),

    /// Bake the preview shader and LUT for a role pair
    #[command(visible_alias = "p")]
    Preview(PreviewArgs),
}

#[derive(Args)]
struct ImportArgs {
    /// Input image
    input: PathBuf,

    /// Color configuration (default: $OCIO, then built-in)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Plugin settings YAML
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Input role, overriding the inferred one
    #[arg(long)]
    input_role: Option<Role>,

    /// Output role, overriding the inferred one
    #[arg(long)]
    output_role: Option<Role>,

    /// Host sample depth: 8, 16 or 32
    #[arg(short, long)]
    depth: Option<u32>,

    /// Write the handed-off buffer here
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct RolesArgs {
    /// Color configuration (default: $OCIO, then built-in)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Plugin settings YAML
    #[arg(short, long)]
    settings: Option<PathBuf>,
}

#[derive(Args)]
struct PreviewArgs {
    /// Input image
    input: PathBuf,

    /// Color configuration (default: $OCIO, then built-in)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Input role (default: inferred)
    #[arg(long)]
    input_role: Option<Role>,

    /// Output role (default: inferred)
    #[arg(long)]
    output_role: Option<Role>,

    /// Plugin settings YAML
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// LUT edge length (default: from settings)
    #[arg(short, long)]
    edge: Option<usize>,

    /// Shader mode: lut3d, analytic (default: from settings)
    #[arg(short, long)]
    mode: Option<String>,

    /// Write the fragment shader here
    #[arg(long)]
    shader: Option<PathBuf>,

    /// Write the LUT here as .cube
    #[arg(long)]
    cube: Option<PathBuf>,
}

fn init_logging(verbose: u8, log: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = match verbose {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        2.. => LevelFilter::TRACE,
    };
    let env_filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(filter.into())
        .from_env_lossy();

    let Some(path) = log else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
        return Ok(None);
    };

    let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let name = path
        .file_name()
        .with_context(|| format!("Invalid log file: {}", path.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_ansi(false)
        .with_writer(writer)
        .init();
    Ok(Some(guard))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // keep the guard alive so buffered lines reach the file
    let _guard = match init_logging(cli.verbose, cli.log.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{e:#}");
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Commands::Import(args) => commands::import::run(args, cli.verbose),
        Commands::Roles(args) => commands::roles::run(args, cli.verbose),
        Commands::Preview(args) => commands::preview::run(args, cli.verbose),
    };

    if let Err(e) = result {
        tracing::error!("{e:#}");
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
