//! Voxlate command-line entry point.

#![forbid(unsafe_code)]

use std::path::PathBuf;

use clap::Parser;

use voxlate_lib::app::AppController;
use voxlate_lib::commands::{self, Commands};

/// Offline multilingual text and voice translator
#[derive(Parser, Debug)]
#[command(name = "voxlate", version, about, long_about = None)]
struct Args {
    /// Directory holding config.toml, logs and installed packages
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let controller = AppController::new(args.data_dir)?;
    let mut stdout = std::io::stdout().lock();
    commands::run(&controller, args.command, args.json, &mut stdout)
}
