// src/main.rs
use anyhow::Result;
use clap::Parser;
use colorful::Colorful;

use fourier_mixer::cli::{self, Args};

fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let summary = match cli::run(&args) {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red(), e);
            std::process::exit(1);
        }
    };

    if args.json {
        cli::print_json(&summary)?;
    } else {
        cli::print_summary(&summary, args.verbose > 0);
    }

    if !summary.success() {
        std::process::exit(2);
    }
    Ok(())
}
