use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use log::info;
use rayon::prelude::*;
use vibspec::{Config, Output};

/// vibrational spectra from response tensors
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML job files. Jobs run in parallel, but their results are printed
    /// in the order given here
    #[arg(value_parser, required = true)]
    infiles: Vec<PathBuf>,

    /// Write each result as a line of JSON for use by other programs
    #[arg(short, long, default_value_t = false)]
    json: bool,

    /// Print the configuration and the resonances found along with each
    /// result
    #[arg(short, long, default_value_t = false, conflicts_with = "json")]
    verbose: bool,

    /// Set the maximum number of threads to use. Defaults to 0, which means
    /// to use as many threads as there are CPUs.
    #[arg(short, long, default_value_t = 0)]
    threads: usize,
}

fn job(path: &Path) -> anyhow::Result<(Config, Output)> {
    let config = Config::load(path)
        .with_context(|| format!("failed to load {}", path.display()))?;
    info!("starting {}", path.display());
    let output = vibspec::run(&config, &config.constants())
        .with_context(|| format!("failed to run {}", path.display()))?;
    Ok((config, output))
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    rayon::ThreadPoolBuilder::new()
        .num_threads(args.threads)
        .build_global()
        .context("failed to initialize the thread pool")?;

    let results: Vec<_> = args.infiles.par_iter().map(|p| job(p)).collect();

    let mut failed = 0;
    for (path, res) in args.infiles.iter().zip(results) {
        match res {
            Ok((config, output)) => {
                if args.json {
                    println!("{}", serde_json::to_string(&output)?);
                    continue;
                }
                println!("{}", path.display());
                if args.verbose {
                    println!("{config}");
                }
                println!("{output}");
                if args.verbose {
                    println!("{}", output.resonance_report());
                }
            }
            Err(e) => {
                failed += 1;
                eprintln!("{e:#}");
            }
        }
    }
    if failed > 0 {
        anyhow::bail!("{failed} of {} jobs failed", args.infiles.len());
    }
    Ok(())
}
