#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays Geocoin in the terminal.

mod repl;
mod save_transfer;
mod session;

use std::{
    fs,
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::Parser;
use geocoin_core::GameConfig;
use geocoin_persistence::{reset, JsonFileStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{
    repl::{parse, ReplCommand},
    session::Session,
};

const DEFAULT_SAVE_PATH: &str = "geocoin-save.json";

/// Command-line arguments accepted by the Geocoin binary.
#[derive(Debug, Parser)]
#[command(name = "geocoin", about = "Collect location-bound tokens from caches on a world grid")]
struct CliArgs {
    /// TOML file overriding the default game configuration.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// JSON file the session is saved to.
    #[arg(long, value_name = "PATH", default_value = DEFAULT_SAVE_PATH)]
    save: PathBuf,

    /// Discard any saved session before starting.
    #[arg(long)]
    fresh: bool,
}

/// Entry point for the Geocoin command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let args = CliArgs::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => GameConfig::default(),
    };
    let mut store = JsonFileStore::open(&args.save)?;
    if args.fresh {
        reset(&mut store)?;
        tracing::info!(path = %args.save.display(), "discarded saved session");
    }

    let (mut session, greeting) = Session::start(config, Box::new(store));
    let stdout = io::stdout();
    let mut out = stdout.lock();
    print_lines(&mut out, &greeting)?;

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("failed to read input")?;
        match parse(&line) {
            Ok(None) => {}
            Ok(Some(ReplCommand::Quit)) => break,
            Ok(Some(command)) => print_lines(&mut out, &session.execute(command))?,
            Err(error) => writeln!(out, "{error}")?,
        }
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn load_config(path: &Path) -> Result<GameConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config: GameConfig = toml::from_str(&contents)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(config)
}

fn print_lines(out: &mut impl Write, lines: &[String]) -> io::Result<()> {
    for line in lines {
        writeln!(out, "{line}")?;
    }
    out.flush()
}
