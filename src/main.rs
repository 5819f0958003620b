//! memsim - Interactive Memory-Hierarchy Simulator
//!
//! Reads commands from standard input and drives one simulation session:
//! an allocator over a fixed address space backing a chain of
//! set-associative caches.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use memsim::repl::{Repl, Response};
use memsim::{Session, SessionConfig};

// =============================================================================
// CLI Arguments
// =============================================================================

/// Interactive memory-hierarchy simulator
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Session configuration file (JSON); without one, use `init memory`
    /// interactively
    #[arg(long, env = "MEMSIM_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "warn")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,
}

// =============================================================================
// Main
// =============================================================================

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_logging(&args);

    let mut repl = match &args.config {
        Some(path) => {
            let config = SessionConfig::from_json_file(path)
                .with_context(|| format!("loading configuration from {}", path.display()))?;
            info!(path = %path.display(), "session configured from file");
            Repl::with_session(Session::new(&config)?)
        }
        None => Repl::new(),
    };

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    prompt(&mut stdout)?;
    for line in stdin.lock().lines() {
        let line = line.context("reading from standard input")?;
        match repl.handle_line(&line) {
            Response::Message(message) => println!("{message}"),
            Response::Silent => {}
            Response::Quit => break,
        }
        prompt(&mut stdout)?;
    }

    Ok(())
}

fn prompt(stdout: &mut io::Stdout) -> io::Result<()> {
    write!(stdout, "> ")?;
    stdout.flush()
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .init();
    }
}
