//! keyhold - a command line client for a remote credential-management
//! service.
//!
//! Logs in with the OAuth password grant, keeps the session between runs,
//! and fetches or deletes named credentials.

mod cli;
mod commands;
mod prompt;

use std::ffi::OsString;
use std::io;
use std::process::ExitCode;

use clap::Parser;
use keyhold_core::ConfigStore;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::Cli;

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

/// Parse the command line. Usage errors exit 1 like any other failure; help
/// and version output still exit 0.
fn parse_cli<I, T>(args: I) -> Result<Cli, ExitCode>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match Cli::try_parse_from(args) {
        Ok(cli) => Ok(cli),
        Err(e) if e.use_stderr() => {
            let _ = e.print();
            Err(ExitCode::FAILURE)
        }
        Err(e) => e.exit(),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();

    let cli = match parse_cli(std::env::args_os()) {
        Ok(cli) => cli,
        Err(code) => return code,
    };

    let result = match ConfigStore::from_env() {
        Ok(store) => commands::run(cli.command, &store).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
