//! Command-line interface for routeload.
//!
//! # Commands
//!
//! - `resolve` - load every record a template needs and print the result
//! - `parse` - show how a template and routing values are understood, without
//!   fetching anything
//!
//! # Global Options
//!
//! - `--verbose` / `-v`: debug logging, and every fetch logged at `info`
//! - `--quiet` / `-q`: errors only
//! - `--config` / `-c`: configuration file (see [`crate::config`])
//!
//! `RUST_LOG` takes precedence over both verbosity flags.
//!
//! # Examples
//!
//! ```bash
//! routeload resolve /users/:userId/addresses/:addressId -p addressId=20 \
//!     --base-url http://localhost:3000/stores
//! routeload resolve /users/:userId/addresses -p userId=10 --list --format text
//! routeload parse /users/:userId/addresses -p userId=10 --list
//! ```

mod common;
mod parse;
mod resolve;

pub use common::{OutputFormat, RoutingArgs};
pub use parse::ParseCommand;
pub use resolve::ResolveCommand;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Resolve data URL templates against REST stores.
#[derive(Parser, Debug)]
#[command(
    name = "routeload",
    about = "Resolve data URL templates against REST stores",
    version,
    long_about = "routeload loads the records a data URL template refers to, discovering \
                  missing identifiers from the records it has already fetched."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging and log every fetch.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to the configuration file.
    ///
    /// Defaults to `$ROUTELOAD_CONFIG`, then `~/.routeload/config.toml`.
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load every record a template needs.
    Resolve(ResolveCommand),

    /// Show the parsed template and initial identifiers.
    Parse(ParseCommand),
}

impl Cli {
    /// Run the selected command.
    ///
    /// Installs the log subscriber first, so call this once per process.
    pub async fn execute(self) -> Result<()> {
        init_logging(self.log_level());

        match self.command {
            Commands::Resolve(cmd) => cmd.execute(self.config, self.verbose).await,
            Commands::Parse(cmd) => cmd.execute(),
        }
    }

    /// Default log directive for the verbosity flags.
    #[must_use]
    pub const fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "warn"
        }
    }
}

/// Install a stderr `fmt` subscriber, honoring `RUST_LOG` when set.
pub fn init_logging(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
