//! routeload - resolve data URL templates against REST stores
//!
//! This is the entry point for the command-line tool. Parsing happens here;
//! everything else lives in the [`routeload::cli`] module.

use anyhow::Result;
use clap::Parser;
use routeload::cli;
use routeload::core::user_friendly_error;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    // Set up colored output for Windows
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute().await {
        Ok(()) => Ok(()),
        Err(e) => {
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}
