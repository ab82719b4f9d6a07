//! Arguments shared by the subcommands.

use anyhow::{Result, bail};
use clap::Args;

use crate::models::{RoutingValues, parse_scalar};

/// How command results are printed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON
    #[default]
    Json,
    /// Human-readable summary
    Text,
}

/// Template plus routing values, as typed on the command line.
#[derive(Args, Debug, Clone)]
pub struct RoutingArgs {
    /// Data URL template, e.g. `/users/:userId/addresses/:addressId`.
    #[arg(value_name = "TEMPLATE")]
    pub template: String,

    /// Routing value as `name=value`; repeatable.
    ///
    /// Numbers and booleans keep their type, anything else is a string.
    #[arg(short = 'p', long = "param", value_name = "NAME=VALUE")]
    pub params: Vec<String>,

    /// Treat the last store as a list to query.
    #[arg(long)]
    pub list: bool,
}

impl RoutingArgs {
    /// Parse `--param` values into routing values.
    ///
    /// # Errors
    ///
    /// Fails on entries without `=` or with an empty name.
    pub fn routing_values(&self) -> Result<RoutingValues> {
        let mut values = RoutingValues::new();
        for param in &self.params {
            let Some((name, raw)) = param.split_once('=') else {
                bail!("Invalid parameter '{param}': expected NAME=VALUE");
            };
            let name = name.trim();
            if name.is_empty() {
                bail!("Invalid parameter '{param}': name is empty");
            }
            values.insert(name.to_string(), parse_scalar(raw));
        }
        Ok(values)
    }
}
