//! `routeload parse`: print the parsed template and initial state.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::{OutputFormat, RoutingArgs};
use crate::models::render_id;
use crate::template;

/// Parse a template against routing values without fetching anything.
#[derive(Args, Debug)]
pub struct ParseCommand {
    #[command(flatten)]
    pub routing: RoutingArgs,

    #[arg(long, value_enum, default_value = "json")]
    pub format: OutputFormat,
}

impl ParseCommand {
    pub fn execute(self) -> Result<()> {
        println!("{}", self.render()?);
        Ok(())
    }

    /// The output of this command, as printed.
    pub fn render(&self) -> Result<String> {
        let routing = self.routing.routing_values()?;
        let context = template::parse(&self.routing.template, &routing, self.routing.list)?;

        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&context.describe())?),
            OutputFormat::Text => {
                let mut out = format!("{} {}", "Template:".bold(), context.template());
                for binding in context.bindings() {
                    let id = context
                        .id_value(&binding.store)
                        .map_or_else(|| "unknown".yellow().to_string(), render_id);
                    out.push_str(&format!("\n  {} :{} = {id}", binding.store.cyan(), binding.param));
                }
                if let Some(store) = context.list_store() {
                    out.push_str(&format!("\n  {} {store}", "list:".bold()));
                }
                Ok(out)
            }
        }
    }
}
