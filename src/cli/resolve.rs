//! `routeload resolve`: load every record a template needs.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::{OutputFormat, RoutingArgs};
use crate::config::LoaderConfig;
use crate::core::LoaderError;
use crate::models::{Record, render_id};
use crate::resolver::{self, LoadResult};

/// Resolve a template against the configured stores.
#[derive(Args, Debug)]
pub struct ResolveCommand {
    #[command(flatten)]
    pub routing: RoutingArgs,

    /// Fetch every eligible store of a pass at once.
    #[arg(long)]
    pub concurrent: bool,

    /// Prefix of every store URL, overriding the configuration.
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// JSON object of records already at hand, keyed by parameter name.
    #[arg(long, value_name = "FILE")]
    pub preload: Option<PathBuf>,

    /// Lifetime of cached responses, overriding the configuration.
    #[arg(long, value_name = "MS")]
    pub cache_ttl_ms: Option<u64>,

    #[arg(long, value_enum, default_value = "json")]
    pub format: OutputFormat,
}

impl ResolveCommand {
    pub async fn execute(self, config_path: Option<PathBuf>, verbose: bool) -> Result<()> {
        let config = LoaderConfig::load_with_optional(config_path).await?;
        let config = self.apply_overrides(config, verbose)?;

        let routing = self.routing.routing_values()?;
        let preloaded = match &self.preload {
            Some(path) => read_preload(path).await?,
            None => BTreeMap::new(),
        };

        let fetcher = config.build_fetcher()?;
        let options = config.resolve_options();
        let result = resolver::load(
            &self.routing.template,
            &routing,
            self.routing.list,
            preloaded,
            &fetcher,
            &options,
        )
        .await?;

        println!("{}", render(&result, self.format)?);
        Ok(())
    }

    /// Layer the command-line flags over the file configuration.
    pub fn apply_overrides(&self, mut config: LoaderConfig, verbose: bool) -> Result<LoaderConfig> {
        if let Some(base_url) = &self.base_url {
            config.base_url.clone_from(base_url);
        }
        if let Some(ttl) = self.cache_ttl_ms {
            config.cache_ttl_ms = ttl;
        }
        config.concurrent |= self.concurrent;
        config.verbose |= verbose;

        let config = config.validate()?;
        if config.base_url.is_empty() {
            return Err(LoaderError::ConfigError {
                message: "base_url is not set; pass --base-url or set it in the config file"
                    .to_string(),
            }
            .into());
        }
        Ok(config)
    }
}

async fn read_preload(path: &Path) -> Result<BTreeMap<String, Record>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read preloaded records from {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| {
        format!("Preloaded records in {} must be a JSON object of records", path.display())
    })
}

/// Format a result for printing.
pub fn render(result: &LoadResult, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Text => {
            let mut out = format!("{} {}", "Fetches:".bold(), result.fetch_count);
            for (store, id) in &result.resolved_id_values {
                out.push_str(&format!("\n  {} = {}", store.cyan(), render_id(id)));
            }
            for (field, record) in &result.loaded_records {
                out.push_str(&format!("\n  {}: {record}", field.green()));
            }
            if let (Some(store), Some(records)) = (result.list_store(), &result.list_records) {
                out.push_str(&format!("\n  {} {store}: {} record(s)", "list".bold(), records.len()));
            }
            Ok(out)
        }
    }
}
