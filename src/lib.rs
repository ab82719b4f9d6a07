//! routeload - dependency resolution for data URL templates
//!
//! A view in a single-page application usually needs more than one record: an
//! address page needs the address and the user it belongs to. routeload
//! describes those needs with a *data URL template* such as
//! `/users/:userId/addresses/:addressId` and loads every record in it, even
//! when the router only knows some of the identifiers.
//!
//! # How it works
//!
//! - [`template`] parses the template into store/parameter pairs and seeds the
//!   identifiers known from routing
//! - [`resolver`] repeatedly fetches whatever it can, and discovers missing
//!   identifiers and embedded records in what comes back
//!   ([`resolver::inspect`])
//! - [`fetch`] supplies records: any closure works, and [`fetch::CachingFetcher`]
//!   is an HTTP client that shares in-flight and recent responses through a
//!   [`fetch::RequestCache`]
//!
//! Records follow one naming contract: a field named after a parameter
//! (`userId`) carries its identifier and a field named `userIdRecord` embeds
//! the whole record. See [`models`].
//!
//! # Example
//!
//! ```rust,no_run
//! use routeload::config::LoaderConfig;
//! use routeload::resolver::load;
//! use serde_json::json;
//! use std::collections::BTreeMap;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = LoaderConfig {
//!     base_url: "http://localhost:3000/stores".to_string(),
//!     ..LoaderConfig::default()
//! };
//! let fetcher = config.build_fetcher()?;
//! let routing = BTreeMap::from([("addressId".to_string(), json!(20))]);
//!
//! let result = load(
//!     "/users/:userId/addresses/:addressId",
//!     &routing,
//!     false,
//!     BTreeMap::new(),
//!     &fetcher,
//!     &config.resolve_options(),
//! )
//! .await?;
//! println!("{}", result.element_data());
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`cli`] - the `routeload` command
//! - [`config`] - `~/.routeload/config.toml`
//! - [`core`] - error types and user-facing error reporting
//! - [`constants`] - shared defaults

pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod fetch;
pub mod models;
pub mod resolver;
pub mod template;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
