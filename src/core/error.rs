//! Error handling for routeload
//!
//! This module provides the error types raised while turning a data URL template
//! into hydrated records, and the user-friendly reporting used by the CLI. The
//! error system follows two principles:
//! 1. **Strongly-typed errors** so callers can react to each failure precisely
//! 2. **User-friendly messages** with actionable suggestions for CLI users
//!
//! # Architecture
//!
//! - [`LoaderError`] - Enumerated error types for every failure of a resolution call
//! - [`ErrorContext`] - Wrapper that adds suggestions and details for display
//!
//! # Error Categories
//!
//! - **Template**: [`LoaderError::OrphanParameter`], [`LoaderError::InvalidListTemplate`],
//!   [`LoaderError::InvalidTemplate`]
//! - **Resolution**: [`LoaderError::UnresolvableReference`], [`LoaderError::MissingIdentifier`]
//! - **Network**: [`LoaderError::FetchFailed`]
//! - **Configuration**: [`LoaderError::ConfigError`]
//!
//! None of these are retried. A resolution call either returns a complete
//! [`LoadResult`](crate::resolver::LoadResult) or fails with one of them.
//!
//! # Examples
//!
//! ```rust,no_run
//! use routeload::core::{LoaderError, user_friendly_error};
//!
//! let error = LoaderError::UnresolvableReference {
//!     stores: vec!["users".to_string()],
//! };
//! let ctx = user_friendly_error(anyhow::Error::from(error));
//! ctx.display(); // Shows colored error with suggestions
//! ```

use crate::fetch::FetchError;
use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for routeload operations
///
/// Each variant names one way a resolution call can fail. Parser variants are
/// raised before any network traffic happens; engine variants abort the call
/// and discard everything loaded so far.
///
/// # Examples
///
/// ```rust,no_run
/// use routeload::core::LoaderError;
///
/// fn describe(error: &LoaderError) -> &'static str {
///     match error {
///         LoaderError::OrphanParameter { .. } => "bad template",
///         LoaderError::FetchFailed { .. } => "network",
///         _ => "other",
///     }
/// }
/// ```
#[derive(Error, Debug, Clone)]
pub enum LoaderError {
    /// A parameter token is not preceded by a store token
    ///
    /// Templates such as `/users/:userId/:addressId` cannot be resolved because
    /// `addressId` has no store to be looked up in.
    #[error("Parameter '{param}' doesn't have a corresponding store in template {template}")]
    OrphanParameter {
        /// Name of the parameter without the `:` prefix
        param: String,
        /// The template that was being parsed
        template: String,
    },

    /// List mode was requested but the template ends with a parameter
    #[error("In list templates the last segment must be a store, not a parameter: {template}")]
    InvalidListTemplate {
        /// The template that was being parsed
        template: String,
    },

    /// The template is structurally invalid
    #[error("Invalid data URL template {template}: {reason}")]
    InvalidTemplate {
        /// The template that was being parsed
        template: String,
        /// Why the template was rejected
        reason: String,
    },

    /// A pass found nothing to fetch while some identifiers are still unknown
    ///
    /// # Fields
    /// - `stores`: every store whose id is unknown and whose record is missing,
    ///   in scan order
    #[error("Not enough information to resolve the template, no id for stores: {}", stores.join(", "))]
    UnresolvableReference {
        /// Stores that could not be resolved
        stores: Vec<String>,
    },

    /// A fetch in the current batch failed
    #[error("Failed to fetch '{store}' from {url}")]
    FetchFailed {
        /// Store the failed request belonged to
        store: String,
        /// URL that was requested, after the URL hook ran
        url: String,
        /// The original failure reported by the fetcher
        #[source]
        source: FetchError,
    },

    /// Records were loaded but some identifiers were never discovered
    #[error("Loading successful, but ids missing for stores: {}", stores.join(", "))]
    MissingIdentifier {
        /// Stores whose identifier is still unknown
        stores: Vec<String>,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the configuration error
        message: String,
    },

    /// Other error
    #[error("{message}")]
    Other {
        /// Generic error message
        message: String,
    },
}

/// Error context wrapper that provides user-friendly error information
///
/// When displayed, errors show:
/// 1. **Error**: The main error message in red
/// 2. **Details**: Additional context in yellow (optional)
/// 3. **Suggestion**: Actionable steps in green (optional)
///
/// # Examples
///
/// ```rust,no_run
/// use routeload::core::{ErrorContext, LoaderError};
///
/// let context = ErrorContext::new(LoaderError::InvalidListTemplate {
///     template: "/users/:userId".to_string(),
/// })
/// .with_suggestion("Drop the trailing parameter or run without --list");
///
/// context.display();
/// ```
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: LoaderError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details.
    #[must_use]
    pub const fn new(error: LoaderError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Display the error context to stderr with terminal colors
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error to a user-friendly [`ErrorContext`] with actionable suggestions
///
/// Recognizes [`LoaderError`] (anywhere in the chain), [`FetchError`],
/// [`toml::de::Error`] and [`std::io::Error`]; anything else is reported with
/// its full cause chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(loader_error) = error.chain().find_map(|e| e.downcast_ref::<LoaderError>()) {
        return create_error_context(loader_error.clone());
    }

    if let Some(fetch_error) = error.downcast_ref::<FetchError>() {
        return ErrorContext::new(LoaderError::Other {
            message: fetch_error.to_string(),
        })
        .with_suggestion("Check that the store server is running and the base URL is correct");
    }

    if let Some(toml_error) = error.chain().find_map(|e| e.downcast_ref::<toml::de::Error>()) {
        return ErrorContext::new(LoaderError::ConfigError {
            message: toml_error.to_string(),
        })
        .with_suggestion("Check the TOML syntax in your routeload configuration file")
        .with_details("Configuration is read from --config, ROUTELOAD_CONFIG or ~/.routeload/config.toml");
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        if io_error.kind() == std::io::ErrorKind::NotFound {
            return ErrorContext::new(LoaderError::Other {
                message: error.to_string(),
            })
            .with_suggestion("Check that the file exists and the path is correct");
        }
    }

    let mut message = error.to_string();
    let chain: Vec<String> = error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(LoaderError::Other {
        message,
    })
}

fn create_error_context(error: LoaderError) -> ErrorContext {
    match &error {
        LoaderError::OrphanParameter {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Every ':param' segment must directly follow a store segment, e.g. /users/:userId")
            .with_details("Parameters are looked up in the store named by the segment before them"),
        LoaderError::InvalidListTemplate {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("End the template with the store to list (e.g. /users/:userId/addresses) or drop --list"),
        LoaderError::InvalidTemplate {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Templates look like /store/:param/store/:param with unique store names"),
        LoaderError::UnresolvableReference {
            stores,
        } => {
            let params = stores.join(", ");
            ErrorContext::new(error.clone())
                .with_suggestion("Pass the missing ids with -p name=value, or make the loaded records carry them")
                .with_details(format!(
                    "No routing value and no loaded record provided an id for: {params}"
                ))
        }
        LoaderError::FetchFailed {
            source,
            ..
        } => {
            let details = source.to_string();
            ErrorContext::new(error.clone())
                .with_suggestion("Check that the store server is running and the base URL is correct")
                .with_details(details)
        }
        LoaderError::MissingIdentifier {
            ..
        } => ErrorContext::new(error).with_details(
            "A record was supplied for a store (embedded or preloaded) but its id was never found",
        ),
        LoaderError::ConfigError {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Check the values in your routeload configuration file"),
        LoaderError::Other {
            ..
        } => ErrorContext::new(error),
    }
}
