//! Core types shared across routeload.
//!
//! Currently this is the error model: [`LoaderError`] for everything the
//! parser, resolver and configuration can report, and [`ErrorContext`] /
//! [`user_friendly_error`] for presenting failures on the command line.

pub mod error;

pub use error::{ErrorContext, LoaderError, user_friendly_error};
