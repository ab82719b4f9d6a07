//! Integration test suite for routeload
//!
//! End-to-end tests of the public API and the `routeload` binary.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **scenarios**: resolution through the public API with an in-memory store
//! - **cache**: the resolver on top of `CachingFetcher` and `RequestCache`
//! - **cli**: the `routeload` command

mod cache;
mod cli;
mod scenarios;
