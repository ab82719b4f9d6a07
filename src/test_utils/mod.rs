//! Test utilities for routeload
//!
//! This module provides helpers for writing resolver tests without a server:
//! - [`MockStore`]: an in-memory set of REST stores that counts and records
//!   every request it serves
//! - [`init_test_logging`]: one-time tracing setup that plays well with the
//!   test harness
//!
//! # Example
//!
//! ```rust,no_run
//! use routeload::resolver::{ResolveOptions, load};
//! use routeload::test_utils::MockStore;
//! use serde_json::json;
//! use std::collections::BTreeMap;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let store = MockStore::new("http://localhost:3000/stores")
//!     .with_record("users/10", json!({ "id": 10, "name": "Jane" }));
//!
//! let routing = BTreeMap::from([("userId".to_string(), json!(10))]);
//! let options = ResolveOptions::new(store.base_url());
//! load("/users/:userId", &routing, false, BTreeMap::new(), &store, &options).await?;
//!
//! assert!(store.requested("users/10"));
//! # Ok(())
//! # }
//! ```

use futures::future::BoxFuture;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, Once};
use std::time::Duration;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::fetch::{FetchError, Fetcher};
use crate::models::Record;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. Uses `level` when given, otherwise
/// `RUST_LOG` when set, otherwise leaves logging off.
///
/// ```bash
/// RUST_LOG=routeload=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .try_init();
    });
}

#[derive(Debug, Clone)]
enum Response {
    Record(Record),
    Status(u16),
}

/// In-memory stores keyed by URL path below a base URL.
///
/// Unknown URLs answer with a 404 [`FetchError::Status`].
#[derive(Debug)]
pub struct MockStore {
    base_url: String,
    responses: HashMap<String, Response>,
    latency: Option<Duration>,
    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            responses: HashMap::new(),
            latency: None,
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Serve `record` for `base_url/path`. `path` may carry a query string.
    #[must_use]
    pub fn with_record(mut self, path: &str, record: Record) -> Self {
        self.responses.insert(self.url(path), Response::Record(record));
        self
    }

    /// Fail requests for `base_url/path` with `status`.
    #[must_use]
    pub fn with_failure(mut self, path: &str, status: u16) -> Self {
        self.responses.insert(self.url(path), Response::Status(status));
        self
    }

    /// Delay every response. Combine with paused tokio time.
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Every URL requested so far, in request order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls().len()
    }

    /// Whether `base_url/path` was requested at least once.
    pub fn requested(&self, path: &str) -> bool {
        let url = self.url(path);
        self.calls().iter().any(|call| *call == url)
    }

    /// Highest number of requests that were pending at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

impl Fetcher for MockStore {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Record, FetchError>> {
        Box::pin(async move {
            if let Ok(mut calls) = self.calls.lock() {
                calls.push(url.to_string());
            }
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            if let Some(latency) = self.latency {
                tokio::time::sleep(latency).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            match self.responses.get(url) {
                Some(Response::Record(record)) => Ok(record.clone()),
                Some(Response::Status(status)) => Err(FetchError::Status {
                    url: url.to_string(),
                    status: *status,
                }),
                None => Err(FetchError::Status {
                    url: url.to_string(),
                    status: 404,
                }),
            }
        })
    }
}
