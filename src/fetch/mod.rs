//! Fetch capability consumed by the resolver, and its default implementation.
//!
//! The resolver only needs one thing from the outside world: turn a URL into a
//! record. That need is the [`Fetcher`] trait. Any closure
//! `Fn(String) -> impl Future<Output = Result<Record, FetchError>>` is a
//! fetcher, which keeps tests and embedders free to plug in whatever they have.
//!
//! For real HTTP the crate ships [`CachingFetcher`], a JSON `GET` client layered
//! on the deduplicating [`RequestCache`] and a [`ReqwestTransport`]:
//!
//! ```text
//! resolver ──url──▶ CachingFetcher ──RequestSpec──▶ RequestCache ──▶ HttpTransport
//!          ◀record──                ◀─HttpResponse─              ◀──
//! ```
//!
//! # Examples
//!
//! ```rust,no_run
//! use routeload::fetch::{CachingFetcher, Fetcher, ReqwestTransport, RequestCache};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let cache = Arc::new(RequestCache::new(ReqwestTransport::default(), Duration::from_secs(1)));
//! let fetcher = CachingFetcher::new(cache);
//! let user = fetcher.fetch("http://localhost:3000/stores/users/10").await?;
//! println!("{user}");
//! # Ok(())
//! # }
//! ```

mod cache;
mod error;
mod http;
mod request;

pub use cache::RequestCache;
pub use error::FetchError;
pub use http::{HttpTransport, ReqwestTransport};
pub use request::{HttpResponse, RequestSignature, RequestSpec};

use futures::future::BoxFuture;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use crate::models::Record;

/// Asynchronous `url -> record` capability.
///
/// Implementations must resolve to a JSON value or fail; the resolver turns a
/// failure into [`LoaderError::FetchFailed`](crate::core::LoaderError::FetchFailed)
/// and aborts. Retries and cancellation, if wanted, belong here and not in the
/// resolver.
pub trait Fetcher: Send + Sync {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Record, FetchError>>;
}

impl<F, Fut> Fetcher for F
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Record, FetchError>> + Send + 'static,
{
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Record, FetchError>> {
        Box::pin(self(url.to_string()))
    }
}

/// JSON fetcher backed by a shared [`RequestCache`].
///
/// Issues `GET` with `Accept: application/json` plus any configured default
/// headers, rejects non-2xx statuses and parses the body.
pub struct CachingFetcher<T: HttpTransport = ReqwestTransport> {
    cache: Arc<RequestCache<T>>,
    headers: BTreeMap<String, String>,
}

impl<T: HttpTransport> CachingFetcher<T> {
    pub const fn new(cache: Arc<RequestCache<T>>) -> Self {
        Self {
            cache,
            headers: BTreeMap::new(),
        }
    }

    /// Headers added to every request, e.g. an `Authorization` header.
    #[must_use]
    pub fn with_headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    pub fn cache(&self) -> &Arc<RequestCache<T>> {
        &self.cache
    }

    fn request_for(&self, url: &str) -> RequestSpec {
        RequestSpec::get(url).header("accept", "application/json").headers(&self.headers)
    }
}

impl<T: HttpTransport> Fetcher for CachingFetcher<T> {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Record, FetchError>> {
        let request = self.request_for(url);
        Box::pin(async move {
            let response = self.cache.fetch(request).await?.error_for_status()?;
            response.json()
        })
    }
}
