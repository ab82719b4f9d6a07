//! Short-lived, deduplicating request cache.
//!
//! Decoupled components that render nested routes tend to ask for the same
//! record at almost the same moment (`/users/:userId` and
//! `/users/:userId/addresses/:addressId` both want `users/10`). The
//! [`RequestCache`] collapses those into one network call:
//!
//! - Only `GET` requests participate; everything else goes straight to the
//!   transport.
//! - Entries are keyed by [`RequestSignature`] and hold the shared,
//!   possibly still in-flight response together with an expiry instant.
//! - Every call first purges expired entries, then joins a live entry or
//!   starts a new request and stores it before awaiting it.
//! - Each caller receives its own clone of the buffered response.
//!
//! The cache is an ordinary value owned by the caller. There is no
//! process-wide instance; share it with an [`Arc`] when several fetchers
//! should see the same entries.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, trace};

use super::{FetchError, HttpResponse, HttpTransport, RequestSignature, RequestSpec};

type SharedResponse = Shared<BoxFuture<'static, Result<HttpResponse, FetchError>>>;

struct CacheEntry {
    response: SharedResponse,
    expires: Instant,
}

/// TTL-based cache of in-flight and completed `GET` requests.
pub struct RequestCache<T: HttpTransport> {
    transport: Arc<T>,
    entries: DashMap<RequestSignature, CacheEntry>,
    ttl: Duration,
}

impl<T: HttpTransport> RequestCache<T> {
    pub fn new(transport: T, ttl: Duration) -> Self {
        Self {
            transport: Arc::new(transport),
            entries: DashMap::new(),
            ttl,
        }
    }

    /// How long an entry stays usable after the request was issued.
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send `request`, reusing a live cached response when there is one.
    ///
    /// Failed requests are cached like successful ones until they expire, so
    /// callers joining an in-flight request observe the same failure.
    pub async fn fetch(&self, request: RequestSpec) -> Result<HttpResponse, FetchError> {
        let now = Instant::now();
        self.purge_expired_at(now);

        let Some(signature) = request.signature() else {
            trace!("Not caching {} {}", request.method, request.url);
            return self.transport.send(request).await;
        };

        let response = match self.entries.entry(signature) {
            Entry::Occupied(entry) if entry.get().expires >= now => {
                debug!("Request cache hit for {}", request.url);
                entry.get().response.clone()
            }
            entry => {
                debug!("Request cache miss for {}", request.url);
                let response = self.transport.send(request).shared();
                entry.insert(CacheEntry {
                    response: response.clone(),
                    expires: now + self.ttl,
                });
                response
            }
        };

        response.await
    }

    /// Drop every entry whose expiry is in the past.
    pub fn purge_expired(&self) {
        self.purge_expired_at(Instant::now());
    }

    fn purge_expired_at(&self, now: Instant) {
        self.entries.retain(|_, entry| entry.expires >= now);
    }

    /// Number of entries, expired ones included until the next purge.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl<T: HttpTransport> std::fmt::Debug for RequestCache<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestCache")
            .field("entries", &self.entries.len())
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Method;
    use serde_json::json;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Answers every request with `{"url": <url>, "n": <call number>}` after a delay.
    #[derive(Default)]
    struct CountingTransport {
        calls: AtomicUsize,
        seen: Mutex<Vec<String>>,
        fail_with: Option<u16>,
    }

    impl HttpTransport for CountingTransport {
        fn send(
            &self,
            request: RequestSpec,
        ) -> BoxFuture<'static, Result<HttpResponse, FetchError>> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            self.seen.lock().unwrap().push(request.url.clone());
            let fail_with = self.fail_with;
            Box::pin(async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                if let Some(status) = fail_with {
                    return Err(FetchError::Status {
                        url: request.url,
                        status,
                    });
                }
                Ok(HttpResponse::json_ok(request.url.clone(), &json!({ "url": request.url, "n": n })))
            })
        }
    }

    fn cache(ttl_ms: u64) -> RequestCache<CountingTransport> {
        RequestCache::new(CountingTransport::default(), Duration::from_millis(ttl_ms))
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_identical_gets_share_one_request() {
        let cache = cache(1000);
        let (a, b, c) = tokio::join!(
            cache.fetch(RequestSpec::get("http://x/users/10")),
            cache.fetch(RequestSpec::get("http://x/users/10")),
            cache.fetch(RequestSpec::get("http://x/users/10")),
        );
        assert_eq!(cache.transport().calls.load(Ordering::SeqCst), 1);
        assert_eq!(a.unwrap().json().unwrap()["n"], json!(1));
        assert_eq!(b.unwrap().json().unwrap()["n"], json!(1));
        assert_eq!(c.unwrap().json().unwrap()["n"], json!(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_different_spellings_of_one_url_share_an_entry() {
        let cache = cache(1000);
        let (a, b) = tokio::join!(
            cache.fetch(RequestSpec::get("http://localhost:3000/stores/users/10")),
            cache.fetch(RequestSpec::get("HTTP://LOCALHOST:3000/stores/./users/10")),
        );
        assert_eq!(cache.transport().calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(a.unwrap().json().unwrap(), b.unwrap().json().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_completed_response_is_reused_within_ttl() {
        let cache = cache(1000);
        cache.fetch(RequestSpec::get("http://x/users/10")).await.unwrap();
        tokio::time::advance(Duration::from_millis(500)).await;
        let again = cache.fetch(RequestSpec::get("http://x/users/10")).await.unwrap();

        assert_eq!(cache.transport().calls.load(Ordering::SeqCst), 1);
        assert_eq!(again.json().unwrap()["n"], json!(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entries_are_refetched_and_purged() {
        let cache = cache(100);
        cache.fetch(RequestSpec::get("http://x/users/10")).await.unwrap();
        cache.fetch(RequestSpec::get("http://x/users/11")).await.unwrap();
        assert_eq!(cache.len(), 2);

        tokio::time::advance(Duration::from_millis(500)).await;
        let fresh = cache.fetch(RequestSpec::get("http://x/users/10")).await.unwrap();

        assert_eq!(fresh.json().unwrap()["n"], json!(3));
        // users/11 expired and was purged by the last call
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_get_bypasses_cache() {
        let cache = cache(1000);
        cache.fetch(RequestSpec::new(Method::POST, "http://x/users")).await.unwrap();
        cache.fetch(RequestSpec::new(Method::POST, "http://x/users")).await.unwrap();

        assert_eq!(cache.transport().calls.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_different_headers_are_different_entries() {
        let cache = cache(1000);
        cache.fetch(RequestSpec::get("http://x/users/10").header("x-a", "1")).await.unwrap();
        cache.fetch(RequestSpec::get("http://x/users/10").header("x-a", "2")).await.unwrap();
        assert_eq!(cache.transport().calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_are_shared_by_joined_callers() {
        let cache = RequestCache::new(
            CountingTransport {
                fail_with: Some(500),
                ..Default::default()
            },
            Duration::from_millis(1000),
        );
        let (a, b) = tokio::join!(
            cache.fetch(RequestSpec::get("http://x/users/10")),
            cache.fetch(RequestSpec::get("http://x/users/10")),
        );
        assert_eq!(cache.transport().calls.load(Ordering::SeqCst), 1);
        assert!(matches!(a, Err(FetchError::Status { status: 500, .. })));
        assert_eq!(a, b);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_forgets_entries() {
        let cache = cache(1000);
        cache.fetch(RequestSpec::get("http://x/users/10")).await.unwrap();
        cache.clear();
        cache.fetch(RequestSpec::get("http://x/users/10")).await.unwrap();
        assert_eq!(cache.transport().calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.transport().seen.lock().unwrap().len(), 2);
    }
}
