//! The resolver on top of the HTTP fetcher and its request cache.

use futures::future::BoxFuture;
use routeload::core::LoaderError;
use routeload::fetch::{
    CachingFetcher, FetchError, HttpResponse, HttpTransport, RequestCache, RequestSpec,
};
use routeload::resolver::{ResolveOptions, load, url_hook};
use serde_json::{Value, json};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const BASE: &str = "http://api.test/stores";

/// Transport answering from a fixed URL -> body map and logging every request.
struct FixtureTransport {
    bodies: HashMap<String, Value>,
    sent: Mutex<Vec<String>>,
}

impl FixtureTransport {
    fn new(bodies: &[(&str, Value)]) -> Self {
        Self {
            bodies: bodies.iter().map(|(path, body)| (format!("{BASE}/{path}"), body.clone())).collect(),
            sent: Mutex::new(Vec::new()),
        }
    }

    fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

impl HttpTransport for FixtureTransport {
    fn send(&self, request: RequestSpec) -> BoxFuture<'static, Result<HttpResponse, FetchError>> {
        self.sent.lock().unwrap().push(request.url.clone());
        let response = match self.bodies.get(&request.url) {
            Some(body) => HttpResponse::json_ok(request.url.clone(), body),
            None => HttpResponse {
                status: 404,
                ..HttpResponse::json_ok(request.url.clone(), &json!({}))
            },
        };
        Box::pin(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            Ok(response)
        })
    }
}

fn fetcher(bodies: &[(&str, Value)], ttl: Duration) -> CachingFetcher<FixtureTransport> {
    CachingFetcher::new(Arc::new(RequestCache::new(FixtureTransport::new(bodies), ttl)))
}

fn routing(pairs: &[(&str, Value)]) -> BTreeMap<String, Value> {
    pairs.iter().map(|(k, v)| ((*k).to_string(), v.clone())).collect()
}

#[tokio::test(start_paused = true)]
async fn test_repeated_loads_share_responses_within_ttl() {
    let fetcher = fetcher(
        &[("addresses/20", json!({ "id": 20, "userId": 10 })), ("users/10", json!({ "id": 10 }))],
        Duration::from_secs(1),
    );
    let options = ResolveOptions::new(BASE);
    let template = "/users/:userId/addresses/:addressId";
    let routing = routing(&[("addressId", json!(20))]);

    let first = load(template, &routing, false, BTreeMap::new(), &fetcher, &options).await.unwrap();
    let second = load(template, &routing, false, BTreeMap::new(), &fetcher, &options).await.unwrap();

    // the resolver still counts its own fetches, the transport sees them once
    assert_eq!(first.fetch_count, 2);
    assert_eq!(second.fetch_count, 2);
    assert_eq!(fetcher.cache().transport().sent().len(), 2);
    assert_eq!(first.loaded_records, second.loaded_records);

    tokio::time::advance(Duration::from_secs(2)).await;
    load(template, &routing, false, BTreeMap::new(), &fetcher, &options).await.unwrap();
    assert_eq!(fetcher.cache().transport().sent().len(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_identical_urls_in_one_batch_hit_the_transport_once() {
    let fetcher = fetcher(&[("people/7", json!({ "id": 7 }))], Duration::from_secs(1));
    // both stores are served by the same endpoint
    let options = ResolveOptions::new(BASE)
        .concurrent(true)
        .with_url_hook(url_hook(|request| {
            format!("{BASE}/people/{}", request.id_value.map(ToString::to_string).unwrap_or_default())
        }));

    let result = load(
        "/authors/:authorId/editors/:editorId",
        &routing(&[("authorId", json!(7)), ("editorId", json!(7))]),
        false,
        BTreeMap::new(),
        &fetcher,
        &options,
    )
    .await
    .unwrap();

    assert_eq!(result.fetch_count, 2);
    assert_eq!(fetcher.cache().transport().sent(), vec![format!("{BASE}/people/7")]);
    assert_eq!(result.record("authorId"), result.record("editorId"));
}

#[tokio::test(start_paused = true)]
async fn test_http_error_aborts_resolution() {
    let fetcher = fetcher(&[("addresses/20", json!({ "id": 20, "userId": 10 }))], Duration::from_secs(1));

    let err = load(
        "/users/:userId/addresses/:addressId",
        &routing(&[("addressId", json!(20))]),
        false,
        BTreeMap::new(),
        &fetcher,
        &ResolveOptions::new(BASE),
    )
    .await
    .unwrap_err();

    match err {
        LoaderError::FetchFailed {
            store,
            source: FetchError::Status { status, .. },
            ..
        } => {
            assert_eq!(store, "users");
            assert_eq!(status, 404);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
