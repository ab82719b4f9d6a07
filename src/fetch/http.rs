//! HTTP transport backed by `reqwest`.

use anyhow::{Context, Result};
use futures::future::BoxFuture;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::trace;

use super::{FetchError, HttpResponse, RequestSpec};

/// Sends a request and buffers the whole response.
///
/// This is the "fetch implementation" the request cache sits on. The returned
/// future is `'static` so the cache can share a single in-flight request
/// between callers.
pub trait HttpTransport: Send + Sync + 'static {
    fn send(&self, request: RequestSpec) -> BoxFuture<'static, Result<HttpResponse, FetchError>>;
}

/// [`HttpTransport`] over a [`reqwest::Client`].
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub const fn new(client: reqwest::Client) -> Self {
        Self {
            client,
        }
    }

    /// A transport whose requests fail after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self::new(client))
    }
}

impl HttpTransport for ReqwestTransport {
    fn send(&self, request: RequestSpec) -> BoxFuture<'static, Result<HttpResponse, FetchError>> {
        let client = self.client.clone();
        Box::pin(async move {
            let url = request.url.clone();
            trace!("{} {}", request.method, url);

            let mut builder = client.request(request.method.clone(), &url);
            for (name, value) in &request.headers {
                builder = builder.header(name, value);
            }
            // Browser cache modes that skip stored responses map onto a plain no-cache request
            if matches!(request.cache.as_deref(), Some("no-store" | "reload" | "no-cache"))
                && !request.headers.contains_key("cache-control")
            {
                builder = builder.header("cache-control", "no-cache");
            }
            if let Some(body) = request.body {
                builder = builder.body(body);
            }

            let transport_error = |e: reqwest::Error| FetchError::Transport {
                url: url.clone(),
                reason: e.to_string(),
            };

            let response = builder.send().await.map_err(transport_error)?;
            let status = response.status().as_u16();
            let headers: BTreeMap<String, String> = response
                .headers()
                .iter()
                .filter_map(|(name, value)| {
                    value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string()))
                })
                .collect();
            let body = response.bytes().await.map_err(transport_error)?;

            Ok(HttpResponse {
                url,
                status,
                headers,
                body,
            })
        })
    }
}
