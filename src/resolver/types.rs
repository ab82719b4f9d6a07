//! Options, URL hooks and results of a resolution call.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::ResolutionContext;
use super::context::ContextParts;
use crate::models::{IdValue, LIST_SUFFIX, Record, record_field};

/// Arguments handed to a [`UrlHook`].
///
/// For a store fetch `id_value` is set and `filter` is empty; for the list
/// fetch `id_value` is `None` and `filter` holds the known filter values.
#[derive(Debug)]
pub struct UrlRequest<'a> {
    /// URL the resolver would request without the hook
    pub url: &'a str,
    pub store: &'a str,
    /// `base_url/store`, without id or query string
    pub store_url: &'a str,
    pub id_value: Option<&'a IdValue>,
    pub filter: &'a BTreeMap<String, IdValue>,
    pub context: &'a ResolutionContext,
}

/// Rewrites request URLs to fit a particular server.
///
/// A hook can only change the URL string; it cannot skip or delay the request.
pub trait UrlHook: Send + Sync {
    fn rewrite(&self, request: &UrlRequest<'_>) -> String;
}

impl<F> UrlHook for F
where
    F: Fn(&UrlRequest<'_>) -> String + Send + Sync,
{
    fn rewrite(&self, request: &UrlRequest<'_>) -> String {
        self(request)
    }
}

/// How a resolution call talks to the stores.
#[derive(Clone, Default)]
pub struct ResolveOptions {
    /// Prefix of every store URL, without a trailing slash
    pub base_url: String,
    pub url_hook: Option<Arc<dyn UrlHook>>,
    /// Fetch every eligible store of a pass at once instead of one per pass
    pub concurrent: bool,
    /// Log each fetch at `info` instead of `debug`
    pub verbose: bool,
}

impl ResolveOptions {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn concurrent(mut self, concurrent: bool) -> Self {
        self.concurrent = concurrent;
        self
    }

    #[must_use]
    pub const fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    #[must_use]
    pub fn with_url_hook(mut self, hook: impl UrlHook + 'static) -> Self {
        self.url_hook = Some(Arc::new(hook));
        self
    }
}

impl fmt::Debug for ResolveOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolveOptions")
            .field("base_url", &self.base_url)
            .field("url_hook", &self.url_hook.is_some())
            .field("concurrent", &self.concurrent)
            .field("verbose", &self.verbose)
            .finish()
    }
}

/// Output of a successful resolution call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadResult {
    /// Records keyed by `<param>Record`, preloaded ones included
    pub loaded_records: BTreeMap<String, Record>,
    /// Identifier of every store, keyed by store
    pub resolved_id_values: BTreeMap<String, IdValue>,
    /// Final list filter (unknown values as `null`), `None` outside list mode
    pub resolved_list_filter: Option<BTreeMap<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_records: Option<Vec<Record>>,
    /// Store fetches plus the list fetch
    pub fetch_count: usize,
    #[serde(skip)]
    list_store: Option<String>,
}

impl LoadResult {
    pub(crate) fn from_parts(
        parts: ContextParts,
        list_records: Option<Vec<Record>>,
        fetch_count: usize,
    ) -> Self {
        let loaded_records =
            parts.loaded.into_iter().map(|(param, record)| (record_field(&param), record)).collect();
        let resolved_id_values = parts
            .id_values
            .into_iter()
            .filter_map(|(store, value)| value.map(|v| (store, v)))
            .collect();
        let (list_store, resolved_list_filter) = match parts.list {
            Some((store, filter)) => (
                Some(store),
                Some(
                    filter
                        .into_iter()
                        .map(|(param, value)| (param, value.unwrap_or(Value::Null)))
                        .collect(),
                ),
            ),
            None => (None, None),
        };

        Self {
            loaded_records,
            resolved_id_values,
            resolved_list_filter,
            list_records,
            fetch_count,
            list_store,
        }
    }

    /// Record loaded for `param`.
    pub fn record(&self, param: &str) -> Option<&Record> {
        self.loaded_records.get(&record_field(param))
    }

    pub fn list_store(&self) -> Option<&str> {
        self.list_store.as_deref()
    }

    /// Everything a view needs in one object: `<param>Record` entries plus
    /// `<listStore>List` for the list payload.
    pub fn element_data(&self) -> Value {
        let mut data: Map<String, Value> =
            self.loaded_records.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        if let (Some(store), Some(records)) = (&self.list_store, &self.list_records) {
            data.insert(format!("{store}{LIST_SUFFIX}"), Value::Array(records.clone()));
        }
        Value::Object(data)
    }
}

/// Pins down the signature of a closure used as [`UrlHook`], so its argument
/// type doesn't need spelling out.
///
/// ```rust
/// use routeload::resolver::{ResolveOptions, url_hook};
///
/// let options = ResolveOptions::new("http://localhost:3000/stores")
///     .with_url_hook(url_hook(|req| format!("{}?format=full", req.url)));
/// ```
pub fn url_hook<F>(hook: F) -> F
where
    F: Fn(&UrlRequest<'_>) -> String + Send + Sync,
{
    hook
}
