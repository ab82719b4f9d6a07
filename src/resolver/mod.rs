//! Dependency resolution for data URL templates.
//!
//! This module implements the engine that turns a parsed template and partial
//! routing data into fully loaded records while issuing as few requests as
//! possible.
//!
//! # Resolution Process
//!
//! The engine runs a fixed-point loop over the template's stores:
//!
//! 1. **Preload**: records supplied by the caller are installed first and are
//!    never fetched
//! 2. **Scan**: stores are visited last-declared first, because the most
//!    specific record is the one most likely to embed its ancestors. On each
//!    visit the engine either inspects an existing record, notes that the
//!    store is blocked on an unknown id, or schedules a fetch
//! 3. **Fetch**: the scheduled batch runs; every result is stored and
//!    inspected, which may reveal new ids or embedded records
//! 4. **Converge**: a pass that schedules nothing ends the loop, successfully
//!    when no store is blocked and with
//!    [`LoaderError::UnresolvableReference`] otherwise
//! 5. **List**: in list mode the terminal store is queried once, filtered by
//!    the known parameters
//!
//! ## Scheduling
//!
//! By default a pass schedules a single fetch, so every discovered id or
//! embedded record is exploited before the next request is chosen. With
//! [`ResolveOptions::concurrent`] every eligible store of a pass is fetched at
//! once: more requests in the worst case, fewer round trips.
//!
//! ## Example
//!
//! With `/users/:userId/addresses/:addressId` and only `addressId = 20` known:
//!
//! - pass 1 fetches `addresses/20`, which returns `{ "id": 20, "userId": 10 }`
//! - pass 2 fetches `users/10`
//! - pass 3 schedules nothing and no store is blocked: done after 2 fetches
//!
//! Had the address carried `"userIdRecord": { ... }`, pass 2 would find the
//! user record already in place and the call would finish after one fetch.
//!
//! # Failure
//!
//! A failed fetch aborts the whole call with [`LoaderError::FetchFailed`].
//! Nothing is retried and no partial result is returned.

mod context;
mod inspector;
mod types;


pub use context::{ResolutionContext, StoreBinding};
pub use inspector::inspect;
pub use types::{LoadResult, ResolveOptions, UrlHook, UrlRequest, url_hook};

use futures::future::try_join_all;
use std::collections::BTreeMap;
use tracing::{debug, info, trace};

use crate::core::LoaderError;
use crate::fetch::{FetchError, Fetcher};
use crate::models::{IdValue, RECORD_SUFFIX, Record, render_id};

/// A store fetch scheduled by a scan.
#[derive(Debug, Clone)]
struct PendingFetch {
    store: String,
    param: String,
    url: String,
}

/// What a single scan over the stores decided.
#[derive(Debug)]
enum Pass {
    /// Fetch these stores, then scan again
    Fetch(Vec<PendingFetch>),
    /// Every store has a record
    Complete,
    /// Nothing can be fetched but these stores still lack an id
    Stalled(Vec<String>),
}

/// Parse `template` and resolve it in one go.
///
/// # Examples
///
/// ```rust,no_run
/// use routeload::fetch::FetchError;
/// use routeload::resolver::{ResolveOptions, load};
/// use serde_json::json;
/// use std::collections::BTreeMap;
///
/// # async fn example() -> anyhow::Result<()> {
/// let fetcher = |url: String| async move { Ok::<_, FetchError>(json!({ "id": 10, "url": url })) };
/// let routing = BTreeMap::from([("userId".to_string(), json!(10))]);
///
/// let result = load(
///     "/users/:userId",
///     &routing,
///     false,
///     BTreeMap::new(),
///     &fetcher,
///     &ResolveOptions::new("http://localhost:3000/stores"),
/// )
/// .await?;
/// assert_eq!(result.fetch_count, 1);
/// # Ok(())
/// # }
/// ```
pub async fn load<F>(
    template: &str,
    routing_values: &BTreeMap<String, IdValue>,
    is_list: bool,
    preloaded: BTreeMap<String, Record>,
    fetcher: &F,
    options: &ResolveOptions,
) -> Result<LoadResult, LoaderError>
where
    F: Fetcher + ?Sized,
{
    let context = crate::template::parse(template, routing_values, is_list)?;
    resolve(context, preloaded, fetcher, options).await
}

/// Load every record `context` needs.
///
/// `preloaded` is keyed by parameter name (`userId`); the `userIdRecord` form
/// is accepted too. Preloaded records are never fetched but are still
/// inspected once.
///
/// # Errors
///
/// - [`LoaderError::UnresolvableReference`] when a pass can fetch nothing while
///   some store has neither an id nor a record
/// - [`LoaderError::FetchFailed`] when any fetch fails
/// - [`LoaderError::MissingIdentifier`] when every store has a record but some
///   id was never discovered
pub async fn resolve<F>(
    mut context: ResolutionContext,
    preloaded: BTreeMap<String, Record>,
    fetcher: &F,
    options: &ResolveOptions,
) -> Result<LoadResult, LoaderError>
where
    F: Fetcher + ?Sized,
{
    install_preloaded(&mut context, preloaded);

    let mut fetch_count = 0;
    let mut pass_number = 0;
    loop {
        pass_number += 1;
        match scan(&mut context, options) {
            Pass::Fetch(batch) => {
                trace!("Pass {pass_number}: fetching {} store(s)", batch.len());
                let records = fetch_batch(&batch, fetcher, options.verbose).await?;
                fetch_count += records.len();
                for (pending, record) in batch.iter().zip(records) {
                    store_fetched(&mut context, pending, record);
                }
            }
            Pass::Complete => {
                trace!("Pass {pass_number}: all records loaded");
                break;
            }
            Pass::Stalled(stores) => {
                debug!(
                    "Pass {pass_number}: stalled on {:?} for template {}",
                    stores,
                    context.template()
                );
                return Err(LoaderError::UnresolvableReference {
                    stores,
                });
            }
        }
    }

    let missing = context.unresolved_stores();
    if !missing.is_empty() {
        return Err(LoaderError::MissingIdentifier {
            stores: missing,
        });
    }

    let list_records = match context.list_store() {
        Some(store) => {
            let store = store.to_string();
            let records = fetch_list(&context, &store, fetcher, options).await?;
            fetch_count += 1;
            Some(records)
        }
        None => None,
    };

    debug!("Resolved {} with {fetch_count} fetch(es)", context.template());
    Ok(LoadResult::from_parts(context.into_parts(), list_records, fetch_count))
}

fn install_preloaded(context: &mut ResolutionContext, preloaded: BTreeMap<String, Record>) {
    for (key, record) in preloaded {
        if record.is_null() {
            continue;
        }
        let param = match key.strip_suffix(RECORD_SUFFIX) {
            Some(stripped) if !context.declares_param(&key) => stripped.to_string(),
            _ => key,
        };
        if context.declares_param(&param) {
            trace!("Preloaded record for {param}");
            context.assign_record(&param, record);
        } else {
            debug!("Ignoring preloaded '{param}': not a parameter of {}", context.template());
        }
    }
}

/// One scan over the stores, last-declared first.
fn scan(context: &mut ResolutionContext, options: &ResolveOptions) -> Pass {
    let bindings: Vec<StoreBinding> = context.bindings().iter().rev().cloned().collect();
    let mut batch = Vec::new();
    let mut blocked = Vec::new();

    for binding in bindings {
        if let Some(record) = context.record(&binding.param) {
            if !context.is_inspected(&binding.param) {
                let record = record.clone();
                inspect(&record, context);
                context.mark_inspected(&binding.param);
            }
            continue;
        }

        let Some(id) = context.id_value(&binding.store).cloned() else {
            blocked.push(binding.store);
            continue;
        };

        let url = store_url(context, options, &binding.store, &id);
        batch.push(PendingFetch {
            store: binding.store,
            param: binding.param,
            url,
        });
        if !options.concurrent {
            break;
        }
    }

    if !batch.is_empty() {
        Pass::Fetch(batch)
    } else if blocked.is_empty() {
        Pass::Complete
    } else {
        Pass::Stalled(blocked)
    }
}

async fn fetch_batch<F>(
    batch: &[PendingFetch],
    fetcher: &F,
    verbose: bool,
) -> Result<Vec<Record>, LoaderError>
where
    F: Fetcher + ?Sized,
{
    try_join_all(batch.iter().map(|pending| async move {
        log_fetch(&pending.url, verbose);
        fetcher.fetch(&pending.url).await.map_err(|source| LoaderError::FetchFailed {
            store: pending.store.clone(),
            url: pending.url.clone(),
            source,
        })
    }))
    .await
}

fn store_fetched(context: &mut ResolutionContext, pending: &PendingFetch, record: Record) {
    if context.assign_record(&pending.param, record.clone()) {
        context.mark_inspected(&pending.param);
    } else {
        // An embedded record of this batch got there first; the fetched copy
        // is not stored but may still carry ids
        debug!("Keeping earlier record for {}, inspecting the fetched one", pending.param);
    }
    inspect(&record, context);
}

async fn fetch_list<F>(
    context: &ResolutionContext,
    store: &str,
    fetcher: &F,
    options: &ResolveOptions,
) -> Result<Vec<Record>, LoaderError>
where
    F: Fetcher + ?Sized,
{
    let url = list_url(context, options, store);
    log_fetch(&url, options.verbose);

    let failed = |source: FetchError| LoaderError::FetchFailed {
        store: store.to_string(),
        url: url.clone(),
        source,
    };

    match fetcher.fetch(&url).await.map_err(failed)? {
        Record::Array(records) => Ok(records),
        other => Err(failed(FetchError::Decode {
            url: url.clone(),
            reason: format!("expected a JSON array for list store '{store}', got {}", kind(&other)),
        })),
    }
}

fn store_url(
    context: &ResolutionContext,
    options: &ResolveOptions,
    store: &str,
    id: &IdValue,
) -> String {
    let store_url = format!("{}/{}", options.base_url, store);
    let url = format!("{store_url}/{}", render_id(id));
    match &options.url_hook {
        Some(hook) => hook.rewrite(&UrlRequest {
            url: &url,
            store,
            store_url: &store_url,
            id_value: Some(id),
            filter: &BTreeMap::new(),
            context,
        }),
        None => url,
    }
}

fn list_url(context: &ResolutionContext, options: &ResolveOptions, store: &str) -> String {
    let store_url = format!("{}/{}", options.base_url, store);
    let known = context.known_filter();

    let mut query = url::form_urlencoded::Serializer::new(String::new());
    for (param, value) in &known {
        query.append_pair(param, &render_id(value));
    }
    let query = query.finish();

    let url = if query.is_empty() { store_url.clone() } else { format!("{store_url}?{query}") };
    match &options.url_hook {
        Some(hook) => {
            let filter: BTreeMap<String, IdValue> = known.into_iter().collect();
            hook.rewrite(&UrlRequest {
                url: &url,
                store,
                store_url: &store_url,
                id_value: None,
                filter: &filter,
                context,
            })
        }
        None => url,
    }
}

fn log_fetch(url: &str, verbose: bool) {
    if verbose {
        info!("FETCHING: {url}");
    } else {
        debug!("FETCHING: {url}");
    }
}

const fn kind(value: &Record) -> &'static str {
    match value {
        Record::Null => "null",
        Record::Bool(_) => "a boolean",
        Record::Number(_) => "a number",
        Record::String(_) => "a string",
        Record::Array(_) => "an array",
        Record::Object(_) => "an object",
    }
}
