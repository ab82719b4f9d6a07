//! Resolution scenarios driven through the public API.

use routeload::core::LoaderError;
use routeload::resolver::{ResolveOptions, load, resolve};
use routeload::template;
use routeload::test_utils::{MockStore, init_test_logging};
use serde_json::{Value, json};
use std::collections::BTreeMap;

const BASE: &str = "http://api.test/stores";

fn routing(pairs: &[(&str, Value)]) -> BTreeMap<String, Value> {
    pairs.iter().map(|(k, v)| ((*k).to_string(), v.clone())).collect()
}

/// Group -> user -> address, where every record links to its parent.
fn linked_stores() -> MockStore {
    MockStore::new(BASE)
        .with_record("groups/3", json!({ "id": 3, "name": "admins" }))
        .with_record("users/10", json!({ "id": 10, "groupId": 3 }))
        .with_record("addresses/20", json!({ "id": 20, "userId": 10 }))
        .with_record("addresses?groupId=3&userId=10", json!([{ "id": 20 }, { "id": 21 }]))
}

#[tokio::test]
async fn test_walks_up_a_chain_of_parents() {
    init_test_logging(None);
    let store = linked_stores();

    let result = load(
        "/groups/:groupId/users/:userId/addresses/:addressId",
        &routing(&[("addressId", json!(20))]),
        false,
        BTreeMap::new(),
        &store,
        &ResolveOptions::new(BASE),
    )
    .await
    .unwrap();

    assert_eq!(result.fetch_count, 3);
    assert_eq!(
        store.calls(),
        vec![
            format!("{BASE}/addresses/20"),
            format!("{BASE}/users/10"),
            format!("{BASE}/groups/3"),
        ]
    );
    assert_eq!(result.record("groupId"), Some(&json!({ "id": 3, "name": "admins" })));
}

#[tokio::test]
async fn test_concurrent_mode_reaches_the_same_result() {
    let sequential_store = linked_stores();
    let concurrent_store = linked_stores();
    let pairs = [("addressId", json!(20)), ("groupId", json!(3))];
    let template = "/groups/:groupId/users/:userId/addresses/:addressId";

    let sequential = load(
        template,
        &routing(&pairs),
        false,
        BTreeMap::new(),
        &sequential_store,
        &ResolveOptions::new(BASE),
    )
    .await
    .unwrap();
    let concurrent = load(
        template,
        &routing(&pairs),
        false,
        BTreeMap::new(),
        &concurrent_store,
        &ResolveOptions::new(BASE).concurrent(true),
    )
    .await
    .unwrap();

    assert_eq!(sequential.loaded_records, concurrent.loaded_records);
    assert_eq!(sequential.resolved_id_values, concurrent.resolved_id_values);
    assert_eq!(concurrent.fetch_count, 3);
}

#[tokio::test]
async fn test_list_with_discovered_filter() {
    let store = linked_stores();

    let result = load(
        "/groups/:groupId/users/:userId/addresses",
        &routing(&[("userId", json!(10))]),
        true,
        BTreeMap::new(),
        &store,
        &ResolveOptions::new(BASE),
    )
    .await
    .unwrap();

    assert_eq!(result.fetch_count, 3);
    assert_eq!(result.list_records.as_ref().map(Vec::len), Some(2));
    assert_eq!(result.element_data()["addressesList"], json!([{ "id": 20 }, { "id": 21 }]));
}

#[tokio::test]
async fn test_resolve_parsed_context() {
    let store = linked_stores();
    let context = template::parse("/users/:userId", &routing(&[("userId", json!(10))]), false)
        .unwrap();

    let result = resolve(context, BTreeMap::new(), &store, &ResolveOptions::new(BASE))
        .await
        .unwrap();
    assert_eq!(result.record("userId"), Some(&json!({ "id": 10, "groupId": 3 })));
}

#[tokio::test]
async fn test_template_errors_surface_before_any_fetch() {
    let store = linked_stores();
    let options = ResolveOptions::new(BASE);

    let err = load("/users/:userId/:addressId", &routing(&[]), false, BTreeMap::new(), &store, &options)
        .await
        .unwrap_err();
    assert!(matches!(err, LoaderError::OrphanParameter { .. }));

    let err = load("/users/:userId", &routing(&[]), true, BTreeMap::new(), &store, &options)
        .await
        .unwrap_err();
    assert!(matches!(err, LoaderError::InvalidListTemplate { .. }));

    assert_eq!(store.call_count(), 0);
}
