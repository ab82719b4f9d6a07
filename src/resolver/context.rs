//! Mutable working state of a single resolution call.

use serde_json::{Value, json};
use std::collections::{BTreeMap, HashSet};

use crate::models::{IdValue, Record};
use crate::template::DataUrlTemplate;

/// One `store/:param` pair of a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreBinding {
    pub store: String,
    pub param: String,
}

impl StoreBinding {
    pub fn new(store: impl Into<String>, param: impl Into<String>) -> Self {
        Self {
            store: store.into(),
            param: param.into(),
        }
    }
}

/// Terminal store queried without an id, plus its filter.
#[derive(Debug, Clone, PartialEq)]
struct ListQuery {
    store: String,
    /// Keyed by parameter; `None` until a value is known.
    filter: BTreeMap<String, Option<IdValue>>,
}

/// Working state of one resolution run.
///
/// Built by [`template::parse`](crate::template::parse), consumed by
/// [`resolve`](super::resolve). Identifier values and records follow
/// write-once rules: once a store's id is known, or a parameter has a record,
/// later writes are ignored and reported as `false`.
#[derive(Debug, Clone)]
pub struct ResolutionContext {
    template: DataUrlTemplate,
    bindings: Vec<StoreBinding>,
    id_values: BTreeMap<String, Option<IdValue>>,
    list: Option<ListQuery>,
    loaded: BTreeMap<String, Record>,
    inspected: HashSet<String>,
}

impl ResolutionContext {
    pub(crate) fn new(
        template: DataUrlTemplate,
        bindings: Vec<StoreBinding>,
        id_values: BTreeMap<String, Option<IdValue>>,
        list: Option<(String, BTreeMap<String, Option<IdValue>>)>,
    ) -> Self {
        Self {
            template,
            bindings,
            id_values,
            list: list.map(|(store, filter)| ListQuery {
                store,
                filter,
            }),
            loaded: BTreeMap::new(),
            inspected: HashSet::new(),
        }
    }

    pub const fn template(&self) -> &DataUrlTemplate {
        &self.template
    }

    /// Store/parameter pairs in declaration order.
    pub fn bindings(&self) -> &[StoreBinding] {
        &self.bindings
    }

    pub fn param_for(&self, store: &str) -> Option<&str> {
        self.bindings.iter().find(|b| b.store == store).map(|b| b.param.as_str())
    }

    pub fn declares_param(&self, param: &str) -> bool {
        self.bindings.iter().any(|b| b.param == param)
    }

    /// Known identifier of `store`, `None` while unknown.
    pub fn id_value(&self, store: &str) -> Option<&IdValue> {
        self.id_values.get(store).and_then(Option::as_ref)
    }

    /// Set the id of `store` unless one is already known.
    pub fn set_id_if_unknown(&mut self, store: &str, value: &IdValue) -> bool {
        if value.is_null() {
            return false;
        }
        match self.id_values.get_mut(store) {
            Some(slot @ None) => {
                *slot = Some(value.clone());
                true
            }
            _ => false,
        }
    }

    pub fn record(&self, param: &str) -> Option<&Record> {
        self.loaded.get(param)
    }

    pub fn has_record(&self, param: &str) -> bool {
        self.loaded.contains_key(param)
    }

    /// Assign the record of `param` unless it already has one.
    pub fn assign_record(&mut self, param: &str, record: Record) -> bool {
        if self.loaded.contains_key(param) {
            return false;
        }
        self.loaded.insert(param.to_string(), record);
        true
    }

    pub fn is_inspected(&self, param: &str) -> bool {
        self.inspected.contains(param)
    }

    pub fn mark_inspected(&mut self, param: &str) -> bool {
        self.inspected.insert(param.to_string())
    }

    pub const fn is_list(&self) -> bool {
        self.list.is_some()
    }

    pub fn list_store(&self) -> Option<&str> {
        self.list.as_ref().map(|l| l.store.as_str())
    }

    /// Current list filter, `None` outside list mode.
    pub fn list_filter(&self) -> Option<&BTreeMap<String, Option<IdValue>>> {
        self.list.as_ref().map(|l| &l.filter)
    }

    /// Set the filter value of `param` unless it is already known.
    pub fn set_filter_if_unknown(&mut self, param: &str, value: &IdValue) -> bool {
        if value.is_null() {
            return false;
        }
        let Some(list) = self.list.as_mut() else {
            return false;
        };
        match list.filter.get_mut(param) {
            Some(slot @ None) => {
                *slot = Some(value.clone());
                true
            }
            _ => false,
        }
    }

    /// Known filter entries in declaration order, for the list query.
    pub fn known_filter(&self) -> Vec<(String, IdValue)> {
        let Some(filter) = self.list_filter() else {
            return Vec::new();
        };
        let mut seen = HashSet::new();
        self.bindings
            .iter()
            .filter(|b| seen.insert(b.param.as_str()))
            .filter_map(|b| {
                filter.get(&b.param).and_then(Option::as_ref).map(|v| (b.param.clone(), v.clone()))
            })
            .collect()
    }

    /// Stores whose id is still unknown, in declaration order.
    pub fn unresolved_stores(&self) -> Vec<String> {
        self.bindings
            .iter()
            .filter(|b| self.id_value(&b.store).is_none())
            .map(|b| b.store.clone())
            .collect()
    }

    /// JSON view of the context, used by `routeload parse`.
    pub fn describe(&self) -> Value {
        let store_to_param: serde_json::Map<String, Value> = self
            .bindings
            .iter()
            .map(|b| (b.store.clone(), Value::String(b.param.clone())))
            .collect();
        let id_values: serde_json::Map<String, Value> = self
            .id_values
            .iter()
            .map(|(store, value)| (store.clone(), value.clone().unwrap_or(Value::Null)))
            .collect();

        json!({
            "template": self.template.to_string(),
            "storeToParam": store_to_param,
            "idValues": id_values,
            "listStore": self.list_store(),
            "listFilter": self.list_filter().map(|filter| {
                filter
                    .iter()
                    .map(|(param, value)| (param.clone(), value.clone().unwrap_or(Value::Null)))
                    .collect::<serde_json::Map<String, Value>>()
            }),
        })
    }

    pub(crate) fn into_parts(self) -> ContextParts {
        ContextParts {
            id_values: self.id_values,
            list: self.list.map(|l| (l.store, l.filter)),
            loaded: self.loaded,
        }
    }
}

pub(crate) struct ContextParts {
    pub id_values: BTreeMap<String, Option<IdValue>>,
    pub list: Option<(String, BTreeMap<String, Option<IdValue>>)>,
    pub loaded: BTreeMap<String, Record>,
}
