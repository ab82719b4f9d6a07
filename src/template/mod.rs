//! Data URL template parsing.
//!
//! A data URL template spells out, in path form, which stores a view needs and
//! which parameter identifies the record in each of them:
//!
//! ```text
//! /users/:userId/addresses/:addressId
//!  └store┘└param┘ └─store──┘└─param──┘
//! ```
//!
//! [`parse`] turns a template plus the routing values known so far into the
//! [`ResolutionContext`] the resolver works on. In list mode the template ends
//! with a bare store (`/users/:userId/addresses`) that is queried without an id
//! and filtered by the parameters before it.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;
use std::collections::{BTreeMap, HashSet};

use crate::core::LoaderError;
use crate::models::IdValue;
use crate::resolver::{ResolutionContext, StoreBinding};

/// Prefix marking a parameter token.
pub const PARAM_PREFIX: char = ':';

/// One path segment of a template.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    /// Literal store name
    Store(String),
    /// Parameter name, without the prefix
    Param(String),
}

/// A validated data URL template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrlTemplate {
    source: String,
    tokens: Vec<Token>,
}

impl DataUrlTemplate {
    /// Tokenize and validate `template`.
    ///
    /// Rejects templates with no segments, parameters without a preceding
    /// store, empty parameter names and repeated store names.
    pub fn parse(template: &str) -> Result<Self, LoaderError> {
        let segments = segments(template);
        if segments.is_empty() {
            return Err(LoaderError::InvalidTemplate {
                template: template.to_string(),
                reason: "template has no segments".to_string(),
            });
        }

        let mut tokens = Vec::with_capacity(segments.len());
        let mut stores = HashSet::new();
        let mut previous_is_store = false;

        for segment in segments {
            match segment.strip_prefix(PARAM_PREFIX) {
                Some(param) => {
                    if param.is_empty() {
                        return Err(LoaderError::InvalidTemplate {
                            template: template.to_string(),
                            reason: "parameter name is empty".to_string(),
                        });
                    }
                    if !previous_is_store {
                        return Err(LoaderError::OrphanParameter {
                            param: param.to_string(),
                            template: template.to_string(),
                        });
                    }
                    tokens.push(Token::Param(param.to_string()));
                    previous_is_store = false;
                }
                None => {
                    if !stores.insert(segment) {
                        return Err(LoaderError::InvalidTemplate {
                            template: template.to_string(),
                            reason: format!("store '{segment}' appears more than once"),
                        });
                    }
                    tokens.push(Token::Store(segment.to_string()));
                    previous_is_store = true;
                }
            }
        }

        Ok(Self {
            source: template.to_string(),
            tokens,
        })
    }

    /// The template as it was written.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Store/parameter pairs in declaration order.
    pub fn bindings(&self) -> Vec<StoreBinding> {
        self.tokens
            .windows(2)
            .filter_map(|pair| match pair {
                [Token::Store(store), Token::Param(param)] => Some(StoreBinding::new(store, param)),
                _ => None,
            })
            .collect()
    }

    /// Last store of the template, regardless of a following parameter.
    pub fn last_store(&self) -> Option<&str> {
        self.tokens.iter().rev().find_map(|t| match t {
            Token::Store(store) => Some(store.as_str()),
            Token::Param(_) => None,
        })
    }
}

impl FromStr for DataUrlTemplate {
    type Err = LoaderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for DataUrlTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for token in &self.tokens {
            match token {
                Token::Store(store) => write!(f, "/{store}")?,
                Token::Param(param) => write!(f, "/{PARAM_PREFIX}{param}")?,
            }
        }
        Ok(())
    }
}

fn segments(template: &str) -> Vec<&str> {
    template.split('/').filter(|s| !s.is_empty()).collect()
}

/// Parse `template` against the routing values known so far.
///
/// Every store/parameter pair gets the routing value of its parameter as
/// initial id, or stays unknown when the routing map has no (or a `null`)
/// value for it. With `is_list` the last store becomes the list store and the
/// list filter is seeded with the same values.
///
/// # Errors
///
/// - [`LoaderError::InvalidListTemplate`] when `is_list` is set and the
///   template ends with a parameter
/// - [`LoaderError::OrphanParameter`] for a parameter with no store before it
/// - [`LoaderError::InvalidTemplate`] for empty templates, empty parameter
///   names and repeated stores
///
/// # Examples
///
/// ```rust
/// use routeload::template::parse;
/// use serde_json::json;
/// use std::collections::BTreeMap;
///
/// let routing = BTreeMap::from([("addressId".to_string(), json!(20))]);
/// let ctx = parse("/users/:userId/addresses/:addressId", &routing, false).unwrap();
///
/// assert_eq!(ctx.param_for("users"), Some("userId"));
/// assert_eq!(ctx.id_value("addresses"), Some(&json!(20)));
/// assert_eq!(ctx.id_value("users"), None);
/// ```
pub fn parse(
    template: &str,
    routing_values: &BTreeMap<String, IdValue>,
    is_list: bool,
) -> Result<ResolutionContext, LoaderError> {
    if is_list
        && segments(template).last().is_some_and(|last| last.starts_with(PARAM_PREFIX))
    {
        return Err(LoaderError::InvalidListTemplate {
            template: template.to_string(),
        });
    }

    let parsed = DataUrlTemplate::parse(template)?;
    let bindings = parsed.bindings();

    let id_values: BTreeMap<String, Option<IdValue>> = bindings
        .iter()
        .map(|b| {
            let value = routing_values.get(&b.param).filter(|v| !v.is_null()).cloned();
            (b.store.clone(), value)
        })
        .collect();

    let list = if is_list {
        let store = parsed.last_store().unwrap_or_default().to_string();
        let filter: BTreeMap<String, Option<Value>> = bindings
            .iter()
            .map(|b| (b.param.clone(), id_values.get(&b.store).cloned().flatten()))
            .collect();
        Some((store, filter))
    } else {
        None
    };

    tracing::trace!(
        "Parsed template {} into {} store(s){}",
        parsed,
        bindings.len(),
        if is_list { " (list)" } else { "" }
    );

    Ok(ResolutionContext::new(parsed, bindings, id_values, list))
}
