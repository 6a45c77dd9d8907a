//! Field filtering: project a subset of a JSON value or resource.
//!
//! Filtering never fails. Selectors that do not resolve are skipped, and
//! when there is nothing to do the input is handed back borrowed so callers
//! can tell (via [`Cow::Borrowed`]) that no copy was made.
//!
//! Known gap: selectors cannot address array elements. A numeric token is
//! treated as an object member name, so `emails/0` selects nothing.

use serde_json::{Map, Value};
use std::borrow::Cow;
use std::collections::HashMap;

use crate::pointer::JsonPointer;
use crate::response::{ResourceResponse, Response};

/// Return a JSON object holding only the selected members of `value`.
///
/// - No selectors, or a `null` / empty source: `value` itself, borrowed.
/// - Non-object sources have no addressable members and are also returned
///   borrowed.
/// - The empty pointer selects every top-level member.
/// - Any other pointer is resolved and, if present, stored under its leaf
///   name. A later selector writing the same name replaces the earlier one.
///
/// Members of the result follow the order of the top-level members of the
/// source they were taken from, whatever order the selectors were given in.
/// Selected subtrees are cloned into the result.
#[must_use]
pub fn filter_value<'a>(value: &'a Value, fields: &[JsonPointer]) -> Cow<'a, Value> {
    if fields.is_empty() || is_empty(value) {
        return Cow::Borrowed(value);
    }
    let Some(source) = value.as_object() else {
        return Cow::Borrowed(value);
    };

    let positions: HashMap<&str, usize> = source
        .keys()
        .enumerate()
        .map(|(i, k)| (k.as_str(), i))
        .collect();

    let mut picked = Picked::with_capacity(fields.len());
    for field in fields {
        if field.is_empty() {
            for (rank, (key, member)) in source.iter().enumerate() {
                picked.put(rank, key, member);
            }
            continue;
        }
        let (Some(member), Some(key)) = (field.resolve(value), field.leaf()) else {
            continue;
        };
        let rank = field
            .first()
            .and_then(|top| positions.get(top).copied())
            .unwrap_or(usize::MAX);
        picked.put(rank, key, member);
    }

    Cow::Owned(picked.into_value())
}

/// Filter the content of a resource.
///
/// Fields recorded on the resource itself win over the caller's `fields`.
/// When filtering leaves the content untouched the resource is returned
/// borrowed; otherwise a new resource with the same id and revision is built.
#[must_use]
pub fn filter_resource<'a>(
    resource: &'a ResourceResponse,
    fields: &[JsonPointer],
) -> Cow<'a, ResourceResponse> {
    let selectors = if resource.has_fields() {
        resource.fields()
    } else {
        fields
    };
    match filter_value(resource.content(), selectors) {
        Cow::Borrowed(_) => Cow::Borrowed(resource),
        Cow::Owned(content) => Cow::Owned(ResourceResponse::new(
            resource.id(),
            resource.revision(),
            content,
        )),
    }
}

/// Apply [`filter_resource`] to every resource carried by a response.
/// Action results are returned as they are.
#[must_use]
pub fn filter_response(response: Response, fields: &[JsonPointer]) -> Response {
    match response {
        Response::Resource(resource) => Response::Resource(filter_owned(resource, fields)),
        Response::Query(mut query) => {
            query.resources = query
                .resources
                .into_iter()
                .map(|r| filter_owned(r, fields))
                .collect();
            Response::Query(query)
        }
        action @ Response::Action(_) => action,
    }
}

fn filter_owned(resource: ResourceResponse, fields: &[JsonPointer]) -> ResourceResponse {
    match filter_resource(&resource, fields) {
        Cow::Borrowed(_) => resource,
        Cow::Owned(filtered) => filtered,
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(m) => m.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::String(s) => s.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Selected members keyed by name, each tagged with its source rank.
///
/// Members sharing a rank keep the order their names were first picked in.
struct Picked {
    entries: HashMap<String, (usize, usize, Value)>,
}

impl Picked {
    fn with_capacity(n: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(n),
        }
    }

    fn put(&mut self, rank: usize, key: &str, member: &Value) {
        let seq = self.entries.len();
        match self.entries.get_mut(key) {
            Some(slot) => {
                slot.0 = rank;
                slot.2 = member.clone();
            }
            None => {
                self.entries.insert(key.to_string(), (rank, seq, member.clone()));
            }
        }
    }

    fn into_value(self) -> Value {
        let mut entries: Vec<_> = self.entries.into_iter().collect();
        entries.sort_by_key(|(_, (rank, seq, _))| (*rank, *seq));
        let map: Map<String, Value> = entries
            .into_iter()
            .map(|(key, (_, _, member))| (key, member))
            .collect();
        Value::Object(map)
    }
}
