//! Addressed resource requests.
//!
//! A [`Request`] names the resource it targets with a relative path such as
//! `users/42` and carries one of seven operation payloads. Routers rebase the
//! path as they descend so that each handler only ever sees the part of the
//! address it is responsible for.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::pointer::JsonPointer;

/// The seven resource operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
    Patch,
    Action,
    Query,
}

impl Operation {
    pub const ALL: [Operation; 7] = [
        Operation::Create,
        Operation::Read,
        Operation::Update,
        Operation::Delete,
        Operation::Patch,
        Operation::Action,
        Operation::Query,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Read => "read",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::Patch => "patch",
            Operation::Action => "action",
            Operation::Query => "query",
        }
    }

    /// Past participle used in "cannot be ..." error messages
    #[must_use]
    pub fn past_tense(self) -> &'static str {
        match self {
            Operation::Create => "created",
            Operation::Read => "read",
            Operation::Update => "updated",
            Operation::Delete => "deleted",
            Operation::Patch => "patched",
            Operation::Action => "actioned",
            Operation::Query => "queried",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .into_iter()
            .find(|op| op.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown operation '{s}'"))
    }
}

/// One step of a patch request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchOperation {
    /// `add`, `remove`, `replace`, `increment`, ...
    pub operation: String,
    pub field: JsonPointer,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl PatchOperation {
    #[must_use]
    pub fn replace(field: &str, value: Value) -> Self {
        Self {
            operation: "replace".to_string(),
            field: JsonPointer::parse(field),
            value: Some(value),
        }
    }

    #[must_use]
    pub fn add(field: &str, value: Value) -> Self {
        Self {
            operation: "add".to_string(),
            field: JsonPointer::parse(field),
            value: Some(value),
        }
    }

    #[must_use]
    pub fn remove(field: &str) -> Self {
        Self {
            operation: "remove".to_string(),
            field: JsonPointer::parse(field),
            value: None,
        }
    }
}

/// Operation specific payload
#[derive(Debug, Clone, PartialEq)]
pub enum RequestKind {
    Create {
        new_resource_id: Option<String>,
        content: Value,
    },
    Read,
    Update {
        content: Value,
        revision: Option<String>,
    },
    Delete {
        revision: Option<String>,
    },
    Patch {
        operations: Vec<PatchOperation>,
        revision: Option<String>,
    },
    Action {
        action: String,
        content: Value,
    },
    Query {
        filter: Option<String>,
        query_id: Option<String>,
        page_size: Option<u32>,
        paged_results_cookie: Option<String>,
        sort_keys: Vec<String>,
    },
}

/// An addressed resource request
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    resource_path: String,
    fields: Vec<JsonPointer>,
    parameters: BTreeMap<String, String>,
    kind: RequestKind,
}

impl Request {
    fn with_kind(resource_path: &str, kind: RequestKind) -> Self {
        Self {
            resource_path: normalize_path(resource_path),
            fields: Vec::new(),
            parameters: BTreeMap::new(),
            kind,
        }
    }

    #[must_use]
    pub fn create(resource_path: &str, content: Value) -> Self {
        Self::with_kind(
            resource_path,
            RequestKind::Create {
                new_resource_id: None,
                content,
            },
        )
    }

    #[must_use]
    pub fn read(resource_path: &str) -> Self {
        Self::with_kind(resource_path, RequestKind::Read)
    }

    #[must_use]
    pub fn update(resource_path: &str, content: Value) -> Self {
        Self::with_kind(
            resource_path,
            RequestKind::Update {
                content,
                revision: None,
            },
        )
    }

    #[must_use]
    pub fn delete(resource_path: &str) -> Self {
        Self::with_kind(resource_path, RequestKind::Delete { revision: None })
    }

    #[must_use]
    pub fn patch(resource_path: &str, operations: Vec<PatchOperation>) -> Self {
        Self::with_kind(
            resource_path,
            RequestKind::Patch {
                operations,
                revision: None,
            },
        )
    }

    #[must_use]
    pub fn action(resource_path: &str, action: &str) -> Self {
        Self::with_kind(
            resource_path,
            RequestKind::Action {
                action: action.to_string(),
                content: Value::Null,
            },
        )
    }

    #[must_use]
    pub fn query(resource_path: &str) -> Self {
        Self::with_kind(
            resource_path,
            RequestKind::Query {
                filter: None,
                query_id: None,
                page_size: None,
                paged_results_cookie: None,
                sort_keys: Vec::new(),
            },
        )
    }

    /// Client assigned id for a create request. Ignored by other operations.
    #[must_use]
    pub fn with_new_resource_id(mut self, id: &str) -> Self {
        if let RequestKind::Create {
            new_resource_id, ..
        } = &mut self.kind
        {
            *new_resource_id = Some(id.to_string());
        }
        self
    }

    /// Expected revision for update, delete and patch. Ignored by other operations.
    #[must_use]
    pub fn with_revision(mut self, rev: &str) -> Self {
        match &mut self.kind {
            RequestKind::Update { revision, .. }
            | RequestKind::Delete { revision }
            | RequestKind::Patch { revision, .. } => *revision = Some(rev.to_string()),
            _ => {}
        }
        self
    }

    /// Body for create, update and action requests. Ignored by other operations.
    #[must_use]
    pub fn with_content(mut self, body: Value) -> Self {
        match &mut self.kind {
            RequestKind::Create { content, .. }
            | RequestKind::Update { content, .. }
            | RequestKind::Action { content, .. } => *content = body,
            _ => {}
        }
        self
    }

    /// Filter expression for query requests. Ignored by other operations.
    #[must_use]
    pub fn with_query_filter(mut self, expression: &str) -> Self {
        if let RequestKind::Query { filter, .. } = &mut self.kind {
            *filter = Some(expression.to_string());
        }
        self
    }

    /// Page size for query requests. Ignored by other operations.
    #[must_use]
    pub fn with_page_size(mut self, size: u32) -> Self {
        if let RequestKind::Query { page_size, .. } = &mut self.kind {
            *page_size = Some(size);
        }
        self
    }

    #[must_use]
    pub fn with_fields<I, P>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<JsonPointer>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_parameter(mut self, name: &str, value: &str) -> Self {
        self.parameters.insert(name.to_string(), value.to_string());
        self
    }

    /// Copy of this request addressed to `path` instead
    #[must_use]
    pub fn with_resource_path(mut self, path: &str) -> Self {
        self.resource_path = normalize_path(path);
        self
    }

    #[must_use]
    pub fn operation(&self) -> Operation {
        match self.kind {
            RequestKind::Create { .. } => Operation::Create,
            RequestKind::Read => Operation::Read,
            RequestKind::Update { .. } => Operation::Update,
            RequestKind::Delete { .. } => Operation::Delete,
            RequestKind::Patch { .. } => Operation::Patch,
            RequestKind::Action { .. } => Operation::Action,
            RequestKind::Query { .. } => Operation::Query,
        }
    }

    #[must_use]
    pub fn kind(&self) -> &RequestKind {
        &self.kind
    }

    #[must_use]
    pub fn resource_path(&self) -> &str {
        &self.resource_path
    }

    #[must_use]
    pub fn fields(&self) -> &[JsonPointer] {
        &self.fields
    }

    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn parameters(&self) -> &BTreeMap<String, String> {
        &self.parameters
    }

    #[must_use]
    pub fn content(&self) -> Option<&Value> {
        match &self.kind {
            RequestKind::Create { content, .. }
            | RequestKind::Update { content, .. }
            | RequestKind::Action { content, .. } => Some(content),
            _ => None,
        }
    }

    #[must_use]
    pub fn revision(&self) -> Option<&str> {
        match &self.kind {
            RequestKind::Update { revision, .. }
            | RequestKind::Delete { revision }
            | RequestKind::Patch { revision, .. } => revision.as_deref(),
            _ => None,
        }
    }

    #[must_use]
    pub fn new_resource_id(&self) -> Option<&str> {
        match &self.kind {
            RequestKind::Create {
                new_resource_id, ..
            } => new_resource_id.as_deref(),
            _ => None,
        }
    }

    #[must_use]
    pub fn action_name(&self) -> Option<&str> {
        match &self.kind {
            RequestKind::Action { action, .. } => Some(action),
            _ => None,
        }
    }
}

/// Strip leading and trailing slashes; resource paths are always relative
pub(crate) fn normalize_path(path: &str) -> String {
    path.trim_matches('/').to_string()
}
