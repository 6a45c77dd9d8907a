use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::ResourceError;
use crate::pointer::JsonPointer;

/// A single resource: identity, revision and JSON content
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceResponse {
    id: Option<String>,
    revision: Option<String>,
    content: Value,
    fields: Vec<JsonPointer>,
}

impl ResourceResponse {
    #[must_use]
    pub fn new(id: Option<&str>, revision: Option<&str>, content: Value) -> Self {
        Self {
            id: id.map(str::to_string),
            revision: revision.map(str::to_string),
            content,
            fields: Vec::new(),
        }
    }

    /// Record the fields this resource should be projected onto. These take
    /// precedence over whatever fields the request asked for.
    #[must_use]
    pub fn with_fields(mut self, fields: Vec<JsonPointer>) -> Self {
        self.fields = fields;
        self
    }

    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    #[must_use]
    pub fn revision(&self) -> Option<&str> {
        self.revision.as_deref()
    }

    #[must_use]
    pub fn content(&self) -> &Value {
        &self.content
    }

    #[must_use]
    pub fn into_content(self) -> Value {
        self.content
    }

    #[must_use]
    pub fn has_fields(&self) -> bool {
        !self.fields.is_empty()
    }

    #[must_use]
    pub fn fields(&self) -> &[JsonPointer] {
        &self.fields
    }

    /// Wire form: the content object with `_id` and `_rev` merged in front
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut out = Map::new();
        if let Some(id) = &self.id {
            out.insert("_id".to_string(), Value::String(id.clone()));
        }
        if let Some(rev) = &self.revision {
            out.insert("_rev".to_string(), Value::String(rev.clone()));
        }
        match &self.content {
            Value::Object(members) => {
                for (k, v) in members {
                    out.insert(k.clone(), v.clone());
                }
            }
            Value::Null => {}
            other => {
                out.insert("content".to_string(), other.clone());
            }
        }
        Value::Object(out)
    }
}

/// Result of an action: arbitrary JSON
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionResponse {
    pub content: Value,
}

impl ActionResponse {
    #[must_use]
    pub fn new(content: Value) -> Self {
        Self { content }
    }
}

/// Result of a query
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryResponse {
    pub resources: Vec<ResourceResponse>,
    pub paged_results_cookie: Option<String>,
    /// `None` when the provider cannot count cheaply
    pub total_paged_results: Option<u64>,
}

impl QueryResponse {
    #[must_use]
    pub fn new(resources: Vec<ResourceResponse>) -> Self {
        Self {
            resources,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "result": self.resources.iter().map(ResourceResponse::to_json).collect::<Vec<_>>(),
            "resultCount": self.resources.len(),
            "pagedResultsCookie": self.paged_results_cookie,
            "totalPagedResults": self.total_paged_results,
        })
    }
}

/// Uniform result of [`crate::provider::RequestHandler::handle`]
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Resource(ResourceResponse),
    Action(ActionResponse),
    Query(QueryResponse),
}

impl Response {
    pub fn into_resource(self) -> Result<ResourceResponse, ResourceError> {
        match self {
            Response::Resource(r) => Ok(r),
            other => Err(mismatch("resource", &other)),
        }
    }

    pub fn into_action(self) -> Result<ActionResponse, ResourceError> {
        match self {
            Response::Action(a) => Ok(a),
            other => Err(mismatch("action", &other)),
        }
    }

    pub fn into_query(self) -> Result<QueryResponse, ResourceError> {
        match self {
            Response::Query(q) => Ok(q),
            other => Err(mismatch("query", &other)),
        }
    }

    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Response::Resource(r) => r.to_json(),
            Response::Action(a) => a.content.clone(),
            Response::Query(q) => q.to_json(),
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Response::Resource(_) => "resource",
            Response::Action(_) => "action",
            Response::Query(_) => "query",
        }
    }
}

fn mismatch(expected: &str, got: &Response) -> ResourceError {
    ResourceError::internal(format!(
        "handler returned a {} response where a {expected} response was expected",
        got.label()
    ))
}

impl From<ResourceResponse> for Response {
    fn from(r: ResourceResponse) -> Self {
        Response::Resource(r)
    }
}

impl From<ActionResponse> for Response {
    fn from(a: ActionResponse) -> Self {
        Response::Action(a)
    }
}

impl From<QueryResponse> for Response {
    fn from(q: QueryResponse) -> Self {
        Response::Query(q)
    }
}
