//! In-memory providers used by the `resrouter` binary and the test suite.
//!
//! The demo tree looks like this:
//!
//! ```text
//! (root)          singleton, bindings only   read
//! ├── users       collection                 in-memory store
//! │   └── roles   collection                 in-memory store
//! ├── settings    singleton                  in-memory document
//! └── echo        request handler            echoes what it received
//! ```

use futures::future::{self, FutureExt};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::context::Context;
use crate::error::ResourceError;
use crate::pointer::JsonPointer;
use crate::provider::{
    CollectionResourceProvider, Provider, RequestHandler, ResourceFuture,
    SingletonResourceProvider, Variant,
};
use crate::request::{Operation, PatchOperation, Request, RequestKind};
use crate::response::{ActionResponse, QueryResponse, ResourceResponse, Response};

fn ready<T: Send + 'static>(result: Result<T, ResourceError>) -> ResourceFuture<T> {
    future::ready(result).boxed()
}

fn object_mut(node: &mut Value) -> Result<&mut Map<String, Value>, ResourceError> {
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    node.as_object_mut()
        .ok_or_else(|| ResourceError::internal("patch target is not an object"))
}

/// Echoes the operation, residual path, bound variables and body back
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoHandler;

impl RequestHandler for EchoHandler {
    fn handle(&self, context: Context, request: Request) -> ResourceFuture<Response> {
        let variables: Map<String, Value> = context
            .frames()
            .iter()
            .filter_map(|f| match f {
                crate::context::Frame::Routing(r) => Some(r.variables()),
                _ => None,
            })
            .flatten()
            .map(|(k, v)| (k.to_string(), Value::String(v.clone())))
            .collect();
        let body = json!({
            "operation": request.operation(),
            "path": request.resource_path(),
            "base": context.base_path(),
            "variables": variables,
            "parameters": request.parameters(),
            "content": request.content(),
            "requestId": context.request_id().map(|id| id.to_string()),
        });
        let response = match request.operation() {
            Operation::Action => ActionResponse::new(body).into(),
            Operation::Query => {
                QueryResponse::new(vec![ResourceResponse::new(None, None, body)]).into()
            }
            _ => ResourceResponse::new(None, None, body).into(),
        };
        ready(Ok(response))
    }
}

#[derive(Debug, Clone)]
struct Stored {
    revision: u64,
    content: Value,
}

impl Stored {
    fn to_response(&self, id: &str) -> ResourceResponse {
        ResourceResponse::new(Some(id), Some(&self.revision.to_string()), self.content.clone())
    }
}

fn check_revision(request: &Request, current: u64) -> Result<(), ResourceError> {
    match request.revision() {
        Some(expected) if expected != "*" && expected != current.to_string() => {
            Err(ResourceError::precondition_failed(format!(
                "Expected revision {expected} but found {current}"
            )))
        }
        _ => Ok(()),
    }
}

/// Apply one patch step to `target`
pub fn apply_patch(target: &mut Value, op: &PatchOperation) -> Result<(), ResourceError> {
    let Some(leaf) = op.field.leaf().map(str::to_string) else {
        return match (op.operation.as_str(), &op.value) {
            ("replace", Some(v)) => {
                *target = v.clone();
                Ok(())
            }
            _ => Err(ResourceError::bad_request(format!(
                "Cannot {} the whole resource",
                op.operation
            ))),
        };
    };

    let mut node = target;
    for token in &op.field.tokens()[..op.field.len() - 1] {
        node = object_mut(node)?
            .entry(token.clone())
            .or_insert_with(|| json!({}));
    }
    let map = object_mut(node)?;

    match (op.operation.as_str(), &op.value) {
        ("add" | "replace", Some(v)) => {
            map.insert(leaf, v.clone());
        }
        ("remove", _) => {
            map.remove(&leaf);
        }
        ("increment", Some(Value::Number(delta))) => {
            let current = map.get(&leaf).and_then(Value::as_f64).unwrap_or(0.0);
            let sum = current + delta.as_f64().unwrap_or(0.0);
            let value = if sum.fract() == 0.0 && sum.abs() < 9.0e15 {
                json!(sum as i64)
            } else {
                json!(sum)
            };
            map.insert(leaf, value);
        }
        (other, _) => {
            return Err(ResourceError::bad_request(format!(
                "Unsupported patch operation '{other}' on {}",
                op.field
            )));
        }
    }
    Ok(())
}

/// In-memory collection keyed by id, with integer revisions
#[derive(Debug, Clone)]
pub struct MemoryCollection {
    name: Arc<str>,
    records: Arc<RwLock<BTreeMap<String, Stored>>>,
    next_id: Arc<AtomicU64>,
}

impl MemoryCollection {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: Arc::from(name),
            records: Arc::new(RwLock::new(BTreeMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Seed a record at revision 0, replacing any record with the same id
    pub fn insert(&self, id: &str, content: Value) {
        self.lock_write().insert(
            id.to_string(),
            Stored {
                revision: 0,
                content,
            },
        );
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock_read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock_read(&self) -> RwLockReadGuard<'_, BTreeMap<String, Stored>> {
        self.records.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_write(&self) -> RwLockWriteGuard<'_, BTreeMap<String, Stored>> {
        self.records.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn not_found(&self, id: &str) -> ResourceError {
        ResourceError::not_found(format!("Resource '{}/{id}' not found", self.name))
    }

    fn create_now(&self, request: &Request) -> Result<ResourceResponse, ResourceError> {
        let mut records = self.lock_write();
        let id = match request.new_resource_id() {
            Some(id) => id.to_string(),
            None => loop {
                let candidate = self.next_id.fetch_add(1, Ordering::Relaxed).to_string();
                if !records.contains_key(&candidate) {
                    break candidate;
                }
            },
        };
        if records.contains_key(&id) {
            return Err(ResourceError::conflict(format!(
                "Resource '{}/{id}' already exists",
                self.name
            )));
        }
        let stored = Stored {
            revision: 0,
            content: request.content().cloned().unwrap_or_else(|| json!({})),
        };
        let response = stored.to_response(&id);
        records.insert(id, stored);
        Ok(response)
    }

    fn read_now(&self, id: &str) -> Result<ResourceResponse, ResourceError> {
        self.lock_read()
            .get(id)
            .map(|s| s.to_response(id))
            .ok_or_else(|| self.not_found(id))
    }

    fn modify_now<F>(
        &self,
        id: &str,
        request: &Request,
        change: F,
    ) -> Result<ResourceResponse, ResourceError>
    where
        F: FnOnce(&mut Value) -> Result<(), ResourceError>,
    {
        let mut records = self.lock_write();
        let stored = records.get_mut(id).ok_or_else(|| self.not_found(id))?;
        check_revision(request, stored.revision)?;
        let mut content = stored.content.clone();
        change(&mut content)?;
        stored.content = content;
        stored.revision += 1;
        Ok(stored.to_response(id))
    }

    fn delete_now(&self, id: &str, request: &Request) -> Result<ResourceResponse, ResourceError> {
        let mut records = self.lock_write();
        let current = records.get(id).ok_or_else(|| self.not_found(id))?;
        check_revision(request, current.revision)?;
        let removed = records.remove(id).ok_or_else(|| self.not_found(id))?;
        Ok(removed.to_response(id))
    }

    fn query_now(&self, request: &Request) -> Result<QueryResponse, ResourceError> {
        let (page_size, cookie) = match request.kind() {
            RequestKind::Query {
                page_size,
                paged_results_cookie,
                ..
            } => (page_size.map(|n| n as usize), paged_results_cookie.clone()),
            _ => (None, None),
        };
        let records = self.lock_read();
        let after = cookie.as_deref().unwrap_or("");
        let mut matching = records
            .iter()
            .filter(|(id, _)| cookie.is_none() || id.as_str() > after);
        let limit = page_size.filter(|n| *n > 0).unwrap_or(usize::MAX);
        let resources: Vec<ResourceResponse> = matching
            .by_ref()
            .take(limit)
            .map(|(id, s)| s.to_response(id))
            .collect();
        let more = matching.next().is_some();
        Ok(QueryResponse {
            paged_results_cookie: if more {
                resources.last().and_then(|r| r.id()).map(str::to_string)
            } else {
                None
            },
            total_paged_results: Some(records.len() as u64),
            resources,
        })
    }

    fn action_now(
        &self,
        id: Option<&str>,
        request: &Request,
    ) -> Result<ActionResponse, ResourceError> {
        match (request.action_name(), id) {
            (Some("count"), None) => Ok(ActionResponse::new(json!({"count": self.len()}))),
            (Some("clear"), None) => {
                let mut records = self.lock_write();
                let cleared = records.len();
                records.clear();
                Ok(ActionResponse::new(json!({"cleared": cleared})))
            }
            (Some("touch"), Some(id)) => {
                let touched = self.modify_now(id, request, |_| Ok(()))?;
                Ok(ActionResponse::new(json!({"_id": id, "_rev": touched.revision()})))
            }
            (name, _) => Err(ResourceError::not_supported(format!(
                "Action '{}' is not supported by resource '{}'",
                name.unwrap_or_default(),
                self.name
            ))),
        }
    }
}

impl CollectionResourceProvider for MemoryCollection {
    fn create(&self, _context: Context, request: Request) -> ResourceFuture<ResourceResponse> {
        ready(self.create_now(&request))
    }

    fn read(
        &self,
        _context: Context,
        id: String,
        _request: Request,
    ) -> ResourceFuture<ResourceResponse> {
        ready(self.read_now(&id))
    }

    fn update(
        &self,
        _context: Context,
        id: String,
        request: Request,
    ) -> ResourceFuture<ResourceResponse> {
        let body = request.content().cloned().unwrap_or_else(|| json!({}));
        ready(self.modify_now(&id, &request, |content| {
            *content = body;
            Ok(())
        }))
    }

    fn delete(
        &self,
        _context: Context,
        id: String,
        request: Request,
    ) -> ResourceFuture<ResourceResponse> {
        ready(self.delete_now(&id, &request))
    }

    fn patch(
        &self,
        _context: Context,
        id: String,
        request: Request,
    ) -> ResourceFuture<ResourceResponse> {
        let operations = match request.kind() {
            RequestKind::Patch { operations, .. } => operations.clone(),
            _ => Vec::new(),
        };
        ready(self.modify_now(&id, &request, |content| {
            operations.iter().try_for_each(|op| apply_patch(content, op))
        }))
    }

    fn action_collection(
        &self,
        _context: Context,
        request: Request,
    ) -> ResourceFuture<ActionResponse> {
        ready(self.action_now(None, &request))
    }

    fn action_instance(
        &self,
        _context: Context,
        id: String,
        request: Request,
    ) -> ResourceFuture<ActionResponse> {
        ready(self.action_now(Some(&id), &request))
    }

    fn query(&self, _context: Context, request: Request) -> ResourceFuture<QueryResponse> {
        ready(self.query_now(&request))
    }
}

/// In-memory singleton document with an integer revision
#[derive(Debug, Clone)]
pub struct MemorySingleton {
    document: Arc<RwLock<Stored>>,
}

impl MemorySingleton {
    #[must_use]
    pub fn new(content: Value) -> Self {
        Self {
            document: Arc::new(RwLock::new(Stored {
                revision: 0,
                content,
            })),
        }
    }

    fn modify_now<F>(&self, request: &Request, change: F) -> Result<ResourceResponse, ResourceError>
    where
        F: FnOnce(&mut Value) -> Result<(), ResourceError>,
    {
        let mut doc = self.document.write().unwrap_or_else(PoisonError::into_inner);
        check_revision(request, doc.revision)?;
        let mut content = doc.content.clone();
        change(&mut content)?;
        doc.content = content;
        doc.revision += 1;
        Ok(ResourceResponse::new(None, Some(&doc.revision.to_string()), doc.content.clone()))
    }
}

impl SingletonResourceProvider for MemorySingleton {
    fn read(&self, _context: Context, _request: Request) -> ResourceFuture<ResourceResponse> {
        let doc = self.document.read().unwrap_or_else(PoisonError::into_inner);
        let revision = doc.revision.to_string();
        ready(Ok(ResourceResponse::new(
            None,
            Some(&revision),
            doc.content.clone(),
        )))
    }

    fn update(&self, _context: Context, request: Request) -> ResourceFuture<ResourceResponse> {
        let body = request.content().cloned().unwrap_or_else(|| json!({}));
        ready(self.modify_now(&request, |content| {
            *content = body;
            Ok(())
        }))
    }

    fn patch(&self, _context: Context, request: Request) -> ResourceFuture<ResourceResponse> {
        let operations = match request.kind() {
            RequestKind::Patch { operations, .. } => operations.clone(),
            _ => Vec::new(),
        };
        ready(self.modify_now(&request, |content| {
            operations.iter().try_for_each(|op| apply_patch(content, op))
        }))
    }
}

/// The demo provider tree; `users` is seeded with two records
pub fn demo_provider() -> Provider {
    let users = MemoryCollection::new("users");
    let roles = MemoryCollection::new("roles");
    let settings = MemorySingleton::new(json!({"theme": "dark", "language": "en"}));
    users.insert("ada", json!({"name": "Ada Lovelace", "email": "ada@example.com"}));
    users.insert("alan", json!({"name": "Alan Turing", "email": "alan@example.com"}));
    roles.insert("admin", json!({"description": "Full access"}));

    Provider::builder("Root")
        .variant(Variant::SingletonResource)
        .title("resrouter demo")
        .bind(Operation::Read, |call| {
            let depth = call.context.depth();
            async move {
                let body = json!({
                    "name": "resrouter demo",
                    "version": env!("CARGO_PKG_VERSION"),
                    "depth": depth,
                });
                Ok(ResourceResponse::new(None, None, body).into())
            }
            .boxed()
        })
        .sub_path("users", move || {
            let roles = roles.clone();
            Ok(Provider::builder("Users")
                .collection(users.clone())
                .title("Users")
                .schema(
                    "User",
                    json!({
                        "type": "object",
                        "properties": {
                            "name": {"type": "string"},
                            "email": {"type": "string"}
                        }
                    }),
                )
                .sub_path("roles", move || {
                    Ok(Provider::builder("Roles").collection(roles.clone()).title("Roles").build())
                })
                .build())
        })
        .sub_path("settings", move || {
            Ok(Provider::builder("Settings")
                .singleton(settings.clone())
                .title("Settings")
                .build())
        })
        .sub_path("echo", || Ok(Provider::handler("Echo", EchoHandler)))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use futures::executor::block_on;

    #[test]
    fn test_collection_lifecycle() {
        let users = MemoryCollection::new("users");
        let ctx = Context::new;
        let created = block_on(users.create(
            ctx(),
            Request::create("", json!({"name": "x"})).with_new_resource_id("x"),
        ))
        .unwrap();
        assert_eq!(created.id(), Some("x"));
        assert_eq!(created.revision(), Some("0"));

        let dup = block_on(users.create(
            ctx(),
            Request::create("", json!({})).with_new_resource_id("x"),
        ))
        .unwrap_err();
        assert_eq!(dup.kind(), ErrorKind::Conflict);

        let stale = block_on(users.update(
            ctx(),
            "x".to_string(),
            Request::update("", json!({"name": "y"})).with_revision("5"),
        ))
        .unwrap_err();
        assert_eq!(stale.kind(), ErrorKind::PreconditionFailed);

        let updated = block_on(users.update(
            ctx(),
            "x".to_string(),
            Request::update("", json!({"name": "y"})).with_revision("0"),
        ))
        .unwrap();
        assert_eq!(updated.revision(), Some("1"));

        block_on(users.delete(ctx(), "x".to_string(), Request::delete(""))).unwrap();
        assert!(users.is_empty());
    }

    #[test]
    fn test_generated_ids() {
        let users = MemoryCollection::new("users");
        let a = block_on(users.create(Context::new(), Request::create("", json!({})))).unwrap();
        let b = block_on(users.create(Context::new(), Request::create("", json!({})))).unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_query_paging() {
        let users = MemoryCollection::new("users");
        for id in ["a", "b", "c"] {
            users.insert(id, json!({}));
        }
        let first =
            block_on(users.query(Context::new(), Request::query("").with_page_size(2))).unwrap();
        assert_eq!(first.resources.len(), 2);
        assert_eq!(first.paged_results_cookie.as_deref(), Some("b"));
        assert_eq!(first.total_paged_results, Some(3));
    }

    #[test]
    fn test_apply_patch() {
        let mut doc = json!({"name": {"first": "Ada"}, "visits": 1});
        apply_patch(&mut doc, &PatchOperation::replace("name/last", json!("Lovelace"))).unwrap();
        apply_patch(&mut doc, &PatchOperation::remove("name/first")).unwrap();
        apply_patch(
            &mut doc,
            &PatchOperation {
                operation: "increment".to_string(),
                field: JsonPointer::parse("visits"),
                value: Some(json!(2)),
            },
        )
        .unwrap();
        assert_eq!(doc, json!({"name": {"last": "Lovelace"}, "visits": 3}));

        let err = apply_patch(&mut doc, &PatchOperation::remove("")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
    }

    #[test]
    fn test_singleton_patch_bumps_revision() {
        let settings = MemorySingleton::new(json!({"theme": "dark"}));
        let res = block_on(settings.patch(
            Context::new(),
            Request::patch("", vec![PatchOperation::replace("theme", json!("light"))]),
        ))
        .unwrap();
        assert_eq!(res.revision(), Some("1"));
        assert_eq!(res.content()["theme"], "light");
    }

    #[test]
    fn test_echo_reports_path() {
        let res = block_on(EchoHandler.handle(Context::new(), Request::read("a/b")))
            .unwrap()
            .into_resource()
            .unwrap();
        assert_eq!(res.content()["path"], "a/b");
        assert_eq!(res.content()["operation"], "read");
    }
}
