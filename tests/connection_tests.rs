//! Tests for the connection façade over a full handler tree
//!
//! # Test Coverage
//!
//! - Blocking convenience calls over the demo tree (CRUD, patch, action, query)
//! - Revision checks surfacing as errors through the façade
//! - Uncloseable wrappers never closing their delegate
//! - Factories handing out independent connections
//! - Synchronous handlers adapted to the asynchronous contract

mod common;

use common::fixtures::Recorder;
use resrouter::connection::{
    as_request_handler, new_internal_connection, new_internal_connection_factory, uncloseable,
    uncloseable_factory, Connection, SynchronousRequestHandler,
};
use resrouter::context::Context;
use resrouter::demo::demo_provider;
use resrouter::error::{ErrorKind, ResourceError};
use resrouter::ids::RequestId;
use resrouter::provider::Provider;
use resrouter::request::{PatchOperation, Request};
use resrouter::response::{ResourceResponse, Response};
use resrouter::router::new_handler;
use serde_json::json;
use std::sync::Arc;

fn demo_connection() -> Arc<dyn Connection> {
    let router = new_handler(demo_provider()).unwrap();
    new_internal_connection(Arc::new(router))
}

#[test]
fn test_collection_lifecycle_through_connection() {
    let conn = demo_connection();

    let created = conn
        .create(
            Context::new(),
            Request::create("users", json!({"name": "Grace Hopper"})).with_new_resource_id("grace"),
        )
        .unwrap();
    assert_eq!(created.id(), Some("grace"));
    assert_eq!(created.revision(), Some("0"));

    let patched = conn
        .patch(
            Context::new(),
            Request::patch(
                "users/grace",
                vec![PatchOperation::add("email", json!("grace@example.com"))],
            )
            .with_revision("0"),
        )
        .unwrap();
    assert_eq!(patched.revision(), Some("1"));
    assert_eq!(patched.content()["email"], "grace@example.com");

    let stale = conn
        .update(
            Context::new(),
            Request::update("users/grace", json!({})).with_revision("0"),
        )
        .unwrap_err();
    assert_eq!(stale.kind(), ErrorKind::PreconditionFailed);

    let count = conn
        .action(Context::new(), Request::action("users", "count"))
        .unwrap();
    assert_eq!(count.content["count"], 3);

    conn.delete(Context::new(), Request::delete("users/grace"))
        .unwrap();
    let gone = conn
        .read(Context::new(), Request::read("users/grace"))
        .unwrap_err();
    assert_eq!(gone.kind(), ErrorKind::NotFound);
}

#[test]
fn test_query_with_fields_filters_every_result() {
    let conn = demo_connection();
    let page = conn
        .query(Context::new(), Request::query("users").with_fields(["email"]))
        .unwrap();

    assert_eq!(page.resources.len(), 2);
    assert_eq!(page.total_paged_results, Some(2));
    for resource in &page.resources {
        assert!(resource.content().get("email").is_some());
        assert!(resource.content().get("name").is_none());
    }
}

#[test]
fn test_singleton_rejects_collection_operations() {
    let conn = demo_connection();
    let err = conn
        .delete(Context::new(), Request::delete("settings"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadRequest);
    assert_eq!(err.message(), "The singleton resource Settings cannot be deleted");
}

#[test]
fn test_wrong_convenience_call_is_rejected() {
    let conn = demo_connection();
    let err = conn
        .read(Context::new(), Request::query("users"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadRequest);
}

#[test]
fn test_request_id_reaches_the_handler() {
    let conn = demo_connection();
    let id = RequestId::new();
    let echoed = conn
        .read(Context::with_request_id(id), Request::read("echo/anything"))
        .unwrap();
    assert_eq!(echoed.content()["requestId"], id.to_string());
    assert_eq!(echoed.content()["path"], "anything");
}

#[test]
fn test_uncloseable_connection_returns_identical_results() {
    let inner = demo_connection();
    let wrapped = uncloseable(Arc::clone(&inner));

    wrapped.close();
    assert!(!inner.is_closed());
    assert!(wrapped.is_valid());

    let direct = inner.read(Context::new(), Request::read("users/alan")).unwrap();
    let through = wrapped.read(Context::new(), Request::read("users/alan")).unwrap();
    assert_eq!(direct, through);

    let direct = inner.read(Context::new(), Request::read("missing/x")).unwrap_err();
    let through = wrapped.read(Context::new(), Request::read("missing/x")).unwrap_err();
    assert_eq!(direct, through);
}

#[test]
fn test_uncloseable_factory_keeps_delegate_open() {
    let router = new_handler(demo_provider()).unwrap();
    let factory = new_internal_connection_factory(Arc::new(router));
    let wrapped = uncloseable_factory(Arc::clone(&factory));

    wrapped.close();
    let conn = factory.get_connection().unwrap();
    assert!(conn.is_valid());
    assert!(wrapped.get_connection().is_ok());

    factory.close();
    let err = wrapped.get_connection().err().unwrap();
    assert_eq!(err.kind(), ErrorKind::ServiceUnavailable);
}

#[test]
fn test_closing_one_connection_leaves_others_open() {
    let router = new_handler(demo_provider()).unwrap();
    let factory = new_internal_connection_factory(Arc::new(router));
    let first = factory.get_connection().unwrap();
    let second = factory.get_connection().unwrap();

    first.close();
    let err = first
        .read(Context::new(), Request::read("settings"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ServiceUnavailable);
    assert_eq!(
        second
            .read(Context::new(), Request::read("settings"))
            .unwrap()
            .content()["theme"],
        "dark"
    );
}

struct Clock;

impl SynchronousRequestHandler for Clock {
    fn handle_sync(&self, _context: Context, request: Request) -> Result<Response, ResourceError> {
        if request.resource_path().is_empty() {
            Ok(ResourceResponse::new(None, None, json!({"now": "noon"})).into())
        } else {
            Err(ResourceError::not_found("no such clock"))
        }
    }
}

#[test]
fn test_synchronous_handler_mounted_in_tree() {
    let clock = as_request_handler(Clock);
    let provider = Provider::builder("Root")
        .handler(Recorder::new("root"))
        .sub_path("clock", move || {
            Ok(Provider::handler("Clock", Arc::clone(&clock)))
        })
        .build();
    let conn = new_internal_connection(Arc::new(new_handler(provider).unwrap()));

    let now = conn.read(Context::new(), Request::read("clock")).unwrap();
    assert_eq!(now.content()["now"], "noon");

    let err = conn
        .read(Context::new(), Request::read("clock/tower"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let other = conn.read(Context::new(), Request::read("elsewhere")).unwrap();
    assert_eq!(other.content()["label"], "root");
}

#[test]
fn test_connection_shared_across_threads() {
    let conn = demo_connection();
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let conn = Arc::clone(&conn);
            std::thread::spawn(move || {
                conn.create(
                    Context::new(),
                    Request::create("users/roles", json!({"n": i})),
                )
                .map(|r| r.id().map(str::to_string))
            })
        })
        .collect();
    let mut ids: Vec<String> = handles
        .into_iter()
        .map(|h| h.join().unwrap().unwrap().unwrap())
        .collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 4);
}
