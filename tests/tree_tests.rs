//! Tests for building handler trees from providers
//!
//! # Test Coverage
//!
//! - Sub-paths become reachable routes and nested descriptor entries
//! - Collections route both the container and its instances
//! - Path prefixes relocate the whole subtree
//! - Accessor failures abort the build with a single error
//! - Accessor cycles stop at the configured depth
//! - Descriptor contents (operations, actions, schema references)

mod common;

use anyhow::anyhow;
use common::fixtures::{bound_singleton, call, read_content, users, Recorder};
use common::tracing_capture::TestTracing;
use futures::FutureExt;
use resrouter::config::RouterConfig;
use resrouter::descriptor::Describable;
use resrouter::error::{ErrorKind, RouterError};
use resrouter::provider::{Provider, Variant};
use resrouter::request::{Operation, Request};
use resrouter::response::{ResourceResponse, Response};
use resrouter::router::{new_handler, new_handler_with_config};
use serde_json::json;

fn tree_with_sub_path() -> Provider {
    Provider::builder("A")
        .variant(Variant::SingletonResource)
        .bind(Operation::Read, |_call| {
            futures::future::ready(Ok(Response::Resource(ResourceResponse::new(
                None,
                None,
                json!({"at": "a"}),
            ))))
            .boxed()
        })
        .path("a")
        .sub_path("/b", || Ok(bound_singleton("B", json!({"at": "b"}))))
        .build()
}

#[test]
fn test_sub_path_route_is_reachable() {
    let router = new_handler(tree_with_sub_path()).unwrap();

    assert_eq!(read_content(&router, "a")["at"], "a");
    assert_eq!(read_content(&router, "/a/b/")["at"], "b");

    let api = router.api_descriptor();
    assert!(api.root.sub_resource("b").is_some());
    assert_eq!(api.base_path.as_deref(), Some("a"));
}

#[test]
fn test_path_prefix_relocates_subtree() {
    let router = new_handler(tree_with_sub_path()).unwrap();

    let err = call(&router, Request::read("b")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let table = router.route_table();
    assert!(table.iter().all(|line| line.starts_with("STARTS_WITH a => ")));
    assert!(table.iter().any(|line| line.ends_with("EQUALS b")));
}

#[test]
fn test_sub_path_prefix_is_appended_to_mount_point() {
    let provider = Provider::builder("Root")
        .variant(Variant::RequestHandler)
        .handler(Recorder::new("root"))
        .sub_path("reports", || {
            Ok(Provider::builder("Reports")
                .path("v2")
                .handler(Recorder::new("reports"))
                .build())
        })
        .build();
    let router = new_handler(provider).unwrap();

    let report = read_content(&router, "reports/v2/2024/q1");
    assert_eq!(report["label"], "reports");
    assert_eq!(report["path"], "2024/q1");

    let fallback = read_content(&router, "reports/2024");
    assert_eq!(fallback["label"], "root");
    assert_eq!(fallback["path"], "reports/2024");
}

#[test]
fn test_collection_routes_container_and_instances() {
    let provider = Provider::builder("Users").collection(users()).build();
    let router = new_handler(provider).unwrap();

    let ada = read_content(&router, "ada");
    assert_eq!(ada["name"], "Ada Lovelace");

    let page = call(&router, Request::query("").with_page_size(1))
        .unwrap()
        .into_query()
        .unwrap();
    assert_eq!(page.resources.len(), 1);
    assert_eq!(page.paged_results_cookie.as_deref(), Some("ada"));

    let err = call(&router, Request::read("")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadRequest);
    assert_eq!(err.message(), "The resource collection Users cannot be read");

    let err = call(&router, Request::query("ada")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadRequest);
}

#[test]
fn test_custom_id_variable() {
    let config = RouterConfig {
        id_variable: "userId".to_string(),
        ..RouterConfig::default()
    };
    let provider = Provider::builder("Users").collection(users()).build();
    let router = new_handler_with_config(provider, &config).unwrap();

    assert!(router
        .route_table()
        .iter()
        .any(|line| line == "EQUALS {userId}"));
    assert_eq!(read_content(&router, "alan")["born"], 1912);
}

#[test]
fn test_handler_sees_residual_path_and_frame() {
    let provider = Provider::builder("Files")
        .handler(Recorder::new("files"))
        .build();
    let router = new_handler(provider).unwrap();

    let seen = read_content(&router, "docs/readme.md");
    assert_eq!(seen["path"], "docs/readme.md");
    assert_eq!(seen["operation"], "read");
    // root frame plus the routing frame pushed by the router
    assert_eq!(seen["depth"], 2);
}

#[test]
fn test_accessor_failure_aborts_build() {
    let provider = Provider::builder("Root")
        .variant(Variant::SingletonResource)
        .sub_path("ok", || Ok(bound_singleton("Ok", json!({}))))
        .sub_path("broken", || Err(anyhow!("backend offline")))
        .build();

    let tracing = TestTracing::init();
    let err = new_handler(provider).unwrap_err();
    match &err {
        RouterError::HandlerTree { path, source } => {
            assert_eq!(path, "broken");
            assert_eq!(source.to_string(), "backend offline");
        }
        other => panic!("expected HandlerTree, got {other:?}"),
    }
    assert_eq!(
        err.to_string(),
        "could not construct handler tree at 'broken'"
    );
    assert!(tracing.contains("Failed to build handler tree"));
}

#[test]
fn test_nested_accessor_failure_reports_full_path() {
    let provider = Provider::builder("Root")
        .variant(Variant::SingletonResource)
        .sub_path("outer", || {
            Ok(Provider::builder("Outer")
                .variant(Variant::SingletonResource)
                .sub_path("inner", || Err(anyhow!("nope")))
                .build())
        })
        .build();

    match new_handler(provider).unwrap_err() {
        RouterError::HandlerTree { path, .. } => assert_eq!(path, "outer/inner"),
        other => panic!("expected HandlerTree, got {other:?}"),
    }
}

fn endless() -> Provider {
    Provider::builder("Endless")
        .variant(Variant::SingletonResource)
        .sub_path("again", || Ok(endless()))
        .build()
}

#[test]
fn test_accessor_cycle_stops_at_max_depth() {
    let config = RouterConfig {
        max_depth: 3,
        ..RouterConfig::default()
    };
    match new_handler_with_config(endless(), &config).unwrap_err() {
        RouterError::TooDeep { path, max_depth } => {
            assert_eq!(max_depth, 3);
            assert_eq!(path, "again/again/again/again");
        }
        other => panic!("expected TooDeep, got {other:?}"),
    }
}

#[test]
fn test_undeducible_sub_path_fails() {
    let provider = Provider::builder("Root")
        .variant(Variant::SingletonResource)
        .sub_path("mystery", || Ok(Provider::builder("Mystery").build()))
        .build();

    match new_handler(provider).unwrap_err() {
        RouterError::CannotDeduceVariant { provider } => assert_eq!(provider, "Mystery"),
        other => panic!("expected CannotDeduceVariant, got {other:?}"),
    }
}

#[test]
fn test_descriptor_reports_bound_operations_and_schema() {
    let provider = Provider::builder("Root")
        .variant(Variant::SingletonResource)
        .title("Root")
        .sub_path("users", || {
            Ok(Provider::builder("Users")
                .collection(users())
                .schema("User", json!({"type": "object"}))
                .build())
        })
        .sub_path("status", || Ok(bound_singleton("Status", json!({"up": true}))))
        .build();
    let router = new_handler(provider).unwrap();
    let api = router.api_descriptor();

    let users = api.find("users").unwrap();
    assert_eq!(users.variant, Variant::CollectionResource);
    assert_eq!(users.schema_ref.as_deref(), Some("#/definitions/User"));
    let items = users.items.as_ref().unwrap();
    assert!(items.operations.contains(&Operation::Read));

    let status = api.find("status").unwrap();
    assert_eq!(status.operations, vec![Operation::Read]);

    let json = api.to_json();
    assert_eq!(json["definitions"]["User"]["type"], "object");
    assert_eq!(json["root"]["title"], "Root");
    let names: Vec<&String> = json["root"]["subResources"]
        .as_object()
        .unwrap()
        .keys()
        .collect();
    assert_eq!(names, ["users", "status"]);
}

#[test]
fn test_duplicate_sub_path_logs_replacement() {
    let provider = Provider::builder("Root")
        .variant(Variant::SingletonResource)
        .sub_path("x", || Ok(bound_singleton("First", json!({"n": 1}))))
        .sub_path("x", || Ok(bound_singleton("Second", json!({"n": 2}))))
        .build();

    let tracing = TestTracing::init();
    let router = new_handler(provider).unwrap();
    assert!(tracing.contains("Route already registered, replacing"));
    assert_eq!(read_content(&router, "x")["n"], 2);
}
