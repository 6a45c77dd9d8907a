//! # Router Module
//!
//! The router module resolves resource paths to handlers and assembles
//! handler trees from providers.
//!
//! ## Overview
//!
//! The router is responsible for:
//! - Keeping a route table of pattern + mode → handler entries
//! - Picking the most specific route for a path and binding its template
//!   variables
//! - Rebasing the request onto the residual path before delegating
//! - Turning a [`Provider`](crate::provider::Provider) and its sub-paths
//!   into one table plus an [`ApiDescriptor`](crate::descriptor::ApiDescriptor)
//!
//! ## Architecture
//!
//! Building happens once, at registration:
//!
//! 1. **Classification**: each provider is classified as a singleton,
//!    collection or request handler.
//! 2. **Registration**: the matching adapters are added to the table at the
//!    provider's composite base path (`users`, `users/{id}`, `users/roles`).
//! 3. **Relocation**: a provider declaring a path prefix gets an outer
//!    `StartsWith` router in front of the whole table.
//!
//! Each request then walks the routers, each hop pushing a routing frame
//! onto the context, until an adapter calls the provider.
//!
//! ## Example
//!
//! ```rust
//! use futures::executor::block_on;
//! use futures::FutureExt;
//! use resrouter::context::Context;
//! use resrouter::provider::{Provider, RequestHandler, Variant};
//! use resrouter::request::{Operation, Request};
//! use resrouter::response::{ResourceResponse, Response};
//! use resrouter::router::new_handler;
//! use serde_json::json;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let users = Provider::builder("Users")
//!     .variant(Variant::CollectionResource)
//!     .bind(Operation::Read, |call| {
//!         async move {
//!             Ok(Response::Resource(ResourceResponse::new(
//!                 call.id.as_deref(),
//!                 None,
//!                 json!({"name": "ada"}),
//!             )))
//!         }
//!         .boxed()
//!     })
//!     .build();
//!
//! let router = new_handler(users)?;
//! let response = block_on(router.handle(Context::new(), Request::read("42")))?;
//! assert_eq!(response.into_resource()?.id(), Some("42"));
//! # Ok(())
//! # }
//! ```

mod builder;
mod core;
mod template;

pub use builder::{new_handler, new_handler_with_config, ResourceRouter};
pub use core::{RouteId, RouteMatch, Router, RoutingMode};
pub use template::{Segment, UriTemplate};
