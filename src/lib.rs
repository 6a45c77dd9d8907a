//! # resrouter
//!
//! **resrouter** is a resource-oriented request dispatcher. It turns
//! *providers* (objects implementing a small capability contract, or plain
//! descriptors carrying per-operation closures) into one composable request
//! handler that resolves create, read, update, delete, patch, action and
//! query requests against addressed resources, including nested sub-resources.
//!
//! ## Overview
//!
//! A provider is routed as one of three variants:
//!
//! - **Singleton resource** - a single resource at one address
//! - **Collection resource** - a container plus its instances at `base/{id}`
//! - **Request handler** - owns everything below its address
//!
//! [`router::new_handler`] classifies the provider, registers the matching
//! adapters in a route table, follows declared sub-paths recursively and
//! returns a [`router::ResourceRouter`] that can serve requests and describe
//! the API it serves.
//!
//! ## Architecture
//!
//! The library is organized into several key modules:
//!
//! - **[`provider`]** - Capability contracts, declarative bindings and the variant classifier
//! - **[`handlers`]** - Adapters from the uniform handler contract to each capability
//! - **[`router`]** - Route table, URI templates and the handler tree builder
//! - **[`filter`]** - Field filtering of JSON values and resources
//! - **[`context`]** - Per-request frame stack (request id, routing frames, attributes)
//! - **[`descriptor`]** - API descriptor consumed by documentation generators
//! - **[`connection`]** - Client-style connection façade over a handler tree
//! - **[`request`]** / **[`response`]** - Request and response model
//! - **[`error`]** - Registration-time and request-time error types
//! - **[`config`]** / **[`logging`]** - Environment and file driven configuration
//!
//! ### Request Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Caller
//!     participant Router as router::Router
//!     participant Adapter as handlers::*
//!     participant Provider
//!     participant Filter as filter
//!
//!     Caller->>Router: handle(context, request "users/42")
//!     Router->>Router: resolve "users/{id}" (id = 42)
//!     Router->>Adapter: push routing frame, rebase path
//!     Adapter->>Adapter: read id, pop frame
//!     Adapter->>Provider: read(context, "42", request)
//!     Provider-->>Adapter: ResourceResponse
//!     Adapter->>Filter: apply request fields
//!     Filter-->>Caller: Response
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use resrouter::connection::{new_internal_connection, Connection};
//! use resrouter::context::Context;
//! use resrouter::demo::demo_provider;
//! use resrouter::request::Request;
//! use resrouter::router::new_handler;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let router = new_handler(demo_provider())?;
//! let connection = new_internal_connection(Arc::new(router));
//!
//! let ada = connection.read(Context::new(), Request::read("users/ada").with_fields(["name"]))?;
//! assert_eq!(ada.content()["name"], "Ada Lovelace");
//! assert!(ada.content().get("email").is_none());
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! | Variable | Purpose |
//! |---|---|
//! | `RESRT_ID_VARIABLE` | Template variable bound to collection instance ids |
//! | `RESRT_MAX_DEPTH` | Maximum sub-path nesting |
//! | `RESRT_DUMP_ROUTES` | Log the route table after building |
//! | `RESRT_LOG_LEVEL`, `RESRT_LOG_FORMAT` | Logging (see [`logging`]) |

pub mod cli;
pub mod config;
pub mod connection;
pub mod context;
pub mod demo;
pub mod descriptor;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod ids;
pub mod logging;
pub mod pointer;
pub mod provider;
pub mod request;
pub mod response;
pub mod router;

pub use connection::{Connection, ConnectionFactory};
pub use context::Context;
pub use descriptor::{ApiDescriptor, Describable, ResourceDescriptor};
pub use error::{ErrorKind, ResourceError, RouterError};
pub use filter::{filter_resource, filter_value};
pub use pointer::JsonPointer;
pub use provider::{
    classify, CollectionResourceProvider, Provider, RequestHandler, SingletonResourceProvider,
    Variant,
};
pub use request::{Operation, Request};
pub use response::{ActionResponse, QueryResponse, ResourceResponse, Response};
pub use router::{new_handler, new_handler_with_config, ResourceRouter, Router, RoutingMode};
