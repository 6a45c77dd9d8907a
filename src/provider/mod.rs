//! # Provider Module
//!
//! Providers are the caller-supplied objects that actually implement
//! resources. This module defines the capability contracts a provider may
//! implement and the [`Provider`] descriptor that tells the tree builder how
//! to route to it.
//!
//! ## Variants
//!
//! Every provider is routed as exactly one [`Variant`]:
//!
//! - **Singleton resource** - one resource at one address (`settings`)
//! - **Collection resource** - a container (`users`) plus its instances (`users/{id}`)
//! - **Request handler** - owns everything below its address and sees the
//!   residual path unchanged
//!
//! ## Capabilities vs. bindings
//!
//! A provider either implements one of the capability traits
//! ([`SingletonResourceProvider`], [`CollectionResourceProvider`],
//! [`RequestHandler`]) or supplies per-operation closures through
//! [`Bindings`]. Both flavours end up behind the same uniform
//! [`RequestHandler`] contract once adapted.
//!
//! ## Example
//!
//! ```rust
//! use futures::FutureExt;
//! use resrouter::provider::{Provider, Variant};
//! use resrouter::request::Operation;
//! use resrouter::response::{ResourceResponse, Response};
//! use serde_json::json;
//!
//! let settings = Provider::builder("Settings")
//!     .variant(Variant::SingletonResource)
//!     .bind(Operation::Read, |_call| {
//!         async move {
//!             Ok(Response::Resource(ResourceResponse::new(
//!                 None,
//!                 None,
//!                 json!({"theme": "dark"}),
//!             )))
//!         }
//!         .boxed()
//!     })
//!     .build();
//! assert_eq!(settings.name(), "Settings");
//! ```

mod bindings;
mod classify;

pub use bindings::{Bindings, BoundFn, Invocation};
pub use classify::classify;

use futures::future::{self, BoxFuture};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::context::Context;
use crate::error::ResourceError;
use crate::request::{Operation, Request};
use crate::response::{ActionResponse, QueryResponse, ResourceResponse, Response};

/// Deferred result of a resource operation
pub type ResourceFuture<T> = BoxFuture<'static, Result<T, ResourceError>>;

/// How a provider is routed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Variant {
    SingletonResource,
    CollectionResource,
    RequestHandler,
}

impl Variant {
    /// Operations addressable on a resource of this variant.
    ///
    /// For collections this is the collection-level set; instance-level
    /// operations are reported by [`Variant::instance_operations`].
    #[must_use]
    pub fn operations(self) -> &'static [Operation] {
        match self {
            Variant::SingletonResource => &[
                Operation::Read,
                Operation::Update,
                Operation::Patch,
                Operation::Action,
            ],
            Variant::CollectionResource => {
                &[Operation::Create, Operation::Query, Operation::Action]
            }
            Variant::RequestHandler => &Operation::ALL,
        }
    }

    /// Operations addressable on a collection's instances
    #[must_use]
    pub fn instance_operations(self) -> &'static [Operation] {
        match self {
            Variant::CollectionResource => &[
                Operation::Read,
                Operation::Update,
                Operation::Delete,
                Operation::Patch,
                Operation::Action,
            ],
            _ => &[],
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Variant::SingletonResource => "singleton",
            Variant::CollectionResource => "collection",
            Variant::RequestHandler => "request-handler",
        };
        f.write_str(s)
    }
}

/// Uniform request handling contract.
///
/// Every adapter, every router and the finished handler tree implement this.
/// The returned future must not borrow from `self`; implementations clone
/// whatever `Arc`s they need into the future.
pub trait RequestHandler: Send + Sync {
    fn handle(&self, context: Context, request: Request) -> ResourceFuture<Response>;
}

impl<H: RequestHandler + ?Sized> RequestHandler for Arc<H> {
    fn handle(&self, context: Context, request: Request) -> ResourceFuture<Response> {
        (**self).handle(context, request)
    }
}

fn unsupported<T: Send + 'static>(what: &str) -> ResourceFuture<T> {
    Box::pin(future::ready(Err(ResourceError::not_supported(format!(
        "{what} is not supported"
    )))))
}

/// Capability contract of a singleton resource.
///
/// Every operation defaults to a `NotSupported` failure so implementors
/// only write the operations they serve.
pub trait SingletonResourceProvider: Send + Sync {
    fn read(&self, _context: Context, _request: Request) -> ResourceFuture<ResourceResponse> {
        unsupported("read")
    }

    fn update(&self, _context: Context, _request: Request) -> ResourceFuture<ResourceResponse> {
        unsupported("update")
    }

    fn patch(&self, _context: Context, _request: Request) -> ResourceFuture<ResourceResponse> {
        unsupported("patch")
    }

    fn action(&self, _context: Context, _request: Request) -> ResourceFuture<ActionResponse> {
        unsupported("action")
    }
}

/// Capability contract of a resource collection.
///
/// Instance-level operations receive the instance id resolved from the
/// address; the context passed alongside has already had the instance
/// routing frame removed.
pub trait CollectionResourceProvider: Send + Sync {
    fn create(&self, _context: Context, _request: Request) -> ResourceFuture<ResourceResponse> {
        unsupported("create")
    }

    fn read(
        &self,
        _context: Context,
        _id: String,
        _request: Request,
    ) -> ResourceFuture<ResourceResponse> {
        unsupported("read")
    }

    fn update(
        &self,
        _context: Context,
        _id: String,
        _request: Request,
    ) -> ResourceFuture<ResourceResponse> {
        unsupported("update")
    }

    fn delete(
        &self,
        _context: Context,
        _id: String,
        _request: Request,
    ) -> ResourceFuture<ResourceResponse> {
        unsupported("delete")
    }

    fn patch(
        &self,
        _context: Context,
        _id: String,
        _request: Request,
    ) -> ResourceFuture<ResourceResponse> {
        unsupported("patch")
    }

    fn action_collection(
        &self,
        _context: Context,
        _request: Request,
    ) -> ResourceFuture<ActionResponse> {
        unsupported("action")
    }

    fn action_instance(
        &self,
        _context: Context,
        _id: String,
        _request: Request,
    ) -> ResourceFuture<ActionResponse> {
        unsupported("action")
    }

    fn query(&self, _context: Context, _request: Request) -> ResourceFuture<QueryResponse> {
        unsupported("query")
    }
}

/// Fallible zero-argument accessor yielding the provider mounted at a sub-path
pub type SubPathAccessor = Box<dyn Fn() -> anyhow::Result<Provider> + Send + Sync>;

/// A child provider declared at a named sub-path
pub struct SubPath {
    name: String,
    accessor: SubPathAccessor,
}

impl SubPath {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invoke the accessor
    pub fn provider(&self) -> anyhow::Result<Provider> {
        (self.accessor)()
    }
}

impl fmt::Debug for SubPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubPath").field("name", &self.name).finish()
    }
}

/// Descriptive metadata surfaced in the API descriptor
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceMeta {
    pub title: Option<String>,
    pub description: Option<String>,
    /// Name and JSON schema of the resource type, registered in the shared definitions
    pub schema: Option<(String, Value)>,
}

/// Capability descriptor of one provider.
///
/// Built once by the caller and consumed by [`crate::router::new_handler`].
pub struct Provider {
    name: String,
    declared: Option<Variant>,
    path: Option<String>,
    singleton: Option<Arc<dyn SingletonResourceProvider>>,
    collection: Option<Arc<dyn CollectionResourceProvider>>,
    handler: Option<Arc<dyn RequestHandler>>,
    bindings: Option<Arc<Bindings>>,
    sub_paths: Vec<SubPath>,
    meta: ResourceMeta,
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("name", &self.name)
            .field("declared", &self.declared)
            .field("path", &self.path)
            .field("singleton", &self.singleton.is_some())
            .field("collection", &self.collection.is_some())
            .field("handler", &self.handler.is_some())
            .field("bindings", &self.bindings.as_ref().map(|b| b.operations()))
            .field("sub_paths", &self.sub_paths)
            .finish()
    }
}

impl Provider {
    #[must_use]
    pub fn builder(name: &str) -> ProviderBuilder {
        ProviderBuilder {
            provider: Provider {
                name: name.to_string(),
                declared: None,
                path: None,
                singleton: None,
                collection: None,
                handler: None,
                bindings: None,
                sub_paths: Vec::new(),
                meta: ResourceMeta::default(),
            },
        }
    }

    /// Provider backed by a singleton implementation
    pub fn singleton<P>(name: &str, provider: P) -> Self
    where
        P: SingletonResourceProvider + 'static,
    {
        Self::builder(name).singleton(provider).build()
    }

    /// Provider backed by a collection implementation
    pub fn collection<P>(name: &str, provider: P) -> Self
    where
        P: CollectionResourceProvider + 'static,
    {
        Self::builder(name).collection(provider).build()
    }

    /// Provider backed by a raw request handler
    pub fn handler<H>(name: &str, handler: H) -> Self
    where
        H: RequestHandler + 'static,
    {
        Self::builder(name).handler(handler).build()
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn declared_variant(&self) -> Option<Variant> {
        self.declared
    }

    /// Path prefix the whole subtree is relocated under, if declared
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    #[must_use]
    pub fn singleton_capability(&self) -> Option<&Arc<dyn SingletonResourceProvider>> {
        self.singleton.as_ref()
    }

    #[must_use]
    pub fn collection_capability(&self) -> Option<&Arc<dyn CollectionResourceProvider>> {
        self.collection.as_ref()
    }

    #[must_use]
    pub fn handler_capability(&self) -> Option<&Arc<dyn RequestHandler>> {
        self.handler.as_ref()
    }

    #[must_use]
    pub fn bindings(&self) -> Option<&Arc<Bindings>> {
        self.bindings.as_ref()
    }

    #[must_use]
    pub fn sub_paths(&self) -> &[SubPath] {
        &self.sub_paths
    }

    #[must_use]
    pub fn meta(&self) -> &ResourceMeta {
        &self.meta
    }

    /// Declarative bindings, or an empty set when none were supplied
    pub(crate) fn bindings_or_empty(&self) -> Arc<Bindings> {
        match &self.bindings {
            Some(b) => Arc::clone(b),
            None => Arc::new(Bindings::new(&self.name)),
        }
    }
}

/// Builder for [`Provider`]
pub struct ProviderBuilder {
    provider: Provider,
}

impl ProviderBuilder {
    /// Declare the variant explicitly. A declared variant always wins over
    /// whatever capabilities the provider also carries.
    #[must_use]
    pub fn variant(mut self, variant: Variant) -> Self {
        self.provider.declared = Some(variant);
        self
    }

    /// Relocate the provider's whole subtree under `path`
    #[must_use]
    pub fn path(mut self, path: &str) -> Self {
        self.provider.path = Some(path.trim_matches('/').to_string());
        self
    }

    #[must_use]
    pub fn singleton<P>(mut self, provider: P) -> Self
    where
        P: SingletonResourceProvider + 'static,
    {
        self.provider.singleton = Some(Arc::new(provider));
        self
    }

    #[must_use]
    pub fn collection<P>(mut self, provider: P) -> Self
    where
        P: CollectionResourceProvider + 'static,
    {
        self.provider.collection = Some(Arc::new(provider));
        self
    }

    #[must_use]
    pub fn handler<H>(mut self, handler: H) -> Self
    where
        H: RequestHandler + 'static,
    {
        self.provider.handler = Some(Arc::new(handler));
        self
    }

    /// Share an existing capability instead of moving one in
    #[must_use]
    pub fn shared_collection(mut self, provider: Arc<dyn CollectionResourceProvider>) -> Self {
        self.provider.collection = Some(provider);
        self
    }

    /// Bind a closure to an operation
    #[must_use]
    pub fn bind<F>(mut self, operation: Operation, f: F) -> Self
    where
        F: Fn(Invocation) -> ResourceFuture<Response> + Send + Sync + 'static,
    {
        self.bindings_mut().bind(operation, Arc::new(f));
        self
    }

    /// Bind a closure to a named action
    #[must_use]
    pub fn bind_action<F>(mut self, action: &str, f: F) -> Self
    where
        F: Fn(Invocation) -> ResourceFuture<Response> + Send + Sync + 'static,
    {
        self.bindings_mut().bind_action(action, Arc::new(f));
        self
    }

    /// Mount the provider returned by `accessor` at `name` below this one
    #[must_use]
    pub fn sub_path<F>(mut self, name: &str, accessor: F) -> Self
    where
        F: Fn() -> anyhow::Result<Provider> + Send + Sync + 'static,
    {
        self.provider.sub_paths.push(SubPath {
            name: name.trim_start_matches('/').to_string(),
            accessor: Box::new(accessor),
        });
        self
    }

    #[must_use]
    pub fn title(mut self, title: &str) -> Self {
        self.provider.meta.title = Some(title.to_string());
        self
    }

    #[must_use]
    pub fn description(mut self, description: &str) -> Self {
        self.provider.meta.description = Some(description.to_string());
        self
    }

    /// Register the resource's JSON schema under `name` in the shared definitions
    #[must_use]
    pub fn schema(mut self, name: &str, schema: Value) -> Self {
        self.provider.meta.schema = Some((name.to_string(), schema));
        self
    }

    #[must_use]
    pub fn build(self) -> Provider {
        self.provider
    }

    fn bindings_mut(&mut self) -> &mut Bindings {
        let name = self.provider.name.clone();
        let slot = self
            .provider
            .bindings
            .get_or_insert_with(|| Arc::new(Bindings::new(&name)));
        Arc::make_mut(slot)
    }
}
