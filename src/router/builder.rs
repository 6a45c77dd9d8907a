//! Handler tree construction.
//!
//! [`new_handler`] turns one [`Provider`] and everything reachable through
//! its sub-paths into a single route table. Sub-path providers are routed
//! at composite paths (`users/roles`) in the same table rather than in
//! nested routers, so resolution is one lookup however deep the tree is.
//!
//! The table is only published once every accessor has succeeded; a failure
//! anywhere discards the partially built table.

use std::fmt;
use std::sync::Arc;
use tracing::{error, info};

use super::core::{Router, RoutingMode};
use super::template::join_path;
use crate::config::RouterConfig;
use crate::context::Context;
use crate::descriptor::{ApiDescriptor, Definitions, Describable, ResourceDescriptor};
use crate::error::RouterError;
use crate::handlers::{
    CollectionHandler, CollectionInstanceHandler, PassThroughHandler, SingletonHandler,
};
use crate::provider::{classify, Provider, RequestHandler, ResourceFuture, Variant};
use crate::request::Request;
use crate::response::Response;

/// A built handler tree together with its descriptor
#[derive(Clone)]
pub struct ResourceRouter {
    handler: Arc<dyn RequestHandler>,
    routes: Arc<Router>,
    descriptor: Arc<ApiDescriptor>,
}

impl fmt::Debug for ResourceRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceRouter")
            .field("base_path", &self.base_path())
            .field("routes", &self.routes)
            .finish()
    }
}

impl ResourceRouter {
    /// The routing table, excluding any path-prefix wrapper
    #[must_use]
    pub fn routes(&self) -> &Router {
        &self.routes
    }

    /// Path prefix the tree was relocated under, if any
    #[must_use]
    pub fn base_path(&self) -> Option<&str> {
        self.descriptor.base_path.as_deref()
    }

    /// Route list with the relocation prefix applied
    #[must_use]
    pub fn route_table(&self) -> Vec<String> {
        let table = self.routes.route_table();
        match self.base_path() {
            Some(prefix) => table
                .into_iter()
                .map(|line| format!("STARTS_WITH {prefix} => {line}"))
                .collect(),
            None => table,
        }
    }

    /// The handler requests should be sent to
    #[must_use]
    pub fn handler(&self) -> Arc<dyn RequestHandler> {
        Arc::clone(&self.handler)
    }
}

impl RequestHandler for ResourceRouter {
    fn handle(&self, context: Context, request: Request) -> ResourceFuture<Response> {
        self.handler.handle(context, request)
    }
}

impl Describable for ResourceRouter {
    fn api_descriptor(&self) -> Arc<ApiDescriptor> {
        Arc::clone(&self.descriptor)
    }
}

/// Build the handler tree for `provider` with the default configuration
pub fn new_handler(provider: Provider) -> Result<ResourceRouter, RouterError> {
    new_handler_with_config(provider, &RouterConfig::default())
}

/// Build the handler tree for `provider`.
///
/// # Errors
///
/// - [`RouterError::CannotDeduceVariant`] if any provider in the tree has
///   neither a declared variant nor a capability
/// - [`RouterError::HandlerTree`] if a sub-path accessor fails
/// - [`RouterError::TooDeep`] if sub-paths nest deeper than
///   [`RouterConfig::max_depth`]
/// - [`RouterError::InvalidPattern`] if a sub-path name or the configured
///   id variable does not form a valid route pattern
pub fn new_handler_with_config(
    provider: Provider,
    config: &RouterConfig,
) -> Result<ResourceRouter, RouterError> {
    let mut routes = Router::new();
    let mut definitions = Definitions::new();

    let root = match build_tree(&provider, "", 0, config, &mut routes, &mut definitions) {
        Ok(root) => root,
        Err(e) => {
            error!(provider = %provider.name(), error = %e, "Failed to build handler tree");
            return Err(e);
        }
    };

    let routes = Arc::new(routes);
    let base_path = provider.path().filter(|p| !p.is_empty()).map(str::to_string);
    let handler: Arc<dyn RequestHandler> = match &base_path {
        Some(prefix) => {
            let mut outer = Router::new();
            outer.add_route(RoutingMode::StartsWith, prefix, Arc::clone(&routes) as _)?;
            Arc::new(outer)
        }
        None => Arc::clone(&routes) as _,
    };

    info!(
        provider = %provider.name(),
        routes_count = routes.len(),
        base_path = base_path.as_deref().unwrap_or(""),
        schemas_count = definitions.len(),
        "Handler tree built"
    );
    if config.dump_routes {
        routes.dump_routes();
    }

    Ok(ResourceRouter {
        handler,
        routes,
        descriptor: Arc::new(ApiDescriptor {
            base_path,
            root,
            definitions,
        }),
    })
}

fn build_tree(
    provider: &Provider,
    base: &str,
    depth: usize,
    config: &RouterConfig,
    routes: &mut Router,
    definitions: &mut Definitions,
) -> Result<ResourceDescriptor, RouterError> {
    if depth > config.max_depth {
        return Err(RouterError::TooDeep {
            path: base.to_string(),
            max_depth: config.max_depth,
        });
    }

    let variant = classify(provider)?;
    match variant {
        Variant::SingletonResource => {
            let handler = SingletonHandler::from_provider(provider);
            routes.add_route(RoutingMode::Equals, base, Arc::new(handler))?;
        }
        Variant::CollectionResource => {
            let collection = CollectionHandler::from_provider(provider);
            let instance = CollectionInstanceHandler::from_provider(provider, &config.id_variable);
            let instance_path = join_path(base, &format!("{{{}}}", config.id_variable));
            routes.add_route(RoutingMode::Equals, base, Arc::new(collection))?;
            routes.add_route(RoutingMode::Equals, &instance_path, Arc::new(instance))?;
        }
        Variant::RequestHandler => {
            let handler = PassThroughHandler::from_provider(provider);
            routes.add_route(RoutingMode::StartsWith, base, Arc::new(handler))?;
        }
    }

    let mut descriptor = ResourceDescriptor::for_provider(provider, variant, definitions);
    for sub in provider.sub_paths() {
        let path = join_path(base, sub.name());
        let child = sub
            .provider()
            .map_err(|e| RouterError::handler_tree(&path, e))?;
        // A sub-path provider's own prefix is appended to its mount point
        let child_base = match child.path() {
            Some(prefix) => join_path(&path, prefix),
            None => path,
        };
        let child_descriptor =
            build_tree(&child, &child_base, depth + 1, config, routes, definitions)?;
        descriptor.add_sub_resource(sub.name(), child_descriptor);
    }
    Ok(descriptor)
}
