//! Route table: pattern + mode → handler.
//!
//! Routes are kept sorted by specificity so that resolution is a single
//! forward scan where the first hit wins:
//!
//! 1. longer literal prefix first (literal characters before the first
//!    variable)
//! 2. more segments first
//! 3. more literal characters in total first
//! 4. fewer template variables first
//! 5. `Equals` before `StartsWith`
//! 6. earlier registration first
//!
//! Registering the same (pattern, mode) twice replaces the earlier route.

use futures::future::{self, FutureExt};
use std::cmp::Reverse;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::template::{split_path, UriTemplate};
use crate::context::{Context, RoutingFrame, VariableVec};
use crate::error::{ResourceError, RouterError};
use crate::provider::{RequestHandler, ResourceFuture};
use crate::request::Request;
use crate::response::Response;

/// How a route pattern is compared with a request path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoutingMode {
    /// The whole path must match the pattern
    Equals,
    /// The path must start with the pattern; the rest is handed on
    StartsWith,
}

impl fmt::Display for RoutingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutingMode::Equals => f.write_str("EQUALS"),
            RoutingMode::StartsWith => f.write_str("STARTS_WITH"),
        }
    }
}

/// Handle returned by [`Router::add_route`], used to remove the route again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteId(u64);

struct Route {
    id: RouteId,
    mode: RoutingMode,
    template: UriTemplate,
    handler: Arc<dyn RequestHandler>,
}

impl Route {
    fn sort_key(&self) -> (Reverse<usize>, Reverse<usize>, Reverse<usize>, usize, u8, RouteId) {
        let mode = match self.mode {
            RoutingMode::Equals => 0,
            RoutingMode::StartsWith => 1,
        };
        (
            Reverse(self.template.literal_prefix_len()),
            Reverse(self.template.len()),
            Reverse(self.template.literal_len()),
            self.template.variable_count(),
            mode,
            self.id,
        )
    }
}

/// Result of resolving a path against a [`Router`]
#[derive(Clone)]
pub struct RouteMatch {
    pub route_id: RouteId,
    pub mode: RoutingMode,
    pub handler: Arc<dyn RequestHandler>,
    /// Part of the path consumed by the route's pattern
    pub matched: String,
    /// Residual path handed to the handler, empty for `Equals` matches
    pub remaining: String,
    pub variables: VariableVec,
}

impl fmt::Debug for RouteMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteMatch")
            .field("route_id", &self.route_id)
            .field("mode", &self.mode)
            .field("matched", &self.matched)
            .field("remaining", &self.remaining)
            .field("variables", &self.variables)
            .finish()
    }
}

impl RouteMatch {
    /// Get a bound variable by name. Last binding wins on repeated names.
    #[must_use]
    pub fn variable(&self, name: &str) -> Option<&str> {
        self.variables
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Ordered table of routes; itself a [`RequestHandler`]
#[derive(Default)]
pub struct Router {
    routes: Vec<Route>,
    next_id: u64,
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.route_table())
            .finish()
    }
}

impl Router {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Register `handler` at `pattern`.
    ///
    /// An existing route with the same mode and pattern is replaced.
    pub fn add_route(
        &mut self,
        mode: RoutingMode,
        pattern: &str,
        handler: Arc<dyn RequestHandler>,
    ) -> Result<RouteId, RouterError> {
        let template = UriTemplate::parse(pattern)?;
        if let Some(pos) = self
            .routes
            .iter()
            .position(|r| r.mode == mode && r.template == template)
        {
            let old = self.routes.remove(pos);
            warn!(
                mode = %mode,
                pattern = %template,
                replaced_route = ?old.id,
                "Route already registered, replacing"
            );
        }

        let id = RouteId(self.next_id);
        self.next_id += 1;
        debug!(mode = %mode, pattern = %template, route_id = ?id, "Route added");
        self.routes.push(Route {
            id,
            mode,
            template,
            handler,
        });
        self.routes.sort_by_key(Route::sort_key);
        Ok(id)
    }

    /// Remove a route. Returns `false` if no route has this id.
    pub fn remove_route(&mut self, id: RouteId) -> bool {
        let before = self.routes.len();
        self.routes.retain(|r| r.id != id);
        before != self.routes.len()
    }

    /// Find the most specific route for `path`
    #[must_use]
    pub fn resolve(&self, path: &str) -> Option<RouteMatch> {
        let segments = split_path(path);
        let mut variables = VariableVec::new();
        for route in &self.routes {
            let n = route.template.len();
            let fits = match route.mode {
                RoutingMode::Equals => segments.len() == n,
                RoutingMode::StartsWith => segments.len() >= n,
            };
            if !fits || !route.template.match_prefix(&segments, &mut variables) {
                continue;
            }
            return Some(RouteMatch {
                route_id: route.id,
                mode: route.mode,
                handler: Arc::clone(&route.handler),
                matched: segments[..n].join("/"),
                remaining: segments[n..].join("/"),
                variables,
            });
        }
        None
    }

    /// Human readable route list in resolution order, e.g. `EQUALS users/{id}`
    #[must_use]
    pub fn route_table(&self) -> Vec<String> {
        self.routes
            .iter()
            .map(|r| format!("{} {}", r.mode, r.template))
            .collect()
    }

    /// Log the route table at `info`
    pub fn dump_routes(&self) {
        info!(routes_count = self.routes.len(), "Route table");
        for (i, line) in self.route_table().iter().enumerate() {
            info!(position = i, route = %line, "Route");
        }
    }
}

impl RequestHandler for Router {
    fn handle(&self, context: Context, request: Request) -> ResourceFuture<Response> {
        let path = request.resource_path();
        debug!(
            path = %path,
            operation = %request.operation(),
            routes_count = self.routes.len(),
            "Route match attempt"
        );

        let Some(m) = self.resolve(path) else {
            warn!(path = %path, operation = %request.operation(), "No route matched");
            let err = ResourceError::not_found(format!("Resource '{path}' not found"));
            return future::ready(Err(err)).boxed();
        };

        debug!(
            path = %path,
            mode = %m.mode,
            matched = %m.matched,
            remaining = %m.remaining,
            variables = ?m.variables,
            "Route matched"
        );
        let request = request.with_resource_path(&m.remaining);
        let context = context.with_routing(RoutingFrame::new(m.matched, m.remaining, m.variables));
        m.handler.handle(context, request)
    }
}
