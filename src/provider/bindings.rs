use futures::future::{self, FutureExt};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::{
    CollectionResourceProvider, RequestHandler, ResourceFuture, SingletonResourceProvider,
};
use crate::context::Context;
use crate::error::ResourceError;
use crate::request::{Operation, Request};
use crate::response::{ActionResponse, QueryResponse, ResourceResponse, Response};

/// Arguments handed to a bound operation
#[derive(Debug, Clone)]
pub struct Invocation {
    pub context: Context,
    /// Instance id for instance-level collection operations, `None` otherwise
    pub id: Option<String>,
    pub request: Request,
}

/// A closure bound to one operation or action
pub type BoundFn = Arc<dyn Fn(Invocation) -> ResourceFuture<Response> + Send + Sync>;

/// Declarative per-operation bindings.
///
/// `Bindings` implement every capability trait so that a provider declared
/// purely through closures can be adapted exactly like one implementing the
/// traits directly. An operation with no binding fails with `NotSupported`.
#[derive(Clone)]
pub struct Bindings {
    resource: String,
    operations: BTreeMap<Operation, BoundFn>,
    actions: BTreeMap<String, BoundFn>,
}

impl fmt::Debug for Bindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bindings")
            .field("resource", &self.resource)
            .field("operations", &self.operations())
            .field("actions", &self.actions())
            .finish()
    }
}

impl Bindings {
    #[must_use]
    pub fn new(resource: &str) -> Self {
        Self {
            resource: resource.to_string(),
            operations: BTreeMap::new(),
            actions: BTreeMap::new(),
        }
    }

    pub fn bind(&mut self, operation: Operation, f: BoundFn) {
        self.operations.insert(operation, f);
    }

    pub fn bind_action(&mut self, action: &str, f: BoundFn) {
        self.actions.insert(action.to_string(), f);
    }

    /// Operations with a binding. `Action` is listed when any action is bound.
    #[must_use]
    pub fn operations(&self) -> Vec<Operation> {
        let mut ops: Vec<Operation> = self.operations.keys().copied().collect();
        if !self.actions.is_empty() && !ops.contains(&Operation::Action) {
            ops.push(Operation::Action);
            ops.sort();
        }
        ops
    }

    /// Names of bound actions, sorted
    #[must_use]
    pub fn actions(&self) -> Vec<String> {
        self.actions.keys().cloned().collect()
    }

    /// Dispatch to the binding for the request's operation.
    ///
    /// Actions look up a named binding first and fall back to a generic
    /// `Operation::Action` binding.
    pub fn invoke(
        &self,
        context: Context,
        id: Option<String>,
        request: Request,
    ) -> ResourceFuture<Response> {
        let operation = request.operation();
        let bound = match request.action_name() {
            Some(action) => self
                .actions
                .get(action)
                .or_else(|| self.operations.get(&Operation::Action))
                .ok_or_else(|| {
                    ResourceError::not_supported(format!(
                        "Action '{action}' is not supported by resource '{}'",
                        self.resource
                    ))
                }),
            None => self.operations.get(&operation).ok_or_else(|| {
                ResourceError::not_supported(format!(
                    "Operation '{operation}' is not supported by resource '{}'",
                    self.resource
                ))
            }),
        };
        match bound {
            Ok(f) => f(Invocation {
                context,
                id,
                request,
            }),
            Err(e) => future::ready(Err(e)).boxed(),
        }
    }
}

fn resource(f: ResourceFuture<Response>) -> ResourceFuture<ResourceResponse> {
    f.map(|r| r.and_then(Response::into_resource)).boxed()
}

fn action(f: ResourceFuture<Response>) -> ResourceFuture<ActionResponse> {
    f.map(|r| r.and_then(Response::into_action)).boxed()
}

fn query(f: ResourceFuture<Response>) -> ResourceFuture<QueryResponse> {
    f.map(|r| r.and_then(Response::into_query)).boxed()
}

impl SingletonResourceProvider for Bindings {
    fn read(&self, context: Context, request: Request) -> ResourceFuture<ResourceResponse> {
        resource(self.invoke(context, None, request))
    }

    fn update(&self, context: Context, request: Request) -> ResourceFuture<ResourceResponse> {
        resource(self.invoke(context, None, request))
    }

    fn patch(&self, context: Context, request: Request) -> ResourceFuture<ResourceResponse> {
        resource(self.invoke(context, None, request))
    }

    fn action(&self, context: Context, request: Request) -> ResourceFuture<ActionResponse> {
        action(self.invoke(context, None, request))
    }
}

impl CollectionResourceProvider for Bindings {
    fn create(&self, context: Context, request: Request) -> ResourceFuture<ResourceResponse> {
        resource(self.invoke(context, None, request))
    }

    fn read(
        &self,
        context: Context,
        id: String,
        request: Request,
    ) -> ResourceFuture<ResourceResponse> {
        resource(self.invoke(context, Some(id), request))
    }

    fn update(
        &self,
        context: Context,
        id: String,
        request: Request,
    ) -> ResourceFuture<ResourceResponse> {
        resource(self.invoke(context, Some(id), request))
    }

    fn delete(
        &self,
        context: Context,
        id: String,
        request: Request,
    ) -> ResourceFuture<ResourceResponse> {
        resource(self.invoke(context, Some(id), request))
    }

    fn patch(
        &self,
        context: Context,
        id: String,
        request: Request,
    ) -> ResourceFuture<ResourceResponse> {
        resource(self.invoke(context, Some(id), request))
    }

    fn action_collection(
        &self,
        context: Context,
        request: Request,
    ) -> ResourceFuture<ActionResponse> {
        action(self.invoke(context, None, request))
    }

    fn action_instance(
        &self,
        context: Context,
        id: String,
        request: Request,
    ) -> ResourceFuture<ActionResponse> {
        action(self.invoke(context, Some(id), request))
    }

    fn query(&self, context: Context, request: Request) -> ResourceFuture<QueryResponse> {
        query(self.invoke(context, None, request))
    }
}

impl RequestHandler for Bindings {
    fn handle(&self, context: Context, request: Request) -> ResourceFuture<Response> {
        self.invoke(context, None, request)
    }
}
