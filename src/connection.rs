//! # Connection Façade
//!
//! Connections give callers a client-style view of a handler tree: send a
//! request, get a response, close when done. [`new_internal_connection`]
//! binds a connection directly to an in-process [`RequestHandler`], so code
//! written against [`Connection`] can talk to a local tree and to a remote
//! transport alike.
//!
//! ## Blocking calls
//!
//! The per-operation methods (`read`, `create`, ...) block the calling
//! thread on the asynchronous result. They are meant for synchronous
//! callers; async code should use [`Connection::handle_async`].
//!
//! ## Uncloseable wrappers
//!
//! [`uncloseable`] and [`uncloseable_factory`] hand a shared connection or
//! factory to code that must not be able to close it. Every call is
//! forwarded except `close`, which does nothing.

use futures::executor::block_on;
use futures::future::{self, FutureExt};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

use crate::context::Context;
use crate::error::ResourceError;
use crate::provider::{RequestHandler, ResourceFuture};
use crate::request::{Operation, Request};
use crate::response::{ActionResponse, QueryResponse, ResourceResponse, Response};

fn expect_operation(request: &Request, expected: Operation) -> Result<(), ResourceError> {
    let actual = request.operation();
    if actual == expected {
        Ok(())
    } else {
        Err(ResourceError::bad_request(format!(
            "Expected a {expected} request but got a {actual} request"
        )))
    }
}

/// A client connection to a handler tree
pub trait Connection: Send + Sync {
    /// Send a request without blocking
    fn handle_async(&self, context: Context, request: Request) -> ResourceFuture<Response>;

    /// Release the connection. Later requests fail.
    fn close(&self);

    fn is_closed(&self) -> bool;

    /// Whether the connection can still serve requests
    fn is_valid(&self) -> bool {
        !self.is_closed()
    }

    /// Send a request and block until it completes
    fn handle(&self, context: Context, request: Request) -> Result<Response, ResourceError> {
        block_on(self.handle_async(context, request))
    }

    fn create(
        &self,
        context: Context,
        request: Request,
    ) -> Result<ResourceResponse, ResourceError> {
        expect_operation(&request, Operation::Create)?;
        self.handle(context, request)?.into_resource()
    }

    fn read(&self, context: Context, request: Request) -> Result<ResourceResponse, ResourceError> {
        expect_operation(&request, Operation::Read)?;
        self.handle(context, request)?.into_resource()
    }

    fn update(
        &self,
        context: Context,
        request: Request,
    ) -> Result<ResourceResponse, ResourceError> {
        expect_operation(&request, Operation::Update)?;
        self.handle(context, request)?.into_resource()
    }

    fn delete(
        &self,
        context: Context,
        request: Request,
    ) -> Result<ResourceResponse, ResourceError> {
        expect_operation(&request, Operation::Delete)?;
        self.handle(context, request)?.into_resource()
    }

    fn patch(&self, context: Context, request: Request) -> Result<ResourceResponse, ResourceError> {
        expect_operation(&request, Operation::Patch)?;
        self.handle(context, request)?.into_resource()
    }

    fn action(&self, context: Context, request: Request) -> Result<ActionResponse, ResourceError> {
        expect_operation(&request, Operation::Action)?;
        self.handle(context, request)?.into_action()
    }

    fn query(&self, context: Context, request: Request) -> Result<QueryResponse, ResourceError> {
        expect_operation(&request, Operation::Query)?;
        self.handle(context, request)?.into_query()
    }
}

/// Source of connections
pub trait ConnectionFactory: Send + Sync {
    fn get_connection(&self) -> Result<Arc<dyn Connection>, ResourceError>;

    fn get_connection_async(&self) -> ResourceFuture<Arc<dyn Connection>>;

    /// Release the factory. Connections already handed out are unaffected.
    fn close(&self);
}

/// Connection bound to an in-process handler
pub struct InternalConnection {
    handler: Arc<dyn RequestHandler>,
    closed: AtomicBool,
}

impl fmt::Debug for InternalConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InternalConnection")
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl Connection for InternalConnection {
    fn handle_async(&self, context: Context, request: Request) -> ResourceFuture<Response> {
        if self.is_closed() {
            return future::ready(Err(ResourceError::service_unavailable(
                "Connection is closed",
            )))
            .boxed();
        }
        self.handler.handle(context, request)
    }

    fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            debug!("Internal connection closed");
        }
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

/// Factory producing [`InternalConnection`]s over one handler
pub struct InternalConnectionFactory {
    handler: Arc<dyn RequestHandler>,
    closed: AtomicBool,
}

impl fmt::Debug for InternalConnectionFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InternalConnectionFactory")
            .field("closed", &self.closed.load(Ordering::Acquire))
            .finish()
    }
}

impl ConnectionFactory for InternalConnectionFactory {
    fn get_connection(&self) -> Result<Arc<dyn Connection>, ResourceError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(ResourceError::service_unavailable(
                "Connection factory is closed",
            ));
        }
        Ok(new_internal_connection(Arc::clone(&self.handler)))
    }

    fn get_connection_async(&self) -> ResourceFuture<Arc<dyn Connection>> {
        future::ready(self.get_connection()).boxed()
    }

    fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            debug!("Internal connection factory closed");
        }
    }
}

/// Connection sending every request straight to `handler`
pub fn new_internal_connection(handler: Arc<dyn RequestHandler>) -> Arc<dyn Connection> {
    Arc::new(InternalConnection {
        handler,
        closed: AtomicBool::new(false),
    })
}

/// Factory whose connections send every request straight to `handler`
pub fn new_internal_connection_factory(
    handler: Arc<dyn RequestHandler>,
) -> Arc<dyn ConnectionFactory> {
    Arc::new(InternalConnectionFactory {
        handler,
        closed: AtomicBool::new(false),
    })
}

struct UncloseableConnection(Arc<dyn Connection>);

impl Connection for UncloseableConnection {
    fn handle_async(&self, context: Context, request: Request) -> ResourceFuture<Response> {
        self.0.handle_async(context, request)
    }

    fn close(&self) {}

    fn is_closed(&self) -> bool {
        self.0.is_closed()
    }

    fn is_valid(&self) -> bool {
        self.0.is_valid()
    }
}

struct UncloseableFactory(Arc<dyn ConnectionFactory>);

impl ConnectionFactory for UncloseableFactory {
    fn get_connection(&self) -> Result<Arc<dyn Connection>, ResourceError> {
        self.0.get_connection()
    }

    fn get_connection_async(&self) -> ResourceFuture<Arc<dyn Connection>> {
        self.0.get_connection_async()
    }

    fn close(&self) {}
}

/// Wrap `connection` so that `close` is ignored
pub fn uncloseable(connection: Arc<dyn Connection>) -> Arc<dyn Connection> {
    Arc::new(UncloseableConnection(connection))
}

/// Wrap `factory` so that `close` is ignored
pub fn uncloseable_factory(factory: Arc<dyn ConnectionFactory>) -> Arc<dyn ConnectionFactory> {
    Arc::new(UncloseableFactory(factory))
}

/// A request handler that completes synchronously
pub trait SynchronousRequestHandler: Send + Sync {
    fn handle_sync(&self, context: Context, request: Request) -> Result<Response, ResourceError>;
}

struct SynchronousAdapter<H>(H);

impl<H: SynchronousRequestHandler> RequestHandler for SynchronousAdapter<H> {
    fn handle(&self, context: Context, request: Request) -> ResourceFuture<Response> {
        future::ready(self.0.handle_sync(context, request)).boxed()
    }
}

/// Adapt a synchronous handler to the asynchronous [`RequestHandler`] contract.
///
/// The handler runs on the caller's thread when the request is dispatched.
pub fn as_request_handler<H>(handler: H) -> Arc<dyn RequestHandler>
where
    H: SynchronousRequestHandler + 'static,
{
    Arc::new(SynchronousAdapter(handler))
}
