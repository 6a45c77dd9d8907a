//! # Handler Adapters
//!
//! Adapters translate the uniform [`RequestHandler`] contract into calls on
//! a provider's capability, one adapter per routed shape:
//!
//! | Adapter | Routed at | Forwards |
//! |---|---|---|
//! | [`SingletonHandler`] | `base` | read, update, patch, action |
//! | [`CollectionHandler`] | `base` | create, query, action |
//! | [`CollectionInstanceHandler`] | `base/{id}` | read, update, delete, patch, action |
//! | [`PassThroughHandler`] | `base/...` | everything |
//!
//! Operations a shape cannot serve fail with `BadRequest` before the
//! provider is ever called. Every result that carries resources is passed
//! through the field filter with the request's field selectors, except for
//! [`PassThroughHandler`], which returns its handler's result as is.
//!
//! Providers that only supply declarative [`crate::provider::Bindings`] are
//! adapted by the same types: the bindings implement every capability trait.

mod collection;
mod request;
mod singleton;

pub use collection::{CollectionHandler, CollectionInstanceHandler};
pub use request::PassThroughHandler;
pub use singleton::SingletonHandler;

use futures::future::{self, FutureExt};

use crate::error::ResourceError;
use crate::filter::filter_response;
use crate::pointer::JsonPointer;
use crate::provider::ResourceFuture;
use crate::response::Response;

/// Widen a typed provider result into a [`Response`]
fn respond<T>(f: ResourceFuture<T>) -> ResourceFuture<Response>
where
    T: Into<Response> + Send + 'static,
{
    f.map(|r| r.map(Into::into)).boxed()
}

/// Apply the request's field selectors to a successful result
fn filtered(f: ResourceFuture<Response>, fields: Vec<JsonPointer>) -> ResourceFuture<Response> {
    if fields.is_empty() {
        return f;
    }
    f.map(move |r| r.map(|response| filter_response(response, &fields)))
        .boxed()
}

fn reject(err: ResourceError) -> ResourceFuture<Response> {
    future::ready(Err(err)).boxed()
}
