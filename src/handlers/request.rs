use std::fmt;
use std::sync::Arc;

use crate::context::Context;
use crate::provider::{Provider, RequestHandler, ResourceFuture};
use crate::request::Request;
use crate::response::Response;

/// Adapter for providers that handle requests themselves.
///
/// Requests are forwarded unchanged with the residual path left by the
/// router, field selectors included. The handler owns its response and the
/// result is returned as is, so a nested tree filters exactly once.
pub struct PassThroughHandler {
    name: Arc<str>,
    handler: Arc<dyn RequestHandler>,
}

impl fmt::Debug for PassThroughHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PassThroughHandler")
            .field("name", &self.name)
            .finish()
    }
}

impl PassThroughHandler {
    #[must_use]
    pub fn new(name: &str, handler: Arc<dyn RequestHandler>) -> Self {
        Self {
            name: Arc::from(name),
            handler,
        }
    }

    #[must_use]
    pub fn from_provider(provider: &Provider) -> Self {
        let handler: Arc<dyn RequestHandler> = match provider.handler_capability() {
            Some(h) => Arc::clone(h),
            None => provider.bindings_or_empty(),
        };
        Self::new(provider.name(), handler)
    }
}

impl RequestHandler for PassThroughHandler {
    fn handle(&self, context: Context, request: Request) -> ResourceFuture<Response> {
        self.handler.handle(context, request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::response::ResourceResponse;
    use futures::executor::block_on;
    use futures::FutureExt;
    use serde_json::json;

    struct PathEcho;

    impl RequestHandler for PathEcho {
        fn handle(&self, _context: Context, request: Request) -> ResourceFuture<Response> {
            let body = json!({
                "path": request.resource_path(),
                "operation": request.operation(),
                "fields": request.fields(),
            });
            async move { Ok(ResourceResponse::new(None, None, body).into()) }.boxed()
        }
    }

    #[test]
    fn test_forwards_every_operation_unchanged() {
        let handler = PassThroughHandler::from_provider(&Provider::handler("Echo", PathEcho));
        let res = block_on(handler.handle(Context::new(), Request::delete("x/y")))
            .unwrap()
            .into_resource()
            .unwrap();
        assert_eq!(
            res.content(),
            &json!({"path": "x/y", "operation": "delete", "fields": []})
        );
    }

    #[test]
    fn test_fields_are_forwarded_not_applied() {
        let handler = PassThroughHandler::from_provider(&Provider::handler("Echo", PathEcho));
        let res = block_on(handler.handle(
            Context::new(),
            Request::read("x").with_fields(["operation"]),
        ))
        .unwrap()
        .into_resource()
        .unwrap();
        assert_eq!(
            res.content(),
            &json!({"path": "x", "operation": "read", "fields": ["/operation"]})
        );
    }

    #[test]
    fn test_bindings_without_binding_not_supported() {
        let handler = PassThroughHandler::from_provider(&Provider::builder("Nothing").build());
        let err = block_on(handler.handle(Context::new(), Request::read(""))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotSupported);
    }
}
