use std::fmt;
use std::sync::Arc;
use tracing::debug;

use super::{filtered, reject, respond};
use crate::context::Context;
use crate::error::ResourceError;
use crate::provider::{CollectionResourceProvider, Provider, RequestHandler, ResourceFuture};
use crate::request::{Operation, Request};
use crate::response::Response;

fn collection_capability(provider: &Provider) -> Arc<dyn CollectionResourceProvider> {
    match provider.collection_capability() {
        Some(p) => Arc::clone(p),
        None => provider.bindings_or_empty(),
    }
}

/// Adapter for the collection address itself (`users`)
pub struct CollectionHandler {
    name: Arc<str>,
    provider: Arc<dyn CollectionResourceProvider>,
}

impl fmt::Debug for CollectionHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionHandler")
            .field("name", &self.name)
            .finish()
    }
}

impl CollectionHandler {
    #[must_use]
    pub fn new(name: &str, provider: Arc<dyn CollectionResourceProvider>) -> Self {
        Self {
            name: Arc::from(name),
            provider,
        }
    }

    #[must_use]
    pub fn from_provider(provider: &Provider) -> Self {
        Self::new(provider.name(), collection_capability(provider))
    }
}

impl RequestHandler for CollectionHandler {
    fn handle(&self, context: Context, request: Request) -> ResourceFuture<Response> {
        let operation = request.operation();
        debug!(resource = %self.name, operation = %operation, "Collection request");
        let fields = request.fields().to_vec();
        let result = match operation {
            Operation::Create => respond(self.provider.create(context, request)),
            Operation::Query => respond(self.provider.query(context, request)),
            Operation::Action => respond(self.provider.action_collection(context, request)),
            Operation::Read | Operation::Update | Operation::Delete | Operation::Patch => {
                return reject(ResourceError::bad_request(format!(
                    "The resource collection {} cannot be {}",
                    self.name,
                    operation.past_tense()
                )));
            }
        };
        filtered(result, fields)
    }
}

/// Adapter for a collection's instances (`users/{id}`)
///
/// The instance id is read from the innermost routing frame, which is then
/// popped so that the provider sees the context of the collection.
pub struct CollectionInstanceHandler {
    name: Arc<str>,
    id_variable: Arc<str>,
    provider: Arc<dyn CollectionResourceProvider>,
}

impl fmt::Debug for CollectionInstanceHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionInstanceHandler")
            .field("name", &self.name)
            .field("id_variable", &self.id_variable)
            .finish()
    }
}

impl CollectionInstanceHandler {
    #[must_use]
    pub fn new(
        name: &str,
        id_variable: &str,
        provider: Arc<dyn CollectionResourceProvider>,
    ) -> Self {
        Self {
            name: Arc::from(name),
            id_variable: Arc::from(id_variable),
            provider,
        }
    }

    #[must_use]
    pub fn from_provider(provider: &Provider, id_variable: &str) -> Self {
        Self::new(provider.name(), id_variable, collection_capability(provider))
    }

    /// Name of the template variable holding the instance id
    #[must_use]
    pub fn id_variable(&self) -> &str {
        &self.id_variable
    }
}

impl RequestHandler for CollectionInstanceHandler {
    fn handle(&self, context: Context, request: Request) -> ResourceFuture<Response> {
        let operation = request.operation();
        if matches!(operation, Operation::Create | Operation::Query) {
            return reject(ResourceError::bad_request(format!(
                "The resource instance {} cannot be {}",
                self.name,
                operation.past_tense()
            )));
        }

        let Some(id) = context
            .routing()
            .and_then(|frame| frame.variable(&self.id_variable))
            .map(str::to_string)
        else {
            return reject(ResourceError::bad_request(format!(
                "No '{}' bound in the path of resource {}",
                self.id_variable, self.name
            )));
        };
        debug!(resource = %self.name, operation = %operation, id = %id, "Instance request");

        let parent = context.into_parent();
        let fields = request.fields().to_vec();
        let result = match operation {
            Operation::Read => respond(self.provider.read(parent, id, request)),
            Operation::Update => respond(self.provider.update(parent, id, request)),
            Operation::Delete => respond(self.provider.delete(parent, id, request)),
            Operation::Patch => respond(self.provider.patch(parent, id, request)),
            Operation::Action => respond(self.provider.action_instance(parent, id, request)),
            Operation::Create | Operation::Query => unreachable_operation(operation),
        };
        filtered(result, fields)
    }
}

fn unreachable_operation(operation: Operation) -> ResourceFuture<Response> {
    reject(ResourceError::internal(format!(
        "operation {operation} reached an instance provider"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{RoutingFrame, VariableVec};
    use crate::error::ErrorKind;
    use crate::response::{QueryResponse, ResourceResponse};
    use futures::executor::block_on;
    use futures::FutureExt;
    use serde_json::json;

    struct Users;

    impl CollectionResourceProvider for Users {
        fn read(
            &self,
            context: Context,
            id: String,
            _request: Request,
        ) -> ResourceFuture<ResourceResponse> {
            let depth = context.depth();
            async move {
                Ok(ResourceResponse::new(
                    Some(&id),
                    None,
                    json!({"name": "user", "depth": depth}),
                ))
            }
            .boxed()
        }

        fn query(&self, _context: Context, _request: Request) -> ResourceFuture<QueryResponse> {
            async {
                Ok(QueryResponse::new(vec![ResourceResponse::new(
                    Some("1"),
                    None,
                    json!({"name": "ada", "age": 36}),
                )]))
            }
            .boxed()
        }
    }

    fn instance_context(id: &str) -> Context {
        let mut variables = VariableVec::new();
        variables.push((Arc::from("id"), id.to_string()));
        Context::new().with_routing(RoutingFrame::new(
            format!("users/{id}"),
            String::new(),
            variables,
        ))
    }

    #[test]
    fn test_collection_rejects_instance_operations() {
        let handler = CollectionHandler::from_provider(&Provider::collection("Users", Users));
        let err = block_on(handler.handle(Context::new(), Request::read(""))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
        assert_eq!(err.message(), "The resource collection Users cannot be read");
    }

    #[test]
    fn test_query_results_are_filtered() {
        let handler = CollectionHandler::from_provider(&Provider::collection("Users", Users));
        let res = block_on(handler.handle(Context::new(), Request::query("").with_fields(["age"])))
            .unwrap()
            .into_query()
            .unwrap();
        assert_eq!(res.resources[0].content(), &json!({"age": 36}));
    }

    #[test]
    fn test_instance_receives_id_and_parent_context() {
        let provider = Provider::collection("Users", Users);
        let handler = CollectionInstanceHandler::from_provider(&provider, "id");
        let res = block_on(handler.handle(instance_context("42"), Request::read("")))
            .unwrap()
            .into_resource()
            .unwrap();
        assert_eq!(res.id(), Some("42"));
        // root frame only: the instance routing frame was popped
        assert_eq!(res.content()["depth"], 1);
    }

    #[test]
    fn test_instance_rejects_collection_operations() {
        let provider = Provider::collection("Users", Users);
        let handler = CollectionInstanceHandler::from_provider(&provider, "id");
        let err = block_on(handler.handle(instance_context("42"), Request::query(""))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
    }

    #[test]
    fn test_instance_without_id_is_bad_request() {
        let provider = Provider::collection("Users", Users);
        let handler = CollectionInstanceHandler::from_provider(&provider, "id");
        let err = block_on(handler.handle(Context::new(), Request::read(""))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
    }
}
