use std::fmt;
use std::sync::Arc;
use tracing::debug;

use super::{filtered, reject, respond};
use crate::context::Context;
use crate::error::ResourceError;
use crate::provider::{Provider, RequestHandler, ResourceFuture, SingletonResourceProvider};
use crate::request::{Operation, Request};
use crate::response::Response;

/// Adapter routing requests to a singleton resource
pub struct SingletonHandler {
    name: Arc<str>,
    provider: Arc<dyn SingletonResourceProvider>,
}

impl fmt::Debug for SingletonHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SingletonHandler")
            .field("name", &self.name)
            .finish()
    }
}

impl SingletonHandler {
    #[must_use]
    pub fn new(name: &str, provider: Arc<dyn SingletonResourceProvider>) -> Self {
        Self {
            name: Arc::from(name),
            provider,
        }
    }

    /// Adapt the provider's singleton capability, or its bindings if it has none
    #[must_use]
    pub fn from_provider(provider: &Provider) -> Self {
        let capability: Arc<dyn SingletonResourceProvider> = match provider.singleton_capability()
        {
            Some(p) => Arc::clone(p),
            None => provider.bindings_or_empty(),
        };
        Self::new(provider.name(), capability)
    }
}

impl RequestHandler for SingletonHandler {
    fn handle(&self, context: Context, request: Request) -> ResourceFuture<Response> {
        let operation = request.operation();
        debug!(resource = %self.name, operation = %operation, "Singleton request");
        let fields = request.fields().to_vec();
        let result = match operation {
            Operation::Read => respond(self.provider.read(context, request)),
            Operation::Update => respond(self.provider.update(context, request)),
            Operation::Patch => respond(self.provider.patch(context, request)),
            Operation::Action => respond(self.provider.action(context, request)),
            Operation::Create | Operation::Delete | Operation::Query => {
                return reject(ResourceError::bad_request(format!(
                    "The singleton resource {} cannot be {}",
                    self.name,
                    operation.past_tense()
                )));
            }
        };
        filtered(result, fields)
    }
}
