use tracing::{debug, error};

use super::{Provider, Variant};
use crate::error::RouterError;

/// Decide how `provider` is routed.
///
/// An explicitly declared variant is returned verbatim. Otherwise the
/// capabilities are probed in a fixed order: singleton, collection, then
/// request handler. A provider with neither a declaration nor a capability
/// cannot be routed.
pub fn classify(provider: &Provider) -> Result<Variant, RouterError> {
    if let Some(variant) = provider.declared_variant() {
        debug!(provider = %provider.name(), variant = %variant, "Using declared provider variant");
        return Ok(variant);
    }

    let deduced = if provider.singleton_capability().is_some() {
        Some(Variant::SingletonResource)
    } else if provider.collection_capability().is_some() {
        Some(Variant::CollectionResource)
    } else if provider.handler_capability().is_some() {
        Some(Variant::RequestHandler)
    } else {
        None
    };

    match deduced {
        Some(variant) => {
            debug!(provider = %provider.name(), variant = %variant, "Deduced provider variant");
            Ok(variant)
        }
        None => {
            error!(provider = %provider.name(), "Cannot deduce provider variant");
            Err(RouterError::CannotDeduceVariant {
                provider: provider.name().to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::error::ResourceError;
    use crate::provider::{
        CollectionResourceProvider, RequestHandler, ResourceFuture, SingletonResourceProvider,
    };
    use crate::request::Request;
    use crate::response::Response;
    use futures::FutureExt;

    struct Everything;

    impl SingletonResourceProvider for Everything {}
    impl CollectionResourceProvider for Everything {}
    impl RequestHandler for Everything {
        fn handle(&self, _context: Context, _request: Request) -> ResourceFuture<Response> {
            async { Err(ResourceError::internal("unused")) }.boxed()
        }
    }

    #[test]
    fn test_declared_variant_wins() {
        let provider = Provider::builder("Everything")
            .variant(Variant::RequestHandler)
            .singleton(Everything)
            .collection(Everything)
            .build();
        assert_eq!(classify(&provider).unwrap(), Variant::RequestHandler);
    }

    #[test]
    fn test_singleton_probed_before_collection() {
        let provider = Provider::builder("Everything")
            .collection(Everything)
            .singleton(Everything)
            .handler(Everything)
            .build();
        assert_eq!(classify(&provider).unwrap(), Variant::SingletonResource);
    }

    #[test]
    fn test_collection_probed_before_handler() {
        let provider = Provider::builder("Everything")
            .handler(Everything)
            .collection(Everything)
            .build();
        assert_eq!(classify(&provider).unwrap(), Variant::CollectionResource);
    }

    #[test]
    fn test_collection_only() {
        let provider = Provider::collection("Users", Everything);
        assert_eq!(classify(&provider).unwrap(), Variant::CollectionResource);
    }

    #[test]
    fn test_handler_only() {
        let provider = Provider::handler("Proxy", Everything);
        assert_eq!(classify(&provider).unwrap(), Variant::RequestHandler);
    }

    #[test]
    fn test_nothing_to_classify() {
        let provider = Provider::builder("Empty").build();
        let err = classify(&provider).unwrap_err();
        assert!(matches!(
            err,
            RouterError::CannotDeduceVariant { ref provider } if provider == "Empty"
        ));
        assert_eq!(err.to_string(), "cannot deduce provider variant for 'Empty'");
    }
}
