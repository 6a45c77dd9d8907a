//! # Resource Descriptor
//!
//! The introspection artifact handed to API documentation generators. One
//! [`ResourceDescriptor`] is built per provider while the handler tree is
//! assembled; sub-resources are nested under their sub-path names in
//! declaration order. Resource schemas are not inlined: each descriptor
//! refers by name into the shared [`Definitions`] registry of the
//! [`ApiDescriptor`].
//!
//! Descriptors are immutable once the tree is built and are shared through
//! `Arc`.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;

use crate::provider::{Provider, Variant};
use crate::request::Operation;

/// Shared registry of resource schemas, keyed by schema name
pub type Definitions = BTreeMap<String, Value>;

/// Sub-resources keyed by sub-path name, in declaration order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubResources(Vec<(String, Arc<ResourceDescriptor>)>);

impl SubResources {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ResourceDescriptor> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, d)| d.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ResourceDescriptor)> {
        self.0.iter().map(|(n, d)| (n.as_str(), d.as_ref()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn insert(&mut self, name: &str, descriptor: ResourceDescriptor) {
        let descriptor = Arc::new(descriptor);
        match self.0.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = descriptor,
            None => self.0.push((name.to_string(), descriptor)),
        }
    }
}

impl Serialize for SubResources {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, descriptor) in &self.0 {
            map.serialize_entry(name, descriptor.as_ref())?;
        }
        map.end()
    }
}

/// Operations addressable on a collection's instances
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemsDescriptor {
    pub operations: Vec<Operation>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<String>,
}

/// Description of one resource in the tree
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDescriptor {
    pub variant: Variant,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub operations: Vec<Operation>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_resources: Option<SubResources>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<ItemsDescriptor>,
    /// Reference into [`ApiDescriptor::definitions`], e.g. `#/definitions/User`
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub schema_ref: Option<String>,
}

impl ResourceDescriptor {
    /// Describe `provider` routed as `variant`, registering its schema in
    /// `definitions`.
    ///
    /// Providers built from bindings report only the operations that are
    /// bound; capability providers report every operation of their variant.
    #[must_use]
    pub fn for_provider(
        provider: &Provider,
        variant: Variant,
        definitions: &mut Definitions,
    ) -> Self {
        let bound = provider.bindings().map(|b| b.operations());
        let has_capability = match variant {
            Variant::SingletonResource => provider.singleton_capability().is_some(),
            Variant::CollectionResource => provider.collection_capability().is_some(),
            Variant::RequestHandler => provider.handler_capability().is_some(),
        };
        let supported = |ops: &[Operation]| -> Vec<Operation> {
            match (&bound, has_capability) {
                (Some(bound), false) => {
                    ops.iter().copied().filter(|op| bound.contains(op)).collect()
                }
                _ => ops.to_vec(),
            }
        };
        let actions = provider.bindings().map(|b| b.actions()).unwrap_or_default();

        let items = (variant == Variant::CollectionResource).then(|| ItemsDescriptor {
            operations: supported(variant.instance_operations()),
            actions: actions.clone(),
        });

        let schema_ref = provider.meta().schema.as_ref().map(|(name, schema)| {
            if let Some(previous) = definitions.insert(name.clone(), schema.clone()) {
                if &previous != schema {
                    warn!(
                        schema = %name,
                        provider = %provider.name(),
                        "Schema definition replaced"
                    );
                }
            }
            format!("#/definitions/{name}")
        });

        Self {
            variant,
            title: provider.meta().title.clone(),
            description: provider.meta().description.clone(),
            operations: supported(variant.operations()),
            actions,
            sub_resources: None,
            items,
            schema_ref,
        }
    }

    /// Nest `child` under `name`. Re-adding a name replaces the earlier child.
    pub fn add_sub_resource(&mut self, name: &str, child: ResourceDescriptor) {
        self.sub_resources
            .get_or_insert_with(SubResources::default)
            .insert(name, child);
    }

    #[must_use]
    pub fn sub_resource(&self, name: &str) -> Option<&ResourceDescriptor> {
        self.sub_resources.as_ref().and_then(|s| s.get(name))
    }
}

/// Aggregate descriptor of a whole handler tree
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiDescriptor {
    /// Prefix the tree is mounted under, if relocated
    #[serde(rename = "basePath", skip_serializing_if = "Option::is_none")]
    pub base_path: Option<String>,
    pub root: ResourceDescriptor,
    pub definitions: Definitions,
}

impl ApiDescriptor {
    /// Walk sub-resources by `/`-separated names; the empty path is the root
    #[must_use]
    pub fn find(&self, path: &str) -> Option<&ResourceDescriptor> {
        path.split('/')
            .filter(|s| !s.is_empty())
            .try_fold(&self.root, |node, name| node.sub_resource(name))
    }

    /// Render as JSON for documentation generators
    #[must_use]
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Anything able to describe the API it serves
pub trait Describable {
    fn api_descriptor(&self) -> Arc<ApiDescriptor>;
}
