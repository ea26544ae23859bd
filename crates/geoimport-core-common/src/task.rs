//! Import tasks, one per importable layer.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::catalog::{LayerInfo, ResourceInfo};
use crate::data::ImportData;

/// Metadata bag keyed by value type.
///
/// Holds at most one value per type, the way a task carries the
/// [`FeatureType`](crate::feature::FeatureType) synthesized while listing.
#[derive(Clone, Default)]
pub struct Metadata {
    entries: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl Metadata {
    /// Stores `value`, replacing any earlier value of the same type.
    pub fn insert<T: Any + Send + Sync>(&mut self, value: T) {
        self.entries.insert(TypeId::of::<T>(), Arc::new(value));
    }

    #[must_use]
    pub fn get<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.entries
            .get(&TypeId::of::<T>())
            .and_then(|value| value.downcast_ref::<T>())
    }

    #[must_use]
    pub fn contains<T: Any + Send + Sync>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Metadata")
            .field("entries", &self.entries.len())
            .finish()
    }
}

/// A provisional import of one layer.
#[derive(Debug, Clone)]
pub struct ImportTask {
    data: ImportData,
    layer: LayerInfo,
    original_layer_name: Option<String>,
    metadata: Metadata,
}

impl ImportTask {
    #[must_use]
    pub fn new(data: ImportData, layer: LayerInfo) -> Self {
        Self {
            data,
            layer,
            original_layer_name: None,
            metadata: Metadata::default(),
        }
    }

    /// The candidate this task was listed from.
    #[must_use]
    pub fn data(&self) -> &ImportData {
        &self.data
    }

    #[must_use]
    pub fn layer(&self) -> &LayerInfo {
        &self.layer
    }

    #[must_use]
    pub fn resource(&self) -> &ResourceInfo {
        &self.layer.resource
    }

    /// Mutable access for the downstream bounds computation.
    pub fn resource_mut(&mut self) -> &mut ResourceInfo {
        &mut self.layer.resource
    }

    /// Native layer the reader opens: the override if one was set,
    /// otherwise the resource's native name.
    #[must_use]
    pub fn original_layer_name(&self) -> &str {
        self.original_layer_name
            .as_deref()
            .unwrap_or_else(|| self.layer.resource.native_name())
    }

    /// Redirects the task to another native layer.
    pub fn set_original_layer_name(&mut self, name: impl Into<String>) {
        self.original_layer_name = Some(name.into());
    }

    #[must_use]
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
