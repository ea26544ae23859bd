//! Common types and traits shared across `geoimport` crates.
//!
//! This crate provides the core abstractions that are shared between
//! `geoimport-core` and format implementation crates, preventing circular dependencies.

pub mod catalog;
pub mod crs;
pub mod data;
pub mod error;
pub mod feature;
pub mod format;
pub mod task;

// Re-export commonly used types
pub use catalog::{AttributeTypeInfo, Bounds, Catalog, LayerInfo, ResourceInfo, Store, Workspace};
pub use crs::{Crs, CrsResolver, EpsgRegistry, FALLBACK_CRS_CODE};
pub use data::{ImportData, SpatialFile};
pub use error::{ConfigError, FormatError, ImportError, ReadContextExt, Result};
pub use feature::{
    AttributeDescriptor, Binding, Feature, FeatureReader, FeatureType, GeometryKind, Value,
};
pub use format::{
    ContentKind, FormatCapabilities, FormatHandler, SupportStatus, UNKNOWN_FEATURE_COUNT,
    VectorFormat,
};
pub use task::{ImportTask, Metadata};
pub use tokio_util::sync::CancellationToken;
