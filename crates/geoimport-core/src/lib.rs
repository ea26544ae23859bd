//! `geoimport-core` assembles the format registry used by the import pipeline.
//!
//! This crate includes:
//! - **Format Registry**: ordered capability dispatch over every registered handler.
//! - **Single-file Formats**: extension based handlers for one-layer files.
//! - **Utilities**: display helpers for bindings and layer descriptors.
//!
//! [`default_registry`] builds the registry consumed by the CLI and other parts
//! of the system.

pub mod formats;
pub mod registry;
pub mod utils;

use std::sync::Arc;

use geoimport_core_common::{CrsResolver, EpsgRegistry, Result};

pub use formats::ExtensionFormat;
pub use registry::FormatRegistry;

/// Builds a registry with every built-in format, GeoPackage first.
///
/// # Errors
///
/// Returns a configuration error if two built-in formats share a name.
pub fn default_registry() -> Result<FormatRegistry> {
    registry_with_resolver(Arc::new(EpsgRegistry::new()))
}

/// Same as [`default_registry`] with a caller-supplied CRS resolver.
///
/// # Errors
///
/// Returns a configuration error if two built-in formats share a name.
pub fn registry_with_resolver(resolver: Arc<dyn CrsResolver>) -> Result<FormatRegistry> {
    let mut registry = FormatRegistry::new();
    for handler in geoimport_gpkg::geopackage_formats(resolver.clone()) {
        registry.register(handler)?;
    }
    for format in [
        ExtensionFormat::shapefile(),
        ExtensionFormat::geotiff(),
        ExtensionFormat::csv(),
        ExtensionFormat::kml(),
        ExtensionFormat::geojson(),
    ] {
        registry.register(Arc::new(format.with_resolver(resolver.clone())))?;
    }
    Ok(registry)
}
