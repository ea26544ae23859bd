//! GeoPackage support for the import pipeline.
//!
//! A single `.gpkg` file can hold vector feature tables and raster tile
//! tables side by side, so this crate provides two handlers claiming the same
//! files:
//!
//! - [`GeoPackageVectorFormat`] lists feature tables, and reads their rows
//! - [`GeoPackageRasterFormat`] lists tile and gridded coverage tables
//!
//! Neither offers direct store creation or feature counts.

pub mod container;
mod lister;
pub mod reader;
mod raster;
pub mod schema;
mod vector;

use std::sync::Arc;

use geoimport_core_common::{CrsResolver, FormatHandler};

pub use container::{GeoPackage, GpkgError, RowKey, TableDescriptor};
pub use raster::GeoPackageRasterFormat;
pub use reader::{GpkgFeatureReader, RowFilter};
pub use schema::{SchemaSynthesizer, SynthesizedLayer};
pub use vector::GeoPackageVectorFormat;

/// File extensions claimed by the GeoPackage handlers.
pub const GPKG_EXTENSIONS: &[&str] = &["gpkg"];

/// Both GeoPackage handlers, vector first, sharing one CRS resolver.
#[must_use]
pub fn geopackage_formats(resolver: Arc<dyn CrsResolver>) -> Vec<Arc<dyn FormatHandler>> {
    vec![
        Arc::new(GeoPackageVectorFormat::with_resolver(resolver.clone())),
        Arc::new(GeoPackageRasterFormat::with_resolver(resolver)),
    ]
}
