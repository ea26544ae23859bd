//! GeoPackage tile and gridded coverage tables.

use std::sync::Arc;

use geoimport_core_common::{
    CancellationToken, Catalog, ContentKind, CrsResolver, EpsgRegistry, FormatCapabilities,
    FormatHandler, ImportData, ImportTask, Result, Store, SupportStatus, Workspace,
};

use crate::GPKG_EXTENSIONS;
use crate::lister::LayerLister;

/// Reads raster (tiles, coverage) tables from `.gpkg` files.
///
/// Claims the same files as [`GeoPackageVectorFormat`](crate::GeoPackageVectorFormat);
/// a container can hold both kinds of content.
pub struct GeoPackageRasterFormat {
    resolver: Arc<dyn CrsResolver>,
}

impl GeoPackageRasterFormat {
    pub const NAME: &'static str = "GeoPackage Raster";

    #[must_use]
    pub fn new() -> Self {
        Self::with_resolver(Arc::new(EpsgRegistry::new()))
    }

    #[must_use]
    pub fn with_resolver(resolver: Arc<dyn CrsResolver>) -> Self {
        Self { resolver }
    }
}

impl Default for GeoPackageRasterFormat {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatHandler for GeoPackageRasterFormat {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn kind(&self) -> ContentKind {
        ContentKind::Raster
    }

    fn capabilities(&self) -> FormatCapabilities {
        FormatCapabilities::new(
            SupportStatus::Supported,
            SupportStatus::NotSupported,
            SupportStatus::NotSupported,
        )
    }

    fn can_read(&self, data: &ImportData) -> bool {
        data.as_file()
            .is_some_and(|file| file.has_extension(GPKG_EXTENSIONS))
    }

    fn list(
        &self,
        data: &ImportData,
        catalog: &Catalog,
        cancel: &CancellationToken,
    ) -> Result<Vec<ImportTask>> {
        LayerLister {
            format: Self::NAME,
            kind: ContentKind::Raster,
            resolver: self.resolver.as_ref(),
        }
        .list(data, catalog, cancel)
    }

    fn create_store(
        &self,
        _data: &ImportData,
        _workspace: &Workspace,
        _catalog: &Catalog,
    ) -> Option<Store> {
        None
    }
}
