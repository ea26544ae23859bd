//! GeoPackage vector layers.

use std::sync::Arc;

use geoimport_core_common::{
    CancellationToken, Catalog, ContentKind, CrsResolver, EpsgRegistry, FeatureReader,
    FormatCapabilities, FormatError, FormatHandler, ImportData, ImportError, ImportTask,
    ReadContextExt, Result, Store, SupportStatus, UNKNOWN_FEATURE_COUNT, VectorFormat, Workspace,
};
use log::debug;

use crate::GPKG_EXTENSIONS;
use crate::container::GeoPackage;
use crate::lister::LayerLister;
use crate::reader::{GpkgFeatureReader, RowFilter};
use crate::schema::SchemaSynthesizer;

/// Reads vector feature tables from `.gpkg` files.
pub struct GeoPackageVectorFormat {
    resolver: Arc<dyn CrsResolver>,
}

impl GeoPackageVectorFormat {
    pub const NAME: &'static str = "GeoPackage Vector";

    /// Creates the handler with the built-in EPSG registry.
    #[must_use]
    pub fn new() -> Self {
        Self::with_resolver(Arc::new(EpsgRegistry::new()))
    }

    /// Creates the handler with a custom CRS resolver.
    #[must_use]
    pub fn with_resolver(resolver: Arc<dyn CrsResolver>) -> Self {
        Self { resolver }
    }
}

impl Default for GeoPackageVectorFormat {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatHandler for GeoPackageVectorFormat {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn kind(&self) -> ContentKind {
        ContentKind::Vector
    }

    fn capabilities(&self) -> FormatCapabilities {
        FormatCapabilities::new(
            SupportStatus::Supported,
            SupportStatus::Supported,
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
            kind: ContentKind::Vector,
            resolver: self.resolver.as_ref(),
        }
        .list(data, catalog, cancel)
    }

    fn feature_count(&self, _data: &ImportData, _task: &ImportTask) -> i64 {
        // no fast way to count without scanning the whole table
        UNKNOWN_FEATURE_COUNT
    }

    fn create_store(
        &self,
        data: &ImportData,
        _workspace: &Workspace,
        _catalog: &Catalog,
    ) -> Option<Store> {
        debug!(
            "{}: direct import not supported for {}",
            Self::NAME,
            data.describe()
        );
        None
    }

    fn as_vector(&self) -> Option<&dyn VectorFormat> {
        Some(self)
    }
}

impl VectorFormat for GeoPackageVectorFormat {
    fn read(&self, data: &ImportData, task: &ImportTask) -> Result<Box<dyn FeatureReader>> {
        let file = data.as_file().ok_or_else(|| ImportError::Unsupported {
            format: Self::NAME.to_string(),
            operation: format!("reading '{}'", data.describe()),
        })?;
        let path = file.path();
        let layer = task.original_layer_name();

        let gpkg = GeoPackage::open_read_only(path).with_read_context(Self::NAME, path)?;
        let table = gpkg
            .feature(layer)
            .with_read_context(Self::NAME, path)?
            .ok_or_else(|| FormatError::LayerNotFound {
                layer: layer.to_string(),
                path: path.to_path_buf(),
            })?;
        let feature_type = SchemaSynthesizer::new(Self::NAME, self.resolver.as_ref())
            .feature_type(&gpkg, &table)?;
        let key = gpkg
            .schema_of(&table.name)
            .with_read_context(Self::NAME, path)?
            .row_key();

        debug!("{}: opening reader on {layer}", Self::NAME);
        Ok(Box::new(GpkgFeatureReader::new(
            gpkg,
            Self::NAME,
            &table.name,
            &key,
            feature_type,
            RowFilter::Include,
        )))
    }
}
