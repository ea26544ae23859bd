//! Single-file formats recognized by extension.
//!
//! These formats hold exactly one layer per file, named after the file stem.
//! Parsing their content belongs to the readers that import them; listing
//! only confirms the file can be opened and builds the one task.

use std::collections::BTreeMap;
use std::fs::File;
use std::sync::Arc;

use geoimport_core_common::{
    CancellationToken, Catalog, ConfigError, ContentKind, CrsResolver, EpsgRegistry,
    FALLBACK_CRS_CODE, FormatCapabilities, FormatHandler, ImportData, ImportError, ImportTask,
    ReadContextExt, ResourceInfo, Result, Store, SupportStatus, Workspace,
};
use log::debug;

/// A format handled by file extension alone.
pub struct ExtensionFormat {
    name: &'static str,
    kind: ContentKind,
    extensions: &'static [&'static str],
    direct_store: bool,
    resolver: Arc<dyn CrsResolver>,
}

impl ExtensionFormat {
    /// Creates a format claiming files with any of `extensions`.
    #[must_use]
    pub fn new(
        name: &'static str,
        kind: ContentKind,
        extensions: &'static [&'static str],
        direct_store: bool,
    ) -> Self {
        Self {
            name,
            kind,
            extensions,
            direct_store,
            resolver: Arc::new(EpsgRegistry::new()),
        }
    }

    /// Replaces the resolver used for the fallback CRS.
    #[must_use]
    pub fn with_resolver(mut self, resolver: Arc<dyn CrsResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    #[must_use]
    pub fn shapefile() -> Self {
        Self::new("Shapefile", ContentKind::Vector, &["shp"], true)
    }

    #[must_use]
    pub fn geotiff() -> Self {
        Self::new("GeoTIFF", ContentKind::Raster, &["tif", "tiff"], false)
    }

    #[must_use]
    pub fn csv() -> Self {
        Self::new("CSV", ContentKind::Vector, &["csv"], true)
    }

    #[must_use]
    pub fn kml() -> Self {
        Self::new("KML", ContentKind::Vector, &["kml"], true)
    }

    /// Claims `.geojson` only; plain `.json` files are too often something else.
    #[must_use]
    pub fn geojson() -> Self {
        Self::new("GeoJSON", ContentKind::Vector, &["geojson"], true)
    }

    /// Claimed extensions.
    #[must_use]
    pub fn extensions(&self) -> &[&str] {
        self.extensions
    }
}

impl FormatHandler for ExtensionFormat {
    fn name(&self) -> &str {
        self.name
    }

    fn kind(&self) -> ContentKind {
        self.kind
    }

    fn capabilities(&self) -> FormatCapabilities {
        let store = if self.direct_store {
            SupportStatus::Supported
        } else {
            SupportStatus::NotSupported
        };
        FormatCapabilities::new(SupportStatus::Supported, SupportStatus::NotSupported, store)
    }

    fn can_read(&self, data: &ImportData) -> bool {
        data.as_file()
            .is_some_and(|file| file.has_extension(self.extensions))
    }

    fn list(
        &self,
        data: &ImportData,
        catalog: &Catalog,
        cancel: &CancellationToken,
    ) -> Result<Vec<ImportTask>> {
        let file = data.as_file().ok_or_else(|| ImportError::Unsupported {
            format: self.name.to_string(),
            operation: format!("listing '{}'", data.describe()),
        })?;
        let path = file.path();
        if cancel.is_cancelled() {
            return Err(ImportError::Canceled {
                path: path.to_path_buf(),
            });
        }

        File::open(path).with_read_context(self.name, path)?;

        let crs = self.resolver.resolve(FALLBACK_CRS_CODE).map_err(|source| {
            ConfigError::FallbackCrs {
                code: FALLBACK_CRS_CODE.to_string(),
                source,
            }
        })?;
        let layer_name = file.stem().unwrap_or(self.name).to_string();
        let resource = ResourceInfo::new(layer_name, self.kind, Vec::new(), crs, FALLBACK_CRS_CODE);

        debug!("{}: one layer in {}", self.name, path.display());
        Ok(vec![ImportTask::new(data.clone(), catalog.build_layer(resource))])
    }

    fn create_store(
        &self,
        data: &ImportData,
        workspace: &Workspace,
        _catalog: &Catalog,
    ) -> Option<Store> {
        if !self.direct_store {
            return None;
        }
        let file = data.as_file()?;
        let mut connection_parameters = BTreeMap::new();
        connection_parameters.insert("file".to_string(), file.path().display().to_string());

        Some(Store {
            name: file.stem().unwrap_or(self.name).to_string(),
            workspace: workspace.name.clone(),
            format: self.name.to_string(),
            connection_parameters,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probes_by_extension() {
        assert!(ExtensionFormat::shapefile().can_read(&ImportData::file("foo.shp")));
        assert!(ExtensionFormat::geotiff().can_read(&ImportData::file("foo.TIFF")));
        assert!(!ExtensionFormat::csv().can_read(&ImportData::file("foo.shp")));
        assert!(!ExtensionFormat::kml().can_read(&ImportData::Directory("foo.kml".into())));
        assert!(ExtensionFormat::geojson().can_read(&ImportData::file("parcels.GeoJSON")));
        assert!(!ExtensionFormat::geojson().can_read(&ImportData::file("package.json")));
    }

    #[test]
    fn lists_one_layer_named_after_the_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("cities.csv");
        std::fs::write(&path, b"name,x,y\n").unwrap();
        let data = ImportData::file(&path);

        let tasks = ExtensionFormat::csv()
            .list(&data, &Catalog::new(), &CancellationToken::new())
            .unwrap();
        assert_eq!(tasks.len(), 1);
        let resource = tasks[0].resource();
        assert_eq!(resource.name(), "cities");
        assert_eq!(resource.native_crs().identifier(), "EPSG:4326");
        assert_eq!(resource.srs(), "EPSG:4326");
        assert!(resource.recalculate_bounds());
        assert_eq!(tasks[0].layer().default_style, "generic");
    }

    #[test]
    fn unreadable_file_is_read_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let data = ImportData::file(dir.path().join("missing.kml"));

        let err = ExtensionFormat::kml()
            .list(&data, &Catalog::new(), &CancellationToken::new())
            .unwrap_err();
        assert!(matches!(err, ImportError::Read { .. }));
    }

    #[test]
    fn direct_store_for_vector_files_only() {
        let workspace = Workspace::new("ws");
        let catalog = Catalog::new();

        let store = ExtensionFormat::shapefile()
            .create_store(&ImportData::file("/data/roads.shp"), &workspace, &catalog)
            .unwrap();
        assert_eq!(store.name, "roads");
        assert_eq!(store.workspace, "ws");
        assert_eq!(store.format, "Shapefile");
        assert_eq!(store.connection_parameters["file"], "/data/roads.shp");

        assert!(
            ExtensionFormat::geotiff()
                .create_store(&ImportData::file("/data/dem.tif"), &workspace, &catalog)
                .is_none()
        );
    }
}
