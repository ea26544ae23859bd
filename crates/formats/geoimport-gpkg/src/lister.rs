//! Layer listing shared by the vector and raster handlers.

use geoimport_core_common::{
    CancellationToken, Catalog, ContentKind, CrsResolver, ImportData, ImportError, ImportTask,
    ReadContextExt, Result,
};
use log::{debug, info};

use crate::container::GeoPackage;
use crate::schema::SchemaSynthesizer;

/// Opens a container and builds one task per table of a given kind.
pub(crate) struct LayerLister<'a> {
    pub format: &'a str,
    pub kind: ContentKind,
    pub resolver: &'a dyn CrsResolver,
}

impl LayerLister<'_> {
    /// Lists tasks in `gpkg_contents` order.
    ///
    /// Fails fast: the first failing table aborts the listing with
    /// [`ImportError::Layer`]. An unresolvable fallback CRS is reported as is.
    pub fn list(
        &self,
        data: &ImportData,
        catalog: &Catalog,
        cancel: &CancellationToken,
    ) -> Result<Vec<ImportTask>> {
        let file = data.as_file().ok_or_else(|| ImportError::Unsupported {
            format: self.format.to_string(),
            operation: format!("listing '{}'", data.describe()),
        })?;
        let path = file.path();

        // The handle is released on every return path when `gpkg` drops.
        let gpkg = GeoPackage::open_read_only(path).with_read_context(self.format, path)?;
        let tables = match self.kind {
            ContentKind::Vector => gpkg.features(),
            ContentKind::Raster => gpkg.tiles(),
        }
        .with_read_context(self.format, path)?;

        let synthesizer = SchemaSynthesizer::new(self.format, self.resolver);
        let mut tasks = Vec::with_capacity(tables.len());

        for table in &tables {
            if cancel.is_cancelled() {
                return Err(ImportError::Canceled {
                    path: path.to_path_buf(),
                });
            }

            let layer = synthesizer
                .synthesize(&gpkg, table)
                .map_err(|err| match err {
                    ImportError::Config(_) => err,
                    other => ImportError::Layer {
                        layer: table.name.clone(),
                        source: Box::new(other),
                    },
                })?;
            debug!("{}", layer.feature_type);

            let mut task = ImportTask::new(data.clone(), catalog.build_layer(layer.resource));
            if self.kind == ContentKind::Vector {
                task.metadata_mut().insert(layer.feature_type);
            }
            tasks.push(task);
        }

        gpkg.close().with_read_context(self.format, path)?;
        info!(
            "{}: listed {} layer(s) in {}",
            self.format,
            tasks.len(),
            path.display()
        );
        Ok(tasks)
    }
}
