//! Format handler traits and capability descriptions.
//!
//! A format handler answers "can I read this candidate?" and "which layers
//! does it contain?". Handlers are created once, registered with a registry
//! and shared read-only afterwards, so every method takes `&self`.

use tokio_util::sync::CancellationToken;

use crate::catalog::{Catalog, Store, Workspace};
use crate::data::ImportData;
use crate::error::Result;
use crate::feature::FeatureReader;
use crate::task::ImportTask;

/// Feature count reported when counting would need a full scan.
pub const UNKNOWN_FEATURE_COUNT: i64 = -1;

/// Kind of content a handler imports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    Vector,
    Raster,
}

impl ContentKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Vector => "Vector",
            ContentKind::Raster => "Raster",
        }
    }
}

/// Support status for a specific handler operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupportStatus {
    /// The operation is implemented.
    Supported,
    /// The operation is intentionally absent.
    NotSupported,
}

impl SupportStatus {
    /// Returns `true` if the operation is implemented.
    #[must_use]
    pub fn is_supported(&self) -> bool {
        matches!(self, SupportStatus::Supported)
    }

    /// Returns the string representation of this support status.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            SupportStatus::Supported => "Supported",
            SupportStatus::NotSupported => "Not Supported",
        }
    }
}

/// Operations offered by a format handler.
#[derive(Debug, Clone, Copy)]
pub struct FormatCapabilities {
    /// Listing layers as import tasks.
    pub list: SupportStatus,
    /// Reading features of a listed layer.
    pub read: SupportStatus,
    /// Creating a connected store (direct import).
    pub store: SupportStatus,
}

impl FormatCapabilities {
    /// Creates a capability set.
    #[must_use]
    pub const fn new(list: SupportStatus, read: SupportStatus, store: SupportStatus) -> Self {
        Self { list, read, store }
    }
}

/// A format specific capability implementation.
pub trait FormatHandler: Send + Sync {
    /// Unique display name, e.g. `"GeoPackage Vector"`.
    fn name(&self) -> &str;

    /// Kind of content this handler imports.
    fn kind(&self) -> ContentKind;

    /// Operations this handler offers.
    fn capabilities(&self) -> FormatCapabilities;

    /// Cheap capability probe.
    ///
    /// Never fails: malformed or non file-backed candidates yield `false`.
    fn can_read(&self, data: &ImportData) -> bool;

    /// Lists one import task per importable layer, in container order.
    ///
    /// `cancel` is checked between layers.
    ///
    /// # Errors
    ///
    /// Returns an error if the container cannot be opened, if a layer fails,
    /// if the fallback CRS cannot be resolved, or if listing was canceled.
    fn list(
        &self,
        data: &ImportData,
        catalog: &Catalog,
        cancel: &CancellationToken,
    ) -> Result<Vec<ImportTask>>;

    /// Number of features of a task, or [`UNKNOWN_FEATURE_COUNT`].
    fn feature_count(&self, _data: &ImportData, _task: &ImportTask) -> i64 {
        UNKNOWN_FEATURE_COUNT
    }

    /// Creates a connected store for direct import.
    ///
    /// `None` means direct import is not offered and the caller should import
    /// layer by layer.
    fn create_store(
        &self,
        data: &ImportData,
        workspace: &Workspace,
        catalog: &Catalog,
    ) -> Option<Store>;

    /// Row reading capability, for handlers that import vector features.
    fn as_vector(&self) -> Option<&dyn VectorFormat> {
        None
    }
}

/// Handlers able to stream features of a listed layer.
pub trait VectorFormat: FormatHandler {
    /// Opens a reader over the layer named by [`ImportTask::original_layer_name`].
    ///
    /// # Errors
    ///
    /// Returns an error if the container cannot be opened or the layer does not exist.
    fn read(&self, data: &ImportData, task: &ImportTask) -> Result<Box<dyn FeatureReader>>;

    /// Releases a reader obtained from [`VectorFormat::read`].
    ///
    /// # Errors
    ///
    /// Returns an error if the reader fails to close.
    fn dispose(&self, reader: Box<dyn FeatureReader>, _task: &ImportTask) -> Result<()> {
        reader.close()
    }
}
