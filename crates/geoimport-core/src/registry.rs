//! Format registry and capability dispatch.
//!
//! The registry holds the ordered set of format handlers known to the
//! importer. Looking up a candidate asks every handler whether it can read
//! it and returns *all* handlers that do, in registration order: a single
//! GeoPackage is legitimately claimed by both a vector and a raster handler.
//!
//! # Examples
//!
//! ```
//! use geoimport_core::default_registry;
//!
//! let registry = default_registry().expect("built-in formats register cleanly");
//! let gpkg = registry.find("geopackage vector").expect("GeoPackage should exist");
//! assert_eq!(gpkg.name(), "GeoPackage Vector");
//! ```

use std::path::Path;
use std::sync::Arc;

use geoimport_core_common::{ConfigError, FormatHandler, ImportData, ImportError, Result};
use log::{debug, warn};

/// Ordered collection of registered format handlers.
///
/// Built once at startup and shared read-only afterwards.
#[derive(Default, Clone)]
pub struct FormatRegistry {
    handlers: Vec<Arc<dyn FormatHandler>>,
}

impl FormatRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a handler.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DuplicateFormat`] if a handler with the same
    /// name (case-insensitive) is already registered.
    pub fn register(&mut self, handler: Arc<dyn FormatHandler>) -> Result<()> {
        if self.find(handler.name()).is_some() {
            return Err(ConfigError::DuplicateFormat {
                name: handler.name().to_string(),
            }
            .into());
        }
        debug!("Registered format '{}'", handler.name());
        self.handlers.push(handler);
        Ok(())
    }

    /// Handlers in registration order.
    #[must_use]
    pub fn handlers(&self) -> &[Arc<dyn FormatHandler>] {
        &self.handlers
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Finds a handler by name (case-insensitive).
    #[must_use]
    pub fn find(&self, name: &str) -> Option<Arc<dyn FormatHandler>> {
        self.handlers
            .iter()
            .find(|h| h.name().eq_ignore_ascii_case(name))
            .cloned()
    }

    /// Returns all handler names in alphabetically sorted order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.iter().map(|h| h.name()).collect();
        names.sort_unstable();
        names
    }

    /// Returns every handler that claims `data`, in registration order.
    ///
    /// An empty result means no registered format understands the candidate.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::NotFound`] if the candidate is path-backed and
    /// the path does not exist.
    pub fn lookup(&self, data: &ImportData) -> Result<Vec<Arc<dyn FormatHandler>>> {
        if let Some(path) = data.path() {
            match path.try_exists() {
                Ok(true) => {},
                Ok(false) => {
                    return Err(ImportError::NotFound {
                        path: path.to_path_buf(),
                    });
                },
                // existence cannot be decided, the probes still can run
                Err(e) => warn!("Cannot check {}: {e}", path.display()),
            }
        }

        let claiming: Vec<_> = self
            .handlers
            .iter()
            .filter(|h| h.can_read(data))
            .cloned()
            .collect();

        debug!(
            "{} claimed by [{}]",
            data.describe(),
            claiming
                .iter()
                .map(|h| h.name())
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(claiming)
    }

    /// Shorthand for looking up a file candidate.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::NotFound`] if the path does not exist.
    pub fn lookup_path(&self, path: impl AsRef<Path>) -> Result<Vec<Arc<dyn FormatHandler>>> {
        self.lookup(&ImportData::file(path.as_ref()))
    }
}
