//! Error types for format detection and layer listing.
//!
//! The root [`ImportError`] mirrors the failure taxonomy the import pipeline
//! branches on: a missing candidate, a container that cannot be read, a broken
//! deployment (the fallback CRS cannot be resolved), a single layer failing
//! while others were fine, and cooperative cancellation.
//!
//! Negative capability answers ("no handler claims this file", "direct store
//! creation is not offered") are *not* errors; they are expressed as empty
//! vectors, `Option::None` or sentinel counts.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for import listing operations.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The candidate path does not exist.
    #[error("File not found: '{path}'")]
    NotFound {
        /// The missing path
        path: PathBuf,
    },

    /// An operation was requested from a handler that cannot perform it.
    #[error("Format '{format}' does not support {operation}")]
    Unsupported {
        /// The handler name
        format: String,
        /// The operation that's not supported (e.g., "reading features")
        operation: String,
    },

    /// The container could not be opened or parsed.
    #[error("Failed to read {format} file '{path}': {source}")]
    Read {
        /// The format being read (e.g., "GeoPackage Vector")
        format: String,
        /// The file path
        path: PathBuf,
        /// The underlying error
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Deployment or programming defect, such as an unresolvable fallback CRS.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Format level problems found while working with an opened container.
    #[error(transparent)]
    Format(#[from] FormatError),

    /// One layer among many failed while listing.
    #[error("Layer '{layer}' could not be listed: {source}")]
    Layer {
        /// The native name of the failing layer
        layer: String,
        /// What went wrong with it
        #[source]
        source: Box<ImportError>,
    },

    /// Listing was canceled between two layers.
    #[error("Listing of '{path}' was canceled")]
    Canceled {
        /// The candidate being listed
        path: PathBuf,
    },

    /// Generic errors from dependencies
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Configuration errors.
///
/// These point at a broken deployment rather than at bad input data.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The fallback coordinate reference system itself cannot be resolved.
    #[error("Fallback CRS '{code}' cannot be resolved: {source}")]
    FallbackCrs {
        /// The authority code of the fallback CRS
        code: String,
        /// Why resolution failed
        #[source]
        source: UnknownAuthorityError,
    },

    /// A handler with the same name is already registered.
    #[error("Format '{name}' is already registered")]
    DuplicateFormat {
        /// The name of the rejected handler
        name: String,
    },
}

/// Errors raised while working with an opened container.
#[derive(Debug, Error)]
pub enum FormatError {
    /// The requested layer does not exist in the container.
    #[error("Layer '{layer}' not found in '{path}'")]
    LayerNotFound {
        /// The requested layer name
        layer: String,
        /// The container path
        path: PathBuf,
    },

    /// The layer schema could not be introspected.
    #[error("Schema of layer '{layer}' is invalid: {reason}")]
    Schema {
        /// The layer name
        layer: String,
        /// Why introspection failed
        reason: String,
    },
}

/// Raised by a [`CrsResolver`](crate::crs::CrsResolver) for codes it does not know.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("No code \"{code}\" from authority \"{authority}\" found")]
pub struct UnknownAuthorityError {
    /// The authority part of the code (e.g. `EPSG`)
    pub authority: String,
    /// The authority specific code
    pub code: String,
}

/// Type alias for Results using `ImportError`.
pub type Result<T> = std::result::Result<T, ImportError>;

impl ImportError {
    /// Get a user-friendly error message.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Read { format, path, .. } => {
                format!("Failed to read {} file: {}", format, path.display())
            },
            Self::Layer { layer, source } => {
                format!("Layer '{layer}' failed: {}", source.user_message())
            },
            Self::Config(e) => format!("Configuration error: {e}"),
            Self::Other(e) => format!("Error: {e}"),
            _ => self.to_string(),
        }
    }

    /// Get recovery suggestions if available.
    #[must_use]
    pub fn recovery_suggestion(&self) -> Option<String> {
        match self {
            Self::NotFound { .. } => {
                Some("Check that the file path is correct and the file exists.".to_string())
            },
            Self::Read { .. } => {
                Some("Check that the file is a valid, readable container.".to_string())
            },
            Self::Unsupported { .. } => {
                Some("Run 'geoimport formats' to see what each format supports.".to_string())
            },
            Self::Config(ConfigError::FallbackCrs { .. }) => {
                Some("The CRS registry is incomplete; this is a deployment problem.".to_string())
            },
            Self::Layer { source, .. } => source.recovery_suggestion(),
            _ => None,
        }
    }

    /// Check if this error means the candidate does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Extension trait for adding read context to errors.
pub trait ReadContextExt<T> {
    /// Wrap the error into an [`ImportError::Read`].
    ///
    /// # Errors
    ///
    /// Returns an [`ImportError::Read`] if the underlying operation fails.
    fn with_read_context(self, format: &str, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T, E> ReadContextExt<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn with_read_context(self, format: &str, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|e| ImportError::Read {
            format: format.to_string(),
            path: path.into(),
            source: Box::new(e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn read_context_keeps_cause() {
        let io: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        let err = io.with_read_context("GeoPackage Vector", "a.gpkg").unwrap_err();

        assert_eq!(
            err.to_string(),
            "Failed to read GeoPackage Vector file 'a.gpkg': denied"
        );
        assert!(err.source().is_some());
        assert!(err.recovery_suggestion().is_some());
    }

    #[test]
    fn layer_error_wraps_inner_message() {
        let err = ImportError::Layer {
            layer: "roads".to_string(),
            source: Box::new(ImportError::Format(FormatError::Schema {
                layer: "roads".to_string(),
                reason: "no columns".to_string(),
            })),
        };
        assert_eq!(
            err.user_message(),
            "Layer 'roads' failed: Schema of layer 'roads' is invalid: no columns"
        );
    }

    #[test]
    fn fallback_crs_is_config_error() {
        let err = ImportError::from(ConfigError::FallbackCrs {
            code: "EPSG:4326".to_string(),
            source: UnknownAuthorityError {
                authority: "EPSG".to_string(),
                code: "4326".to_string(),
            },
        });
        assert!(err.user_message().starts_with("Configuration error:"));
        assert!(!err.is_not_found());
    }
}
