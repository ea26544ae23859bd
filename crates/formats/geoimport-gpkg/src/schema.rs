//! Per-layer schema synthesis.
//!
//! Turns a table registered in a GeoPackage into the normalized records an
//! import task carries: a [`FeatureType`] capturing the source schema and a
//! [`ResourceInfo`] with the resolved CRS, the declared SRS string and
//! sentinel bounds.

use arrow_schema::{DataType, TimeUnit};
use geoimport_core_common::{
    AttributeDescriptor, AttributeTypeInfo, Binding, ConfigError, ContentKind, Crs, CrsResolver,
    FALLBACK_CRS_CODE, FeatureType, FormatError, GeometryKind, ReadContextExt, ResourceInfo, Result,
};
use log::warn;

use crate::container::{ColumnInfo, GeoPackage, TableDescriptor};

/// Output of synthesizing one table.
#[derive(Debug, Clone)]
pub struct SynthesizedLayer {
    /// Source schema, renamed after the table.
    pub feature_type: FeatureType,
    /// Importable unit built from it.
    pub resource: ResourceInfo,
}

/// Derives feature types and resources for container tables.
pub struct SchemaSynthesizer<'a> {
    format: &'a str,
    resolver: &'a dyn CrsResolver,
}

impl<'a> SchemaSynthesizer<'a> {
    /// `format` names the handler in read errors.
    #[must_use]
    pub fn new(format: &'a str, resolver: &'a dyn CrsResolver) -> Self {
        Self { format, resolver }
    }

    /// Reads the schema of `table` without touching its rows.
    ///
    /// The integer primary key is the feature id and is left out of the
    /// attribute list.
    ///
    /// # Errors
    ///
    /// Returns a read error if the table cannot be introspected and a schema
    /// error if its registered geometry column does not exist.
    pub fn feature_type(&self, gpkg: &GeoPackage, table: &TableDescriptor) -> Result<FeatureType> {
        let schema = gpkg
            .schema_of(&table.name)
            .with_read_context(self.format, gpkg.path())?;
        let declared_crs = gpkg
            .declared_crs(table.srs_id)
            .with_read_context(self.format, gpkg.path())?;

        if let Some(geometry) = &table.geometry {
            if !schema
                .columns
                .iter()
                .any(|c| c.name.eq_ignore_ascii_case(&geometry.name))
            {
                return Err(FormatError::Schema {
                    layer: table.name.clone(),
                    reason: format!("registered geometry column '{}' is missing", geometry.name),
                }
                .into());
            }
        }

        let fid = schema.feature_id_column();
        let attributes = schema
            .columns
            .iter()
            .filter(|column| Some(column.name.as_str()) != fid)
            .map(|column| {
                AttributeDescriptor::new(
                    column.name.clone(),
                    binding_for(column, table),
                    !column.not_null,
                )
            })
            .collect();

        Ok(FeatureType {
            name: table.name.clone(),
            attributes,
            crs: declared_crs,
        })
    }

    /// Returns the declared CRS, or the fallback when none is declared.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::FallbackCrs`] if the fallback cannot be resolved.
    pub fn resolve_crs(&self, declared: Option<&Crs>) -> Result<Crs> {
        if let Some(crs) = declared {
            return Ok(crs.clone());
        }
        self.resolver.resolve(FALLBACK_CRS_CODE).map_err(|source| {
            ConfigError::FallbackCrs {
                code: FALLBACK_CRS_CODE.to_string(),
                source,
            }
            .into()
        })
    }

    /// Builds the feature type and resource for one table.
    ///
    /// Bounds are left as the empty sentinel with recalculation requested;
    /// the layer's rows are never scanned here.
    ///
    /// # Errors
    ///
    /// Returns a read error for unreadable tables and a configuration error
    /// if the fallback CRS cannot be resolved.
    pub fn synthesize(&self, gpkg: &GeoPackage, table: &TableDescriptor) -> Result<SynthesizedLayer> {
        let feature_type = match table.kind {
            ContentKind::Vector => self.feature_type(gpkg, table)?,
            ContentKind::Raster => FeatureType {
                name: table.name.clone(),
                attributes: Vec::new(),
                crs: gpkg
                    .declared_crs(table.srs_id)
                    .with_read_context(self.format, gpkg.path())?,
            },
        };

        if feature_type.crs.is_none() {
            warn!(
                "Layer '{}' declares no usable CRS (srs_id {}), falling back to {FALLBACK_CRS_CODE}",
                table.name, table.srs_id
            );
        }
        let crs = self.resolve_crs(feature_type.crs.as_ref())?;

        let attributes = feature_type
            .attributes
            .iter()
            .map(|a| AttributeTypeInfo {
                name: a.name.clone(),
                binding: a.binding.clone(),
            })
            .collect();

        // Declared id, kept even when it differs from the resolved CRS.
        let srs = format!("EPSG:{}", table.srs_id);

        let resource = ResourceInfo::new(table.name.clone(), table.kind, attributes, crs, srs);
        Ok(SynthesizedLayer {
            feature_type,
            resource,
        })
    }
}

/// Maps a declared column type to a binding.
fn binding_for(column: &ColumnInfo, table: &TableDescriptor) -> Binding {
    if let Some(geometry) = &table.geometry {
        if geometry.name.eq_ignore_ascii_case(&column.name) {
            return Binding::Geometry(geometry.kind);
        }
    }

    let declared = column.declared_type.to_ascii_uppercase();
    // TEXT(32), BLOB(1024)
    let base = declared.split('(').next().unwrap_or_default().trim();

    if let Some(kind) = GeometryKind::from_type_name(base) {
        return Binding::Geometry(kind);
    }

    let data_type = match base {
        "BOOLEAN" => DataType::Boolean,
        "TINYINT" => DataType::Int8,
        "SMALLINT" => DataType::Int16,
        "MEDIUMINT" | "INT" => DataType::Int32,
        "INTEGER" => DataType::Int64,
        "FLOAT" => DataType::Float32,
        "DOUBLE" | "REAL" => DataType::Float64,
        "TEXT" => DataType::Utf8,
        "BLOB" => DataType::Binary,
        "DATE" => DataType::Date32,
        "DATETIME" => DataType::Timestamp(TimeUnit::Millisecond, Some("UTC".into())),
        other => affinity(other),
    };
    Binding::Scalar(data_type)
}

/// SQLite column affinity rules for non-GeoPackage type names.
fn affinity(declared: &str) -> DataType {
    if declared.contains("INT") {
        DataType::Int64
    } else if declared.contains("CHAR") || declared.contains("CLOB") || declared.contains("TEXT") {
        DataType::Utf8
    } else if declared.is_empty() || declared.contains("BLOB") {
        DataType::Binary
    } else {
        DataType::Float64
    }
}
