//! Read-only access to GeoPackage containers.
//!
//! A GeoPackage is a SQLite database whose `gpkg_contents` table lists the
//! user tables it holds. [`GeoPackage`] enumerates those tables, introspects
//! their columns and looks up declared spatial reference systems. It never
//! scans user data; rows are only read through
//! [`GpkgFeatureReader`](crate::reader::GpkgFeatureReader).

use std::path::{Path, PathBuf};

use geoimport_core_common::{ContentKind, Crs, GeometryKind};
use rusqlite::{Connection, OpenFlags, OptionalExtension, params};
use thiserror::Error;

/// SRS id GeoPackage reserves for undefined geographic coordinates.
pub const UNDEFINED_GEOGRAPHIC_SRS_ID: i32 = 0;
/// SRS id GeoPackage reserves for undefined cartesian coordinates.
pub const UNDEFINED_CARTESIAN_SRS_ID: i32 = -1;

/// Conventional name of the feature id column.
const FEATURE_ID_COLUMN: &str = "fid";

/// Errors raised by the container reader.
#[derive(Debug, Error)]
pub enum GpkgError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    /// The file is a SQLite database without GeoPackage metadata tables.
    #[error("'{path}' is not a GeoPackage (no gpkg_contents table)")]
    NotAGeoPackage { path: PathBuf },

    /// `gpkg_contents` references a table that does not exist.
    #[error("table '{table}' is registered in gpkg_contents but does not exist")]
    MissingTable { table: String },
}

/// Geometry column registered for a feature table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeometryColumn {
    pub name: String,
    pub kind: GeometryKind,
}

/// A user table registered in `gpkg_contents`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescriptor {
    /// Table name.
    pub name: String,
    /// Optional human readable identifier.
    pub identifier: Option<String>,
    /// Declared spatial reference system id.
    pub srs_id: i32,
    /// Whether the table holds features or tiles/coverage.
    pub kind: ContentKind,
    /// Geometry column, for feature tables that register one.
    pub geometry: Option<GeometryColumn>,
}

/// A column as reported by `PRAGMA table_info`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub declared_type: String,
    pub not_null: bool,
    /// 1-based position within the primary key, 0 if not part of it.
    pub primary_key: i32,
}

/// Columns of a table or view, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub columns: Vec<ColumnInfo>,
    /// Set when the registered name is a SQLite view.
    pub view: bool,
}

/// How a reader addresses rows when paging through a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowKey {
    /// The SQLite rowid, aliased by the integer primary key when there is one.
    Rowid,
    /// An integer `fid` column of a view.
    Column(String),
    /// Position in scan order, for views without an `fid` column.
    Ordinal,
}

impl TableSchema {
    /// Returns the column serving as feature id, if there is one.
    ///
    /// For tables this is the integer primary key, which aliases the rowid.
    /// Views report no primary key, so an integer column named `fid` is used.
    #[must_use]
    pub fn feature_id_column(&self) -> Option<&str> {
        if self.view {
            return self
                .columns
                .iter()
                .find(|c| {
                    c.name.eq_ignore_ascii_case(FEATURE_ID_COLUMN)
                        && c.declared_type.eq_ignore_ascii_case("INTEGER")
                })
                .map(|c| c.name.as_str());
        }

        let mut keys = self.columns.iter().filter(|c| c.primary_key > 0);
        match (keys.next(), keys.next()) {
            (Some(key), None) if key.declared_type.eq_ignore_ascii_case("INTEGER") => {
                Some(key.name.as_str())
            },
            _ => None,
        }
    }

    /// Row addressing for readers over this table.
    #[must_use]
    pub fn row_key(&self) -> RowKey {
        if !self.view {
            return RowKey::Rowid;
        }
        match self.feature_id_column() {
            Some(name) => RowKey::Column(name.to_string()),
            None => RowKey::Ordinal,
        }
    }
}

/// An open, read-only GeoPackage.
#[derive(Debug)]
pub struct GeoPackage {
    conn: Connection,
    path: PathBuf,
    /// `gpkg_geometry_columns` is optional in files without features.
    has_geometry_columns: bool,
}

impl GeoPackage {
    /// Opens an existing GeoPackage without write access.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened, is not a SQLite
    /// database, or lacks the GeoPackage metadata tables.
    pub fn open_read_only(path: impl AsRef<Path>) -> Result<Self, GpkgError> {
        let path = path.as_ref();
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        // SQLite opens lazily; this first query is what detects garbage files.
        if !has_table(&conn, "gpkg_contents")? {
            return Err(GpkgError::NotAGeoPackage {
                path: path.to_path_buf(),
            });
        }
        let has_geometry_columns = has_table(&conn, "gpkg_geometry_columns")?;

        Ok(Self {
            conn,
            path: path.to_path_buf(),
            has_geometry_columns,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Feature tables, in `gpkg_contents` order.
    ///
    /// # Errors
    ///
    /// Returns an error if the metadata tables cannot be queried.
    pub fn features(&self) -> Result<Vec<TableDescriptor>, GpkgError> {
        let sql = if self.has_geometry_columns {
            "SELECT c.table_name, c.identifier, COALESCE(g.srs_id, c.srs_id, 0), \
                    g.column_name, g.geometry_type_name \
             FROM gpkg_contents c \
             LEFT JOIN gpkg_geometry_columns g ON g.table_name = c.table_name \
             WHERE c.data_type = 'features' \
             ORDER BY c.rowid"
        } else {
            "SELECT table_name, identifier, COALESCE(srs_id, 0), NULL, NULL \
             FROM gpkg_contents \
             WHERE data_type = 'features' \
             ORDER BY rowid"
        };
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map([], |row| {
            let column: Option<String> = row.get(3)?;
            let type_name: Option<String> = row.get(4)?;
            Ok(TableDescriptor {
                name: row.get(0)?,
                identifier: row.get(1)?,
                srs_id: row.get(2)?,
                kind: ContentKind::Vector,
                geometry: column.map(|name| GeometryColumn {
                    name,
                    kind: type_name
                        .as_deref()
                        .and_then(GeometryKind::from_type_name)
                        .unwrap_or(GeometryKind::Geometry),
                }),
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Tile and gridded coverage tables, in `gpkg_contents` order.
    ///
    /// # Errors
    ///
    /// Returns an error if the metadata tables cannot be queried.
    pub fn tiles(&self) -> Result<Vec<TableDescriptor>, GpkgError> {
        let mut stmt = self.conn.prepare(
            "SELECT table_name, identifier, COALESCE(srs_id, 0) \
             FROM gpkg_contents \
             WHERE data_type IN ('tiles', '2d-gridded-coverage') \
             ORDER BY rowid",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(TableDescriptor {
                name: row.get(0)?,
                identifier: row.get(1)?,
                srs_id: row.get(2)?,
                kind: ContentKind::Raster,
                geometry: None,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Looks up a feature table by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the metadata tables cannot be queried.
    pub fn feature(&self, name: &str) -> Result<Option<TableDescriptor>, GpkgError> {
        Ok(self.features()?.into_iter().find(|t| t.name == name))
    }

    /// Columns of a table or view, in declaration order.
    ///
    /// # Errors
    ///
    /// Returns [`GpkgError::MissingTable`] if the table does not exist.
    pub fn schema_of(&self, table: &str) -> Result<TableSchema, GpkgError> {
        let object_type: Option<String> = self
            .conn
            .query_row(
                "SELECT type FROM sqlite_master WHERE name = ?1",
                params![table],
                |row| row.get(0),
            )
            .optional()?;

        let mut stmt = self
            .conn
            .prepare(&format!("PRAGMA table_info({})", quote_identifier(table)))?;
        let columns = stmt
            .query_map([], |row| {
                Ok(ColumnInfo {
                    name: row.get(1)?,
                    declared_type: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                    not_null: row.get(3)?,
                    primary_key: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        if columns.is_empty() {
            return Err(GpkgError::MissingTable {
                table: table.to_string(),
            });
        }
        Ok(TableSchema {
            columns,
            view: object_type.as_deref() == Some("view"),
        })
    }

    /// CRS declared for an srs id, or `None` when it is undefined.
    ///
    /// The reserved ids 0 and -1, unknown ids and entries whose definition is
    /// `undefined` all count as "no CRS declared".
    ///
    /// # Errors
    ///
    /// Returns an error if `gpkg_spatial_ref_sys` cannot be queried.
    pub fn declared_crs(&self, srs_id: i32) -> Result<Option<Crs>, GpkgError> {
        if srs_id == UNDEFINED_GEOGRAPHIC_SRS_ID || srs_id == UNDEFINED_CARTESIAN_SRS_ID {
            return Ok(None);
        }

        let row = self
            .conn
            .query_row(
                "SELECT srs_name, organization, organization_coordsys_id, definition \
                 FROM gpkg_spatial_ref_sys WHERE srs_id = ?1",
                params![srs_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i32>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        Ok(row.and_then(|(name, organization, code, definition)| {
            let organization = organization.trim();
            if organization.is_empty() || definition.trim().eq_ignore_ascii_case("undefined") {
                return None;
            }
            Some(Crs::new(
                organization.to_ascii_uppercase(),
                code,
                name,
                Some(definition),
            ))
        }))
    }

    /// Closes the connection.
    ///
    /// # Errors
    ///
    /// Returns an error if SQLite fails to close the handle cleanly.
    pub fn close(self) -> Result<(), GpkgError> {
        self.conn.close().map_err(|(_, e)| GpkgError::Sqlite(e))
    }

    pub(crate) fn into_parts(self) -> (Connection, PathBuf) {
        (self.conn, self.path)
    }
}

fn has_table(conn: &Connection, name: &str) -> Result<bool, GpkgError> {
    Ok(conn.query_row(
        "SELECT count(*) > 0 FROM sqlite_master \
         WHERE type IN ('table', 'view') AND name = ?1",
        params![name],
        |row| row.get(0),
    )?)
}

/// Quotes a SQLite identifier.
#[must_use]
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoting() {
        assert_eq!(quote_identifier("roads"), "\"roads\"");
        assert_eq!(quote_identifier("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn feature_id_column_requires_single_integer_key() {
        let column = |name: &str, declared_type: &str, primary_key| ColumnInfo {
            name: name.to_string(),
            declared_type: declared_type.to_string(),
            not_null: false,
            primary_key,
        };

        let schema = TableSchema {
            columns: vec![column("fid", "INTEGER", 1), column("name", "TEXT", 0)],
            view: false,
        };
        assert_eq!(schema.feature_id_column(), Some("fid"));
        assert_eq!(schema.row_key(), RowKey::Rowid);

        let text_key = TableSchema {
            columns: vec![column("code", "TEXT", 1)],
            view: false,
        };
        assert_eq!(text_key.feature_id_column(), None);

        let composite = TableSchema {
            columns: vec![column("a", "INTEGER", 1), column("b", "INTEGER", 2)],
            view: false,
        };
        assert_eq!(composite.feature_id_column(), None);
    }

    #[test]
    fn views_use_their_fid_column() {
        let column = |name: &str, declared_type: &str| ColumnInfo {
            name: name.to_string(),
            declared_type: declared_type.to_string(),
            not_null: false,
            primary_key: 0,
        };

        let with_fid = TableSchema {
            columns: vec![column("FID", "INTEGER"), column("geom", "POINT")],
            view: true,
        };
        assert_eq!(with_fid.feature_id_column(), Some("FID"));
        assert_eq!(with_fid.row_key(), RowKey::Column("FID".to_string()));

        let without_fid = TableSchema {
            columns: vec![column("id", "INTEGER"), column("geom", "POINT")],
            view: true,
        };
        assert_eq!(without_fid.feature_id_column(), None);
        assert_eq!(without_fid.row_key(), RowKey::Ordinal);
    }

    #[test]
    fn garbage_file_fails_to_open() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("broken.gpkg");
        std::fs::write(&path, b"not a sqlite database ".repeat(32)).unwrap();

        assert!(GeoPackage::open_read_only(&path).is_err());
    }

    #[test]
    fn plain_sqlite_is_not_a_geopackage() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("plain.gpkg");
        Connection::open(&path)
            .unwrap()
            .execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY);")
            .unwrap();

        let err = GeoPackage::open_read_only(&path).unwrap_err();
        assert!(matches!(err, GpkgError::NotAGeoPackage { .. }));
    }
}
