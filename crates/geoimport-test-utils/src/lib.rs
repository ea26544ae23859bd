//! Test fixtures for geoimport.
//!
//! Writes small, valid GeoPackages into temporary directories so tests can
//! exercise detection and listing against real SQLite files.
//!
//! # Usage
//!
//! ```rust,ignore
//! use geoimport_test_utils::Fixtures;
//!
//! let fixtures = Fixtures::new()?;
//! let mixed = fixtures.mixed_geopackage()?;   // vector_a, vector_b, raster_a
//! ```

use std::path::{Path, PathBuf};

use anyhow::Result;
use rusqlite::types::Value;
use rusqlite::{Connection, params, params_from_iter};
use tempfile::TempDir;

/// `GPKG` in ASCII.
const GPKG_APPLICATION_ID: i32 = 0x4750_4B47;

const METADATA_DDL: &str = "
CREATE TABLE gpkg_spatial_ref_sys (
    srs_name TEXT NOT NULL,
    srs_id INTEGER NOT NULL PRIMARY KEY,
    organization TEXT NOT NULL,
    organization_coordsys_id INTEGER NOT NULL,
    definition TEXT NOT NULL,
    description TEXT
);
CREATE TABLE gpkg_contents (
    table_name TEXT NOT NULL PRIMARY KEY,
    data_type TEXT NOT NULL,
    identifier TEXT UNIQUE,
    description TEXT DEFAULT '',
    last_change DATETIME NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ','now')),
    min_x DOUBLE, min_y DOUBLE, max_x DOUBLE, max_y DOUBLE,
    srs_id INTEGER
);
CREATE TABLE gpkg_geometry_columns (
    table_name TEXT NOT NULL,
    column_name TEXT NOT NULL,
    geometry_type_name TEXT NOT NULL,
    srs_id INTEGER NOT NULL,
    z TINYINT NOT NULL,
    m TINYINT NOT NULL,
    CONSTRAINT pk_geom_cols PRIMARY KEY (table_name, column_name)
);
CREATE TABLE gpkg_tile_matrix_set (
    table_name TEXT NOT NULL PRIMARY KEY,
    srs_id INTEGER NOT NULL,
    min_x DOUBLE NOT NULL, min_y DOUBLE NOT NULL,
    max_x DOUBLE NOT NULL, max_y DOUBLE NOT NULL
);
INSERT INTO gpkg_spatial_ref_sys VALUES
    ('Undefined cartesian SRS', -1, 'NONE', -1, 'undefined', NULL),
    ('Undefined geographic SRS', 0, 'NONE', 0, 'undefined', NULL),
    ('WGS 84 geodetic', 4326, 'EPSG', 4326,
     'GEOGCS[\"WGS 84\",DATUM[\"WGS_1984\",SPHEROID[\"WGS 84\",6378137,298.257223563]],PRIMEM[\"Greenwich\",0],UNIT[\"degree\",0.0174532925199433]]',
     'longitude/latitude coordinates in decimal degrees on the WGS 84 spheroid');
";

/// Minimal GeoPackage header plus an empty WKB point, enough for a blob column.
const SAMPLE_GEOMETRY: &[u8] = &[
    0x47, 0x50, 0x00, 0x01, 0xE6, 0x10, 0x00, 0x00, 0x01, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0xF8, 0x7F, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xF8, 0x7F,
];

/// Writes a GeoPackage table by table.
pub struct GeoPackageBuilder {
    conn: Connection,
    path: PathBuf,
}

impl GeoPackageBuilder {
    /// Creates a new GeoPackage with the mandatory metadata tables.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "application_id", GPKG_APPLICATION_ID)?;
        conn.execute_batch(METADATA_DDL)?;
        Ok(Self { conn, path })
    }

    /// Registers an additional spatial reference system.
    pub fn spatial_ref_sys(
        self,
        srs_id: i32,
        name: &str,
        organization: &str,
        code: i32,
        definition: &str,
    ) -> Result<Self> {
        self.conn.execute(
            "INSERT INTO gpkg_spatial_ref_sys \
             (srs_name, srs_id, organization, organization_coordsys_id, definition) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![name, srs_id, organization, code, definition],
        )?;
        Ok(self)
    }

    /// Adds a feature table with an `fid` key, a `geom` column and `columns`,
    /// filled with `rows` generated rows.
    pub fn feature_table(
        self,
        name: &str,
        srs_id: i32,
        geometry_type: &str,
        columns: &[(&str, &str)],
        rows: usize,
    ) -> Result<Self> {
        let mut ddl = format!(
            "CREATE TABLE {} (fid INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL, geom {geometry_type}",
            quote(name)
        );
        for (column, declared_type) in columns {
            ddl.push_str(&format!(", {} {declared_type}", quote(column)));
        }
        ddl.push(')');
        self.conn.execute_batch(&ddl)?;

        self.conn.execute(
            "INSERT INTO gpkg_contents (table_name, data_type, identifier, srs_id) \
             VALUES (?1, 'features', ?1, ?2)",
            params![name, srs_id],
        )?;
        self.conn.execute(
            "INSERT INTO gpkg_geometry_columns VALUES (?1, 'geom', ?2, ?3, 0, 0)",
            params![name, geometry_type, srs_id],
        )?;

        let mut names = vec![quote("geom")];
        names.extend(columns.iter().map(|(column, _)| quote(column)));
        let placeholders: Vec<String> = (1..=names.len()).map(|i| format!("?{i}")).collect();
        let insert = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote(name),
            names.join(", "),
            placeholders.join(", ")
        );
        for row in 0..rows {
            let mut values = vec![Value::Blob(SAMPLE_GEOMETRY.to_vec())];
            values.extend(
                columns
                    .iter()
                    .map(|(column, declared_type)| sample_value(column, declared_type, row)),
            );
            self.conn.execute(&insert, params_from_iter(values))?;
        }
        Ok(self)
    }

    /// Adds an empty tile pyramid table.
    pub fn tile_table(self, name: &str, srs_id: i32) -> Result<Self> {
        self.conn.execute_batch(&format!(
            "CREATE TABLE {} (id INTEGER PRIMARY KEY AUTOINCREMENT, zoom_level INTEGER NOT NULL, \
             tile_column INTEGER NOT NULL, tile_row INTEGER NOT NULL, tile_data BLOB NOT NULL, \
             UNIQUE (zoom_level, tile_column, tile_row))",
            quote(name)
        ))?;
        self.conn.execute(
            "INSERT INTO gpkg_contents (table_name, data_type, identifier, srs_id) \
             VALUES (?1, 'tiles', ?1, ?2)",
            params![name, srs_id],
        )?;
        self.conn.execute(
            "INSERT INTO gpkg_tile_matrix_set VALUES (?1, ?2, -180.0, -90.0, 180.0, 90.0)",
            params![name, srs_id],
        )?;
        Ok(self)
    }

    /// Adds a view defined by `select` and registers it as a feature table
    /// whose geometry column is `geom`.
    pub fn feature_view(
        self,
        name: &str,
        select: &str,
        srs_id: i32,
        geometry_type: &str,
    ) -> Result<Self> {
        self.conn
            .execute_batch(&format!("CREATE VIEW {} AS {select}", quote(name)))?;
        self.conn.execute(
            "INSERT INTO gpkg_contents (table_name, data_type, identifier, srs_id) \
             VALUES (?1, 'features', ?1, ?2)",
            params![name, srs_id],
        )?;
        self.conn.execute(
            "INSERT INTO gpkg_geometry_columns VALUES (?1, 'geom', ?2, ?3, 0, 0)",
            params![name, geometry_type, srs_id],
        )?;
        Ok(self)
    }

    /// Registers a feature table in `gpkg_contents` without creating it.
    pub fn dangling_feature_entry(self, name: &str, srs_id: i32) -> Result<Self> {
        self.conn.execute(
            "INSERT INTO gpkg_contents (table_name, data_type, identifier, srs_id) \
             VALUES (?1, 'features', ?1, ?2)",
            params![name, srs_id],
        )?;
        Ok(self)
    }

    /// Runs raw SQL, for fixtures that break the metadata on purpose.
    pub fn execute(self, sql: &str) -> Result<Self> {
        self.conn.execute_batch(sql)?;
        Ok(self)
    }

    /// Closes the database and returns its path.
    pub fn finish(self) -> Result<PathBuf> {
        self.conn.close().map_err(|(_, e)| e)?;
        Ok(self.path)
    }
}

fn quote(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn sample_value(column: &str, declared_type: &str, row: usize) -> Value {
    let declared = declared_type.to_ascii_uppercase();
    let row = i64::try_from(row).unwrap_or(i64::MAX);
    if declared.contains("INT") || declared == "BOOLEAN" {
        Value::Integer(row)
    } else if declared.contains("REAL") || declared.contains("DOUBLE") || declared.contains("FLOAT")
    {
        Value::Real(row as f64 * 1.5)
    } else if declared.starts_with("TEXT") {
        Value::Text(format!("{column}_{row}"))
    } else {
        Value::Null
    }
}

/// Canned fixtures in a temporary directory that lives as long as the value.
pub struct Fixtures {
    dir: TempDir,
}

impl Fixtures {
    pub fn new() -> Result<Self> {
        Ok(Self {
            dir: TempDir::new()?,
        })
    }

    /// The temporary directory.
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Path inside the fixture directory.
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Two vector tables, `vector_a` and `vector_b`, and one tile table `raster_a`.
    pub fn mixed_geopackage(&self) -> Result<PathBuf> {
        GeoPackageBuilder::create(self.path("mixed.gpkg"))?
            .feature_table(
                "vector_a",
                4326,
                "POINT",
                &[("name", "TEXT"), ("population", "INTEGER")],
                3,
            )?
            .tile_table("raster_a", 4326)?
            .feature_table("vector_b", 4326, "MULTIPOLYGON", &[("area", "DOUBLE")], 2)?
            .finish()
    }

    /// Two vector tables only.
    pub fn vector_geopackage(&self) -> Result<PathBuf> {
        GeoPackageBuilder::create(self.path("vector_only.gpkg"))?
            .feature_table("vector_lines", 4326, "LINESTRING", &[("name", "TEXT(32)")], 4)?
            .feature_table("vector_points", 4326, "POINT", &[("elevation", "REAL")], 1)?
            .finish()
    }

    /// One tile table and no vector content.
    pub fn raster_geopackage(&self) -> Result<PathBuf> {
        GeoPackageBuilder::create(self.path("raster_only.gpkg"))?
            .tile_table("raster_tiles", 4326)?
            .finish()
    }

    /// One tile table, with the optional `gpkg_geometry_columns` table left out.
    pub fn bare_raster_geopackage(&self) -> Result<PathBuf> {
        GeoPackageBuilder::create(self.path("bare_raster.gpkg"))?
            .tile_table("raster_tiles", 4326)?
            .execute("DROP TABLE gpkg_geometry_columns")?
            .finish()
    }

    /// Table `base` with three rows, plus two views over it registered as
    /// feature tables: `base_v` keeps the `fid` column, `base_anon` drops it.
    pub fn view_geopackage(&self) -> Result<PathBuf> {
        GeoPackageBuilder::create(self.path("views.gpkg"))?
            .feature_table("base", 4326, "POINT", &[("name", "TEXT")], 3)?
            .feature_view("base_v", "SELECT fid, geom, name FROM base", 4326, "POINT")?
            .feature_view(
                "base_anon",
                "SELECT geom, name FROM base ORDER BY fid",
                4326,
                "POINT",
            )?
            .finish()
    }

    /// A vector table on the undefined geographic SRS (id 0).
    pub fn undeclared_crs_geopackage(&self) -> Result<PathBuf> {
        GeoPackageBuilder::create(self.path("no_crs.gpkg"))?
            .feature_table("sites", 0, "POINT", &[("label", "TEXT")], 2)?
            .finish()
    }

    /// A vector table whose srs id (100) differs from its EPSG code (3857).
    pub fn custom_srs_geopackage(&self) -> Result<PathBuf> {
        GeoPackageBuilder::create(self.path("custom_srs.gpkg"))?
            .spatial_ref_sys(
                100,
                "WGS 84 / Pseudo-Mercator",
                "epsg",
                3857,
                "PROJCS[\"WGS 84 / Pseudo-Mercator\"]",
            )?
            .feature_table("tracks", 100, "LINESTRING", &[("speed", "FLOAT")], 2)?
            .finish()
    }

    /// A valid first table followed by an entry whose table is missing.
    pub fn dangling_geopackage(&self) -> Result<PathBuf> {
        GeoPackageBuilder::create(self.path("dangling.gpkg"))?
            .feature_table("present", 4326, "POINT", &[], 1)?
            .dangling_feature_entry("missing", 4326)?
            .finish()
    }

    /// A vector table whose registered geometry column does not exist.
    pub fn misregistered_geometry_geopackage(&self) -> Result<PathBuf> {
        GeoPackageBuilder::create(self.path("misregistered.gpkg"))?
            .feature_table("parcels", 4326, "POLYGON", &[("owner", "TEXT")], 1)?
            .execute(
                "UPDATE gpkg_geometry_columns SET column_name = 'shape' \
                 WHERE table_name = 'parcels'",
            )?
            .finish()
    }

    /// A file with the right extension and garbage content.
    pub fn corrupt_geopackage(&self) -> Result<PathBuf> {
        let path = self.path("corrupt.gpkg");
        std::fs::write(&path, b"definitely not sqlite ".repeat(32))?;
        Ok(path)
    }

    /// An empty file with the given name, for extension based detection.
    pub fn touch(&self, name: &str) -> Result<PathBuf> {
        let path = self.path(name);
        std::fs::write(&path, b"")?;
        Ok(path)
    }
}
