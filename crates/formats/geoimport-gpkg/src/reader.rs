//! Row reader over one GeoPackage feature table.

use std::collections::VecDeque;
use std::path::PathBuf;

use geoimport_core_common::{
    Feature, FeatureReader, FeatureType, ReadContextExt, Result, Value,
};
use log::debug;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, params};

use crate::container::{GeoPackage, GpkgError, RowKey, quote_identifier};

const PAGE_SIZE: i64 = 512;

/// Which rows a reader returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowFilter {
    /// Every row.
    Include,
    /// No rows; the reader only exposes the schema.
    Exclude,
}

/// Streams features in key order, one page at a time.
///
/// Tables page by rowid and views by their `fid` column. Views without one
/// page by position and number their features from 1.
///
/// Owns the connection: dropping the reader closes the container.
#[derive(Debug)]
pub struct GpkgFeatureReader {
    conn: Connection,
    path: PathBuf,
    format: String,
    table: String,
    feature_type: FeatureType,
    select: String,
    ordinal: bool,
    last_id: i64,
    page: VecDeque<Feature>,
    exhausted: bool,
}

impl GpkgFeatureReader {
    /// Builds a reader over `table`, taking ownership of the container.
    #[must_use]
    pub fn new(
        gpkg: GeoPackage,
        format: &str,
        table: &str,
        key: &RowKey,
        feature_type: FeatureType,
        filter: RowFilter,
    ) -> Self {
        let (conn, path) = gpkg.into_parts();
        let key_column = match key {
            RowKey::Rowid => "rowid".to_string(),
            RowKey::Column(name) => quote_identifier(name),
            RowKey::Ordinal => "NULL".to_string(),
        };
        let mut columns = vec![key_column.clone()];
        columns.extend(
            feature_type
                .attributes
                .iter()
                .map(|a| quote_identifier(&a.name)),
        );
        let select = match key {
            RowKey::Ordinal => format!(
                "SELECT {} FROM {} LIMIT ?2 OFFSET ?1",
                columns.join(", "),
                quote_identifier(table)
            ),
            _ => format!(
                "SELECT {} FROM {} WHERE {key_column} > ?1 ORDER BY {key_column} LIMIT ?2",
                columns.join(", "),
                quote_identifier(table)
            ),
        };
        let ordinal = *key == RowKey::Ordinal;

        Self {
            conn,
            path,
            format: format.to_string(),
            table: table.to_string(),
            feature_type,
            select,
            ordinal,
            // ordinal ids double as the offset of the next page
            last_id: if ordinal { 0 } else { i64::MIN },
            page: VecDeque::new(),
            exhausted: filter == RowFilter::Exclude,
        }
    }

    fn fetch_page(&mut self) -> std::result::Result<(), GpkgError> {
        let width = self.feature_type.attributes.len();
        let ordinal = self.ordinal;
        let mut position = self.last_id;
        let mut stmt = self.conn.prepare_cached(&self.select)?;
        let rows = stmt.query_map(params![self.last_id, PAGE_SIZE], |row| {
            let id: i64 = if ordinal {
                position += 1;
                position
            } else {
                row.get(0)?
            };
            let mut values = Vec::with_capacity(width);
            for index in 1..=width {
                values.push(to_value(row.get_ref(index)?));
            }
            Ok(Feature { id, values })
        })?;
        for feature in rows {
            self.page.push_back(feature?);
        }

        match self.page.back() {
            Some(last) => self.last_id = last.id,
            None => self.exhausted = true,
        }
        if (self.page.len() as i64) < PAGE_SIZE {
            self.exhausted = true;
        }
        Ok(())
    }
}

impl FeatureReader for GpkgFeatureReader {
    fn feature_type(&self) -> &FeatureType {
        &self.feature_type
    }

    fn next_feature(&mut self) -> Result<Option<Feature>> {
        if self.page.is_empty() && !self.exhausted {
            let (format, path) = (self.format.clone(), self.path.clone());
            self.fetch_page().with_read_context(&format, path)?;
        }
        Ok(self.page.pop_front())
    }

    fn close(self: Box<Self>) -> Result<()> {
        debug!("Closing reader on {} ({})", self.table, self.path.display());
        let Self {
            conn, path, format, ..
        } = *self;
        conn.close()
            .map_err(|(_, e)| GpkgError::Sqlite(e))
            .with_read_context(&format, path)
    }
}

fn to_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(r) => Value::Real(r),
        ValueRef::Text(bytes) => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::Blob(bytes.to_vec()),
    }
}
