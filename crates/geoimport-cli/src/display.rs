//! Display utilities for formatting CLI output.
//!
//! Table rows for handlers and listed layers, plus the functions printing them.

use tabled::{Table, Tabled};

use geoimport_core::utils::describe_attributes;
use geoimport_core_common::{FormatHandler, ImportTask};

/// Table row representation for displaying format information.
#[derive(Tabled)]
pub struct FormatRow {
    #[tabled(rename = "Name")]
    pub name: String,
    /// Vector or raster.
    #[tabled(rename = "Kind")]
    pub kind: String,
    #[tabled(rename = "List")]
    pub list: String,
    #[tabled(rename = "Read")]
    pub read: String,
    /// Support status for direct store creation.
    #[tabled(rename = "Store")]
    pub store: String,
}

impl FormatRow {
    pub fn from_handler(handler: &dyn FormatHandler) -> Self {
        let capabilities = handler.capabilities();
        Self {
            name: handler.name().to_string(),
            kind: handler.kind().as_str().to_string(),
            list: capabilities.list.as_str().to_string(),
            read: capabilities.read.as_str().to_string(),
            store: capabilities.store.as_str().to_string(),
        }
    }
}

/// Table row representation for displaying one listed layer.
#[derive(Debug, Tabled)]
pub struct LayerRow {
    #[tabled(rename = "Layer")]
    pub layer: String,
    /// Name of the layer inside its container.
    #[tabled(rename = "Native Name")]
    pub native_name: String,
    #[tabled(rename = "Format")]
    pub format: String,
    /// Declared SRS string, which may differ from the resolved CRS.
    #[tabled(rename = "SRS")]
    pub srs: String,
    #[tabled(rename = "CRS")]
    pub crs: String,
    #[tabled(rename = "Attributes")]
    pub attributes: String,
    /// Feature count, `-1` when unknown.
    #[tabled(rename = "Count")]
    pub count: i64,
}

impl LayerRow {
    pub fn new(format: &str, task: &ImportTask, count: i64) -> Self {
        let resource = task.resource();
        let attributes = describe_attributes(resource.attributes());
        Self {
            layer: task.layer().name().to_string(),
            native_name: resource.native_name().to_string(),
            format: format.to_string(),
            srs: resource.srs().to_string(),
            crs: resource.native_crs().identifier(),
            attributes: if attributes.is_empty() {
                "N/A".to_string()
            } else {
                attributes
            },
            count,
        }
    }
}

/// Prints the format table to standard output.
pub fn display_formats(rows: Vec<FormatRow>) {
    println!("\nRegistered Formats ({} total):\n", rows.len());
    println!("{}", Table::new(rows));
}

/// Prints the layers found in `input` to standard output.
pub fn display_layers(input: &str, rows: Vec<LayerRow>) {
    println!("\nDataset: {input}");
    if rows.is_empty() {
        println!("No importable layers found.");
        return;
    }
    println!("\n=== Layers ({}) ===", rows.len());
    println!("{}", Table::new(rows));
}
