//! Destination catalog descriptors.
//!
//! These are the in-memory records an import task carries before anything is
//! persisted: the resource (one importable layer), the layer published on top
//! of it, and the store a direct import would create.

use std::collections::BTreeMap;

use crate::crs::Crs;
use crate::feature::{Binding, GeometryKind};
use crate::format::ContentKind;

/// A bounding box, or the explicit "not computed yet" sentinel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bounds {
    /// Bounds are unknown and must be computed downstream.
    Empty,
    /// A computed extent.
    Extent {
        min_x: f64,
        min_y: f64,
        max_x: f64,
        max_y: f64,
    },
}

impl Bounds {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// Attribute entry of a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeTypeInfo {
    pub name: String,
    pub binding: Binding,
}

/// One importable layer found inside a candidate.
///
/// Built once per discovered layer with sentinel bounds and the
/// recalculation flag raised. The only later change allowed is
/// [`ResourceInfo::apply_bounds`], which succeeds exactly once.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceInfo {
    name: String,
    native_name: String,
    kind: ContentKind,
    attributes: Vec<AttributeTypeInfo>,
    native_crs: Crs,
    srs: String,
    native_bounding_box: Bounds,
    lat_lon_bounding_box: Bounds,
    recalculate_bounds: bool,
}

impl ResourceInfo {
    /// Creates a resource whose bounds are still to be computed.
    #[must_use]
    pub fn new(
        native_name: impl Into<String>,
        kind: ContentKind,
        attributes: Vec<AttributeTypeInfo>,
        native_crs: Crs,
        srs: impl Into<String>,
    ) -> Self {
        let native_name = native_name.into();
        Self {
            name: native_name.clone(),
            native_name,
            kind,
            attributes,
            native_crs,
            srs: srs.into(),
            native_bounding_box: Bounds::Empty,
            lat_lon_bounding_box: Bounds::Empty,
            recalculate_bounds: true,
        }
    }

    /// Returns the resource with a different display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Assigned (display) name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name as found in the source.
    #[must_use]
    pub fn native_name(&self) -> &str {
        &self.native_name
    }

    #[must_use]
    pub fn kind(&self) -> ContentKind {
        self.kind
    }

    /// Attributes in source order.
    #[must_use]
    pub fn attributes(&self) -> &[AttributeTypeInfo] {
        &self.attributes
    }

    /// Resolved CRS, never absent.
    #[must_use]
    pub fn native_crs(&self) -> &Crs {
        &self.native_crs
    }

    /// Spatial reference identifier as declared by the source, e.g. `EPSG:4326`.
    #[must_use]
    pub fn srs(&self) -> &str {
        &self.srs
    }

    #[must_use]
    pub fn native_bounding_box(&self) -> Bounds {
        self.native_bounding_box
    }

    #[must_use]
    pub fn lat_lon_bounding_box(&self) -> Bounds {
        self.lat_lon_bounding_box
    }

    /// Whether bounds still have to be computed downstream.
    #[must_use]
    pub fn recalculate_bounds(&self) -> bool {
        self.recalculate_bounds
    }

    /// Stores bounds computed downstream and clears the recalculation flag.
    ///
    /// Returns `false` and leaves the resource untouched if bounds were
    /// already applied.
    pub fn apply_bounds(&mut self, native: Bounds, lat_lon: Bounds) -> bool {
        if !self.recalculate_bounds {
            return false;
        }
        self.native_bounding_box = native;
        self.lat_lon_bounding_box = lat_lon;
        self.recalculate_bounds = false;
        true
    }

    /// Geometry kind of the first geometry attribute.
    #[must_use]
    pub fn geometry_kind(&self) -> Option<GeometryKind> {
        self.attributes.iter().find_map(|a| match a.binding {
            Binding::Geometry(kind) => Some(kind),
            Binding::Scalar(_) => None,
        })
    }
}

/// A layer publishing a resource.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerInfo {
    pub resource: ResourceInfo,
    pub default_style: String,
    pub enabled: bool,
}

impl LayerInfo {
    /// Layer name, which follows the resource name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.resource.name()
    }
}

/// Destination workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    pub name: String,
}

impl Workspace {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A connected store created by a direct import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Store {
    pub name: String,
    pub workspace: String,
    pub format: String,
    pub connection_parameters: BTreeMap<String, String>,
}

/// Destination catalog, used here only to build descriptors.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    default_workspace: Option<Workspace>,
}

impl Catalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_default_workspace(workspace: Workspace) -> Self {
        Self {
            default_workspace: Some(workspace),
        }
    }

    #[must_use]
    pub fn default_workspace(&self) -> Option<&Workspace> {
        self.default_workspace.as_ref()
    }

    /// Builds the layer descriptor for a resource. Nothing is persisted.
    #[must_use]
    pub fn build_layer(&self, resource: ResourceInfo) -> LayerInfo {
        let default_style = default_style_for(&resource).to_string();
        LayerInfo {
            resource,
            default_style,
            enabled: true,
        }
    }
}

fn default_style_for(resource: &ResourceInfo) -> &'static str {
    if resource.kind() == ContentKind::Raster {
        return "raster";
    }
    match resource.geometry_kind() {
        Some(GeometryKind::Point | GeometryKind::MultiPoint) => "point",
        Some(GeometryKind::LineString | GeometryKind::MultiLineString) => "line",
        Some(GeometryKind::Polygon | GeometryKind::MultiPolygon) => "polygon",
        _ => "generic",
    }
}
