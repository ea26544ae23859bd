//! Feature types and the row reading path.
//!
//! A [`FeatureType`] is the schema synthesized for one layer at listing time.
//! [`FeatureReader`] is the scoped row reader used later, during the actual
//! data transfer.

use std::fmt;

use arrow_schema::DataType;

use crate::crs::Crs;
use crate::error::Result;

/// Geometry kinds found in vector layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryKind {
    Geometry,
    Point,
    LineString,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
    GeometryCollection,
}

impl GeometryKind {
    /// Parses a geometry type name such as `MULTIPOLYGON` (case-insensitive).
    #[must_use]
    pub fn from_type_name(name: &str) -> Option<Self> {
        let kind = match name.trim().to_ascii_uppercase().as_str() {
            "GEOMETRY" => Self::Geometry,
            "POINT" => Self::Point,
            "LINESTRING" | "CURVE" | "COMPOUNDCURVE" | "CIRCULARSTRING" => Self::LineString,
            "POLYGON" | "SURFACE" | "CURVEPOLYGON" => Self::Polygon,
            "MULTIPOINT" => Self::MultiPoint,
            "MULTILINESTRING" | "MULTICURVE" => Self::MultiLineString,
            "MULTIPOLYGON" | "MULTISURFACE" => Self::MultiPolygon,
            "GEOMETRYCOLLECTION" => Self::GeometryCollection,
            _ => return None,
        };
        Some(kind)
    }

    /// Returns the upper-case type name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Geometry => "GEOMETRY",
            Self::Point => "POINT",
            Self::LineString => "LINESTRING",
            Self::Polygon => "POLYGON",
            Self::MultiPoint => "MULTIPOINT",
            Self::MultiLineString => "MULTILINESTRING",
            Self::MultiPolygon => "MULTIPOLYGON",
            Self::GeometryCollection => "GEOMETRYCOLLECTION",
        }
    }
}

/// Value type an attribute is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    /// A scalar column.
    Scalar(DataType),
    /// A geometry column.
    Geometry(GeometryKind),
}

impl Binding {
    #[must_use]
    pub fn is_geometry(&self) -> bool {
        matches!(self, Self::Geometry(_))
    }
}

/// One attribute of a feature type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDescriptor {
    /// Local name of the attribute.
    pub name: String,
    /// Value type binding.
    pub binding: Binding,
    /// Whether the attribute accepts nulls.
    pub nullable: bool,
}

impl AttributeDescriptor {
    #[must_use]
    pub fn new(name: impl Into<String>, binding: Binding, nullable: bool) -> Self {
        Self {
            name: name.into(),
            binding,
            nullable,
        }
    }
}

/// Schema synthesized for one layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureType {
    /// Type name, equal to the layer name it was built for.
    pub name: String,
    /// Attributes in source order.
    pub attributes: Vec<AttributeDescriptor>,
    /// CRS declared by the source, before any fallback.
    pub crs: Option<Crs>,
}

impl FeatureType {
    /// Returns the first geometry attribute, if any.
    #[must_use]
    pub fn geometry_descriptor(&self) -> Option<&AttributeDescriptor> {
        self.attributes.iter().find(|a| a.binding.is_geometry())
    }

    /// Returns a copy renamed to `name`.
    #[must_use]
    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl fmt::Display for FeatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let attributes: Vec<String> = self
            .attributes
            .iter()
            .map(|a| match &a.binding {
                Binding::Scalar(dt) => format!("{}:{dt}", a.name),
                Binding::Geometry(kind) => format!("{}:{}", a.name, kind.as_str()),
            })
            .collect();
        write!(f, "FeatureType {}[{}]", self.name, attributes.join(", "))?;
        if let Some(crs) = &self.crs {
            write!(f, " {}", crs.identifier())?;
        }
        Ok(())
    }
}

/// A single attribute value read from a row.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

/// A row read from a layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// Feature id (the source row id).
    pub id: i64,
    /// Attribute values, in feature type order.
    pub values: Vec<Value>,
}

/// Scoped row reader over one layer.
///
/// Dropping the reader releases the underlying handle. [`FeatureReader::close`]
/// does the same but reports close failures.
pub trait FeatureReader: Send {
    /// Schema of the features returned.
    fn feature_type(&self) -> &FeatureType;

    /// Returns the next feature, or `None` once the layer is exhausted.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying container cannot be read.
    fn next_feature(&mut self) -> Result<Option<Feature>>;

    /// Closes the reader.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying handle fails to close cleanly.
    fn close(self: Box<Self>) -> Result<()>;
}
