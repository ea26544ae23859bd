//! Display helpers for attribute bindings and layer descriptors.

use arrow_schema::DataType;
use geoimport_core_common::{AttributeTypeInfo, Binding};

/// Extension trait giving [`Binding`] a short, human-readable label.
///
/// # Examples
///
/// ```
/// use arrow_schema::DataType;
/// use geoimport_core::utils::BindingExt;
/// use geoimport_core_common::{Binding, GeometryKind};
///
/// assert_eq!(Binding::Scalar(DataType::Utf8).label(), "String");
/// assert_eq!(Binding::Geometry(GeometryKind::Point).label(), "Geometry(POINT)");
/// ```
pub trait BindingExt {
    fn label(&self) -> String;
}

impl BindingExt for Binding {
    fn label(&self) -> String {
        match self {
            Binding::Scalar(data_type) => scalar_label(data_type),
            Binding::Geometry(kind) => format!("Geometry({})", kind.as_str()),
        }
    }
}

fn scalar_label(data_type: &DataType) -> String {
    match data_type {
        DataType::Boolean => "Boolean".to_string(),
        DataType::Int8 => "Int8".to_string(),
        DataType::Int16 => "Int16".to_string(),
        DataType::Int32 => "Int32".to_string(),
        DataType::Int64 => "Int64".to_string(),
        DataType::Float32 => "Float32".to_string(),
        DataType::Float64 => "Float64".to_string(),
        DataType::Utf8 => "String".to_string(),
        DataType::Binary => "Binary".to_string(),
        DataType::Date32 => "Date".to_string(),
        DataType::Timestamp(unit, tz) => {
            let tz_str = tz.as_ref().map_or("", |t| t.as_ref());
            format!("Timestamp({unit:?}, {tz_str})")
        },
        _ => format!("{data_type:?}"),
    }
}

/// Renders attributes as `name:Label` pairs joined by commas.
#[must_use]
pub fn describe_attributes(attributes: &[AttributeTypeInfo]) -> String {
    attributes
        .iter()
        .map(|a| format!("{}:{}", a.name, a.binding.label()))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow_schema::TimeUnit;
    use geoimport_core_common::GeometryKind;

    #[test]
    fn test_scalar_labels() {
        assert_eq!(Binding::Scalar(DataType::Int64).label(), "Int64");
        assert_eq!(Binding::Scalar(DataType::Float64).label(), "Float64");
        assert_eq!(Binding::Scalar(DataType::Date32).label(), "Date");
        assert_eq!(Binding::Scalar(DataType::Binary).label(), "Binary");
    }

    #[test]
    fn test_timestamp_label() {
        let binding = Binding::Scalar(DataType::Timestamp(
            TimeUnit::Millisecond,
            Some("UTC".into()),
        ));
        assert_eq!(binding.label(), "Timestamp(Millisecond, UTC)");
    }

    #[test]
    fn test_geometry_label() {
        assert_eq!(
            Binding::Geometry(GeometryKind::MultiPolygon).label(),
            "Geometry(MULTIPOLYGON)"
        );
    }

    #[test]
    fn test_describe_attributes() {
        let attributes = vec![
            AttributeTypeInfo {
                name: "geom".into(),
                binding: Binding::Geometry(GeometryKind::Point),
            },
            AttributeTypeInfo {
                name: "name".into(),
                binding: Binding::Scalar(DataType::Utf8),
            },
        ];
        assert_eq!(
            describe_attributes(&attributes),
            "geom:Geometry(POINT), name:String"
        );
        assert_eq!(describe_attributes(&[]), "");
    }
}
