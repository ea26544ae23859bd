//! Integration tests for listing and reading GeoPackage vector layers.

use std::sync::Arc;

use arrow_schema::DataType;
use geoimport_core_common::error::UnknownAuthorityError;
use geoimport_core_common::{
    Binding, CancellationToken, Catalog, ConfigError, Crs, CrsResolver, EpsgRegistry,
    FeatureReader, FeatureType, FormatError, FormatHandler, GeometryKind, ImportData, ImportError,
    ImportTask, UNKNOWN_FEATURE_COUNT, Value, VectorFormat, Workspace,
};
use geoimport_gpkg::{
    GeoPackage, GeoPackageVectorFormat, GpkgFeatureReader, RowFilter, RowKey, SchemaSynthesizer,
};
use geoimport_test_utils::Fixtures;
use url::Url;

fn list(format: &GeoPackageVectorFormat, data: &ImportData) -> Vec<ImportTask> {
    format
        .list(data, &Catalog::new(), &CancellationToken::new())
        .expect("listing should succeed")
}

/// Resolver that knows nothing, not even the fallback.
struct EmptyResolver;

impl CrsResolver for EmptyResolver {
    fn resolve(&self, authority_code: &str) -> Result<Crs, UnknownAuthorityError> {
        Err(UnknownAuthorityError {
            authority: "EPSG".to_string(),
            code: authority_code.to_string(),
        })
    }
}

#[test]
fn test_can_read_by_extension() {
    let format = GeoPackageVectorFormat::new();

    assert!(format.can_read(&ImportData::file("/data/mixed.gpkg")));
    assert!(format.can_read(&ImportData::file("/data/MIXED.GPKG")));
    assert!(!format.can_read(&ImportData::file("/data/mixed.shp")));
    assert!(!format.can_read(&ImportData::file("/data/gpkg")));
    assert!(!format.can_read(&ImportData::Directory("/data/dir.gpkg".into())));
    assert!(!format.can_read(&ImportData::Remote(
        Url::parse("https://example.com/mixed.gpkg").unwrap()
    )));
}

#[test]
fn test_list_vector_layers() {
    let fixtures = Fixtures::new().unwrap();
    let data = ImportData::file(fixtures.mixed_geopackage().unwrap());
    let format = GeoPackageVectorFormat::new();

    assert!(format.can_read(&data));
    let tasks = list(&format, &data);
    let names: Vec<&str> = tasks.iter().map(|t| t.layer().name()).collect();
    assert_eq!(names, ["vector_a", "vector_b"]);

    for task in &tasks {
        assert!(task.layer().name().starts_with("vector_"));
        assert_eq!(format.feature_count(&data, task), UNKNOWN_FEATURE_COUNT);
    }
}

#[test]
fn test_incorrect_layer_entry() {
    let fixtures = Fixtures::new().unwrap();
    let data = ImportData::file(fixtures.mixed_geopackage().unwrap());
    let format = GeoPackageVectorFormat::new();

    let mut tasks = list(&format, &data);
    assert_eq!(tasks.len(), 2);
    let task = &mut tasks[0];
    task.set_original_layer_name("Invalid layer name");
    assert_eq!(format.feature_count(&data, task), -1);
}

#[test]
fn test_create_store() {
    let fixtures = Fixtures::new().unwrap();
    let data = ImportData::file(fixtures.mixed_geopackage().unwrap());
    let format = GeoPackageVectorFormat::new();

    let workspace = Workspace::new("test workspace");
    assert!(
        format
            .create_store(&data, &workspace, &Catalog::new())
            .is_none()
    );
    assert!(!format.capabilities().store.is_supported());
}

#[test]
fn test_list_vector_only_layers() {
    let fixtures = Fixtures::new().unwrap();
    let data = ImportData::file(fixtures.vector_geopackage().unwrap());

    let tasks = list(&GeoPackageVectorFormat::new(), &data);
    assert_eq!(tasks.len(), 2);
    for task in &tasks {
        assert!(task.layer().name().starts_with("vector_"));
    }
}

#[test]
fn test_list_raster_only_layers() {
    let fixtures = Fixtures::new().unwrap();
    let data = ImportData::file(fixtures.raster_geopackage().unwrap());
    let format = GeoPackageVectorFormat::new();

    assert!(format.can_read(&data));
    assert!(list(&format, &data).is_empty());
}

#[test]
fn test_list_without_geometry_columns_table() {
    let fixtures = Fixtures::new().unwrap();
    let data = ImportData::file(fixtures.bare_raster_geopackage().unwrap());
    let format = GeoPackageVectorFormat::new();

    assert!(format.can_read(&data));
    assert!(list(&format, &data).is_empty());
}

#[test]
fn test_list_feature_views() {
    let fixtures = Fixtures::new().unwrap();
    let data = ImportData::file(fixtures.view_geopackage().unwrap());

    let tasks = list(&GeoPackageVectorFormat::new(), &data);
    let names: Vec<&str> = tasks.iter().map(|t| t.layer().name()).collect();
    assert_eq!(names, ["base", "base_v", "base_anon"]);

    // fid is the feature id of the view, as it is for the table
    for task in &tasks {
        let attributes: Vec<&str> = task
            .resource()
            .attributes()
            .iter()
            .map(|a| a.name.as_str())
            .collect();
        assert_eq!(attributes, ["geom", "name"], "{}", task.layer().name());
    }
}

#[test]
fn test_read_feature_views() {
    let fixtures = Fixtures::new().unwrap();
    let data = ImportData::file(fixtures.view_geopackage().unwrap());
    let format = GeoPackageVectorFormat::new();
    let tasks = list(&format, &data);

    for task in &tasks[1..] {
        let mut reader = format.read(&data, task).unwrap();
        let mut features = Vec::new();
        while let Some(feature) = reader.next_feature().unwrap() {
            features.push(feature);
        }
        let ids: Vec<i64> = features.iter().map(|f| f.id).collect();
        assert_eq!(ids, [1, 2, 3], "{}", task.layer().name());
        assert_eq!(features[0].values[1], Value::Text("name_0".to_string()));
        format.dispose(reader, task).unwrap();
    }
}

#[test]
fn test_attributes_follow_source_order() {
    let fixtures = Fixtures::new().unwrap();
    let data = ImportData::file(fixtures.mixed_geopackage().unwrap());

    let tasks = list(&GeoPackageVectorFormat::new(), &data);
    let resource = tasks[0].resource();
    let attributes: Vec<(&str, &Binding)> = resource
        .attributes()
        .iter()
        .map(|a| (a.name.as_str(), &a.binding))
        .collect();

    // the fid primary key is the feature id, not an attribute
    assert_eq!(
        attributes,
        [
            ("geom", &Binding::Geometry(GeometryKind::Point)),
            ("name", &Binding::Scalar(DataType::Utf8)),
            ("population", &Binding::Scalar(DataType::Int64)),
        ]
    );
    assert_eq!(tasks[0].layer().default_style, "point");
    assert_eq!(tasks[1].layer().default_style, "polygon");
}

#[test]
fn test_declared_crs_is_used() {
    let fixtures = Fixtures::new().unwrap();
    let data = ImportData::file(fixtures.mixed_geopackage().unwrap());

    for task in list(&GeoPackageVectorFormat::new(), &data) {
        let resource = task.resource();
        assert_eq!(resource.native_crs().identifier(), "EPSG:4326");
        assert_eq!(resource.native_crs().name, "WGS 84 geodetic");
        assert!(resource.native_crs().definition.is_some());
        assert_eq!(resource.srs(), "EPSG:4326");
    }
}

#[test]
fn test_undeclared_crs_falls_back_to_wgs84() {
    let fixtures = Fixtures::new().unwrap();
    let data = ImportData::file(fixtures.undeclared_crs_geopackage().unwrap());

    let tasks = list(&GeoPackageVectorFormat::new(), &data);
    assert_eq!(tasks.len(), 1);
    let resource = tasks[0].resource();
    assert_eq!(resource.native_crs().identifier(), "EPSG:4326");
    // the declared identifier is kept as-is
    assert_eq!(resource.srs(), "EPSG:0");

    let feature_type = tasks[0].metadata().get::<FeatureType>().unwrap();
    assert!(feature_type.crs.is_none());
}

#[test]
fn test_srs_string_uses_declared_id() {
    let fixtures = Fixtures::new().unwrap();
    let data = ImportData::file(fixtures.custom_srs_geopackage().unwrap());

    let tasks = list(&GeoPackageVectorFormat::new(), &data);
    let resource = tasks[0].resource();
    assert_eq!(resource.native_crs().identifier(), "EPSG:3857");
    assert_eq!(resource.srs(), "EPSG:100");
}

#[test]
fn test_bounds_are_deferred() {
    let fixtures = Fixtures::new().unwrap();
    let data = ImportData::file(fixtures.mixed_geopackage().unwrap());

    for task in list(&GeoPackageVectorFormat::new(), &data) {
        let resource = task.resource();
        assert!(resource.native_bounding_box().is_empty());
        assert!(resource.lat_lon_bounding_box().is_empty());
        assert!(resource.recalculate_bounds());
    }
}

#[test]
fn test_metadata_carries_feature_type() {
    let fixtures = Fixtures::new().unwrap();
    let data = ImportData::file(fixtures.mixed_geopackage().unwrap());

    let tasks = list(&GeoPackageVectorFormat::new(), &data);
    let feature_type = tasks[1].metadata().get::<FeatureType>().unwrap();
    assert_eq!(feature_type.name, "vector_b");
    assert_eq!(feature_type.attributes.len(), 2);
    assert_eq!(
        feature_type.geometry_descriptor().unwrap().binding,
        Binding::Geometry(GeometryKind::MultiPolygon)
    );
}

#[test]
fn test_list_is_idempotent() {
    let fixtures = Fixtures::new().unwrap();
    let data = ImportData::file(fixtures.mixed_geopackage().unwrap());
    let format = GeoPackageVectorFormat::new();

    let first = list(&format, &data);
    let second = list(&format, &data);
    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(&second) {
        assert_eq!(a.layer(), b.layer());
    }
}

#[test]
fn test_corrupt_file_is_read_error() {
    let fixtures = Fixtures::new().unwrap();
    let data = ImportData::file(fixtures.corrupt_geopackage().unwrap());
    let format = GeoPackageVectorFormat::new();

    assert!(format.can_read(&data));
    let err = format
        .list(&data, &Catalog::new(), &CancellationToken::new())
        .unwrap_err();
    assert!(matches!(err, ImportError::Read { .. }), "{err:?}");
}

#[test]
fn test_missing_file_is_read_error() {
    let fixtures = Fixtures::new().unwrap();
    let data = ImportData::file(fixtures.path("absent.gpkg"));

    let err = GeoPackageVectorFormat::new()
        .list(&data, &Catalog::new(), &CancellationToken::new())
        .unwrap_err();
    assert!(matches!(err, ImportError::Read { .. }), "{err:?}");
}

#[test]
fn test_failing_layer_aborts_listing() {
    let fixtures = Fixtures::new().unwrap();
    let data = ImportData::file(fixtures.dangling_geopackage().unwrap());

    let err = GeoPackageVectorFormat::new()
        .list(&data, &Catalog::new(), &CancellationToken::new())
        .unwrap_err();
    match err {
        ImportError::Layer { layer, source } => {
            assert_eq!(layer, "missing");
            assert!(matches!(*source, ImportError::Read { .. }));
        },
        other => panic!("expected a layer error, got {other:?}"),
    }
}

#[test]
fn test_missing_geometry_column_is_schema_error() {
    let fixtures = Fixtures::new().unwrap();
    let data = ImportData::file(fixtures.misregistered_geometry_geopackage().unwrap());

    let err = GeoPackageVectorFormat::new()
        .list(&data, &Catalog::new(), &CancellationToken::new())
        .unwrap_err();
    match err {
        ImportError::Layer { layer, source } => {
            assert_eq!(layer, "parcels");
            assert!(matches!(
                *source,
                ImportError::Format(FormatError::Schema { .. })
            ));
        },
        other => panic!("expected a layer error, got {other:?}"),
    }
}

#[test]
fn test_unresolvable_fallback_is_configuration_error() {
    let fixtures = Fixtures::new().unwrap();
    let data = ImportData::file(fixtures.undeclared_crs_geopackage().unwrap());
    let format = GeoPackageVectorFormat::with_resolver(Arc::new(EmptyResolver));

    let err = format
        .list(&data, &Catalog::new(), &CancellationToken::new())
        .unwrap_err();
    assert!(
        matches!(err, ImportError::Config(ConfigError::FallbackCrs { .. })),
        "{err:?}"
    );
}

#[test]
fn test_declared_crs_needs_no_resolver() {
    let fixtures = Fixtures::new().unwrap();
    let data = ImportData::file(fixtures.mixed_geopackage().unwrap());
    let format = GeoPackageVectorFormat::with_resolver(Arc::new(EmptyResolver));

    assert_eq!(list(&format, &data).len(), 2);
}

#[test]
fn test_canceled_listing() {
    let fixtures = Fixtures::new().unwrap();
    let data = ImportData::file(fixtures.mixed_geopackage().unwrap());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = GeoPackageVectorFormat::new()
        .list(&data, &Catalog::new(), &cancel)
        .unwrap_err();
    assert!(matches!(err, ImportError::Canceled { .. }), "{err:?}");
}

#[test]
fn test_read_features() {
    let fixtures = Fixtures::new().unwrap();
    let data = ImportData::file(fixtures.mixed_geopackage().unwrap());
    let format = GeoPackageVectorFormat::new();
    let tasks = list(&format, &data);

    let mut reader = format.read(&data, &tasks[0]).unwrap();
    assert_eq!(reader.feature_type().name, "vector_a");

    let mut features = Vec::new();
    while let Some(feature) = reader.next_feature().unwrap() {
        features.push(feature);
    }
    assert_eq!(features.len(), 3);
    assert_eq!(features[0].id, 1);
    assert!(matches!(features[0].values[0], Value::Blob(_)));
    assert_eq!(features[0].values[1], Value::Text("name_0".to_string()));
    assert_eq!(features[2].values[2], Value::Integer(2));
    assert!(reader.next_feature().unwrap().is_none());

    format.dispose(reader, &tasks[0]).unwrap();
}

#[test]
fn test_read_follows_original_layer_name() {
    let fixtures = Fixtures::new().unwrap();
    let data = ImportData::file(fixtures.mixed_geopackage().unwrap());
    let handler: &dyn FormatHandler = &GeoPackageVectorFormat::new();
    let vector = handler.as_vector().expect("vector capability");

    let mut task = list(&GeoPackageVectorFormat::new(), &data).remove(0);
    task.set_original_layer_name("vector_b");

    let mut reader = vector.read(&data, &task).unwrap();
    let mut count = 0;
    while reader.next_feature().unwrap().is_some() {
        count += 1;
    }
    assert_eq!(count, 2);
    reader.close().unwrap();
}

#[test]
fn test_read_unknown_layer() {
    let fixtures = Fixtures::new().unwrap();
    let data = ImportData::file(fixtures.mixed_geopackage().unwrap());
    let format = GeoPackageVectorFormat::new();

    let mut task = list(&format, &data).remove(0);
    task.set_original_layer_name("Invalid layer name");

    let err = format.read(&data, &task).err().expect("read should fail");
    assert!(matches!(
        err,
        ImportError::Format(FormatError::LayerNotFound { .. })
    ));
}

#[test]
fn test_excluding_reader_exposes_schema_only() {
    let fixtures = Fixtures::new().unwrap();
    let path = fixtures.mixed_geopackage().unwrap();
    let registry = EpsgRegistry::new();

    let gpkg = GeoPackage::open_read_only(&path).unwrap();
    let table = gpkg.feature("vector_b").unwrap().expect("vector_b is registered");
    let feature_type = SchemaSynthesizer::new("test", &registry)
        .feature_type(&gpkg, &table)
        .unwrap();

    let mut reader = GpkgFeatureReader::new(
        gpkg,
        "test",
        &table.name,
        &RowKey::Rowid,
        feature_type,
        RowFilter::Exclude,
    );
    assert_eq!(reader.feature_type().attributes.len(), 2);
    assert!(reader.next_feature().unwrap().is_none());
    Box::new(reader).close().unwrap();
}
