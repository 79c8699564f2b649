//! End-to-end nested validation over every inline form

use linkml_pandera::frame;
use linkml_pandera::prelude::*;
use linkml_pandera::validator::{
    CollectionStructTransformer, ListStructTransformer, NestedDispatcher, ShapeTransformer,
    SimpleDictTransformer,
};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

const INLINE_FORMS: &str = include_str!("fixtures/inline_forms.yaml");

type ValidationResult = std::result::Result<(), FrameValidationError>;

fn registry() -> ModelRegistry {
    let schema = YamlParser::new()
        .parse_str(INLINE_FORMS)
        .expect("fixture schema should parse");
    let document = PanderaGenerator::new()
        .render(&schema)
        .expect("fixture schema should render");
    ModelRegistry::from_document(&document, &ValidationConfig::default())
        .expect("registry should build")
}

fn values(df: &DataFrame, column: &str) -> Vec<Value> {
    let series = df.column(column).expect("column should exist");
    frame::series_values(series.as_materialized_series()).expect("cells should read back")
}

fn schema_errors(result: ValidationResult) -> SchemaErrors {
    match result {
        Err(FrameValidationError::Schema(errors)) => errors,
        other => panic!("expected schema errors, got {other:?}"),
    }
}

#[test]
fn classifies_every_inline_form() {
    let registry = registry();
    let container = registry.get("Container").expect("Container model");

    let forms: Vec<(&str, Option<RepresentationKind>)> = container
        .fields()
        .iter()
        .map(|f| (f.field_name.as_str(), f.representation))
        .collect();
    assert_eq!(
        forms,
        vec![
            ("name", None),
            ("tags", Some(RepresentationKind::SimpleDict)),
            ("origin", Some(RepresentationKind::NestedStruct)),
            ("points", Some(RepresentationKind::NestedListStruct)),
            ("members", Some(RepresentationKind::CollectionStruct)),
            ("measurements", Some(RepresentationKind::NestedListStruct)),
            ("reference", Some(RepresentationKind::Reference)),
        ]
    );
    assert_eq!(container.nested_range("members"), Some("Point"));
    assert_eq!(container.nested_range("reference"), None);
}

#[test]
fn simple_dict_flattens_scalars_and_records() -> ValidationResult {
    let registry = registry();
    let container = registry.resolve("Container")?;
    let tag = registry.resolve("Tag")?;
    let details = container.inline_details("tags").expect("simple dict details");
    assert_eq!((details.id.as_str(), details.other.as_str()), ("id", "other"));

    let rows = vec![json!({"name": "c", "tags": {"A": 1, "B": {"id": "B", "other": 2}}})];
    let df = registry.load_frame("Container", &rows)?;
    let flat = SimpleDictTransformer::new(&tag, details).prepare(&df, "tags")?;

    assert_eq!(
        frame::to_records(&flat)?,
        vec![json!({"id": "A", "other": 1}), json!({"id": "B", "other": 2})]
    );
    assert_eq!(tag.validate(&flat, &registry), Ok(()));
    assert_eq!(registry.validate_records("Container", &rows), Ok(()));
    Ok(())
}

#[test]
fn empty_list_row_contributes_no_records() -> ValidationResult {
    let registry = registry();
    let rows: Vec<Value> = (0..5)
        .map(|i| {
            let points = if i == 2 {
                json!([])
            } else {
                json!([{"id": format!("p{i}"), "x": i, "y": 0}])
            };
            json!({"name": format!("c{i}"), "points": points})
        })
        .collect();

    let point = registry.resolve("Point")?;
    let df = registry.load_frame("Container", &rows)?;
    let flat = ListStructTransformer::new(&point).prepare(&df, "points")?;

    assert_eq!(flat.height(), 4);
    assert_eq!(
        values(&flat, "id"),
        vec![json!("p0"), json!("p1"), json!("p3"), json!("p4")]
    );
    assert_eq!(registry.validate_records("Container", &rows), Ok(()));
    Ok(())
}

#[test]
fn nested_violation_is_reraised_unaltered() -> ValidationResult {
    let registry = registry();
    let container = registry.resolve("Container")?;
    let rows = vec![
        json!({"name": "a", "points": [{"id": "p", "x": 1, "y": 0}]}),
        json!({"name": "b", "points": [{"id": "q", "x": 11, "y": 0}]}),
    ];
    let df = registry.load_frame("Container", &rows)?;

    let nested = schema_errors(
        NestedDispatcher::new(&registry)
            .check_column(&container, &df, "points", RepresentationKind::NestedListStruct)
            .map(|_| ()),
    );
    assert_eq!(nested.schema, "Point");
    assert_eq!(nested.len(), 1);
    let violation = &nested.errors()[0];
    assert_eq!(violation.column.as_deref(), Some("x"));
    assert_eq!(violation.check, "less_than_or_equal_to(10)");
    assert_eq!(violation.failure_cases[0].value, json!(11));

    let outer = schema_errors(container.validate(&df, &registry));
    assert_eq!(outer.schema, "Container");
    assert_eq!(outer.errors(), nested.errors());
    Ok(())
}

#[test]
fn reshape_fault_is_a_plain_failure() -> ValidationResult {
    let registry = registry();
    let container = registry.resolve("Container")?;
    let rows = vec![json!({"name": "a", "members": {"m1": null}})];
    let df = registry.load_frame("Container", &rows)?;

    let passed = NestedDispatcher::new(&registry).check_column(
        &container,
        &df,
        "members",
        RepresentationKind::CollectionStruct,
    )?;
    assert!(!passed);

    let errors = schema_errors(container.validate(&df, &registry));
    assert_eq!(errors.len(), 1);
    assert_eq!(errors.errors()[0].category, ErrorCategory::CheckFailed);
    assert_eq!(errors.errors()[0].check, "check_collection_struct_members");
    Ok(())
}

#[test]
fn collection_injects_identifier_only_when_absent() -> ValidationResult {
    let registry = registry();
    let point = registry.resolve("Point")?;
    let rows = vec![
        json!({"name": "a", "members": {"m1": {"x": 1, "y": 2}, "m2": {"id": "explicit", "x": 3, "y": 4}}}),
        json!({"name": "b", "members": {}}),
    ];
    let df = registry.load_frame("Container", &rows)?;
    let flat = CollectionStructTransformer::new(&point).prepare(&df, "members")?;

    assert_eq!(values(&flat, "id"), vec![json!("m1"), json!("explicit")]);
    assert_eq!(registry.validate_records("Container", &rows), Ok(()));
    Ok(())
}

#[test]
fn nested_struct_and_records_without_identifier() {
    let registry = registry();
    let rows = vec![
        json!({"name": "a", "origin": {"id": "o", "x": 1, "y": 2}, "measurements": [{"value": 1.5, "unit": "m"}]}),
        json!({"name": "b", "origin": null, "measurements": [{"value": null}]}),
    ];

    let errors = schema_errors(registry.validate_records("Container", &rows));
    assert_eq!(errors.len(), 1);
    let error = &errors.errors()[0];
    assert_eq!(error.schema, "Measurement");
    assert_eq!(error.category, ErrorCategory::NullValues);
    assert_eq!(error.column.as_deref(), Some("value"));
}

#[test]
fn missing_required_column_is_reported() -> ValidationResult {
    let registry = registry();
    assert_eq!(registry.validate_records("Container", &[json!({"name": "a"})]), Ok(()));

    let model = registry.resolve("Container")?;
    let df = frame::from_records(&[json!({"tags": {}})], &ColumnSchema::new())?;
    let errors = schema_errors(model.validate(&df, &registry));

    assert_eq!(errors.len(), 1);
    assert_eq!(errors.errors()[0].category, ErrorCategory::ColumnMissing);
    assert_eq!(errors.errors()[0].message, "column 'name' not in dataframe");
    Ok(())
}

#[test]
fn explicit_null_optional_fields_pass() -> ValidationResult {
    let registry = registry();
    let rows = vec![
        json!({
            "name": "a",
            "origin": {"id": "o", "x": 1, "y": 0, "label": null},
            "points": [{"id": "p", "x": 1, "y": 0, "label": null}],
        }),
        json!({"name": "b", "points": [{"id": "q", "x": 2, "y": 0, "label": null}]}),
    ];
    assert_eq!(registry.validate_records("Container", &rows), Ok(()));

    let point = registry.resolve("Point")?;
    let df = registry.load_frame("Container", &rows)?;
    let flat = ListStructTransformer::new(&point).prepare(&df, "points")?;
    assert_eq!(flat.height(), 2);
    assert_eq!(
        flat.column("label").map(|c| c.dtype().clone()).ok(),
        Some(DataType::String)
    );
    Ok(())
}

#[test]
fn explicit_null_required_field_is_still_reported() {
    let registry = registry();
    let rows = vec![json!({"name": "a", "origin": {"id": "o", "x": 1, "y": null}})];

    let errors = schema_errors(registry.validate_records("Container", &rows));
    assert_eq!(errors.len(), 1);
    let error = &errors.errors()[0];
    assert_eq!(error.schema, "Point");
    assert_eq!(error.category, ErrorCategory::NullValues);
    assert_eq!(error.column.as_deref(), Some("y"));
}

#[test]
fn self_referential_class_validates_every_level() -> ValidationResult {
    let registry = registry();
    let node = registry.resolve("Node")?;
    assert_eq!(node.nested_range("children"), Some("Node"));
    assert_eq!(
        node.inline_form("children"),
        Some(RepresentationKind::NestedListStruct)
    );

    let tree = json!({"id": "root", "weight": 1, "children": [
        {"id": "a", "weight": 2, "children": [{"id": "a1", "weight": 3, "children": []}]},
        {"id": "b", "children": null},
    ]});
    assert_eq!(registry.validate_records("Node", &[tree]), Ok(()));

    let deep = json!({"id": "root", "children": [
        {"id": "a", "children": [{"id": "a1", "weight": -1}]},
    ]});
    let errors = schema_errors(registry.validate_records("Node", &[deep]));
    assert_eq!(errors.len(), 1);
    let violation = &errors.errors()[0];
    assert_eq!(violation.schema, "Node");
    assert_eq!(violation.column.as_deref(), Some("weight"));
    assert_eq!(violation.check, "greater_than_or_equal_to(0)");
    assert_eq!(violation.failure_cases[0].value, json!(-1));
    Ok(())
}
