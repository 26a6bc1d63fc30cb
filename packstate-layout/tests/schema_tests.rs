use packstate_layout::{
    BitLayoutPlan, CodecError, FieldDescriptor, LayoutError, StateSchema, ValueKind, ValueRange,
};
use pretty_assertions::assert_eq;

const WITH_VALUE_RANGES: &str = r#"{
    "name": "WithValueRanges",
    "change_support": true,
    "fields": [
        { "name": "age", "kind": { "type": "int32" }, "range": { "minimum": 0, "maximum": 120 } },
        { "name": "limbs", "kind": { "type": "int8" }, "range": { "minimum": 0, "maximum": 4 } },
        { "name": "negativity", "kind": { "type": "int16" }, "range": { "minimum": -20, "maximum": 5 } },
        { "name": "mood", "kind": { "type": "enum", "members": ["CALM", "CROSS"] } }
    ]
}"#;

#[test]
fn parses_json_schema() {
    let schema = StateSchema::from_json(WITH_VALUE_RANGES).unwrap();
    assert_eq!(schema.name, "WithValueRanges");
    assert!(schema.change_support);
    assert_eq!(
        schema.fields[1],
        FieldDescriptor::ranged("limbs", ValueKind::Int8, 0, 4)
    );
    assert_eq!(
        schema.fields[3],
        FieldDescriptor::enumeration("mood", ["CALM", "CROSS"])
    );
}

#[test]
fn change_support_defaults_to_false() {
    let schema = StateSchema::from_json(r#"{"name":"S","fields":[]}"#).unwrap();
    assert!(!schema.change_support);
}

#[test]
fn open_bound_in_json() {
    let schema = StateSchema::from_json(
        r#"{"name":"S","fields":[{"name":"x","kind":{"type":"int8"},"range":{"maximum":10}}]}"#,
    )
    .unwrap();
    assert_eq!(schema.fields[0].range, Some(ValueRange::at_most(10)));
}

#[test]
fn json_round_trip_preserves_order() {
    let schema = StateSchema::from_json(WITH_VALUE_RANGES).unwrap();
    let json = schema.to_json().unwrap();
    let parsed = StateSchema::from_json(&json).unwrap();
    assert_eq!(parsed, schema);
}

#[test]
fn malformed_json_is_a_schema_error() {
    let err = StateSchema::from_json("{ not json").unwrap_err();
    assert!(matches!(err, LayoutError::Schema(_)));
    assert!(err.to_string().contains("schema error"));
}

#[test]
fn parsed_schema_plans() {
    let plan = BitLayoutPlan::plan(&StateSchema::from_json(WITH_VALUE_RANGES).unwrap()).unwrap();
    let widths: Vec<_> = plan.fields().iter().map(|f| f.width()).collect();
    assert_eq!(widths, vec![7, 3, 5, 1]);
}

// ── error display ───────────────────────────────────────────────

#[test]
fn capacity_error_mentions_bits() {
    let err = LayoutError::CapacityExceeded {
        state: "Big".into(),
        required: 70,
    };
    let msg = err.to_string();
    assert!(msg.contains("Big"));
    assert!(msg.contains("70"));
}

#[test]
fn out_of_range_mentions_field_and_value() {
    let err = CodecError::OutOfRange {
        field: "age".into(),
        value: 200,
        min: 0,
        max: 120,
    };
    assert_eq!(err.to_string(), "age must be >= 0 and <= 120 but got 200");
}

#[test]
fn invalid_ordinal_mentions_count() {
    let err = CodecError::InvalidOrdinal {
        field: "thing".into(),
        ordinal: 6,
        count: 5,
    };
    let msg = err.to_string();
    assert!(msg.contains("thing"));
    assert!(msg.contains("< 5"));
    assert!(msg.contains('6'));
}

#[test]
fn error_is_debug() {
    let err = LayoutError::EmptyEnum { field: "e".into() };
    let _ = format!("{err:?}");
}
