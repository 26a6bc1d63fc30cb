use packstate_inspect::{
    decode, encode, load_layout, parse_assignment, parse_raw, plan_json, render_plan, render_state,
};
use packstate_state::FieldValue;
use pretty_assertions::assert_eq;
use std::io::Write;
use tempfile::NamedTempFile;

const PERSON: &str = r#"{
    "name": "Person",
    "fields": [
        { "name": "age", "kind": { "type": "int32" }, "range": { "minimum": 0, "maximum": 120 } },
        { "name": "isCool", "kind": { "type": "bool" } },
        { "name": "thing", "kind": { "type": "enum", "members": ["FOO", "BAR", "BAZ", "QUUX"] } }
    ]
}"#;

fn schema_file(json: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(json.as_bytes()).unwrap();
    file
}

#[test]
fn loads_and_plans_schema_file() {
    let file = schema_file(PERSON);
    let layout = load_layout(file.path()).unwrap();
    assert_eq!(layout.name(), "Person");
    assert_eq!(layout.total_bits(), 10);
}

#[test]
fn missing_file_mentions_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.json");
    let err = load_layout(&path).unwrap_err();
    assert!(format!("{err:#}").contains("absent.json"));
}

#[test]
fn unplannable_schema_is_reported() {
    let file = schema_file(
        r#"{"name":"Bad","fields":[{"name":"x","kind":{"type":"int8"},"range":{"minimum":5,"maximum":1}}]}"#,
    );
    let err = load_layout(file.path()).unwrap_err();
    assert!(format!("{err:#}").contains("Cannot lay out Bad"));
}

#[test]
fn plan_table_lists_fields_in_order() {
    let file = schema_file(PERSON);
    let table = render_plan(&load_layout(file.path()).unwrap());
    let lines: Vec<_> = table.lines().collect();
    assert_eq!(lines.len(), 5);
    assert!(lines[0].starts_with("Person: 10 of 32 bits used"));
    assert!(lines[2].contains("age") && lines[2].contains("0..=120"));
    assert!(lines[3].contains("isCool") && lines[3].contains("0x80"));
    assert!(lines[4].contains("FOO|BAR|BAZ|QUUX"));
}

#[test]
fn plan_json_is_parseable() {
    let file = schema_file(PERSON);
    let json = plan_json(&load_layout(file.path()).unwrap()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["total_bits"], 10);
    assert_eq!(value["fields"][2]["starting_bit"], 8);
}

#[test]
fn decode_renders_fields() {
    let file = schema_file(PERSON);
    let layout = load_layout(file.path()).unwrap();
    let state = decode(&layout, parse_raw("0x29e").unwrap()).unwrap();
    assert_eq!(
        render_state(&state),
        "Person(age=30, isCool=true, thing=BAZ) = 0b1010011110 = 0x29e = 670\n\
         \x20 age = 30 (raw 0b11110)\n\
         \x20 isCool = true (raw 0b1)\n\
         \x20 thing = BAZ (raw 0b10)\n"
    );
}

#[test]
fn decode_rejects_invalid_word() {
    let file = schema_file(PERSON);
    let layout = load_layout(file.path()).unwrap();
    let err = decode(&layout, 121).unwrap_err();
    assert!(format!("{err:#}").contains("age must be >= 0 and <= 120 but got 121"));
}

#[test]
fn encode_applies_assignments_in_order() {
    let file = schema_file(PERSON);
    let layout = load_layout(file.path()).unwrap();
    let state = encode(&layout, ["age=30", "isCool=true", "thing=BAZ", "age=31"]).unwrap();
    assert_eq!(state.read("age").unwrap(), FieldValue::Int(31));
    assert_eq!(state.read("thing").unwrap(), FieldValue::Enum(2));
}

#[test]
fn enum_accepts_ordinal() {
    let file = schema_file(PERSON);
    let layout = load_layout(file.path()).unwrap();
    assert_eq!(
        parse_assignment(&layout, "thing=3").unwrap(),
        (2, FieldValue::Enum(3))
    );
}

#[test]
fn bad_assignments_are_rejected() {
    let file = schema_file(PERSON);
    let layout = load_layout(file.path()).unwrap();
    for bad in ["age", "height=3", "isCool=yes", "thing=NOPE", "age=ten"] {
        assert!(parse_assignment(&layout, bad).is_err(), "{bad}");
    }
    assert!(encode(&layout, ["age=121"]).is_err());
    assert!(encode(&layout, ["thing=4"]).is_err());
}
