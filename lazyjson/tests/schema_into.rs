// SPDX-License-Identifier: Apache-2.0

// Schema-driven deserialization: misses skip, mismatches fail, foreign documents are rejected

use lazyjson::{
    deserialize, Error, ErrorCode, JsonType, Number, OwnedValue, Parser, ParserOptions, Schema,
    DEFAULT_MAX_DEPTH,
};
use test_log::test;

#[derive(Debug, Default, PartialEq)]
struct Record {
    a: Option<Number>,
    b: Option<String>,
}

fn record_schema() -> Schema<Record> {
    Schema::new()
        .number("a", |r: &mut Record, n| r.a = Some(n))
        .string("b", |r: &mut Record, s| r.b = Some(s))
}

fn run(json: &str, target: &mut Record) -> Result<(), Error> {
    let parser = Parser::new();
    let mut doc = parser.iterate_input(json)?;
    deserialize::into(&mut doc, target, &record_schema())?;
    Ok(())
}

#[test]
fn all_fields_present() {
    let mut record = Record::default();
    run(r#"{"a":1,"b":"ok"}"#, &mut record).unwrap();
    assert_eq!(
        record,
        Record {
            a: Some(Number::Int(1)),
            b: Some("ok".to_string()),
        }
    );
}

#[test]
fn mismatch_fails_and_names_the_attribute() {
    let mut record = Record::default();
    match run(r#"{"a":"x"}"#, &mut record) {
        Err(Error::TypeMismatch {
            attribute,
            expected,
            found,
        }) => {
            assert_eq!(attribute, "a");
            assert_eq!(expected, JsonType::Number);
            assert_eq!(found, JsonType::String);
        }
        other => panic!("Expected TypeMismatch, got: {:?}", other),
    }
    assert_eq!(record, Record::default());
}

#[test]
fn mismatch_stops_before_later_fields() {
    let mut record = Record::default();
    assert!(matches!(
        run(r#"{"b":"ok","a":false}"#, &mut record),
        Err(Error::TypeMismatch { .. })
    ));
    // "a" is declared first, so "b" was never assigned.
    assert_eq!(record.b, None);
}

#[test]
fn foreign_document_matches_nothing() {
    let mut record = Record::default();
    match run(r#"{"c":1}"#, &mut record) {
        Err(Error::NoFieldsMatched) => {}
        other => panic!("Expected NoFieldsMatched, got: {:?}", other),
    }
    assert_eq!(record, Record::default());
}

#[test]
fn partial_document_with_extra_fields() {
    let mut record = Record::default();
    run(r#"{"b":"ok","extra":true}"#, &mut record).unwrap();
    assert_eq!(record.a, None);
    assert_eq!(record.b.as_deref(), Some("ok"));
}

#[test]
fn no_coercion_between_scalars() {
    for json in [r#"{"a":"1"}"#, r#"{"a":true}"#, r#"{"a":null}"#, r#"{"b":2}"#] {
        let mut record = Record::default();
        assert!(
            matches!(run(json, &mut record), Err(Error::TypeMismatch { .. })),
            "{json}"
        );
    }
}

#[test]
fn document_and_schema_entry_points_agree() {
    #[derive(Debug, Default)]
    struct Config {
        name: String,
        ports: Vec<OwnedValue>,
        limits: Vec<(String, OwnedValue)>,
        debug: bool,
        parent: Option<()>,
    }
    let schema = Schema::new()
        .string("name", |c: &mut Config, s| c.name = s)
        .array("ports", |c: &mut Config, p| c.ports = p)
        .object("limits", |c: &mut Config, l| c.limits = l)
        .boolean("debug", |c: &mut Config, d| c.debug = d)
        .null("parent", |c: &mut Config| c.parent = Some(()))
        .field("unused", JsonType::Number, |_: &mut Config, _| {});
    assert_eq!(schema.len(), 6);
    assert_eq!(
        schema.fields().map(|(name, _)| name).collect::<Vec<_>>(),
        vec!["name", "ports", "limits", "debug", "parent", "unused"]
    );

    let json = r#"{"parent": null, "debug": false, "limits": {"cpu": 2}, "ports": [80, 443], "name": "edge"}"#;
    let parser = Parser::new();

    let mut doc = parser.iterate_input(json).unwrap();
    let fresh = schema.deserialize(&mut doc).unwrap();
    drop(doc);

    let mut doc = parser.iterate_input(json).unwrap();
    let mut existing = Config::default();
    doc.deserialize_into(&mut existing, &schema).unwrap();

    for config in [&fresh, &existing] {
        assert_eq!(config.name, "edge");
        assert_eq!(config.ports, vec![OwnedValue::from(80i64), OwnedValue::from(443i64)]);
        assert_eq!(config.limits, vec![("cpu".to_string(), OwnedValue::from(2i64))]);
        assert!(!config.debug);
        assert_eq!(config.parent, Some(()));
    }
}

#[derive(Default)]
struct Nested {
    a: Vec<OwnedValue>,
}

fn nested_schema() -> Schema<Nested> {
    Schema::new().array("a", |n: &mut Nested, items| n.a = items)
}

/// `{"a": [[[...]]]}` with `levels` arrays under the root object.
fn nested_document(levels: usize) -> String {
    format!(r#"{{"a":{}{}}}"#, "[".repeat(levels), "]".repeat(levels))
}

/// Arrays from `items`' own container down to the innermost one, counted
/// without recursing.
fn array_depth(items: &[OwnedValue]) -> usize {
    let mut depth = 1;
    let mut current = items.first();
    while let Some(OwnedValue::Array(inner)) = current {
        depth += 1;
        current = inner.first();
    }
    depth
}

#[test]
fn array_attribute_at_the_default_depth_limit() {
    // The root object plus its arrays fill DEFAULT_MAX_DEPTH exactly.
    let json = nested_document(DEFAULT_MAX_DEPTH - 1);
    let parser = Parser::new();
    let mut doc = parser.iterate_input(json.as_str()).unwrap();
    let nested = nested_schema().deserialize(&mut doc).unwrap();
    assert_eq!(array_depth(&nested.a), DEFAULT_MAX_DEPTH - 1);

    drop(doc);
    match parser.iterate_input(nested_document(DEFAULT_MAX_DEPTH).as_str()) {
        Err(e) => assert_eq!(e.code(), Some(ErrorCode::DepthError)),
        Ok(doc) => panic!("Expected DepthError, got: {:?}", doc),
    }
}

#[test]
fn array_attribute_under_a_raised_depth_limit() {
    let levels = 50_000;
    let json = nested_document(levels);
    let options = ParserOptions::default().capacity(json.len()).max_depth(levels + 1);
    let parser = Parser::with_options(options).unwrap();
    let mut doc = parser.iterate_input(json.as_str()).unwrap();

    let mut nested = Nested::default();
    deserialize::into(&mut doc, &mut nested, &nested_schema()).unwrap();
    assert_eq!(array_depth(&nested.a), levels);
}
