use serde::{Deserialize, Serialize};
use serde_json::json;
use spell_value::*;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelConfig {
    max_tokens: u32,
    #[serde(rename = "model_id")]
    model: String,
    #[serde(skip)]
    cache_key: Option<String>,
    tags: Vec<String>,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Item {
    flags: bool,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Outer {
    items: Vec<Item>,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
enum Shape {
    Point,
    Circle(f64),
    Pair(u8, u8),
    Rect { w: u32, h: u32 },
}

fn json(value: serde_json::Value) -> DynamicValue {
    DynamicValue::from(value)
}

// --- records ---

#[test]
fn record_uses_external_names() {
    let cfg = ModelConfig {
        max_tokens: 256,
        model: "m-1".into(),
        cache_key: Some("secret".into()),
        tags: vec!["a".into()],
    };
    let value = to_boundary(&cfg).unwrap();
    assert_eq!(
        value,
        json(json!({"maxTokens": 256, "model_id": "m-1", "tags": ["a"]}))
    );
    assert!(value.get("cacheKey").is_none());
    assert!(value.get("max_tokens").is_none());
}

#[test]
fn record_roundtrip_drops_skipped_member() {
    let cfg = ModelConfig {
        max_tokens: 8,
        model: "x".into(),
        cache_key: Some("gone".into()),
        tags: vec![],
    };
    let back: ModelConfig = from_boundary(to_boundary(&cfg).unwrap()).unwrap();
    assert_eq!(back.max_tokens, 8);
    assert_eq!(back.model, "x");
    assert_eq!(back.cache_key, None);
}

#[test]
fn unknown_keys_ignored_and_missing_members_zeroed() {
    let value = json(json!({"maxTokens": 5, "extra": {"nested": true}}));
    let cfg: ModelConfig = from_boundary(value).unwrap();
    assert_eq!(
        cfg,
        ModelConfig {
            max_tokens: 5,
            ..ModelConfig::default()
        }
    );
}

#[test]
fn null_record_is_zero_value() {
    let cfg: ModelConfig = from_boundary(DynamicValue::Null).unwrap();
    assert_eq!(cfg, ModelConfig::default());
}

#[test]
fn record_from_scalar_fails() {
    let err = from_boundary::<ModelConfig>(DynamicValue::from(3)).unwrap_err();
    assert!(matches!(
        err.kind(),
        ConversionErrorKind::Mismatch {
            found: ValueKind::Number,
            ..
        }
    ));
}

#[derive(Debug, PartialEq, Deserialize)]
struct Renamed {
    #[serde(alias = "nm")]
    name: String,
    retries: u32,
}

#[test]
fn aliased_member_decodes_by_either_name() {
    let primary: Renamed = from_boundary(json(json!({"name": "x"}))).unwrap();
    assert_eq!(
        primary,
        Renamed {
            name: "x".into(),
            retries: 0
        }
    );

    let aliased: Renamed = from_boundary(json(json!({"nm": "y", "retries": 2}))).unwrap();
    assert_eq!(aliased.name, "y");
    assert_eq!(aliased.retries, 2);
}

fn seven() -> u32 {
    7
}

#[derive(Debug, PartialEq, Deserialize)]
struct Retrying {
    name: String,
    #[serde(default = "seven")]
    retries: u32,
    #[serde(default)]
    mode: Mode,
}

#[derive(Debug, Default, PartialEq, Deserialize)]
enum Mode {
    Fast,
    #[default]
    Careful,
}

#[test]
fn declared_defaults_survive_missing_members() {
    let r: Retrying = from_boundary(json(json!({"name": "x"}))).unwrap();
    assert_eq!(
        r,
        Retrying {
            name: "x".into(),
            retries: 7,
            mode: Mode::Careful,
        }
    );

    let cfg: ConverterConfig = from_boundary(json(json!({"max_depth": 4}))).unwrap();
    assert_eq!(cfg.max_depth, 4);
    assert!(cfg.lenient_text);
}

#[derive(Debug, PartialEq, Deserialize)]
struct Job {
    name: String,
    mode: Mode,
}

#[derive(Debug, PartialEq, Deserialize)]
struct Queue {
    jobs: Vec<Job>,
}

#[test]
fn missing_enum_member_is_reported_by_name() {
    let err = from_boundary::<Queue>(json(json!({"jobs": [{"mode": "Fast"}, {"name": "b"}]})))
        .unwrap_err();
    assert_eq!(
        err.kind(),
        &ConversionErrorKind::MissingField {
            field: "mode".into()
        }
    );
    assert_eq!(err.path().to_string(), "jobs[1]");
}

#[test]
fn nested_missing_members_zeroed_in_place() {
    let outer: Outer = from_boundary(json(json!({"items": [{}, {"flags": true}]}))).unwrap();
    assert_eq!(
        outer,
        Outer {
            items: vec![Item { flags: false }, Item { flags: true }]
        }
    );
}

#[test]
fn struct_variant_named_alone_is_zeroed() {
    let shape: Shape = from_boundary(json(json!("Rect"))).unwrap();
    assert_eq!(shape, Shape::Rect { w: 0, h: 0 });
}

// --- scalar coercion ---

#[test]
fn number_three_converts_to_every_numeric_kind() {
    let three = || DynamicValue::Number(3.0);
    assert_eq!(from_boundary::<i8>(three()).unwrap(), 3);
    assert_eq!(from_boundary::<i16>(three()).unwrap(), 3);
    assert_eq!(from_boundary::<i32>(three()).unwrap(), 3);
    assert_eq!(from_boundary::<i64>(three()).unwrap(), 3);
    assert_eq!(from_boundary::<isize>(three()).unwrap(), 3);
    assert_eq!(from_boundary::<u8>(three()).unwrap(), 3);
    assert_eq!(from_boundary::<u16>(three()).unwrap(), 3);
    assert_eq!(from_boundary::<u32>(three()).unwrap(), 3);
    assert_eq!(from_boundary::<u64>(three()).unwrap(), 3);
    assert_eq!(from_boundary::<usize>(three()).unwrap(), 3);
    assert_eq!(from_boundary::<f32>(three()).unwrap(), 3.0);
    assert_eq!(from_boundary::<f64>(three()).unwrap(), 3.0);
}

#[test]
fn numeric_text_coerces_when_lenient() {
    assert_eq!(from_boundary::<u16>(DynamicValue::from(" 42 ")).unwrap(), 42);
    assert_eq!(from_boundary::<f64>(DynamicValue::from("2.5")).unwrap(), 2.5);

    let strict = Converter::new(ConverterConfig::default().with_lenient_text(false));
    let err = strict.from_boundary::<u16>(DynamicValue::from("42")).unwrap_err();
    assert!(matches!(err.kind(), ConversionErrorKind::Mismatch { .. }));
}

#[test]
fn unparsable_number_text_is_invalid() {
    let err = from_boundary::<i32>(DynamicValue::from("abc")).unwrap_err();
    assert_eq!(
        err.kind(),
        &ConversionErrorKind::InvalidValue {
            shape: "i32".into(),
            value: "abc".into()
        }
    );
}

#[test]
fn float_to_int_truncates() {
    assert_eq!(from_boundary::<i32>(DynamicValue::Number(3.9)).unwrap(), 3);
    assert_eq!(from_boundary::<u8>(DynamicValue::Number(300.0)).unwrap(), 255);
}

#[test]
fn bool_coercion_heuristics() {
    let b = |v: DynamicValue| from_boundary::<bool>(v).unwrap();
    assert!(b(DynamicValue::from("yes")));
    assert!(!b(DynamicValue::from("false")));
    assert!(!b(DynamicValue::from("0")));
    assert!(!b(DynamicValue::from("")));
    assert!(b(DynamicValue::from(2)));
    assert!(!b(DynamicValue::from(0)));
    assert!(!b(DynamicValue::Null));
}

#[test]
fn collection_to_scalar_fails() {
    let err = from_boundary::<bool>(json(json!([1]))).unwrap_err();
    assert_eq!(err.shape(), Some("bool"));
    assert!(from_boundary::<String>(json(json!({"a": 1}))).is_err());
    assert!(from_boundary::<f64>(json(json!([]))).is_err());
}

#[test]
fn scalars_format_to_text() {
    assert_eq!(from_boundary::<String>(DynamicValue::from(42)).unwrap(), "42");
    assert_eq!(from_boundary::<String>(DynamicValue::from(2.5)).unwrap(), "2.5");
    assert_eq!(from_boundary::<String>(DynamicValue::from(true)).unwrap(), "true");
    assert_eq!(from_boundary::<String>(DynamicValue::Null).unwrap(), "");
}

#[test]
fn char_requires_single_character() {
    assert_eq!(from_boundary::<char>(DynamicValue::from("x")).unwrap(), 'x');
    let err = from_boundary::<char>(DynamicValue::from("xy")).unwrap_err();
    assert!(matches!(err.kind(), ConversionErrorKind::InvalidValue { .. }));
}

// --- errors and limits ---

#[test]
fn mismatch_reports_path() {
    let value = json(json!({
        "items": [{"flags": true}, {"flags": false}, {"flags": [1]}]
    }));
    let err = from_boundary::<Outer>(value).unwrap_err();
    assert_eq!(
        err.path().segments(),
        &[
            PathSegment::Field("items".into()),
            PathSegment::Index(2),
            PathSegment::Field("flags".into()),
        ]
    );
    assert_eq!(err.to_string(), "expected bool, found sequence at items[2].flags");
}

#[test]
fn non_finite_numbers_rejected() {
    let err = to_boundary(&f64::NAN).unwrap_err();
    assert!(matches!(err.kind(), ConversionErrorKind::NonFinite(_)));

    let err = to_boundary(&vec![1.0, f64::INFINITY]).unwrap_err();
    assert_eq!(err.path().segments(), &[PathSegment::Index(1)]);
}

#[test]
fn depth_limit_applies_both_ways() {
    let converter = Converter::new(ConverterConfig::default().with_max_depth(2));
    assert!(converter.to_boundary(&vec![vec![1]]).is_ok());

    let err = converter.to_boundary(&vec![vec![vec![1]]]).unwrap_err();
    assert_eq!(err.kind(), &ConversionErrorKind::DepthExceeded { limit: 2 });

    let deep = json(json!([[[1]]]));
    let err = converter
        .from_boundary::<Vec<Vec<Vec<u8>>>>(deep)
        .unwrap_err();
    assert_eq!(err.kind(), &ConversionErrorKind::DepthExceeded { limit: 2 });
}

// --- collections ---

#[test]
fn map_keys_are_stringified_and_parsed_back() {
    let mut scores = HashMap::new();
    scores.insert(1u32, "one".to_string());
    scores.insert(20u32, "twenty".to_string());

    let value = to_boundary(&scores).unwrap();
    assert_eq!(value, json(json!({"1": "one", "20": "twenty"})));

    let back: HashMap<u32, String> = from_boundary(value).unwrap();
    assert_eq!(back, scores);
}

#[test]
fn compound_map_keys_fall_back_to_json() {
    let mut grid = BTreeMap::new();
    grid.insert((1u8, 2u8), true);

    let value = to_boundary(&grid).unwrap();
    assert_eq!(value.get("[1,2]"), Some(&DynamicValue::Bool(true)));

    let back: BTreeMap<(u8, u8), bool> = from_boundary(value).unwrap();
    assert_eq!(back, grid);
}

#[test]
fn null_collections_are_empty() {
    assert!(from_boundary::<Vec<u8>>(DynamicValue::Null).unwrap().is_empty());
    assert!(
        from_boundary::<HashMap<String, u8>>(DynamicValue::Null)
            .unwrap()
            .is_empty()
    );
    assert_eq!(
        from_boundary::<(u8, String)>(DynamicValue::Null).unwrap(),
        (0, String::new())
    );
}

#[test]
fn options_map_to_null() {
    assert_eq!(to_boundary(&None::<u8>).unwrap(), DynamicValue::Null);
    assert_eq!(to_boundary(&Some(5u8)).unwrap(), DynamicValue::Number(5.0));
    assert_eq!(from_boundary::<Option<u8>>(DynamicValue::Null).unwrap(), None);
    assert_eq!(
        from_boundary::<Option<u8>>(DynamicValue::from(5)).unwrap(),
        Some(5)
    );
}

#[test]
fn enum_variants_roundtrip() {
    let cases = [
        (Shape::Point, json(json!("Point"))),
        (Shape::Circle(1.5), json(json!({"Circle": 1.5}))),
        (Shape::Pair(1, 2), json(json!({"Pair": [1, 2]}))),
        (Shape::Rect { w: 3, h: 4 }, json(json!({"Rect": {"w": 3, "h": 4}}))),
    ];
    for (shape, expected) in cases {
        let value = to_boundary(&shape).unwrap();
        assert_eq!(value, expected);
        assert_eq!(from_boundary::<Shape>(value).unwrap(), shape);
    }
}

#[test]
fn json_values_pass_through() {
    let raw = json!({"a": [1, 2.5, "x", null, true], "b": {}});
    let value = to_boundary(&raw).unwrap();
    assert_eq!(value, DynamicValue::from(raw.clone()));

    let back: serde_json::Value = from_boundary(value).unwrap();
    assert_eq!(back, raw);
}

#[test]
fn dynamic_value_is_identity() {
    let value = json(json!({"k": [1, -2, 0.25, "t", false, null]}));
    assert_eq!(to_boundary(&value).unwrap(), value);
    assert_eq!(from_boundary::<DynamicValue>(value.clone()).unwrap(), value);
}

#[test]
fn config_deserializes_with_defaults() {
    let cfg: ConverterConfig = serde_json::from_str(r#"{"max_depth": 8}"#).unwrap();
    assert_eq!(cfg.max_depth, 8);
    assert!(cfg.lenient_text);
}
