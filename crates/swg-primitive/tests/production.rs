//! Integration tests: producing values against composed schemas of
//! in-memory documents.

use serde_json::{json, Value};
use swg_core::{Location, NodeId, SchemaError, SchemaGraph, SwgError, ValidationError};
use swg_primitive::{
    Direction, Handler, PrimitiveFactory, PrimitiveValue, WireEncoding,
};
use swg_resolve::{MemoryLoader, ReferenceResolver};
use swg_schema::Composer;

const ROOT: &str = "mem://api/root.json";

struct Fixture {
    graph: SchemaGraph,
    resolver: ReferenceResolver,
    factory: PrimitiveFactory,
}

impl Fixture {
    fn new(root: Value) -> Self {
        let loader = MemoryLoader::new().with(ROOT, root.clone());
        let mut graph = SchemaGraph::new();
        let root_id = swg_core::build_document(&mut graph, ROOT, &root).unwrap();
        graph.adopt(root_id);
        Self {
            graph,
            resolver: ReferenceResolver::new(loader),
            factory: PrimitiveFactory::new(),
        }
    }

    fn definitions(definitions: Value) -> Self {
        Self::new(json!({"swagger": "2.0", "definitions": definitions}))
    }

    fn at(&self, pointer: &str) -> NodeId {
        self.graph
            .lookup(&Location::new(ROOT, pointer))
            .unwrap_or_else(|| panic!("no node at {pointer}"))
    }

    fn produce_as(
        &mut self,
        pointer: &str,
        raw: Option<Value>,
        direction: Direction,
    ) -> Result<Option<PrimitiveValue>, SwgError> {
        let node = self.at(pointer);
        let mut composer = Composer::new(&mut self.graph, &mut self.resolver);
        self.factory.produce(&mut composer, node, raw.as_ref(), direction)
    }

    fn produce(&mut self, pointer: &str, raw: Value) -> Result<Option<PrimitiveValue>, SwgError> {
        self.produce_as(pointer, Some(raw), Direction::Read)
    }
}

fn validation(err: SwgError) -> ValidationError {
    match err {
        SwgError::Validation(inner) => inner,
        other => panic!("expected a validation error, got {other:?}"),
    }
}

#[test]
fn pipes_array_splits_and_rejoins() {
    let mut fx = Fixture::new(json!({
        "swagger": "2.0",
        "paths": {
            "/pets": {
                "get": {
                    "parameters": [{
                        "name": "ids",
                        "in": "query",
                        "type": "array",
                        "collectionFormat": "pipes",
                        "items": {"type": "integer"}
                    }],
                    "responses": {}
                }
            }
        }
    }));
    let value = fx
        .produce("#/paths/~1pets/get/parameters/0", json!("1|2|3"))
        .unwrap()
        .unwrap();
    let array = value.as_array().unwrap();
    assert_eq!(
        array.items,
        vec![
            PrimitiveValue::Integer(1),
            PrimitiveValue::Integer(2),
            PrimitiveValue::Integer(3)
        ]
    );
    assert_eq!(value.to_string(), "1|2|3");
    assert_eq!(array.to_wire("ids"), WireEncoding::Joined("1|2|3".to_string()));
}

#[test]
fn multi_array_repeats_the_parameter() {
    let mut fx = Fixture::definitions(json!({
        "Ids": {"type": "array", "collectionFormat": "multi", "items": {"type": "string"}}
    }));
    let value = fx.produce("#/definitions/Ids", json!(["a", "b"])).unwrap().unwrap();
    assert_eq!(
        value.as_array().unwrap().to_wire("id"),
        WireEncoding::Repeated(vec![
            ("id".to_string(), "a".to_string()),
            ("id".to_string(), "b".to_string()),
        ])
    );
}

#[test]
fn unique_items_drop_duplicates() {
    let mut fx = Fixture::definitions(json!({
        "Tags": {"type": "array", "uniqueItems": true, "maxItems": 2, "items": {"type": "string"}}
    }));
    let value = fx.produce("#/definitions/Tags", json!("a,b,a")).unwrap().unwrap();
    assert_eq!(value.as_array().unwrap().len(), 2);

    let err = fx.produce("#/definitions/Tags", json!("a,b,c")).unwrap_err();
    assert!(matches!(validation(err), ValidationError::MaxItems { count: 3, .. }));
}

#[test]
fn additional_properties_false_drops_extra_keys() {
    let mut fx = Fixture::definitions(json!({
        "Closed": {
            "type": "object",
            "additionalProperties": false,
            "properties": {"name": {"type": "string"}}
        }
    }));
    let value = fx
        .produce("#/definitions/Closed", json!({"name": "rex", "extra": 1}))
        .unwrap()
        .unwrap();
    let model = value.as_model().unwrap();
    assert!(model.contains_key("name"));
    assert!(!model.contains_key("extra"));
}

#[test]
fn additional_properties_true_keeps_extra_keys_verbatim() {
    let mut fx = Fixture::definitions(json!({
        "Open": {
            "type": "object",
            "additionalProperties": true,
            "properties": {"name": {"type": "string"}}
        }
    }));
    let value = fx
        .produce("#/definitions/Open", json!({"name": "rex", "extra": {"nested": [1, 2]}}))
        .unwrap()
        .unwrap();
    assert_eq!(value.to_json(), json!({"name": "rex", "extra": {"nested": [1, 2]}}));
}

#[test]
fn additional_properties_schema_produces_each_extra_key() {
    let mut fx = Fixture::definitions(json!({
        "Counts": {"type": "object", "additionalProperties": {"type": "integer"}}
    }));
    let value = fx
        .produce("#/definitions/Counts", json!({"a": "1", "b": 2}))
        .unwrap()
        .unwrap();
    let model = value.as_model().unwrap();
    assert_eq!(model.value("a"), Some(&PrimitiveValue::Integer(1)));
    assert_eq!(model.value("b"), Some(&PrimitiveValue::Integer(2)));
}

#[test]
fn missing_required_property_fails() {
    let mut fx = Fixture::definitions(json!({
        "Pet": {
            "type": "object",
            "required": ["id"],
            "properties": {"id": {"type": "integer"}, "name": {"type": "string"}}
        }
    }));
    let err = fx.produce("#/definitions/Pet", json!({"name": "rex"})).unwrap_err();
    assert_eq!(
        validation(err),
        ValidationError::Required {
            property: "id".to_string()
        }
    );
}

#[test]
fn required_property_with_default_is_filled_in() {
    let mut fx = Fixture::definitions(json!({
        "Pet": {
            "type": "object",
            "required": ["id"],
            "properties": {"id": {"type": "integer", "default": 7}}
        }
    }));
    let value = fx.produce("#/definitions/Pet", json!({})).unwrap().unwrap();
    assert_eq!(value.as_model().unwrap().value("id"), Some(&PrimitiveValue::Integer(7)));
}

#[test]
fn absent_input_without_default_is_absent() {
    let mut fx = Fixture::definitions(json!({
        "Name": {"type": "string"},
        "Limit": {"type": "integer", "default": 20}
    }));
    assert_eq!(fx.produce_as("#/definitions/Name", None, Direction::Read).unwrap(), None);
    assert_eq!(fx.produce("#/definitions/Name", Value::Null).unwrap(), None);
    assert_eq!(
        fx.produce_as("#/definitions/Limit", None, Direction::Read).unwrap(),
        Some(PrimitiveValue::Integer(20))
    );
}

fn pets() -> Value {
    json!({
        "Pet": {
            "type": "object",
            "discriminator": "petType",
            "required": ["petType"],
            "properties": {
                "name": {"type": "string"},
                "petType": {"type": "string"}
            }
        },
        "Cat": {
            "allOf": [
                {"$ref": "#/definitions/Pet"},
                {"properties": {"huntingSkill": {"type": "string", "enum": ["lazy", "aggressive"]}}}
            ]
        },
        "Owner": {
            "type": "object",
            "properties": {"pet": {"$ref": "#/definitions/Cat"}}
        }
    })
}

#[test]
fn discriminator_is_forced_to_the_produced_schema() {
    let mut fx = Fixture::definitions(pets());
    let value = fx
        .produce("#/definitions/Cat", json!({"name": "Tom", "huntingSkill": "lazy"}))
        .unwrap()
        .unwrap();
    let cat = value.as_model().unwrap();
    assert_eq!(cat.name(), Some("Cat"));
    assert_eq!(cat.value("petType"), Some(&PrimitiveValue::String("Cat".to_string())));
    assert_eq!(cat.value("huntingSkill"), Some(&PrimitiveValue::String("lazy".to_string())));

    let value = fx
        .produce("#/definitions/Pet", json!({"name": "Rex", "petType": "Dog"}))
        .unwrap()
        .unwrap();
    assert_eq!(
        value.as_model().unwrap().value("petType"),
        Some(&PrimitiveValue::String("Pet".to_string()))
    );
}

#[test]
fn nested_reference_property_gets_its_own_identity() {
    let mut fx = Fixture::definitions(pets());
    let value = fx
        .produce("#/definitions/Owner", json!({"pet": {"name": "Tom"}}))
        .unwrap()
        .unwrap();
    let owner = value.as_model().unwrap();
    let pet = owner.value("pet").and_then(PrimitiveValue::as_model).unwrap();
    assert_eq!(pet.value("petType"), Some(&PrimitiveValue::String("Cat".to_string())));
}

#[test]
fn composed_enum_is_enforced() {
    let mut fx = Fixture::definitions(pets());
    let err = fx
        .produce("#/definitions/Cat", json!({"name": "Tom", "huntingSkill": "sleepy"}))
        .unwrap_err();
    assert!(matches!(validation(err), ValidationError::Enum { .. }));
}

#[test]
fn read_only_property_is_rejected_when_writing() {
    let mut fx = Fixture::definitions(json!({
        "Pet": {
            "type": "object",
            "properties": {
                "id": {"type": "integer", "readOnly": true},
                "name": {"type": "string"}
            }
        }
    }));
    let raw = json!({"id": 1, "name": "rex"});
    let err = fx
        .produce_as("#/definitions/Pet", Some(raw.clone()), Direction::Write)
        .unwrap_err();
    assert_eq!(
        validation(err),
        ValidationError::ReadOnly {
            property: "id".to_string()
        }
    );
    assert!(fx.produce_as("#/definitions/Pet", Some(raw), Direction::Read).is_ok());
}

#[test]
fn all_of_constraints_apply_to_scalars() {
    let mut fx = Fixture::definitions(json!({
        "Small": {"allOf": [{"type": "integer"}, {"minimum": 5, "maximum": 10}]}
    }));
    assert_eq!(
        fx.produce("#/definitions/Small", json!(7)).unwrap(),
        Some(PrimitiveValue::Integer(7))
    );
    let err = fx.produce("#/definitions/Small", json!(3)).unwrap_err();
    assert!(matches!(validation(err), ValidationError::Minimum { .. }));
}

#[test]
fn all_of_without_a_kind_is_under_specified() {
    let mut fx = Fixture::definitions(json!({
        "Vague": {"allOf": [{"description": "no type"}, {"title": "still none"}]}
    }));
    let err = fx.produce("#/definitions/Vague", json!("x")).unwrap_err();
    assert!(
        matches!(err, SwgError::Schema(SchemaError::UnderSpecifiedAllOf { .. })),
        "got {err:?}"
    );
}

#[test]
fn unknown_type_has_no_handler() {
    let mut fx = Fixture::definitions(json!({"Odd": {"type": "decimal"}}));
    let err = fx.produce("#/definitions/Odd", json!("1.0")).unwrap_err();
    assert!(matches!(err, SwgError::Schema(SchemaError::NoHandler { .. })), "got {err:?}");
}

#[test]
fn custom_handler_overrides_format() {
    let mut fx = Fixture::definitions(json!({"Addr": {"type": "string", "format": "ipv4"}}));
    fx.factory.register(
        "string",
        Some("ipv4"),
        Handler::new(|_, _, _, raw| {
            let text = raw.as_str().unwrap_or_default();
            if text.split('.').count() == 4 {
                Ok(PrimitiveValue::String(text.to_string()))
            } else {
                Err(ValidationError::Format {
                    format: "ipv4".to_string(),
                    value: text.to_string(),
                }
                .into())
            }
        }),
    );
    assert!(fx.produce("#/definitions/Addr", json!("10.0.0.1")).is_ok());
    assert!(fx.produce("#/definitions/Addr", json!("10.0.1")).is_err());

    // A fresh factory is unaffected.
    let mut other = Fixture::definitions(json!({"Addr": {"type": "string", "format": "ipv4"}}));
    assert!(other.produce("#/definitions/Addr", json!("10.0.1")).is_ok());
}

#[test]
fn string_formats() {
    let mut fx = Fixture::definitions(json!({
        "Email": {"type": "string", "format": "email"},
        "Id": {"type": "string", "format": "uuid"},
        "Blob": {"type": "string", "format": "byte"},
        "Day": {"type": "string", "format": "date"},
        "Code": {"type": "string", "pattern": "^[A-Z]{3}$", "minLength": 3}
    }));
    assert!(fx.produce("#/definitions/Email", json!("a@example.com")).is_ok());
    assert!(matches!(
        validation(fx.produce("#/definitions/Email", json!("nope")).unwrap_err()),
        ValidationError::Format { .. }
    ));
    assert!(fx
        .produce("#/definitions/Id", json!("67e55044-10b1-426f-9247-bb680e5fe0c8"))
        .is_ok());

    assert_eq!(
        fx.produce("#/definitions/Blob", json!("aGVsbG8=")).unwrap(),
        Some(PrimitiveValue::Byte(b"hello".to_vec()))
    );
    assert_eq!(
        fx.produce_as("#/definitions/Blob", Some(json!("hello")), Direction::Write)
            .unwrap()
            .map(|v| v.to_json()),
        Some(json!("aGVsbG8="))
    );

    assert_eq!(
        fx.produce("#/definitions/Day", json!("2024-02-29")).unwrap().map(|v| v.to_string()),
        Some("2024-02-29".to_string())
    );
    assert!(fx.produce("#/definitions/Code", json!("ABC")).is_ok());
    assert!(matches!(
        validation(fx.produce("#/definitions/Code", json!("abc")).unwrap_err()),
        ValidationError::Pattern { .. }
    ));
}

#[test]
fn numbers_coerce_and_check_ranges() {
    let mut fx = Fixture::definitions(json!({
        "Small": {"type": "integer", "format": "int32"},
        "Even": {"type": "integer", "multipleOf": 2},
        "Ratio": {"type": "number", "maximum": 1, "exclusiveMaximum": true},
        "Flag": {"type": "boolean"}
    }));
    assert_eq!(
        fx.produce("#/definitions/Small", json!("42")).unwrap(),
        Some(PrimitiveValue::Integer(42))
    );
    assert!(matches!(
        validation(fx.produce("#/definitions/Small", json!(5_000_000_000_i64)).unwrap_err()),
        ValidationError::Format { .. }
    ));
    assert!(matches!(
        validation(fx.produce("#/definitions/Even", json!(3)).unwrap_err()),
        ValidationError::MultipleOf { .. }
    ));
    assert!(matches!(
        validation(fx.produce("#/definitions/Ratio", json!(1.0)).unwrap_err()),
        ValidationError::Maximum { exclusive: true, .. }
    ));
    assert_eq!(
        fx.produce("#/definitions/Flag", json!("true")).unwrap(),
        Some(PrimitiveValue::Boolean(true))
    );
    assert!(matches!(
        validation(fx.produce("#/definitions/Flag", json!(1)).unwrap_err()),
        ValidationError::Type { .. }
    ));
}

#[test]
fn recursive_model_produces_nested_values() {
    let mut fx = Fixture::definitions(json!({
        "Node": {
            "type": "object",
            "properties": {
                "value": {"type": "string"},
                "next": {"$ref": "#/definitions/Node"}
            }
        }
    }));
    let value = fx
        .produce("#/definitions/Node", json!({"value": "a", "next": {"value": "b"}}))
        .unwrap()
        .unwrap();
    assert_eq!(value.to_json(), json!({"value": "a", "next": {"value": "b"}}));
}

#[test]
fn ssv_and_tsv_arrays_split_and_rejoin() {
    let mut fx = Fixture::definitions(json!({
        "Words": {"type": "array", "collectionFormat": "ssv", "items": {"type": "string"}},
        "Ids": {"type": "array", "collectionFormat": "tsv", "items": {"type": "integer"}}
    }));
    let words = fx.produce("#/definitions/Words", json!("red green blue")).unwrap().unwrap();
    assert_eq!(words.as_array().unwrap().len(), 3);
    assert_eq!(words.to_string(), "red green blue");

    let ids = fx.produce("#/definitions/Ids", json!("7\t8")).unwrap().unwrap();
    assert_eq!(
        ids.as_array().unwrap().items,
        vec![PrimitiveValue::Integer(7), PrimitiveValue::Integer(8)]
    );
    assert_eq!(
        ids.as_array().unwrap().to_wire("ids"),
        WireEncoding::Joined("7\t8".to_string())
    );
}

#[test]
fn array_length_bounds_are_inclusive() {
    let mut fx = Fixture::definitions(json!({
        "Ids": {"type": "array", "minItems": 2, "maxItems": 3, "items": {"type": "integer"}}
    }));
    assert!(matches!(
        validation(fx.produce("#/definitions/Ids", json!([1])).unwrap_err()),
        ValidationError::MinItems { count: 1, min_items: 2 }
    ));
    assert!(fx.produce("#/definitions/Ids", json!([1, 2])).is_ok());
    assert!(fx.produce("#/definitions/Ids", json!([1, 2, 3])).is_ok());
    assert!(matches!(
        validation(fx.produce("#/definitions/Ids", json!([1, 2, 3, 4])).unwrap_err()),
        ValidationError::MaxItems { count: 4, max_items: 3 }
    ));
}

#[test]
fn null_array_element_is_rejected() {
    let mut fx = Fixture::definitions(json!({
        "Ids": {"type": "array", "minItems": 3, "items": {"type": "integer"}}
    }));
    let err = fx.produce("#/definitions/Ids", json!([1, null, 3])).unwrap_err();
    match validation(err) {
        ValidationError::Type { found, .. } => assert_eq!(found, "null"),
        other => panic!("expected a type error, got {other:?}"),
    }
}

#[test]
fn null_array_element_takes_the_item_default() {
    let mut fx = Fixture::definitions(json!({
        "Ids": {"type": "array", "items": {"type": "integer", "default": 0}}
    }));
    let value = fx.produce("#/definitions/Ids", json!([1, null, 3])).unwrap().unwrap();
    assert_eq!(value.to_json(), json!([1, 0, 3]));
}

#[test]
fn string_length_bounds_are_inclusive() {
    let mut fx = Fixture::definitions(json!({
        "Code": {"type": "string", "minLength": 2, "maxLength": 4}
    }));
    assert!(matches!(
        validation(fx.produce("#/definitions/Code", json!("a")).unwrap_err()),
        ValidationError::MinLength { length: 1, min_length: 2 }
    ));
    assert!(fx.produce("#/definitions/Code", json!("ab")).is_ok());
    assert!(fx.produce("#/definitions/Code", json!("abcd")).is_ok());
    assert!(fx.produce("#/definitions/Code", json!("éèêë")).is_ok());
    assert!(matches!(
        validation(fx.produce("#/definitions/Code", json!("abcde")).unwrap_err()),
        ValidationError::MaxLength { length: 5, max_length: 4 }
    ));
}

#[test]
fn minimum_inclusive_and_exclusive() {
    let mut fx = Fixture::definitions(json!({
        "Count": {"type": "integer", "minimum": 1},
        "Positive": {"type": "number", "minimum": 0, "exclusiveMinimum": true}
    }));
    assert_eq!(
        fx.produce("#/definitions/Count", json!(1)).unwrap(),
        Some(PrimitiveValue::Integer(1))
    );
    assert!(matches!(
        validation(fx.produce("#/definitions/Count", json!(0)).unwrap_err()),
        ValidationError::Minimum { exclusive: false, .. }
    ));
    assert!(matches!(
        validation(fx.produce("#/definitions/Positive", json!(0)).unwrap_err()),
        ValidationError::Minimum { exclusive: true, .. }
    ));
    assert!(fx.produce("#/definitions/Positive", json!(0.5)).is_ok());
    assert!(matches!(
        validation(fx.produce("#/definitions/Positive", json!(-1)).unwrap_err()),
        ValidationError::Minimum { .. }
    ));
}

#[test]
fn free_form_object_keeps_every_key() {
    let mut fx = Fixture::definitions(json!({
        "Meta": {"type": "object"},
        "Pet": {
            "type": "object",
            "properties": {
                "name": {"type": "string"},
                "labels": {"type": "object"}
            }
        }
    }));
    let meta = fx.produce("#/definitions/Meta", json!({"a": 1, "b": "x"})).unwrap().unwrap();
    assert_eq!(meta.to_json(), json!({"a": 1, "b": "x"}));

    let pet = fx
        .produce(
            "#/definitions/Pet",
            json!({"name": "rex", "labels": {"team": "blue"}, "extra": true}),
        )
        .unwrap()
        .unwrap();
    assert_eq!(pet.to_json(), json!({"name": "rex", "labels": {"team": "blue"}}));
}
