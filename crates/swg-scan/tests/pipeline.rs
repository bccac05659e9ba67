//! Integration tests: the standard pipeline over whole documents, in memory
//! and on disk.

use std::fs;

use serde_json::{json, Value};
use swg_core::{NodeData, NodeId, OperationPatch, ParameterLocation, SchemaError, SwgError};
use swg_primitive::Direction;
use swg_resolve::MemoryLoader;
use swg_scan::{ScanConfig, SwaggerApp};

const ROOT: &str = "mem://api/root.json";

fn load(doc: Value) -> Result<SwaggerApp, SwgError> {
    load_with(doc, ScanConfig::default())
}

fn load_with(doc: Value, config: ScanConfig) -> Result<SwaggerApp, SwgError> {
    SwaggerApp::load(ROOT, MemoryLoader::new().with(ROOT, doc), config)
}

fn patch_of(app: &SwaggerApp, op: NodeId) -> OperationPatch {
    match &app.graph().node(op).data {
        NodeData::Operation(op) => op.patch.clone().expect("operation is patched"),
        other => panic!("expected an operation, got {other:?}"),
    }
}

fn messages(app: &SwaggerApp) -> Vec<String> {
    app.report()
        .diagnostics
        .iter()
        .map(|d| d.message.clone())
        .collect()
}

fn pets_api() -> Value {
    json!({
        "swagger": "2.0",
        "host": "api.example.com",
        "basePath": "/v1/",
        "schemes": ["https"],
        "consumes": ["application/json"],
        "produces": ["application/json"],
        "paths": {
            "/pets/{id}": {
                "parameters": [
                    {"name": "id", "in": "path", "required": true, "type": "string"},
                    {"name": "limit", "in": "query", "type": "string"}
                ],
                "get": {
                    "operationId": "getPet",
                    "produces": ["application/xml"],
                    "parameters": [
                        {"name": "limit", "in": "query", "type": "integer"}
                    ],
                    "responses": {
                        "200": {
                            "description": "the pet",
                            "schema": {"$ref": "#/definitions/Pet"}
                        }
                    }
                }
            }
        },
        "definitions": {
            "Pet": {
                "type": "object",
                "required": ["name"],
                "properties": {
                    "name": {"type": "string"},
                    "age": {"type": "integer", "minimum": 0}
                }
            }
        }
    })
}

#[test]
fn operations_are_patched_from_root_defaults() {
    let app = load(pets_api()).unwrap();
    assert!(app.report().is_clean(), "{:?}", app.report());

    let op = app.operation("getPet").expect("getPet exists");
    let patch = patch_of(&app, op);
    assert_eq!(patch.path, "/pets/{id}");
    assert_eq!(patch.url, "https://api.example.com/v1/pets/{id}");
    assert_eq!(patch.schemes, vec!["https"]);
    assert_eq!(patch.consumes, vec!["application/json"]);
    assert_eq!(patch.produces, vec!["application/xml"]);

    let params: Vec<(String, ParameterLocation, Option<String>)> = patch
        .parameters
        .iter()
        .map(|id| match &app.graph().node(*id).data {
            NodeData::Parameter(p) => (
                p.name.clone().unwrap_or_default(),
                p.location.unwrap_or(ParameterLocation::Query),
                p.fields.type_.clone(),
            ),
            other => panic!("expected a parameter, got {other:?}"),
        })
        .collect();
    assert_eq!(
        params,
        vec![
            ("id".to_string(), ParameterLocation::Path, Some("string".to_string())),
            ("limit".to_string(), ParameterLocation::Query, Some("integer".to_string())),
        ]
    );
}

#[test]
fn missing_host_and_scheme_fall_back() {
    let app = load(json!({
        "swagger": "2.0",
        "paths": {"/ping": {"get": {"operationId": "ping", "responses": {}}}}
    }))
    .unwrap();
    let op = app.operation("ping").unwrap();
    assert_eq!(patch_of(&app, op).url, "http://localhost/ping");
    assert!(app.operation("pong").is_none());
}

#[test]
fn resolve_and_produce_through_the_app() {
    let mut app = load(pets_api()).unwrap();
    let pet = app.resolve("#/definitions/Pet").unwrap();

    let value = app
        .produce(pet, Some(&json!({"name": "Tom", "age": 3})), Direction::Read)
        .unwrap()
        .expect("a model");
    assert_eq!(value.to_json(), json!({"name": "Tom", "age": 3}));

    let err = app
        .produce(pet, Some(&json!({"name": "Tom", "age": -1})), Direction::Read)
        .unwrap_err();
    assert!(matches!(err, SwgError::Validation(_)), "{err:?}");
}

fn broken_api() -> Value {
    json!({
        "swagger": "2.0",
        "paths": {
            "/pets/{id}": {
                "parameters": [{"name": "id", "in": "path", "type": "string"}],
                "post": {
                    "operationId": "addPet",
                    "parameters": [
                        {"name": "a", "in": "body", "schema": {"type": "object"}},
                        {"name": "b", "in": "body", "schema": {"type": "object"}}
                    ],
                    "responses": {}
                },
                "put": {"operationId": "addPet", "responses": {}}
            }
        },
        "definitions": {
            "Tags": {"type": "array"}
        }
    })
}

#[test]
fn structural_problems_become_diagnostics() {
    let app = load(broken_api()).unwrap();
    let found = messages(&app);

    assert!(found.contains(&"path parameter must be required".to_string()), "{found:?}");
    assert!(found.contains(&"more than one body parameter".to_string()), "{found:?}");
    assert!(found.contains(&"array type without items".to_string()), "{found:?}");
    assert_eq!(
        found
            .iter()
            .filter(|m| m.as_str() == "duplicate operationId \"addPet\"")
            .count(),
        2
    );
    assert!(!app.report().is_clean());

    let tags = app
        .report()
        .diagnostics
        .iter()
        .find(|d| d.message == "array type without items")
        .unwrap();
    assert_eq!(tags.location, format!("{ROOT}#/definitions/Tags"));
}

#[test]
fn validation_can_be_disabled() {
    let config = ScanConfig {
        validate: false,
        ..ScanConfig::default()
    };
    let app = load_with(broken_api(), config).unwrap();
    assert!(app.report().is_clean());
}

#[test]
fn strict_mode_rejects_documents_with_diagnostics() {
    let config = ScanConfig {
        strict: true,
        ..ScanConfig::default()
    };
    let err = load_with(broken_api(), config).unwrap_err();
    match err {
        SwgError::Schema(SchemaError::Rejected { count, .. }) => assert!(count >= 4),
        other => panic!("expected a rejection, got {other:?}"),
    }
}

#[test]
fn recursive_models_are_reported_but_clean() {
    let config = ScanConfig {
        strict: true,
        ..ScanConfig::default()
    };
    let app = load_with(
        json!({
            "swagger": "2.0",
            "definitions": {
                "Node": {
                    "type": "object",
                    "properties": {
                        "value": {"type": "string"},
                        "next": {"$ref": "#/definitions/Node"}
                    }
                }
            }
        }),
        config,
    )
    .unwrap();

    assert!(app.report().is_clean());
    assert_eq!(
        app.report().cycles,
        vec![vec![format!("{ROOT}#/definitions/Node")]]
    );
}

#[test]
fn broken_reference_aborts_the_load() {
    let err = load(json!({
        "swagger": "2.0",
        "definitions": {"Pet": {"$ref": "#/definitions/Missing"}}
    }))
    .unwrap_err();
    assert!(matches!(err, SwgError::Resolution(_)), "{err:?}");
}

#[test]
fn redeclared_parent_property_aborts_the_load() {
    let err = load(json!({
        "swagger": "2.0",
        "definitions": {
            "Pet": {"type": "object", "properties": {"name": {"type": "string"}}},
            "Dog": {
                "allOf": [
                    {"$ref": "#/definitions/Pet"},
                    {"properties": {"name": {"type": "string"}}}
                ]
            }
        }
    }))
    .unwrap_err();
    assert!(
        matches!(err, SwgError::Schema(SchemaError::Redeclared { ref property, .. }) if property == "name"),
        "{err:?}"
    );
}

#[test]
fn load_hooks_redirect_foreign_documents() {
    let mut config = ScanConfig::default();
    config.load_hooks.insert(
        "https://schemas.example.com/".to_string(),
        "mem://mirror/".to_string(),
    );
    let doc = json!({
        "swagger": "2.0",
        "definitions": {
            "Pet": {"$ref": "https://schemas.example.com/pet.json#/Pet"}
        }
    });
    let loader = MemoryLoader::new().with(ROOT, doc).with(
        "mem://mirror/pet.json",
        json!({"Pet": {"type": "object", "properties": {"name": {"type": "string"}}}}),
    );
    let mut app = SwaggerApp::load(ROOT, loader, config).unwrap();

    let pet = app.resolve("#/definitions/Pet").unwrap();
    let value = app
        .produce(pet, Some(&json!({"name": "Rex"})), Direction::Read)
        .unwrap()
        .unwrap();
    assert_eq!(value.to_json(), json!({"name": "Rex"}));
}

#[test]
fn yaml_documents_load_from_disk_with_relative_refs() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("api.yaml"),
        r##"
swagger: "2.0"
info:
  title: pets
  version: "1"
paths:
  /pets:
    get:
      operationId: listPets
      responses:
        "200":
          description: ok
          schema:
            type: array
            items:
              $ref: "#/definitions/Pet"
definitions:
  Pet:
    $ref: "pet.yaml"
"##,
    )
    .unwrap();
    fs::write(
        dir.path().join("pet.yaml"),
        r#"
type: object
required: [name]
properties:
  name:
    type: string
"#,
    )
    .unwrap();

    let mut app = SwaggerApp::load_path(&dir.path().join("api.yaml"), ScanConfig::default()).unwrap();
    assert!(app.report().is_clean(), "{:?}", app.report());
    assert_eq!(app.url().scheme(), "file");

    let pet = app.resolve("#/definitions/Pet").unwrap();
    let err = app
        .produce(pet, Some(&json!({})), Direction::Read)
        .unwrap_err();
    assert!(matches!(err, SwgError::Validation(_)), "{err:?}");

    let op = app.operation("listPets").unwrap();
    assert_eq!(patch_of(&app, op).url, "http://localhost/pets");
}
