//! Integration test: resolve references across documents on disk.
//!
//! Writes a small two-file API into a temporary directory and resolves
//! relative, absolute, and same-document references through the file
//! loader.

use std::fs;

use serde_json::json;
use swg_resolve::{file_url, FileLoader, ReferenceResolver};

fn write_api(dir: &std::path::Path) {
    fs::create_dir_all(dir.join("shared")).unwrap();
    fs::write(
        dir.join("api.yaml"),
        "swagger: '2.0'\n\
         paths:\n  /pets:\n    get:\n      responses:\n        200:\n          schema:\n            $ref: 'shared/models.json#/Pet'\n",
    )
    .unwrap();
    fs::write(
        dir.join("shared").join("models.json"),
        r#"{"Pet": {"type": "object", "properties": {"id": {"type": "integer"}}}}"#,
    )
    .unwrap();
}

#[test]
fn resolves_relative_document_reference() {
    let dir = tempfile::tempdir().unwrap();
    write_api(dir.path());
    let base = file_url(&dir.path().join("api.yaml")).unwrap();

    let mut resolver = ReferenceResolver::new(FileLoader);
    let reference = resolver
        .resolve("#/paths/~1pets/get/responses/200/schema/$ref", Some(base.as_str()))
        .unwrap()
        .as_str()
        .unwrap()
        .to_string();
    let pet = resolver.resolve(&reference, Some(base.as_str())).unwrap();
    assert_eq!(pet["properties"]["id"], json!({"type": "integer"}));
    assert_eq!(resolver.load_count(), 2);
}

#[test]
fn missing_sibling_document_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    write_api(dir.path());
    let base = file_url(&dir.path().join("api.yaml")).unwrap();

    let mut resolver = ReferenceResolver::new(FileLoader);
    let err = resolver
        .resolve("shared/absent.json#/Pet", Some(base.as_str()))
        .unwrap_err();
    assert!(err.to_string().contains("document not found"));
}

#[test]
fn absolute_path_reference_needs_no_base() {
    let dir = tempfile::tempdir().unwrap();
    write_api(dir.path());
    let models = dir.path().join("shared").join("models.json");

    let mut resolver = ReferenceResolver::new(FileLoader);
    let reference = format!("{}#/Pet/type", file_url(&models).unwrap());
    assert_eq!(resolver.resolve(&reference, None).unwrap(), &json!("object"));
}
