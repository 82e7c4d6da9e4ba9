//! Integration test: the fixture connector under `fixtures/connector/`
//! passes every library-level check, including the strict ones.

use std::path::PathBuf;

use pac_schema::{
    check_manifest, check_schema_document, compile_schema_entries, load_document,
    OpenApiValidator, StructuralValidator,
};

/// Find the repository root.
fn repo_root() -> PathBuf {
    let mut dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    dir.pop(); // crates/
    dir.pop(); // repo root
    dir
}

fn declarative(relative: &str) -> PathBuf {
    repo_root()
        .join("fixtures/connector/src/declarative")
        .join(relative)
}

#[test]
fn fixture_openapi_is_valid() {
    let summary = StructuralValidator::new()
        .validate(&declarative("openapi/openapi.json"))
        .unwrap_or_else(|e| panic!("fixture OpenAPI rejected: {e}"));

    assert_eq!(summary.title, "Power Automate");
    assert_eq!(summary.version, "1.0.0");
    assert_eq!(summary.path_count, 4);
    assert_eq!(summary.operation_count, 4);
}

#[test]
fn fixture_schema_document_declares_flow_and_flow_run() {
    let doc = load_document(&declarative("schemas/schemas.json")).unwrap();
    check_schema_document(&doc).unwrap();
}

#[test]
fn fixture_schema_definitions_compile() {
    let doc = load_document(&declarative("schemas/schemas.json")).unwrap();
    let compiled = compile_schema_entries(&doc).unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(compiled, 2);
}

#[test]
fn fixture_manifest_is_complete() {
    let doc = load_document(&declarative("manifest.json")).unwrap();
    check_manifest(&doc).unwrap();
}

#[test]
fn fixture_actions_match_openapi_operations() {
    let manifest = load_document(&declarative("manifest.json")).unwrap();
    let openapi = load_document(&declarative("openapi/openapi.json")).unwrap();

    let mut operation_ids = Vec::new();
    for path_item in openapi["paths"].as_object().unwrap().values() {
        for op in path_item.as_object().unwrap().values() {
            if let Some(id) = op.get("operationId").and_then(|v| v.as_str()) {
                operation_ids.push(id);
            }
        }
    }

    for action in manifest["actions"].as_array().unwrap() {
        let id = action["id"].as_str().unwrap();
        assert!(
            operation_ids.contains(&id),
            "manifest action '{id}' has no matching operationId; known: {operation_ids:?}"
        );
    }
}
