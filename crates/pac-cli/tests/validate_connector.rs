//! Integration test: end-to-end runs of the validation runner against the
//! fixture connector and broken copies of it.

use std::path::{Path, PathBuf};

use pac_cli::config::RunnerConfig;
use pac_cli::runner::{run_with, Console, ValidateArgs, EXIT_FAILURE, EXIT_SUCCESS};
use pac_cli::{MANIFEST_PATH, OPENAPI_PATH, SCHEMAS_PATH};
use pac_schema::StructuralValidator;

/// Find the repository root.
fn repo_root() -> PathBuf {
    let mut dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    dir.pop(); // crates/
    dir.pop(); // repo root
    dir
}

fn fixture_root() -> PathBuf {
    repo_root().join("fixtures/connector")
}

/// Copy the fixture connector into `dir` so tests can break it.
fn copy_fixture(dir: &Path) {
    for relative in [OPENAPI_PATH, SCHEMAS_PATH, MANIFEST_PATH] {
        let target = dir.join(relative);
        std::fs::create_dir_all(target.parent().unwrap()).unwrap();
        std::fs::copy(fixture_root().join(relative), &target).unwrap();
    }
}

fn run(config: &RunnerConfig) -> (u8, String, String) {
    let mut out = Vec::new();
    let mut err = Vec::new();
    let code = {
        let mut console = Console::new(&mut out, &mut err);
        run_with(config, &StructuralValidator::new(), &mut console).unwrap()
    };
    (
        code,
        String::from_utf8(out).unwrap(),
        String::from_utf8(err).unwrap(),
    )
}

#[test]
fn fixture_connector_passes() {
    let (code, stdout, stderr) = run(&RunnerConfig::for_root(fixture_root()));
    assert_eq!(code, EXIT_SUCCESS, "stderr:\n{stderr}");
    assert!(stdout.starts_with("Starting validation of Power Automate Connector..."));
    assert!(stdout.contains("API name: Power Automate"));
    assert!(stdout.contains("Version: 1.0.0"));
    assert!(stdout.trim_end().ends_with("✅ All validations passed!"));
}

#[test]
fn fixture_connector_passes_strict_mode() {
    let mut config = RunnerConfig::for_root(fixture_root());
    config.strict_schemas = true;
    let (code, _, stderr) = run(&config);
    assert_eq!(code, EXIT_SUCCESS, "stderr:\n{stderr}");
}

#[test]
fn broken_openapi_fails_the_run() {
    let dir = tempfile::tempdir().unwrap();
    copy_fixture(dir.path());
    let openapi = dir.path().join(OPENAPI_PATH);
    let text = std::fs::read_to_string(&openapi)
        .unwrap()
        .replace("\"operationId\": \"getFlow\"", "\"operationId\": \"listFlows\"");
    std::fs::write(&openapi, text).unwrap();

    let (code, stdout, stderr) = run(&RunnerConfig::for_root(dir.path()));
    assert_eq!(code, EXIT_FAILURE);
    assert!(stderr.contains("❌ OpenAPI validation failed:"));
    assert!(stderr.contains("duplicate operationId \"listFlows\""));
    assert!(stdout.contains("✅ Plugin manifest is valid"));
    assert!(stderr.contains("❌ Validation failed. Please fix the issues and try again."));
}

#[test]
fn empty_actions_fail_the_run() {
    let dir = tempfile::tempdir().unwrap();
    copy_fixture(dir.path());
    let manifest = dir.path().join(MANIFEST_PATH);
    let mut doc: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&manifest).unwrap()).unwrap();
    doc["actions"] = serde_json::json!([]);
    std::fs::write(&manifest, serde_json::to_string(&doc).unwrap()).unwrap();

    let (code, _, stderr) = run(&RunnerConfig::for_root(dir.path()));
    assert_eq!(code, EXIT_FAILURE);
    assert!(stderr.contains("\"actions\" must be a non-empty array"));
}

#[test]
fn missing_schemas_property_fails_the_run() {
    let dir = tempfile::tempdir().unwrap();
    copy_fixture(dir.path());
    std::fs::write(dir.path().join(SCHEMAS_PATH), b"{\"definitions\": {}}").unwrap();

    let (code, _, stderr) = run(&RunnerConfig::for_root(dir.path()));
    assert_eq!(code, EXIT_FAILURE);
    assert!(stderr.contains("Missing \"schemas\" property"));
}

#[test]
fn empty_directory_fails_every_check() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, stderr) = run(&RunnerConfig::for_root(dir.path()));
    assert_eq!(code, EXIT_FAILURE);
    assert!(!stdout.contains('✅'));
    assert!(stderr.contains("❌ OpenAPI validation failed:"));
    assert!(stderr.contains("❌ Schema validation failed:"));
    assert!(stderr.contains("❌ Manifest validation failed:"));
}

#[test]
fn repeated_runs_give_identical_results() {
    let config = RunnerConfig::for_root(fixture_root());
    assert_eq!(run(&config), run(&config));
}

#[test]
fn config_file_points_at_yaml_documents() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("connector");
    copy_fixture(&root);

    // Re-encode the manifest as YAML and point the config file at it.
    let manifest: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(root.join(MANIFEST_PATH)).unwrap()).unwrap();
    std::fs::write(
        root.join("src/declarative/manifest.yaml"),
        serde_yaml::to_string(&manifest).unwrap(),
    )
    .unwrap();
    std::fs::remove_file(root.join(MANIFEST_PATH)).unwrap();

    let config_path = dir.path().join("validate.yaml");
    std::fs::write(
        &config_path,
        "root: connector\nmanifest: src/declarative/manifest.yaml\nstrict_schemas: true\n",
    )
    .unwrap();

    let args = ValidateArgs {
        config: Some(config_path),
        ..ValidateArgs::default()
    };
    let config = RunnerConfig::from_args(&args).unwrap();
    assert_eq!(config.root, dir.path().join("connector"));
    assert!(config.strict_schemas);

    let (code, _, stderr) = run(&config);
    assert_eq!(code, EXIT_SUCCESS, "stderr:\n{stderr}");
}

#[test]
fn swagger_connector_sharing_the_schema_document_passes() {
    let dir = tempfile::tempdir().unwrap();
    copy_fixture(dir.path());
    let swagger = serde_json::json!({
        "swagger": "2.0",
        "info": {"title": "Power Automate", "version": "1.0.0"},
        "host": "api.flow.microsoft.com",
        "basePath": "/providers/Microsoft.ProcessSimple",
        "schemes": ["https"],
        "paths": {
            "/environments/{environmentId}/flows/{flowId}": {
                "get": {
                    "operationId": "getFlow",
                    "parameters": [
                        {"name": "environmentId", "in": "path", "required": true, "type": "string"},
                        {"name": "flowId", "in": "path", "required": true, "type": "string"}
                    ],
                    "responses": {
                        "200": {
                            "description": "OK",
                            "schema": {"$ref": "../schemas/schemas.json#/schemas/Flow"}
                        }
                    }
                }
            }
        }
    });
    std::fs::write(
        dir.path().join(OPENAPI_PATH),
        serde_json::to_vec_pretty(&swagger).unwrap(),
    )
    .unwrap();

    let (code, stdout, stderr) = run(&RunnerConfig::for_root(dir.path()));
    assert_eq!(code, EXIT_SUCCESS, "stderr:\n{stderr}");
    assert!(stdout.contains("✅ OpenAPI specification is valid"));
}
