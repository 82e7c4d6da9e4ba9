//! # Shape Checks
//!
//! Presence checks for the schema document and the plugin manifest.
//!
//! A property is present when its value is truthy: anything other than
//! `null`, `false`, `0`, or `""`. Objects and arrays are always present,
//! even when empty. The first failing check is reported; later checks are
//! not evaluated.

use serde_json::Value;
use thiserror::Error;

/// Schemas every connector schema document must declare, in check order.
pub const REQUIRED_SCHEMAS: [&str; 2] = ["Flow", "FlowRun"];

/// Properties every plugin manifest must declare, in check order.
pub const REQUIRED_MANIFEST_PROPERTIES: [&str; 7] = [
    "id",
    "name",
    "version",
    "description",
    "publisher",
    "endpoints",
    "actions",
];

/// A required property is missing or has the wrong shape.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShapeViolation {
    /// The schema document has no `schemas` mapping.
    #[error("Missing \"schemas\" property")]
    MissingSchemasProperty,

    /// A required schema is absent from `schemas`.
    #[error("Missing required schema \"{0}\"")]
    MissingSchema(String),

    /// A required manifest property is absent.
    #[error("Missing required property \"{0}\"")]
    MissingManifestProperty(String),

    /// `actions` is present but not an array with at least one entry.
    #[error("\"actions\" must be a non-empty array")]
    ActionsNotNonEmptyArray,
}

/// Returns true if `value` exists and is truthy.
pub fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// Check that `doc.schemas` declares every name in [`REQUIRED_SCHEMAS`].
pub fn check_schema_document(doc: &Value) -> Result<(), ShapeViolation> {
    let schemas = match doc.get("schemas") {
        Some(schemas) if is_present(Some(schemas)) => schemas,
        _ => return Err(ShapeViolation::MissingSchemasProperty),
    };

    for required in REQUIRED_SCHEMAS {
        if !is_present(schemas.get(required)) {
            return Err(ShapeViolation::MissingSchema(required.to_string()));
        }
    }
    Ok(())
}

/// Check that the manifest declares every property in
/// [`REQUIRED_MANIFEST_PROPERTIES`] and at least one action.
pub fn check_manifest(doc: &Value) -> Result<(), ShapeViolation> {
    for required in REQUIRED_MANIFEST_PROPERTIES {
        if !is_present(doc.get(required)) {
            return Err(ShapeViolation::MissingManifestProperty(required.to_string()));
        }
    }

    match doc.get("actions") {
        Some(Value::Array(actions)) if !actions.is_empty() => Ok(()),
        _ => Err(ShapeViolation::ActionsNotNonEmptyArray),
    }
}
