//! # pac-schema — Connector Document Validation
//!
//! Validates the three declarative artifacts of a Power Automate connector:
//! the OpenAPI specification, the schema document, and the plugin manifest.
//!
//! ## Document Loading (`document`)
//!
//! [`load_document`] reads a JSON or YAML file (chosen by extension) into a
//! `serde_json::Value`. Every check in this crate operates on that value.
//!
//! ## OpenAPI Validation (`openapi`)
//!
//! The [`OpenApiValidator`] trait is the narrow seam the CLI depends on.
//! [`StructuralValidator`] implements it for Swagger 2.0, OpenAPI 3.0 (the
//! `openapiv3` model) and OpenAPI 3.1, plus reference, `operationId`, and
//! path-parameter checks. Relative `$ref`s are followed into sibling files.
//!
//! ## Shape Checks (`shape`)
//!
//! Presence checks for the schema document (`schemas.Flow`,
//! `schemas.FlowRun`) and the manifest (seven required properties and a
//! non-empty `actions` array).
//!
//! ## JSON Schema Validation (`validate`)
//!
//! Opt-in checks backed by the `jsonschema` crate: compiling every entry of
//! the schema document, and validating the manifest against a JSON Schema.
//!
//! ## Crate Policy
//!
//! - No network access. Remote `$ref`s are reported, never fetched.
//! - Checks are pure reads; nothing is cached between calls.

pub mod document;
pub mod openapi;
pub mod shape;
pub mod validate;

pub use document::{load_document, DocumentError, DocumentFormat};
pub use openapi::{OpenApiError, OpenApiSummary, OpenApiValidator, StructuralValidator};
pub use shape::{
    check_manifest, check_schema_document, is_present, ShapeViolation,
    REQUIRED_MANIFEST_PROPERTIES, REQUIRED_SCHEMAS,
};
pub use validate::{
    compile_schema_entries, JsonSchemaValidator, SchemaValidationError, ValidationViolations,
    Violation,
};
