//! # JSON Schema Validation
//!
//! Opt-in validation backed by the `jsonschema` crate (Draft 2020-12).
//!
//! - [`compile_schema_entries`] checks that every entry of a connector
//!   schema document is itself a well-formed JSON Schema. Entries may
//!   reference each other with `#/schemas/<Name>`.
//! - [`JsonSchemaValidator`] validates a document (the plugin manifest)
//!   against a JSON Schema loaded from disk.
//!
//! ## Offline Resolution
//!
//! Remote `$ref`s are never fetched. The retriever installed on every
//! validator answers with a permissive schema that accepts anything.

use std::fmt;
use std::path::Path;

use jsonschema::{Retrieve, Uri, ValidationOptions, Validator};
use serde_json::Value;
use thiserror::Error;

use crate::document::load_document;

/// Retriever that answers every remote `$ref` with `{}`.
struct OfflineRetriever;

impl Retrieve for OfflineRetriever {
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        tracing::debug!(uri = uri.as_str(), "remote $ref replaced with permissive schema");
        Ok(serde_json::json!({}))
    }
}

/// Error during JSON Schema validation.
#[derive(Error, Debug)]
pub enum SchemaValidationError {
    /// The document did not conform to the schema.
    #[error("validation failed against schema '{schema_name}':\n{violations}")]
    ValidationFailed {
        /// Name of the schema that was validated against.
        schema_name: String,
        /// Structured list of individual violations.
        violations: ValidationViolations,
    },

    /// The schema file could not be loaded.
    #[error("schema load error for '{schema_name}': {reason}")]
    SchemaLoadError {
        /// Schema filename or identifier.
        schema_name: String,
        /// Reason the schema could not be loaded.
        reason: String,
    },

    /// The schema loaded but does not compile.
    #[error("validator build error for schema '{schema_name}': {reason}")]
    ValidatorBuildError {
        /// Schema filename or identifier.
        schema_name: String,
        /// Compiler message.
        reason: String,
    },

    /// One or more entries of a schema document are not valid JSON Schemas.
    #[error("schema definitions failed to compile:\n{violations}")]
    InvalidDefinitions {
        /// One violation per rejected entry.
        violations: ValidationViolations,
    },
}

/// A single violation with its location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// JSON Pointer to the violating node in the instance.
    pub instance_path: String,
    /// JSON Pointer within the schema that triggered the error, if any.
    pub schema_path: String,
    /// Human-readable description of the violation.
    pub message: String,
}

impl Violation {
    /// A violation with no schema location.
    pub fn at(instance_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            instance_path: instance_path.into(),
            schema_path: String::new(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_path.is_empty() {
            write!(f, "  (root): {}", self.message)
        } else {
            write!(f, "  {}: {}", self.instance_path, self.message)
        }
    }
}

/// Collection of violations, displayed one per line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationViolations {
    violations: Vec<Violation>,
}

impl ValidationViolations {
    /// Wrap a list of violations.
    pub fn new(violations: Vec<Violation>) -> Self {
        Self { violations }
    }

    /// Returns the number of violations.
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Returns true if there are no violations.
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Returns a slice of all violations.
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Consumes self and returns the inner Vec.
    pub fn into_inner(self) -> Vec<Violation> {
        self.violations
    }
}

impl fmt::Display for ValidationViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

/// Escape one JSON Pointer reference token (RFC 6901).
pub(crate) fn escape_pointer_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

fn build_options() -> ValidationOptions {
    let mut opts = jsonschema::options();
    opts.with_draft(jsonschema::Draft::Draft202012);
    opts.with_retriever(OfflineRetriever);
    opts
}

/// Compile every entry under `doc.schemas` as a JSON Schema.
///
/// Each entry is compiled as the target of a `$ref` from a synthetic root
/// that also carries the full `schemas` mapping, so `#/schemas/<Name>`
/// references between entries resolve. Returns the number of entries
/// compiled.
///
/// # Errors
///
/// Returns `SchemaLoadError` if `schemas` is not an object, and
/// `InvalidDefinitions` listing every entry that failed to compile.
pub fn compile_schema_entries(doc: &Value) -> Result<usize, SchemaValidationError> {
    let entries = doc
        .get("schemas")
        .and_then(Value::as_object)
        .ok_or_else(|| SchemaValidationError::SchemaLoadError {
            schema_name: "schemas".to_string(),
            reason: "\"schemas\" is not an object".to_string(),
        })?;

    let opts = build_options();
    let mut violations = Vec::new();

    for (name, entry) in entries {
        let token = escape_pointer_token(name);
        let mut defs = serde_json::Map::new();
        defs.insert(name.clone(), entry.clone());

        let root = serde_json::json!({
            "$defs": Value::Object(defs),
            "schemas": Value::Object(entries.clone()),
            "$ref": format!("#/$defs/{token}"),
        });

        if let Err(e) = opts.build(&root) {
            tracing::debug!(schema = %name, error = %e, "schema definition rejected");
            violations.push(Violation::at(format!("/schemas/{token}"), e.to_string()));
        }
    }

    if violations.is_empty() {
        Ok(entries.len())
    } else {
        Err(SchemaValidationError::InvalidDefinitions {
            violations: ValidationViolations::new(violations),
        })
    }
}

/// A compiled JSON Schema used to validate whole documents.
pub struct JsonSchemaValidator {
    schema_name: String,
    validator: Validator,
}

impl fmt::Debug for JsonSchemaValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonSchemaValidator")
            .field("schema_name", &self.schema_name)
            .finish_non_exhaustive()
    }
}

impl JsonSchemaValidator {
    /// Compile `schema`. `schema_name` labels errors and reports.
    pub fn new(
        schema_name: impl Into<String>,
        schema: &Value,
    ) -> Result<Self, SchemaValidationError> {
        let schema_name = schema_name.into();
        let validator = build_options().build(schema).map_err(|e| {
            SchemaValidationError::ValidatorBuildError {
                schema_name: schema_name.clone(),
                reason: e.to_string(),
            }
        })?;
        Ok(Self {
            schema_name,
            validator,
        })
    }

    /// Load a JSON or YAML schema file and compile it.
    pub fn from_file(path: &Path) -> Result<Self, SchemaValidationError> {
        let schema = load_document(path).map_err(|e| SchemaValidationError::SchemaLoadError {
            schema_name: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::new(path.display().to_string(), &schema)
    }

    /// Name used for this schema in errors.
    pub fn schema_name(&self) -> &str {
        &self.schema_name
    }

    /// Validate `instance`, collecting every violation.
    pub fn validate(&self, instance: &Value) -> Result<(), SchemaValidationError> {
        let violations: Vec<Violation> = self
            .validator
            .iter_errors(instance)
            .map(|e| Violation {
                instance_path: e.instance_path.to_string(),
                schema_path: e.schema_path.to_string(),
                message: e.to_string(),
            })
            .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(SchemaValidationError::ValidationFailed {
                schema_name: self.schema_name.clone(),
                violations: ValidationViolations::new(violations),
            })
        }
    }
}
