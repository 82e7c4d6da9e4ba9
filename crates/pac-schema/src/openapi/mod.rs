//! # OpenAPI Validation
//!
//! [`OpenApiValidator`] is the seam between the validation runner and
//! whatever library checks OpenAPI documents. The runner only needs the
//! document title and version back, or an error explaining the rejection.
//!
//! [`StructuralValidator`] is the built-in implementation:
//!
//! 1. The document must declare `swagger: "2.0"`, `openapi: 3.0.x` or
//!    `openapi: 3.1.x`.
//! 2. It must deserialize into the model for that version: `openapiv3` for
//!    3.0, the skeletons in [`model`] for Swagger 2.0 and 3.1.
//! 3. Semantic rules the models cannot express are checked on the raw
//!    document and reported together:
//!    - `info.title` is not empty;
//!    - every `$ref` resolves, including refs into sibling files;
//!    - `operationId` values are unique;
//!    - path template parameters and `in: path` parameters match, and
//!      path parameters are `required: true`;
//!    - no parameter list declares the same `(name, in)` pair twice;
//!    - Swagger 2.0 parameters declare a `schema` (body) or a `type`.

pub mod model;
mod refs;
mod rules;

use std::path::Path;

use serde_json::Value;
use thiserror::Error;

use crate::document::{load_document, DocumentError};
use crate::validate::{ValidationViolations, Violation};

use refs::References;

/// What a successful validation reports back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenApiSummary {
    /// `info.title`.
    pub title: String,
    /// `info.version`.
    pub version: String,
    /// The declared `swagger` or `openapi` version, e.g. `3.0.1`.
    pub openapi_version: String,
    /// Number of path templates under `paths`.
    pub path_count: usize,
    /// Number of operations across all paths.
    pub operation_count: usize,
}

/// Reasons an OpenAPI document is rejected.
#[derive(Error, Debug)]
pub enum OpenApiError {
    /// The file could not be read or parsed.
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// A `swagger` version other than 2.0.
    #[error("'{path}' declares unsupported Swagger version {version}; only 2.0 is supported")]
    UnsupportedSwagger {
        /// Path of the document.
        path: String,
        /// The declared `swagger` version.
        version: String,
    },

    /// Neither a `swagger` nor an `openapi` version string.
    #[error("'{path}' does not declare an \"openapi\" or \"swagger\" version")]
    MissingVersion {
        /// Path of the document.
        path: String,
    },

    /// An `openapi` version other than 3.0 or 3.1.
    #[error("'{path}' declares unsupported OpenAPI version {version}; supported are 2.0, 3.0 and 3.1")]
    UnsupportedVersion {
        /// Path of the document.
        path: String,
        /// The declared `openapi` version.
        version: String,
    },

    /// The document does not fit the object model of its version.
    #[error("'{path}' is not a valid OpenAPI document: {reason}")]
    Structure {
        /// Path of the document.
        path: String,
        /// Deserializer message.
        reason: String,
    },

    /// The document is well-formed but breaks semantic rules.
    #[error("'{path}' failed OpenAPI validation:\n{violations}")]
    Invalid {
        /// Path of the document.
        path: String,
        /// Every rule violation found.
        violations: ValidationViolations,
    },
}

/// Validates an OpenAPI document on disk.
pub trait OpenApiValidator {
    /// Validate the document at `path` and summarize it.
    fn validate(&self, path: &Path) -> Result<OpenApiSummary, OpenApiError>;
}

/// Document versions the built-in validator understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Dialect {
    Swagger2,
    OpenApi30,
    OpenApi31,
}

/// The fields of the version-specific model the summary needs.
struct Header {
    title: String,
    version: String,
    declared: String,
    path_count: usize,
}

/// Offline OpenAPI validator for Swagger 2.0, OpenAPI 3.0 and OpenAPI 3.1.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuralValidator;

impl StructuralValidator {
    /// Create a validator.
    pub fn new() -> Self {
        Self
    }

    /// Validate an already-parsed document. `label` names it in errors.
    /// Relative file references cannot be resolved and are reported.
    pub fn validate_value(&self, doc: &Value, label: &str) -> Result<OpenApiSummary, OpenApiError> {
        self.check(doc, label, None)
    }

    /// Validate an already-parsed document whose relative file references
    /// resolve against `base_dir`.
    pub fn validate_value_in(
        &self,
        doc: &Value,
        label: &str,
        base_dir: &Path,
    ) -> Result<OpenApiSummary, OpenApiError> {
        self.check(doc, label, Some(base_dir))
    }

    fn check(&self, doc: &Value, label: &str, base_dir: Option<&Path>) -> Result<OpenApiSummary, OpenApiError> {
        let dialect = dialect(doc, label)?;
        let header = parse_header(doc, dialect, label)?;
        tracing::debug!(label, version = %header.declared, "document structure accepted");

        let mut violations = Vec::new();
        if header.title.trim().is_empty() {
            violations.push(Violation::at("/info/title", "title must not be empty"));
        }
        let mut refs = References::new(base_dir);
        refs.check(doc, &mut violations);
        let operations = rules::collect_operations(doc);
        rules::check_operation_ids(&operations, &mut violations);
        rules::check_parameters(doc, &refs, dialect, &operations, &mut violations);

        if !violations.is_empty() {
            return Err(OpenApiError::Invalid {
                path: label.to_string(),
                violations: ValidationViolations::new(violations),
            });
        }

        Ok(OpenApiSummary {
            title: header.title,
            version: header.version,
            openapi_version: header.declared,
            path_count: header.path_count,
            operation_count: operations.len(),
        })
    }
}

impl OpenApiValidator for StructuralValidator {
    fn validate(&self, path: &Path) -> Result<OpenApiSummary, OpenApiError> {
        let doc = load_document(path)?;
        self.check(&doc, &path.display().to_string(), path.parent())
    }
}

fn dialect(doc: &Value, label: &str) -> Result<Dialect, OpenApiError> {
    if let Some(version) = doc.get("swagger") {
        let version = scalar_to_string(version);
        if version == "2.0" {
            return Ok(Dialect::Swagger2);
        }
        return Err(OpenApiError::UnsupportedSwagger {
            path: label.to_string(),
            version,
        });
    }

    let version = doc
        .get("openapi")
        .and_then(Value::as_str)
        .ok_or_else(|| OpenApiError::MissingVersion {
            path: label.to_string(),
        })?;
    let mut parts = version.split('.');
    match (parts.next(), parts.next()) {
        (Some("3"), Some("0")) => Ok(Dialect::OpenApi30),
        (Some("3"), Some("1")) => Ok(Dialect::OpenApi31),
        _ => Err(OpenApiError::UnsupportedVersion {
            path: label.to_string(),
            version: version.to_string(),
        }),
    }
}

fn parse_header(doc: &Value, dialect: Dialect, label: &str) -> Result<Header, OpenApiError> {
    let structure = |reason: String| OpenApiError::Structure {
        path: label.to_string(),
        reason,
    };

    match dialect {
        Dialect::Swagger2 => {
            let api: model::Swagger =
                serde_json::from_value(doc.clone()).map_err(|e| structure(e.to_string()))?;
            Ok(Header {
                path_count: count_templates(api.paths.keys()),
                title: api.info.title,
                version: api.info.version,
                declared: api.swagger,
            })
        }
        Dialect::OpenApi30 => {
            let api: openapiv3::OpenAPI =
                serde_json::from_value(doc.clone()).map_err(|e| structure(e.to_string()))?;
            Ok(Header {
                path_count: api.paths.paths.len(),
                title: api.info.title,
                version: api.info.version,
                declared: api.openapi,
            })
        }
        Dialect::OpenApi31 => {
            let api: model::OpenApi31 =
                serde_json::from_value(doc.clone()).map_err(|e| structure(e.to_string()))?;
            if api.is_empty() {
                return Err(structure(
                    "one of \"paths\", \"components\" or \"webhooks\" is required".to_string(),
                ));
            }
            Ok(Header {
                path_count: api.paths.as_ref().map_or(0, |paths| count_templates(paths.keys())),
                title: api.info.title,
                version: api.info.version,
                declared: api.openapi,
            })
        }
    }
}

/// Path templates start with `/`; anything else is an `x-` extension.
fn count_templates<'a>(keys: impl Iterator<Item = &'a String>) -> usize {
    keys.filter(|key| key.starts_with('/')).count()
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
