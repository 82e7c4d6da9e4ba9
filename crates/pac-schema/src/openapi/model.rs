//! Typed skeletons for the document versions `openapiv3` does not model.
//!
//! Swagger 2.0 is what Power Automate custom connectors are written in, so
//! its model covers operations and parameters. The OpenAPI 3.1 model only
//! pins down the top level; its schemas are JSON Schema 2020-12 and are
//! kept as raw values.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

/// The `info` object shared by every version.
#[derive(Debug, Clone, Deserialize)]
pub struct Info {
    pub title: String,
    pub version: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// A Swagger 2.0 document.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Swagger {
    /// Always `2.0`.
    pub swagger: String,
    pub info: Info,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub base_path: Option<String>,
    #[serde(default)]
    pub schemes: Vec<TransferScheme>,
    #[serde(default)]
    pub consumes: Vec<String>,
    #[serde(default)]
    pub produces: Vec<String>,
    /// Path templates, plus any `x-` extension keys.
    pub paths: BTreeMap<String, PathItem>,
    #[serde(default)]
    pub definitions: BTreeMap<String, Value>,
    #[serde(default)]
    pub parameters: BTreeMap<String, Parameter>,
    #[serde(default)]
    pub responses: BTreeMap<String, Value>,
    #[serde(default)]
    pub security_definitions: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferScheme {
    Http,
    Https,
    Ws,
    Wss,
}

/// A Swagger 2.0 path item.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathItem {
    #[serde(default, rename = "$ref")]
    pub reference: Option<String>,
    #[serde(default)]
    pub get: Option<Operation>,
    #[serde(default)]
    pub put: Option<Operation>,
    #[serde(default)]
    pub post: Option<Operation>,
    #[serde(default)]
    pub delete: Option<Operation>,
    #[serde(default)]
    pub options: Option<Operation>,
    #[serde(default)]
    pub head: Option<Operation>,
    #[serde(default)]
    pub patch: Option<Operation>,
    #[serde(default)]
    pub parameters: Vec<ParameterOrRef>,
}

/// A Swagger 2.0 operation. `responses` is required.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    #[serde(default)]
    pub operation_id: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub consumes: Vec<String>,
    #[serde(default)]
    pub produces: Vec<String>,
    #[serde(default)]
    pub parameters: Vec<ParameterOrRef>,
    pub responses: BTreeMap<String, Value>,
    #[serde(default)]
    pub deprecated: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ParameterOrRef {
    Reference {
        #[serde(rename = "$ref")]
        reference: String,
    },
    Parameter(Parameter),
}

/// A Swagger 2.0 parameter. `body` parameters carry a `schema`, all others
/// a primitive `type`.
#[derive(Debug, Clone, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub schema: Option<Value>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParameterLocation {
    Query,
    Header,
    Path,
    FormData,
    Body,
}

/// An OpenAPI 3.1 document. At least one of `paths`, `components` and
/// `webhooks` must be present; [`OpenApi31::is_empty`] reports when none is.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenApi31 {
    pub openapi: String,
    pub info: Info,
    #[serde(default)]
    pub json_schema_dialect: Option<String>,
    #[serde(default)]
    pub servers: Vec<Value>,
    #[serde(default)]
    pub paths: Option<BTreeMap<String, Value>>,
    #[serde(default)]
    pub components: Option<BTreeMap<String, Value>>,
    #[serde(default)]
    pub webhooks: Option<BTreeMap<String, Value>>,
}

impl OpenApi31 {
    pub fn is_empty(&self) -> bool {
        self.paths.is_none() && self.components.is_none() && self.webhooks.is_none()
    }
}
