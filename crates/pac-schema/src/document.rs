//! # Document Loading
//!
//! Reads connector documents from disk into the JSON data model.
//!
//! Files ending in `.yaml` or `.yml` are parsed as YAML and converted to
//! JSON; everything else is parsed as JSON. YAML tags are dropped and
//! scalar map keys are stringified, so a YAML document and its JSON
//! equivalent produce the same `Value`.

use std::path::Path;

use serde_json::Value;
use thiserror::Error;

/// Error raised while reading or parsing a document.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The file could not be read.
    #[error("cannot read '{path}': {source}")]
    Read {
        /// Path of the document.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid JSON.
    #[error("invalid JSON in '{path}': {reason}")]
    InvalidJson {
        /// Path of the document.
        path: String,
        /// Parser message, including line and column.
        reason: String,
    },

    /// The file is not valid YAML, or uses YAML features JSON cannot hold.
    #[error("invalid YAML in '{path}': {reason}")]
    InvalidYaml {
        /// Path of the document.
        path: String,
        /// Parser or conversion message.
        reason: String,
    },
}

/// Serialization format of a document on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// JSON (the default for unknown extensions).
    Json,
    /// YAML (`.yaml` / `.yml`).
    Yaml,
}

impl DocumentFormat {
    /// Pick the format from a file extension, case-insensitively.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("yaml") | Some("yml") => Self::Yaml,
            _ => Self::Json,
        }
    }
}

/// Read and parse the document at `path`.
pub fn load_document(path: &Path) -> Result<Value, DocumentError> {
    let content = std::fs::read_to_string(path).map_err(|source| DocumentError::Read {
        path: path.display().to_string(),
        source,
    })?;

    tracing::debug!(path = %path.display(), bytes = content.len(), "read document");

    parse_document(&content, DocumentFormat::from_path(path), &path.display().to_string())
}

/// Parse document text in the given format. `label` names the source in errors.
pub fn parse_document(
    content: &str,
    format: DocumentFormat,
    label: &str,
) -> Result<Value, DocumentError> {
    match format {
        DocumentFormat::Json => {
            serde_json::from_str(content).map_err(|e| DocumentError::InvalidJson {
                path: label.to_string(),
                reason: e.to_string(),
            })
        }
        DocumentFormat::Yaml => {
            let yaml: serde_yaml::Value =
                serde_yaml::from_str(content).map_err(|e| DocumentError::InvalidYaml {
                    path: label.to_string(),
                    reason: e.to_string(),
                })?;
            yaml_to_json_value(&yaml).map_err(|reason| DocumentError::InvalidYaml {
                path: label.to_string(),
                reason,
            })
        }
    }
}

fn yaml_to_json_value(yaml: &serde_yaml::Value) -> Result<Value, String> {
    Ok(match yaml {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(*b),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                let f = n
                    .as_f64()
                    .ok_or_else(|| format!("unsupported YAML number: {n}"))?;
                serde_json::Number::from_f64(f)
                    .map(Value::Number)
                    .ok_or_else(|| format!("number {f} has no JSON representation"))?
            }
        }
        serde_yaml::Value::String(s) => Value::String(s.clone()),
        serde_yaml::Value::Sequence(seq) => Value::Array(
            seq.iter()
                .map(yaml_to_json_value)
                .collect::<Result<_, _>>()?,
        ),
        serde_yaml::Value::Mapping(map) => {
            let mut object = serde_json::Map::with_capacity(map.len());
            for (key, value) in map {
                let key = match key {
                    serde_yaml::Value::String(s) => s.clone(),
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    other => return Err(format!("map key {other:?} is not a scalar")),
                };
                object.insert(key, yaml_to_json_value(value)?);
            }
            Value::Object(object)
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json_value(&tagged.value)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn format_follows_extension() {
        assert_eq!(DocumentFormat::from_path(Path::new("a/openapi.yaml")), DocumentFormat::Yaml);
        assert_eq!(DocumentFormat::from_path(Path::new("a/openapi.YML")), DocumentFormat::Yaml);
        assert_eq!(DocumentFormat::from_path(Path::new("a/manifest.json")), DocumentFormat::Json);
        assert_eq!(DocumentFormat::from_path(Path::new("no_extension")), DocumentFormat::Json);
    }

    #[test]
    fn yaml_and_json_produce_the_same_value() {
        let yaml = r#"
id: com.example.flows
version: "1.0.0"
retries: 3
enabled: true
actions:
  - listFlows
  - getFlow
"#;
        let from_yaml = parse_document(yaml, DocumentFormat::Yaml, "inline").unwrap();
        assert_eq!(
            from_yaml,
            json!({
                "id": "com.example.flows",
                "version": "1.0.0",
                "retries": 3,
                "enabled": true,
                "actions": ["listFlows", "getFlow"]
            })
        );
    }

    #[test]
    fn yaml_numeric_keys_become_strings() {
        let value = parse_document("200: ok\n404: missing\n", DocumentFormat::Yaml, "inline").unwrap();
        assert_eq!(value["200"], "ok");
        assert_eq!(value["404"], "missing");
    }

    #[test]
    fn yaml_tags_are_dropped() {
        let value = parse_document("name: !custom flows\n", DocumentFormat::Yaml, "inline").unwrap();
        assert_eq!(value["name"], "flows");
    }

    #[test]
    fn invalid_json_reports_path() {
        let err = parse_document("{ not json", DocumentFormat::Json, "schemas.json").unwrap_err();
        assert!(matches!(err, DocumentError::InvalidJson { .. }));
        assert!(err.to_string().contains("schemas.json"));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_document(&dir.path().join("manifest.json")).unwrap_err();
        assert!(matches!(err, DocumentError::Read { .. }), "got: {err}");
    }

    #[test]
    fn load_document_reads_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.yaml");
        std::fs::write(&path, "name: Flows\n").unwrap();
        let value = load_document(&path).unwrap();
        assert_eq!(value, json!({"name": "Flows"}));
    }
}
