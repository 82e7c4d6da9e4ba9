//! `$ref` resolution.
//!
//! Fragments are percent-decoded before they are used as JSON Pointers.
//! Relative file references resolve against the directory of the document
//! that contains them; each file is loaded once. Remote URLs are reported,
//! never fetched.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::document::load_document;
use crate::validate::{escape_pointer_token, Violation};

/// What a `$ref` points at.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Target {
    /// `#/pointer` in the referring document.
    Local(String),
    /// `schemas.json#/pointer` relative to the referring document.
    File { file: String, pointer: String },
    /// An absolute URL.
    Remote,
}

/// Split a reference into location and decoded JSON Pointer.
pub(crate) fn parse_reference(reference: &str) -> Result<Target, String> {
    let (location, fragment) = reference.split_once('#').unwrap_or((reference, ""));
    if location.contains("://") {
        return Ok(Target::Remote);
    }
    let pointer = decode(fragment)?;
    if location.is_empty() {
        return Ok(Target::Local(pointer));
    }
    Ok(Target::File {
        file: decode(location)?,
        pointer,
    })
}

fn decode(text: &str) -> Result<String, String> {
    urlencoding::decode(text)
        .map(|decoded| decoded.into_owned())
        .map_err(|e| format!("not valid UTF-8 once decoded: {e}"))
}

/// A `$ref` found while walking a document.
struct Site {
    /// `None` for the document under validation.
    document: Option<PathBuf>,
    pointer: String,
    reference: String,
}

impl Site {
    fn location(&self) -> String {
        match &self.document {
            None => format!("{}/$ref", self.pointer),
            Some(path) => format!("{}#{}/$ref", path.display(), self.pointer),
        }
    }
}

/// The documents reachable from the one under validation.
#[derive(Debug, Default)]
pub(crate) struct References {
    base: Option<PathBuf>,
    documents: HashMap<PathBuf, Value>,
    unreadable: HashMap<PathBuf, String>,
}

impl References {
    /// `base` is the directory of the document under validation, when it
    /// came from disk.
    pub(crate) fn new(base: Option<&Path>) -> Self {
        Self {
            base: base.map(Path::to_path_buf),
            ..Self::default()
        }
    }

    /// Check every `$ref` in `root` and in the files it reaches.
    pub(crate) fn check(&mut self, root: &Value, out: &mut Vec<Violation>) {
        let mut sites = Vec::new();
        collect_refs(root, None, &mut String::new(), &mut sites);

        let mut next = 0;
        while next < sites.len() {
            let site = &sites[next];
            next += 1;
            let Ok(Target::File { file, .. }) = parse_reference(&site.reference) else {
                continue;
            };
            let Some(path) = self.locate(site.document.as_deref(), &file) else {
                continue;
            };
            if self.documents.contains_key(&path) || self.unreadable.contains_key(&path) {
                continue;
            }
            match load_document(&path) {
                Ok(doc) => {
                    tracing::debug!(path = %path.display(), "loaded referenced document");
                    collect_refs(&doc, Some(&path), &mut String::new(), &mut sites);
                    self.documents.insert(path, doc);
                }
                Err(e) => {
                    self.unreadable.insert(path, e.to_string());
                }
            }
        }

        for site in &sites {
            if let Err(reason) = self.resolve(root, site.document.as_deref(), &site.reference) {
                out.push(Violation::at(site.location(), reason));
            }
        }
    }

    /// Resolve `reference` as written in `document` (`None` for `root`).
    /// Only files already loaded by [`References::check`] are consulted.
    pub(crate) fn resolve<'a>(
        &'a self,
        root: &'a Value,
        document: Option<&Path>,
        reference: &str,
    ) -> Result<&'a Value, String> {
        let unresolved = || format!("unresolved reference \"{reference}\"");
        let target = parse_reference(reference)
            .map_err(|e| format!("invalid reference \"{reference}\": {e}"))?;

        let (doc, pointer) = match target {
            Target::Local(pointer) => {
                let doc = match document {
                    None => root,
                    Some(path) => self.documents.get(path).ok_or_else(unresolved)?,
                };
                (doc, pointer)
            }
            Target::File { file, pointer } => {
                let path = self.locate(document, &file).ok_or_else(|| {
                    format!("relative reference \"{reference}\" needs the document's location to resolve")
                })?;
                if let Some(reason) = self.unreadable.get(&path) {
                    return Err(format!("cannot load reference \"{reference}\": {reason}"));
                }
                (self.documents.get(&path).ok_or_else(unresolved)?, pointer)
            }
            Target::Remote => {
                return Err(format!("remote reference \"{reference}\" cannot be checked offline"));
            }
        };
        doc.pointer(&pointer).ok_or_else(unresolved)
    }

    fn locate(&self, document: Option<&Path>, file: &str) -> Option<PathBuf> {
        let dir = match document {
            Some(path) => path.parent()?,
            None => self.base.as_deref()?,
        };
        let joined = dir.join(file);
        Some(joined.canonicalize().unwrap_or(joined))
    }
}

fn collect_refs(node: &Value, document: Option<&Path>, pointer: &mut String, out: &mut Vec<Site>) {
    match node {
        Value::Object(map) => {
            if let Some(Value::String(reference)) = map.get("$ref") {
                out.push(Site {
                    document: document.map(Path::to_path_buf),
                    pointer: pointer.clone(),
                    reference: reference.clone(),
                });
            }
            for (key, child) in map {
                let len = pointer.len();
                pointer.push('/');
                pointer.push_str(&escape_pointer_token(key));
                collect_refs(child, document, pointer, out);
                pointer.truncate(len);
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                let len = pointer.len();
                pointer.push('/');
                pointer.push_str(&i.to_string());
                collect_refs(child, document, pointer, out);
                pointer.truncate(len);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn references_are_classified() {
        assert_eq!(
            parse_reference("#/components/schemas/Flow"),
            Ok(Target::Local("/components/schemas/Flow".to_string()))
        );
        assert_eq!(
            parse_reference("schemas.json#/Flow"),
            Ok(Target::File {
                file: "schemas.json".to_string(),
                pointer: "/Flow".to_string()
            })
        );
        assert_eq!(
            parse_reference("shared/flow.yaml"),
            Ok(Target::File {
                file: "shared/flow.yaml".to_string(),
                pointer: String::new()
            })
        );
        assert_eq!(parse_reference("https://example.com/flow.json#/Flow"), Ok(Target::Remote));
    }

    #[test]
    fn fragments_are_percent_decoded() {
        assert_eq!(
            parse_reference("#/components/responses/Ok%20Resp"),
            Ok(Target::Local("/components/responses/Ok Resp".to_string()))
        );
        assert_eq!(
            parse_reference("#/paths/~1flows%7BflowId%7D"),
            Ok(Target::Local("/paths/~1flows{flowId}".to_string()))
        );
        assert!(parse_reference("#/bad%FF").is_err());
    }

    #[test]
    fn encoded_local_reference_resolves() {
        let doc = json!({"components": {"responses": {"Ok Resp": {"description": "OK"}}}});
        let refs = References::new(None);
        let found = refs.resolve(&doc, None, "#/components/responses/Ok%20Resp").unwrap();
        assert_eq!(found["description"], "OK");
    }

    #[test]
    fn sibling_files_are_loaded_once_and_checked() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("schemas.json"),
            r##"{"Flow": {"type": "object"}, "FlowRun": {"$ref": "#/Flow"}, "Broken": {"$ref": "#/Nope"}}"##,
        )
        .unwrap();
        let doc = json!({
            "a": {"$ref": "schemas.json#/Flow"},
            "b": {"$ref": "schemas.json#/FlowRun"}
        });

        let mut refs = References::new(Some(dir.path()));
        let mut out = Vec::new();
        refs.check(&doc, &mut out);

        assert_eq!(refs.documents.len(), 1);
        assert_eq!(out.len(), 1, "got: {out:?}");
        assert!(out[0].instance_path.ends_with("schemas.json#/Broken/$ref"));
        assert!(out[0].message.contains("#/Nope"));
    }

    #[test]
    fn reference_cycles_between_files_terminate() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.json"), r#"{"x": {"$ref": "./b.json#/y"}}"#).unwrap();
        std::fs::write(dir.path().join("b.json"), r#"{"y": {"$ref": "./a.json#/x"}}"#).unwrap();
        let doc = json!({"$ref": "a.json#/x"});

        let mut refs = References::new(Some(dir.path()));
        let mut out = Vec::new();
        refs.check(&doc, &mut out);
        assert!(out.is_empty(), "got: {out:?}");
        assert_eq!(refs.documents.len(), 2);
    }
}
