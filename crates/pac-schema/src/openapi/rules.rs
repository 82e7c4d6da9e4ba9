//! Semantic rules checked on the raw document after it parsed.

use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap, HashSet};

use serde_json::Value;

use super::refs::References;
use super::Dialect;
use crate::validate::{escape_pointer_token, Violation};

/// HTTP methods that may appear as operations in a path item.
const HTTP_METHODS: [&str; 8] = [
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

/// One operation found under `paths`.
pub(crate) struct Operation<'a> {
    template: &'a str,
    method: &'static str,
    path_item: &'a Value,
    operation: &'a Value,
}

impl Operation<'_> {
    fn pointer(&self) -> String {
        format!("/paths/{}/{}", escape_pointer_token(self.template), self.method)
    }
}

/// Operations under `paths`, skipping `x-` extension keys.
pub(crate) fn collect_operations(doc: &Value) -> Vec<Operation<'_>> {
    let Some(paths) = doc.get("paths").and_then(Value::as_object) else {
        return Vec::new();
    };
    let mut operations = Vec::new();
    for (template, path_item) in paths.iter().filter(|(key, _)| !key.starts_with("x-")) {
        for method in HTTP_METHODS {
            if let Some(operation) = path_item.get(method).filter(|op| op.is_object()) {
                operations.push(Operation {
                    template: template.as_str(),
                    method,
                    path_item,
                    operation,
                });
            }
        }
    }
    operations
}

pub(crate) fn check_operation_ids(operations: &[Operation<'_>], out: &mut Vec<Violation>) {
    let mut first_seen: HashMap<&str, String> = HashMap::new();
    for op in operations {
        let Some(id) = op.operation.get("operationId").and_then(Value::as_str) else {
            continue;
        };
        let here = op.pointer();
        match first_seen.entry(id) {
            Entry::Occupied(first) => out.push(Violation::at(
                format!("{here}/operationId"),
                format!(
                    "duplicate operationId \"{id}\" (first declared at {})",
                    first.get()
                ),
            )),
            Entry::Vacant(slot) => {
                slot.insert(here);
            }
        }
    }
}

/// Parameter names between braces in a path template, e.g. `/flows/{flowId}`.
pub(crate) fn template_parameters(template: &str) -> BTreeSet<&str> {
    let mut names = BTreeSet::new();
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else { break };
        names.insert(&after[..close]);
        rest = &after[close + 1..];
    }
    names
}

/// A parameter as declared in a list: index, name, location, and the
/// parameter object after following its `$ref`.
type Declared<'a> = (usize, &'a str, &'a str, &'a Value);

/// Resolvable parameters of a path item or operation. Unresolvable refs
/// are skipped; the reference walk already reported them.
fn parameter_list<'a>(doc: &'a Value, refs: &'a References, owner: &'a Value) -> Vec<Declared<'a>> {
    let Some(params) = owner.get("parameters").and_then(Value::as_array) else {
        return Vec::new();
    };
    params
        .iter()
        .enumerate()
        .filter_map(|(i, p)| {
            let p = match p.get("$ref").and_then(Value::as_str) {
                Some(reference) => refs.resolve(doc, None, reference).ok()?,
                None => p,
            };
            let name = p.get("name").and_then(Value::as_str)?;
            let location = p.get("in").and_then(Value::as_str)?;
            Some((i, name, location, p))
        })
        .collect()
}

fn check_duplicate_parameters(list: &[Declared<'_>], base: &str, out: &mut Vec<Violation>) {
    let mut seen = HashSet::new();
    for (i, name, location, _) in list {
        if !seen.insert((*name, *location)) {
            out.push(Violation::at(
                format!("{base}/parameters/{i}"),
                format!("duplicate {location} parameter \"{name}\""),
            ));
        }
    }
}

/// Swagger 2.0: `body` parameters need a `schema`, the rest a `type`.
fn check_swagger_parameter_types(list: &[Declared<'_>], base: &str, out: &mut Vec<Violation>) {
    for (i, name, location, param) in list {
        let (field, ok) = if *location == "body" {
            ("schema", param.get("schema").is_some())
        } else {
            ("type", param.get("type").and_then(Value::as_str).is_some())
        };
        if !ok {
            out.push(Violation::at(
                format!("{base}/parameters/{i}"),
                format!("{location} parameter \"{name}\" must declare a {field}"),
            ));
        }
    }
}

pub(crate) fn check_parameters(
    doc: &Value,
    refs: &References,
    dialect: Dialect,
    operations: &[Operation<'_>],
    out: &mut Vec<Violation>,
) {
    let mut checked_path_items = HashSet::new();

    for op in operations {
        let path_base = format!("/paths/{}", escape_pointer_token(op.template));
        let path_level = parameter_list(doc, refs, op.path_item);
        if checked_path_items.insert(op.template) {
            check_duplicate_parameters(&path_level, &path_base, out);
            if dialect == Dialect::Swagger2 {
                check_swagger_parameter_types(&path_level, &path_base, out);
            }
        }

        let op_base = op.pointer();
        let op_level = parameter_list(doc, refs, op.operation);
        check_duplicate_parameters(&op_level, &op_base, out);
        if dialect == Dialect::Swagger2 {
            check_swagger_parameter_types(&op_level, &op_base, out);
        }

        // Operation-level parameters override path-level ones with the same (name, in).
        let mut effective: HashMap<(&str, &str), (String, &Value)> = HashMap::new();
        for (i, name, location, p) in &path_level {
            effective.insert((*name, *location), (format!("{path_base}/parameters/{i}"), *p));
        }
        for (i, name, location, p) in &op_level {
            effective.insert((*name, *location), (format!("{op_base}/parameters/{i}"), *p));
        }

        let in_template = template_parameters(op.template);
        let mut declared = BTreeSet::new();
        let mut path_params: Vec<_> = effective
            .iter()
            .filter(|((_, location), _)| *location == "path")
            .collect();
        path_params.sort_by(|a, b| a.1 .0.cmp(&b.1 .0));

        for ((name, _), (pointer, param)) in path_params {
            declared.insert(*name);
            if !in_template.contains(name) {
                out.push(Violation::at(
                    pointer.clone(),
                    format!("path parameter \"{name}\" does not appear in \"{}\"", op.template),
                ));
            }
            if param.get("required").and_then(Value::as_bool) != Some(true) {
                out.push(Violation::at(
                    format!("{pointer}/required"),
                    format!("path parameter \"{name}\" must be required"),
                ));
            }
        }

        for name in in_template.difference(&declared) {
            out.push(Violation::at(
                op_base.clone(),
                format!("path parameter \"{name}\" is not declared"),
            ));
        }
    }
}
