//! YAML translation documents.
//!
//! A document is a (possibly nested) mapping. Nested mappings flatten into
//! dot-joined keys, except mappings whose keys are all plural categories and
//! include `other`: those are read as the plural forms of a single entry.
//! A legitimately nested group that happens to use only category-shaped
//! names is misread as plural forms.

use crate::error::{StoreError, StoreResult};
use lingua_types::{PluralCategory, PluralForms, Translation};
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;

/// Header written at the top of every generated file.
pub const GENERATED_HEADER: &str = "\
# Generated by lingua. Source-language files are edited by hand;
# files of other languages are rewritten on every sync.
";

/// The value of one flattened key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlatValue {
    Text(String),
    Plural(PluralForms),
}

impl FlatValue {
    /// Builds the value carried by a translation.
    #[must_use]
    pub fn of(translation: &Translation) -> Self {
        match &translation.plural_forms {
            Some(forms) => FlatValue::Plural(forms.clone()),
            None => FlatValue::Text(translation.text.clone()),
        }
    }

    /// Builds a translation for `(namespace, key, language)`.
    #[must_use]
    pub fn into_translation(self, namespace: &str, key: &str, language: &str) -> Translation {
        match self {
            FlatValue::Text(text) => Translation::new(namespace, key, language, text),
            FlatValue::Plural(forms) => Translation::plural(namespace, key, language, forms),
        }
    }
}

/// Flattened `key → value` pairs of one document, keys without file prefix.
pub type FlatDocument = BTreeMap<String, FlatValue>;

/// Parses a document into flattened pairs.
///
/// Empty documents and documents holding only comments parse as empty.
pub fn parse(file: &str, contents: &str) -> StoreResult<FlatDocument> {
    let value: Value = serde_yaml::from_str(contents).map_err(|e| StoreError::yaml(file, e))?;
    let mut out = FlatDocument::new();
    match value {
        Value::Null => {}
        Value::Mapping(mapping) => flatten_mapping("", &mapping, &mut out),
        _ => {
            return Err(StoreError::Malformed {
                file: file.to_string(),
                reason: "top level must be a mapping".into(),
            });
        }
    }
    Ok(out)
}

/// Parses a document into translations, prepending `prefix` to every key.
pub fn parse_entries(
    file: &str,
    contents: &str,
    namespace: &str,
    language: &str,
    prefix: &str,
) -> StoreResult<Vec<Translation>> {
    Ok(parse(file, contents)?
        .into_iter()
        .map(|(key, value)| value.into_translation(namespace, &format!("{prefix}{key}"), language))
        .collect())
}

/// Flattens a YAML value that is already parsed, e.g. from an archive.
#[must_use]
pub fn flatten_value(value: &Value) -> FlatDocument {
    let mut out = FlatDocument::new();
    if let Value::Mapping(mapping) = value {
        flatten_mapping("", mapping, &mut out);
    }
    out
}

fn flatten_mapping(prefix: &str, mapping: &Mapping, out: &mut FlatDocument) {
    for (k, v) in mapping {
        let Some(segment) = scalar_text(k) else {
            continue;
        };
        let key = if prefix.is_empty() {
            segment
        } else {
            format!("{prefix}.{segment}")
        };
        match v {
            Value::Mapping(inner) => match plural_forms(inner) {
                Some(forms) => {
                    out.insert(key, FlatValue::Plural(forms));
                }
                None => flatten_mapping(&key, inner, out),
            },
            Value::Sequence(items) => {
                let lines: Vec<String> = items.iter().filter_map(scalar_text).collect();
                out.insert(key, FlatValue::Text(lines.join("\n")));
            }
            Value::Null => {}
            other => {
                if let Some(text) = scalar_text(other) {
                    out.insert(key, FlatValue::Text(text));
                }
            }
        }
    }
}

/// Returns the plural forms if `mapping` looks like a plural block.
fn plural_forms(mapping: &Mapping) -> Option<PluralForms> {
    if mapping.is_empty() {
        return None;
    }
    let mut forms = BTreeMap::new();
    for (k, v) in mapping {
        let name = k.as_str()?;
        let category: PluralCategory = name.parse().ok()?;
        forms.insert(category, scalar_text(v)?);
    }
    PluralForms::new(forms).ok()
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => scalar_text(&tagged.value),
        _ => None,
    }
}

enum Node {
    Leaf(Value),
    Branch(BTreeMap<String, Node>),
}

impl Node {
    fn into_value(self) -> Value {
        match self {
            Node::Leaf(value) => value,
            Node::Branch(children) => Value::Mapping(
                children
                    .into_iter()
                    .map(|(k, v)| (Value::String(k), v.into_value()))
                    .collect(),
            ),
        }
    }
}

fn leaf(value: &FlatValue) -> Value {
    match value {
        FlatValue::Text(text) => Value::String(text.clone()),
        FlatValue::Plural(forms) => Value::Mapping(
            forms
                .iter()
                .map(|(category, text)| {
                    (
                        Value::String(category.as_str().to_string()),
                        Value::String(text.to_string()),
                    )
                })
                .collect(),
        ),
    }
}

/// Inserts `key` into the tree, keeping the unsplit remainder as a dotted
/// key wherever a leaf and a group would otherwise collide.
fn insert(tree: &mut BTreeMap<String, Node>, key: &str, value: Value) {
    let Some((head, rest)) = key.split_once('.') else {
        // A branch here would mean a longer key came first.
        if !matches!(tree.get(key), Some(Node::Branch(_))) {
            tree.insert(key.to_string(), Node::Leaf(value));
        }
        return;
    };
    if head.is_empty() || rest.is_empty() {
        tree.insert(key.to_string(), Node::Leaf(value));
        return;
    }
    if matches!(tree.get(head), Some(Node::Leaf(_))) {
        tree.insert(key.to_string(), Node::Leaf(value));
        return;
    }
    if let Node::Branch(children) = tree
        .entry(head.to_string())
        .or_insert_with(|| Node::Branch(BTreeMap::new()))
    {
        insert(children, rest, value);
    }
}

/// Renders flattened pairs as a nested document with the generated header.
pub fn render(file: &str, document: &FlatDocument) -> StoreResult<String> {
    let mut tree = BTreeMap::new();
    // Sorted order puts every key before the keys it prefixes.
    for (key, value) in document {
        insert(&mut tree, key, leaf(value));
    }

    let body = if tree.is_empty() {
        String::new()
    } else {
        serde_yaml::to_string(&Node::Branch(tree).into_value())
            .map_err(|e| StoreError::yaml(file, e))?
    };
    Ok(format!("{GENERATED_HEADER}{body}"))
}

/// Renders translations, stripping `prefix` from each key.
pub fn render_entries(file: &str, prefix: &str, entries: &[Translation]) -> StoreResult<String> {
    let document: FlatDocument = entries
        .iter()
        .map(|e| {
            let key = e.key.strip_prefix(prefix).unwrap_or(&e.key).to_string();
            (key, FlatValue::of(e))
        })
        .collect();
    render(file, &document)
}
