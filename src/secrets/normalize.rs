//! `environmentSecrets` shape parsing.
//!
//! The descriptor accepts three spellings of the same thing:
//!
//! ```yaml
//! environmentSecrets:            # mapping
//!   MY_SECRET: /app/my-secret
//! environmentSecrets:            # names
//!   - MY_SECRET
//! environmentSecrets:            # records
//!   - name: MY_SECRET
//!     path: /app/my-secret
//! ```
//!
//! All of them are parsed once into a [`SecretConfig`] and flattened into an
//! ordered list of [`SecretReference`]s.

use super::types::SecretReference;
use crate::error::{BakeError, Result};
use serde_json::Value;
use std::collections::HashMap;

/// The recognized shapes of the secret configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretConfig {
    /// Not configured.
    Absent,
    /// Sequence whose elements are names or `{name, path}` records.
    Sequence(Vec<SecretReference>),
    /// Name → path mapping, in descriptor order.
    Mapping(Vec<SecretReference>),
}

impl SecretConfig {
    /// Classify a raw configuration value.
    pub fn parse(raw: Option<&Value>) -> Result<Self> {
        match raw {
            None | Some(Value::Null) => Ok(Self::Absent),
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(idx, item)| parse_element(idx, item))
                .collect::<Result<Vec<_>>>()
                .map(Self::Sequence),
            Some(Value::Object(map)) => map
                .iter()
                .map(|(name, path)| match path {
                    Value::String(path) => Ok(SecretReference::new(name, path)),
                    other => Err(BakeError::Configuration(format!(
                        "path for '{name}' must be a string, got {}",
                        describe(other)
                    ))),
                })
                .collect::<Result<Vec<_>>>()
                .map(Self::Mapping),
            Some(other) => Err(BakeError::Configuration(format!(
                "expected a list or a mapping, got {}",
                describe(other)
            ))),
        }
    }

    /// Flatten into the canonical reference list.
    pub fn into_references(self) -> Result<Vec<SecretReference>> {
        let refs = match self {
            Self::Absent => return Ok(Vec::new()),
            Self::Sequence(refs) | Self::Mapping(refs) => refs,
        };
        dedupe(refs)
    }
}

/// Normalize a raw `environmentSecrets` value into `{name, path}` pairs.
///
/// An absent value yields no references. Any unrecognized shape is a
/// [`BakeError::Configuration`].
pub fn normalize(raw: Option<&Value>) -> Result<Vec<SecretReference>> {
    SecretConfig::parse(raw)?.into_references()
}

fn parse_element(idx: usize, item: &Value) -> Result<SecretReference> {
    match item {
        Value::String(name) => Ok(SecretReference::new(name, name)),
        Value::Object(record) => {
            let field = |key: &str| {
                record.get(key).and_then(Value::as_str).ok_or_else(|| {
                    BakeError::Configuration(format!(
                        "entry [{idx}] is missing a string '{key}' field"
                    ))
                })
            };
            Ok(SecretReference::new(field("name")?, field("path")?))
        }
        other => Err(BakeError::Configuration(format!(
            "entry [{idx}] must be a string or a {{name, path}} record, got {}",
            describe(other)
        ))),
    }
}

/// Reject empty or conflicting entries; collapse exact repeats.
fn dedupe(refs: Vec<SecretReference>) -> Result<Vec<SecretReference>> {
    let mut seen: HashMap<String, String> = HashMap::new();
    let mut out = Vec::with_capacity(refs.len());

    for secret_ref in refs {
        if secret_ref.name.is_empty() || secret_ref.path.is_empty() {
            return Err(BakeError::Configuration(format!(
                "secret name and path must be non-empty (name '{}', path '{}')",
                secret_ref.name, secret_ref.path
            )));
        }
        match seen.get(&secret_ref.name) {
            Some(path) if *path == secret_ref.path => continue,
            Some(path) => {
                return Err(BakeError::Configuration(format!(
                    "secret '{}' is mapped to both '{}' and '{}'",
                    secret_ref.name, path, secret_ref.path
                )));
            }
            None => {
                seen.insert(secret_ref.name.clone(), secret_ref.path.clone());
                out.push(secret_ref);
            }
        }
    }

    Ok(out)
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn pairs(refs: &[SecretReference]) -> Vec<(&str, &str)> {
        refs.iter()
            .map(|r| (r.name.as_str(), r.path.as_str()))
            .collect()
    }

    #[test]
    fn names_use_name_as_path() {
        let refs = normalize(Some(&json!(["MY_SECRET", "OTHER"]))).unwrap();
        assert_eq!(
            pairs(&refs),
            vec![("MY_SECRET", "MY_SECRET"), ("OTHER", "OTHER")]
        );
    }

    #[test]
    fn mapping_preserves_descriptor_order() {
        let raw: Value =
            serde_json::from_str(r#"{"ZED": "/z", "ALPHA": "/a", "MID": "/m"}"#).unwrap();
        let refs = normalize(Some(&raw)).unwrap();
        assert_eq!(
            pairs(&refs),
            vec![("ZED", "/z"), ("ALPHA", "/a"), ("MID", "/m")]
        );
    }

    #[test]
    fn records_pass_through() {
        let refs = normalize(Some(&json!([
            {"name": "MY_SECRET", "path": "/app/secret"},
            {"name": "CUSTOM", "path": "/custom/path"}
        ])))
        .unwrap();
        assert_eq!(
            pairs(&refs),
            vec![("MY_SECRET", "/app/secret"), ("CUSTOM", "/custom/path")]
        );
    }

    #[test]
    fn all_shapes_agree_on_the_same_secrets() {
        let from_names = normalize(Some(&json!(["A", "B"]))).unwrap();
        let from_map = normalize(Some(&json!({"A": "A", "B": "B"}))).unwrap();
        let from_records = normalize(Some(&json!([
            {"name": "A", "path": "A"},
            {"name": "B", "path": "B"}
        ])))
        .unwrap();

        assert_eq!(from_names, from_map);
        assert_eq!(from_map, from_records);
    }

    #[test]
    fn mixed_sequence_elements_are_accepted() {
        let refs = normalize(Some(&json!(["A", {"name": "B", "path": "/b"}]))).unwrap();
        assert_eq!(pairs(&refs), vec![("A", "A"), ("B", "/b")]);
    }

    #[test]
    fn absent_yields_nothing() {
        assert!(normalize(None).unwrap().is_empty());
        assert!(normalize(Some(&Value::Null)).unwrap().is_empty());
        assert_eq!(SecretConfig::parse(None).unwrap(), SecretConfig::Absent);
    }

    #[test]
    fn empty_collections_yield_nothing() {
        assert!(normalize(Some(&json!([]))).unwrap().is_empty());
        assert!(normalize(Some(&json!({}))).unwrap().is_empty());
    }

    #[test]
    fn scalar_is_a_configuration_error() {
        for raw in [json!(5), json!(true), json!("MY_SECRET")] {
            let err = normalize(Some(&raw)).unwrap_err();
            assert!(matches!(err, BakeError::Configuration(_)), "{raw}");
        }
    }

    #[test]
    fn mapping_with_non_string_path_is_rejected() {
        let err = normalize(Some(&json!({"A": 5}))).unwrap_err();
        assert!(err.to_string().contains("path for 'A'"));
    }

    #[test]
    fn record_missing_path_is_rejected() {
        let err = normalize(Some(&json!([{"name": "A"}]))).unwrap_err();
        assert!(matches!(err, BakeError::Configuration(_)));
        assert!(err.to_string().contains("'path'"));
    }

    #[test]
    fn sequence_of_numbers_is_rejected() {
        let err = normalize(Some(&json!([1, 2]))).unwrap_err();
        assert!(err.to_string().contains("entry [0]"));
    }

    #[test]
    fn exact_duplicates_collapse() {
        let refs = normalize(Some(&json!(["A", "A"]))).unwrap();
        assert_eq!(pairs(&refs), vec![("A", "A")]);
    }

    #[test]
    fn conflicting_duplicate_names_are_rejected() {
        let err = normalize(Some(&json!([
            {"name": "A", "path": "/one"},
            {"name": "A", "path": "/two"}
        ])))
        .unwrap_err();
        assert!(err.to_string().contains("mapped to both"));
    }

    #[test]
    fn empty_name_is_rejected() {
        assert!(normalize(Some(&json!([""]))).is_err());
        assert!(normalize(Some(&json!({"A": ""}))).is_err());
    }
}
