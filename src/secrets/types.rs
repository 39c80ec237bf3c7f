//! Core types for secret baking.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// File name of the manifest baked into the deployment artifact.
pub const SECRETS_FILE: &str = "secret-baker-secrets.json";

// ============================================================================
// References
// ============================================================================

/// A named pointer to a parameter in the remote store.
///
/// `name` becomes the manifest key (and the env var name the application
/// looks the secret up by); `path` is the parameter store lookup key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SecretReference {
    pub name: String,
    pub path: String,
}

impl SecretReference {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

// ============================================================================
// Manifest
// ============================================================================

/// Ciphertext and key identifier for one secret, as written to the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedSecret {
    pub ciphertext: String,
    pub arn: String,
}

/// Secret name → resolved ciphertext.
///
/// Backed by a sorted map so that serializing the same secrets always yields
/// the same bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretManifest {
    entries: BTreeMap<String, ResolvedSecret>,
}

impl SecretManifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, secret: ResolvedSecret) {
        self.entries.insert(name.into(), secret);
    }

    pub fn get(&self, name: &str) -> Option<&ResolvedSecret> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Compact JSON, the on-disk manifest format.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

// ============================================================================
// Store boundary
// ============================================================================

/// A `getParameter` call against the parameter store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GetParameterRequest {
    pub name: String,
    pub with_decryption: bool,
}

impl GetParameterRequest {
    /// Request for the raw (still encrypted) value of `name`.
    pub fn ciphertext(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            with_decryption: false,
        }
    }

    pub fn service(&self) -> &'static str {
        "SSM"
    }

    pub fn operation(&self) -> &'static str {
        "getParameter"
    }
}

/// Per-call options for the request capability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestOptions {
    pub use_cache: bool,
}

impl RequestOptions {
    pub fn cached() -> Self {
        Self { use_cache: true }
    }
}

/// A parameter as returned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Parameter {
    pub value: String,
    #[serde(rename = "ARN")]
    pub arn: String,
}

/// Successful `getParameter` response. `parameter` is `None` when the store
/// answered without a usable parameter body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetParameterOutput {
    pub parameter: Option<Parameter>,
}

/// Status code the store uses for a missing parameter.
pub const NOT_FOUND_STATUS: u16 = 400;

/// A rejected store request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreFailure {
    /// HTTP status of the store response, `0` when no response was received.
    pub status_code: u16,
    pub message: String,
}

impl StoreFailure {
    pub fn new(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            status_code,
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status_code == NOT_FOUND_STATUS
    }
}

impl std::fmt::Display for StoreFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (status {})", self.message, self.status_code)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn manifest_serializes_name_keyed_object() {
        let mut manifest = SecretManifest::new();
        manifest.insert(
            "MY_SECRET",
            ResolvedSecret {
                ciphertext: "CIPHER".into(),
                arn: "ARN1".into(),
            },
        );

        assert_eq!(
            manifest.to_json().unwrap(),
            r#"{"MY_SECRET":{"ciphertext":"CIPHER","arn":"ARN1"}}"#
        );
    }

    #[test]
    fn manifest_output_independent_of_insertion_order() {
        let secret = |c: &str| ResolvedSecret {
            ciphertext: c.into(),
            arn: "arn".into(),
        };
        let mut a = SecretManifest::new();
        a.insert("B", secret("2"));
        a.insert("A", secret("1"));
        let mut b = SecretManifest::new();
        b.insert("A", secret("1"));
        b.insert("B", secret("2"));

        assert_eq!(a.to_json().unwrap(), b.to_json().unwrap());
        assert_eq!(a.names().collect::<Vec<_>>(), vec!["A", "B"]);
    }

    #[test]
    fn manifest_parses_back_from_disk_format() {
        let json = r#"{"X":{"ciphertext":"c","arn":"a"}}"#;
        let manifest: SecretManifest = serde_json::from_str(json).unwrap();
        assert_eq!(manifest.len(), 1);
        assert_eq!(manifest.get("X").unwrap().arn, "a");
    }

    #[test]
    fn parameter_output_uses_store_field_names() {
        let output: GetParameterOutput =
            serde_json::from_str(r#"{"Parameter":{"Value":"v","ARN":"arn:aws:ssm:x"}}"#)
                .unwrap();
        let parameter = output.parameter.unwrap();
        assert_eq!(parameter.value, "v");
        assert_eq!(parameter.arn, "arn:aws:ssm:x");
    }

    #[test]
    fn ciphertext_request_disables_decryption() {
        let request = GetParameterRequest::ciphertext("/app/key");
        assert!(!request.with_decryption);
        assert_eq!(request.service(), "SSM");
        assert_eq!(request.operation(), "getParameter");
    }

    #[test]
    fn store_failure_not_found_is_400_only() {
        assert!(StoreFailure::new(400, "missing").is_not_found());
        assert!(!StoreFailure::new(500, "boom").is_not_found());
        assert!(!StoreFailure::new(0, "dispatch").is_not_found());
    }
}
