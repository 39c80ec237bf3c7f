//! Reading baked secrets inside the deployed function.
//!
//! The manifest ships at the root of the artifact. Each entry is decoded from
//! base64 and decrypted with KMS, passing the parameter ARN as encryption
//! context (SSM encrypts `SecureString` parameters with that context).

mod kms;

pub use kms::KmsDecryptor;

use crate::error::RuntimeError;
use crate::secrets::{SecretManifest, SECRETS_FILE};
use async_trait::async_trait;
use base64::Engine;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Encryption context key SSM binds parameter ciphertexts to.
pub const PARAMETER_ARN_CONTEXT: &str = "PARAMETER_ARN";

/// Environment variable pointing at the unpacked artifact root.
pub const TASK_ROOT_ENV: &str = "LAMBDA_TASK_ROOT";

/// Decrypts ciphertext blobs under an encryption context.
#[async_trait]
pub trait KeyDecryptor: Send + Sync {
    async fn decrypt(
        &self,
        ciphertext: Vec<u8>,
        context: HashMap<String, String>,
    ) -> Result<Vec<u8>, RuntimeError>;
}

/// Manifest location: `$LAMBDA_TASK_ROOT/secret-baker-secrets.json`, or the
/// current directory when not running inside a function.
pub fn manifest_path_from_env() -> PathBuf {
    manifest_path_in(std::env::var_os(TASK_ROOT_ENV).map(PathBuf::from))
}

fn manifest_path_in(task_root: Option<PathBuf>) -> PathBuf {
    task_root
        .unwrap_or_else(|| PathBuf::from("."))
        .join(SECRETS_FILE)
}

/// Load and parse a baked manifest.
pub fn load_manifest(path: &Path) -> Result<SecretManifest, RuntimeError> {
    let raw = std::fs::read_to_string(path).map_err(|source| RuntimeError::ManifestRead {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| RuntimeError::ManifestParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Decrypt one secret from the manifest.
pub async fn decrypt_secret<D>(
    manifest: &SecretManifest,
    name: &str,
    decryptor: &D,
) -> Result<String, RuntimeError>
where
    D: KeyDecryptor + ?Sized,
{
    let entry = manifest
        .get(name)
        .ok_or_else(|| RuntimeError::MissingSecret(name.to_string()))?;

    let blob = base64::engine::general_purpose::STANDARD
        .decode(&entry.ciphertext)
        .map_err(|source| RuntimeError::Decode {
            name: name.to_string(),
            source,
        })?;

    let context = HashMap::from([(PARAMETER_ARN_CONTEXT.to_string(), entry.arn.clone())]);
    let plaintext = decryptor.decrypt(blob, context).await?;

    String::from_utf8(plaintext).map_err(|_| RuntimeError::Utf8(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::ResolvedSecret;
    use std::sync::Mutex;

    /// Echoes the ciphertext back and records the context it was given.
    #[derive(Default)]
    struct EchoDecryptor {
        seen: Mutex<Vec<HashMap<String, String>>>,
    }

    #[async_trait]
    impl KeyDecryptor for EchoDecryptor {
        async fn decrypt(
            &self,
            ciphertext: Vec<u8>,
            context: HashMap<String, String>,
        ) -> Result<Vec<u8>, RuntimeError> {
            self.seen.lock().unwrap().push(context);
            Ok(ciphertext)
        }
    }

    struct FailingDecryptor;

    #[async_trait]
    impl KeyDecryptor for FailingDecryptor {
        async fn decrypt(
            &self,
            _ciphertext: Vec<u8>,
            _context: HashMap<String, String>,
        ) -> Result<Vec<u8>, RuntimeError> {
            Err(RuntimeError::Decrypt("AccessDeniedException".into()))
        }
    }

    fn manifest(ciphertext: &str) -> SecretManifest {
        let mut manifest = SecretManifest::new();
        manifest.insert(
            "MY_SECRET",
            ResolvedSecret {
                ciphertext: ciphertext.into(),
                arn: "arn:aws:ssm:us-east-1:1:parameter/my-secret".into(),
            },
        );
        manifest
    }

    #[tokio::test]
    async fn decrypts_with_parameter_arn_context() {
        // "hunter2" in base64
        let manifest = manifest("aHVudGVyMg==");
        let decryptor = EchoDecryptor::default();

        let value = decrypt_secret(&manifest, "MY_SECRET", &decryptor)
            .await
            .unwrap();

        assert_eq!(value, "hunter2");
        let seen = decryptor.seen.lock().unwrap();
        assert_eq!(
            seen[0].get(PARAMETER_ARN_CONTEXT).map(String::as_str),
            Some("arn:aws:ssm:us-east-1:1:parameter/my-secret")
        );
    }

    #[tokio::test]
    async fn missing_secret() {
        let err = decrypt_secret(&manifest("aHVudGVyMg=="), "OTHER", &EchoDecryptor::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RuntimeError::MissingSecret(name) if name == "OTHER"));
    }

    #[tokio::test]
    async fn invalid_base64() {
        let err = decrypt_secret(&manifest("not base64!"), "MY_SECRET", &EchoDecryptor::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RuntimeError::Decode { .. }));
    }

    #[tokio::test]
    async fn decrypt_failure_propagates() {
        let err = decrypt_secret(&manifest("aHVudGVyMg=="), "MY_SECRET", &FailingDecryptor)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("AccessDeniedException"));
    }

    #[tokio::test]
    async fn non_utf8_plaintext() {
        // 0xff 0xfe
        let err = decrypt_secret(&manifest("//4="), "MY_SECRET", &EchoDecryptor::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RuntimeError::Utf8(_)));
    }

    #[test]
    fn manifest_path_defaults_to_current_dir() {
        assert_eq!(manifest_path_in(None), PathBuf::from(".").join(SECRETS_FILE));
        assert_eq!(
            manifest_path_in(Some(PathBuf::from("/var/task"))),
            PathBuf::from("/var/task/secret-baker-secrets.json")
        );
    }

    #[test]
    fn load_manifest_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SECRETS_FILE);
        std::fs::write(&path, r#"{"MY_SECRET":{"ciphertext":"c","arn":"a"}}"#).unwrap();

        let manifest = load_manifest(&path).unwrap();
        assert_eq!(manifest.get("MY_SECRET").unwrap().ciphertext, "c");
    }

    #[test]
    fn load_manifest_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SECRETS_FILE);
        assert!(matches!(
            load_manifest(&path),
            Err(RuntimeError::ManifestRead { .. })
        ));

        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            load_manifest(&path),
            Err(RuntimeError::ManifestParse { .. })
        ));
    }
}
