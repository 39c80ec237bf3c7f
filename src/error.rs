//! Error taxonomy for secret baking and runtime decryption.

use std::path::PathBuf;
use thiserror::Error;

/// Failures raised while normalizing, resolving, or writing secrets.
#[derive(Error, Debug)]
pub enum BakeError {
    /// `environmentSecrets` is present but is not a recognized shape.
    #[error("Invalid environmentSecrets configuration: {0}")]
    Configuration(String),

    /// The parameter store rejected the request for a reason other than "not found".
    #[error("{message}")]
    Transport { message: String },

    /// A configured secret does not exist in the parameter store.
    #[error("Unable to load Secret {name}")]
    SecretNotFound { name: String },

    #[error("Failed to access manifest '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize manifest: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl BakeError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Failures raised by the deployed artifact when reading the baked manifest.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Failed to read manifest '{}': {source}", .path.display())]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Manifest '{}' is not valid JSON: {source}", .path.display())]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Secret {0} is not present in the manifest")]
    MissingSecret(String),

    #[error("Ciphertext for secret {name} is not valid base64: {source}")]
    Decode {
        name: String,
        #[source]
        source: base64::DecodeError,
    },

    #[error("KMS decrypt failed: {0}")]
    Decrypt(String),

    #[error("Decrypted value for secret {0} is not valid UTF-8")]
    Utf8(String),
}

pub type Result<T> = std::result::Result<T, BakeError>;
