//! Parameter store resolution and manifest file lifecycle.
//!
//! Looks up each reference in the parameter store, collects the ciphertexts
//! into a [`SecretManifest`] and writes it next to the service so the
//! packager picks it up. The file is removed again once packaging is done.

use super::store::ParameterRequest;
use super::types::{
    GetParameterRequest, RequestOptions, ResolvedSecret, SecretManifest, SecretReference,
    SECRETS_FILE,
};
use crate::error::{BakeError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Resolves secret references and owns the manifest file.
pub struct SecretResolver<R> {
    requester: R,
    manifest_path: PathBuf,
}

impl<R: ParameterRequest> SecretResolver<R> {
    /// Resolver writing `secret-baker-secrets.json` inside `base_dir`.
    pub fn new(requester: R, base_dir: impl AsRef<Path>) -> Self {
        Self {
            requester,
            manifest_path: base_dir.as_ref().join(SECRETS_FILE),
        }
    }

    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    pub fn requester(&self) -> &R {
        &self.requester
    }

    /// Fetch the ciphertext for one parameter.
    ///
    /// A "not found" rejection from the store resolves to `Ok(None)`; every
    /// other rejection is a [`BakeError::Transport`].
    pub async fn fetch_parameter(&self, path: &str) -> Result<Option<ResolvedSecret>> {
        let request = GetParameterRequest::ciphertext(path);

        match self
            .requester
            .get_parameter(&request, RequestOptions::cached())
            .await
        {
            Ok(output) => Ok(output.parameter.map(|p| ResolvedSecret {
                ciphertext: p.value,
                arn: p.arn,
            })),
            Err(failure) if failure.is_not_found() => {
                warn!(
                    "Parameter '{}' not found via {}: {}",
                    path,
                    self.requester.name(),
                    failure.message
                );
                Ok(None)
            }
            Err(failure) => {
                error!(
                    "{}.{} '{}' failed: {}",
                    request.service(),
                    request.operation(),
                    path,
                    failure
                );
                Err(BakeError::Transport {
                    message: failure.message,
                })
            }
        }
    }

    /// Resolve every reference, in order, failing on the first missing or
    /// unreachable secret.
    pub async fn resolve_all(&self, references: &[SecretReference]) -> Result<SecretManifest> {
        let mut manifest = SecretManifest::new();

        for secret_ref in references {
            debug!("Resolving secret '{}' from '{}'", secret_ref.name, secret_ref.path);

            let resolved = self
                .fetch_parameter(&secret_ref.path)
                .await?
                .ok_or_else(|| BakeError::SecretNotFound {
                    name: secret_ref.name.clone(),
                })?;

            manifest.insert(secret_ref.name.clone(), resolved);
        }

        info!("Resolved {} secret(s)", manifest.len());
        Ok(manifest)
    }

    /// Resolve all references and write the manifest, replacing any previous
    /// one. Nothing is written unless every reference resolves.
    pub async fn write_manifest(&self, references: &[SecretReference]) -> Result<PathBuf> {
        let manifest = self.resolve_all(references).await?;
        let json = manifest.to_json()?;

        tokio::fs::write(&self.manifest_path, json)
            .await
            .map_err(|e| BakeError::io(&self.manifest_path, e))?;

        debug!("Wrote {}", self.manifest_path.display());
        Ok(self.manifest_path.clone())
    }

    /// Delete the manifest if it exists. Returns whether a file was removed.
    pub async fn cleanup(&self) -> Result<bool> {
        let exists = tokio::fs::try_exists(&self.manifest_path)
            .await
            .map_err(|e| BakeError::io(&self.manifest_path, e))?;
        if !exists {
            return Ok(false);
        }

        tokio::fs::remove_file(&self.manifest_path)
            .await
            .map_err(|e| BakeError::io(&self.manifest_path, e))?;
        Ok(true)
    }
}
