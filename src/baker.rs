//! The packaging plugin: wires lifecycle hooks to secret resolution.

use crate::config::{Config, SecretBakerOptions};
use crate::error::{BakeError, Result};
use crate::hooks::{HookAction, HookRegistry, LifecycleHook};
use crate::secrets::{normalize, ParameterRequest, SecretReference, SecretResolver, SECRETS_FILE};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Result of running one lifecycle hook.
///
/// Instead of editing the host's package include list, hooks report the files
/// that must be bundled into the artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HookOutcome {
    /// Paths to add to the artifact: relative to the service directory, or
    /// absolute when the file lives outside it.
    pub include: Vec<String>,
    /// Whether a manifest file was deleted.
    pub removed: bool,
}

impl HookOutcome {
    fn merge(&mut self, other: HookOutcome) {
        for file in other.include {
            if !self.include.contains(&file) {
                self.include.push(file);
            }
        }
        self.removed |= other.removed;
    }
}

/// Bakes configured secrets into the deployment package.
pub struct SecretBaker<R> {
    resolver: SecretResolver<R>,
    service_dir: PathBuf,
    secrets: Option<serde_json::Value>,
    options: SecretBakerOptions,
    hooks: HookRegistry,
}

impl<R: ParameterRequest> SecretBaker<R> {
    pub fn new(
        requester: R,
        base_dir: impl AsRef<Path>,
        secrets: Option<serde_json::Value>,
        options: SecretBakerOptions,
    ) -> Self {
        Self {
            service_dir: base_dir.as_ref().to_path_buf(),
            resolver: SecretResolver::new(requester, base_dir),
            secrets,
            options,
            hooks: HookRegistry::packaging_defaults(),
        }
    }

    /// Build a baker from a loaded descriptor.
    pub fn from_config(config: &Config, requester: R) -> Self {
        let baker = Self::new(
            requester,
            &config.base_dir,
            config.provider.environment_secrets.clone(),
            config.custom.secret_baker.clone(),
        );
        if config.service_dir.as_os_str().is_empty() {
            baker
        } else {
            baker.with_service_dir(&config.service_dir)
        }
    }

    /// Directory the artifact include paths are relative to. Defaults to the
    /// manifest directory.
    pub fn with_service_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.service_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn resolver(&self) -> &SecretResolver<R> {
        &self.resolver
    }

    /// The configured secrets in canonical form.
    pub fn references(&self) -> Result<Vec<SecretReference>> {
        normalize(self.secrets.as_ref())
    }

    /// Run the actions registered for a hook event name. Events the baker does
    /// not listen to are ignored.
    pub async fn run_hook(&self, event: &str) -> Result<HookOutcome> {
        match event.parse::<LifecycleHook>() {
            Ok(hook) => self.run(hook).await,
            Err(_) => {
                debug!("Ignoring unhandled hook '{event}'");
                Ok(HookOutcome::default())
            }
        }
    }

    /// Run the actions registered for `hook`, in order.
    pub async fn run(&self, hook: LifecycleHook) -> Result<HookOutcome> {
        let mut outcome = HookOutcome::default();
        for action in self.hooks.actions(hook) {
            debug!("Running {action:?} for {hook}");
            let step = match action {
                HookAction::Package => self.package_secrets().await?,
                HookAction::Cleanup => self.cleanup_package_secrets().await?,
            };
            outcome.merge(step);
        }
        Ok(outcome)
    }

    /// Resolve every configured secret and write the manifest.
    pub async fn package_secrets(&self) -> Result<HookOutcome> {
        info!("Serverless Secrets beginning packaging process");

        let references = self.references()?;
        let written = self.resolver.write_manifest(&references).await?;

        Ok(HookOutcome {
            include: vec![self.include_path(&written)?],
            removed: false,
        })
    }

    fn include_path(&self, written: &Path) -> Result<String> {
        let file = std::path::absolute(written).map_err(|e| BakeError::io(written, e))?;
        let service_dir = std::path::absolute(&self.service_dir)
            .map_err(|e| BakeError::io(&self.service_dir, e))?;

        let include = match file.strip_prefix(&service_dir) {
            Ok(relative) => relative.to_path_buf(),
            Err(_) => file,
        };
        Ok(include.to_string_lossy().into_owned())
    }

    /// Remove the manifest unless `skipCleanup` is set.
    pub async fn cleanup_package_secrets(&self) -> Result<HookOutcome> {
        if self.options.skip_cleanup {
            warn!(
                "Skipping cleanup, {} remains at {}",
                SECRETS_FILE,
                self.resolver.manifest_path().display()
            );
            return Ok(HookOutcome::default());
        }

        info!("Cleaning up {SECRETS_FILE}");
        let removed = self.resolver.cleanup().await?;
        Ok(HookOutcome {
            include: Vec::new(),
            removed,
        })
    }
}
