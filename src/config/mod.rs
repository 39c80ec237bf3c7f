mod io;

pub use io::*;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// The parts of a serverless deployment descriptor the baker reads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Either a plain name or `{ name: ... }`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<serde_json::Value>,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub custom: CustomConfig,

    /// Directory holding the descriptor; artifact include paths are relative to it.
    #[serde(skip)]
    pub service_dir: PathBuf,

    /// Directory the manifest is written to.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

/// Region and profile for AWS clients. Nothing is resolved until [`load`](Self::load).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AwsSettings {
    pub region: Option<String>,
    pub profile: Option<String>,
}

impl AwsSettings {
    /// Build the SDK configuration, falling back to the ambient AWS
    /// environment for anything unset.
    pub async fn load(&self) -> aws_config::SdkConfig {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = &self.region {
            loader = loader.region(aws_config::Region::new(region.clone()));
        }
        if let Some(profile) = &self.profile {
            loader = loader.profile_name(profile);
        }
        loader.load().await
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    /// Raw secret configuration; shape is checked by `secrets::normalize`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment_secrets: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomConfig {
    #[serde(default)]
    pub secret_baker: SecretBakerOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretBakerOptions {
    /// Leave the manifest on disk after packaging (local debugging).
    #[serde(default)]
    pub skip_cleanup: bool,
}

impl Config {
    /// Load the descriptor from `path`, or from the current directory.
    ///
    /// A missing descriptor is not an error: the baker then runs with no
    /// secrets configured.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let descriptor = match path {
            Some(p) => Some(PathBuf::from(p)),
            None => find_descriptor(Path::new(".")),
        };

        let mut config = match &descriptor {
            Some(path) => {
                info!("Loading descriptor from {}", path.display());
                read_descriptor(path)?
            }
            None => {
                info!("No serverless descriptor found, using defaults");
                Config::default()
            }
        };

        config.service_dir = descriptor
            .as_deref()
            .and_then(Path::parent)
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        config.base_dir = config.service_dir.clone();

        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// The service name, if the descriptor declares one.
    pub fn service_name(&self) -> Option<&str> {
        match self.service.as_ref()? {
            serde_json::Value::String(name) => Some(name.as_str()),
            serde_json::Value::Object(map) => map.get("name").and_then(|v| v.as_str()),
            _ => None,
        }
    }

    /// AWS settings from the provider section.
    pub fn aws_settings(&self) -> AwsSettings {
        AwsSettings {
            region: self.provider.region.clone(),
            profile: self.provider.profile.clone(),
        }
    }

    /// Apply `SECRET_BAKER_*` overrides read through `var`.
    pub fn apply_env_overrides<F>(&mut self, var: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = var("SECRET_BAKER_SKIP_CLEANUP") {
            self.custom.secret_baker.skip_cleanup = parse_flag(&value)
                .with_context(|| format!("Invalid SECRET_BAKER_SKIP_CLEANUP '{value}'"))?;
        }

        if let Some(dir) = var("SECRET_BAKER_DIR") {
            self.base_dir = PathBuf::from(dir);
        }

        Ok(())
    }
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => anyhow::bail!("expected a boolean, got '{other}'"),
    }
}
