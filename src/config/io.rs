use super::Config;
use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

/// Maximum size for a deployment descriptor (10 MB).
pub const MAX_DESCRIPTOR_BYTES: u64 = 10 * 1024 * 1024;

/// Descriptor file names, in lookup order.
pub const DESCRIPTOR_CANDIDATES: [&str; 5] = [
    "serverless.yml",
    "serverless.yaml",
    "serverless.json",
    "serverless.json5",
    "serverless.toml",
];

/// Find the deployment descriptor in `dir`.
pub fn find_descriptor(dir: &Path) -> Option<PathBuf> {
    DESCRIPTOR_CANDIDATES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

/// Read and parse a deployment descriptor.
pub fn read_descriptor(path: &Path) -> Result<Config> {
    let metadata = std::fs::metadata(path)
        .with_context(|| format!("Cannot stat descriptor '{}'", path.display()))?;

    if metadata.len() > MAX_DESCRIPTOR_BYTES {
        bail!(
            "Descriptor '{}' is {} bytes, exceeds limit of {} bytes",
            path.display(),
            metadata.len(),
            MAX_DESCRIPTOR_BYTES,
        );
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read descriptor '{}'", path.display()))?;
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("yml");

    parse_descriptor(&content, ext)
        .with_context(|| format!("Failed to parse descriptor '{}'", path.display()))
}

/// Parse descriptor text according to its file extension.
pub fn parse_descriptor(content: &str, ext: &str) -> Result<Config> {
    let config = match ext {
        "toml" => toml::from_str(content)?,
        "json" | "json5" => {
            // Try JSON5 first, then regular JSON for the better error message.
            match json5::from_str(content) {
                Ok(config) => config,
                Err(_) => serde_json::from_str(content)?,
            }
        }
        _ => serde_yaml::from_str(content)?,
    };

    Ok(config)
}
