use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "secret-baker",
    version,
    about = "Bake SSM parameter ciphertext into serverless deployment artifacts"
)]
pub struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true, env = "SECRET_BAKER_LOG_JSON")]
    pub log_json: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve secrets and write the manifest.
    Package(DescriptorOpts),
    /// Remove the manifest.
    Cleanup(DescriptorOpts),
    /// Run the actions bound to a lifecycle hook event.
    Hook(HookOpts),
    /// Print the configured secrets in canonical form.
    Show(DescriptorOpts),
    /// Decrypt a secret from a baked manifest.
    Decrypt(DecryptOpts),
    Version,
}

#[derive(Args)]
pub struct DescriptorOpts {
    /// Path to the serverless descriptor.
    #[arg(short, long, env = "SECRET_BAKER_CONFIG")]
    pub config: Option<String>,
    /// Leave the manifest on disk after packaging.
    #[arg(long)]
    pub skip_cleanup: bool,
}

#[derive(Args)]
pub struct HookOpts {
    #[command(flatten)]
    pub descriptor: DescriptorOpts,
    /// Hook event name, e.g. `before:package:createDeploymentArtifacts`.
    pub event: String,
}

#[derive(Args)]
pub struct DecryptOpts {
    /// Secret name as configured in `environmentSecrets`.
    pub name: String,
    /// Manifest path; defaults to `$LAMBDA_TASK_ROOT/secret-baker-secrets.json`.
    #[arg(short, long)]
    pub manifest: Option<String>,
    #[arg(short, long, env = "AWS_REGION")]
    pub region: Option<String>,
}
