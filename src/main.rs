use anyhow::Context;
use clap::Parser;
use secret_baker::cli::{Cli, Commands, DescriptorOpts};
use secret_baker::config::{AwsSettings, Config};
use secret_baker::logging;
use secret_baker::runtime::{self, KmsDecryptor};
use secret_baker::secrets::{CachedRequester, SsmRequester};
use secret_baker::SecretBaker;
use std::path::PathBuf;
use tracing::info;

type Baker = SecretBaker<CachedRequester<SsmRequester>>;

async fn load_baker(opts: &DescriptorOpts) -> anyhow::Result<Baker> {
    let mut config = Config::load(opts.config.as_deref())?;
    if opts.skip_cleanup {
        config.custom.secret_baker.skip_cleanup = true;
    }

    info!(
        "Secret baker for service {}",
        config.service_name().unwrap_or("<unnamed>")
    );

    let requester = CachedRequester::new(SsmRequester::lazy(config.aws_settings()));
    Ok(SecretBaker::from_config(&config, requester))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    logging::init(cli.log_json);

    match cli.command {
        Commands::Package(opts) => {
            let baker = load_baker(&opts).await?;
            let outcome = baker.package_secrets().await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Commands::Cleanup(opts) => {
            let baker = load_baker(&opts).await?;
            baker.cleanup_package_secrets().await?;
        }
        Commands::Hook(opts) => {
            let baker = load_baker(&opts.descriptor).await?;
            let outcome = baker.run_hook(&opts.event).await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Commands::Show(opts) => {
            let config = Config::load(opts.config.as_deref())?;
            let references = secret_baker::secrets::normalize(
                config.provider.environment_secrets.as_ref(),
            )?;
            info!("{} secret(s) configured", references.len());
            println!("{}", serde_json::to_string_pretty(&references)?);
        }
        Commands::Decrypt(opts) => {
            let path = opts
                .manifest
                .map(PathBuf::from)
                .unwrap_or_else(runtime::manifest_path_from_env);
            let manifest = runtime::load_manifest(&path)?;

            let settings = AwsSettings {
                region: opts.region,
                profile: None,
            };
            let decryptor = KmsDecryptor::new(&settings.load().await);

            let value = runtime::decrypt_secret(&manifest, &opts.name, &decryptor)
                .await
                .with_context(|| format!("Failed to decrypt {}", opts.name))?;
            println!("{value}");
        }
        Commands::Version => {
            println!("secret-baker {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
