//! LDAP Token Sync
//!
//! One-shot operator tool that copies an Authentik outpost's LDAP token into
//! AWS Secrets Manager. Account and region come from the local AWS CLI, the
//! admin API token from Secrets Manager, the LDAP token from the Authentik
//! API.
//!
//! ## Usage
//! ```bash
//! ldap-token-sync --env prod --authurl https://auth.example.com
//!
//! # Against a non-default AWS profile, for a non-default outpost
//! ldap-token-sync --env dev --authurl https://auth.dev.example.com \
//!   --profile sandbox --outpost LDAP
//! ```

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use ldap_token_sync::authentik::{AuthentikClient, DEFAULT_OUTPOST};
use ldap_token_sync::context::ExecutionContext;
use ldap_token_sync::secrets::SecretStore;

/// Sync an Authentik outpost token into AWS Secrets Manager
#[derive(Parser, Debug)]
#[command(name = "ldap-token-sync")]
#[command(about = "Sync an Authentik outpost LDAP token into AWS Secrets Manager", long_about = None)]
#[command(version)]
struct Cli {
    /// Deployment environment (e.g. dev, prod)
    #[arg(long = "env")]
    environment: String,

    /// Base URL of the Authentik API
    #[arg(long = "authurl")]
    auth_url: String,

    /// AWS CLI profile to resolve account, region and credentials from
    #[arg(long, env = "AWS_PROFILE", default_value = "default")]
    profile: String,

    /// Outpost whose token is synced
    #[arg(long, default_value = DEFAULT_OUTPOST)]
    outpost: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Exit 1 on missing flags (clap's own exit code would be 2), and before
    // any network or secret-store call is made.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            std::process::exit(1);
        }
    };

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("🚀 LDAP token sync starting...");

    let ctx = ExecutionContext::resolve(&cli.profile, &cli.environment, &cli.auth_url).await?;

    info!("🔐 Fetching admin token from Secrets Manager");
    let store = SecretStore::new(&ctx).await;
    let admin_token = store.get_admin_token(&ctx.environment).await?;

    info!(outpost = %cli.outpost, "Resolving outpost token via Authentik API");
    let authentik = AuthentikClient::new(&ctx.auth_base_url, admin_token);
    let ldap_token = authentik.resolve_outpost_token(&cli.outpost).await?;

    store.put_ldap_token(&ctx.environment, &ldap_token).await?;

    info!("✅ LDAP token synced for environment {}", ctx.environment);
    Ok(())
}
