//! Execution context resolution.
//!
//! Account and region come from the operator's local AWS CLI configuration,
//! not from environment variables, so the tool fails with a clear message on
//! a machine that has never run `aws configure`.

use tokio::process::Command;
use tracing::info;

use crate::error::SyncError;

/// Immutable per-run context, constructed once at startup and passed by
/// reference through the rest of the workflow.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub profile: String,
    pub region: String,
    pub account: String,
    pub environment: String,
    pub auth_base_url: String,
}

impl ExecutionContext {
    /// Resolve the full context for a run.
    ///
    /// Logs every resolved value before any secret material is touched.
    pub async fn resolve(
        profile: &str,
        environment: &str,
        auth_base_url: &str,
    ) -> Result<Self, SyncError> {
        let region = resolve_region(profile).await?;
        let account = resolve_account(profile).await?;

        let ctx = Self {
            profile: profile.to_string(),
            region,
            account,
            environment: environment.to_string(),
            auth_base_url: auth_base_url.to_string(),
        };

        info!(
            profile = %ctx.profile,
            region = %ctx.region,
            account = %ctx.account,
            environment = %ctx.environment,
            authurl = %ctx.auth_base_url,
            "Resolved execution context"
        );

        Ok(ctx)
    }
}

/// `aws configure get region` for the given profile.
async fn resolve_region(profile: &str) -> Result<String, SyncError> {
    let output = Command::new("aws")
        .args(["configure", "get", "region", "--profile", profile])
        .output()
        .await
        .map_err(|e| SyncError::CliIntrospection(format!("failed to run aws CLI: {}", e)))?;

    first_line_if(output.status.success(), &output.stdout).ok_or_else(|| {
        SyncError::CliIntrospection(format!(
            "no region configured for profile {:?}; run `aws configure --profile {}` first",
            profile, profile
        ))
    })
}

/// `aws sts get-caller-identity` for the given profile.
async fn resolve_account(profile: &str) -> Result<String, SyncError> {
    let output = Command::new("aws")
        .args([
            "sts",
            "get-caller-identity",
            "--profile",
            profile,
            "--query",
            "Account",
            "--output",
            "text",
        ])
        .output()
        .await
        .map_err(|e| SyncError::CliIntrospection(format!("failed to run aws CLI: {}", e)))?;

    first_line_if(output.status.success(), &output.stdout).ok_or_else(|| {
        SyncError::CliIntrospection(format!(
            "could not resolve account for profile {:?}; run `aws configure --profile {}` first",
            profile, profile
        ))
    })
}

/// First non-empty trimmed line of a successful CLI run's stdout, if any.
///
/// A nonzero exit is treated the same as empty output, even if the command
/// printed something.
fn first_line_if(success: bool, stdout: &[u8]) -> Option<String> {
    if !success {
        return None;
    }
    let text = String::from_utf8_lossy(stdout);
    let line = text.lines().map(str::trim).find(|l| !l.is_empty())?;
    Some(line.to_string())
}
