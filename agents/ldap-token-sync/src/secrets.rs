//! AWS Secrets Manager integration.
//!
//! Secret names follow the fixed pattern `<prefix>-<environment>/<resource>`.
//! The admin token is only ever read and the LDAP token only ever written, so
//! the two names are always distinct.

use aws_config::{BehaviorVersion, Region};
use aws_sdk_secretsmanager::Client;
use aws_smithy_types::error::display::DisplayErrorContext;
use tracing::{debug, info};

use crate::context::ExecutionContext;
use crate::error::SyncError;

/// Organization prefix shared by all managed secrets.
pub const SECRET_PREFIX: &str = "identity";

/// Name of the secret holding the Authentik admin API token.
pub fn admin_token_secret_name(environment: &str) -> String {
    format!("{}-{}/authentik-admin-token", SECRET_PREFIX, environment)
}

/// Name of the secret the rotated LDAP token is written to.
pub fn ldap_token_secret_name(environment: &str) -> String {
    format!("{}-{}/authentik-ldap-token", SECRET_PREFIX, environment)
}

/// Raw payload shape of a Secrets Manager entry.
///
/// Secrets Manager returns either a string or a binary blob depending on how
/// the secret was stored; both are normalized to a single `String` here,
/// before any of it reaches business logic.
#[derive(Debug)]
pub enum SecretPayload {
    Text(String),
    Binary(Vec<u8>),
}

impl SecretPayload {
    /// Normalize to the secret's text value.
    ///
    /// Binary payloads are decoded as UTF-8 and then parsed as a JSON string,
    /// which is how string secrets round-trip through the binary field.
    pub fn into_text(self) -> Result<String, String> {
        match self {
            SecretPayload::Text(s) => Ok(s),
            SecretPayload::Binary(bytes) => {
                let text = String::from_utf8(bytes)
                    .map_err(|e| format!("binary payload is not UTF-8: {}", e))?;
                serde_json::from_str::<String>(&text)
                    .map_err(|e| format!("binary payload is not a JSON string: {}", e))
            }
        }
    }
}

/// Secrets Manager client scoped to one profile and region.
pub struct SecretStore {
    client: Client,
}

impl SecretStore {
    /// Build a store from the resolved execution context.
    pub async fn new(ctx: &ExecutionContext) -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest())
            .profile_name(&ctx.profile)
            .region(Region::new(ctx.region.clone()))
            .load()
            .await;

        Self {
            client: Client::new(&config),
        }
    }

    /// Build a store around an existing SDK client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    /// Fetch the Authentik admin API token for an environment.
    pub async fn get_admin_token(&self, environment: &str) -> Result<String, SyncError> {
        let name = admin_token_secret_name(environment);
        debug!(secret = %name, "Fetching admin token");

        let output = self
            .client
            .get_secret_value()
            .secret_id(&name)
            .send()
            .await
            .map_err(|e| SyncError::SecretRetrieval {
                name: name.clone(),
                message: format!("{}", DisplayErrorContext(&e)),
            })?;

        let payload = if let Some(text) = output.secret_string() {
            SecretPayload::Text(text.to_string())
        } else if let Some(blob) = output.secret_binary() {
            SecretPayload::Binary(blob.as_ref().to_vec())
        } else {
            return Err(SyncError::SecretRetrieval {
                name,
                message: "secret has neither a string nor a binary payload".to_string(),
            });
        };

        let token = payload
            .into_text()
            .map_err(|message| SyncError::SecretRetrieval {
                name: name.clone(),
                message,
            })?;

        info!(secret = %name, "Admin token retrieved (length: {} bytes)", token.len());
        Ok(token)
    }

    /// Write the rotated LDAP token for an environment. Last writer wins.
    pub async fn put_ldap_token(&self, environment: &str, token: &str) -> Result<(), SyncError> {
        let name = ldap_token_secret_name(environment);
        debug!(secret = %name, "Writing LDAP token");

        self.client
            .put_secret_value()
            .secret_id(&name)
            .secret_string(token)
            .send()
            .await
            .map_err(|e| SyncError::SecretWrite {
                name: name.clone(),
                message: format!("{}", DisplayErrorContext(&e)),
            })?;

        info!(secret = %name, "LDAP token stored");
        Ok(())
    }
}
