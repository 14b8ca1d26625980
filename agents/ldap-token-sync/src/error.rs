//! Error taxonomy for the token sync workflow.
//!
//! Every failure aborts the run; there are no retries. The variants mirror
//! the stages of the workflow so an operator can tell from a single log line
//! which external system misbehaved.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    /// The local AWS CLI could not resolve account or region.
    #[error("AWS CLI introspection failed: {0}")]
    CliIntrospection(String),

    /// Secrets Manager read failure.
    #[error("failed to read secret {name}: {message}")]
    SecretRetrieval { name: String, message: String },

    /// Secrets Manager write failure.
    #[error("failed to write secret {name}: {message}")]
    SecretWrite { name: String, message: String },

    /// The Authentik API answered with a non-2xx status.
    #[error("Authentik API returned HTTP {status} during {step}")]
    RemoteApi { status: u16, step: String },

    /// Transport-level failure talking to the Authentik API.
    #[error("Authentik API request failed during {step}: {source}")]
    Http {
        step: String,
        #[source]
        source: reqwest::Error,
    },

    /// The outpost listing came back empty.
    #[error("no Authentik outpost named {0:?} exists")]
    OutpostNotFound(String),

    /// The listing had entries, but none matched exactly or the match had
    /// no token identifier.
    #[error("outpost {0:?} has no resolvable token identifier")]
    TokenIdentifierNotFound(String),

    /// The view-key endpoint did not return a key.
    #[error("token for outpost {0:?} has no key material")]
    TokenNotFound(String),
}
