//! LDAP Token Sync Library
//!
//! Synchronizes an Authentik outpost's LDAP token from the Authentik API
//! into AWS Secrets Manager.

pub mod authentik;
pub mod context;
pub mod error;
pub mod secrets;

pub use authentik::AuthentikClient;
pub use context::ExecutionContext;
pub use error::SyncError;
pub use secrets::SecretStore;
