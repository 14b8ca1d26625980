//! Authentik API client.
//!
//! Two read-only calls: list outpost instances filtered by name, then fetch
//! the view key of the matched outpost's token. No retries; a non-2xx answer
//! at either step aborts the run.

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::SyncError;

/// Outpost resolved by default when no `--outpost` override is given.
pub const DEFAULT_OUTPOST: &str = "LDAP";

/// Authentik API client holding the admin bearer token.
pub struct AuthentikClient {
    http: Client,
    base_url: String,
    admin_token: String,
}

#[derive(Debug, Deserialize)]
pub struct OutpostListing {
    pub results: Vec<OutpostInstance>,
}

#[derive(Debug, Deserialize)]
pub struct OutpostInstance {
    pub name: String,
    pub token_identifier: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ViewKeyResponse {
    key: Option<String>,
}

impl AuthentikClient {
    pub fn new(base_url: &str, admin_token: String) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            admin_token,
        }
    }

    /// Resolve the current token value for the named outpost.
    pub async fn resolve_outpost_token(&self, outpost_name: &str) -> Result<String, SyncError> {
        let listing = self.fetch_outposts(outpost_name).await?;
        let token_identifier = select_outpost(listing, outpost_name)?;

        debug!(
            outpost = %outpost_name,
            token_identifier = %token_identifier,
            "Resolved outpost token identifier"
        );

        let key = self.fetch_view_key(&token_identifier).await?;
        key.ok_or_else(|| SyncError::TokenNotFound(outpost_name.to_string()))
    }

    /// `GET /api/v3/outposts/instances/?name__iexact=<name>`.
    ///
    /// The server-side filter is case-insensitive, so the result set still
    /// needs an exact-match pass afterwards.
    async fn fetch_outposts(&self, outpost_name: &str) -> Result<OutpostListing, SyncError> {
        let step = format!("outpost lookup for {:?}", outpost_name);
        let url = format!(
            "{}/api/v3/outposts/instances/?name__iexact={}",
            self.base_url, outpost_name
        );

        let response = self
            .get(&url)
            .await
            .map_err(|source| SyncError::Http {
                step: step.clone(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(SyncError::RemoteApi {
                status: response.status().as_u16(),
                step,
            });
        }

        response
            .json::<OutpostListing>()
            .await
            .map_err(|source| SyncError::Http { step, source })
    }

    /// `GET /api/v3/core/tokens/<identifier>/view_key/`.
    async fn fetch_view_key(&self, token_identifier: &str) -> Result<Option<String>, SyncError> {
        let step = format!("view key fetch for token {:?}", token_identifier);
        let url = format!(
            "{}/api/v3/core/tokens/{}/view_key/",
            self.base_url, token_identifier
        );

        let response = self
            .get(&url)
            .await
            .map_err(|source| SyncError::Http {
                step: step.clone(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(SyncError::RemoteApi {
                status: response.status().as_u16(),
                step,
            });
        }

        let body: ViewKeyResponse = response
            .json()
            .await
            .map_err(|source| SyncError::Http { step, source })?;

        info!(token_identifier = %token_identifier, "View key fetched");
        Ok(body.key)
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, reqwest::Error> {
        self.http
            .get(url)
            .bearer_auth(&self.admin_token)
            .header("Accept", "application/json")
            .send()
            .await
    }
}

/// Pick the token identifier of the outpost whose name matches exactly.
///
/// The listing was filtered case-insensitively server-side; the exact
/// comparison here is the authoritative one.
pub fn select_outpost(listing: OutpostListing, outpost_name: &str) -> Result<String, SyncError> {
    if listing.results.is_empty() {
        return Err(SyncError::OutpostNotFound(outpost_name.to_string()));
    }

    listing
        .results
        .into_iter()
        .find(|o| o.name == outpost_name)
        .and_then(|o| o.token_identifier)
        .ok_or_else(|| SyncError::TokenIdentifierNotFound(outpost_name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn listing(entries: Vec<(&str, Option<&str>)>) -> OutpostListing {
        OutpostListing {
            results: entries
                .into_iter()
                .map(|(name, id)| OutpostInstance {
                    name: name.to_string(),
                    token_identifier: id.map(str::to_string),
                })
                .collect(),
        }
    }

    #[test]
    fn select_outpost_rejects_empty_listing() {
        let err = select_outpost(listing(vec![]), "LDAP").unwrap_err();
        assert!(matches!(err, SyncError::OutpostNotFound(_)));
    }

    #[test]
    fn select_outpost_is_case_sensitive() {
        // The server filter is only a hint; "ldap" must not satisfy "LDAP".
        let err = select_outpost(listing(vec![("ldap", Some("id-1"))]), "LDAP").unwrap_err();
        assert!(matches!(err, SyncError::TokenIdentifierNotFound(_)));
    }

    #[test]
    fn select_outpost_requires_a_token_identifier() {
        let err = select_outpost(listing(vec![("LDAP", None)]), "LDAP").unwrap_err();
        assert!(matches!(err, SyncError::TokenIdentifierNotFound(_)));
    }

    #[test]
    fn select_outpost_picks_the_exact_match() {
        let id = select_outpost(
            listing(vec![("ldap", Some("wrong")), ("LDAP", Some("id-1"))]),
            "LDAP",
        )
        .unwrap();
        assert_eq!(id, "id-1");
    }

    #[tokio::test]
    async fn resolve_outpost_token_happy_path() {
        let server = MockServer::start();
        let outposts = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v3/outposts/instances/")
                .query_param("name__iexact", "LDAP")
                .header("Authorization", "Bearer admin-tok")
                .header("Accept", "application/json");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"results":[{"name":"LDAP","token_identifier":"id-1"}]}"#);
        });
        let view_key = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v3/core/tokens/id-1/view_key/")
                .header("Authorization", "Bearer admin-tok");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"key":"secret-abc"}"#);
        });

        let client = AuthentikClient::new(&server.base_url(), "admin-tok".to_string());
        let token = client.resolve_outpost_token("LDAP").await.unwrap();

        assert_eq!(token, "secret-abc");
        outposts.assert();
        view_key.assert();
    }

    #[tokio::test]
    async fn trailing_slash_in_base_url_is_normalized() {
        let server = MockServer::start();
        let outposts = server.mock(|when, then| {
            when.method(GET).path("/api/v3/outposts/instances/");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"results":[{"name":"LDAP","token_identifier":"id-1"}]}"#);
        });
        server.mock(|when, then| {
            when.method(GET).path("/api/v3/core/tokens/id-1/view_key/");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"key":"secret-abc"}"#);
        });

        let base = format!("{}/", server.base_url());
        let client = AuthentikClient::new(&base, "admin-tok".to_string());
        assert_eq!(
            client.resolve_outpost_token("LDAP").await.unwrap(),
            "secret-abc"
        );
        outposts.assert();
    }

    #[tokio::test]
    async fn empty_listing_is_outpost_not_found() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/v3/outposts/instances/");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"results":[]}"#);
        });

        let client = AuthentikClient::new(&server.base_url(), "admin-tok".to_string());
        let err = client.resolve_outpost_token("LDAP").await.unwrap_err();
        assert!(matches!(err, SyncError::OutpostNotFound(_)));
    }

    #[tokio::test]
    async fn non_2xx_listing_carries_the_status() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/v3/outposts/instances/");
            then.status(403).body("forbidden");
        });

        let client = AuthentikClient::new(&server.base_url(), "admin-tok".to_string());
        let err = client.resolve_outpost_token("LDAP").await.unwrap_err();
        match err {
            SyncError::RemoteApi { status, .. } => assert_eq!(status, 403),
            other => panic!("expected RemoteApi, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn missing_key_field_is_token_not_found() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/v3/outposts/instances/");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"results":[{"name":"LDAP","token_identifier":"id-1"}]}"#);
        });
        server.mock(|when, then| {
            when.method(GET).path("/api/v3/core/tokens/id-1/view_key/");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{}"#);
        });

        let client = AuthentikClient::new(&server.base_url(), "admin-tok".to_string());
        let err = client.resolve_outpost_token("LDAP").await.unwrap_err();
        assert!(matches!(err, SyncError::TokenNotFound(_)));
    }
}
