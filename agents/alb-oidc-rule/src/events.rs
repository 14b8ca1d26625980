//! CloudFormation custom resource event and response shapes.
//!
//! The envelope is the CDK provider framework's `onEvent` contract
//! (PascalCase keys); resource properties keep the camelCase names they are
//! authored with. CloudFormation stringifies numeric property values, so
//! `priority` and `sessionTimeout` arrive as strings and are parsed
//! leniently.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PRIORITY: i32 = 100;

/// ALB default session duration, 7 days.
pub const DEFAULT_SESSION_TIMEOUT: i64 = 604_800;

/// Provisioning lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum RequestType {
    Create,
    Update,
    Delete,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CustomResourceEvent {
    pub request_type: RequestType,
    pub resource_properties: RuleProperties,
    #[serde(default)]
    pub physical_resource_id: Option<String>,
    pub stack_id: String,
    pub request_id: String,
    pub logical_resource_id: String,
}

impl CustomResourceEvent {
    /// Physical id to report when reconciliation fails before a rule ARN is
    /// known: the prior id if one exists, otherwise a synthetic one the
    /// lifecycle can still track.
    pub fn fallback_physical_id(&self) -> String {
        self.physical_resource_id
            .clone()
            .unwrap_or_else(|| format!("{}-{}", self.logical_resource_id, self.request_id))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleProperties {
    pub listener_arn: String,
    pub enrollment_hostname: String,
    #[serde(default)]
    pub target_group_arn: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub listener_rule_arn: Option<String>,
    pub authorize_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub issuer: String,
    pub token_url: String,
    pub user_info_url: String,
    pub scope: String,
    pub session_cookie_name: String,
    #[serde(default)]
    pub session_timeout: Option<String>,
}

impl RuleProperties {
    pub fn priority(&self) -> i32 {
        self.priority
            .as_deref()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PRIORITY)
    }

    pub fn session_timeout(&self) -> i64 {
        self.session_timeout
            .as_deref()
            .and_then(|t| t.parse().ok())
            .unwrap_or(DEFAULT_SESSION_TIMEOUT)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseStatus {
    Success,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CustomResourceResponse {
    pub status: ResponseStatus,
    pub physical_resource_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResponseData {
    pub listener_rule_arn: String,
}

impl CustomResourceResponse {
    pub fn success(physical_resource_id: String, data: Option<ResponseData>) -> Self {
        Self {
            status: ResponseStatus::Success,
            physical_resource_id,
            reason: None,
            data,
        }
    }

    pub fn failed(physical_resource_id: String, reason: String) -> Self {
        Self {
            status: ResponseStatus::Failed,
            physical_resource_id,
            reason: Some(reason),
            data: None,
        }
    }
}
