//! Load-balancer control-plane seam.
//!
//! The reconciler only ever sees the domain types below; the ELBv2 SDK
//! client lives behind the `RuleControlPlane` trait so tests can substitute
//! an in-memory listener.

use async_trait::async_trait;
use aws_sdk_elasticloadbalancingv2::types::{
    Action, ActionTypeEnum, AuthenticateOidcActionConfig, HostHeaderConditionConfig,
    RuleCondition as SdkRuleCondition,
};
use aws_sdk_elasticloadbalancingv2::Client;
use aws_smithy_types::error::display::DisplayErrorContext;
use tracing::debug;

use crate::error::ControlPlaneError;

/// Desired OIDC authentication configuration for a rule.
#[derive(Debug, Clone)]
pub struct OidcAuthSpec {
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub user_info_endpoint: String,
    pub issuer: String,
    pub client_id: String,
    pub client_secret: String,
    pub scope: String,
    pub session_cookie_name: String,
    pub session_timeout: i64,
}

/// A listener rule as the reconciler sees it. Owned by the control plane;
/// this is a read model, not a managed record.
#[derive(Debug, Clone)]
pub struct ListenerRule {
    pub rule_arn: String,
    pub conditions: Vec<RuleCondition>,
    pub actions: Vec<RuleAction>,
}

#[derive(Debug, Clone)]
pub struct RuleCondition {
    pub field: String,
    pub values: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct RuleAction {
    pub action_type: String,
    pub target_group_arn: Option<String>,
}

#[async_trait]
pub trait RuleControlPlane: Send + Sync {
    /// All rules on a listener, in control-plane listing order.
    async fn list_rules(&self, listener_arn: &str) -> Result<Vec<ListenerRule>, ControlPlaneError>;

    /// Fetch one rule by ARN.
    async fn describe_rule(&self, rule_arn: &str) -> Result<ListenerRule, ControlPlaneError>;

    /// Create a rule with a host-header condition and the OIDC action pair.
    /// Returns the new rule's ARN.
    async fn create_rule(
        &self,
        listener_arn: &str,
        priority: i32,
        hostname: &str,
        oidc: &OidcAuthSpec,
        target_group_arn: &str,
    ) -> Result<String, ControlPlaneError>;

    /// Overwrite a rule's actions with the OIDC action pair.
    async fn modify_rule(
        &self,
        rule_arn: &str,
        oidc: &OidcAuthSpec,
        target_group_arn: &str,
    ) -> Result<(), ControlPlaneError>;

    async fn delete_rule(&self, rule_arn: &str) -> Result<(), ControlPlaneError>;
}

/// Production control plane backed by the ELBv2 SDK client.
pub struct Elbv2ControlPlane {
    client: Client,
}

impl Elbv2ControlPlane {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// The fixed action pair: authenticate-oidc (order 1), forward (order 2).
    fn oidc_actions(
        oidc: &OidcAuthSpec,
        target_group_arn: &str,
    ) -> Result<Vec<Action>, ControlPlaneError> {
        let oidc_config = AuthenticateOidcActionConfig::builder()
            .authorization_endpoint(&oidc.authorization_endpoint)
            .token_endpoint(&oidc.token_endpoint)
            .user_info_endpoint(&oidc.user_info_endpoint)
            .issuer(&oidc.issuer)
            .client_id(&oidc.client_id)
            .client_secret(&oidc.client_secret)
            .scope(&oidc.scope)
            .session_cookie_name(&oidc.session_cookie_name)
            .session_timeout(oidc.session_timeout)
            .build();

        let authenticate = Action::builder()
            .r#type(ActionTypeEnum::AuthenticateOidc)
            .authenticate_oidc_config(oidc_config)
            .order(1)
            .build();

        let forward = Action::builder()
            .r#type(ActionTypeEnum::Forward)
            .target_group_arn(target_group_arn)
            .order(2)
            .build();

        Ok(vec![authenticate, forward])
    }

    fn convert_rule(rule: &aws_sdk_elasticloadbalancingv2::types::Rule) -> ListenerRule {
        ListenerRule {
            rule_arn: rule.rule_arn().unwrap_or_default().to_string(),
            conditions: rule
                .conditions()
                .iter()
                .map(|c| {
                    // Host-header values may live in `values`, in
                    // `host_header_config`, or both.
                    let mut values: Vec<String> = c.values().to_vec();
                    if let Some(config) = c.host_header_config() {
                        for v in config.values() {
                            if !values.contains(v) {
                                values.push(v.clone());
                            }
                        }
                    }
                    RuleCondition {
                        field: c.field().unwrap_or_default().to_string(),
                        values,
                    }
                })
                .collect(),
            actions: rule
                .actions()
                .iter()
                .map(|a| RuleAction {
                    action_type: a.r#type().map(|t| t.as_str().to_string()).unwrap_or_default(),
                    target_group_arn: a.target_group_arn().map(str::to_string),
                })
                .collect(),
        }
    }
}

#[async_trait]
impl RuleControlPlane for Elbv2ControlPlane {
    async fn list_rules(&self, listener_arn: &str) -> Result<Vec<ListenerRule>, ControlPlaneError> {
        debug!(listener_arn = %listener_arn, "Listing listener rules");

        let output = self
            .client
            .describe_rules()
            .listener_arn(listener_arn)
            .send()
            .await
            .map_err(|e| ControlPlaneError(format!("{}", DisplayErrorContext(&e))))?;

        Ok(output.rules().iter().map(Self::convert_rule).collect())
    }

    async fn describe_rule(&self, rule_arn: &str) -> Result<ListenerRule, ControlPlaneError> {
        let output = self
            .client
            .describe_rules()
            .rule_arns(rule_arn)
            .send()
            .await
            .map_err(|e| ControlPlaneError(format!("{}", DisplayErrorContext(&e))))?;

        output
            .rules()
            .first()
            .map(Self::convert_rule)
            .ok_or_else(|| ControlPlaneError(format!("rule {} not found", rule_arn)))
    }

    async fn create_rule(
        &self,
        listener_arn: &str,
        priority: i32,
        hostname: &str,
        oidc: &OidcAuthSpec,
        target_group_arn: &str,
    ) -> Result<String, ControlPlaneError> {
        let condition = SdkRuleCondition::builder()
            .field("host-header")
            .host_header_config(
                HostHeaderConditionConfig::builder()
                    .values(format!("{}.*", hostname))
                    .build(),
            )
            .build();

        let output = self
            .client
            .create_rule()
            .listener_arn(listener_arn)
            .priority(priority)
            .conditions(condition)
            .set_actions(Some(Self::oidc_actions(oidc, target_group_arn)?))
            .send()
            .await
            .map_err(|e| ControlPlaneError(format!("{}", DisplayErrorContext(&e))))?;

        output
            .rules()
            .first()
            .and_then(|r| r.rule_arn())
            .map(str::to_string)
            .ok_or_else(|| ControlPlaneError("create-rule response contained no rule ARN".to_string()))
    }

    async fn modify_rule(
        &self,
        rule_arn: &str,
        oidc: &OidcAuthSpec,
        target_group_arn: &str,
    ) -> Result<(), ControlPlaneError> {
        self.client
            .modify_rule()
            .rule_arn(rule_arn)
            .set_actions(Some(Self::oidc_actions(oidc, target_group_arn)?))
            .send()
            .await
            .map_err(|e| ControlPlaneError(format!("{}", DisplayErrorContext(&e))))?;

        Ok(())
    }

    async fn delete_rule(&self, rule_arn: &str) -> Result<(), ControlPlaneError> {
        self.client
            .delete_rule()
            .rule_arn(rule_arn)
            .send()
            .await
            .map_err(|e| ControlPlaneError(format!("{}", DisplayErrorContext(&e))))?;

        Ok(())
    }
}
