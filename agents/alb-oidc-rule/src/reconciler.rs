//! Listener-rule reconciliation.
//!
//! One hostname maps to at most one rule per listener; the find-before-create
//! step here is what enforces that, not the control plane. The load balancer
//! itself is the source of truth between invocations.

use tracing::{error, info, warn};

use crate::control_plane::{ListenerRule, OidcAuthSpec, RuleControlPlane};
use crate::error::ReconcileError;
use crate::events::{
    CustomResourceEvent, CustomResourceResponse, RequestType, ResponseData, RuleProperties,
};

const HOST_HEADER_FIELD: &str = "host-header";
const FORWARD_ACTION: &str = "forward";

/// Lifecycle entry point. Never returns an error: failures become FAILED
/// responses so the invoking lifecycle can track the resource either way.
pub async fn handle(
    control_plane: &dyn RuleControlPlane,
    event: CustomResourceEvent,
) -> CustomResourceResponse {
    match event.request_type {
        RequestType::Delete => handle_delete(control_plane, event).await,
        RequestType::Create | RequestType::Update => handle_upsert(control_plane, event).await,
    }
}

/// Best-effort rule deletion. A failure here must not block stack teardown,
/// so the error is logged and discarded at exactly this call site.
async fn handle_delete(
    control_plane: &dyn RuleControlPlane,
    event: CustomResourceEvent,
) -> CustomResourceResponse {
    let physical_id = event.fallback_physical_id();

    if is_rule_arn(&physical_id) {
        info!(rule_arn = %physical_id, "Deleting listener rule");
        if let Err(e) = control_plane.delete_rule(&physical_id).await {
            warn!(
                rule_arn = %physical_id,
                error = %e,
                "Best-effort rule deletion failed; continuing teardown"
            );
        }
    } else {
        info!(
            physical_resource_id = %physical_id,
            "Physical id is not a rule ARN; nothing to delete"
        );
    }

    CustomResourceResponse::success(physical_id, None)
}

async fn handle_upsert(
    control_plane: &dyn RuleControlPlane,
    event: CustomResourceEvent,
) -> CustomResourceResponse {
    match reconcile(control_plane, &event.resource_properties).await {
        Ok(rule_arn) => {
            info!(rule_arn = %rule_arn, "Listener rule converged");
            CustomResourceResponse::success(
                rule_arn.clone(),
                Some(ResponseData {
                    listener_rule_arn: rule_arn,
                }),
            )
        }
        Err(e) => {
            error!(
                listener_arn = %event.resource_properties.listener_arn,
                hostname = %event.resource_properties.enrollment_hostname,
                error = %e,
                "Reconciliation failed"
            );
            CustomResourceResponse::failed(event.fallback_physical_id(), e.to_string())
        }
    }
}

/// Find-or-create-or-modify. Returns the ARN of the converged rule.
pub async fn reconcile(
    control_plane: &dyn RuleControlPlane,
    props: &RuleProperties,
) -> Result<String, ReconcileError> {
    let rules = control_plane.list_rules(&props.listener_arn).await?;
    let mut matched = find_matching_rule(&rules, &props.enrollment_hostname).cloned();

    // An explicitly configured rule ARN overrides the host-header search,
    // but a fetch failure falls back to the searched result.
    if let Some(explicit_arn) = &props.listener_rule_arn {
        match control_plane.describe_rule(explicit_arn).await {
            Ok(rule) => matched = Some(rule),
            Err(e) => warn!(
                rule_arn = %explicit_arn,
                error = %e,
                "Could not fetch configured rule; falling back to host-header search"
            ),
        }
    }

    let oidc = oidc_spec(props);

    match matched {
        Some(rule) => {
            let target_group_arn = props
                .target_group_arn
                .clone()
                .or_else(|| forward_target_group(&rule))
                .ok_or(ReconcileError::TargetGroupUnresolved {
                    rule_arn: rule.rule_arn.clone(),
                })?;

            control_plane
                .modify_rule(&rule.rule_arn, &oidc, &target_group_arn)
                .await?;
            Ok(rule.rule_arn)
        }
        None => {
            let target_group_arn = props
                .target_group_arn
                .clone()
                .ok_or(ReconcileError::TargetGroupRequired)?;

            let rule_arn = control_plane
                .create_rule(
                    &props.listener_arn,
                    props.priority(),
                    &props.enrollment_hostname,
                    &oidc,
                    &target_group_arn,
                )
                .await?;
            Ok(rule_arn)
        }
    }
}

/// First rule (in listing order) whose host-header condition values contain
/// the hostname as a substring. At most one such rule is expected to exist
/// per hostname by construction.
fn find_matching_rule<'a>(rules: &'a [ListenerRule], hostname: &str) -> Option<&'a ListenerRule> {
    rules.iter().find(|rule| {
        rule.conditions.iter().any(|condition| {
            condition.field == HOST_HEADER_FIELD
                && condition.values.iter().any(|value| value.contains(hostname))
        })
    })
}

/// Recover a target group from a rule's existing forward action.
fn forward_target_group(rule: &ListenerRule) -> Option<String> {
    rule.actions
        .iter()
        .find(|action| action.action_type == FORWARD_ACTION)
        .and_then(|action| action.target_group_arn.clone())
}

/// Whether a physical resource id looks like an ELBv2 rule ARN rather than a
/// synthetic tracking id.
fn is_rule_arn(physical_id: &str) -> bool {
    physical_id.starts_with("arn:") && physical_id.contains("elasticloadbalancing")
}

fn oidc_spec(props: &RuleProperties) -> OidcAuthSpec {
    OidcAuthSpec {
        authorization_endpoint: props.authorize_url.clone(),
        token_endpoint: props.token_url.clone(),
        user_info_endpoint: props.user_info_url.clone(),
        issuer: props.issuer.clone(),
        client_id: props.client_id.clone(),
        client_secret: props.client_secret.clone(),
        scope: props.scope.clone(),
        session_cookie_name: props.session_cookie_name.clone(),
        session_timeout: props.session_timeout(),
    }
}
