//! Reconciler error taxonomy.
//!
//! Every variant ends up as a FAILED custom-resource response; nothing here
//! is thrown past the handler boundary.

use thiserror::Error;

/// A failed call against the load-balancer control plane.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ControlPlaneError(pub String);

#[derive(Debug, Error)]
pub enum ReconcileError {
    /// No existing rule matched and no target group was supplied.
    #[error("targetGroupArn is required when no existing listener rule matches the hostname")]
    TargetGroupRequired,

    /// An existing rule matched but carries no forward action to recover a
    /// target group from.
    #[error("existing rule {rule_arn} has no forward action to recover a target group from")]
    TargetGroupUnresolved { rule_arn: String },

    #[error("load balancer control plane call failed: {0}")]
    ControlPlane(#[from] ControlPlaneError),
}
