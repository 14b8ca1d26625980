//! ALB OIDC Rule Library
//!
//! CloudFormation custom resource handler that converges one ALB listener
//! rule per hostname to an authenticate-oidc + forward action pair.

pub mod control_plane;
pub mod error;
pub mod events;
pub mod reconciler;

pub use control_plane::{Elbv2ControlPlane, RuleControlPlane};
pub use events::{CustomResourceEvent, CustomResourceResponse};
pub use reconciler::handle;
