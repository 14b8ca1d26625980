//! Lambda entry point for the ALB OIDC rule custom resource.

use std::sync::Arc;

use lambda_runtime::{service_fn, Error, LambdaEvent};

use alb_oidc_rule::control_plane::Elbv2ControlPlane;
use alb_oidc_rule::events::{CustomResourceEvent, CustomResourceResponse};
use alb_oidc_rule::reconciler;

async fn function_handler(
    control_plane: Arc<Elbv2ControlPlane>,
    event: LambdaEvent<CustomResourceEvent>,
) -> Result<CustomResourceResponse, Error> {
    Ok(reconciler::handle(control_plane.as_ref(), event.payload).await)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        // disable printing the name of the module in every log line.
        .with_target(false)
        // disabling time is handy because CloudWatch will add the ingestion time.
        .without_time()
        .json()
        .init();

    let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let control_plane = Arc::new(Elbv2ControlPlane::new(
        aws_sdk_elasticloadbalancingv2::Client::new(&config),
    ));

    lambda_runtime::run(service_fn(|event| {
        function_handler(control_plane.clone(), event)
    }))
    .await
}
