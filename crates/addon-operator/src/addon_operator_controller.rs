use std::sync::Arc;

use addon_api::{OcmClient, read_secret_keys};
use addon_crds::{AddonOperator, AddonOperatorOcm, Condition, condition_reasons, condition_types};
use anyhow::Result;
use futures::StreamExt;
use kube::ResourceExt;
use kube::api::{Api, Patch, PatchParams};
use kube::runtime::controller::{Action, Controller};
use kube::runtime::watcher;
use tokio::time::Duration;
use tracing::{debug, error, info, warn};

use crate::context::Context;
use crate::controller::chrono_now;
use crate::error::Error;
use crate::metrics::{increment_reconcile_total, observe_reconcile_duration};

const CONTROLLER: &str = "addonoperator";
const RESYNC_INTERVAL: Duration = Duration::from_secs(300);
const ERROR_REQUEUE: Duration = Duration::from_secs(60);

pub const CLUSTER_ID_KEY: &str = "clusterID";
pub const ACCESS_TOKEN_KEY: &str = "accessToken";

pub async fn run(ctx: Arc<Context>) -> Result<()> {
    let api = Api::<AddonOperator>::all(ctx.client.clone());
    let name = ctx.config.addon_operator_name.clone();

    info!(%name, "Starting AddonOperator controller");

    Controller::new(
        api,
        watcher::Config::default().fields(&format!("metadata.name={name}")),
    )
    .shutdown_on_signal()
    .run(reconcile, error_policy, ctx)
    .for_each(|res| async move {
        match res {
            Ok(o) => info!(?o, "reconciled"),
            Err(e) => error!(%e, "reconcile error"),
        }
    })
    .await;

    Ok(())
}

/// Keep the OCM gateway in line with `spec.ocm`.
pub async fn reconcile(operator: Arc<AddonOperator>, ctx: Arc<Context>) -> Result<Action, Error> {
    let name = operator.name_any();
    let start_time = std::time::Instant::now();
    let now = chrono_now();

    let condition = match operator.spec.ocm.as_ref() {
        None => {
            if ctx.ocm.is_configured().await {
                info!(%name, "OCM configuration removed, clearing client");
            }
            ctx.ocm.clear().await;
            Condition::fail(
                condition_types::OCM_CLIENT_READY,
                condition_reasons::OCM_NOT_CONFIGURED,
                "spec.ocm is not set, upgrade policy reporting is disabled",
                &now,
            )
        }
        Some(ocm) => {
            let client = build_ocm_client(&ctx, ocm).await?;
            let cluster_id = client.cluster_id().to_string();
            let endpoint = client.endpoint().to_string();
            if ctx.ocm.replace(client).await {
                info!(%name, %endpoint, %cluster_id, "OCM client configured");
            } else {
                debug!(%name, %endpoint, %cluster_id, "OCM client refreshed");
            }
            Condition::ok(
                condition_types::OCM_CLIENT_READY,
                condition_reasons::OCM_CONFIGURED,
                &format!("Reporting to {endpoint} for cluster {cluster_id}"),
                &now,
            )
        }
    };

    let generation = operator.metadata.generation.unwrap_or(0);
    let mut status = operator.status.clone().unwrap_or_default();
    status.observed_generation = generation;
    status.phase = Some("Ready".into());
    status.set_condition(condition.with_generation(generation));

    if operator.status.as_ref() != Some(&status) {
        let patch = serde_json::json!({ "status": status });
        Api::<AddonOperator>::all(ctx.client.clone())
            .patch_status(&name, &PatchParams::default(), &Patch::Merge(&patch))
            .await
            .map_err(Error::kube("patching status of", format!("AddonOperator {name}")))?;
    }

    observe_reconcile_duration(CONTROLLER, start_time.elapsed().as_secs_f64());
    increment_reconcile_total(CONTROLLER, "success");
    Ok(Action::requeue(RESYNC_INTERVAL))
}

async fn build_ocm_client(ctx: &Context, ocm: &AddonOperatorOcm) -> Result<OcmClient, Error> {
    let secret = &ocm.secret;
    let values = read_secret_keys(
        &ctx.client,
        &secret.namespace,
        &secret.name,
        &[CLUSTER_ID_KEY, ACCESS_TOKEN_KEY],
    )
    .await
    .map_err(|source| Error::OcmCredentials {
        namespace: secret.namespace.clone(),
        name: secret.name.clone(),
        source,
    })?;

    let cluster_id = values
        .get(CLUSTER_ID_KEY)
        .map(String::as_str)
        .unwrap_or_default();
    let access_token = values
        .get(ACCESS_TOKEN_KEY)
        .map(String::as_str)
        .unwrap_or_default();
    OcmClient::new(
        &ocm.endpoint,
        cluster_id.trim(),
        access_token.trim(),
        Some(ctx.config.ocm_request_timeout),
    )
    .map_err(Error::OcmClient)
}

pub fn error_policy(operator: Arc<AddonOperator>, error: &Error, _ctx: Arc<Context>) -> Action {
    increment_reconcile_total(CONTROLLER, "error");
    warn!(
        name = %operator.name_any(),
        %error,
        "AddonOperator reconciliation failed, requeuing"
    );
    Action::requeue(ERROR_REQUEUE)
}
