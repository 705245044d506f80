use std::sync::Arc;

use addon_crds::{
    Addon, AddonOperator, AddonStatus, OperatorGroup, condition_reasons, condition_types,
};
use addon_resources::common::{ADDON_LABEL, MANAGER};
use anyhow::Result;
use futures::StreamExt;
use kube::api::{Api, Patch, PatchParams};
use kube::runtime::controller::{Action, Controller};
use kube::runtime::events::{Event, EventType, Recorder};
use kube::runtime::reflector::ObjectRef;
use kube::runtime::watcher;
use kube::{CustomResourceExt, Resource, ResourceExt};
use tokio::time::Duration;
use tracing::{error, info, warn};

use crate::context::Context;
use crate::error::Error;
use crate::metrics::{increment_reconcile_total, observe_reconcile_duration};
use crate::operator_group::{PhaseResult, ensure_operator_group};
use crate::upgrade_policy::handle_upgrade_policy_reporting;

const CONTROLLER: &str = "addon";
const RESYNC_INTERVAL: Duration = Duration::from_secs(300);
const ERROR_REQUEUE: Duration = Duration::from_secs(60);

pub fn print_crd() -> Result<()> {
    for crd in [Addon::crd(), AddonOperator::crd()] {
        let yaml = serde_yaml::to_string(&crd)?;
        println!("---\n{yaml}");
    }
    Ok(())
}

pub async fn run(ctx: Arc<Context>, server_state: crate::server::ServerState) -> Result<()> {
    let client = ctx.client.clone();
    let addons = Api::<Addon>::all(client.clone());
    let operator_groups = Api::<OperatorGroup>::all(client);

    info!("Starting Addon controller");
    server_state.set_ready();

    // Addons are cluster-scoped, so the OperatorGroups they own are mapped
    // back through the addon label rather than owner references.
    let managed =
        watcher::Config::default().labels(&format!("app.kubernetes.io/managed-by={MANAGER}"));

    Controller::new(addons, watcher::Config::default())
        .watches(operator_groups, managed, |og| {
            og.labels()
                .get(ADDON_LABEL)
                .map(|name| ObjectRef::<Addon>::new(name))
        })
        .reconcile_all_on(ctx.ocm.became_configured())
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

pub async fn reconcile(addon: Arc<Addon>, ctx: Arc<Context>) -> Result<Action, Error> {
    let client = &ctx.client;
    let name = addon.name_any();
    let generation = addon.metadata.generation.unwrap_or(0);
    let start_time = std::time::Instant::now();

    let recorder = Recorder::new(client.clone(), ctx.reporter.clone());
    let obj_ref = addon.object_ref(&());

    info!(%name, version = %addon.spec.version, "reconciling");

    let mut status = addon.status.clone().unwrap_or_default();
    status.observed_generation = generation;

    if let PhaseResult::Stop(condition) = ensure_operator_group(client, &addon).await? {
        let message = condition.message.clone();
        status.set_condition(condition);
        status.phase = Some("Error".into());
        update_status(&ctx, &addon, &status).await?;

        let _ = recorder
            .publish(
                &Event {
                    type_: EventType::Warning,
                    reason: condition_reasons::CONFIG_ERROR.into(),
                    note: Some(message),
                    action: "Install".into(),
                    secondary: None,
                },
                &obj_ref,
            )
            .await;

        finish(start_time, "stopped");
        return Ok(Action::await_change());
    }
    status.clear_condition_with_reason(
        condition_types::AVAILABLE,
        condition_reasons::CONFIG_ERROR,
    );

    if let Some(reported) = handle_upgrade_policy_reporting(&ctx, &addon).await? {
        let note = format!(
            "Reported {} for version {:?} to upgrade policy {}",
            reported.value, reported.version, reported.id
        );
        status.upgrade_policy = Some(reported);

        let _ = recorder
            .publish(
                &Event {
                    type_: EventType::Normal,
                    reason: "UpgradePolicyReported".into(),
                    note: Some(note),
                    action: "Report".into(),
                    secondary: None,
                },
                &obj_ref,
            )
            .await;
    }

    status.phase = Some(if addon.is_available() { "Ready" } else { "Pending" }.into());
    update_status(&ctx, &addon, &status).await?;

    finish(start_time, "success");
    Ok(Action::requeue(RESYNC_INTERVAL))
}

/// Persist `status` when it differs from what the addon was read with.
///
/// The patch carries the observed resourceVersion, so a concurrent writer
/// makes it fail with a conflict and the pass is retried.
pub(crate) async fn update_status(
    ctx: &Context,
    addon: &Addon,
    status: &AddonStatus,
) -> Result<(), Error> {
    if addon.status.as_ref() == Some(status) {
        return Ok(());
    }

    let name = addon.name_any();
    let patch = serde_json::json!({
        "metadata": { "resourceVersion": addon.resource_version() },
        "status": status,
    });
    Api::<Addon>::all(ctx.client.clone())
        .patch_status(&name, &PatchParams::default(), &Patch::Merge(&patch))
        .await
        .map_err(Error::kube("patching status of", format!("Addon {name}")))?;
    Ok(())
}

fn finish(start_time: std::time::Instant, result: &str) {
    observe_reconcile_duration(CONTROLLER, start_time.elapsed().as_secs_f64());
    increment_reconcile_total(CONTROLLER, result);
}

pub fn error_policy(addon: Arc<Addon>, error: &Error, ctx: Arc<Context>) -> Action {
    increment_reconcile_total(CONTROLLER, "error");
    if error.is_conflict() {
        info!(addon = %addon.name_any(), %error, "status update conflicted, requeuing");
    } else {
        warn!(
            addon = %addon.name_any(),
            %error,
            timeout = error.is_timeout(),
            "reconciliation failed, requeuing"
        );
    }

    let recorder = Recorder::new(ctx.client.clone(), ctx.reporter.clone());
    let obj_ref = addon.object_ref(&());
    let error_msg = error.to_string();
    tokio::spawn(async move {
        let _ = recorder
            .publish(
                &Event {
                    type_: EventType::Warning,
                    reason: "ReconcileError".into(),
                    note: Some(error_msg),
                    action: "Reconcile".into(),
                    secondary: None,
                },
                &obj_ref,
            )
            .await;
    });

    Action::requeue(ERROR_REQUEUE)
}

pub(crate) fn chrono_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}
