//! Install-topology phase: make sure the addon's OperatorGroup exists, is
//! owned by the addon and selects the right namespaces.

use addon_crds::{Addon, Condition, OperatorGroup, condition_reasons, condition_types};
use addon_resources::operator_group::{self, DEFAULT_OPERATOR_GROUP_NAME};
use kube::api::{Api, PostParams};
use kube::{Client, ResourceExt};
use tracing::{debug, info, warn};

use crate::error::{Error, is_not_found};

/// Outcome of a reconcile phase.
#[derive(Debug, Clone, PartialEq)]
pub enum PhaseResult {
    /// Proceed with the remaining phases.
    Continue,
    /// Halt this pass and record the condition on the addon. Not a fault;
    /// the addon is revisited once its spec changes.
    Stop(Condition),
}

/// Create the addon's OperatorGroup, or adopt and converge an existing one.
///
/// An invalid install configuration stops the pass with `Available=False`
/// and never touches the API server.
pub async fn ensure_operator_group(client: &Client, addon: &Addon) -> Result<PhaseResult, Error> {
    let target = match operator_group::install_target(addon) {
        Ok(target) => target,
        Err(err) => {
            warn!(addon = %addon.name_any(), error = %err, "invalid install configuration");
            let condition = Condition::fail(
                condition_types::AVAILABLE,
                condition_reasons::CONFIG_ERROR,
                &err.to_string(),
                &crate::controller::chrono_now(),
            )
            .with_generation(addon.metadata.generation.unwrap_or(0));
            return Ok(PhaseResult::Stop(condition));
        }
    };

    let desired = operator_group::build(addon, &target);
    let api = Api::<OperatorGroup>::namespaced(client.clone(), &target.namespace);
    let resource = format!("OperatorGroup {}/{}", target.namespace, DEFAULT_OPERATOR_GROUP_NAME);

    match api.get(DEFAULT_OPERATOR_GROUP_NAME).await {
        Ok(existing) => {
            if !operator_group::is_owned_by(&existing, addon) {
                info!(addon = %addon.name_any(), %resource, "adopting operator group");
            }
            reconcile_operator_group(client, &existing, &desired).await?;
        }
        Err(err) if is_not_found(&err) => {
            info!(addon = %addon.name_any(), namespace = %target.namespace, "creating operator group");
            api.create(&PostParams::default(), &desired)
                .await
                .map_err(Error::kube("creating", resource))?;
        }
        Err(err) => return Err(Error::kube("getting", resource)(err)),
    }

    Ok(PhaseResult::Continue)
}

/// Converge an already fetched OperatorGroup towards `desired`.
///
/// Returns `true` when an update was written. An object missing the addon's
/// owner reference is adopted by the same update; nothing is recreated.
pub async fn reconcile_operator_group(
    client: &Client,
    existing: &OperatorGroup,
    desired: &OperatorGroup,
) -> Result<bool, Error> {
    let Some(merged) = operator_group::converge(existing, desired) else {
        debug!(name = %existing.name_any(), "operator group up to date");
        return Ok(false);
    };

    let name = existing.name_any();
    let namespace = existing.namespace().unwrap_or_default();
    info!(%name, %namespace, "updating operator group");

    Api::<OperatorGroup>::namespaced(client.clone(), &namespace)
        .replace(&name, &PostParams::default(), &merged)
        .await
        .map_err(Error::kube("updating", format!("OperatorGroup {namespace}/{name}")))?;
    Ok(true)
}
