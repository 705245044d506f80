//! Reporting of addon install/upgrade progress to the OCM upgrade policy
//! endpoint.
//!
//! The last reported state lives in `status.upgradePolicy`. A new record is
//! only produced after OCM accepted the corresponding request, so a failed
//! call simply repeats the same decision on the next pass.

use addon_api::{
    OcmClient, UpgradePolicyGetRequest, UpgradePolicyPatchRequest, UpgradePolicyValue,
};
use addon_crds::{Addon, AddonUpgradePolicyStatus, AddonUpgradePolicyValue};
use kube::ResourceExt;
use tracing::{debug, info};

use crate::context::Context;
use crate::error::Error;
use crate::metrics::{increment_upgrade_policy_reports, record_ocm_request_duration};

/// True when the addon has a version and policy to report against and the
/// current version has not been reported as completed yet.
pub fn requires_reporting(addon: &Addon) -> bool {
    !addon.spec.version.is_empty()
        && addon.spec.upgrade_policy.is_some()
        && !addon.upgrade_complete_for_current_version()
}

/// Run one reporting decision for `addon`.
///
/// Returns the status record to persist, or `None` when nothing was reported
/// (reporting not required, gateway not configured, or upgrade still in
/// progress).
pub async fn handle_upgrade_policy_reporting(
    ctx: &Context,
    addon: &Addon,
) -> Result<Option<AddonUpgradePolicyStatus>, Error> {
    if !requires_reporting(addon) {
        return Ok(None);
    }
    let Some(policy) = addon.spec.upgrade_policy.as_ref() else {
        return Ok(None);
    };

    let Some(ocm) = ctx.ocm.current().await else {
        debug!(
            addon = %addon.name_any(),
            "OCM client not configured, deferring upgrade policy report"
        );
        return Ok(None);
    };

    let reporter = PolicyReporter {
        ctx,
        ocm: &ocm,
        addon,
        policy_id: &policy.id,
    };
    let version = addon.spec.version.as_str();
    let current = addon.status.as_ref().and_then(|s| s.upgrade_policy.as_ref());

    let Some(current) = current else {
        return reporter.report(AddonUpgradePolicyValue::Started).await.map(Some);
    };

    if current.version.is_empty() {
        let state = reporter.get_state().await?;
        if state == UpgradePolicyValue::Completed {
            info!(
                addon = %addon.name_any(),
                policy = %policy.id,
                %version,
                "upgrade policy already completed in OCM, recording locally"
            );
            return Ok(Some(reporter.record(AddonUpgradePolicyValue::Completed)));
        }
        // Not completed: keep evaluating against the recorded status.
    }

    if current.version != version {
        return reporter.report(AddonUpgradePolicyValue::Started).await.map(Some);
    }

    if addon.is_available() {
        return reporter.report(AddonUpgradePolicyValue::Completed).await.map(Some);
    }

    debug!(
        addon = %addon.name_any(),
        %version,
        "upgrade in progress, addon not yet available"
    );
    Ok(None)
}

/// Everything needed to talk about one addon's policy with one client
/// snapshot.
struct PolicyReporter<'a> {
    ctx: &'a Context,
    ocm: &'a OcmClient,
    addon: &'a Addon,
    policy_id: &'a str,
}

impl PolicyReporter<'_> {
    fn version(&self) -> &str {
        &self.addon.spec.version
    }

    async fn get_state(&self) -> Result<UpgradePolicyValue, Error> {
        let req = UpgradePolicyGetRequest {
            id: self.policy_id.to_string(),
        };
        let state = record_ocm_request_duration(
            self.ctx.recorder.as_deref(),
            self.ocm.get_upgrade_policy(&req),
        )
        .await
        .map_err(|source| self.ocm_error("getting state of", source))?;
        Ok(state.value)
    }

    async fn report(
        &self,
        value: AddonUpgradePolicyValue,
    ) -> Result<AddonUpgradePolicyStatus, Error> {
        let version = self.version();
        let (ocm_value, description, operation) = match value {
            AddonUpgradePolicyValue::Started => (
                UpgradePolicyValue::Started,
                format!("Upgrading addon to version {version:?}."),
                "reporting started to",
            ),
            AddonUpgradePolicyValue::Completed => (
                UpgradePolicyValue::Completed,
                format!("Addon was healthy at least once at version {version:?}."),
                "reporting completed to",
            ),
        };

        let req = UpgradePolicyPatchRequest {
            id: self.policy_id.to_string(),
            value: ocm_value,
            description,
        };
        record_ocm_request_duration(
            self.ctx.recorder.as_deref(),
            self.ocm.patch_upgrade_policy(&req),
        )
        .await
        .map_err(|source| self.ocm_error(operation, source))?;

        increment_upgrade_policy_reports(value.as_str());
        info!(
            addon = %self.addon.name_any(),
            policy = %self.policy_id,
            %version,
            %value,
            "reported upgrade policy state"
        );
        Ok(self.record(value))
    }

    fn record(&self, value: AddonUpgradePolicyValue) -> AddonUpgradePolicyStatus {
        AddonUpgradePolicyStatus {
            id: self.policy_id.to_string(),
            version: self.version().to_string(),
            value,
            observed_generation: self.addon.metadata.generation.unwrap_or(0),
        }
    }

    fn ocm_error(&self, operation: &'static str, source: addon_api::ApiError) -> Error {
        Error::Ocm {
            operation,
            policy_id: self.policy_id.to_string(),
            version: self.version().to_string(),
            source,
        }
    }
}
