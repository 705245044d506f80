use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::status::{AddonStatus, AddonUpgradePolicyValue, condition_types};
use super::types::*;

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[kube(
    group = "addons.managed.openshift.io",
    version = "v1alpha1",
    kind = "Addon",
    status = "AddonStatus",
    shortname = "addon",
    printcolumn = r#"{"name":"Version","type":"string","jsonPath":".spec.version"}"#,
    printcolumn = r#"{"name":"Status","type":"string","jsonPath":".status.phase"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct AddonSpec {
    /// Human readable name of the addon.
    #[serde(default)]
    pub display_name: String,

    /// Version the addon is expected to be installed at. Upgrade progress is
    /// reported to OCM for this version.
    #[serde(default)]
    pub version: String,

    pub install: AddonInstallSpec,

    /// OCM upgrade policy to report install/upgrade progress to. Reporting is
    /// disabled when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upgrade_policy: Option<AddonUpgradePolicy>,
}

impl Addon {
    /// True if the addon status carries `Available=True`.
    pub fn is_available(&self) -> bool {
        self.status
            .as_ref()
            .is_some_and(|s| s.is_condition_true(condition_types::AVAILABLE))
    }

    /// True if an upgrade to `spec.version` was already reported as completed.
    pub fn upgrade_complete_for_current_version(&self) -> bool {
        self.status
            .as_ref()
            .and_then(|s| s.upgrade_policy.as_ref())
            .is_some_and(|up| {
                up.value == AddonUpgradePolicyValue::Completed && up.version == self.spec.version
            })
    }
}
