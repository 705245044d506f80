use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::status::AddonOperatorStatus;
use super::types::ClusterSecretReference;

/// Operator-wide configuration. A single instance is expected per cluster.
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[kube(
    group = "addons.managed.openshift.io",
    version = "v1alpha1",
    kind = "AddonOperator",
    status = "AddonOperatorStatus",
    printcolumn = r#"{"name":"Status","type":"string","jsonPath":".status.phase"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct AddonOperatorSpec {
    /// OCM API connection. Upgrade policy reporting is disabled when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocm: Option<AddonOperatorOcm>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddonOperatorOcm {
    /// Root URL of the OCM API, e.g. `https://api.openshift.com`.
    pub endpoint: String,
    /// Secret holding the `clusterID` and `accessToken` keys used to
    /// authenticate against OCM.
    pub secret: ClusterSecretReference,
}
