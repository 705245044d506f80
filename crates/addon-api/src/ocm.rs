use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::{ApiError, HttpClient};

/// State of an OCM addon upgrade policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpgradePolicyValue {
    /// The upgrade has not been picked up yet.
    #[serde(rename = "pending")]
    NotStarted,
    Started,
    Completed,
    /// Any state this client does not act on (scheduled, delayed, failed, ...).
    #[serde(other)]
    Other,
}

impl UpgradePolicyValue {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpgradePolicyValue::NotStarted => "pending",
            UpgradePolicyValue::Started => "started",
            UpgradePolicyValue::Completed => "completed",
            UpgradePolicyValue::Other => "other",
        }
    }
}

impl std::fmt::Display for UpgradePolicyValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradePolicyGetRequest {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpgradePolicyPatchRequest {
    #[serde(skip)]
    pub id: String,
    pub value: UpgradePolicyValue,
    pub description: String,
}

/// Body of the `/state` resource of an addon upgrade policy.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UpgradePolicyState {
    pub value: UpgradePolicyValue,
    #[serde(default)]
    pub description: String,
}

/// Client for the OCM clusters_mgmt addon upgrade policy API.
///
/// Requests are scoped to a single cluster and authenticated with the
/// cluster's access token (`Authorization: AccessToken <cluster>:<token>`).
#[derive(Debug, Clone)]
pub struct OcmClient {
    http: HttpClient,
    cluster_id: String,
}

impl OcmClient {
    /// Create a new OCM client.
    ///
    /// `endpoint` is the API root (e.g. `https://api.openshift.com`); the
    /// `api/clusters_mgmt/v1/` prefix is appended per request.
    pub fn new(
        endpoint: &str,
        cluster_id: &str,
        access_token: &str,
        timeout: Option<Duration>,
    ) -> Result<Self, ApiError> {
        let url = format!("{}/", endpoint.trim_end_matches('/'));
        let auth = format!("AccessToken {cluster_id}:{access_token}");
        Ok(Self {
            http: HttpClient::new(&url, Some(&auth), timeout)?,
            cluster_id: cluster_id.to_string(),
        })
    }

    pub fn cluster_id(&self) -> &str {
        &self.cluster_id
    }

    pub fn endpoint(&self) -> &str {
        self.http.base_url().as_str()
    }

    /// GET `.../addon_upgrade_policies/{id}/state`.
    pub async fn get_upgrade_policy(
        &self,
        req: &UpgradePolicyGetRequest,
    ) -> Result<UpgradePolicyState, ApiError> {
        debug!(cluster = %self.cluster_id, policy = %req.id, "getting upgrade policy state");
        self.http.get(&self.state_path(&req.id)).await
    }

    /// PATCH `.../addon_upgrade_policies/{id}/state` with a new value.
    pub async fn patch_upgrade_policy(
        &self,
        req: &UpgradePolicyPatchRequest,
    ) -> Result<UpgradePolicyState, ApiError> {
        debug!(
            cluster = %self.cluster_id,
            policy = %req.id,
            value = %req.value,
            "patching upgrade policy state"
        );
        self.http.patch(&self.state_path(&req.id), req).await
    }

    fn state_path(&self, policy_id: &str) -> String {
        format!(
            "api/clusters_mgmt/v1/clusters/{}/addon_upgrade_policies/{}/state",
            self.cluster_id, policy_id
        )
    }
}
