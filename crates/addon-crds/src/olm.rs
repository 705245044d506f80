//! Subset of the OLM `operators.coreos.com/v1` API the operator writes to.
//!
//! The CRD itself is owned by OLM, so no schema is generated here. Fields
//! this crate does not model are carried through `extra` so that an update
//! never drops them.

use std::collections::BTreeMap;

use kube::CustomResource;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[kube(
    group = "operators.coreos.com",
    version = "v1",
    kind = "OperatorGroup",
    namespaced,
    status = "OperatorGroupStatus",
    schema = "disabled"
)]
#[serde(rename_all = "camelCase")]
pub struct OperatorGroupSpec {
    /// Namespaces the member operators may watch. Empty or absent selects
    /// all namespaces.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_namespaces: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_account_name: Option<String>,

    #[serde(
        rename = "staticProvidedAPIs",
        default,
        skip_serializing_if = "std::ops::Not::not"
    )]
    pub static_provided_apis: bool,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OperatorGroupStatus {
    #[serde(default)]
    pub namespaces: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}
