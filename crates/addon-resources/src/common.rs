use std::collections::BTreeMap;

use addon_crds::Addon;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::Resource;
use kube::api::ObjectMeta;

pub const MANAGER: &str = "addon-operator";

/// Label carrying the name of the Addon a child object belongs to.
pub const ADDON_LABEL: &str = "addons.managed.openshift.io/addon";

pub fn addon_name(addon: &Addon) -> String {
    addon
        .metadata
        .name
        .clone()
        .unwrap_or_else(|| "unknown".to_string())
}

pub fn labels(addon: &Addon) -> BTreeMap<String, String> {
    BTreeMap::from([
        (ADDON_LABEL.into(), addon_name(addon)),
        ("app.kubernetes.io/managed-by".into(), MANAGER.into()),
    ])
}

/// Controller owner reference pointing at `addon`.
///
/// `None` when the addon has not been persisted yet (no uid).
pub fn owner_reference(addon: &Addon) -> Option<OwnerReference> {
    addon.controller_owner_ref(&())
}

pub fn metadata(addon: &Addon, name: &str, namespace: &str) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: Some(namespace.to_string()),
        labels: Some(labels(addon)),
        owner_references: owner_reference(addon).map(|r| vec![r]),
        ..Default::default()
    }
}
