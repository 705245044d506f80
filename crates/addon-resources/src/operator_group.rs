//! Desired state and convergence rules for the OLM OperatorGroup an Addon
//! is installed through.
//!
//! Everything here is pure: the operator fetches/creates/updates, this module
//! decides what the object should look like and whether a write is needed.

use addon_crds::{Addon, AddonInstallType, OperatorGroup, OperatorGroupSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::ResourceExt;

use crate::common;

/// Name of the single OperatorGroup created in an addon's install namespace.
pub const DEFAULT_OPERATOR_GROUP_NAME: &str = "redhat-layered-product-og";

/// Where the OperatorGroup lives and which namespaces it selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallTarget {
    pub namespace: String,
    /// `None` selects all namespaces.
    pub target_namespaces: Option<Vec<String>>,
}

/// Why an addon's install configuration cannot be turned into an
/// OperatorGroup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallConfigError {
    UnsupportedInstallType(String),
    MissingConfig(AddonInstallType),
    EmptyNamespace(AddonInstallType),
}

impl std::fmt::Display for InstallConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InstallConfigError::UnsupportedInstallType(t) => {
                write!(f, "unsupported install type {t:?}")
            }
            InstallConfigError::MissingConfig(t) => {
                write!(f, "install type {t} requires its matching configuration block")
            }
            InstallConfigError::EmptyNamespace(t) => {
                write!(f, "install type {t} requires a non-empty namespace")
            }
        }
    }
}

impl std::error::Error for InstallConfigError {}

/// Validate `spec.install` and derive the OperatorGroup placement from it.
pub fn install_target(addon: &Addon) -> Result<InstallTarget, InstallConfigError> {
    let install = &addon.spec.install;
    match install.install_type {
        AddonInstallType::OlmOwnNamespace => {
            let cfg = install
                .olm_own_namespace
                .as_ref()
                .ok_or(InstallConfigError::MissingConfig(
                    AddonInstallType::OlmOwnNamespace,
                ))?;
            let namespace = non_empty_namespace(&cfg.common.namespace, &install.install_type)?;
            Ok(InstallTarget {
                target_namespaces: Some(vec![namespace.clone()]),
                namespace,
            })
        }
        AddonInstallType::OlmAllNamespaces => {
            let cfg = install
                .olm_all_namespaces
                .as_ref()
                .ok_or(InstallConfigError::MissingConfig(
                    AddonInstallType::OlmAllNamespaces,
                ))?;
            let namespace = non_empty_namespace(&cfg.common.namespace, &install.install_type)?;
            Ok(InstallTarget {
                namespace,
                target_namespaces: None,
            })
        }
        AddonInstallType::Unsupported => Err(InstallConfigError::UnsupportedInstallType(
            install.install_type.to_string(),
        )),
    }
}

fn non_empty_namespace(
    namespace: &str,
    install_type: &AddonInstallType,
) -> Result<String, InstallConfigError> {
    if namespace.is_empty() {
        return Err(InstallConfigError::EmptyNamespace(install_type.clone()));
    }
    Ok(namespace.to_string())
}

/// Build the desired OperatorGroup for `addon`.
pub fn build(addon: &Addon, target: &InstallTarget) -> OperatorGroup {
    OperatorGroup {
        metadata: common::metadata(addon, DEFAULT_OPERATOR_GROUP_NAME, &target.namespace),
        spec: OperatorGroupSpec {
            target_namespaces: target.target_namespaces.clone(),
            ..Default::default()
        },
        status: None,
    }
}

/// True if `og` carries an owner reference to `addon`.
pub fn is_owned_by(og: &OperatorGroup, addon: &Addon) -> bool {
    let Some(uid) = addon.metadata.uid.as_deref() else {
        return false;
    };
    og.owner_references().iter().any(|r| r.uid == uid)
}

/// Make `owner` the controller of `og`.
///
/// An existing reference to the same owner is refreshed in place. Any other
/// controller reference is dropped so the object ends up with exactly one
/// controller; non-controller references are left alone.
pub fn ensure_owner_reference(og: &mut OperatorGroup, owner: &OwnerReference) {
    let refs = og.metadata.owner_references.get_or_insert_with(Vec::new);
    refs.retain(|r| r.uid == owner.uid || r.controller != Some(true));
    match refs.iter_mut().find(|r| r.uid == owner.uid) {
        Some(existing) => *existing = owner.clone(),
        None => refs.push(owner.clone()),
    }
}

/// Merge the operator-managed parts of `desired` into a copy of `existing`.
///
/// Managed parts are `spec.targetNamespaces`, the operator labels and the
/// controller owner reference. Everything else on `existing` (including
/// fields this crate does not model) is kept.
pub fn merge_desired(existing: &OperatorGroup, desired: &OperatorGroup) -> OperatorGroup {
    let mut merged = existing.clone();
    // An absent and an empty list both select all namespaces.
    if !(selects_all_namespaces(existing) && selects_all_namespaces(desired)) {
        merged.spec.target_namespaces = desired.spec.target_namespaces.clone();
    }

    if let Some(desired_labels) = desired.metadata.labels.as_ref() {
        let labels = merged.metadata.labels.get_or_insert_with(Default::default);
        for (k, v) in desired_labels {
            labels.insert(k.clone(), v.clone());
        }
    }

    for owner in desired.metadata.owner_references.iter().flatten() {
        ensure_owner_reference(&mut merged, owner);
    }

    merged
}

fn selects_all_namespaces(og: &OperatorGroup) -> bool {
    og.spec.target_namespaces.as_ref().is_none_or(Vec::is_empty)
}

/// Compare `existing` against `desired` and return the object to write, or
/// `None` when `existing` already matches.
pub fn converge(existing: &OperatorGroup, desired: &OperatorGroup) -> Option<OperatorGroup> {
    let merged = merge_desired(existing, desired);
    let drifted = merged.spec != existing.spec
        || merged.metadata.labels != existing.metadata.labels
        || merged.metadata.owner_references != existing.metadata.owner_references;
    if drifted {
        tracing::debug!(
            name = %existing.name_any(),
            namespace = ?existing.namespace(),
            "operator group drifted from desired state"
        );
        Some(merged)
    } else {
        None
    }
}
