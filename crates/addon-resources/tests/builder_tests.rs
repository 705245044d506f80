use addon_crds::*;
use addon_resources::operator_group::{
    self, DEFAULT_OPERATOR_GROUP_NAME, InstallConfigError, InstallTarget,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};

const CATALOG_IMAGE: &str = "quay.io/osd-addons/test:sha256:04864220677b2ed6244f2e0d421166df908986700647595ffdb6fd9ca4e5098a";

fn make_addon(install: AddonInstallSpec) -> Addon {
    Addon {
        metadata: ObjectMeta {
            name: Some("addon-1".into()),
            uid: Some("addon-uid-1".into()),
            ..Default::default()
        },
        spec: AddonSpec {
            install,
            ..Default::default()
        },
        status: None,
    }
}

fn own_namespace_addon(ns: &str) -> Addon {
    make_addon(AddonInstallSpec {
        install_type: AddonInstallType::OlmOwnNamespace,
        olm_own_namespace: Some(AddonInstallOlmOwnNamespace::in_namespace(ns, CATALOG_IMAGE)),
        ..Default::default()
    })
}

fn all_namespaces_addon(ns: &str) -> Addon {
    make_addon(AddonInstallSpec {
        install_type: AddonInstallType::OlmAllNamespaces,
        olm_all_namespaces: Some(AddonInstallOlmAllNamespaces::in_namespace(ns, CATALOG_IMAGE)),
        ..Default::default()
    })
}

fn foreign_owner(uid: &str, controller: bool) -> OwnerReference {
    OwnerReference {
        api_version: "example.com/v1".into(),
        kind: "Other".into(),
        name: "other".into(),
        uid: uid.into(),
        controller: Some(controller),
        block_owner_deletion: None,
    }
}

// ---------------------------------------------------------------------------
// install_target
// ---------------------------------------------------------------------------

#[test]
fn test_install_target_own_namespace() {
    let target = operator_group::install_target(&own_namespace_addon("addon-system")).unwrap();
    assert_eq!(
        target,
        InstallTarget {
            namespace: "addon-system".into(),
            target_namespaces: Some(vec!["addon-system".into()]),
        }
    );
}

#[test]
fn test_install_target_all_namespaces() {
    let target = operator_group::install_target(&all_namespaces_addon("addon-system")).unwrap();
    assert_eq!(target.namespace, "addon-system");
    assert!(target.target_namespaces.is_none());
}

#[test]
fn test_install_target_rejects_invalid_shapes() {
    let cases = [
        (
            "own namespace config missing",
            AddonInstallSpec {
                install_type: AddonInstallType::OlmOwnNamespace,
                ..Default::default()
            },
            InstallConfigError::MissingConfig(AddonInstallType::OlmOwnNamespace),
        ),
        (
            "own namespace with empty namespace",
            AddonInstallSpec {
                install_type: AddonInstallType::OlmOwnNamespace,
                olm_own_namespace: Some(AddonInstallOlmOwnNamespace::default()),
                ..Default::default()
            },
            InstallConfigError::EmptyNamespace(AddonInstallType::OlmOwnNamespace),
        ),
        (
            "all namespaces config missing",
            AddonInstallSpec {
                install_type: AddonInstallType::OlmAllNamespaces,
                ..Default::default()
            },
            InstallConfigError::MissingConfig(AddonInstallType::OlmAllNamespaces),
        ),
        (
            "all namespaces with empty namespace",
            AddonInstallSpec {
                install_type: AddonInstallType::OlmAllNamespaces,
                olm_all_namespaces: Some(AddonInstallOlmAllNamespaces::default()),
                ..Default::default()
            },
            InstallConfigError::EmptyNamespace(AddonInstallType::OlmAllNamespaces),
        ),
    ];

    for (name, install, expected) in cases {
        let err = operator_group::install_target(&make_addon(install)).unwrap_err();
        assert_eq!(err, expected, "case: {name}");
    }
}

#[test]
fn test_install_target_rejects_unsupported_type() {
    let addon = make_addon(AddonInstallSpec {
        install_type: AddonInstallType::Unsupported,
        ..Default::default()
    });
    let err = operator_group::install_target(&addon).unwrap_err();
    assert!(matches!(err, InstallConfigError::UnsupportedInstallType(_)));
    assert!(err.to_string().contains("unsupported install type"));
}

#[test]
fn test_install_target_ignores_config_of_other_variant() {
    // An AllNamespaces addon that only fills in the OwnNamespace block is
    // still invalid.
    let addon = make_addon(AddonInstallSpec {
        install_type: AddonInstallType::OlmAllNamespaces,
        olm_own_namespace: Some(AddonInstallOlmOwnNamespace::in_namespace(
            "addon-system",
            CATALOG_IMAGE,
        )),
        ..Default::default()
    });
    assert!(operator_group::install_target(&addon).is_err());
}

// ---------------------------------------------------------------------------
// build
// ---------------------------------------------------------------------------

#[test]
fn test_build_sets_name_namespace_and_owner() {
    let addon = own_namespace_addon("addon-system");
    let target = operator_group::install_target(&addon).unwrap();
    let og = operator_group::build(&addon, &target);

    assert_eq!(og.metadata.name.as_deref(), Some(DEFAULT_OPERATOR_GROUP_NAME));
    assert_eq!(og.metadata.namespace.as_deref(), Some("addon-system"));
    assert_eq!(
        og.spec.target_namespaces,
        Some(vec!["addon-system".to_string()])
    );

    let owners = og.metadata.owner_references.as_ref().unwrap();
    assert_eq!(owners.len(), 1);
    assert_eq!(owners[0].uid, "addon-uid-1");
    assert_eq!(owners[0].kind, "Addon");
    assert_eq!(owners[0].controller, Some(true));
    assert!(operator_group::is_owned_by(&og, &addon));

    let labels = og.metadata.labels.as_ref().unwrap();
    assert_eq!(labels["addons.managed.openshift.io/addon"], "addon-1");
    assert_eq!(labels["app.kubernetes.io/managed-by"], "addon-operator");
}

#[test]
fn test_build_without_uid_has_no_owner() {
    let mut addon = all_namespaces_addon("addon-system");
    addon.metadata.uid = None;
    let og = operator_group::build(&addon, &operator_group::install_target(&addon).unwrap());
    assert!(og.metadata.owner_references.is_none());
    assert!(!operator_group::is_owned_by(&og, &addon));
}

// ---------------------------------------------------------------------------
// ownership
// ---------------------------------------------------------------------------

#[test]
fn test_ensure_owner_reference_replaces_foreign_controller() {
    let addon = own_namespace_addon("addon-system");
    let desired = operator_group::build(&addon, &operator_group::install_target(&addon).unwrap());
    let owner = desired.metadata.owner_references.as_ref().unwrap()[0].clone();

    let mut og = OperatorGroup::new(DEFAULT_OPERATOR_GROUP_NAME, OperatorGroupSpec::default());
    og.metadata.owner_references = Some(vec![
        foreign_owner("foreign-controller", true),
        foreign_owner("foreign-plain", false),
    ]);

    operator_group::ensure_owner_reference(&mut og, &owner);

    let uids: Vec<&str> = og
        .metadata
        .owner_references
        .as_ref()
        .unwrap()
        .iter()
        .map(|r| r.uid.as_str())
        .collect();
    assert_eq!(uids, vec!["foreign-plain", "addon-uid-1"]);
}

#[test]
fn test_ensure_owner_reference_is_idempotent() {
    let addon = own_namespace_addon("addon-system");
    let mut og = operator_group::build(&addon, &operator_group::install_target(&addon).unwrap());
    let owner = og.metadata.owner_references.as_ref().unwrap()[0].clone();

    operator_group::ensure_owner_reference(&mut og, &owner);
    operator_group::ensure_owner_reference(&mut og, &owner);
    assert_eq!(og.metadata.owner_references.as_ref().unwrap().len(), 1);
}

// ---------------------------------------------------------------------------
// converge
// ---------------------------------------------------------------------------

#[test]
fn test_converge_no_drift_returns_none() {
    let addon = own_namespace_addon("addon-system");
    let desired = operator_group::build(&addon, &operator_group::install_target(&addon).unwrap());
    let mut existing = desired.clone();
    existing.metadata.resource_version = Some("42".into());

    assert!(operator_group::converge(&existing, &desired).is_none());
}

#[test]
fn test_converge_adopts_unowned_object() {
    let addon = own_namespace_addon("addon-system");
    let desired = operator_group::build(&addon, &operator_group::install_target(&addon).unwrap());
    let mut existing = desired.clone();
    existing.metadata.owner_references = None;
    existing.metadata.resource_version = Some("42".into());

    let merged = operator_group::converge(&existing, &desired).expect("update expected");
    assert!(operator_group::is_owned_by(&merged, &addon));
    assert_eq!(merged.metadata.resource_version.as_deref(), Some("42"));
}

#[test]
fn test_converge_fixes_target_namespace_drift_and_keeps_unmodelled_fields() {
    let addon = all_namespaces_addon("addon-system");
    let desired = operator_group::build(&addon, &operator_group::install_target(&addon).unwrap());
    let mut existing = desired.clone();
    existing.spec.target_namespaces = Some(vec!["somewhere-else".into()]);
    existing.spec.extra.insert(
        "upgradeStrategy".into(),
        serde_json::json!({ "name": "Default" }),
    );

    let merged = operator_group::converge(&existing, &desired).expect("update expected");
    assert!(merged.spec.target_namespaces.is_none());
    assert!(merged.spec.extra.contains_key("upgradeStrategy"));
}

#[test]
fn test_converge_treats_empty_target_namespaces_as_all_namespaces() {
    let addon = all_namespaces_addon("addon-system");
    let desired = operator_group::build(&addon, &operator_group::install_target(&addon).unwrap());
    let mut existing = desired.clone();
    existing.spec.target_namespaces = Some(vec![]);

    assert!(operator_group::converge(&existing, &desired).is_none());

    // An own-namespace group still needs its namespace filled in.
    let addon = own_namespace_addon("addon-system");
    let desired = operator_group::build(&addon, &operator_group::install_target(&addon).unwrap());
    let mut existing = desired.clone();
    existing.spec.target_namespaces = Some(vec![]);

    let merged = operator_group::converge(&existing, &desired).expect("update expected");
    assert_eq!(merged.spec.target_namespaces, Some(vec!["addon-system".to_string()]));
}

#[test]
fn test_converge_keeps_foreign_labels() {
    let addon = own_namespace_addon("addon-system");
    let desired = operator_group::build(&addon, &operator_group::install_target(&addon).unwrap());
    let mut existing = desired.clone();
    existing
        .metadata
        .labels
        .get_or_insert_with(Default::default)
        .insert("team".into(), "platform".into());

    // Extra labels alone are not drift.
    assert!(operator_group::converge(&existing, &desired).is_none());

    existing
        .metadata
        .labels
        .as_mut()
        .unwrap()
        .remove("app.kubernetes.io/managed-by");
    let merged = operator_group::converge(&existing, &desired).expect("update expected");
    let labels = merged.metadata.labels.unwrap();
    assert_eq!(labels["team"], "platform");
    assert_eq!(labels["app.kubernetes.io/managed-by"], "addon-operator");
}
