use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Install topology of an Addon.
///
/// Tags the API server does not know about still deserialize (as
/// [`AddonInstallType::Unsupported`]) so the operator can report them as a
/// configuration error instead of failing to decode the whole object.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, JsonSchema)]
pub enum AddonInstallType {
    /// Install into a single namespace that only watches itself.
    #[default]
    #[serde(rename = "OLMOwnNamespace")]
    OlmOwnNamespace,
    /// Install into a single namespace but watch the whole cluster.
    #[serde(rename = "OLMAllNamespaces")]
    OlmAllNamespaces,
    #[serde(other)]
    Unsupported,
}

impl AddonInstallType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AddonInstallType::OlmOwnNamespace => "OLMOwnNamespace",
            AddonInstallType::OlmAllNamespaces => "OLMAllNamespaces",
            AddonInstallType::Unsupported => "Unsupported",
        }
    }
}

impl std::fmt::Display for AddonInstallType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddonInstallSpec {
    #[serde(rename = "type")]
    pub install_type: AddonInstallType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub olm_own_namespace: Option<AddonInstallOlmOwnNamespace>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub olm_all_namespaces: Option<AddonInstallOlmAllNamespaces>,
}

/// Settings shared by every OLM based install type.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddonInstallOlmCommon {
    /// Namespace the operator is installed into. Also hosts the OperatorGroup.
    #[serde(default)]
    pub namespace: String,
    /// Catalog image (usually pinned by digest) that provides the operator bundle.
    #[serde(default)]
    pub catalog_source_image: String,
    #[serde(default)]
    pub channel: String,
    #[serde(default)]
    pub package_name: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddonInstallOlmOwnNamespace {
    #[serde(flatten)]
    pub common: AddonInstallOlmCommon,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddonInstallOlmAllNamespaces {
    #[serde(flatten)]
    pub common: AddonInstallOlmCommon,
}

impl AddonInstallOlmOwnNamespace {
    pub fn in_namespace(namespace: &str, catalog_source_image: &str) -> Self {
        Self {
            common: AddonInstallOlmCommon {
                namespace: namespace.to_string(),
                catalog_source_image: catalog_source_image.to_string(),
                ..Default::default()
            },
        }
    }
}

impl AddonInstallOlmAllNamespaces {
    pub fn in_namespace(namespace: &str, catalog_source_image: &str) -> Self {
        Self {
            common: AddonInstallOlmCommon {
                namespace: namespace.to_string(),
                catalog_source_image: catalog_source_image.to_string(),
                ..Default::default()
            },
        }
    }
}

/// Reference to an OCM upgrade policy the operator reports progress against.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddonUpgradePolicy {
    /// Upgrade policy id in OCM.
    pub id: String,
}

/// Points at a Secret in any namespace.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSecretReference {
    pub name: String,
    pub namespace: String,
}
