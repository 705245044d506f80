use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::Secret;
use kube::Client;
use kube::api::Api;

#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),
    #[error("Secret {name} has no data")]
    NoData { name: String },
    #[error("Key {key} not found in secret {name}")]
    KeyNotFound { name: String, key: String },
    #[error("Value for key {key} in secret {name} is not valid UTF-8")]
    InvalidUtf8 { name: String, key: String },
}

/// Read several keys from one Secret with a single GET.
///
/// Values come back as UTF-8 strings; the kube client already decodes the
/// base64 Secret data. Fails on the first missing or non UTF-8 key.
pub async fn read_secret_keys(
    client: &Client,
    namespace: &str,
    secret_name: &str,
    keys: &[&str],
) -> Result<BTreeMap<String, String>, SecretError> {
    let api = Api::<Secret>::namespaced(client.clone(), namespace);
    let secret = api.get(secret_name).await?;

    let data = secret.data.ok_or_else(|| SecretError::NoData {
        name: secret_name.to_string(),
    })?;

    let mut values = BTreeMap::new();
    for key in keys {
        let bytes = data.get(*key).ok_or_else(|| SecretError::KeyNotFound {
            name: secret_name.to_string(),
            key: key.to_string(),
        })?;
        let value = String::from_utf8(bytes.0.clone()).map_err(|_| SecretError::InvalidUtf8 {
            name: secret_name.to_string(),
            key: key.to_string(),
        })?;
        values.insert(key.to_string(), value);
    }

    Ok(values)
}
