use addon_api::{ApiError, SecretError};
use thiserror::Error;

/// Faults returned from reconcilers. Each is retried by requeueing the whole
/// pass through the controller's error policy.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{operation} {resource}: {source}")]
    Kube {
        operation: &'static str,
        resource: String,
        #[source]
        source: kube::Error,
    },

    #[error("{operation} upgrade policy {policy_id:?} at version {version:?}: {source}")]
    Ocm {
        operation: &'static str,
        policy_id: String,
        version: String,
        #[source]
        source: ApiError,
    },

    #[error("reading OCM credentials from secret {namespace}/{name}: {source}")]
    OcmCredentials {
        namespace: String,
        name: String,
        #[source]
        source: SecretError,
    },

    #[error("building OCM client: {0}")]
    OcmClient(#[source] ApiError),
}

impl Error {
    /// Returns a closure wrapping a [`kube::Error`] with the failed operation
    /// and the object it targeted.
    pub fn kube(
        operation: &'static str,
        resource: impl Into<String>,
    ) -> impl FnOnce(kube::Error) -> Self {
        let resource = resource.into();
        move |source| Error::Kube {
            operation,
            resource,
            source,
        }
    }

    /// True when an OCM request was abandoned because its deadline elapsed,
    /// as opposed to OCM answering with an error.
    pub fn is_timeout(&self) -> bool {
        match self {
            Error::Ocm { source, .. } | Error::OcmClient(source) => source.is_timeout(),
            _ => false,
        }
    }

    /// True when a write lost an optimistic concurrency race.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Kube { source: kube::Error::Api(err), .. } if err.code == 409)
    }
}

/// True for a 404 from the Kubernetes API.
pub fn is_not_found(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(err) if err.code == 404)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ocm_error_display_names_policy_and_version() {
        let err = Error::Ocm {
            operation: "reporting started to",
            policy_id: "policy-1".into(),
            version: "1.2.0".into(),
            source: ApiError::ApiResponse {
                status: 502,
                body: "bad gateway".into(),
            },
        };
        assert_eq!(
            err.to_string(),
            "reporting started to upgrade policy \"policy-1\" at version \"1.2.0\": API returned 502: bad gateway"
        );
        assert!(!err.is_timeout());
    }

    #[test]
    fn test_timeout_is_distinguishable() {
        let err = Error::Ocm {
            operation: "getting state of",
            policy_id: "policy-1".into(),
            version: "1.2.0".into(),
            source: ApiError::Timeout,
        };
        assert!(err.is_timeout());
        assert!(!err.is_conflict());
    }

    #[test]
    fn test_credentials_error_display() {
        let err = Error::OcmCredentials {
            namespace: "openshift-config".into(),
            name: "ocm".into(),
            source: SecretError::NoData { name: "ocm".into() },
        };
        assert_eq!(
            err.to_string(),
            "reading OCM credentials from secret openshift-config/ocm: Secret ocm has no data"
        );
    }
}
