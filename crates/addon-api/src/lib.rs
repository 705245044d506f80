pub mod client;
pub mod k8s;
pub mod ocm;

pub use client::{ApiError, HttpClient};
pub use k8s::{SecretError, read_secret_keys};
pub use ocm::{
    OcmClient, UpgradePolicyGetRequest, UpgradePolicyPatchRequest, UpgradePolicyState,
    UpgradePolicyValue,
};
