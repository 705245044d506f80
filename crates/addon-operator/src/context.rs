use std::sync::Arc;
use std::time::Duration;

use kube::Client;
use kube::runtime::events::Reporter;
use tracing::{info, warn};

use crate::gateway::OcmGateway;
use crate::metrics::{DurationRecorder, PrometheusRecorder};

const DEFAULT_ADDON_OPERATOR_NAME: &str = "addon-operator";
const DEFAULT_OCM_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Operator settings read from the environment at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorConfig {
    /// Name of the singleton AddonOperator object (`ADDON_OPERATOR_NAME`).
    pub addon_operator_name: String,
    /// Per-request deadline for OCM calls (`OCM_REQUEST_TIMEOUT_SECS`).
    pub ocm_request_timeout: Duration,
    /// Whether OCM request latencies are recorded (`OCM_METRICS_ENABLED`).
    pub ocm_metrics_enabled: bool,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            addon_operator_name: DEFAULT_ADDON_OPERATOR_NAME.into(),
            ocm_request_timeout: DEFAULT_OCM_REQUEST_TIMEOUT,
            ocm_metrics_enabled: true,
        }
    }
}

impl OperatorConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let addon_operator_name = std::env::var("ADDON_OPERATOR_NAME")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.addon_operator_name);

        let ocm_request_timeout = match std::env::var("OCM_REQUEST_TIMEOUT_SECS") {
            Ok(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    warn!(value = %raw, "invalid OCM_REQUEST_TIMEOUT_SECS, using default");
                    defaults.ocm_request_timeout
                }
            },
            Err(_) => defaults.ocm_request_timeout,
        };

        let ocm_metrics_enabled = std::env::var("OCM_METRICS_ENABLED")
            .map(|v| !(v == "false" || v == "0"))
            .unwrap_or(defaults.ocm_metrics_enabled);

        let config = Self {
            addon_operator_name,
            ocm_request_timeout,
            ocm_metrics_enabled,
        };
        info!(?config, "loaded operator config");
        config
    }
}

pub struct Context {
    pub client: Client,
    /// Reporter identity used when publishing Kubernetes Events.
    pub reporter: Reporter,
    /// Shared, swappable OCM client handle.
    pub ocm: OcmGateway,
    /// OCM latency sink; `None` leaves OCM calls unmetered.
    pub recorder: Option<Arc<dyn DurationRecorder>>,
    pub config: OperatorConfig,
}

impl Context {
    pub fn new(client: Client, config: OperatorConfig) -> Self {
        let reporter = Reporter {
            controller: "addon-operator".into(),
            instance: std::env::var("POD_NAME").ok(),
        };
        let recorder: Option<Arc<dyn DurationRecorder>> = if config.ocm_metrics_enabled {
            Some(Arc::new(PrometheusRecorder))
        } else {
            None
        };
        Self {
            client,
            reporter,
            ocm: OcmGateway::new(),
            recorder,
            config,
        }
    }
}
