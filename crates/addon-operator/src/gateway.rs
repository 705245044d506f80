use std::sync::{Arc, Mutex, PoisonError};

use addon_api::OcmClient;
use futures::channel::mpsc;
use tokio::sync::RwLock;

/// Process-wide handle to the OCM client.
///
/// Every Addon worker reads the handle; the AddonOperator controller swaps it
/// when the OCM configuration or credentials change. Readers hold the shared
/// lock only long enough to clone the client, so a slow OCM round trip never
/// blocks a swap or other workers.
#[derive(Clone)]
pub struct OcmGateway {
    client: Arc<RwLock<Option<OcmClient>>>,
    subscribers: Arc<Mutex<Vec<mpsc::UnboundedSender<()>>>>,
}

impl Default for OcmGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl OcmGateway {
    /// A gateway with no client; reporting is deferred until one is set.
    pub fn new() -> Self {
        Self {
            client: Arc::new(RwLock::new(None)),
            subscribers: Arc::default(),
        }
    }

    pub fn with_client(client: OcmClient) -> Self {
        Self {
            client: Arc::new(RwLock::new(Some(client))),
            subscribers: Arc::default(),
        }
    }

    /// Snapshot of the current client, if any.
    ///
    /// One reporting decision should use a single snapshot so that a swap in
    /// the middle of it cannot mix credentials.
    pub async fn current(&self) -> Option<OcmClient> {
        self.client.read().await.clone()
    }

    pub async fn is_configured(&self) -> bool {
        self.client.read().await.is_some()
    }

    /// Install `client`, replacing any previous one. Returns `true` when the
    /// gateway was empty before.
    pub async fn replace(&self, client: OcmClient) -> bool {
        let mut guard = self.client.write().await;
        let was_empty = guard.is_none();
        *guard = Some(client);
        drop(guard);

        if was_empty {
            self.subscribers
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .retain(|tx| tx.unbounded_send(()).is_ok());
        }
        was_empty
    }

    /// Remove the client; reporting is deferred until a new one is set.
    pub async fn clear(&self) {
        *self.client.write().await = None;
    }

    /// Yields once each time the gateway goes from empty to configured.
    ///
    /// Used to requeue every Addon so reporting deferred while no client was
    /// available resumes without waiting for the periodic resync.
    pub fn became_configured(&self) -> mpsc::UnboundedReceiver<()> {
        let (tx, rx) = mpsc::unbounded();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }
}

impl std::fmt::Debug for OcmGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OcmGateway").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use std::time::Duration;

    fn client(cluster: &str) -> OcmClient {
        OcmClient::new("https://api.openshift.com", cluster, "token", None).unwrap()
    }

    #[tokio::test]
    async fn test_new_gateway_is_empty() {
        let gateway = OcmGateway::new();
        assert!(gateway.current().await.is_none());
        assert!(!gateway.is_configured().await);
    }

    #[tokio::test]
    async fn test_replace_reports_first_configuration() {
        let gateway = OcmGateway::new();
        assert!(gateway.replace(client("a")).await);
        assert!(!gateway.replace(client("b")).await);
        assert_eq!(gateway.current().await.unwrap().cluster_id(), "b");
    }

    #[tokio::test]
    async fn test_clear_removes_client() {
        let gateway = OcmGateway::with_client(client("a"));
        assert!(gateway.is_configured().await);
        gateway.clear().await;
        assert!(gateway.current().await.is_none());
        assert!(gateway.replace(client("b")).await);
    }

    #[tokio::test]
    async fn test_clones_share_the_handle() {
        let gateway = OcmGateway::new();
        let worker_view = gateway.clone();
        gateway.replace(client("a")).await;
        assert_eq!(worker_view.current().await.unwrap().cluster_id(), "a");
    }

    #[tokio::test]
    async fn test_snapshot_survives_swap() {
        let gateway = OcmGateway::with_client(client("a"));
        let snapshot = gateway.current().await.unwrap();
        gateway.replace(client("b")).await;
        assert_eq!(snapshot.cluster_id(), "a");
    }

    #[tokio::test]
    async fn test_became_configured_fires_on_transition_only() {
        let gateway = OcmGateway::new();
        let mut events = gateway.became_configured();

        gateway.replace(client("a")).await;
        tokio::time::timeout(Duration::from_secs(1), events.next())
            .await
            .expect("first configuration should notify")
            .expect("stream open");

        // Swapping credentials is not a new transition.
        gateway.replace(client("b")).await;
        assert!(
            tokio::time::timeout(Duration::from_millis(50), events.next())
                .await
                .is_err()
        );

        gateway.clear().await;
        gateway.replace(client("c")).await;
        tokio::time::timeout(Duration::from_secs(1), events.next())
            .await
            .expect("reconfiguration should notify")
            .expect("stream open");
    }
}
