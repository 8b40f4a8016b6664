//! Periodic liveness prober.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tokio::time;
use url::Url;

use crate::balance::BackendRegistry;
use crate::observability::metrics;

/// Background prober: a bare connect-and-close against every backend on a
/// fixed interval.
pub struct Prober {
    registry: Arc<BackendRegistry>,
    interval: Duration,
    timeout: Duration,
}

impl Prober {
    pub fn new(registry: Arc<BackendRegistry>, interval: Duration, timeout: Duration) -> Self {
        Self {
            registry,
            interval,
            timeout,
        }
    }

    /// Run one full sweep over the current backend snapshot.
    ///
    /// Callable on its own, so an externally owned ticker can drive the
    /// prober instead of [`run`](Self::run).
    pub async fn check(&self) {
        for backend in self.registry.backends() {
            let alive = self.dial(backend.url()).await;
            backend.set_alive(alive);

            let status = if alive { "up" } else { "down" };
            tracing::info!(backend = %backend.url(), status, "Liveness probe");
            metrics::record_backend_health(backend.url().as_str(), alive);
        }
    }

    async fn dial(&self, url: &Url) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };
        let Some(port) = url.port_or_known_default() else {
            return false;
        };

        match time::timeout(self.timeout, TcpStream::connect((host, port))).await {
            Ok(Ok(_conn)) => true,
            Ok(Err(e)) => {
                tracing::warn!(backend = %url, error = %e, "Backend unreachable");
                false
            }
            Err(_) => {
                tracing::warn!(backend = %url, timeout = ?self.timeout, "Liveness probe timed out");
                false
            }
        }
    }

    /// Probe on the configured interval until shutdown.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            timeout_secs = self.timeout.as_secs(),
            "Liveness prober starting"
        );

        let mut ticker = time::interval(self.interval);
        // The first tick of a tokio interval fires immediately; consume it
        // so backends keep their startup liveness until the first real tick.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    tracing::debug!("Starting liveness sweep");
                    self.check().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Liveness prober received shutdown signal, exiting");
                    break;
                }
            }
        }
    }
}
