//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use load_balancer::balance::registry::parse_backend_url;
use load_balancer::balance::{Algorithm, BackendRegistry};
use load_balancer::config::BalancerConfig;
use load_balancer::http::{AppState, HttpServer};
use load_balancer::lifecycle::Shutdown;
use load_balancer::upstream::HttpTransport;

/// Start a mock backend that answers every request with a fixed body.
/// Binds an OS-assigned port and returns the bound address.
pub async fn start_mock_backend(response: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        // Drain the request head before answering.
                        let mut buf = [0u8; 4096];
                        let _ = socket.read(&mut buf).await;

                        let response_str = format!(
                            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            response.len(),
                            response
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Reserve an address that is guaranteed to refuse connections.
#[allow(dead_code)]
pub async fn refused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Start the balancer with the given backends already registered.
/// Returns the proxy address, the registry handle and the shutdown handle.
#[allow(dead_code)]
pub async fn start_balancer(
    backends: &[SocketAddr],
    algorithm: Algorithm,
) -> (SocketAddr, Arc<BackendRegistry>, Shutdown) {
    let registry = Arc::new(BackendRegistry::new(algorithm));
    let state = AppState::new(registry.clone());

    for addr in backends {
        let url = parse_backend_url(&format!("http://{addr}")).unwrap();
        let transport = HttpTransport::new(state.client.clone(), &url).unwrap();
        registry.add_backend(url, Box::new(transport)).unwrap();
    }

    let config = BalancerConfig::default();
    let server = HttpServer::new(&config, state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, registry, shutdown)
}

/// A reqwest client that ignores environment proxies and connection reuse,
/// so every request exercises selection.
#[allow(dead_code)]
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
