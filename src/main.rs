use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

use load_balancer::balance::registry::parse_backend_url;
use load_balancer::balance::{Algorithm, BackendRegistry};
use load_balancer::config::{load_config, BalancerConfig};
use load_balancer::error::BalancerError;
use load_balancer::health::Prober;
use load_balancer::http::{AppState, HttpServer};
use load_balancer::lifecycle::Shutdown;
use load_balancer::observability::metrics;
use load_balancer::upstream::HttpTransport;

#[derive(Parser)]
#[command(name = "load-balancer")]
#[command(about = "Layer-7 reverse-proxy load balancer", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen port; overrides the configured bind address port.
    #[arg(long)]
    port: Option<u16>,

    /// Backends seeded into the pool,
    /// e.g. http://127.0.0.1:8081,http://127.0.0.1:8082
    #[arg(long, value_delimiter = ',')]
    servers: Vec<String>,

    /// Balancing algorithm (round_robin or least_connections).
    #[arg(long)]
    algorithm: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => BalancerConfig::default(),
    };
    apply_overrides(&mut config, &cli)?;

    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new(&config.observability.log_level)
                }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        algorithm = %config.algorithm,
        "load-balancer starting"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let algorithm: Algorithm = config.algorithm.parse()?;
    let registry = Arc::new(BackendRegistry::new(algorithm));
    let state = AppState::new(registry.clone());

    for raw in &config.backends {
        match seed_backend(&state, raw) {
            Ok(url) => tracing::info!(backend = %url, "Added backend"),
            Err(e) => tracing::error!(backend = %raw, error = %e, "Error adding backend"),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();

    if config.health_check.enabled {
        let prober = Prober::new(
            registry.clone(),
            Duration::from_secs(config.health_check.interval_secs),
            Duration::from_secs(config.health_check.timeout_secs),
        );
        let prober_shutdown = shutdown.subscribe();
        tokio::spawn(async move {
            prober.run(prober_shutdown).await;
        });
    }

    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received");
        }
        shutdown.trigger();
    });

    let server = HttpServer::new(&config, state);
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Fold CLI flags into the loaded configuration.
fn apply_overrides(config: &mut BalancerConfig, cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(port) = cli.port {
        let mut addr: SocketAddr = config.listener.bind_address.parse()?;
        addr.set_port(port);
        config.listener.bind_address = addr.to_string();
    }
    config.backends.extend(cli.servers.iter().cloned());
    if let Some(algorithm) = &cli.algorithm {
        config.algorithm = algorithm.clone();
    }
    Ok(())
}

fn seed_backend(state: &AppState, raw: &str) -> Result<Url, BalancerError> {
    let url = parse_backend_url(raw)?;
    let transport = HttpTransport::new(state.client.clone(), &url)?;
    state.registry.add_backend(url.clone(), Box::new(transport))?;
    Ok(url)
}
