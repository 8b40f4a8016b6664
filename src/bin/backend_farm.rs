//! A fleet of trivial upstream servers for exercising the balancer locally.
//!
//! ```text
//! cargo run --bin backend_farm -- --ports 8081,8082,8083
//! cargo run -- --port 8090 --servers http://127.0.0.1:8081,http://127.0.0.1:8082
//! ```

use std::net::SocketAddr;

use axum::{routing::get, Router};
use clap::Parser;
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(name = "backend-farm")]
#[command(about = "Spawn trivial HTTP upstreams for local testing", long_about = None)]
struct Cli {
    /// Ports to listen on.
    #[arg(long, value_delimiter = ',', default_values_t = vec![8081u16, 8082, 8083])]
    ports: Vec<u16>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let mut servers = Vec::new();

    for (i, port) in cli.ports.into_iter().enumerate() {
        let name = format!("server-{}", i + 1);
        let addr = SocketAddr::from(([127, 0, 0, 1], port));

        let greeting = name.clone();
        let app = Router::new().route(
            "/hello",
            get(move || {
                let greeting = greeting.clone();
                async move { format!("Hello from {greeting}!") }
            }),
        );

        tracing::info!(%name, %addr, "Starting backend");
        servers.push(tokio::spawn(async move {
            let listener = TcpListener::bind(addr).await.expect("bind backend port");
            axum::serve(listener, app).await.expect("serve backend");
        }));
    }

    for server in servers {
        let _ = server.await;
    }
}
