use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use bakalari_server::bakalari::{Client, Credentials, Session};
use bakalari_server::web::{AppState, create_router};

#[tokio::main]
async fn main() {
    // RUST_LOG wins when set; default to info.
    let env_filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    // Get credentials from environment
    let username = std::env::var("BK_USER").expect("BK_USER must be set");
    let password = std::env::var("BK_PWD").expect("BK_PWD must be set");
    let base_url = std::env::var("BK_API_BASE").expect("BK_API_BASE must be set");

    // Open the session once; everything downstream borrows it.
    let credentials = Credentials::new(username, password, base_url);
    let session = Session::open(credentials)
        .await
        .expect("Failed to open Bakalari session");
    tracing::info!("logged in to Bakalari");

    let state = AppState::new(Client::new(Arc::new(session)));
    let app = create_router(state);

    let addr: SocketAddr = std::env::var("BIND_ADDR")
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 3000)));

    println!("Bakalari tool server listening on http://{addr}");
    println!();
    println!("Endpoints:");
    println!("  GET  /health        - Health check");
    println!("  GET  /tools         - Tool catalog");
    println!("  POST /tools/{{name}}  - Invoke a tool by name");

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
