//! Stand-in for the point-cloud API on port 8000.
//!
//! Run it next to the dev server to exercise the `/api` proxy:
//! `cargo run --example mock_backend`, then `curl localhost:3000/api/health`.

use axum::{http::HeaderMap, routing::get, Json, Router};
use serde_json::json;
use std::net::SocketAddr;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let app = Router::new()
        .route("/", get(|| async { Json(json!({ "message": "point cloud API" })) }))
        .route("/health", get(|| async { Json(json!({ "status": "healthy" })) }))
        .route("/reconstructions", get(|| async { Json(json!({ "files": [] })) }))
        .route("/echo", get(echo));

    let addr = SocketAddr::from(([127, 0, 0, 1], 8000));
    println!("Mock API listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn echo(headers: HeaderMap) -> Json<serde_json::Value> {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string);
    Json(json!({
        "host": header("host"),
        "origin": header("origin"),
        "request_id": header("x-request-id"),
    }))
}
