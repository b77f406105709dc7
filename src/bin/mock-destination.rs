//! Throwaway destination for exercising the proxy by hand.
//!
//! `/test` echoes the method, headers and body back as JSON; `/error`
//! always fails with a 500.

use std::collections::BTreeMap;
use std::net::SocketAddr;

use axum::{
    body::Bytes,
    http::{HeaderMap, Method, StatusCode},
    routing::get,
    Json, Router,
};
use clap::Parser;
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "mock-destination")]
#[command(about = "Echo server to stand in for the proxy's destination", long_about = None)]
struct Cli {
    #[arg(short, long, default_value_t = 8080)]
    port: u16,
}

async fn echo(method: Method, headers: HeaderMap, body: Bytes) -> Json<Value> {
    let headers: BTreeMap<String, String> = headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();
    let data = serde_json::from_slice::<Value>(&body)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body).into_owned()));

    println!("{} /test ({} bytes)", method, body.len());
    Json(json!({
        "method": method.as_str(),
        "headers": headers,
        "data": data,
    }))
}

async fn error() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let app = Router::new()
        .route("/test", get(echo).post(echo).put(echo).delete(echo))
        .route("/error", get(error).post(error));

    let addr = SocketAddr::from(([127, 0, 0, 1], cli.port));
    println!("Mock destination listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
