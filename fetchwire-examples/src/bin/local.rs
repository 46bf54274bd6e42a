//! Local Server Example
//!
//! Starts an axum echo server on an ephemeral port and exercises the client
//! against it: default headers, interceptors, query parameters, status
//! errors, cancellation and timeouts.
//!
//! Usage:
//!   cargo run --bin local
//!
//!   # With request spans:
//!   RUST_LOG=fetchwire=debug cargo run --bin local

use std::time::Duration;

use axum::Router;
use axum::extract::RawQuery;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{any, get};
use fetchwire::{
    CancellationToken, Client, HeaderInterceptor, Interceptor, RequestConfig, TransportError,
};

async fn echo(headers: HeaderMap, RawQuery(query): RawQuery, body: String) -> String {
    let mut out = String::new();
    for (name, value) in headers.iter() {
        if name.as_str().starts_with("x-") {
            out.push_str(&format!("{}: {}\n", name, value.to_str().unwrap_or("?")));
        }
    }
    if let Some(query) = query {
        out.push_str(&format!("query: {}\n", query));
    }
    if !body.is_empty() {
        out.push_str(&format!("body: {}\n", body));
    }
    out
}

async fn teapot() -> (StatusCode, &'static str) {
    (StatusCode::IM_A_TEAPOT, "short and stout")
}

async fn slow() -> &'static str {
    tokio::time::sleep(Duration::from_secs(30)).await;
    "too late"
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "local=info,fetchwire=info".into()),
        )
        .init();

    let app = Router::new()
        .route("/echo", any(echo))
        .route("/teapot", get(teapot))
        .route("/slow", get(slow));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "server stopped");
        }
    });
    tracing::info!(%addr, "echo server listening");

    let client = Client::builder()
        .base_url(format!("http://{}", addr))
        .defaults(RequestConfig::new().header("x-client", "fetchwire-local"))
        .with_interceptor(HeaderInterceptor::new("x-api-key", "demo-key"))
        .with_interceptor(
            Interceptor::new()
                .on_request(|req| {
                    tracing::info!(method = %req.method(), uri = %req.uri(), "sending");
                    Ok(req)
                })
                .on_response(|resp| {
                    tracing::info!(status = %resp.status(), "received");
                    Ok(resp)
                }),
        )
        .intercept_responses(true)
        .build()?;

    let cancel = CancellationToken::new();

    println!("=== Local Server Example ===");
    println!();

    println!("Test 1: defaults, interceptors and query parameters");
    let response = client
        .dispatch(
            &cancel,
            RequestConfig::post("/echo")
                .header("x-request", "one")
                .param("page", "2")
                .body("hello"),
        )
        .await?;
    print!("{}", response.text());
    println!();

    println!("Test 2: status >= 400 becomes an error");
    let Err(err) = client.get(&cancel, "/teapot").await else {
        anyhow::bail!("expected /teapot to fail");
    };
    println!("  {}", err);
    println!();

    println!("Test 3: per-call timeout");
    let slow = RequestConfig::get("/slow").timeout(Duration::from_millis(200));
    let Err(err) = client.dispatch(&cancel, slow).await else {
        anyhow::bail!("expected /slow to time out");
    };
    println!("  timeout: {} ({})", err.is_timeout(), err);
    println!();

    println!("Test 4: cancellation");
    let slow_cancel = CancellationToken::new();
    let call = tokio::spawn({
        let client = client.clone();
        let cancel = slow_cancel.clone();
        async move { client.get(&cancel, "/slow").await }
    });
    tokio::time::sleep(Duration::from_millis(100)).await;
    slow_cancel.cancel();
    match call.await? {
        Err(fetchwire::ClientError::Transport(TransportError::Cancelled)) => {
            println!("  cancelled")
        }
        other => anyhow::bail!("expected cancellation, got {:?}", other),
    }

    println!();
    println!("=== All examples completed ===");
    Ok(())
}
