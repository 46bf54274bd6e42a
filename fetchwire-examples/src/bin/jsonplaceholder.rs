//! JSONPlaceholder Example
//!
//! Performs GET, POST, PUT and DELETE against a JSONPlaceholder-compatible
//! API, each with a 5 second deadline.
//!
//! Usage:
//!   cargo run --bin jsonplaceholder
//!
//!   # Or specify a custom base URL:
//!   cargo run --bin jsonplaceholder -- http://localhost:3000
//!   FETCHWIRE_BASE_URL=http://localhost:3000 cargo run --bin jsonplaceholder

use std::env;
use std::time::Duration;

use fetchwire::{CancellationToken, Client, RequestConfig};
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "https://jsonplaceholder.typicode.com";

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Post {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<u32>,
    title: String,
    body: String,
    user_id: u32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fetchwire=info".into()),
        )
        .init();

    // Check command line args first, then FETCHWIRE_BASE_URL, then default
    let base_url = env::args()
        .nth(1)
        .or_else(|| env::var("FETCHWIRE_BASE_URL").ok())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    println!("=== JSONPlaceholder Example ===");
    println!("Base URL: {}", base_url);
    println!();

    let client = Client::builder()
        .base_url(base_url)
        .defaults(
            RequestConfig::new()
                .header("accept", "application/json")
                .timeout(Duration::from_secs(5)),
        )
        .build()?;

    // Each call gets its own token; the deadline comes from the defaults.
    let cancel = CancellationToken::new();

    println!("GET /posts/1");
    let response = client.get(&cancel, "/posts/1").await?;
    println!("  status: {}", response.status_text());
    let post: Post = response.json()?;
    println!("  post: {:?}", post);
    println!();

    println!("POST /posts");
    let new_post = Post {
        id: None,
        title: "foo".into(),
        body: "bar".into(),
        user_id: 1,
    };
    let response = client
        .dispatch(&cancel, RequestConfig::post("/posts").json_body(&new_post)?)
        .await?;
    println!("  status: {}", response.status_text());
    println!("  body: {}", response.text());
    println!();

    println!("PUT /posts/1");
    let updated = Post {
        id: Some(1),
        title: "updated title".into(),
        body: "updated body".into(),
        user_id: 1,
    };
    let response = client
        .dispatch(&cancel, RequestConfig::put("/posts/1").json_body(&updated)?)
        .await?;
    println!("  status: {}", response.status_text());
    println!("  body: {}", response.text());
    println!();

    println!("DELETE /posts/1");
    let response = client.delete(&cancel, "/posts/1").await?;
    println!("  status: {}", response.status_text());
    println!();

    println!("GET /posts?userId=1");
    let response = client
        .dispatch(&cancel, RequestConfig::get("/posts").param("userId", "1"))
        .await?;
    let posts: Vec<Post> = response.json()?;
    println!("  {} posts", posts.len());
    println!();

    println!("GET /does-not-exist");
    match client.get(&cancel, "/does-not-exist").await {
        Ok(response) => println!("  unexpected success: {}", response.status_text()),
        Err(e) if e.is_status() => println!("  expected error: {:?}", e.status()),
        Err(e) => return Err(e.into()),
    }

    println!();
    println!("=== All calls completed ===");
    Ok(())
}
