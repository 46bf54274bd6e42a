//! Cancellation, deadlines and concurrent use of one client.

mod common;

use std::time::{Duration, Instant};

use fetchwire::{CancellationToken, ClientError, RequestConfig, TransportError};

#[tokio::test]
async fn test_cancel_in_flight() {
    let server = common::start().await;
    let client = server.client();

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    let err = client.get(&cancel, "/slow").await.unwrap_err();

    assert!(err.is_cancelled());
    assert!(err.is_transport());
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_already_cancelled_token() {
    let server = common::start().await;
    let client = server.client();

    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = client.get(&cancel, "/ok").await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::Transport(TransportError::Cancelled)
    ));
    assert_eq!(server.hits.ok(), 0);
}

#[tokio::test]
async fn test_client_timeout() {
    let server = common::start().await;
    let client = server
        .client_builder()
        .timeout(Duration::from_millis(50))
        .build()
        .unwrap();

    let err = client.send(RequestConfig::get("/slow")).await.unwrap_err();
    assert!(err.is_timeout());
    assert!(!err.is_cancelled());
}

#[tokio::test]
async fn test_call_timeout_overrides_client_timeout() {
    let server = common::start().await;
    let client = server
        .client_builder()
        .timeout(Duration::from_millis(20))
        .build()
        .unwrap();

    let response = client
        .send(RequestConfig::get("/delay").timeout(Duration::from_secs(5)))
        .await
        .unwrap();
    assert_eq!(response.text(), "done");
}

#[tokio::test]
async fn test_zero_call_timeout_disables_deadline() {
    let server = common::start().await;
    let client = server
        .client_builder()
        .timeout(Duration::from_millis(20))
        .build()
        .unwrap();

    let response = client
        .send(RequestConfig::get("/delay").timeout(Duration::ZERO))
        .await
        .unwrap();
    assert_eq!(response.text(), "done");
}

#[tokio::test]
async fn test_client_usable_after_cancellation() {
    let server = common::start().await;
    let client = server.client();

    let cancel = CancellationToken::new();
    cancel.cancel();
    assert!(client.get(&cancel, "/ok").await.is_err());

    let response = client
        .get(&CancellationToken::new(), "/ok")
        .await
        .unwrap();
    assert_eq!(response.text(), "ok");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_dispatches() {
    let server = common::start().await;
    let client = server.client();
    let cancel = CancellationToken::new();

    let calls = (0..10).map(|_| {
        let client = client.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { client.get(&cancel, "/ok").await })
    });

    for result in futures::future::join_all(calls).await {
        let response = result.unwrap().unwrap();
        assert_eq!(response.text(), "ok");
    }
    assert_eq!(server.hits.ok(), 10);
}

#[tokio::test]
async fn test_caller_retry_loop() {
    let server = common::start().await;
    let client = server.client();
    let cancel = CancellationToken::new();

    let mut attempts = 0;
    let response = loop {
        attempts += 1;
        match client.get(&cancel, "/flaky").await {
            Err(e) if e.status().is_some_and(|s| s.is_server_error()) && attempts < 5 => continue,
            other => break other.unwrap(),
        }
    };

    assert_eq!(attempts, 3);
    assert_eq!(response.text(), "recovered");
}
