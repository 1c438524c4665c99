//! Shared utilities for integration tests.

use std::future::Future;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// HTTP client without connection reuse, so every request sees the
/// listener that is current at the time it is sent.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .timeout(Duration::from_secs(2))
        .no_proxy()
        .build()
        .unwrap()
}

/// Status of `GET http://{addr}{path}`, or `None` if the request failed.
#[allow(dead_code)]
pub async fn status(client: &reqwest::Client, addr: SocketAddr, path: &str) -> Option<u16> {
    client
        .get(format!("http://{addr}{path}"))
        .send()
        .await
        .ok()
        .map(|r| r.status().as_u16())
}

/// JSON body of a successful `GET`, or `None`.
#[allow(dead_code)]
pub async fn json(
    client: &reqwest::Client,
    addr: SocketAddr,
    path: &str,
) -> Option<serde_json::Value> {
    let response = client
        .get(format!("http://{addr}{path}"))
        .send()
        .await
        .ok()?;
    if !response.status().is_success() {
        return None;
    }
    response.json().await.ok()
}

/// Poll `check` until it returns true or `timeout` elapses.
pub async fn eventually<F, Fut>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = Instant::now() + timeout;
    loop {
        if check().await {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

/// Wait until `path` answers with `expected`.
#[allow(dead_code)]
pub async fn wait_for_status(
    client: &reqwest::Client,
    addr: SocketAddr,
    path: &str,
    expected: u16,
) -> bool {
    eventually(Duration::from_secs(10), || async move {
        status(client, addr, path).await == Some(expected)
    })
    .await
}
