//! Route table swaps on the reloadable server.

use std::time::Duration;
use sentinel_engine::config::HttpConfig;
use sentinel_engine::engine::{ReloadableServer, ENGINE_HEADER};
use sentinel_engine::lifecycle::Shutdown;
use sentinel_engine::model::{ControlPoint, ControlPointInfo, Kind, Model};

mod common;

fn model(codes: &[&str]) -> Model {
    codes
        .iter()
        .map(|code| {
            ControlPoint::new(ControlPointInfo {
                name: format!("{code}.json"),
                code: code.to_string(),
                version: "1".to_string(),
                desc: String::new(),
                kind: Kind::File,
            })
        })
        .collect()
}

fn config() -> HttpConfig {
    HttpConfig {
        bind_address: "127.0.0.1:0".to_string(),
        shutdown_timeout_secs: 2,
        ..HttpConfig::default()
    }
}

#[tokio::test]
async fn test_identity_served_before_any_reload() {
    let shutdown = Shutdown::new();
    let handle = ReloadableServer::new(config())
        .unwrap()
        .run(shutdown.subscribe())
        .await
        .unwrap();
    let addr = handle.local_addr();
    let client = common::client();

    let response = client
        .get(format!("http://{addr}/engine/_info"))
        .send()
        .await
        .expect("engine unreachable");
    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers().get(ENGINE_HEADER).unwrap(),
        env!("CARGO_PKG_VERSION")
    );
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["Code"], "engine");
    assert_eq!(body["Name"], "sentinel-engine");

    assert_eq!(common::status(&client, addr, "/a/_info").await, Some(404));

    shutdown.trigger();
    handle.join().await;
}

#[tokio::test]
async fn test_routes_follow_each_applied_model() {
    let shutdown = Shutdown::new();
    let handle = ReloadableServer::new(config())
        .unwrap()
        .run(shutdown.subscribe())
        .await
        .unwrap();
    let addr = handle.local_addr();
    let client = common::client();

    handle.inbox.send(model(&["a", "b"])).await.unwrap();
    assert!(common::wait_for_status(&client, addr, "/a/_info", 200).await);
    assert!(common::wait_for_status(&client, addr, "/b/_info", 200).await);
    let body = common::json(&client, addr, "/a/_info").await.unwrap();
    assert_eq!(body["Code"], "a");
    assert_eq!(body["EngineKind"], "file");

    handle.inbox.send(model(&["b", "c"])).await.unwrap();
    assert!(common::wait_for_status(&client, addr, "/c/_info", 200).await);
    assert_eq!(common::status(&client, addr, "/a/_info").await, Some(404));
    assert_eq!(common::status(&client, addr, "/b/_info").await, Some(200));

    // Identity survives every reload and the address never changes.
    assert_eq!(handle.local_addr(), addr);
    assert_eq!(common::status(&client, addr, "/engine/_info").await, Some(200));

    handle.inbox.send(Model::empty()).await.unwrap();
    assert!(common::wait_for_status(&client, addr, "/b/_info", 404).await);
    assert_eq!(common::status(&client, addr, "/engine/_info").await, Some(200));
    assert!(handle.applied().is_empty());

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), handle.join())
        .await
        .expect("engine did not stop");
}

#[tokio::test]
async fn test_shutdown_releases_the_address() {
    let shutdown = Shutdown::new();
    let handle = ReloadableServer::new(config())
        .unwrap()
        .run(shutdown.subscribe())
        .await
        .unwrap();
    let addr = handle.local_addr();

    shutdown.trigger();
    handle.join().await;

    let rebound = tokio::net::TcpListener::bind(addr).await;
    assert!(rebound.is_ok(), "address still held after shutdown");
}
