//! Shared harness for lotwatch integration tests.

#![allow(dead_code)]

pub mod mock_rest;
pub mod mock_ws;

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;

/// An address nothing is listening on.
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Push channel URL that refuses every connection.
pub async fn unreachable_ws_url() -> String {
    format!("ws://{}/ws/parking/", unused_addr().await)
}

/// REST base URL that refuses every connection.
pub async fn unreachable_api_url() -> String {
    format!("http://{}", unused_addr().await)
}

/// Poll `check` every 20ms until it returns true or `limit` passes.
pub async fn eventually<F, Fut>(limit: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    tokio::time::timeout(limit, async {
        loop {
            if check().await {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .is_ok()
}
