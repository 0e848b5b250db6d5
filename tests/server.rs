//! End-to-end tests over a real listener.

use std::time::Duration;

use market_gate::lifecycle::Shutdown;
use market_gate::HttpServer;

use common::*;

mod common;

#[tokio::test]
async fn serves_and_shuts_down_gracefully() {
    let app = app();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(app.state.clone());
    let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));

    let client = reqwest::Client::builder().no_proxy().build().unwrap();

    let res = client
        .get(format!("http://{addr}/api/points/balance"))
        .header("cookie", format!("session={MEMBER_TOKEN}"))
        .send()
        .await
        .expect("server unreachable");
    assert_eq!(res.status(), 200);
    assert!(res.headers().contains_key("x-request-id"));
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["balance"], 120);

    // Peer address keys the limiter when served over a socket.
    let res = client
        .post(format!("http://{addr}/api/auth/logout"))
        .header("origin", BASE_URL)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 401);
    assert_eq!(app.state.rate_limiter.tracked_keys(), 1);

    drop(client);
    shutdown.trigger();
    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("server did not stop")
        .unwrap();
    assert!(result.is_ok());
}
