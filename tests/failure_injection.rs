//! Shutdown and failure behavior.

use std::sync::Arc;
use std::time::{Duration, Instant};

use greeter::lifecycle::LifecycleState;
use greeter::{CacheProbe, RedisProbe};

mod common;

#[tokio::test]
async fn liveness_drops_when_shutdown_begins() {
    let assets = common::asset_dir();
    let mut server = common::start_server(
        common::test_config(assets.path()),
        common::FixedProbe::new(false),
    )
    .await;
    assert!(server.liveness.is_live());

    server.shutdown.trigger();
    server.wait_for_state(LifecycleState::Draining).await;
    assert!(!server.liveness.is_live());

    server.wait_for_state(LifecycleState::Stopped).await;
    server.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn in_flight_request_completes_during_drain() {
    let assets = common::asset_dir();
    let probe = Arc::new(common::SlowProbe {
        delay: Duration::from_millis(500),
    });
    let mut server = common::start_server(common::test_config(assets.path()), probe).await;

    let client = common::client();
    let url = server.url("/");
    let request = tokio::spawn(async move { client.get(url).send().await });
    tokio::time::sleep(Duration::from_millis(100)).await;

    server.shutdown.trigger();
    server.wait_for_state(LifecycleState::Draining).await;

    // Health is down while the slow request is still running.
    assert!(!server.liveness.is_live());
    assert!(!request.is_finished());

    let resp = request.await.unwrap().unwrap();
    assert_eq!(resp.status(), 200);
    let body = resp.text().await.unwrap();
    assert!(body.contains("single service application"));

    server.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn new_connections_are_refused_after_shutdown() {
    let assets = common::asset_dir();
    let server = common::start_server(
        common::test_config(assets.path()),
        common::FixedProbe::new(false),
    )
    .await;
    let addr = server.addr;

    server.shutdown.trigger();
    server.handle.await.unwrap().unwrap();

    assert!(tokio::net::TcpStream::connect(addr).await.is_err());
}

#[tokio::test]
async fn idle_keep_alive_connections_do_not_hold_shutdown() {
    let assets = common::asset_dir();
    let server = common::start_server(
        common::test_config(assets.path()),
        common::FixedProbe::new(false),
    )
    .await;

    // Leaves a pooled keep-alive connection open.
    let client = common::client();
    let resp = client.get(server.url("/healthz")).send().await.unwrap();
    assert_eq!(resp.status(), 204);

    let started = Instant::now();
    server.shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), server.handle)
        .await
        .expect("idle connection held the drain open")
        .unwrap()
        .unwrap();
    assert!(started.elapsed() < Duration::from_secs(5));
    drop(client);
}

#[tokio::test]
async fn hanging_request_is_cut_at_deadline() {
    let assets = common::asset_dir();
    let mut config = common::test_config(assets.path());
    config.timeouts.shutdown_secs = 1;
    config.timeouts.write_secs = 60;
    let probe = Arc::new(common::SlowProbe {
        delay: Duration::from_secs(60),
    });
    let mut server = common::start_server(config, probe).await;

    let client = common::client();
    let url = server.url("/");
    let request = tokio::spawn(async move { client.get(url).send().await });
    tokio::time::sleep(Duration::from_millis(100)).await;

    let started = Instant::now();
    server.shutdown.trigger();
    server.wait_for_state(LifecycleState::Stopped).await;

    let result = tokio::time::timeout(Duration::from_secs(5), server.handle)
        .await
        .expect("server outlived the shutdown deadline")
        .unwrap();
    assert!(result.is_ok());
    assert!(started.elapsed() < Duration::from_secs(4));

    // The hanging request never got a response.
    let outcome = request.await.unwrap();
    assert!(outcome.is_err());
}

#[tokio::test]
async fn slow_handler_times_out_at_write_deadline() {
    let assets = common::asset_dir();
    let mut config = common::test_config(assets.path());
    config.timeouts.write_secs = 1;
    let probe = Arc::new(common::SlowProbe {
        delay: Duration::from_secs(30),
    });
    let server = common::start_server(config, probe).await;

    let started = Instant::now();
    let resp = common::client().get(server.url("/")).send().await.unwrap();
    assert_eq!(resp.status(), 408);
    assert!(started.elapsed() < Duration::from_secs(5));

    server.shutdown.trigger();
}

#[tokio::test]
async fn unreachable_cache_falls_back_to_standalone() {
    // Bind and drop to get a port nobody listens on.
    let port = {
        let socket = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        socket.local_addr().unwrap().port()
    };
    let assets = common::asset_dir();
    let mut config = common::test_config(assets.path());
    config.cache.address = format!("127.0.0.1:{port}");
    let probe = RedisProbe::from_config(&config.cache);
    let server = common::start_server(config, Arc::new(probe)).await;

    let resp = common::client().get(server.url("/")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    assert!(resp.text().await.unwrap().contains("single service application"));

    server.shutdown.trigger();
}

#[tokio::test]
async fn redis_probe_answers() {
    let pong = common::start_fake_redis("+PONG\r\n").await;
    let other = common::start_fake_redis("+HELLO\r\n").await;
    let failing = common::start_fake_redis("-ERR not today\r\n").await;

    let timeout = Duration::from_secs(2);
    assert!(RedisProbe::new(&pong.to_string(), timeout).ping().await);
    assert!(!RedisProbe::new(&other.to_string(), timeout).ping().await);
    assert!(!RedisProbe::new(&failing.to_string(), timeout).ping().await);
}
