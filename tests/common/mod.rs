//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use greeter::config::ServerConfig;
use greeter::http::ServerError;
use greeter::lifecycle::{LifecycleState, Liveness, Shutdown};
use greeter::net::Listener;
use greeter::{CacheProbe, HttpServer};

pub const INDEX_HTML: &str = "<html><body><h1>Hello</h1><p class=\"lead\">{{LEAD}}</p></body></html>";
pub const STYLE_CSS: &str = "body { background: url(background.jpg); }\n";
/// JPEG magic plus bytes that are not valid UTF-8.
pub const BACKGROUND_JPG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x80, 0x81, 0xFE, 0xFF, 0xD9];

/// Probe with a fixed answer that counts its calls.
#[derive(Debug, Default)]
pub struct FixedProbe {
    reachable: bool,
    calls: AtomicUsize,
}

impl FixedProbe {
    pub fn new(reachable: bool) -> Arc<Self> {
        Arc::new(Self {
            reachable,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CacheProbe for FixedProbe {
    async fn ping(&self) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reachable
    }
}

/// Probe that takes `delay` to answer, standing in for a slow handler.
#[derive(Debug)]
pub struct SlowProbe {
    pub delay: Duration,
}

#[async_trait]
impl CacheProbe for SlowProbe {
    async fn ping(&self) -> bool {
        tokio::time::sleep(self.delay).await;
        false
    }
}

/// Write the page assets into a fresh temporary directory.
pub fn asset_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_assets(dir.path());
    dir
}

pub fn write_assets(dir: &Path) {
    std::fs::write(dir.join("index.html"), INDEX_HTML).unwrap();
    std::fs::write(dir.join("style.css"), STYLE_CSS).unwrap();
    std::fs::write(dir.join("background.jpg"), BACKGROUND_JPG).unwrap();
}

/// Config serving from `assets` on an ephemeral loopback port.
pub fn test_config(assets: &Path) -> ServerConfig {
    let mut config = ServerConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.assets.dir = assets.to_path_buf();
    config
}

/// A server running in the background.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub liveness: Liveness,
    pub events: watch::Receiver<LifecycleState>,
    pub handle: JoinHandle<Result<(), ServerError>>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Wait until the lifecycle reaches `state` or a later one.
    pub async fn wait_for_state(&mut self, state: LifecycleState) {
        tokio::time::timeout(Duration::from_secs(5), self.events.wait_for(|s| *s >= state))
            .await
            .expect("lifecycle transition timed out")
            .expect("lifecycle sender dropped");
    }
}

/// Start a server and return once it is serving.
pub async fn start_server(config: ServerConfig, probe: Arc<dyn CacheProbe>) -> TestServer {
    let listener = Listener::bind(&config.listener).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, probe);
    let liveness = server.liveness();
    let events = server.lifecycle_events();
    let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));

    let mut server = TestServer {
        addr,
        shutdown,
        liveness,
        events,
        handle,
    };
    server.wait_for_state(LifecycleState::Serving).await;
    server
}

/// HTTP client that never goes through an environment proxy.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap()
}

/// Start a minimal RESP server answering `PING` with `ping_reply` (raw RESP)
/// and every other command with `+OK`.
pub async fn start_fake_redis(ping_reply: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let (read, mut write) = socket.into_split();
                let mut reader = BufReader::new(read);
                while let Some(command) = read_command(&mut reader).await {
                    let reply = if command
                        .first()
                        .is_some_and(|name| name.eq_ignore_ascii_case("PING"))
                    {
                        ping_reply
                    } else {
                        "+OK\r\n"
                    };
                    if write.write_all(reply.as_bytes()).await.is_err() {
                        break;
                    }
                }
            });
        }
    });

    addr
}

/// Read one RESP array of bulk strings.
async fn read_command<R>(reader: &mut BufReader<R>) -> Option<Vec<String>>
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut line = String::new();
    if reader.read_line(&mut line).await.ok()? == 0 {
        return None;
    }
    let count: usize = line.trim_end().strip_prefix('*')?.parse().ok()?;

    let mut parts = Vec::with_capacity(count);
    for _ in 0..count {
        line.clear();
        reader.read_line(&mut line).await.ok()?;
        let len: usize = line.trim_end().strip_prefix('$')?.parse().ok()?;
        let mut data = vec![0u8; len + 2];
        reader.read_exact(&mut data).await.ok()?;
        data.truncate(len);
        parts.push(String::from_utf8_lossy(&data).into_owned());
    }
    Some(parts)
}
