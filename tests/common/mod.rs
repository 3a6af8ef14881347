//! Shared test utilities for dbconn integration tests
#![allow(dead_code)]

use dbconn::ConnectionConfig;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;

/// Resolve a live MySQL target from `DB_*` when `DBCONN_TEST_MYSQL=1`
///
/// Tests that need a real server return early when this is `None`.
pub fn live_config() -> Option<ConnectionConfig> {
    if std::env::var("DBCONN_TEST_MYSQL").ok().as_deref() != Some("1") {
        eprintln!("skipping: set DBCONN_TEST_MYSQL=1 and DB_* to run against a live MySQL server");
        return None;
    }
    Some(ConnectionConfig::from_env().expect("DB_* variables must be valid"))
}

/// Config pointing at a local port
pub fn local_config(port: u16) -> ConnectionConfig {
    ConnectionConfig {
        host: "127.0.0.1".to_string(),
        port,
        ..ConnectionConfig::default()
    }
}

/// A local port with nothing listening on it
pub fn refused_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);
    port
}

/// A TCP server that counts accepted sockets
pub struct CountingServer {
    pub port: u16,
    accepted: Arc<AtomicUsize>,
}

impl CountingServer {
    /// Accept and immediately close every socket, like a peer dying mid-handshake
    pub async fn closing() -> Self {
        Self::start(false).await
    }

    /// Accept every socket and never speak, like a wedged server
    pub async fn silent() -> Self {
        Self::start(true).await
    }

    async fn start(hold_open: bool) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind listener");
        let port = listener.local_addr().expect("local addr").port();
        let accepted = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&accepted);

        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                if hold_open {
                    held.push(stream);
                } else {
                    drop(stream);
                }
            }
        });

        Self { port, accepted }
    }

    /// Number of sockets accepted so far
    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }
}
