//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use user_service::config::ServiceConfig;
use user_service::http::{AppState, HttpServer};
use user_service::lifecycle::Shutdown;
use user_service::observability::invocation::MemorySink;
use user_service::observability::InvocationLogger;

/// A running service on an ephemeral port whose invocation records are kept in memory.
pub struct TestServer {
    pub addr: SocketAddr,
    pub sink: Arc<MemorySink>,
    shutdown: Shutdown,
}

impl TestServer {
    pub async fn start() -> Self {
        let config = ServiceConfig::default();
        let sink = Arc::new(MemorySink::new());
        let state = AppState::in_memory(&config, InvocationLogger::new(sink.clone()));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Shutdown::new();
        let server = HttpServer::with_state(config, state);
        let rx = shutdown.subscribe();
        tokio::spawn(async move {
            server.run(listener, rx).await.unwrap();
        });

        Self {
            addr,
            sink,
            shutdown,
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Invocation log lines carrying `correlation_id`.
    #[allow(dead_code)]
    pub fn lines_for(&self, correlation_id: &str) -> Vec<String> {
        self.sink
            .records()
            .into_iter()
            .filter(|r| r.correlation_id == correlation_id)
            .map(|r| r.message)
            .collect()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}
