// Server module entry point
// Listener setup, connection handling and graceful shutdown

pub mod connection;
pub mod listener;
pub mod signal;

// `loop` is a keyword, so the module gets another name
#[path = "loop.rs"]
pub mod server_loop;

pub use listener::create_reusable_listener;
pub use server_loop::start_server_loop;

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use crate::config::{Config, PerformanceConfig};
use crate::handler::App;
use crate::logger;

/// State shared by the accept loop and every connection task
pub struct ServerState {
    pub app: Arc<App>,
    pub performance: PerformanceConfig,
    pub active_connections: AtomicUsize,
}

impl ServerState {
    pub const fn new(app: Arc<App>, performance: PerformanceConfig) -> Self {
        Self {
            app,
            performance,
            active_connections: AtomicUsize::new(0),
        }
    }
}

/// Bind the configured address and serve `app` until SIGINT/SIGTERM
pub async fn run(config: &Config, app: Arc<App>) -> Result<(), Box<dyn std::error::Error>> {
    let addr = config.get_socket_addr()?;
    let listener = create_reusable_listener(addr, config.server.backlog)?;
    logger::log_server_start(&addr, config);

    let state = Arc::new(ServerState::new(app, config.performance.clone()));
    let shutdown = async {
        match signal::shutdown_signal().await {
            Ok(name) => name,
            Err(e) => {
                logger::log_error(&format!("Failed to register signal handlers: {e}"));
                std::future::pending().await
            }
        }
    };

    start_server_loop(listener, state, shutdown).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    async fn fetch(addr: std::net::SocketAddr, request: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut raw = Vec::new();
        stream.read_to_end(&mut raw).await.unwrap();
        String::from_utf8_lossy(&raw).into_owned()
    }

    #[tokio::test]
    async fn test_serves_until_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), "<h1>home</h1>").unwrap();

        let mut config = Config::load_from("/nonexistent/switchyard-config").unwrap();
        config.static_files.root = dir.path().to_str().unwrap().to_string();
        config.logging.access_log = false;
        config.performance.request_timeout = 5;

        let app = Arc::new(App::new(&config).unwrap());
        let listener = create_reusable_listener("127.0.0.1:0".parse().unwrap(), 16).unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(ServerState::new(app, config.performance.clone()));

        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
        let server = tokio::spawn(start_server_loop(listener, state, async move {
            let _ = stop_rx.await;
            "test shutdown"
        }));

        let response = fetch(
            addr,
            "GET / HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
        )
        .await;
        assert!(response.starts_with("HTTP/1.1 200 OK"));
        assert!(response.ends_with("<h1>home</h1>"));

        let response = fetch(
            addr,
            "HEAD / HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
        )
        .await;
        assert!(response.starts_with("HTTP/1.1 200 OK"));
        assert!(!response.contains("<h1>"));

        stop_tx.send(()).unwrap();
        server.await.unwrap().unwrap();
    }
}
