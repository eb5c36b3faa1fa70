// Connection handling module
// Accepts a single TCP connection and serves its requests

use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::Response;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use super::ServerState;
use crate::handler::App;
use crate::http::response::build_500_response;
use crate::http::Request;
use crate::logger;

/// Accept a connection, enforcing the connection limit.
///
/// # Arguments
///
/// * `stream` - The TCP stream to handle
/// * `peer_addr` - The peer's socket address
/// * `state` - Shared server state
pub fn accept_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    state: &Arc<ServerState>,
) {
    // Increment first, then check, so concurrent accepts cannot both slip in
    let prev_count = state.active_connections.fetch_add(1, Ordering::SeqCst);

    if let Some(max_conn) = state.performance.max_connections {
        if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
            state.active_connections.fetch_sub(1, Ordering::SeqCst);
            logger::log_warning(&format!(
                "Max connections reached: {prev_count}/{max_conn}. Connection from {peer_addr} rejected."
            ));
            drop(stream);
            return;
        }
    }

    logger::log_debug(&format!("[Connection] Accepted from: {peer_addr}"));
    handle_connection(stream, peer_addr, Arc::clone(state));
}

/// Serve one connection in a spawned task.
///
/// The connection as a whole is bounded by `request_timeout` (0 disables
/// the bound); the active connection counter is released when it ends.
fn handle_connection(stream: tokio::net::TcpStream, peer_addr: SocketAddr, state: Arc<ServerState>) {
    tokio::spawn(async move {
        let io = TokioIo::new(stream);

        let mut builder = http1::Builder::new();
        builder.keep_alive(state.performance.keep_alive);

        let app = Arc::clone(&state.app);
        let conn = builder.serve_connection(
            io,
            service_fn(move |req| {
                let app = Arc::clone(&app);
                async move { Ok::<_, Infallible>(respond(app, req, peer_addr).await) }
            }),
        );

        let timeout_secs = state.performance.request_timeout;
        let result = if timeout_secs == 0 {
            Ok(conn.await)
        } else {
            tokio::time::timeout(Duration::from_secs(timeout_secs), conn).await
        };

        match result {
            Ok(Ok(())) => {}
            Ok(Err(err)) => logger::log_connection_error(&err),
            Err(_) => logger::log_warning(&format!(
                "Connection from {peer_addr} timed out after {timeout_secs} seconds"
            )),
        }

        state.active_connections.fetch_sub(1, Ordering::SeqCst);
    });
}

/// Run the dispatch cycle off the async workers
///
/// Handlers do blocking file I/O, so the cycle runs on the blocking pool.
async fn respond(
    app: Arc<App>,
    req: hyper::Request<Incoming>,
    peer_addr: SocketAddr,
) -> Response<Full<Bytes>> {
    let (parts, _body) = req.into_parts();
    let request = Request::from_parts(&parts);
    let is_head = request.is_head();
    let remote_addr = peer_addr.ip().to_string();

    match tokio::task::spawn_blocking(move || app.handle(&request, &remote_addr)).await {
        Ok(response) => response.into_hyper(is_head),
        Err(e) => {
            logger::log_error(&format!("Dispatch task failed: {e}"));
            build_500_response()
        }
    }
}
