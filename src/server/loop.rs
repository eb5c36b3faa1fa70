// Server loop module
// Accepts connections until shutdown is requested, then drains

use std::future::Future;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use super::connection::accept_connection;
use super::ServerState;
use crate::logger;

/// Interval between checks of the active connection count while draining
const DRAIN_POLL: Duration = Duration::from_millis(50);

/// Accept connections until `shutdown` resolves
///
/// After shutdown the listener is closed at once; connections already being
/// served get up to `request_timeout` seconds to finish.
pub async fn start_server_loop<S>(
    listener: TcpListener,
    state: Arc<ServerState>,
    shutdown: S,
) -> std::io::Result<()>
where
    S: Future<Output = &'static str>,
{
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => accept_connection(stream, peer_addr, &state),
                    Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
                }
            }

            reason = &mut shutdown => {
                logger::log_server_stop(&format!("{reason} received"));
                break;
            }
        }
    }

    drop(listener);
    drain_connections(&state).await;
    Ok(())
}

async fn drain_connections(state: &ServerState) {
    let deadline =
        tokio::time::Instant::now() + Duration::from_secs(state.performance.request_timeout);

    loop {
        let active = state.active_connections.load(Ordering::SeqCst);
        if active == 0 {
            logger::log_info("[Shutdown] All connections closed");
            return;
        }
        if tokio::time::Instant::now() >= deadline {
            logger::log_warning(&format!(
                "[Shutdown] Giving up on {active} open connection(s)"
            ));
            return;
        }
        tokio::time::sleep(DRAIN_POLL).await;
    }
}
