//! Process shutdown signal

use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Create a cancellation token cancelled on SIGINT or SIGTERM.
///
/// The token cascades through every stage task: cycle loops finish their
/// in-flight cycle, servers drain, and the process exits.
pub fn shutdown_token() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();

    tokio::spawn(async move {
        wait_for_signal().await;
        info!("shutdown signal received");
        trigger.cancel();
    });

    token
}

/// Wait for SIGINT or SIGTERM
async fn wait_for_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
