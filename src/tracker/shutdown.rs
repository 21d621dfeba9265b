use tokio::select;
use tokio_util::sync::CancellationToken;

/// Detects signals sent to the process. Either a signal or the token being cancelled
/// elsewhere ends the wait.
pub async fn detect_shutdown(cancelation: CancellationToken) {
    select! {
        _ = tokio::signal::ctrl_c() => {
            cancelation.cancel();
        },
        _ = cancelation.cancelled() => (),
    };
}
