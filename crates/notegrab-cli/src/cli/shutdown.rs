//! Ctrl-C handling: the first interrupt cancels the crawl so in-flight jobs
//! abort and remove their temp files.

use tokio_util::sync::CancellationToken;

/// Token cancelled on the first Ctrl-C.
pub fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let cancel = token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                eprintln!("Interrupted; stopping downloads...");
                tracing::warn!("interrupt received, cancelling crawl");
                cancel.cancel();
            }
            Err(e) => tracing::warn!("cannot listen for Ctrl-C: {}", e),
        }
    });
    token
}
