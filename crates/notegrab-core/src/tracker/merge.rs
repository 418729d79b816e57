//! Fan-in: many receivers into one.

use tokio::sync::mpsc;

/// Merge `inputs` into a single receiver.
///
/// One relay task per input forwards into a shared output. A supervisor joins
/// every relay and only then drops the last output sender, so the output closes
/// exactly once and only after every input has closed and every element has
/// been forwarded. Interleaving across inputs is arbitrary.
///
/// If the output receiver is dropped, each relay stops at its next forward and
/// drops its input.
pub fn merge<T: Send + 'static>(
    inputs: Vec<mpsc::Receiver<T>>,
    capacity: usize,
) -> mpsc::Receiver<T> {
    let (out, merged) = mpsc::channel(capacity.max(1));

    let relays: Vec<_> = inputs
        .into_iter()
        .map(|mut input| {
            let out = out.clone();
            tokio::spawn(async move {
                let mut forwarded = 0u64;
                while let Some(value) = input.recv().await {
                    if out.send(value).await.is_err() {
                        break;
                    }
                    forwarded += 1;
                }
                forwarded
            })
        })
        .collect();

    tokio::spawn(async move {
        let count = relays.len();
        let mut forwarded = 0u64;
        for relay in relays {
            match relay.await {
                Ok(n) => forwarded += n,
                Err(e) => tracing::error!("merge relay failed: {}", e),
            }
        }
        tracing::trace!(inputs = count, forwarded, "merge complete");
        drop(out);
    });

    merged
}
