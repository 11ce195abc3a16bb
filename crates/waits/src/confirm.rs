use std::io::Write;

use moorage_core::WaitError;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Prints `prompt` and waits for one line of input.
///
/// With an empty `accepted` set any input confirms; otherwise the trimmed
/// line must equal one of the accepted strings (case-sensitive) or the
/// wait ends with [`WaitError::CanceledByUser`]. Cancellation wins over
/// pending input.
pub async fn await_confirmation<R>(
    input: R,
    prompt: &str,
    accepted: &[&str],
    cancel: &CancellationToken,
) -> Result<(), WaitError>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    print!("{prompt}");
    let _ = std::io::stdout().flush();

    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        let mut reader = BufReader::new(input);
        let mut line = String::new();
        let _ = reader.read_line(&mut line).await;
        let _ = tx.send(line.trim().to_string());
    });

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(WaitError::Canceled),
        line = rx => {
            let line = line.unwrap_or_default();
            if accepted.is_empty() || accepted.iter().any(|want| *want == line) {
                debug!("confirmed");
                Ok(())
            } else {
                debug!("declined");
                Err(WaitError::CanceledByUser)
            }
        }
    }
}
