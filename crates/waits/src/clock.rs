use moorage_core::WaitError;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Blocks until `deadline` or cancellation, whichever comes first. A
/// deadline already in the past returns immediately.
pub async fn await_deadline(
    cancel: &CancellationToken,
    deadline: Instant,
) -> Result<(), WaitError> {
    debug!(?deadline, "waiting until deadline");
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(WaitError::Canceled),
        _ = tokio::time::sleep_until(deadline) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use moorage_core::WaitError;
    use tokio::time::Instant;
    use tokio_util::sync::CancellationToken;

    use super::await_deadline;

    #[tokio::test(start_paused = true)]
    async fn past_deadline_returns_immediately() {
        let cancel = CancellationToken::new();
        let deadline = Instant::now() - Duration::from_secs(1);
        await_deadline(&cancel, deadline).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn future_deadline_elapses() {
        let cancel = CancellationToken::new();
        let deadline = Instant::now() + Duration::from_millis(300);
        await_deadline(&cancel, deadline).await.unwrap();
        assert!(Instant::now() >= deadline);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_beats_a_distant_deadline() {
        let cancel = CancellationToken::new();
        let deadline = Instant::now() + Duration::from_secs(3600);

        let stop = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            stop.cancel();
        });

        let err = await_deadline(&cancel, deadline).await.unwrap_err();
        assert!(matches!(err, WaitError::Canceled));
    }
}
