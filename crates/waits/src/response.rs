use std::time::Duration;

use futures::StreamExt;
use moorage_core::{NavDriver, Trigger, WaitError};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::WaitConfig;
use crate::correlate::{CompletionPolicy, Correlator, Signal};

/// Runs navigation waits against a [`NavDriver`].
pub struct Waiter {
    config: WaitConfig,
}

impl Waiter {
    pub fn new(config: WaitConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WaitConfig {
        &self.config
    }

    /// Waits until the document at `target` (a URL prefix) has actually
    /// finished loading, after kicking the navigation off with `triggers`.
    ///
    /// The subscription is armed before any trigger runs, so no event can
    /// be lost between the two. A trigger error aborts immediately; the
    /// wait itself ends on a completion event for the awaited document, a
    /// non-retryable status, cancellation, or the deadline. Retryable
    /// failures are recovered by reloading the page, paced by the
    /// configured tick and bounded only by `timeout`.
    ///
    /// Running past the deadline is not an error: the wait logs and
    /// returns `Ok(())`, leaving verification to the caller.
    pub async fn await_response<D>(
        &self,
        driver: &D,
        cancel: &CancellationToken,
        target: &str,
        timeout: Duration,
        triggers: &[Trigger],
    ) -> Result<(), WaitError>
    where
        D: NavDriver + ?Sized,
    {
        debug!(target, ?timeout, "waiting for response");
        let mut events = driver.events().await?;

        let (tx, mut rx) = mpsc::channel(1);
        let mut correlator = Correlator::new(target);
        let mut policy = CompletionPolicy::new();
        let listener = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                let Some(signal) = policy.apply(correlator.classify(&event)) else {
                    continue;
                };
                let terminal = signal.is_terminal();
                if tx.send(signal).await.is_err() || terminal {
                    break;
                }
            }
        });

        debug!(triggers = triggers.len(), "running triggers");
        let mut result = Ok(());
        for trigger in triggers {
            if let Err(err) = run_trigger(driver, trigger).await {
                result = Err(err);
                break;
            }
        }
        if result.is_ok() {
            result = self.drive(driver, cancel, target, timeout, &mut rx).await;
        }
        listener.abort();
        result
    }

    async fn drive<D>(
        &self,
        driver: &D,
        cancel: &CancellationToken,
        target: &str,
        timeout: Duration,
        rx: &mut mpsc::Receiver<Signal>,
    ) -> Result<(), WaitError>
    where
        D: NavDriver + ?Sized,
    {
        let deadline = tokio::time::sleep(timeout);
        tokio::pin!(deadline);
        let first_tick = tokio::time::Instant::now() + self.config.reload_tick;
        let mut ticker = tokio::time::interval_at(first_tick, self.config.reload_tick);
        let mut open = true;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(WaitError::Canceled),
                signal = rx.recv(), if open => match signal {
                    Some(Signal::Failed(err)) => return Err(err),
                    Some(Signal::Retry) => {
                        tokio::select! {
                            biased;
                            _ = cancel.cancelled() => return Err(WaitError::Canceled),
                            _ = ticker.tick() => {}
                        }
                        debug!(target, "reloading");
                        driver.reload(false).await?;
                    }
                    Some(Signal::Succeeded) => {
                        debug!(target, "loaded");
                        return Ok(());
                    }
                    // Listener gone without a terminal signal (transport
                    // died); keep waiting so the deadline still applies.
                    None => open = false,
                },
                _ = &mut deadline => {
                    warn!(target, "timeout exceeded, continuing");
                    return Ok(());
                }
            }
        }
    }
}

async fn run_trigger<D>(driver: &D, trigger: &Trigger) -> Result<(), WaitError>
where
    D: NavDriver + ?Sized,
{
    match trigger {
        Trigger::Navigate { url } => driver.navigate(url).await,
        Trigger::Click { selector } => driver.click(selector).await,
        Trigger::Reload { ignore_cache } => driver.reload(*ignore_cache).await,
    }
}
