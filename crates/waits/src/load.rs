use std::time::Duration;

use futures::StreamExt;
use moorage_core::{NavDriver, PageEvent, WaitError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::response::Waiter;

impl Waiter {
    /// Waits for the next full load event, whichever document it belongs
    /// to. No correlation and no retries; the deadline is soft, like
    /// [`Waiter::await_response`].
    pub async fn await_load<D>(
        &self,
        driver: &D,
        cancel: &CancellationToken,
        timeout: Duration,
    ) -> Result<(), WaitError>
    where
        D: NavDriver + ?Sized,
    {
        debug!(?timeout, "waiting for load");
        let mut events = driver.events().await?;

        let deadline = tokio::time::sleep(timeout);
        tokio::pin!(deadline);
        let mut open = true;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(WaitError::Canceled),
                event = events.next(), if open => match event {
                    Some(PageEvent::LoadFired) => {
                        debug!("loaded");
                        return Ok(());
                    }
                    Some(_) => {}
                    None => open = false,
                },
                _ = &mut deadline => {
                    warn!("load wait timed out, continuing");
                    return Ok(());
                }
            }
        }
    }
}
