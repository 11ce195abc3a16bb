use std::path::Path;
use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig, HeadlessMode};
use chromiumoxide::cdp::browser_protocol::network::EnableParams as NetworkEnableParams;
use chromiumoxide::cdp::browser_protocol::page::{
    EnableParams as PageEnableParams, GetNavigationHistoryParams, SetLifecycleEventsEnabledParams,
};
use chromiumoxide::page::Page;
use futures::StreamExt;
use moorage_core::{CookieRecord, Trigger, WaitError};
use moorage_store::CookieStore;
use moorage_waits::Waiter;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::cookies;
use crate::driver::CdpDriver;
use crate::screenshot;

#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub headless: bool,
    pub viewport: Option<(u32, u32)>,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            headless: true,
            viewport: None,
        }
    }
}

/// One launched browser with a single page, set up for navigation waits:
/// the Network domain and page lifecycle events are enabled at launch so
/// the detector's event stream is populated.
pub struct Session {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
}

impl Session {
    pub async fn launch(options: LaunchOptions) -> Result<Self, WaitError> {
        // Unique profile dir per instance, otherwise concurrent browsers
        // fight over the profile lock.
        let profile_dir = std::env::temp_dir().join(format!("moorage-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&profile_dir)
            .map_err(|e| WaitError::Driver(format!("failed to create profile dir: {e}")))?;

        let mut builder = BrowserConfig::builder()
            .headless_mode(if options.headless {
                HeadlessMode::True
            } else {
                HeadlessMode::False
            })
            .user_data_dir(profile_dir);
        if let Some((width, height)) = options.viewport {
            builder = builder.window_size(width, height);
        }
        let config = builder
            .build()
            .map_err(|e| WaitError::Driver(format!("browser config failed: {e}")))?;

        let (browser, mut events) = Browser::launch(config)
            .await
            .map_err(|e| WaitError::Driver(format!("browser launch failed: {e}")))?;
        let handler = tokio::spawn(async move { while events.next().await.is_some() {} });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| WaitError::Driver(format!("new page failed: {e}")))?;

        page.execute(NetworkEnableParams::default())
            .await
            .map_err(|e| WaitError::Driver(format!("network enable failed: {e}")))?;
        page.execute(PageEnableParams::default())
            .await
            .map_err(|e| WaitError::Driver(format!("page enable failed: {e}")))?;
        page.execute(SetLifecycleEventsEnabledParams::new(true))
            .await
            .map_err(|e| WaitError::Driver(format!("lifecycle enable failed: {e}")))?;

        Ok(Self {
            browser,
            page,
            handler,
        })
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn driver(&self) -> CdpDriver {
        CdpDriver::new(self.page.clone())
    }

    /// Navigates to `url` and waits until that document has loaded.
    pub async fn navigate(
        &self,
        waiter: &Waiter,
        cancel: &CancellationToken,
        url: &str,
        timeout: Duration,
    ) -> Result<(), WaitError> {
        let trigger = [Trigger::Navigate {
            url: url.to_string(),
        }];
        waiter
            .await_response(&self.driver(), cancel, url, timeout, &trigger)
            .await
    }

    /// Reloads the current document bypassing the cache and waits for the
    /// fresh copy.
    pub async fn reload_ignoring_cache(
        &self,
        waiter: &Waiter,
        cancel: &CancellationToken,
        timeout: Duration,
    ) -> Result<(), WaitError> {
        let history = self
            .page
            .execute(GetNavigationHistoryParams::default())
            .await
            .map_err(|e| WaitError::Driver(format!("navigation history failed: {e}")))?;
        let current = history
            .result
            .entries
            .last()
            .map(|entry| entry.url.clone())
            .ok_or_else(|| WaitError::Driver("navigation history is empty".to_string()))?;
        debug!(%current, "reloading without cache");

        let trigger = [Trigger::Reload { ignore_cache: true }];
        waiter
            .await_response(&self.driver(), cancel, &current, timeout, &trigger)
            .await
    }

    /// Captures a full-page PNG screenshot to `path`.
    pub async fn screenshot(&self, path: impl AsRef<Path>) -> Result<(), WaitError> {
        screenshot::capture(&self.page, path).await
    }

    /// Reads all cookies, applies `apply` to each, and persists them.
    pub async fn save_cookies<S>(
        &self,
        store: &S,
        apply: impl FnMut(&mut CookieRecord),
    ) -> Result<(), WaitError>
    where
        S: CookieStore + ?Sized,
    {
        cookies::save(&self.page, store, apply).await
    }

    /// Loads persisted cookies, keeps those matching `keep`, and installs
    /// them in the browser.
    pub async fn restore_cookies<S>(
        &self,
        store: &S,
        keep: impl Fn(&CookieRecord) -> bool,
    ) -> Result<(), WaitError>
    where
        S: CookieStore + ?Sized,
    {
        cookies::restore(&self.page, store, keep).await
    }

    pub async fn close(mut self) -> Result<(), WaitError> {
        self.browser
            .close()
            .await
            .map_err(|e| WaitError::Driver(format!("browser close failed: {e}")))?;
        let _ = self.handler.await;
        Ok(())
    }
}
