use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::network::{
    EventLoadingFailed, EventRequestWillBeSent, EventResponseReceived,
};
use chromiumoxide::cdp::browser_protocol::page::{
    EventLifecycleEvent, EventLoadEventFired, NavigateParams, ReloadParams,
};
use chromiumoxide::page::Page;
use futures::stream::{self, StreamExt};
use moorage_core::{EventStream, NavDriver, PageEvent, WaitError};
use tracing::debug;

/// [`NavDriver`] over a chromiumoxide page.
#[derive(Clone)]
pub struct CdpDriver {
    page: Page,
}

impl CdpDriver {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    pub fn page(&self) -> &Page {
        &self.page
    }
}

#[async_trait]
impl NavDriver for CdpDriver {
    async fn events(&self) -> Result<EventStream, WaitError> {
        let requests = self
            .page
            .event_listener::<EventRequestWillBeSent>()
            .await
            .map_err(subscribe_error)?;
        let failures = self
            .page
            .event_listener::<EventLoadingFailed>()
            .await
            .map_err(subscribe_error)?;
        let responses = self
            .page
            .event_listener::<EventResponseReceived>()
            .await
            .map_err(subscribe_error)?;
        let loads = self
            .page
            .event_listener::<EventLoadEventFired>()
            .await
            .map_err(subscribe_error)?;
        let lifecycles = self
            .page
            .event_listener::<EventLifecycleEvent>()
            .await
            .map_err(subscribe_error)?;

        let merged = stream::select_all(vec![
            requests
                .map(|ev| PageEvent::RequestWillBeSent {
                    request_id: ev.request_id.inner().to_string(),
                    url: ev.request.url.clone(),
                })
                .boxed(),
            failures
                .map(|ev| PageEvent::LoadingFailed {
                    request_id: ev.request_id.inner().to_string(),
                    error_text: ev.error_text.clone(),
                })
                .boxed(),
            responses
                .map(|ev| PageEvent::ResponseReceived {
                    request_id: ev.request_id.inner().to_string(),
                    loader_id: ev.loader_id.inner().to_string(),
                    frame_id: ev
                        .frame_id
                        .as_ref()
                        .map(|id| id.inner().to_string())
                        .unwrap_or_default(),
                    url: ev.response.url.clone(),
                    status: ev.response.status,
                })
                .boxed(),
            loads.map(|_| PageEvent::LoadFired).boxed(),
            lifecycles
                .map(|ev| PageEvent::Lifecycle {
                    name: ev.name.clone(),
                    loader_id: ev.loader_id.inner().to_string(),
                    frame_id: ev.frame_id.inner().to_string(),
                })
                .boxed(),
        ]);
        Ok(merged.boxed())
    }

    async fn navigate(&self, url: &str) -> Result<(), WaitError> {
        debug!(%url, "navigate");
        self.page
            .execute(NavigateParams::new(url))
            .await
            .map_err(|e| WaitError::Driver(format!("navigate failed: {e}")))?;
        Ok(())
    }

    async fn reload(&self, ignore_cache: bool) -> Result<(), WaitError> {
        debug!(ignore_cache, "reload");
        let params = ReloadParams::builder().ignore_cache(ignore_cache).build();
        self.page
            .execute(params)
            .await
            .map_err(|e| WaitError::Driver(format!("reload failed: {e}")))?;
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<(), WaitError> {
        debug!(%selector, "click");
        let selector_json = serde_json::to_string(selector)
            .map_err(|e| WaitError::Driver(format!("failed to encode selector: {e}")))?;
        let js = format!("document.querySelector({selector_json}).click()");
        self.page
            .evaluate(js)
            .await
            .map_err(|e| WaitError::Driver(format!("click failed: {e}")))?;
        Ok(())
    }
}

fn subscribe_error(err: chromiumoxide::error::CdpError) -> WaitError {
    WaitError::Driver(format!("event subscription failed: {err}"))
}
