use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use moorage_core::{EventStream, NavDriver, PageEvent, WaitError};
use tokio::sync::mpsc;

pub const TARGET: &str = "http://127.0.0.1:8008/next";

pub fn request(id: &str, url: &str) -> PageEvent {
    PageEvent::RequestWillBeSent {
        request_id: id.to_string(),
        url: url.to_string(),
    }
}

pub fn response(id: &str, loader: &str, frame: &str, url: &str, status: i64) -> PageEvent {
    PageEvent::ResponseReceived {
        request_id: id.to_string(),
        loader_id: loader.to_string(),
        frame_id: frame.to_string(),
        url: url.to_string(),
        status,
    }
}

pub fn milestone(name: &str, loader: &str, frame: &str) -> PageEvent {
    PageEvent::Lifecycle {
        name: name.to_string(),
        loader_id: loader.to_string(),
        frame_id: frame.to_string(),
    }
}

/// A driver that answers commands by replaying scripted event batches into
/// its event stream.
pub struct ScriptedDriver {
    tx: mpsc::UnboundedSender<PageEvent>,
    rx: Mutex<Option<mpsc::UnboundedReceiver<PageEvent>>>,
    navigate_events: Vec<PageEvent>,
    click_events: Vec<PageEvent>,
    reload_events: Mutex<VecDeque<Vec<PageEvent>>>,
    navigate_fails: bool,
    reloads: AtomicUsize,
    clicks: AtomicUsize,
}

impl ScriptedDriver {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Mutex::new(Some(rx)),
            navigate_events: Vec::new(),
            click_events: Vec::new(),
            reload_events: Mutex::new(VecDeque::new()),
            navigate_fails: false,
            reloads: AtomicUsize::new(0),
            clicks: AtomicUsize::new(0),
        }
    }

    pub fn on_navigate(mut self, events: Vec<PageEvent>) -> Self {
        self.navigate_events = events;
        self
    }

    pub fn on_click(mut self, events: Vec<PageEvent>) -> Self {
        self.click_events = events;
        self
    }

    pub fn on_reload(self, batches: Vec<Vec<PageEvent>>) -> Self {
        *self.reload_events.lock().unwrap() = batches.into();
        self
    }

    pub fn fail_navigate(mut self) -> Self {
        self.navigate_fails = true;
        self
    }

    pub fn emit(&self, events: impl IntoIterator<Item = PageEvent>) {
        for event in events {
            let _ = self.tx.send(event);
        }
    }

    pub fn reload_count(&self) -> usize {
        self.reloads.load(Ordering::SeqCst)
    }

    pub fn click_count(&self) -> usize {
        self.clicks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NavDriver for ScriptedDriver {
    async fn events(&self) -> Result<EventStream, WaitError> {
        let mut rx = self
            .rx
            .lock()
            .unwrap()
            .take()
            .expect("scripted driver supports one subscription");
        Ok(Box::pin(futures::stream::poll_fn(move |cx| {
            rx.poll_recv(cx)
        })))
    }

    async fn navigate(&self, _url: &str) -> Result<(), WaitError> {
        if self.navigate_fails {
            return Err(WaitError::Driver("navigate refused".to_string()));
        }
        self.emit(self.navigate_events.clone());
        Ok(())
    }

    async fn reload(&self, _ignore_cache: bool) -> Result<(), WaitError> {
        self.reloads.fetch_add(1, Ordering::SeqCst);
        let batch = self.reload_events.lock().unwrap().pop_front();
        if let Some(batch) = batch {
            self.emit(batch);
        }
        Ok(())
    }

    async fn click(&self, _selector: &str) -> Result<(), WaitError> {
        self.clicks.fetch_add(1, Ordering::SeqCst);
        self.emit(self.click_events.clone());
        Ok(())
    }
}
